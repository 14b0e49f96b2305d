use ethers::types::H256;

/// Characters of a sample shown in the per-item log header.
pub const PREVIEW_CHARS: usize = 50;

pub struct Helper;

impl Helper {
    /// First `max` characters of `text`, with `...` appended when something was cut.
    /// Counts chars, not bytes, so multi-byte text never splits mid-codepoint.
    pub fn preview(text: &str, max: usize) -> String {
        let mut chars = text.chars();
        let head: String = chars.by_ref().take(max).collect();
        if chars.next().is_some() {
            format!("{head}...")
        } else {
            head
        }
    }

    /// Full `0x`-prefixed hex. `Display` on H256 abbreviates the middle.
    pub fn tx_hex(hash: &H256) -> String {
        format!("{:#x}", hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_cuts_long_text() {
        let text = "This project is incredible, the technology is revolutionary and the team is top-notch!";
        let p = Helper::preview(text, PREVIEW_CHARS);
        assert_eq!(p, "This project is incredible, the technology is revo...");
    }

    #[test]
    fn test_preview_keeps_short_text() {
        assert_eq!(Helper::preview("X is great!", PREVIEW_CHARS), "X is great!");
        assert_eq!(Helper::preview("", PREVIEW_CHARS), "");
    }

    #[test]
    fn test_preview_multibyte() {
        let p = Helper::preview("ça coûte très cher", 4);
        assert_eq!(p, "ça c...");
    }

    #[test]
    fn test_tx_hex_is_full_length() {
        let hash = H256::repeat_byte(0xab);
        let hex = Helper::tx_hex(&hash);
        assert!(hex.starts_with("0x"));
        assert_eq!(hex.len(), 66);
        assert!(!hex.contains('…'));
    }
}
