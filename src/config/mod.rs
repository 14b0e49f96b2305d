use anyhow::anyhow;
use anyhow::Context;
use anyhow::Result;
use log::LevelFilter;
use std::env;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_OPENAI_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_GAS_LIMIT: u64 = 200_000;
pub const DEFAULT_DELAY_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct Config {
    /// JSON-RPC endpoint of the chain node
    pub rpc_url: String,

    /// Hex private key used to sign updates. Validated on first write.
    pub private_key: String,

    /// Address of the info store contract. Validated on first write.
    pub contract_address: String,

    pub openai_api_key: String,
    pub openai_model: String,
    pub openai_base_url: String,

    pub gas_limit: u64,

    /// Pause after every sample, in seconds
    pub delay_secs: u64,

    pub samples: Vec<String>,
}

pub fn default_samples() -> Vec<String> {
    vec![
        "This project is incredible, the technology is revolutionary and the team is top-notch!".into(),
        "I'm not sure how I feel about the latest update, it has some good and bad points.".into(),
        "This is a complete disaster, the platform is buggy and I'm selling everything. This is very NEGATIVE.".into(),
    ]
}

/// `LOG_LEVEL` from the environment, `info` when unset or unparseable.
pub fn log_level() -> LevelFilter {
    env::var("LOG_LEVEL")
        .ok()
        .and_then(|v| v.parse::<LevelFilter>().ok())
        .unwrap_or(LevelFilter::Info)
}

impl Config {
    /// Load from environment variables (dotenv recommended)
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let rpc_url = lookup("RPC_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| anyhow!("Missing RPC_URL"))?;

        let private_key = lookup("PRIVATE_KEY").unwrap_or_default();
        let contract_address = lookup("CHATGPT_INFO_STORE_ADDRESS").unwrap_or_default();
        let openai_api_key = lookup("OPENAI_API_KEY").unwrap_or_default();

        let openai_model = lookup("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_OPENAI_MODEL.into());

        let openai_base_url = lookup("OPENAI_BASE_URL")
            .map(|v| v.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.into());

        let gas_limit: u64 = lookup("GAS_LIMIT")
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_GAS_LIMIT);

        let delay_secs: u64 = lookup("RUN_DELAY_SECS")
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_DELAY_SECS);

        let samples = match lookup("SAMPLE_TEXTS_FILE") {
            Some(path) => load_samples(&path)?,
            None => default_samples(),
        };

        Ok(Config {
            rpc_url,
            private_key,
            contract_address,
            openai_api_key,
            openai_model,
            openai_base_url,
            gas_limit,
            delay_secs,
            samples,
        })
    }

    pub fn delay(&self) -> Duration {
        Duration::from_secs(self.delay_secs)
    }
}

/// Reads a JSON array of strings. Blank entries are dropped.
pub fn load_samples<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("cannot open samples file {}", path.display()))?;
    let reader = BufReader::new(file);
    let samples: Vec<String> = serde_json::from_reader(reader)
        .with_context(|| format!("samples file {} is not a JSON string array", path.display()))?;

    Ok(samples
        .into_iter()
        .filter(|s| !s.trim().is_empty())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_applied() {
        let cfg = Config::from_lookup(lookup_from(&[("RPC_URL", "http://localhost:8545")])).unwrap();

        assert_eq!(cfg.rpc_url, "http://localhost:8545");
        assert_eq!(cfg.openai_model, "gpt-3.5-turbo");
        assert_eq!(cfg.openai_base_url, "https://api.openai.com/v1");
        assert_eq!(cfg.gas_limit, 200_000);
        assert_eq!(cfg.delay(), Duration::from_secs(30));
        assert_eq!(cfg.samples.len(), 3);
        // key and address are only checked when first used
        assert!(cfg.private_key.is_empty());
        assert!(cfg.contract_address.is_empty());
    }

    #[test]
    fn test_missing_rpc_url_is_an_error() {
        let err = Config::from_lookup(lookup_from(&[("PRIVATE_KEY", "0x01")])).unwrap_err();
        assert!(err.to_string().contains("RPC_URL"));

        let blank = Config::from_lookup(lookup_from(&[("RPC_URL", "  ")]));
        assert!(blank.is_err());
    }

    #[test]
    fn test_overrides() {
        let cfg = Config::from_lookup(lookup_from(&[
            ("RPC_URL", "http://node:8545"),
            ("OPENAI_MODEL", "gpt-4o-mini"),
            ("OPENAI_BASE_URL", "http://proxy.local/v1/"),
            ("GAS_LIMIT", "90000"),
            ("RUN_DELAY_SECS", "0"),
        ]))
        .unwrap();

        assert_eq!(cfg.openai_model, "gpt-4o-mini");
        assert_eq!(cfg.openai_base_url, "http://proxy.local/v1");
        assert_eq!(cfg.gas_limit, 90_000);
        assert_eq!(cfg.delay(), Duration::ZERO);
    }

    #[test]
    fn test_unparseable_numbers_fall_back() {
        let cfg = Config::from_lookup(lookup_from(&[
            ("RPC_URL", "http://node:8545"),
            ("GAS_LIMIT", "lots"),
            ("RUN_DELAY_SECS", "-5"),
        ]))
        .unwrap();

        assert_eq!(cfg.gas_limit, DEFAULT_GAS_LIMIT);
        assert_eq!(cfg.delay_secs, DEFAULT_DELAY_SECS);
    }

    #[test]
    fn test_samples_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"["first sample", "   ", "second sample"]"#).unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let cfg = Config::from_lookup(lookup_from(&[
            ("RPC_URL", "http://node:8545"),
            ("SAMPLE_TEXTS_FILE", path.as_str()),
        ]))
        .unwrap();

        assert_eq!(cfg.samples, vec!["first sample", "second sample"]);
    }

    #[test]
    fn test_bad_samples_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"not": "a list"}}"#).unwrap();
        assert!(load_samples(file.path()).is_err());

        assert!(load_samples("/definitely/not/here.json").is_err());
    }
}
