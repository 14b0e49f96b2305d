use std::time::Duration;

use ethers::types::H256;
use log::{error, info, warn};

use crate::chain::ChainWriter;
use crate::classifier::SentimentClassifier;
use crate::helper::{Helper, PREVIEW_CHARS};

/// What happened to one sample.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    /// Mined with status 1.
    Stored { tx_hash: H256 },
    /// Mined but reverted.
    Reverted { tx_hash: H256 },
    /// No sentence came back, nothing was sent.
    Skipped { reason: String },
    /// A sentence came back but the write did not go through.
    WriteFailed { reason: String },
}

/// Single pass over the samples: classify, write, wait.
#[derive(Debug)]
pub struct Relay {
    samples: Vec<String>,
    delay: Duration,
}

impl Relay {
    pub fn new(samples: Vec<String>, delay: Duration) -> Self {
        Self { samples, delay }
    }

    pub async fn run(
        &self,
        classifier: &dyn SentimentClassifier,
        writer: &dyn ChainWriter,
    ) -> Vec<ItemOutcome> {
        let mut outcomes = Vec::with_capacity(self.samples.len());

        for text in &self.samples {
            info!(
                "--- Analyzing new text: '{}' ---",
                Helper::preview(text, PREVIEW_CHARS)
            );

            let outcome = Self::process(text, classifier, writer).await;
            outcomes.push(outcome);

            if !self.delay.is_zero() {
                info!(
                    "Waiting for {} seconds before next analysis...",
                    self.delay.as_secs()
                );
                tokio::time::sleep(self.delay).await;
            }
        }

        outcomes
    }

    async fn process(
        text: &str,
        classifier: &dyn SentimentClassifier,
        writer: &dyn ChainWriter,
    ) -> ItemOutcome {
        let sentence = match classifier.classify(text).await {
            Ok(sentence) if !sentence.is_empty() => sentence,
            Ok(_) => {
                warn!("Could not get a response from the classifier: empty answer");
                return ItemOutcome::Skipped {
                    reason: "empty answer".into(),
                };
            }
            Err(e) => {
                warn!("Could not get a response from the classifier: {}", e);
                return ItemOutcome::Skipped {
                    reason: e.to_string(),
                };
            }
        };

        match writer.write(&sentence).await {
            Ok(outcome) if outcome.succeeded() => {
                info!(
                    "On-chain info updated successfully! ({})",
                    Helper::tx_hex(&outcome.tx_hash)
                );
                ItemOutcome::Stored {
                    tx_hash: outcome.tx_hash,
                }
            }
            Ok(outcome) => {
                warn!(
                    "Transaction failed! {} mined with status {:?}",
                    Helper::tx_hex(&outcome.tx_hash),
                    outcome.status
                );
                ItemOutcome::Reverted {
                    tx_hash: outcome.tx_hash,
                }
            }
            Err(e) => {
                error!("Error updating on-chain info: {}", e);
                ItemOutcome::WriteFailed {
                    reason: e.to_string(),
                }
            }
        }
    }
}
