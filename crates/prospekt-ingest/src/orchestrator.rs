//! Per-retailer strategy fallback chain.
//!
//! Strategies are tried strictly in priority order; each invocation is
//! isolated (an error or timeout is recorded and the next strategy runs)
//! and time-bounded. The first strategy whose raw output survives
//! normalization and deduplication with at least one offer wins and
//! short-circuits the rest — a strategy that "succeeds" with zero usable
//! offers is indistinguishable from one that silently broke, so it counts
//! as a failure for fallback purposes.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

use prospekt_core::week::IsoWeekId;
use prospekt_core::{BrandClassifier, Offer, Retailer};

use crate::dedupe::dedupe;
use crate::error::IngestError;
use crate::normalize::normalize_batch;
use crate::types::RawOfferRecord;

/// One raw-extraction mechanism for one retailer (page scrape, OCR pass,
/// aggregator export). Implementations live at the application edge; the
/// orchestrator only sees this seam.
#[async_trait]
pub trait ExtractionStrategy: Send + Sync {
    /// Short identifier used in logs and offer provenance.
    fn name(&self) -> &str;

    async fn extract(&self) -> Result<Vec<RawOfferRecord>, IngestError>;
}

/// What happened when one strategy was invoked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// The strategy won the run with this many deduplicated offers.
    Produced(usize),
    /// The strategy returned records, but none survived normalization and
    /// deduplication (or it returned none at all).
    Empty,
    Failed(String),
    TimedOut,
}

impl std::fmt::Display for AttemptOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttemptOutcome::Produced(count) => write!(f, "produced {count} offers"),
            AttemptOutcome::Empty => write!(f, "no usable offers"),
            AttemptOutcome::Failed(reason) => write!(f, "failed: {reason}"),
            AttemptOutcome::TimedOut => write!(f, "timed out"),
        }
    }
}

/// Per-strategy record of one fetch run, kept for observability.
#[derive(Debug, Clone)]
pub struct StrategyAttempt {
    pub strategy: String,
    pub outcome: AttemptOutcome,
}

/// Result of a fetch run. Never an error: when every strategy is exhausted
/// the offers are simply empty and the attempt trail says why — the caller
/// must treat that as "no data this run", not as a hard failure.
#[derive(Debug)]
pub struct FetchOutcome {
    pub offers: Vec<Offer>,
    pub attempts: Vec<StrategyAttempt>,
    /// Name of the winning strategy, if any.
    pub winner: Option<String>,
}

impl FetchOutcome {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.offers.is_empty()
    }
}

pub struct FetchOrchestrator {
    classifier: Arc<BrandClassifier>,
    strategy_timeout: Duration,
}

impl FetchOrchestrator {
    #[must_use]
    pub fn new(classifier: Arc<BrandClassifier>, strategy_timeout: Duration) -> Self {
        Self {
            classifier,
            strategy_timeout,
        }
    }

    /// Runs the strategy chain for one retailer and returns the winning
    /// strategy's normalized, brand-enriched, deduplicated offers.
    ///
    /// The outcome only ever contains records from a single strategy;
    /// partial results from failed or timed-out invocations are discarded.
    pub async fn fetch_offers(
        &self,
        retailer: Retailer,
        week: &IsoWeekId,
        strategies: &[Box<dyn ExtractionStrategy>],
        run_time: DateTime<Utc>,
    ) -> FetchOutcome {
        let mut attempts = Vec::with_capacity(strategies.len());

        for strategy in strategies {
            let name = strategy.name().to_owned();

            let raws = match tokio::time::timeout(self.strategy_timeout, strategy.extract()).await
            {
                Err(_) => {
                    tracing::warn!(
                        retailer = %retailer,
                        strategy = %name,
                        timeout_secs = self.strategy_timeout.as_secs(),
                        "extraction strategy timed out — trying next"
                    );
                    attempts.push(StrategyAttempt {
                        strategy: name,
                        outcome: AttemptOutcome::TimedOut,
                    });
                    continue;
                }
                Ok(Err(e)) => {
                    tracing::warn!(
                        retailer = %retailer,
                        strategy = %name,
                        error = %e,
                        "extraction strategy failed — trying next"
                    );
                    attempts.push(StrategyAttempt {
                        strategy: name,
                        outcome: AttemptOutcome::Failed(e.to_string()),
                    });
                    continue;
                }
                Ok(Ok(raws)) => raws,
            };

            let mut offers = normalize_batch(&raws, retailer, &week.key, run_time);
            for offer in &mut offers {
                if offer.brand.is_none() {
                    offer.brand = self.classifier.classify(&offer.title);
                }
                offer
                    .metadata
                    .insert("source_strategy".to_owned(), Value::String(name.clone()));
            }
            let offers = dedupe(offers);

            if offers.is_empty() {
                tracing::warn!(
                    retailer = %retailer,
                    strategy = %name,
                    raw_records = raws.len(),
                    "extraction strategy yielded no usable offers — trying next"
                );
                attempts.push(StrategyAttempt {
                    strategy: name,
                    outcome: AttemptOutcome::Empty,
                });
                continue;
            }

            tracing::info!(
                retailer = %retailer,
                strategy = %name,
                offers = offers.len(),
                week = %week.key,
                "extraction strategy succeeded"
            );
            attempts.push(StrategyAttempt {
                strategy: name.clone(),
                outcome: AttemptOutcome::Produced(offers.len()),
            });
            return FetchOutcome {
                offers,
                attempts,
                winner: Some(name),
            };
        }

        tracing::warn!(
            retailer = %retailer,
            week = %week.key,
            strategies = attempts.len(),
            "all extraction strategies exhausted — no data this run"
        );
        FetchOutcome {
            offers: Vec::new(),
            attempts,
            winner: None,
        }
    }
}
