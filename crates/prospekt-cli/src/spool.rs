//! File-spool extraction strategies.
//!
//! The raw-extraction collaborators (headless-browser scrapes, OCR passes,
//! aggregator exports) run outside this process and drop their output as
//! JSON arrays of raw records under `<spool>/<retailer>/`. Each drop file
//! acts as one strategy in the retailer's fallback chain: the site-specific
//! leaflet extraction first, the generic aggregator export second. A missing
//! or unparsable file is an ordinary strategy failure — the orchestrator
//! moves on to the next file.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use prospekt_core::Retailer;
use prospekt_ingest::{ExtractionStrategy, IngestError, RawOfferRecord};

pub struct SpoolStrategy {
    name: &'static str,
    path: PathBuf,
}

impl SpoolStrategy {
    #[must_use]
    pub fn new(name: &'static str, path: PathBuf) -> Self {
        Self { name, path }
    }
}

#[async_trait]
impl ExtractionStrategy for SpoolStrategy {
    fn name(&self) -> &str {
        self.name
    }

    async fn extract(&self) -> Result<Vec<RawOfferRecord>, IngestError> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|e| IngestError::SpoolIo {
                path: self.path.display().to_string(),
                source: e,
            })?;

        serde_json::from_slice(&bytes).map_err(|e| IngestError::Deserialize {
            context: self.path.display().to_string(),
            source: e,
        })
    }
}

/// The per-retailer strategy chain, in priority order.
#[must_use]
pub fn strategies_for(spool_dir: &Path, retailer: Retailer) -> Vec<Box<dyn ExtractionStrategy>> {
    let dir = spool_dir.join(retailer.prefix());
    vec![
        Box::new(SpoolStrategy::new("leaflet", dir.join("leaflet.json"))),
        Box::new(SpoolStrategy::new("aggregator", dir.join("aggregator.json"))),
    ]
}
