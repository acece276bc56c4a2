pub mod dedupe;
pub mod error;
pub mod normalize;
pub mod orchestrator;
pub mod types;

pub use dedupe::dedupe;
pub use error::{IngestError, NormalizeError};
pub use normalize::{normalize_batch, normalize_record};
pub use orchestrator::{
    AttemptOutcome, ExtractionStrategy, FetchOrchestrator, FetchOutcome, StrategyAttempt,
};
pub use types::RawOfferRecord;
