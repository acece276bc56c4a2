use std::path::PathBuf;

/// Runtime configuration for the ingestion pipeline, resolved from the
/// environment by [`crate::config::load_app_config`].
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// SQLite database URL, e.g. `sqlite://./data/prospekt.db`.
    pub database_url: String,
    pub log_level: String,
    /// Ordered brand classification rules (YAML).
    pub brand_rules_path: PathBuf,
    /// Directory where extraction collaborators drop per-retailer raw
    /// record files.
    pub spool_dir: PathBuf,
    pub db_max_connections: u32,
    pub db_acquire_timeout_secs: u64,
    /// Upper bound for one extraction-strategy invocation; a strategy that
    /// exceeds it is treated as failed and the next one is tried.
    pub strategy_timeout_secs: u64,
    /// Worker bound for concurrent per-retailer ingestion runs.
    pub max_concurrent_retailers: usize,
}
