use thiserror::Error;

pub mod app_config;
pub mod classifier;
pub mod config;
pub mod offer;
pub mod rules;
pub mod week;

pub use app_config::AppConfig;
pub use classifier::BrandClassifier;
pub use config::{load_app_config, load_app_config_from_env};
pub use offer::{Offer, Retailer, RetailerParseError};
pub use rules::{load_brand_rules, BrandRule, BrandRulesFile};
pub use week::{default_validity, parse_week_key, week_for, IsoWeekId};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read brand rules file {path}: {source}")]
    RulesFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse brand rules file: {0}")]
    RulesFileParse(#[from] serde_yaml::Error),

    #[error("invalid brand rules: {0}")]
    Validation(String),
}
