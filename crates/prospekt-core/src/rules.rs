//! Brand classification rules, loaded from an ordered YAML file.
//!
//! Rule order is significant: the classifier returns the first rule whose
//! keyword matches, so more specific rules must precede catch-alls in the
//! file. Validation rejects structurally broken rule sets at load time but
//! deliberately allows one brand to appear in several rules.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// One classification rule: assign `brand` when any keyword matches a title.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrandRule {
    pub brand: String,
    pub keywords: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct BrandRulesFile {
    pub rules: Vec<BrandRule>,
}

/// Load and validate the brand rules from a YAML file, preserving file order.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails
/// validation.
pub fn load_brand_rules(path: &Path) -> Result<BrandRulesFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::RulesFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let rules_file: BrandRulesFile =
        serde_yaml::from_str(&content).map_err(ConfigError::RulesFileParse)?;

    validate_rules(&rules_file)?;

    Ok(rules_file)
}

fn validate_rules(rules_file: &BrandRulesFile) -> Result<(), ConfigError> {
    for (index, rule) in rules_file.rules.iter().enumerate() {
        if rule.brand.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "rule #{index} has an empty brand name"
            )));
        }

        if rule.keywords.is_empty() {
            return Err(ConfigError::Validation(format!(
                "rule '{}' has no keywords",
                rule.brand
            )));
        }

        if rule.keywords.iter().any(|k| k.trim().is_empty()) {
            return Err(ConfigError::Validation(format!(
                "rule '{}' contains a blank keyword",
                rule.brand
            )));
        }
    }

    Ok(())
}
