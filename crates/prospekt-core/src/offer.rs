use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Retailers whose weekly leaflets are ingested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Retailer {
    Edeka,
    Rewe,
    Lidl,
    Aldi,
    Netto,
}

impl Retailer {
    /// All supported retailers, in the order a full ingestion run visits them.
    pub const ALL: [Retailer; 5] = [
        Retailer::Edeka,
        Retailer::Rewe,
        Retailer::Lidl,
        Retailer::Aldi,
        Retailer::Netto,
    ];

    /// Lowercase identifier used as the offer-id prefix and storage value.
    #[must_use]
    pub fn prefix(self) -> &'static str {
        match self {
            Retailer::Edeka => "edeka",
            Retailer::Rewe => "rewe",
            Retailer::Lidl => "lidl",
            Retailer::Aldi => "aldi",
            Retailer::Netto => "netto",
        }
    }
}

impl std::fmt::Display for Retailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.prefix())
    }
}

#[derive(Debug, Error)]
#[error("unknown retailer: {0}")]
pub struct RetailerParseError(pub String);

impl std::str::FromStr for Retailer {
    type Err = RetailerParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "edeka" => Ok(Retailer::Edeka),
            "rewe" => Ok(Retailer::Rewe),
            "lidl" => Ok(Retailer::Lidl),
            "aldi" => Ok(Retailer::Aldi),
            "netto" => Ok(Retailer::Netto),
            other => Err(RetailerParseError(other.to_owned())),
        }
    }
}

/// Canonical record of one retailer's priced item for one ISO week.
///
/// Created by the normalizer, possibly merged during deduplication, and
/// persisted via upsert. `id` is deterministic per `(retailer, week_key,
/// title slug, batch ordinal)` and is the storage primary key: a later write
/// with the same `id` replaces every column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Offer {
    pub id: String,
    pub retailer: Retailer,
    pub title: String,
    /// Offer price; non-negative. Malformed raw prices are rejected upstream
    /// rather than coerced to zero.
    pub price: Decimal,
    /// Sales unit as printed in the leaflet (e.g. `"kg"`, `"500 g"`).
    pub unit: Option<String>,
    pub original_price: Option<Decimal>,
    /// Percentage off `original_price`. Supplied by the extractor or derived
    /// during normalization; derived values are clamped to `[0, 100]`.
    pub discount_percent: Option<Decimal>,
    pub valid_from: DateTime<Utc>,
    pub valid_to: DateTime<Utc>,
    /// May be empty when the extractor found no usable image.
    pub image_url: String,
    pub brand: Option<String>,
    pub category: Option<String>,
    /// Leaflet page the offer was extracted from, when known.
    pub page: Option<i64>,
    /// ISO week partition key, `YYYY-Www`.
    pub week_key: String,
    pub updated_at: DateTime<Utc>,
    /// Free-form provenance (source strategy, raw text snippets, unmapped
    /// extractor fields). Never used for identity or querying.
    pub metadata: Map<String, Value>,
}

impl Offer {
    /// Returns `true` if the offer carries a reduction against an original price.
    #[must_use]
    pub fn is_discounted(&self) -> bool {
        self.discount_percent.is_some() || self.original_price.is_some()
    }
}
