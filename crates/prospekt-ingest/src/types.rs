//! Raw record shape handed over by extraction collaborators.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One unvalidated offer as produced by a retailer-specific extraction
/// mechanism (page scrape, OCR pass, HTML export).
///
/// Every field is optional; extractors routinely deliver partial records.
/// `price`, `discount` and `original_price` stay untyped (`Value`) because
/// sources deliver them as locale-formatted strings (`"1,29"`, `"1.299,00 €"`)
/// as often as JSON numbers. Field-name aliases absorb the naming drift
/// between extractors (`name`/`title`, `amount`/`unit`, camelCase exports).
/// Anything the schema does not know ends up in `extra` and is carried into
/// offer metadata untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawOfferRecord {
    #[serde(alias = "name")]
    pub title: Option<String>,
    pub price: Option<Value>,
    #[serde(alias = "amount")]
    pub unit: Option<String>,
    pub discount: Option<Value>,
    #[serde(alias = "originalPrice")]
    pub original_price: Option<Value>,
    #[serde(alias = "imageUrl")]
    pub image_url: Option<String>,
    pub brand: Option<String>,
    #[serde(alias = "validFrom")]
    pub valid_from: Option<DateTime<Utc>>,
    #[serde(alias = "validTo")]
    pub valid_to: Option<DateTime<Utc>>,
    pub category: Option<String>,
    pub page: Option<i64>,
    #[serde(alias = "rawText")]
    pub raw_text: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
