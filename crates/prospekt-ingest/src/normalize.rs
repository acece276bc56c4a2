//! Normalization from [`RawOfferRecord`] to the canonical [`Offer`].
//!
//! Price and percent parsing use manual string scanning rather than `regex`
//! to stay dependency-light; sources deliver money as JSON numbers or
//! locale-formatted strings (`"1,29"`, `"1.299,00 €"`) and both decimal
//! separators must be accepted.

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde_json::Value;

use prospekt_core::week::default_validity;
use prospekt_core::{Offer, Retailer};

use crate::error::NormalizeError;
use crate::types::RawOfferRecord;

/// Normalizes a whole extraction batch, dropping malformed records.
///
/// Each rejected record is logged at warn level with its reason; sibling
/// records in the same batch are unaffected. The record's position in the
/// batch becomes its identity ordinal, so ids stay stable across repeated
/// ingestion of the same extraction output.
#[must_use]
pub fn normalize_batch(
    raws: &[RawOfferRecord],
    retailer: Retailer,
    week_key: &str,
    run_time: DateTime<Utc>,
) -> Vec<Offer> {
    raws.iter()
        .enumerate()
        .filter_map(|(ordinal, raw)| {
            match normalize_record(raw, retailer, week_key, ordinal, run_time) {
                Ok(offer) => Some(offer),
                Err(e) => {
                    tracing::warn!(
                        retailer = %retailer,
                        error = %e,
                        "dropping raw record — normalization failed"
                    );
                    None
                }
            }
        })
        .collect()
}

/// Normalizes a single raw record into an [`Offer`].
///
/// `ordinal` is the record's position within the current batch; it
/// disambiguates identical titles in one run and makes the derived id total.
///
/// # Errors
///
/// Returns [`NormalizeError::EmptyTitle`] when the title is missing or
/// blank, and [`NormalizeError::InvalidPrice`] when the price is missing,
/// unparsable, or negative. Malformed optional fields (`original_price`,
/// `discount`, validity window) degrade to absent instead of rejecting the
/// record.
pub fn normalize_record(
    raw: &RawOfferRecord,
    retailer: Retailer,
    week_key: &str,
    ordinal: usize,
    run_time: DateTime<Utc>,
) -> Result<Offer, NormalizeError> {
    let title = raw
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(NormalizeError::EmptyTitle { ordinal })?
        .to_owned();

    let price = match raw.price.as_ref() {
        Some(value) => decimal_from_value(value).ok_or_else(|| NormalizeError::InvalidPrice {
            ordinal,
            title: title.clone(),
            value: value.to_string(),
        })?,
        None => {
            return Err(NormalizeError::InvalidPrice {
                ordinal,
                title,
                value: "<missing>".to_owned(),
            })
        }
    };
    if price.is_sign_negative() {
        return Err(NormalizeError::InvalidPrice {
            ordinal,
            title,
            value: price.to_string(),
        });
    }

    let original_price = raw
        .original_price
        .as_ref()
        .and_then(decimal_from_value)
        .filter(|p| !p.is_sign_negative());

    // An extractor-supplied percentage is trusted as-is; only the derived
    // value is clamped.
    let discount_percent = raw
        .discount
        .as_ref()
        .and_then(percent_from_value)
        .or_else(|| derive_discount(original_price, price));

    let (valid_from, valid_to) = match (raw.valid_from, raw.valid_to) {
        (Some(from), Some(to)) if from <= to => (from, to),
        _ => default_validity(run_time),
    };

    let mut metadata = raw.extra.clone();
    if let Some(raw_text) = raw.raw_text.as_deref() {
        metadata.insert("raw_text".to_owned(), Value::String(raw_text.to_owned()));
    }

    let id = format!(
        "{}-{}-{}-{}",
        retailer.prefix(),
        week_key,
        slug(&title),
        ordinal
    );

    Ok(Offer {
        id,
        retailer,
        title,
        price,
        unit: trimmed(raw.unit.as_deref()),
        original_price,
        discount_percent,
        valid_from,
        valid_to,
        image_url: raw.image_url.as_deref().map(str::trim).unwrap_or_default().to_owned(),
        brand: trimmed(raw.brand.as_deref()),
        category: trimmed(raw.category.as_deref()),
        page: raw.page,
        week_key: week_key.to_owned(),
        updated_at: run_time,
        metadata,
    })
}

fn trimmed(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}

/// Derived discount: `round(100 * (original - price) / original)`, clamped
/// to `[0, 100]`. Requires a strictly positive original price.
fn derive_discount(original: Option<Decimal>, price: Decimal) -> Option<Decimal> {
    let original = original?;
    if original <= Decimal::ZERO {
        return None;
    }
    let percent = (original - price) * Decimal::ONE_HUNDRED / original;
    let rounded = percent.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    Some(rounded.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED))
}

/// Parses a money-like JSON value: a number, or a locale-formatted string.
fn decimal_from_value(value: &Value) -> Option<Decimal> {
    match value {
        // Going through the number's literal text keeps 0.99 exact instead
        // of routing it through f64.
        Value::Number(n) => n.to_string().parse().ok(),
        Value::String(s) => parse_money(s),
        _ => None,
    }
}

/// Like [`decimal_from_value`] but tolerates a trailing percent sign.
fn percent_from_value(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => n.to_string().parse().ok(),
        Value::String(s) => parse_money(&s.replace('%', "")),
        _ => None,
    }
}

/// Parses a locale-formatted money string.
///
/// Currency signs and whitespace are stripped. When both `.` and `,` occur,
/// the rightmost one is the decimal separator and the other groups
/// thousands (`"1.299,00"` and `"1,299.00"` both parse to `1299.00`); a
/// lone `,` is a decimal separator.
pub(crate) fn parse_money(s: &str) -> Option<Decimal> {
    let cleaned: String = s
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '€')
        .collect();
    if cleaned.is_empty() {
        return None;
    }

    let normalized = match (cleaned.rfind(','), cleaned.rfind('.')) {
        (Some(comma), Some(dot)) => {
            if comma > dot {
                cleaned.replace('.', "").replace(',', ".")
            } else {
                cleaned.replace(',', "")
            }
        }
        (Some(_), None) => cleaned.replace(',', "."),
        _ => cleaned,
    };

    normalized.parse().ok()
}

/// Lowercased title slug: non-alphanumeric runs become a single `-`,
/// leading/trailing dashes are trimmed, and the result is capped at 40
/// characters.
pub(crate) fn slug(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    let mut pending_dash = false;
    for c in title.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            out.push(c);
            pending_dash = false;
        } else {
            pending_dash = true;
        }
    }
    out.truncate(40);
    while out.ends_with('-') {
        out.pop();
    }
    out
}
