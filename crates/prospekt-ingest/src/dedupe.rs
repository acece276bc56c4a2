//! Collapsing raw duplicates that describe the same physical offer.
//!
//! Extraction output routinely contains the same leaflet item more than
//! once (overlapping page regions, repeated OCR passes). Two offers are the
//! same physical offer when they agree on normalized title, price, and
//! start of validity; the survivor is the more complete record, judged by
//! its brand field.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use prospekt_core::Offer;

#[derive(PartialEq, Eq, Hash)]
struct DedupKey {
    title: String,
    price: Decimal,
    valid_from: DateTime<Utc>,
}

/// Collapses offers sharing `(normalized title, price, valid_from)`.
///
/// For each collision the offer with the longest non-empty brand wins and
/// contributes ALL of its fields; ties keep the first-seen record.
/// First-seen key order is preserved in the output.
#[must_use]
pub fn dedupe(offers: Vec<Offer>) -> Vec<Offer> {
    let mut kept: Vec<Offer> = Vec::with_capacity(offers.len());
    let mut index: HashMap<DedupKey, usize> = HashMap::new();

    for offer in offers {
        let key = DedupKey {
            title: offer.title.trim().to_lowercase(),
            price: offer.price,
            valid_from: offer.valid_from,
        };
        match index.get(&key) {
            Some(&slot) => {
                if brand_len(&offer) > brand_len(&kept[slot]) {
                    kept[slot] = offer;
                }
            }
            None => {
                index.insert(key, kept.len());
                kept.push(offer);
            }
        }
    }

    kept
}

fn brand_len(offer: &Offer) -> usize {
    offer.brand.as_deref().map_or(0, |b| b.trim().len())
}
