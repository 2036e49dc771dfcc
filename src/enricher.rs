//! Joins the actively-managed tag onto the normalized table and computes
//! the derived price-comparison fields.

use std::collections::HashMap;

use crate::models::{EnrichedRecord, NormalizedRecord};

/// Left-join the enrichment tags onto the record set by exact ticker
/// equality. Every output record has a resolved tag: present in the
/// secondary source means `true`, absent means `false`; there is no
/// third state. The price-change fields exist only when both the current
/// and closing price are present; the percentage additionally needs a
/// nonzero close.
pub fn enrich(records: Vec<NormalizedRecord>, tags: &HashMap<String, bool>) -> Vec<EnrichedRecord> {
    records
        .into_iter()
        .map(|record| {
            let actively_managed = tags.get(&record.ticker).copied().unwrap_or(false);

            let (price_change, price_change_percent) = match (record.price, record.close) {
                (Some(price), Some(close)) => {
                    let change = price - close;
                    let percent = (close != 0.0).then(|| change / close * 100.0);
                    (Some(change), percent)
                }
                _ => (None, None),
            };

            EnrichedRecord {
                record,
                actively_managed,
                price_change,
                price_change_percent,
            }
        })
        .collect()
}
