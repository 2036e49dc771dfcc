//! Flattens the nested screener payload into uniform records.
//!
//! Pure: no I/O, no mutation of the input, and normalizing the same
//! payload twice yields identical output.

use serde_json::Value;
use tracing::warn;

use crate::models::{NormalizedRecord, RawScreenerEntry};

/// Turn the raw screener document into one `NormalizedRecord` per ticker.
///
/// The feed nests its entries under `data.data`; when that envelope is
/// missing the result is an empty table, which downstream treats as the
/// recoverable "no data available" state rather than an error. One
/// unreadable entry degrades to a ticker-only record so it cannot
/// discard the rest of the batch.
pub fn normalize(payload: &Value) -> Vec<NormalizedRecord> {
    let entries = match payload
        .get("data")
        .and_then(|d| d.get("data"))
        .and_then(|d| d.as_object())
    {
        Some(map) => map,
        None => {
            warn!("screener payload missing data envelope, treating as empty");
            return Vec::new();
        }
    };

    let mut records: Vec<NormalizedRecord> = entries
        .iter()
        .map(|(ticker, attributes)| {
            let raw = serde_json::from_value::<RawScreenerEntry>(attributes.clone())
                .unwrap_or_else(|e| {
                    warn!("unreadable attributes for {}: {}", ticker, e);
                    RawScreenerEntry::default()
                });
            NormalizedRecord::from_raw(ticker, raw)
        })
        .collect();

    // Deterministic output order regardless of the feed's map ordering.
    records.sort_by(|a, b| a.ticker.cmp(&b.ticker));
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn spy_payload() -> Value {
        json!({
            "data": {
                "data": {
                    "SPY": {
                        "issuer": "SSGA",
                        "aum": 450000,
                        "price": 560.12,
                        "expenseRatio": 0.0945
                    }
                }
            }
        })
    }

    #[test]
    fn test_spy_scenario() {
        let records = normalize(&spy_payload());

        assert_eq!(records.len(), 1);
        let spy = &records[0];
        assert_eq!(spy.ticker, "SPY");
        assert_eq!(spy.issuer, "SSGA");
        assert_eq!(spy.aum_display(), "$450,000.00M");
        assert_eq!(spy.price_display(), "$560.12");
        assert_eq!(spy.expense_ratio_display(), "9.45%");
    }

    #[test]
    fn test_one_record_per_entry() {
        let payload = json!({
            "data": {
                "data": {
                    "SPY": { "issuer": "SSGA" },
                    "QQQ": { "issuer": "Invesco" },
                    "VTI": { "issuer": "Vanguard" }
                }
            }
        });

        let records = normalize(&payload);
        assert_eq!(records.len(), 3);
        let tickers: Vec<&str> = records.iter().map(|r| r.ticker.as_str()).collect();
        assert_eq!(tickers, vec!["QQQ", "SPY", "VTI"]);
    }

    #[test]
    fn test_missing_data_key_yields_empty() {
        assert_eq!(normalize(&json!({})), Vec::new());
        assert_eq!(normalize(&json!({"data": {}})), Vec::new());
        assert_eq!(normalize(&json!({"data": {"data": 42}})), Vec::new());
        assert_eq!(normalize(&json!(null)), Vec::new());
    }

    #[test]
    fn test_bad_entry_does_not_discard_batch() {
        let payload = json!({
            "data": {
                "data": {
                    "SPY": { "issuer": "SSGA" },
                    "BAD": null
                }
            }
        });

        let records = normalize(&payload);
        assert_eq!(records.len(), 2);
        let bad = records.iter().find(|r| r.ticker == "BAD").unwrap();
        assert_eq!(bad.issuer, "");
        assert_eq!(bad.price, None);
    }

    #[test]
    fn test_tickers_uppercased() {
        let payload = json!({ "data": { "data": { "spy": {} } } });
        let records = normalize(&payload);
        assert_eq!(records[0].ticker, "SPY");
    }

    #[test]
    fn test_idempotence() {
        let payload = spy_payload();
        assert_eq!(normalize(&payload), normalize(&payload));
    }
}
