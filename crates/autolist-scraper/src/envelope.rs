//! Splitting structured upstream responses into per-listing fragments.

use serde_json::Value;

use crate::types::RawFragment;

const COLLECTION_KEYS: [&str; 2] = ["listings", "results"];
pub(crate) const COUNT_KEYS: [&str; 3] = ["totalCount", "total", "resultCount"];

/// Per-listing fragments of one structured response, plus the upstream total
/// when the response declares one.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Envelope {
    pub fragments: Vec<RawFragment>,
    pub total_count: Option<i64>,
}

/// Breaks a structured response into one fragment per listing.
///
/// An object with a `listings` or `results` array yields its elements; a bare
/// array yields its elements; anything else is passed through as a single
/// fragment and left for normalization to accept or reject. Never fails.
#[must_use]
pub fn split_envelope(value: Value) -> Envelope {
    match value {
        Value::Array(items) => Envelope {
            fragments: items.into_iter().map(RawFragment::Structured).collect(),
            total_count: None,
        },
        Value::Object(mut map) => {
            let key = COLLECTION_KEYS
                .iter()
                .find(|k| map.get(**k).is_some_and(Value::is_array));

            match key {
                Some(key) => {
                    let total_count = COUNT_KEYS
                        .iter()
                        .find_map(|k| map.get(*k).and_then(value_as_count));
                    let items = match map.remove(*key) {
                        Some(Value::Array(items)) => items,
                        _ => Vec::new(),
                    };
                    Envelope {
                        fragments: items.into_iter().map(RawFragment::Structured).collect(),
                        total_count,
                    }
                }
                None => Envelope {
                    fragments: vec![RawFragment::Structured(Value::Object(map))],
                    total_count: None,
                },
            }
        }
        other => Envelope {
            fragments: vec![RawFragment::Structured(other)],
            total_count: None,
        },
    }
}

/// Reads the first of `keys` present on `obj` as a non-negative count.
pub(crate) fn read_count(obj: &Value, keys: &[&str]) -> Option<i64> {
    keys.iter().find_map(|k| obj.get(*k).and_then(value_as_count))
}

fn value_as_count(v: &Value) -> Option<i64> {
    v.as_i64()
        .or_else(|| v.as_str().and_then(|s| s.trim().replace(',', "").parse().ok()))
        .filter(|n| *n >= 0)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn listings_envelope_splits_and_reads_total() {
        let envelope = split_envelope(json!({
            "listings": [{"title": "a"}, {"title": "b"}],
            "totalCount": 1520
        }));
        assert_eq!(envelope.fragments.len(), 2);
        assert_eq!(envelope.total_count, Some(1520));
        assert_eq!(
            envelope.fragments[1],
            RawFragment::Structured(json!({"title": "b"}))
        );
    }

    #[test]
    fn results_envelope_reads_string_total() {
        let envelope = split_envelope(json!({"results": [{}], "resultCount": "2,048"}));
        assert_eq!(envelope.fragments.len(), 1);
        assert_eq!(envelope.total_count, Some(2048));
    }

    #[test]
    fn bare_array_has_no_total() {
        let envelope = split_envelope(json!([{"title": "a"}, 7]));
        assert_eq!(envelope.fragments.len(), 2);
        assert!(envelope.total_count.is_none());
    }

    #[test]
    fn single_record_passes_through() {
        let record = json!({"title": "2019 Ford F150", "url": "/x"});
        let envelope = split_envelope(record.clone());
        assert_eq!(envelope.fragments, vec![RawFragment::Structured(record)]);
    }

    #[test]
    fn non_array_listings_key_is_treated_as_a_record() {
        let envelope = split_envelope(json!({"listings": "none", "totalCount": 3}));
        assert_eq!(envelope.fragments.len(), 1);
        assert!(envelope.total_count.is_none());
    }

    #[test]
    fn negative_total_is_ignored() {
        let envelope = split_envelope(json!({"listings": [], "total": -1}));
        assert!(envelope.fragments.is_empty());
        assert!(envelope.total_count.is_none());
    }
}
