//! Dotted-path navigation into JSON documents.
//!
//! Paths are sequences of segments separated by [`DELIMITER`]. Each segment
//! indexes into a mapping by key or into a sequence by integer position. A
//! missing intermediate segment yields "no value", never an error.

use serde_json::{Map, Value};

/// Path segment delimiter.
pub const DELIMITER: char = '.';

/// Navigates a dotted path into a JSON document.
///
/// Returns `None` when any segment is absent or indexes into a scalar.
/// The empty path selects the document itself.
pub fn get<'a>(document: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return Some(document);
    }

    let mut current = document;
    for segment in path.split(DELIMITER) {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Writes a value into a record at a dotted path.
///
/// Intermediate mappings are created as needed; an intermediate that exists
/// but is not a mapping is replaced by one. The empty path is a no-op.
pub fn set(target: &mut Map<String, Value>, path: &str, value: Value) {
    if path.is_empty() {
        return;
    }

    let segments: Vec<&str> = path.split(DELIMITER).collect();
    let mut current = target;
    for segment in &segments[..segments.len() - 1] {
        let slot = current
            .entry((*segment).to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }
        let Value::Object(map) = slot else {
            unreachable!("slot was just made an object");
        };
        current = map;
    }
    current.insert(segments[segments.len() - 1].to_string(), value);
}

/// Selects the records a dotted path addresses within a document.
///
/// A sequence at the path yields one record per element, an absent path
/// yields zero records, and any other value is the sole record. `None`
/// selects the document root.
pub fn records_at<'a>(document: &'a Value, path: Option<&str>) -> Vec<&'a Value> {
    let selected = match path {
        Some(path) => get(document, path),
        None => Some(document),
    };

    match selected {
        None => Vec::new(),
        Some(Value::Array(items)) => items.iter().collect(),
        Some(value) => vec![value],
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_get_nested() {
        let doc = json!({"result": {"symbols": [{"name": "BTC"}, {"name": "ETH"}]}});

        assert_eq!(
            get(&doc, "result.symbols.1.name"),
            Some(&json!("ETH"))
        );
        assert_eq!(get(&doc, "result.symbols"), Some(&json!([{"name": "BTC"}, {"name": "ETH"}])));
    }

    #[test]
    fn test_get_empty_path_selects_root() {
        let doc = json!({"a": 1});
        assert_eq!(get(&doc, ""), Some(&doc));
    }

    #[test]
    fn test_get_missing_segment_is_absent() {
        let doc = json!({"a": {"b": 1}});

        assert_eq!(get(&doc, "a.c"), None);
        assert_eq!(get(&doc, "x.y.z"), None);
        // Indexing into a scalar is a miss, not an error
        assert_eq!(get(&doc, "a.b.c"), None);
    }

    #[test]
    fn test_get_bad_array_index() {
        let doc = json!({"items": [1, 2]});

        assert_eq!(get(&doc, "items.5"), None);
        assert_eq!(get(&doc, "items.notanumber"), None);
    }

    #[test]
    fn test_set_creates_intermediates() {
        let mut record = Map::new();
        set(&mut record, "a.b.c", json!(42));

        assert_eq!(Value::Object(record), json!({"a": {"b": {"c": 42}}}));
    }

    #[test]
    fn test_set_replaces_scalar_intermediate() {
        let mut record = Map::new();
        set(&mut record, "a", json!(1));
        set(&mut record, "a.b", json!(2));

        assert_eq!(Value::Object(record), json!({"a": {"b": 2}}));
    }

    #[test]
    fn test_records_at_sequence() {
        let doc = json!({"data": [{"id": 1}, {"id": 2}]});

        let records = records_at(&doc, Some("data"));
        assert_eq!(records.len(), 2);
        assert_eq!(records[0], &json!({"id": 1}));
    }

    #[test]
    fn test_records_at_single_mapping() {
        let doc = json!({"data": {"id": 1}});

        let records = records_at(&doc, Some("data"));
        assert_eq!(records, vec![&json!({"id": 1})]);
    }

    #[test]
    fn test_records_at_absent() {
        let doc = json!({"data": {"id": 1}});

        assert!(records_at(&doc, Some("missing")).is_empty());
    }

    #[test]
    fn test_records_at_root() {
        let doc = json!([{"id": 1}, {"id": 2}, {"id": 3}]);

        assert_eq!(records_at(&doc, None).len(), 3);
    }
}
