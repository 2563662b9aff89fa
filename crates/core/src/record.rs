//! Read-only view over an extracted record.
//!
//! Extraction output has no guaranteed shape. Every accessor here is total: a missing key, a
//! `null`, a blank string or a value of the wrong JSON type all read as "absent".

use nhcx_types::NonEmptyText;
use serde_json::{Map, Value};

/// A borrowed JSON object, or nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct Record<'a> {
    fields: Option<&'a Map<String, Value>>,
}

impl<'a> Record<'a> {
    /// Views `value` as a record. Anything other than a JSON object reads as an empty record.
    pub fn new(value: &'a Value) -> Self {
        Self {
            fields: value.as_object(),
        }
    }

    /// True when the record is absent or has no keys.
    pub fn is_empty(&self) -> bool {
        self.fields.map_or(true, Map::is_empty)
    }

    fn get(&self, key: &str) -> Option<&'a Value> {
        self.fields.and_then(|f| f.get(key))
    }

    /// Text at `key`. Numbers and booleans read as their textual form.
    pub fn text(&self, key: &str) -> Option<NonEmptyText> {
        self.get(key).and_then(value_text)
    }

    /// Nested record at `key`.
    pub fn record(&self, key: &str) -> Record<'a> {
        self.get(key).map(Record::new).unwrap_or_default()
    }

    /// First non-empty nested record among `keys`, for tolerated spelling variants.
    pub fn first_record(&self, keys: &[&str]) -> Record<'a> {
        keys.iter()
            .map(|key| self.record(key))
            .find(|r| !r.is_empty())
            .unwrap_or_default()
    }

    /// Object elements of the array at `key`; non-object elements are skipped.
    pub fn list(&self, key: &str) -> Vec<Record<'a>> {
        self.array(key)
            .iter()
            .filter(|v| v.is_object())
            .map(Record::new)
            .collect()
    }

    /// Non-blank text elements of the array at `key`.
    pub fn string_list(&self, key: &str) -> Vec<NonEmptyText> {
        self.array(key).iter().filter_map(value_text).collect()
    }

    fn array(&self, key: &str) -> &'a [Value] {
        self.get(key)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

fn value_text(value: &Value) -> Option<NonEmptyText> {
    match value {
        Value::String(s) => NonEmptyText::new(s).ok(),
        Value::Number(n) => NonEmptyText::new(n.to_string()).ok(),
        Value::Bool(b) => NonEmptyText::new(b.to_string()).ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn blank_and_null_read_as_absent() {
        let value = json!({"a": "", "b": "   ", "c": null, "d": " x "});
        let record = Record::new(&value);
        assert!(record.text("a").is_none());
        assert!(record.text("b").is_none());
        assert!(record.text("c").is_none());
        assert!(record.text("missing").is_none());
        assert_eq!(record.text("d").expect("present").as_str(), "x");
    }

    #[test]
    fn numbers_read_as_text() {
        let value = json!({"limitValue": 5000, "ratio": 2.5});
        let record = Record::new(&value);
        assert_eq!(record.text("limitValue").expect("number").as_str(), "5000");
        assert_eq!(record.text("ratio").expect("number").as_str(), "2.5");
    }

    #[test]
    fn non_object_is_empty() {
        let value = json!(["not", "an", "object"]);
        assert!(Record::new(&value).is_empty());
        assert!(Record::new(&json!({})).is_empty());
    }

    #[test]
    fn first_record_skips_empty_variants() {
        let value = json!({"organisation": {}, "organization": {"name": "Acme"}});
        let record = Record::new(&value).first_record(&["organisation", "organization"]);
        assert_eq!(record.text("name").expect("name").as_str(), "Acme");
    }

    #[test]
    fn lists_skip_wrong_element_types() {
        let value = json!({
            "coverages": [{"typeDisplay": "A"}, "junk", 3, {"typeDisplay": "B"}],
            "networks": ["NetA", "", null, "NetB", {"x": 1}],
        });
        let record = Record::new(&value);
        assert_eq!(record.list("coverages").len(), 2);
        let networks: Vec<String> = record
            .string_list("networks")
            .into_iter()
            .map(NonEmptyText::into_string)
            .collect();
        assert_eq!(networks, vec!["NetA", "NetB"]);
        assert!(record.list("missing").is_empty());
    }
}
