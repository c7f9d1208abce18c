//! Taxonomy filter decoding.
//!
//! The editor stores the selected terms as a JSON string:
//! `{"category": [{"id": 3}], "post_tag": [{"id": 7}, {"id": 9}]}`.
//! Anything that does not decode to that shape yields an empty filter.

use serde_json::Value;
use tracing::debug;

use crate::content::TermId;

/// Selected category and tag ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaxonomyFilter {
    pub category_ids: Vec<TermId>,
    pub tag_ids: Vec<TermId>,
}

impl TaxonomyFilter {
    /// Decode the `taxonomies` attribute.
    ///
    /// Accepts the JSON-encoded string the editor persists, or an already
    /// decoded object. Missing keys, malformed JSON and term entries without
    /// a usable id are skipped rather than reported.
    pub fn decode(raw: Option<&Value>) -> Self {
        let decoded = match raw {
            Some(Value::String(s)) if s.trim().is_empty() => return Self::default(),
            Some(Value::String(s)) => match serde_json::from_str::<Value>(s) {
                Ok(value) => value,
                Err(e) => {
                    debug!(error = %e, "ignoring malformed taxonomies attribute");
                    return Self::default();
                }
            },
            Some(value @ Value::Object(_)) => value.clone(),
            _ => return Self::default(),
        };

        Self {
            category_ids: term_ids(decoded.get("category")),
            tag_ids: term_ids(decoded.get("post_tag")),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.category_ids.is_empty() && self.tag_ids.is_empty()
    }
}

fn term_ids(terms: Option<&Value>) -> Vec<TermId> {
    let Some(terms) = terms.and_then(Value::as_array) else {
        return Vec::new();
    };

    terms
        .iter()
        .filter_map(|term| term.get("id"))
        .filter_map(|id| match id {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_both_taxonomies() {
        let raw = json!(r#"{"category":[{"id":3}],"post_tag":[{"id":7},{"id":9}]}"#);
        let filter = TaxonomyFilter::decode(Some(&raw));
        assert_eq!(filter.category_ids, vec![3]);
        assert_eq!(filter.tag_ids, vec![7, 9]);
    }

    #[test]
    fn missing_key_is_empty_list() {
        let raw = json!(r#"{"post_tag":[{"id":7}]}"#);
        let filter = TaxonomyFilter::decode(Some(&raw));
        assert!(filter.category_ids.is_empty());
        assert_eq!(filter.tag_ids, vec![7]);
    }

    #[test]
    fn absent_attribute_is_empty_filter() {
        assert!(TaxonomyFilter::decode(None).is_empty());
    }

    #[test]
    fn malformed_json_is_empty_filter() {
        let raw = json!("{not json");
        assert!(TaxonomyFilter::decode(Some(&raw)).is_empty());

        let raw = json!("[1, 2, 3]");
        assert!(TaxonomyFilter::decode(Some(&raw)).is_empty());

        let raw = json!("null");
        assert!(TaxonomyFilter::decode(Some(&raw)).is_empty());

        let raw = json!("");
        assert!(TaxonomyFilter::decode(Some(&raw)).is_empty());
    }

    #[test]
    fn accepts_decoded_object() {
        let raw = json!({ "category": [{ "id": 4, "name": "News" }] });
        assert_eq!(TaxonomyFilter::decode(Some(&raw)).category_ids, vec![4]);
    }

    #[test]
    fn skips_entries_without_usable_id() {
        let raw = json!(r#"{"category":[{"id":"5"},{"name":"x"},{"id":true},{"id":6}]}"#);
        assert_eq!(TaxonomyFilter::decode(Some(&raw)).category_ids, vec![5, 6]);
    }

    #[test]
    fn non_array_terms_are_ignored() {
        let raw = json!(r#"{"category":{"id":5}}"#);
        assert!(TaxonomyFilter::decode(Some(&raw)).is_empty());
    }
}
