//! Request options and the field-selection preprocessor.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

/// Field selection for a request: either the normalized mapping form the
/// backend expects (field name -> 1 include / 0 exclude) or an ordered list
/// of field names, each optionally prefixed `+` (include) or `-` (exclude),
/// default include.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldSpec {
    List(Vec<String>),
    Map(BTreeMap<String, u8>),
}

impl FieldSpec {
    /// Normalizes into the mapping form. The map form passes through
    /// unchanged; for the list form, later entries win on duplicate names.
    pub fn normalize(&self) -> BTreeMap<String, u8> {
        match self {
            FieldSpec::Map(fields) => fields.clone(),
            FieldSpec::List(entries) => {
                let mut fields = BTreeMap::new();
                for entry in entries {
                    let (name, include) = match entry.as_bytes().first() {
                        Some(b'+') => (&entry[1..], 1),
                        Some(b'-') => (&entry[1..], 0),
                        _ => (entry.as_str(), 1),
                    };
                    fields.insert(name.to_string(), include);
                }
                fields
            }
        }
    }
}

impl<S: Into<String>, const N: usize> From<[S; N]> for FieldSpec {
    fn from(entries: [S; N]) -> Self {
        FieldSpec::List(entries.into_iter().map(Into::into).collect())
    }
}

impl<S: Into<String>> From<Vec<S>> for FieldSpec {
    fn from(entries: Vec<S>) -> Self {
        FieldSpec::List(entries.into_iter().map(Into::into).collect())
    }
}

impl From<BTreeMap<String, u8>> for FieldSpec {
    fn from(fields: BTreeMap<String, u8>) -> Self {
        FieldSpec::Map(fields)
    }
}

/// Options merged into the query string of a request.
///
/// `fields` is normalized before transmission; everything else passes
/// through unchanged. Non-scalar values are JSON-encoded on the wire.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    fields: Option<FieldSpec>,
    limit: Option<u64>,
    skip: Option<u64>,
    sort: Option<String>,
    extra: BTreeMap<String, Value>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fields(mut self, fields: impl Into<FieldSpec>) -> Self {
        self.fields = Some(fields.into());
        self
    }

    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_skip(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }

    pub fn with_sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = Some(sort.into());
        self
    }

    /// Any additional backend-defined option.
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Whether the caller asked for an explicit result order.
    pub fn has_sort(&self) -> bool {
        self.sort.is_some() || self.extra.contains_key("sort")
    }

    /// Normalizes the field spec and flattens everything into query-string
    /// pairs. The fields mapping is sent as a JSON object.
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if let Some(fields) = &self.fields {
            let mut map = Map::new();
            for (name, include) in fields.normalize() {
                map.insert(name, Value::from(include));
            }
            pairs.push(("fields".to_string(), Value::Object(map).to_string()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit".to_string(), limit.to_string()));
        }
        if let Some(skip) = self.skip {
            pairs.push(("skip".to_string(), skip.to_string()));
        }
        if let Some(sort) = &self.sort {
            pairs.push(("sort".to_string(), sort.clone()));
        }
        for (key, value) in &self.extra {
            let rendered = match value {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            };
            pairs.push((key.clone(), rendered));
        }
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn list_spec_normalizes_prefixes() {
        let spec = FieldSpec::from(["+a", "-b", "c"]);
        let normalized = spec.normalize();
        assert_eq!(
            normalized,
            BTreeMap::from([
                ("a".to_string(), 1),
                ("b".to_string(), 0),
                ("c".to_string(), 1),
            ])
        );
    }

    #[test]
    fn map_spec_passes_through_unchanged() {
        let fields = BTreeMap::from([("a".to_string(), 1), ("b".to_string(), 0)]);
        let spec = FieldSpec::Map(fields.clone());
        assert_eq!(spec.normalize(), fields);
    }

    #[test]
    fn later_duplicate_entries_win() {
        let spec = FieldSpec::from(["+a", "-a"]);
        assert_eq!(spec.normalize(), BTreeMap::from([("a".to_string(), 0)]));
    }

    #[test]
    fn query_pairs_carry_normalized_fields_and_passthrough_keys() {
        let params = Params::new()
            .with_fields(["+a", "-b", "c"])
            .with_limit(5)
            .with_sort("lastName")
            .with_extra("includeMetadata", json!(true));
        let pairs = params.to_query_pairs();
        assert_eq!(
            pairs,
            vec![
                ("fields".to_string(), r#"{"a":1,"b":0,"c":1}"#.to_string()),
                ("limit".to_string(), "5".to_string()),
                ("sort".to_string(), "lastName".to_string()),
                ("includeMetadata".to_string(), "true".to_string()),
            ]
        );
    }

    #[test]
    fn sort_detection_covers_extras() {
        assert!(!Params::new().with_limit(1).has_sort());
        assert!(Params::new().with_sort("x").has_sort());
        assert!(Params::new().with_extra("sort", json!("x")).has_sort());
    }
}
