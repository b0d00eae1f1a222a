//! Document references and the path walker behind `get_by_ref`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

/// One step of a reference path: a field lookup, optionally followed by
/// selecting the element of an array-of-documents whose `_id` matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathStep {
    pub field: String,
    #[serde(
        rename = "objectId",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub object_id: Option<String>,
}

/// A structured pointer locating a value nested within a document: root
/// entity type and id plus a path of field / array-element steps.
///
/// Known limitation: multi-level `parent.parent.parent` chains are not
/// supported; only a single synthetic `parent` root is honored, and it
/// requires the caller to pass the parent document along.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentReference {
    #[serde(rename = "rootDocumentEntityType")]
    pub root_document_entity_type: String,
    #[serde(rename = "rootDocumentId")]
    pub root_document_id: String,
    #[serde(default)]
    pub path: Vec<PathStep>,
}

impl DocumentReference {
    pub fn new(entity_type: impl Into<String>, document_id: impl Into<String>) -> Self {
        Self {
            root_document_entity_type: entity_type.into(),
            root_document_id: document_id.into(),
            path: Vec::new(),
        }
    }

    /// Appends a plain field step.
    pub fn field(mut self, field: impl Into<String>) -> Self {
        self.path.push(PathStep {
            field: field.into(),
            object_id: None,
        });
        self
    }

    /// Appends a field step that selects an array element by `_id`.
    pub fn element(mut self, field: impl Into<String>, object_id: impl Into<String>) -> Self {
        self.path.push(PathStep {
            field: field.into(),
            object_id: Some(object_id.into()),
        });
        self
    }
}

/// Walks a path over a root document.
///
/// An explicit loop over the typed steps so failures can name the step that
/// broke: a missing field is [`Error::PathNotFound`], an object-id step over
/// a non-array is [`Error::InvalidPath`], and an object-id with no matching
/// element is [`Error::EmptyResult`].
pub fn resolve_path(document: &Value, path: &[PathStep]) -> Result<Value> {
    let mut container = document;
    for (index, step) in path.iter().enumerate() {
        container = container.get(step.field.as_str()).ok_or_else(|| {
            Error::PathNotFound(format!(
                "could not find '{}' (step {}) in document",
                step.field,
                index + 1
            ))
        })?;

        let Some(object_id) = &step.object_id else {
            continue;
        };
        let Value::Array(elements) = container else {
            return Err(Error::InvalidPath(format!(
                "'{}' (step {}) does not hold an array of documents",
                step.field,
                index + 1
            )));
        };
        container = elements
            .iter()
            .find(|element| {
                element.get("_id").and_then(Value::as_str) == Some(object_id.as_str())
            })
            .ok_or_else(|| {
                Error::EmptyResult(format!(
                    "no element with _id '{}' under '{}'",
                    object_id, step.field
                ))
            })?;
    }
    Ok(container.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn document() -> Value {
        json!({
            "_id": "1234",
            "singlePathToAttribute": "value",
            "multiplePathToAttribute": {"field": "value"},
            "multiplePathToAttributeDepth": {"field": {"field": "value"}},
            "singlePathToArrayObject": [{"_id": "value"}],
            "multiplePathToArrayObject": {"field": [{"_id": "value"}]},
        })
    }

    fn field(name: &str) -> PathStep {
        PathStep {
            field: name.to_string(),
            object_id: None,
        }
    }

    fn element(name: &str, object_id: &str) -> PathStep {
        PathStep {
            field: name.to_string(),
            object_id: Some(object_id.to_string()),
        }
    }

    #[test]
    fn single_field_step_reaches_an_attribute() {
        let result = resolve_path(&document(), &[field("singlePathToAttribute")]).unwrap();
        assert_eq!(result, json!("value"));
    }

    #[test]
    fn nested_field_steps_reach_an_attribute() {
        let result = resolve_path(
            &document(),
            &[field("multiplePathToAttribute"), field("field")],
        )
        .unwrap();
        assert_eq!(result, json!("value"));

        let result = resolve_path(
            &document(),
            &[
                field("multiplePathToAttributeDepth"),
                field("field"),
                field("field"),
            ],
        )
        .unwrap();
        assert_eq!(result, json!("value"));
    }

    #[test]
    fn object_id_step_selects_the_matching_element() {
        let result =
            resolve_path(&document(), &[element("singlePathToArrayObject", "value")]).unwrap();
        assert_eq!(result, json!({"_id": "value"}));

        let result = resolve_path(
            &document(),
            &[
                field("multiplePathToArrayObject"),
                element("field", "value"),
            ],
        )
        .unwrap();
        assert_eq!(result, json!({"_id": "value"}));
    }

    #[test]
    fn missing_field_is_path_not_found() {
        let err = resolve_path(&document(), &[field("nope")]).unwrap_err();
        assert!(matches!(err, Error::PathNotFound(_)), "{err:?}");
    }

    #[test]
    fn object_id_over_scalar_is_invalid_path() {
        let err =
            resolve_path(&document(), &[element("singlePathToAttribute", "x")]).unwrap_err();
        assert!(matches!(err, Error::InvalidPath(_)), "{err:?}");
    }

    #[test]
    fn unmatched_object_id_is_empty_result() {
        let err =
            resolve_path(&document(), &[element("singlePathToArrayObject", "z")]).unwrap_err();
        assert!(matches!(err, Error::EmptyResult(_)), "{err:?}");
    }

    #[test]
    fn empty_path_returns_the_document_itself() {
        let result = resolve_path(&document(), &[]).unwrap();
        assert_eq!(result, document());
    }

    #[test]
    fn reference_serializes_with_wire_names() {
        let reference = DocumentReference::new("Person", "507f1f77bcf86cd799439011")
            .field("addresses")
            .element("phoneNumbers", "507f191e810c19729de860ea");
        let wire = serde_json::to_value(&reference).unwrap();
        assert_eq!(
            wire,
            json!({
                "rootDocumentEntityType": "Person",
                "rootDocumentId": "507f1f77bcf86cd799439011",
                "path": [
                    {"field": "addresses"},
                    {"field": "phoneNumbers", "objectId": "507f191e810c19729de860ea"},
                ],
            })
        );
        let parsed: DocumentReference = serde_json::from_value(wire).unwrap();
        assert_eq!(parsed, reference);
    }
}
