//! Change-log operations.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::client::{Connector, expect_documents};
use crate::error::Result;
use crate::params::Params;

/// One change-log entry. The `id` names the version document, which can be
/// fetched through [`Connector::get_by_id`] with a version argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(rename = "updatedBy")]
    pub updated_by: String,
    /// ISO 8601 timestamp, as the backend formats it.
    #[serde(rename = "updatedAt")]
    pub updated_at: String,
    #[serde(rename = "_id")]
    pub id: String,
}

impl Connector {
    /// Ordered change log for an entity, newest first as the backend
    /// returns it.
    pub async fn get_history(&self, entity_type: &str, id: &str) -> Result<Vec<HistoryEntry>> {
        let value = self
            .do_get(&format!("{entity_type}.json/history/{id}"), &Params::default())
            .await?;
        let documents = expect_documents(value)?;
        let mut entries = Vec::with_capacity(documents.len());
        for document in documents {
            entries.push(HistoryEntry {
                updated_by: string_field(&document, "updatedBy"),
                updated_at: string_field(&document, "updatedAt"),
                id: string_field(&document, "_id"),
            });
        }
        Ok(entries)
    }
}

fn string_field(document: &Value, field: &str) -> String {
    document
        .get(field)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{MockTransport, connector};
    use crate::transport::Method;

    #[tokio::test]
    async fn history_lists_change_entries_in_order() {
        let body = r#"[
            {"updatedBy":"Henk Jansen","updatedAt":"2026-07-01T10:00:00+02:00","_id":"54b7ed2b49726734cab0570c"},
            {"updatedBy":"Piet de Vries","updatedAt":"2026-06-01T09:00:00+02:00","_id":"507f191e810c19729de860ea"}
        ]"#;
        let transport = MockTransport::new().reply(200, body);
        let entries = connector(&transport)
            .get_history("Invoice", "507f1f77bcf86cd799439011")
            .await
            .unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].updated_by, "Henk Jansen");
        assert_eq!(entries[0].id, "54b7ed2b49726734cab0570c");
        assert_eq!(entries[1].updated_at, "2026-06-01T09:00:00+02:00");

        let request = &transport.requests()[0];
        assert_eq!(request.method, Method::Get);
        assert_eq!(
            request.path,
            "Invoice.json/history/507f1f77bcf86cd799439011"
        );
    }

    #[tokio::test]
    async fn sparse_entries_fall_back_to_empty_strings() {
        let transport = MockTransport::new().reply(200, r#"[{"_id":"507f1f77bcf86cd799439011"}]"#);
        let entries = connector(&transport)
            .get_history("Person", "507f1f77bcf86cd799439011")
            .await
            .unwrap();
        assert_eq!(entries[0].updated_by, "");
        assert_eq!(entries[0].id, "507f1f77bcf86cd799439011");
    }
}
