//! Binary content operations for the `File` entity type.
//!
//! Downloads return the raw bytes; file metadata (size, mime type) lives on
//! the File entity itself and comes through `get_by_id`. Uploads either
//! replace an existing file record with base64-encoded content inline, or
//! create one through a multipart request.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use bytes::Bytes;
use chrono::{SecondsFormat, Utc};
use serde_json::{Value, json};

use crate::client::Connector;
use crate::error::{Error, Result};
use crate::id::is_valid_id;
use crate::params::Params;
use crate::response::{parse_result, response_error};
use crate::transport::{HttpRequest, Method, RequestBody};

impl Connector {
    /// Raw contents of a file by its id.
    pub async fn get_binary(&self, id: &str) -> Result<Bytes> {
        if !is_valid_id(id) {
            return Err(Error::InvalidArgument(
                "id is invalid, use a correctly formatted id".into(),
            ));
        }
        let request = HttpRequest {
            method: Method::Get,
            path: format!("File.json/binary/{id}"),
            query: Vec::new(),
            headers: self.request_headers(),
            body: RequestBody::Empty,
        };
        let response = self.execute(request).await?;
        if response.status != 200 {
            return Err(response_error(&response.body, response.status));
        }
        Ok(response.body)
    }

    /// Uploads file contents.
    ///
    /// With an `id`, the existing file record is replaced and the contents
    /// travel base64-encoded in the JSON body. Without one, a new file is
    /// created through a multipart request with a `File` part and a
    /// `metadata` JSON part.
    pub async fn update_binary(
        &self,
        contents: Bytes,
        name: &str,
        destination_path: &str,
        id: Option<&str>,
    ) -> Result<Value> {
        let metadata = json!({ "path": destination_path });

        if let Some(id) = id.filter(|id| !id.is_empty()) {
            if !is_valid_id(id) {
                return Err(Error::InvalidArgument(
                    "id is invalid, use a correctly formatted id".into(),
                ));
            }
            let properties = json!({
                "filename": name,
                "length": contents.len(),
                "uploadDate": Utc::now().to_rfc3339_opts(SecondsFormat::Secs, false),
                "metadata": metadata,
                "content": BASE64.encode(&contents),
            });
            return self
                .do_put(&format!("File.json/crud/{id}"), &Params::default(), Some(properties))
                .await;
        }

        let request = HttpRequest {
            method: Method::Post,
            path: "File.json/binary".to_string(),
            query: Vec::new(),
            headers: self.request_headers(),
            body: RequestBody::Multipart {
                file_name: name.to_string(),
                contents,
                metadata,
            },
        };
        let response = self.execute(request).await?;
        parse_result(&response.body, response.status)
    }
}
