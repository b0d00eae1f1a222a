//! HTTP transport seam.
//!
//! The connector talks to the backend exclusively through the [`Transport`]
//! trait so tests can substitute a recording mock and callers can bring
//! their own client. [`HttpTransport`] is the reqwest-backed default.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;

use crate::error::{Error, Result};

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

#[derive(Debug, Clone)]
pub enum RequestBody {
    Empty,
    Json(Value),
    Multipart {
        file_name: String,
        contents: Bytes,
        metadata: Value,
    },
}

/// One request as the connector hands it to the transport: a path relative
/// to the service URL plus query pairs, headers and body.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: RequestBody,
}

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Bytes,
}

/// An HTTP client capable of executing connector requests.
///
/// Implementations report connection-level failures as
/// [`Error::Transport`]; non-200 statuses are not errors at this layer,
/// the result parser decides what they mean.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse>;
}

/// Default transport over a shared reqwest client.
pub struct HttpTransport {
    base_url: String,
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        let client = reqwest::Client::builder()
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()
            .map_err(|err| Error::Configuration(format!("http client setup failed: {err}")))?;
        Ok(Self { base_url, client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        let url = format!("{}{}", self.base_url, request.path);
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self.client.request(method, url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::Multipart {
                file_name,
                contents,
                metadata,
            } => {
                let mime = mime_guess::from_path(&file_name).first_or_octet_stream();
                let file_part = reqwest::multipart::Part::bytes(contents.to_vec())
                    .file_name(file_name)
                    .mime_str(mime.essence_str())
                    .map_err(|err| {
                        Error::InvalidArgument(format!("invalid upload content type: {err}"))
                    })?;
                let form = reqwest::multipart::Form::new()
                    .part("File", file_part)
                    .text("metadata", metadata.to_string());
                builder.multipart(form)
            }
        };

        let response = builder.send().await.map_err(|_| Error::cannot_connect())?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|_| Error::cannot_connect())?;
        Ok(HttpResponse { status, body })
    }
}
