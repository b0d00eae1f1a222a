//! The connector facade: construction, configuration and the core
//! CRUD/search operation set. History and binary operations live in their
//! own modules as further `impl Connector` blocks.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, OnceLock};

use serde_json::{Map, Value};

use crate::error::{DecodeKind, Error, Result};
use crate::id::is_valid_id;
use crate::logging::QueryLogger;
use crate::params::Params;
use crate::query;
use crate::reference::{DocumentReference, resolve_path};
use crate::response::parse_result;
use crate::transport::{
    HttpRequest, HttpResponse, HttpTransport, Method, RequestBody, Transport,
};

/// The official service URL; override via [`Connector::with_service_url`].
pub const SERVICE_PRODUCTION_URL: &str = "https://api.docbase.io/0.2/";

const USER_AGENT: &str = concat!("docbase-client-rs/", env!("CARGO_PKG_VERSION"));

/// DocBase data connector.
///
/// Stateless across calls apart from the lazily-initialized transport and
/// the configuration set at construction. The connector never retries and
/// never synthesizes timeouts; callers own both.
pub struct Connector {
    api_key: String,
    service_url: String,
    extra_headers: BTreeMap<String, String>,
    transport: OnceLock<Arc<dyn Transport>>,
    logger: Option<Arc<dyn QueryLogger>>,
}

impl Connector {
    /// A connector against the production service URL.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            service_url: SERVICE_PRODUCTION_URL.to_string(),
            extra_headers: BTreeMap::new(),
            transport: OnceLock::new(),
            logger: None,
        }
    }

    pub fn with_service_url(mut self, service_url: impl Into<String>) -> Self {
        self.service_url = service_url.into();
        self
    }

    /// Injects a transport, e.g. a mock. An injected transport also skips
    /// the API-key check, since no default client needs to be built.
    pub fn with_transport(self, transport: Arc<dyn Transport>) -> Self {
        let _ = self.transport.set(transport);
        self
    }

    /// Extra headers sent with every request. Keys are lowercased; a `host`
    /// entry is applied as a `Host` override per request.
    pub fn with_extra_headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (key, value) in headers {
            self.extra_headers
                .insert(key.into().to_ascii_lowercase(), value.into());
        }
        self
    }

    pub fn with_query_logger(mut self, logger: Arc<dyn QueryLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Field layout of an entity type, from the backend's own definition:
    /// `_id` plus every attribute title, each mapped to null.
    pub async fn get_template(&self, entity_type: &str) -> Result<Map<String, Value>> {
        let params = Params::new().with_fields(["attributes.title"]).with_limit(1);
        let definitions = self
            .search("EntityType", query::eq("title", entity_type), params)
            .await?;
        let Some(definition) = definitions.first() else {
            return Err(Error::NotFound(format!(
                "no entity type definition found for '{entity_type}'"
            )));
        };

        let mut template = Map::new();
        template.insert("_id".to_string(), Value::Null);
        if let Some(attributes) = definition.get("attributes").and_then(Value::as_array) {
            for attribute in attributes {
                if let Some(title) = attribute.get("title").and_then(Value::as_str) {
                    template.insert(title.to_string(), Value::Null);
                }
            }
        }
        Ok(template)
    }

    /// A single entity by id; with `version`, the historical snapshot at
    /// that version instead of the live document.
    pub async fn get_by_id(
        &self,
        entity_type: &str,
        id: &str,
        params: Params,
        version: Option<&str>,
    ) -> Result<Value> {
        if id.is_empty() {
            return Err(Error::InvalidArgument("id is empty".into()));
        }
        if !is_valid_id(id) {
            return Err(Error::InvalidArgument(
                "id is invalid, use a correctly formatted id".into(),
            ));
        }
        match version {
            None => {
                self.do_get(&format!("{entity_type}.json/crud/{id}"), &params)
                    .await
            }
            Some(version) => {
                self.do_get(&format!("{entity_type}.json/history/{id}/{version}"), &params)
                    .await
            }
        }
    }

    /// Resolves a document reference to the value it points at.
    ///
    /// `parent_document` avoids a redundant fetch when the caller already
    /// holds the root document; it is required when the reference's root
    /// entity type is the synthetic `parent` pseudo-type.
    pub async fn get_by_ref(
        &self,
        reference: &DocumentReference,
        parent_document: Option<&Value>,
    ) -> Result<Value> {
        if reference.root_document_entity_type.is_empty() && reference.path.is_empty() {
            return Err(Error::InvalidReference(
                "reference needs a root entity type and a path".into(),
            ));
        }

        if reference.root_document_entity_type.contains("parent") {
            let parent = parent_document.ok_or_else(|| {
                Error::InvalidReference("a 'parent' reference requires the parent document".into())
            })?;
            return resolve_path(parent, &reference.path);
        }

        let fetched;
        let document = match parent_document {
            Some(parent)
                if parent.get("_id").and_then(Value::as_str)
                    == Some(reference.root_document_id.as_str()) =>
            {
                parent
            }
            _ => {
                fetched = self
                    .get_by_id(
                        &reference.root_document_entity_type,
                        &reference.root_document_id,
                        Params::default(),
                        None,
                    )
                    .await?;
                let empty = match &fetched {
                    Value::Object(map) => map.is_empty(),
                    Value::Array(items) => items.is_empty(),
                    _ => true,
                };
                if empty {
                    return Err(Error::NotFound(
                        "invalid document reference (document cannot be found by id)".into(),
                    ));
                }
                &fetched
            }
        };
        resolve_path(document, &reference.path)
    }

    /// Entities for the given ids, in one search.
    ///
    /// Ids are deduplicated (first occurrence wins) and filtered to valid
    /// ones; with nothing left the transport is never touched. Unless the
    /// caller asked for an explicit `sort`, results are reordered to the
    /// caller's id order and ids without a match are dropped.
    pub async fn get_by_ids<I, S>(
        &self,
        entity_type: &str,
        ids: I,
        params: Params,
    ) -> Result<Vec<Value>>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut valid_ids: Vec<String> = Vec::new();
        for id in ids {
            let id = id.into();
            if is_valid_id(&id) && !valid_ids.contains(&id) {
                valid_ids.push(id);
            }
        }
        if entity_type.is_empty() || valid_ids.is_empty() {
            return Ok(Vec::new());
        }

        let keep_backend_order = params.has_sort();
        let selector = query::in_list("_id", valid_ids.clone());
        let results = self.search(entity_type, selector, params).await?;
        if keep_backend_order {
            return Ok(results);
        }

        let mut by_id: HashMap<String, Value> = HashMap::new();
        for result in results {
            let id = result
                .get("_id")
                .and_then(Value::as_str)
                .map(str::to_string);
            if let Some(id) = id {
                by_id.insert(id, result);
            }
        }
        Ok(valid_ids.iter().filter_map(|id| by_id.remove(id)).collect())
    }

    /// All entities of a type.
    pub async fn get_all(&self, entity_type: &str, params: Params) -> Result<Vec<Value>> {
        let value = self
            .do_get(&format!("{entity_type}.json/crud/"), &params)
            .await?;
        expect_documents(value)
    }

    /// Ids of the entities matched by a search.
    pub async fn get_ids(
        &self,
        entity_type: &str,
        selector: Value,
        params: Params,
    ) -> Result<Vec<String>> {
        let params = params.with_fields(BTreeMap::from([("_id".to_string(), 1)]));
        let results = self.search(entity_type, selector, params).await?;
        Ok(results
            .iter()
            .filter_map(|result| result.get("_id").and_then(Value::as_str))
            .map(str::to_string)
            .collect())
    }

    /// First matching id, or `None` when the search comes up empty.
    pub async fn get_id(&self, entity_type: &str, selector: Value) -> Result<Option<String>> {
        let ids = self
            .get_ids(entity_type, selector, Params::new().with_limit(1))
            .await?;
        Ok(ids.into_iter().next())
    }

    /// Runs an aggregation pipeline; both the pipeline and the result are
    /// backend-defined and pass through verbatim.
    pub async fn aggregate(&self, entity_type: &str, pipeline: Vec<Value>) -> Result<Value> {
        self.do_post(
            &format!("{entity_type}.json/aggregate"),
            &Params::default(),
            Some(Value::Array(pipeline)),
        )
        .await
    }

    /// Searches by selector; params go into the query string.
    pub async fn search(
        &self,
        entity_type: &str,
        selector: Value,
        params: Params,
    ) -> Result<Vec<Value>> {
        let value = self
            .do_post(&format!("{entity_type}.json/search"), &params, Some(selector))
            .await?;
        expect_documents(value)
    }

    /// Saves an entity: without an `_id` this creates, with one it performs
    /// a full replace. On replace the caller supplies all required fields;
    /// partial updates are not a thing at this layer.
    pub async fn update(&self, entity_type: &str, properties: Value) -> Result<Value> {
        let id = properties
            .get("_id")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .map(str::to_string);
        match id {
            Some(id) => {
                self.do_put(
                    &format!("{entity_type}.json/crud/{id}"),
                    &Params::default(),
                    Some(properties),
                )
                .await
            }
            None => {
                self.do_post(
                    &format!("{entity_type}.json/crud/"),
                    &Params::default(),
                    Some(properties),
                )
                .await
            }
        }
    }

    /// Finalizes an invoice, assigning its sequential ledger number. This
    /// is Invoice-specific; any other entity type fails locally.
    pub async fn finalize(&self, entity_type: &str, id: &str) -> Result<Value> {
        if entity_type != "Invoice" {
            return Err(Error::InvalidOperation(format!(
                "Cannot call finalize on {entity_type}"
            )));
        }
        self.do_post(
            &format!("{entity_type}.json/finalize/{id}"),
            &Params::default(),
            None,
        )
        .await
    }

    /// Deletes an entity by id.
    pub async fn destroy(&self, entity_type: &str, id: &str) -> Result<Value> {
        self.do_delete(&format!("{entity_type}.json/crud/{id}"), &Params::default())
            .await
    }

    pub(crate) async fn do_get(&self, path: &str, params: &Params) -> Result<Value> {
        self.request_value(Method::Get, path, params, None).await
    }

    pub(crate) async fn do_post(
        &self,
        path: &str,
        params: &Params,
        body: Option<Value>,
    ) -> Result<Value> {
        self.request_value(Method::Post, path, params, body).await
    }

    pub(crate) async fn do_put(
        &self,
        path: &str,
        params: &Params,
        body: Option<Value>,
    ) -> Result<Value> {
        self.request_value(Method::Put, path, params, body).await
    }

    pub(crate) async fn do_delete(&self, path: &str, params: &Params) -> Result<Value> {
        self.request_value(Method::Delete, path, params, None).await
    }

    async fn request_value(
        &self,
        method: Method,
        path: &str,
        params: &Params,
        body: Option<Value>,
    ) -> Result<Value> {
        if path.starts_with(".json") {
            return Err(Error::InvalidArgument(
                "missing entity type in request path".into(),
            ));
        }
        let body = match body {
            Some(Value::Object(map)) if map.is_empty() => RequestBody::Empty,
            Some(Value::Array(items)) if items.is_empty() => RequestBody::Empty,
            Some(value) => RequestBody::Json(value),
            None => RequestBody::Empty,
        };
        let request = HttpRequest {
            method,
            path: path.to_string(),
            query: params.to_query_pairs(),
            headers: self.request_headers(),
            body,
        };
        let response = self.execute(request).await?;
        parse_result(&response.body, response.status)
    }

    /// Runs one request through the transport, bracketed by the query
    /// logger. The stop fires even when the transport fails.
    pub(crate) async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        let transport = self.transport()?;
        let token = self.logger.as_ref().map(|logger| {
            let description = format!("{} {}", request.method.as_str(), request.path);
            let params = if request.query.is_empty() {
                None
            } else {
                let mut map = Map::new();
                for (key, value) in &request.query {
                    map.insert(key.clone(), Value::String(value.clone()));
                }
                Some(Value::Object(map))
            };
            let payload = match &request.body {
                RequestBody::Json(value) => Some(value.clone()),
                RequestBody::Multipart { metadata, .. } => Some(metadata.clone()),
                RequestBody::Empty => None,
            };
            logger.start_query(&description, params.as_ref(), payload.as_ref())
        });

        let result = transport.execute(request).await;

        if let (Some(logger), Some(token)) = (self.logger.as_ref(), token) {
            logger.stop_query(token);
        }
        result
    }

    pub(crate) fn request_headers(&self) -> Vec<(String, String)> {
        let mut headers = vec![
            ("User-Agent".to_string(), USER_AGENT.to_string()),
            ("X-Api-Key".to_string(), self.api_key.clone()),
        ];
        for (name, value) in &self.extra_headers {
            if name == "host" {
                headers.push(("Host".to_string(), value.clone()));
            } else {
                headers.push((name.clone(), value.clone()));
            }
        }
        headers
    }

    /// The configured transport, or a lazily-built default client. Building
    /// the default requires an API key; that check happens here so it runs
    /// before any network call but after construction.
    fn transport(&self) -> Result<Arc<dyn Transport>> {
        if let Some(transport) = self.transport.get() {
            return Ok(transport.clone());
        }
        if self.api_key.is_empty() {
            return Err(Error::missing_api_key());
        }
        let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new(self.service_url.clone())?);
        let _ = self.transport.set(transport);
        self.transport
            .get()
            .cloned()
            .ok_or_else(|| Error::Configuration("transport unavailable".into()))
    }
}

/// List endpoints promise a JSON array; anything else from a 200 is a
/// malformed response.
pub(crate) fn expect_documents(value: Value) -> Result<Vec<Value>> {
    match value {
        Value::Array(documents) => Ok(documents),
        other => Err(Error::Decode {
            kind: DecodeKind::StateMismatch,
            body: other.to_string(),
            status: 200,
        }),
    }
}
