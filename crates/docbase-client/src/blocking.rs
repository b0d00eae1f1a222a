//! Blocking calling convention.
//!
//! Every operation delegates to the async [`Connector`](crate::Connector)
//! through an owned current-thread runtime, so request construction,
//! parsing and error normalization are exactly the async path's. Only the
//! awaiting differs.

use bytes::Bytes;
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::history::HistoryEntry;
use crate::params::Params;
use crate::reference::DocumentReference;

/// Blocking facade over [`crate::Connector`].
pub struct Connector {
    inner: crate::Connector,
    runtime: tokio::runtime::Runtime,
}

impl Connector {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::from_async(crate::Connector::new(api_key))
    }

    /// Wraps an already-configured async connector.
    pub fn from_async(inner: crate::Connector) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|err| Error::Configuration(format!("blocking runtime setup failed: {err}")))?;
        Ok(Self { inner, runtime })
    }

    pub fn get_template(&self, entity_type: &str) -> Result<Map<String, Value>> {
        self.runtime.block_on(self.inner.get_template(entity_type))
    }

    pub fn get_by_id(
        &self,
        entity_type: &str,
        id: &str,
        params: Params,
        version: Option<&str>,
    ) -> Result<Value> {
        self.runtime
            .block_on(self.inner.get_by_id(entity_type, id, params, version))
    }

    pub fn get_by_ref(
        &self,
        reference: &DocumentReference,
        parent_document: Option<&Value>,
    ) -> Result<Value> {
        self.runtime
            .block_on(self.inner.get_by_ref(reference, parent_document))
    }

    pub fn get_by_ids<I, S>(&self, entity_type: &str, ids: I, params: Params) -> Result<Vec<Value>>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.runtime
            .block_on(self.inner.get_by_ids(entity_type, ids, params))
    }

    pub fn get_all(&self, entity_type: &str, params: Params) -> Result<Vec<Value>> {
        self.runtime.block_on(self.inner.get_all(entity_type, params))
    }

    pub fn get_ids(
        &self,
        entity_type: &str,
        selector: Value,
        params: Params,
    ) -> Result<Vec<String>> {
        self.runtime
            .block_on(self.inner.get_ids(entity_type, selector, params))
    }

    pub fn get_id(&self, entity_type: &str, selector: Value) -> Result<Option<String>> {
        self.runtime.block_on(self.inner.get_id(entity_type, selector))
    }

    pub fn aggregate(&self, entity_type: &str, pipeline: Vec<Value>) -> Result<Value> {
        self.runtime
            .block_on(self.inner.aggregate(entity_type, pipeline))
    }

    pub fn get_history(&self, entity_type: &str, id: &str) -> Result<Vec<HistoryEntry>> {
        self.runtime.block_on(self.inner.get_history(entity_type, id))
    }

    pub fn search(&self, entity_type: &str, selector: Value, params: Params) -> Result<Vec<Value>> {
        self.runtime
            .block_on(self.inner.search(entity_type, selector, params))
    }

    pub fn update(&self, entity_type: &str, properties: Value) -> Result<Value> {
        self.runtime
            .block_on(self.inner.update(entity_type, properties))
    }

    pub fn finalize(&self, entity_type: &str, id: &str) -> Result<Value> {
        self.runtime.block_on(self.inner.finalize(entity_type, id))
    }

    pub fn destroy(&self, entity_type: &str, id: &str) -> Result<Value> {
        self.runtime.block_on(self.inner.destroy(entity_type, id))
    }

    pub fn get_binary(&self, id: &str) -> Result<Bytes> {
        self.runtime.block_on(self.inner.get_binary(id))
    }

    pub fn update_binary(
        &self,
        contents: Bytes,
        name: &str,
        destination_path: &str,
        id: Option<&str>,
    ) -> Result<Value> {
        self.runtime
            .block_on(self.inner.update_binary(contents, name, destination_path, id))
    }
}
