use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::{Error, Result};
use crate::transport::{HttpRequest, HttpResponse, Transport};

/// Scripted transport: hands out queued responses in order and records
/// every request for assertions.
#[derive(Default)]
pub struct MockTransport {
    requests: Mutex<Vec<HttpRequest>>,
    responses: Mutex<VecDeque<Result<HttpResponse>>>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn reply(self: &Arc<Self>, status: u16, body: &str) -> Arc<Self> {
        self.responses.lock().unwrap().push_back(Ok(HttpResponse {
            status,
            body: Bytes::copy_from_slice(body.as_bytes()),
        }));
        self.clone()
    }

    pub fn fail_next(self: &Arc<Self>) -> Arc<Self> {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(Error::cannot_connect()));
        self.clone()
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        let queued = self.responses.lock().unwrap().pop_front();
        let description = format!("{} {}", request.method.as_str(), request.path);
        self.requests.lock().unwrap().push(request);
        queued.unwrap_or_else(|| panic!("unexpected request: {description}"))
    }
}

/// A connector wired to the given mock.
pub fn connector(transport: &Arc<MockTransport>) -> crate::Connector {
    crate::Connector::new("test-api-key").with_transport(transport.clone())
}
