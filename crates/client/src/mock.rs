//! Scripted transport for unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::ClientError;
use crate::auth::Credential;
use crate::observe::NoopObserver;
use crate::requester::Requester;
use crate::transport::{HttpRequest, HttpResponse, Transport, TransportFuture};

type Handler = Box<dyn Fn(&HttpRequest) -> Result<HttpResponse, ClientError> + Send + Sync>;

/// Mock transport that records requests.
///
/// Queued responses are replayed first; once the queue is empty the
/// handler (if any) answers.
pub(crate) struct MockTransport {
    queued: Mutex<VecDeque<Result<HttpResponse, ClientError>>>,
    requests: Mutex<Vec<HttpRequest>>,
    handler: Option<Handler>,
}

impl MockTransport {
    pub(crate) fn new() -> Self {
        Self {
            queued: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            handler: None,
        }
    }

    pub(crate) fn with_handler(
        handler: impl Fn(&HttpRequest) -> Result<HttpResponse, ClientError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            handler: Some(Box::new(handler)),
            ..Self::new()
        }
    }

    pub(crate) fn push(&self, resp: HttpResponse) {
        self.queued.lock().unwrap().push_back(Ok(resp));
    }

    pub(crate) fn push_err(&self, err: ClientError) {
        self.queued.lock().unwrap().push_back(Err(err));
    }

    pub(crate) fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

impl Transport for MockTransport {
    fn send(&self, request: HttpRequest) -> TransportFuture<'_> {
        let next = self.queued.lock().unwrap().pop_front();
        let result = match (next, &self.handler) {
            (Some(r), _) => r,
            (None, Some(handler)) => handler(&request),
            (None, None) => Err(ClientError::Connection("no mock response available".into())),
        };
        self.requests.lock().unwrap().push(request);
        Box::pin(async move { result })
    }
}

/// Requester over `transport` with a fixed test key and no observation.
pub(crate) fn requester(transport: Arc<MockTransport>) -> Requester {
    Requester::new(
        transport,
        Arc::new(Credential::ApiKey("test-key".into())),
        Arc::new(NoopObserver),
    )
}

/// Parses `bytes <first>-<last>/<total>` into `(first, total)`.
pub(crate) fn parse_content_range(value: &str) -> Option<(u64, u64)> {
    let rest = value.strip_prefix("bytes ")?;
    let (span, total) = rest.split_once('/')?;
    let total = total.parse().ok()?;
    if span == "*" {
        return Some((total, total));
    }
    let (first, _) = span.split_once('-')?;
    Some((first.parse().ok()?, total))
}
