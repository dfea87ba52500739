//! Long-running operation polling.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use futures_util::stream::{self, BoxStream, StreamExt};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use vidrelay_protocol::{Operation, OperationResource, OperationStatus};
use vidrelay_transfer::RetryPolicy;

use crate::ClientError;
use crate::config::join_url;
use crate::requester::{Requester, sleep_or_cancel};
use crate::transport::{HttpRequest, HttpResponse, Method};

/// Where a [`watch`](OperationPoller::watch) sequence stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    /// Last observation was PENDING; keep going.
    Polling,
    Done,
    Failed,
    TimedOut,
    Cancelled,
    /// A fetch failed even after retries.
    Errored,
}

impl PollState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, PollState::Polling)
    }
}

impl From<OperationStatus> for PollState {
    fn from(status: OperationStatus) -> Self {
        match status {
            OperationStatus::Pending => PollState::Polling,
            OperationStatus::Done => PollState::Done,
            OperationStatus::Failed => PollState::Failed,
        }
    }
}

/// Per-sequence state threaded through `unfold`.
struct Watch {
    name: String,
    interval: Duration,
    timeout: Option<Duration>,
    cancel: CancellationToken,
    started: Instant,
    fetches: u32,
    state: PollState,
}

/// Fetches and watches long-running operations.
pub struct OperationPoller {
    requester: Requester,
    base_url: String,
    operations_url: String,
    policy: RetryPolicy,
    rng: Mutex<StdRng>,
}

impl OperationPoller {
    pub fn new(
        requester: Requester,
        base_url: impl Into<String>,
        operations_url: impl Into<String>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            requester,
            base_url: base_url.into(),
            operations_url: operations_url.into(),
            policy,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = Mutex::new(rng);
        self
    }

    /// Submits a generation request and returns the operation it started.
    ///
    /// The body is opaque to the client. Submission is not retried: the
    /// server may already have started work.
    pub async fn submit<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
        cancel: &CancellationToken,
    ) -> Result<Operation, ClientError> {
        let url = join_url(&self.base_url, path);
        let payload = serde_json::to_value(body)?;
        let request = HttpRequest::new(Method::Post, &url).json(body)?;
        let resp = self.requester.send(request, &payload, cancel).await?;

        let op = self.decode(&url, resp)?;
        info!(operation = %op.name(), "operation submitted");
        Ok(op)
    }

    /// Fetches the current state of `name`, retrying transient failures.
    pub async fn get(&self, name: &str, cancel: &CancellationToken) -> Result<Operation, ClientError> {
        let name = self.relative_name(name);
        if name.is_empty() {
            return Err(ClientError::InvalidArgument(
                "operation name must not be empty".into(),
            ));
        }
        let url = format!("{}/{name}", self.operations_url.trim_end_matches('/'));

        let mut failures = 0u32;
        loop {
            let err = match self.fetch(&url, cancel).await {
                Ok(op) => return Ok(op),
                Err(e) => e,
            };
            if !err.is_transient() {
                return Err(err);
            }
            failures += 1;
            if !self.policy.allows(failures) {
                return Err(err);
            }
            let delay = {
                let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
                self.policy.backoff(failures, &mut *rng)
            };
            debug!(
                operation = name,
                attempt = failures,
                ?delay,
                error = %err,
                "fetch failed, retrying"
            );
            sleep_or_cancel(delay, cancel).await?;
        }
    }

    /// Lazily polls `name` until it reaches a terminal state.
    ///
    /// Every fetched state is yielded before deciding whether to continue,
    /// so the terminal observation is always delivered, and nothing follows
    /// it. Between observations the stream waits `interval`, abandoning the
    /// wait as soon as `cancel` fires.
    ///
    /// Cancellation and an exceeded `timeout` each end the stream with one
    /// final error ([`ClientError::Cancelled`] / [`ClientError::TimedOut`])
    /// and no further fetch. The timeout is checked before each fetch only.
    pub fn watch<'a>(
        &'a self,
        name: impl Into<String>,
        interval: Duration,
        timeout: Option<Duration>,
        cancel: &CancellationToken,
    ) -> BoxStream<'a, Result<Operation, ClientError>> {
        let watch = Watch {
            name: name.into(),
            interval,
            timeout,
            cancel: cancel.clone(),
            started: Instant::now(),
            fetches: 0,
            state: PollState::Polling,
        };

        stream::unfold(watch, move |mut watch| async move {
            let item = self.step(&mut watch).await?;
            Some((item, watch))
        })
        .boxed()
    }

    /// Drains [`watch`](Self::watch) and returns the terminal operation.
    ///
    /// A FAILED operation is returned as `Ok`; inspect its status.
    pub async fn wait(
        &self,
        name: impl Into<String>,
        interval: Duration,
        timeout: Option<Duration>,
        cancel: &CancellationToken,
    ) -> Result<Operation, ClientError> {
        let name = name.into();
        let mut observations = self.watch(name.clone(), interval, timeout, cancel);
        let mut last = None;
        while let Some(item) = observations.next().await {
            last = Some(item?);
        }
        last.ok_or_else(|| {
            ClientError::InvalidArgument(format!("operation {name} produced no observation"))
        })
    }

    /// Strips leading slashes and, when the server-issued name repeats the
    /// endpoint's last path segment (`operations/abc` against
    /// `.../operations`), that segment too.
    fn relative_name<'n>(&self, name: &'n str) -> &'n str {
        let name = name.trim_start_matches('/');
        let segment = self
            .operations_url
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or_default();
        if segment.is_empty() {
            return name;
        }
        name.strip_prefix(segment)
            .and_then(|rest| rest.strip_prefix('/'))
            .filter(|rest| !rest.is_empty())
            .unwrap_or(name)
    }

    async fn step(&self, watch: &mut Watch) -> Option<Result<Operation, ClientError>> {
        if watch.state.is_terminal() {
            return None;
        }

        if watch.fetches > 0 {
            if let Err(e) = sleep_or_cancel(watch.interval, &watch.cancel).await {
                watch.state = PollState::Cancelled;
                return Some(Err(e));
            }
        }

        if watch.cancel.is_cancelled() {
            watch.state = PollState::Cancelled;
            return Some(Err(ClientError::Cancelled));
        }

        let elapsed = watch.started.elapsed();
        if watch.timeout.is_some_and(|limit| elapsed > limit) {
            info!(
                operation = %watch.name,
                ?elapsed,
                fetches = watch.fetches,
                "operation watch timed out"
            );
            watch.state = PollState::TimedOut;
            return Some(Err(ClientError::TimedOut { elapsed }));
        }

        watch.fetches += 1;
        match self.get(&watch.name, &watch.cancel).await {
            Ok(op) => {
                if self.relative_name(op.name()) != self.relative_name(&watch.name) {
                    warn!(
                        expected = %watch.name,
                        returned = %op.name(),
                        "server returned a different operation name"
                    );
                }
                watch.state = op.status().into();
                debug!(
                    operation = %op.name(),
                    status = ?op.status(),
                    fetch = watch.fetches,
                    "operation polled"
                );
                Some(Ok(op))
            }
            Err(ClientError::Cancelled) => {
                watch.state = PollState::Cancelled;
                Some(Err(ClientError::Cancelled))
            }
            Err(e) => {
                watch.state = PollState::Errored;
                Some(Err(e))
            }
        }
    }

    async fn fetch(&self, url: &str, cancel: &CancellationToken) -> Result<Operation, ClientError> {
        let request = HttpRequest::new(Method::Get, url);
        let resp = self
            .requester
            .send(request, &serde_json::Value::Null, cancel)
            .await?;
        self.decode(url, resp)
    }

    fn decode(&self, url: &str, resp: HttpResponse) -> Result<Operation, ClientError> {
        let status = resp.status;
        let resource: OperationResource = match resp.error_for_status().and_then(|r| r.json()) {
            Ok(resource) => resource,
            Err(e) => {
                self.requester.observer().on_error(url, &e);
                return Err(e);
            }
        };
        self.requester
            .observer()
            .on_response(url, status, &serde_json::to_value(&resource)?);
        Ok(resource.into())
    }
}
