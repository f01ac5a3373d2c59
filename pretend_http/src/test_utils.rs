use std::sync::Mutex;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::time::Duration;

use reqwest::header::HeaderMap;

use crate::errors::PretendError;
use crate::errors::Result;
use crate::transport::RawResponse;
use crate::transport::Transport;
use crate::transport::TransportFuture;

type Responder = Box<dyn Fn(&str) -> Result<RawResponse> + Send + Sync>;

/// In-memory transport that records every call it receives
pub(crate) struct StubTransport {
    respond: Responder,
    latency: Duration,
    calls: AtomicUsize,
    active: AtomicUsize,
    max_active: AtomicUsize,
    requests: Mutex<Vec<(String, HeaderMap)>>,
}

impl StubTransport {
    pub(crate) fn new(respond: impl Fn(&str) -> Result<RawResponse> + Send + Sync + 'static) -> Self {
        Self {
            respond: Box::new(respond),
            latency: Duration::ZERO,
            calls: AtomicUsize::new(0),
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Always answers 200 with `body`
    pub(crate) fn ok(body: &'static str) -> Self {
        Self::new(move |_| Ok(RawResponse::new(200, body)))
    }

    /// Always answers `status` with `body`
    pub(crate) fn status(status: u16, body: &'static str) -> Self {
        Self::new(move |_| Ok(RawResponse::new(status, body)))
    }

    /// Every call fails as if the connection was reset
    pub(crate) fn failing() -> Self {
        Self::new(|_| Err(PretendError::Transport("connection reset by peer".to_string())))
    }

    /// Sleep for `latency` before answering
    pub(crate) fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn max_active(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }

    pub(crate) fn requests(&self) -> Vec<(String, HeaderMap)> {
        self.requests.lock().unwrap().clone()
    }
}

impl Transport for StubTransport {
    fn get<'a>(&'a self, url: &'a str, headers: &'a HeaderMap) -> TransportFuture<'a> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.requests.lock().unwrap().push((url.to_string(), headers.clone()));

            let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_active.fetch_max(active, Ordering::SeqCst);
            if !self.latency.is_zero() {
                tokio::time::sleep(self.latency).await;
            }
            self.active.fetch_sub(1, Ordering::SeqCst);

            (self.respond)(url)
        })
    }
}
