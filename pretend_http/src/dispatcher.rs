use std::sync::Arc;

use pretend_ratelimit::Gate;
use reqwest::header::AUTHORIZATION;
use reqwest::header::HeaderMap;
use reqwest::header::HeaderValue;
use tracing::debug;
use tracing::warn;

use crate::client::HttpClient;
use crate::data_object::DataObject;
use crate::errors::PretendError;
use crate::errors::Result;
use crate::transport::Transport;

/// Sends every request through one shared [`Gate`]
#[derive(Debug)]
pub struct Dispatcher<T = HttpClient> {
    transport: T,
    gate: Arc<Gate>,
    headers: HeaderMap,
}

impl<T: Transport> Dispatcher<T> {
    /// Create a dispatcher that authenticates with `api_key`
    pub fn new(transport: T, gate: Arc<Gate>, api_key: &str) -> Result<Self> {
        let mut authorization = HeaderValue::from_str(api_key).map_err(|_| PretendError::InvalidApiKey)?;
        authorization.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, authorization);

        Ok(Self { transport, gate, headers })
    }

    /// GET `url` once the gate admits it and decode the JSON object it returns
    ///
    /// The gate permit lives for the duration of the call and is dropped on
    /// every exit path, including when this future is cancelled.
    pub async fn perform(&self, url: &str) -> Result<DataObject> {
        let _permit = self.gate.acquire().await;
        debug!(url, in_flight = self.gate.in_flight(), "Dispatching request");

        let response = self.transport.get(url, &self.headers).await.inspect_err(|err| warn!(url, "Request failed: {err}"))?;

        if !response.is_ok() {
            let body = response.text();
            warn!(url, status = response.status, "Unexpected response");
            return Err(PretendError::UnexpectedResponse { status: response.status, body });
        }

        DataObject::from_slice(&response.body).inspect_err(|err| warn!(url, "Failed to decode response: {err}"))
    }

    /// The gate shared by every request of this dispatcher
    pub fn gate(&self) -> &Arc<Gate> {
        &self.gate
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }
}
