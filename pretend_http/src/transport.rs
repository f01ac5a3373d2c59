use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
pub use reqwest::header::HeaderMap;

use crate::errors::Result;

/// Status and body of a completed GET
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: Bytes,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self { status, body: body.into() }
    }

    /// The service answers lookups with exactly 200; anything else is unexpected
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }

    /// Body as text, replacing invalid UTF-8
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

pub type TransportFuture<'a> = Pin<Box<dyn Future<Output = Result<RawResponse>> + Send + 'a>>;

/// Issues a single GET and hands back the raw response
pub trait Transport: Send + Sync {
    fn get<'a>(&'a self, url: &'a str, headers: &'a HeaderMap) -> TransportFuture<'a>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn get<'a>(&'a self, url: &'a str, headers: &'a HeaderMap) -> TransportFuture<'a> {
        (**self).get(url, headers)
    }
}
