//! # pretend_http
//!
//! Async client for the Pretend API. Every request passes through a shared
//! [`pretend_ratelimit::Gate`] before it reaches the network.

pub mod client;
pub mod data_object;
pub mod dispatcher;
pub mod errors;
pub mod pretend;
pub mod transport;

#[cfg(test)]
pub(crate) mod test_utils;

pub use client::HttpClient;
pub use client::HttpClientConfig;
pub use data_object::DataObject;
pub use dispatcher::Dispatcher;
pub use errors::PretendError;
pub use errors::Result;
pub use pretend::LookupArg;
pub use pretend::PRETEND_BASE_URL;
pub use pretend::Platform;
pub use pretend::PretendClient;
pub use pretend::PretendClientBuilder;
pub use pretend_ratelimit::Gate;
pub use transport::RawResponse;
pub use transport::Transport;
