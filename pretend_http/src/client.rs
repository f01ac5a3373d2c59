use std::time::Duration;

use reqwest::Client;
use reqwest::ClientBuilder;
use reqwest::header::HeaderMap;

use crate::errors::Result;
use crate::transport::RawResponse;
use crate::transport::Transport;
use crate::transport::TransportFuture;

/// Configuration for HTTP client.
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Maximum idle connections per host (default: 10)
    pub pool_max_idle_per_host: usize,

    /// Idle timeout for connections (default: 90s)
    pub pool_idle_timeout: Duration,

    /// Connection establishment timeout (default: 10s)
    pub connect_timeout: Duration,

    /// Total request timeout (default: 30s)
    pub request_timeout: Duration,

    /// TCP keepalive interval (default: 60s)
    pub tcp_keepalive: Duration,

    /// Enable TCP_NODELAY (default: true)
    pub tcp_nodelay: bool,

    /// User-Agent header sent with every request
    pub user_agent: String,

    /// Enable Hickory DNS for async resolution (default: true)
    pub hickory_dns: bool,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            pool_max_idle_per_host: 10,
            pool_idle_timeout: Duration::from_secs(90),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            tcp_keepalive: Duration::from_secs(60),
            tcp_nodelay: true,
            user_agent: concat!("pretend_http/", env!("CARGO_PKG_VERSION")).to_string(),
            hickory_dns: true,
        }
    }
}

impl HttpClientConfig {
    /// Configuration with shorter timeouts.
    pub fn low_latency() -> Self {
        Self {
            pool_idle_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(3),
            request_timeout: Duration::from_secs(10),
            tcp_keepalive: Duration::from_secs(30),
            ..Default::default()
        }
    }
}

/// reqwest-backed [`Transport`]
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    config: HttpClientConfig,
}

impl HttpClient {
    /// Create a new HTTP client with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(HttpClientConfig::default())
    }

    /// Create a new HTTP client with custom configuration
    pub fn with_config(config: HttpClientConfig) -> Result<Self> {
        let client = ClientBuilder::new()
            // Connection pooling
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .pool_idle_timeout(config.pool_idle_timeout)
            // TCP
            .tcp_nodelay(config.tcp_nodelay)
            .tcp_keepalive(Some(config.tcp_keepalive))
            // Timeouts
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            // TLS with rustls
            .use_rustls_tls()
            .min_tls_version(reqwest::tls::Version::TLS_1_2)
            .user_agent(config.user_agent.as_str())
            .hickory_dns(config.hickory_dns)
            .gzip(true)
            .brotli(true)
            .build()?;

        Ok(Self { client, config })
    }

    /// Get the underlying reqwest client
    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// Get the client configuration
    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }
}

impl Transport for HttpClient {
    fn get<'a>(&'a self, url: &'a str, headers: &'a HeaderMap) -> TransportFuture<'a> {
        Box::pin(async move {
            let response = self.client.get(url).headers(headers.clone()).send().await?;
            let status = response.status().as_u16();
            let body = response.bytes().await?;
            Ok(RawResponse { status, body })
        })
    }
}
