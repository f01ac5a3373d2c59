use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use pretend_ratelimit::DEFAULT_CAPACITY;
use pretend_ratelimit::DEFAULT_WINDOW;
use pretend_ratelimit::Gate;
use url::Url;

use crate::client::HttpClient;
use crate::client::HttpClientConfig;
use crate::data_object::DataObject;
use crate::dispatcher::Dispatcher;
use crate::errors::PretendError;
use crate::errors::Result;
use crate::transport::Transport;

pub const PRETEND_BASE_URL: &str = "https://api.pretend.rip/en/";

/// Identifier handed to a lookup, before its shape is checked
///
/// Lookups accept anything convertible into this, so callers forwarding
/// untyped input (CLI arguments, JSON fields) get the same validation as
/// typed callers.
#[derive(Debug, Clone, PartialEq)]
pub enum LookupArg {
    Missing,
    Integer(i128),
    Float(f64),
    Text(String),
}

impl LookupArg {
    fn into_integer(self, name: &'static str) -> Result<i128> {
        match self {
            LookupArg::Missing => Err(PretendError::MissingArgument(name)),
            LookupArg::Integer(value) => Ok(value),
            LookupArg::Float(_) | LookupArg::Text(_) => Err(PretendError::InvalidArgument { name, expected: "an integer" }),
        }
    }

    /// Blank text counts as missing. A blank username would otherwise request the
    /// bare `{platform}/` route, which the service never answers with a user.
    fn into_text(self, name: &'static str) -> Result<String> {
        match self {
            LookupArg::Missing => Err(PretendError::MissingArgument(name)),
            LookupArg::Text(value) if value.trim().is_empty() => Err(PretendError::MissingArgument(name)),
            LookupArg::Text(value) => Ok(value),
            LookupArg::Integer(_) | LookupArg::Float(_) => Err(PretendError::InvalidArgument { name, expected: "a string" }),
        }
    }
}

macro_rules! lookup_arg_from_int {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for LookupArg {
                fn from(value: $ty) -> Self {
                    LookupArg::Integer(value as i128)
                }
            }
        )*
    };
}

lookup_arg_from_int!(i8, i16, i32, i64, u8, u16, u32, u64, isize, usize);

impl From<f64> for LookupArg {
    fn from(value: f64) -> Self {
        LookupArg::Float(value)
    }
}

impl From<&str> for LookupArg {
    fn from(value: &str) -> Self {
        LookupArg::Text(value.to_string())
    }
}

impl From<String> for LookupArg {
    fn from(value: String) -> Self {
        LookupArg::Text(value)
    }
}

impl From<&String> for LookupArg {
    fn from(value: &String) -> Self {
        LookupArg::Text(value.clone())
    }
}

impl<T: Into<LookupArg>> From<Option<T>> for LookupArg {
    fn from(value: Option<T>) -> Self {
        value.map_or(LookupArg::Missing, Into::into)
    }
}

/// Platforms with a username lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    TikTok,
    Instagram,
    Twitter,
    Roblox,
    Signed,
}

impl Platform {
    pub const ALL: [Platform; 5] = [Platform::TikTok, Platform::Instagram, Platform::Twitter, Platform::Roblox, Platform::Signed];

    /// Leading path segment of the platform's endpoint
    pub fn path(&self) -> &'static str {
        match self {
            Platform::TikTok => "tiktok",
            Platform::Instagram => "instagram",
            Platform::Twitter => "twitter",
            Platform::Roblox => "roblox",
            Platform::Signed => "signed",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

impl FromStr for Platform {
    type Err = PretendError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "tiktok" => Ok(Platform::TikTok),
            "instagram" | "ig" => Ok(Platform::Instagram),
            "twitter" | "x" => Ok(Platform::Twitter),
            "roblox" => Ok(Platform::Roblox),
            "signed" | "signed.bio" | "biolink" => Ok(Platform::Signed),
            _ => Err(PretendError::InvalidArgument { name: "platform", expected: "one of tiktok, instagram, twitter, roblox, signed" }),
        }
    }
}

/// Pretend API client
///
/// Every lookup shares one [`Gate`], so concurrent lookups on the same client
/// never exceed the service quota.
#[derive(Debug)]
pub struct PretendClient<T = HttpClient> {
    dispatcher: Dispatcher<T>,
    base_url: Url,
}

impl PretendClient<HttpClient> {
    /// Create a client with default HTTP settings and the service's default quota
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::builder().api_key(api_key).build()
    }

    /// Create a new client builder
    pub fn builder() -> PretendClientBuilder {
        PretendClientBuilder::default()
    }
}

impl<T: Transport> PretendClient<T> {
    /// Get userinfo about a Discord user
    pub async fn userinfo(&self, user_id: impl Into<LookupArg>) -> Result<DataObject> {
        let user_id = user_id.into().into_integer("user_id")?;
        let url = self.endpoint("userinfo", &user_id.to_string())?;
        self.dispatcher.perform(url.as_str()).await
    }

    /// Look up `username` on `platform`
    pub async fn user(&self, platform: Platform, username: impl Into<LookupArg>) -> Result<DataObject> {
        let username = username.into().into_text("username")?;
        let url = self.endpoint(platform.path(), &username)?;
        self.dispatcher.perform(url.as_str()).await
    }

    /// Get information about a TikTok user
    pub async fn tiktok_user(&self, username: impl Into<LookupArg>) -> Result<DataObject> {
        self.user(Platform::TikTok, username).await
    }

    /// Get information about an Instagram user
    pub async fn instagram_user(&self, username: impl Into<LookupArg>) -> Result<DataObject> {
        self.user(Platform::Instagram, username).await
    }

    /// Get information about a Twitter user
    pub async fn twitter_user(&self, username: impl Into<LookupArg>) -> Result<DataObject> {
        self.user(Platform::Twitter, username).await
    }

    /// Get information about a Roblox user
    pub async fn roblox_user(&self, username: impl Into<LookupArg>) -> Result<DataObject> {
        self.user(Platform::Roblox, username).await
    }

    /// Get information about a signed.bio user
    pub async fn signed_biolink(&self, username: impl Into<LookupArg>) -> Result<DataObject> {
        self.user(Platform::Signed, username).await
    }

    /// GET an already composed URL through the gate
    pub async fn perform(&self, url: &str) -> Result<DataObject> {
        self.dispatcher.perform(url).await
    }

    /// `{base_url}/{category}/{identifier}`, with the identifier percent-encoded
    fn endpoint(&self, category: &str, identifier: &str) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| PretendError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .push(category)
            .push(identifier);
        Ok(url)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn gate(&self) -> &Arc<Gate> {
        self.dispatcher.gate()
    }

    pub fn dispatcher(&self) -> &Dispatcher<T> {
        &self.dispatcher
    }
}

/// Builder for configuring a Pretend client
pub struct PretendClientBuilder {
    api_key: Option<String>,
    base_url: String,
    capacity: u32,
    window: Duration,
    http_config: HttpClientConfig,
}

impl Default for PretendClientBuilder {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: PRETEND_BASE_URL.to_string(),
            capacity: DEFAULT_CAPACITY,
            window: DEFAULT_WINDOW,
            http_config: HttpClientConfig::default(),
        }
    }
}

impl PretendClientBuilder {
    /// Set the API key sent in the Authorization header
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set custom base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Admit at most `capacity` requests per `window`, and at most `capacity` in flight
    pub fn rate_limit(mut self, capacity: u32, window: Duration) -> Self {
        self.capacity = capacity;
        self.window = window;
        self
    }

    /// Configure HTTP client settings
    pub fn http_config(mut self, config: HttpClientConfig) -> Self {
        self.http_config = config;
        self
    }

    /// Use shorter HTTP timeouts
    pub fn low_latency(mut self) -> Self {
        self.http_config = HttpClientConfig::low_latency();
        self
    }

    /// Build the client on top of reqwest
    pub fn build(self) -> Result<PretendClient<HttpClient>> {
        let transport = HttpClient::with_config(self.http_config.clone())?;
        self.build_with_transport(transport)
    }

    /// Build the client on top of a custom transport
    pub fn build_with_transport<T: Transport>(self, transport: T) -> Result<PretendClient<T>> {
        let api_key = self.api_key.ok_or(PretendError::MissingArgument("api_key"))?;

        let base_url = Url::parse(&self.base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(PretendError::InvalidBaseUrl(self.base_url));
        }

        let gate = Arc::new(Gate::new(self.capacity, self.window)?);
        let dispatcher = Dispatcher::new(transport, gate, &api_key)?;

        Ok(PretendClient { dispatcher, base_url })
    }
}
