//! Endpoint configuration of the job service.

use std::time::Duration;

use pipepay::RequestError;
use url::Url;

use crate::constants::{
    DEFAULT_API_VERSION, DEFAULT_HOST, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_SERVICES_API_PREFIX,
    DEFAULT_SERVICES_API_VERSION, DEFAULT_SERVICES_HOST,
};

/// Hosts, API versions and timeout used by [`HttpRequester`](crate::HttpRequester).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOptions {
    /// Job service host.
    pub host: String,
    /// Job service API version.
    pub api_version: String,
    /// Services host issuing authentication nonces.
    pub services_host: String,
    /// Services API version.
    pub services_api_version: String,
    /// Services API prefix.
    pub services_api_prefix: String,
    /// Per-request timeout.
    pub request_timeout: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_owned(),
            api_version: DEFAULT_API_VERSION.to_owned(),
            services_host: DEFAULT_SERVICES_HOST.to_owned(),
            services_api_version: DEFAULT_SERVICES_API_VERSION.to_owned(),
            services_api_prefix: DEFAULT_SERVICES_API_PREFIX.to_owned(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

impl ClientOptions {
    /// Overrides the job service host.
    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Overrides the services host.
    #[must_use]
    pub fn with_services_host(mut self, host: impl Into<String>) -> Self {
        self.services_host = host.into();
        self
    }

    /// Overrides the per-request timeout.
    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// `{host}/{api_version}/`
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::Url`] if the host is not a valid URL.
    pub fn server_url(&self) -> Result<Url, RequestError> {
        base_url(&[&self.host, &self.api_version])
    }

    /// `{services_host}/{services_api_prefix}/{services_api_version}/`
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::Url`] if the services host is not a valid URL.
    pub fn services_url(&self) -> Result<Url, RequestError> {
        base_url(&[
            &self.services_host,
            &self.services_api_prefix,
            &self.services_api_version,
        ])
    }
}

/// Joins segments with single slashes and a trailing slash, so that relative
/// paths resolve beneath the last segment.
fn base_url(segments: &[&str]) -> Result<Url, RequestError> {
    let mut joined = segments
        .iter()
        .map(|s| s.trim_matches('/'))
        .collect::<Vec<_>>()
        .join("/");
    joined.push('/');
    Url::parse(&joined).map_err(|e| RequestError::Url(format!("{joined}: {e}")))
}
