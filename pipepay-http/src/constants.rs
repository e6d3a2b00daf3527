//! Default endpoints and fixed paths of the job service.

/// Default job service host.
pub const DEFAULT_HOST: &str = "https://scompute-client.swashapp.io";

/// Default job service API version.
pub const DEFAULT_API_VERSION: &str = "v1";

/// Default services host (authentication).
pub const DEFAULT_SERVICES_HOST: &str = "https://api.swashapp.io";

/// Default services API version.
pub const DEFAULT_SERVICES_API_VERSION: &str = "v1";

/// Default services API prefix.
pub const DEFAULT_SERVICES_API_PREFIX: &str = "scompute";

/// Nonce endpoint, relative to the services base URL.
pub const NONCE_PATH: &str = "public/signature/nonce";

/// Default per-request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
