//! Authentication session state.

use std::fmt;
use std::sync::Arc;

/// Callback invoked when the service reports an expired session.
pub type ExpiredCallback = Arc<dyn Fn() + Send + Sync>;

/// A pre-issued bearer token and an expiry hook.
///
/// Without a token, every request authenticates through the nonce challenge.
#[derive(Clone, Default)]
pub struct Session {
    /// Bearer token issued earlier, if any.
    pub token: Option<String>,
    /// Called before [`SessionExpired`](pipepay::RequestError::SessionExpired) is returned.
    pub on_expired: Option<ExpiredCallback>,
}

impl Session {
    /// A session reusing an existing bearer token.
    #[must_use]
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
            on_expired: None,
        }
    }

    /// Registers the expiry hook.
    #[must_use]
    pub fn on_expired(mut self, callback: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_expired = Some(Arc::new(callback));
        self
    }

    pub(crate) fn expired(&self) {
        if let Some(callback) = &self.on_expired {
            callback();
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("on_expired", &self.on_expired.is_some())
            .finish()
    }
}
