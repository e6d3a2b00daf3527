//! Local private-key [`MessageSigner`].

use alloy_primitives::{Address, hex};
use alloy_signer::Signer;
use alloy_signer_local::PrivateKeySigner;
use pipepay::RequestError;
use pipepay::auth::MessageSigner;

/// Signs authentication challenges with an in-process private key (EIP-191).
#[derive(Debug, Clone)]
pub struct LocalMessageSigner {
    inner: PrivateKeySigner,
}

impl LocalMessageSigner {
    /// Wraps an existing signer.
    #[must_use]
    pub const fn new(inner: PrivateKeySigner) -> Self {
        Self { inner }
    }

    /// Parses a hex-encoded private key.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::Auth`] if the key is malformed.
    pub fn from_private_key(key: &str) -> Result<Self, RequestError> {
        let inner: PrivateKeySigner = key
            .trim()
            .parse()
            .map_err(|e| RequestError::Auth(format!("invalid private key: {e}")))?;
        Ok(Self::new(inner))
    }

    /// Returns the wrapped signer, e.g. to build a transaction wallet.
    #[must_use]
    pub const fn signer(&self) -> &PrivateKeySigner {
        &self.inner
    }
}

impl MessageSigner for LocalMessageSigner {
    fn address(&self) -> Address {
        self.inner.address()
    }

    async fn sign_message(&self, message: &str) -> Result<String, RequestError> {
        let signature = Signer::sign_message(&self.inner, message.as_bytes())
            .await
            .map_err(|e| RequestError::Auth(e.to_string()))?;
        Ok(hex::encode_prefixed(signature.as_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::Signature;
    use pipepay::auth::challenge_message;

    const KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    #[tokio::test]
    async fn signature_recovers_to_signer_address() {
        let signer = LocalMessageSigner::from_private_key(KEY).unwrap();
        let message = challenge_message(42);
        let encoded = signer.sign_message(&message).await.unwrap();
        assert!(encoded.starts_with("0x"));

        let bytes = hex::decode(&encoded).unwrap();
        let signature = Signature::try_from(bytes.as_slice()).unwrap();
        let recovered = signature
            .recover_address_from_msg(message.as_bytes())
            .unwrap();
        assert_eq!(recovered, signer.address());
    }

    #[test]
    fn malformed_key_is_an_auth_error() {
        let err = LocalMessageSigner::from_private_key("not-a-key").unwrap_err();
        assert!(matches!(err, RequestError::Auth(_)));
    }
}
