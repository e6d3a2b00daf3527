//! Wallet authentication against the remote job service.
//!
//! The service hands out a one-time nonce; the wallet signs
//! `"I am signing my one-time nonce: <nonce>"` and the resulting
//! [`SignatureObject`] is exchanged for a bearer token.

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;

use crate::error::RequestError;

/// Fixed prefix of the challenge message.
pub const MESSAGE_TO_SIGN_PREFIX: &str = "I am signing my one-time nonce";

/// Builds the challenge message for a nonce.
#[must_use]
pub fn challenge_message(nonce: u64) -> String {
    format!("{MESSAGE_TO_SIGN_PREFIX}: {nonce}")
}

/// A signed nonce challenge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureObject {
    /// Address that signed the challenge.
    pub address: Address,
    /// Hex-encoded signature over the challenge message.
    pub signature: String,
    /// The nonce issued by the service.
    pub nonce: u64,
}

/// Something that can sign the authentication challenge.
///
/// The signing transport (local key, hardware wallet, browser wallet) is
/// opaque to the client.
pub trait MessageSigner: Send + Sync {
    /// Address of the signing account.
    fn address(&self) -> Address;

    /// Signs a UTF-8 message and returns the hex-encoded signature.
    fn sign_message(
        &self,
        message: &str,
    ) -> impl Future<Output = Result<String, RequestError>> + Send;
}

impl<T: MessageSigner> MessageSigner for Arc<T> {
    fn address(&self) -> Address {
        (**self).address()
    }

    fn sign_message(
        &self,
        message: &str,
    ) -> impl Future<Output = Result<String, RequestError>> + Send {
        (**self).sign_message(message)
    }
}

/// Signs the challenge for `nonce` and packages the result.
///
/// # Errors
///
/// Returns [`RequestError::Auth`] if the nonce is zero or the signer fails.
pub async fn sign_challenge<S: MessageSigner>(
    signer: &S,
    nonce: u64,
) -> Result<SignatureObject, RequestError> {
    if nonce == 0 {
        return Err(RequestError::Auth("Nonce is not provided".into()));
    }
    let signature = signer.sign_message(&challenge_message(nonce)).await?;
    Ok(SignatureObject {
        address: signer.address(),
        signature,
        nonce,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    struct EchoSigner;

    impl MessageSigner for EchoSigner {
        fn address(&self) -> Address {
            address!("0x00000000000000000000000000000000000000aa")
        }

        async fn sign_message(&self, message: &str) -> Result<String, RequestError> {
            Ok(format!("signed({message})"))
        }
    }

    #[test]
    fn challenge_has_fixed_prefix() {
        assert_eq!(challenge_message(42), "I am signing my one-time nonce: 42");
    }

    #[tokio::test]
    async fn sign_challenge_packages_address_and_nonce() {
        let obj = sign_challenge(&EchoSigner, 7).await.unwrap();
        assert_eq!(obj.nonce, 7);
        assert_eq!(obj.address, EchoSigner.address());
        assert_eq!(obj.signature, "signed(I am signing my one-time nonce: 7)");
    }

    #[tokio::test]
    async fn zero_nonce_is_rejected() {
        let err = sign_challenge(&EchoSigner, 0).await.unwrap_err();
        assert!(matches!(err, RequestError::Auth(_)));
    }
}
