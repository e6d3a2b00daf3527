//! Bearer token minting from a signed nonce challenge.

use jsonwebtoken::{EncodingKey, Header, encode, get_current_timestamp};
use pipepay::RequestError;
use pipepay::auth::SignatureObject;
use serde::Serialize;

#[derive(Serialize)]
struct Claims<'a> {
    #[serde(flatten)]
    signature: &'a SignatureObject,
    iat: u64,
}

/// Signs `{address, nonce, signature, iat}` with HS256.
///
/// # Errors
///
/// Returns [`RequestError::Auth`] if no signing key is configured or encoding fails.
pub fn mint(signature: &SignatureObject, signing_key: Option<&str>) -> Result<String, RequestError> {
    let key = signing_key
        .filter(|k| !k.is_empty())
        .ok_or_else(|| RequestError::Auth("no JWT signing key configured".into()))?;
    let claims = Claims {
        signature,
        iat: get_current_timestamp(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(key.as_bytes()),
    )
    .map_err(|e| RequestError::Auth(format!("failed to sign token: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::Address;
    use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
    use serde_json::Value;

    fn signature() -> SignatureObject {
        SignatureObject {
            address: Address::repeat_byte(0xaa),
            signature: "0xabcdef".into(),
            nonce: 42,
        }
    }

    #[test]
    fn token_carries_signature_object_and_iat() {
        let token = mint(&signature(), Some("secret")).unwrap();
        let mut validation = Validation::new(Algorithm::HS256);
        validation.required_spec_claims.clear();
        validation.validate_exp = false;
        let decoded = decode::<Value>(&token, &DecodingKey::from_secret(b"secret"), &validation)
            .unwrap()
            .claims;
        assert_eq!(decoded["nonce"], 42);
        assert_eq!(decoded["signature"], "0xabcdef");
        assert!(decoded["iat"].as_u64().unwrap() > 0);
        let address: Address = decoded["address"].as_str().unwrap().parse().unwrap();
        assert_eq!(address, Address::repeat_byte(0xaa));
    }

    #[test]
    fn missing_key_is_an_auth_error() {
        assert!(matches!(
            mint(&signature(), None),
            Err(RequestError::Auth(_))
        ));
        assert!(matches!(
            mint(&signature(), Some("")),
            Err(RequestError::Auth(_))
        ));
    }
}
