//! Price quotes issued by the remote job service.

use alloy_primitives::{Address, B256, Bytes, U256};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, PickFirst, serde_as};

use crate::chain::{PurchaseCall, PurchaseRequest};
use crate::error::PurchaseError;
use crate::purchase::route::RoutePath;
use crate::purchase::token::TokenInfo;

/// Quote returned by `POST pipeline/start`.
///
/// Everything except the price is opaque to the client and is forwarded to the
/// purchase contract as-is.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseQuote {
    /// Execution the quote pays for.
    pub execution_id: String,
    /// Hex-encoded 32-byte request hash.
    pub request_hash: String,
    /// Issue time, unix seconds (number or numeric string).
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub time_stamp: u64,
    /// Price in base units (e.g. `10.0`).
    pub price_in_base_units: Decimal,
    /// Product type tag.
    pub product_type: String,
    /// Hex-encoded service signature over the request.
    pub signature: String,
    /// Address of the service signer.
    #[serde(rename = "signer")]
    pub signer_address: String,
}

impl PurchaseQuote {
    /// Builds the contract call for this quote.
    ///
    /// The price is scaled by the token's base-unit decimals and the payment
    /// method is derived from the token kind.
    ///
    /// # Errors
    ///
    /// Returns [`PurchaseError::InvalidQuote`] for malformed hex fields and
    /// [`PurchaseError::InvalidPrice`] if the price cannot be scaled.
    pub fn to_call(&self, token: &TokenInfo, route: &RoutePath) -> Result<PurchaseCall, PurchaseError> {
        let request_hash: B256 = self.request_hash.parse().map_err(|e| PurchaseError::InvalidQuote {
            field: "requestHash",
            reason: format!("{e}"),
        })?;
        let signature: Bytes = self.signature.parse().map_err(|e| PurchaseError::InvalidQuote {
            field: "signature",
            reason: format!("{e}"),
        })?;
        let signer: Address = self.signer_address.parse().map_err(|e| PurchaseError::InvalidQuote {
            field: "signer",
            reason: format!("{e}"),
        })?;
        let price = scale_price(self.price_in_base_units, token.base_unit_decimals)?;
        Ok(PurchaseCall {
            request: PurchaseRequest {
                request_hash,
                time_stamp: U256::from(self.time_stamp),
                price,
                product_type: self.product_type.clone(),
            },
            signature,
            signer,
            method: token.payment_method(),
            path: route.addresses().to_vec(),
        })
    }
}

/// Scales a decimal price into integer units with `decimals` fractional digits.
///
/// # Errors
///
/// Returns [`PurchaseError::InvalidPrice`] if the price is negative, has
/// more fractional digits than `decimals`, or does not fit in 256 bits once scaled.
pub fn scale_price(price: Decimal, decimals: u8) -> Result<U256, PurchaseError> {
    if price.is_sign_negative() && !price.is_zero() {
        return Err(PurchaseError::InvalidPrice {
            price: price.to_string(),
            reason: "negative",
        });
    }
    let normalized = price.normalize();
    let scale = normalized.scale();
    let decimals = u32::from(decimals);
    if scale > decimals {
        return Err(PurchaseError::InvalidPrice {
            price: price.to_string(),
            reason: "too many fractional digits",
        });
    }
    let mantissa = normalized.mantissa().unsigned_abs();
    U256::from(10u8)
        .checked_pow(U256::from(decimals - scale))
        .and_then(|factor| U256::from(mantissa).checked_mul(factor))
        .ok_or_else(|| PurchaseError::InvalidPrice {
            price: price.to_string(),
            reason: "overflow",
        })
}
