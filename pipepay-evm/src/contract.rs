//! Solidity interface definitions for on-chain interactions.
//!
//! Contains the minimal ABI surface needed by the purchase flow:
//! - [`IPurchase`] - the purchase contract (registry, price oracle, both pay entry points)
//! - [`IERC20`] - ERC-20 metadata, allowance and approval
//! - [`IUniswapV2Router02`] - amount quotes of a constant-product router

use alloy_primitives::Bytes;
use alloy_sol_types::{SolCall, sol};
use pipepay::chain::{PaymentMethod, PurchaseCall};

sol! {
    /// Purchase contract paying for data products and pipeline executions.
    ///
    /// Both entry points swap the payer's token along `path` into the platform
    /// token before paying. They differ only in the ERC-20 variant naming the
    /// registered token to debit.
    #[allow(missing_docs)]
    #[derive(Debug)]
    #[sol(rpc)]
    interface IPurchase {
        struct Request {
            bytes32 requestHash;
            uint256 timeStamp;
            uint256 price;
            string productType;
        }

        function tokenMap(string tokenName) external view returns (string name, address tokenAddress, bool isNative);
        function priceInSwash(uint256 price) external view returns (uint256);
        function baseToken() external view returns (address);

        function buyDataProductWithUniswapEth(
            Request req,
            bytes signature,
            address signer,
            address[] path
        ) external payable;

        function buyDataProductWithUniswapErc20(
            Request req,
            bytes signature,
            address signer,
            string tokenName,
            address[] path
        ) external;
    }
}

sol! {
    /// Minimal ERC-20 interface with metadata.
    #[allow(missing_docs)]
    #[derive(Debug)]
    #[sol(rpc)]
    interface IERC20 {
        function name() external view returns (string);
        function symbol() external view returns (string);
        function decimals() external view returns (uint8);
        function allowance(address owner, address spender) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
    }
}

sol! {
    /// Quote functions of a Uniswap V2 style router.
    #[allow(missing_docs)]
    #[derive(Debug)]
    #[sol(rpc)]
    interface IUniswapV2Router02 {
        function getAmountsIn(uint256 amountOut, address[] path) external view returns (uint256[] amounts);
        function getAmountsOut(uint256 amountIn, address[] path) external view returns (uint256[] amounts);
    }
}

/// Encodes the purchase entry point selected by `call.method`.
///
/// Request, signature, signer and path are marshalled identically for both
/// entry points; only the ERC-20 variant appends the registry token name.
#[must_use]
pub fn purchase_calldata(call: &PurchaseCall) -> Bytes {
    let req = IPurchase::Request {
        requestHash: call.request.request_hash,
        timeStamp: call.request.time_stamp,
        price: call.request.price,
        productType: call.request.product_type.clone(),
    };
    let encoded = match &call.method {
        PaymentMethod::Native => IPurchase::buyDataProductWithUniswapEthCall {
            req,
            signature: call.signature.clone(),
            signer: call.signer,
            path: call.path.clone(),
        }
        .abi_encode(),
        PaymentMethod::Erc20 { token_name } => IPurchase::buyDataProductWithUniswapErc20Call {
            req,
            signature: call.signature.clone(),
            signer: call.signer,
            tokenName: token_name.clone(),
            path: call.path.clone(),
        }
        .abi_encode(),
    };
    Bytes::from(encoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{B256, U256, address};
    use pipepay::chain::PurchaseRequest;

    fn call(method: PaymentMethod) -> PurchaseCall {
        PurchaseCall {
            request: PurchaseRequest {
                request_hash: B256::repeat_byte(0x11),
                time_stamp: U256::from(1_690_000_000u64),
                price: U256::from(10u64),
                product_type: "pipeline".into(),
            },
            signature: Bytes::from_static(&[0xde, 0xad]),
            signer: address!("0x00000000000000000000000000000000000000bb"),
            method,
            path: vec![
                address!("0x0000000000000000000000000000000000000a02"),
                address!("0x0000000000000000000000000000000000000a01"),
            ],
        }
    }

    #[test]
    fn native_method_encodes_eth_entry_point() {
        let data = purchase_calldata(&call(PaymentMethod::Native));
        assert_eq!(
            data[..4],
            IPurchase::buyDataProductWithUniswapEthCall::SELECTOR
        );
        let decoded = IPurchase::buyDataProductWithUniswapEthCall::abi_decode(&data).unwrap();
        assert_eq!(decoded.req.productType, "pipeline");
        assert_eq!(decoded.path.len(), 2);
    }

    #[test]
    fn erc20_method_appends_token_name() {
        let data = purchase_calldata(&call(PaymentMethod::Erc20 {
            token_name: "USDC".into(),
        }));
        assert_eq!(
            data[..4],
            IPurchase::buyDataProductWithUniswapErc20Call::SELECTOR
        );
        let decoded = IPurchase::buyDataProductWithUniswapErc20Call::abi_decode(&data).unwrap();
        assert_eq!(decoded.tokenName, "USDC");
        assert_eq!(decoded.req.requestHash, B256::repeat_byte(0x11));
        assert_eq!(decoded.req.price, U256::from(10u64));
    }
}
