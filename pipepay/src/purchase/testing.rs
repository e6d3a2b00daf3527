//! In-memory collaborators for purchase tests.
//!
//! [`FakeChain`], [`FakeOracle`] and [`FakeRequester`] record every call so
//! tests can assert on what was (or was not) sent. Clones share state, which
//! lets a test hand one clone to the flow and inspect another.

use alloy_primitives::{Address, TxHash, U256, address, b256};
use rust_decimal::Decimal;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::chain::{
    ChainId, Confirmation, PurchaseCall, PurchaseChain, RegistryEntry, TokenMetadata,
};
use crate::config::PurchaseSettings;
use crate::error::{ChainError, RequestError};
use crate::purchase::observer::{PurchaseObserver, PurchaseState};
use crate::purchase::quote::PurchaseQuote;
use crate::purchase::route::{OracleError, Route, RouteOracle, RouteRequest};
use crate::purchase::token::{TokenInfo, TokenResolver};
use crate::request::{Params, Requester};

pub const CHAIN_ID: ChainId = 1;
pub const PLATFORM: Address = address!("0x0000000000000000000000000000000000000a01");
pub const WRAPPED: Address = address!("0x0000000000000000000000000000000000000a02");
pub const USDC: Address = address!("0x0000000000000000000000000000000000000a03");
pub const ILLIQUID: Address = address!("0x0000000000000000000000000000000000000a04");
pub const BASE: Address = address!("0x0000000000000000000000000000000000000a05");
pub const PURCHASE: Address = address!("0x0000000000000000000000000000000000000b01");
pub const PAYER: Address = address!("0x0000000000000000000000000000000000000c01");
pub const APPROVAL_TX: TxHash =
    b256!("0x00000000000000000000000000000000000000000000000000000000000000a1");
pub const PURCHASE_TX: TxHash =
    b256!("0x00000000000000000000000000000000000000000000000000000000000000b1");

/// Ordered log of side effects shared between fakes.
pub type Journal = Arc<Mutex<Vec<String>>>;

pub fn settings() -> PurchaseSettings {
    PurchaseSettings::new(PLATFORM, WRAPPED)
}

pub fn quote() -> PurchaseQuote {
    PurchaseQuote {
        execution_id: "exec-1".into(),
        request_hash: "0x1111111111111111111111111111111111111111111111111111111111111111".into(),
        time_stamp: 1_690_000_000,
        price_in_base_units: Decimal::new(100, 1),
        product_type: "pipeline".into(),
        signature: "0xdeadbeef".into(),
        signer_address: "0x00000000000000000000000000000000000000bb".into(),
    }
}

pub async fn resolve(chain: &FakeChain, name: &str) -> TokenInfo {
    TokenResolver::new(chain, &settings())
        .resolve(name)
        .await
        .unwrap()
}

#[derive(Debug, Default)]
struct ChainState {
    allowances: HashMap<Address, U256>,
    approve_without_handle: bool,
    submit_without_handle: bool,
    gas_estimate: Option<u64>,
    estimate_error: Option<ChainError>,
    submit_error: Option<ChainError>,
    confirmation_timeout: bool,
    reverted_receipts: bool,
    approvals: Vec<(Address, U256)>,
    allowance_reads: usize,
    metadata_lookups: Vec<Address>,
    confirmation_waits: Vec<(TxHash, Duration)>,
    estimated_calls: Vec<PurchaseCall>,
    submissions: Vec<(PurchaseCall, u64)>,
}

/// Chain with a fixed registry:
///
/// | name    | address    | native |
/// |---------|------------|--------|
/// | `SWASH` | `PLATFORM` | no     |
/// | `ETH`   | zero       | yes    |
/// | `USDC`  | `USDC`     | no     |
/// | `ILLQ`  | `ILLIQUID` | no     |
///
/// The price conversion doubles the amount.
#[derive(Debug, Clone, Default)]
pub struct FakeChain {
    state: Arc<Mutex<ChainState>>,
    journal: Journal,
}

impl FakeChain {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, ChainState> {
        self.state.lock().unwrap()
    }

    fn log(&self, entry: &str) {
        self.journal.lock().unwrap().push(entry.to_owned());
    }

    pub fn journal(&self) -> Journal {
        Arc::clone(&self.journal)
    }

    pub fn journal_entries(&self) -> Vec<String> {
        self.journal.lock().unwrap().clone()
    }

    pub fn with_allowance(self, token: Address, amount: U256) -> Self {
        self.state().allowances.insert(token, amount);
        self
    }

    pub fn approve_without_handle(self) -> Self {
        self.state().approve_without_handle = true;
        self
    }

    pub fn submit_without_handle(self) -> Self {
        self.state().submit_without_handle = true;
        self
    }

    pub fn with_gas_estimate(self, gas: u64) -> Self {
        self.state().gas_estimate = Some(gas);
        self
    }

    pub fn with_estimate_error(self, err: ChainError) -> Self {
        self.state().estimate_error = Some(err);
        self
    }

    pub fn with_submit_error(self, err: ChainError) -> Self {
        self.state().submit_error = Some(err);
        self
    }

    pub fn with_confirmation_timeout(self) -> Self {
        self.state().confirmation_timeout = true;
        self
    }

    pub fn with_reverted_receipts(self) -> Self {
        self.state().reverted_receipts = true;
        self
    }

    pub fn approvals(&self) -> Vec<(Address, U256)> {
        self.state().approvals.clone()
    }

    pub fn allowance_reads(&self) -> usize {
        self.state().allowance_reads
    }

    pub fn metadata_lookups(&self) -> Vec<Address> {
        self.state().metadata_lookups.clone()
    }

    pub fn confirmation_waits(&self) -> Vec<(TxHash, Duration)> {
        self.state().confirmation_waits.clone()
    }

    pub fn estimated_calls(&self) -> Vec<PurchaseCall> {
        self.state().estimated_calls.clone()
    }

    pub fn submissions(&self) -> Vec<(PurchaseCall, u64)> {
        self.state().submissions.clone()
    }
}

fn metadata(symbol: &str, name: &str, decimals: u8) -> TokenMetadata {
    TokenMetadata {
        symbol: symbol.into(),
        name: name.into(),
        decimals,
    }
}

impl PurchaseChain for FakeChain {
    fn chain_id(&self) -> ChainId {
        CHAIN_ID
    }

    fn purchase_contract(&self) -> Address {
        PURCHASE
    }

    fn payer(&self) -> Address {
        PAYER
    }

    async fn registry_entry(&self, token_name: &str) -> Result<RegistryEntry, ChainError> {
        let (address, is_native) = match token_name {
            "SWASH" => (PLATFORM, false),
            "ETH" => (Address::ZERO, true),
            "USDC" => (USDC, false),
            "ILLQ" => (ILLIQUID, false),
            _ => {
                return Ok(RegistryEntry {
                    name: String::new(),
                    address: Address::ZERO,
                    is_native: false,
                });
            }
        };
        Ok(RegistryEntry {
            name: token_name.to_owned(),
            address,
            is_native,
        })
    }

    async fn token_metadata(&self, token: Address) -> Result<TokenMetadata, ChainError> {
        self.state().metadata_lookups.push(token);
        if token == WRAPPED {
            Ok(metadata("WETH", "Wrapped Ether", 18))
        } else if token == USDC {
            Ok(metadata("USDC", "USD Coin", 6))
        } else if token == ILLIQUID {
            Ok(metadata("ILLQ", "Illiquid", 18))
        } else {
            Err(ChainError::Decode(format!("{token} is not an ERC-20")))
        }
    }

    async fn base_unit_token(&self) -> Result<Address, ChainError> {
        Ok(BASE)
    }

    async fn decimals(&self, token: Address) -> Result<u8, ChainError> {
        if token == USDC {
            Ok(6)
        } else if [BASE, PLATFORM, WRAPPED, ILLIQUID].contains(&token) {
            Ok(18)
        } else {
            Err(ChainError::Decode(format!("{token} has no decimals")))
        }
    }

    async fn price_in_platform_token(&self, base_units: U256) -> Result<U256, ChainError> {
        Ok(base_units * U256::from(2u8))
    }

    async fn allowance(&self, token: Address, _owner: Address) -> Result<U256, ChainError> {
        let mut state = self.state();
        state.allowance_reads += 1;
        Ok(state.allowances.get(&token).copied().unwrap_or_default())
    }

    async fn approve(&self, token: Address, amount: U256) -> Result<Option<TxHash>, ChainError> {
        self.log("approve");
        let mut state = self.state();
        state.approvals.push((token, amount));
        if state.approve_without_handle {
            return Ok(None);
        }
        state.allowances.insert(token, amount);
        Ok(Some(APPROVAL_TX))
    }

    async fn estimate_purchase(&self, call: &PurchaseCall) -> Result<u64, ChainError> {
        let mut state = self.state();
        state.estimated_calls.push(call.clone());
        match &state.estimate_error {
            Some(err) => Err(err.clone()),
            None => Ok(state.gas_estimate.unwrap_or(200_000)),
        }
    }

    async fn submit_purchase(
        &self,
        call: &PurchaseCall,
        gas_limit: u64,
    ) -> Result<Option<TxHash>, ChainError> {
        self.log("submit");
        let mut state = self.state();
        state.submissions.push((call.clone(), gas_limit));
        if let Some(err) = &state.submit_error {
            return Err(err.clone());
        }
        if state.submit_without_handle {
            return Ok(None);
        }
        Ok(Some(PURCHASE_TX))
    }

    async fn wait_for_confirmation(
        &self,
        tx_hash: TxHash,
        timeout: Duration,
    ) -> Result<Confirmation, ChainError> {
        self.log("confirm");
        let mut state = self.state();
        state.confirmation_waits.push((tx_hash, timeout));
        if state.confirmation_timeout {
            return Err(ChainError::Timeout {
                tx_hash,
                after: timeout,
            });
        }
        Ok(Confirmation {
            tx_hash,
            success: !state.reverted_receipts,
            block_number: Some(1),
        })
    }
}

#[derive(Debug, Clone)]
enum OracleBehavior {
    Fail(String),
    Route(Vec<Address>),
    NoRoute,
}

#[derive(Debug, Clone)]
pub struct FakeOracle {
    behavior: OracleBehavior,
    requests: Arc<Mutex<Vec<RouteRequest>>>,
}

impl FakeOracle {
    fn with(behavior: OracleBehavior) -> Self {
        Self {
            behavior,
            requests: Arc::default(),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self::with(OracleBehavior::Fail(message.to_owned()))
    }

    pub fn with_route(path: Vec<Address>) -> Self {
        Self::with(OracleBehavior::Route(path))
    }

    pub fn no_route() -> Self {
        Self::with(OracleBehavior::NoRoute)
    }

    pub fn requests(&self) -> Vec<RouteRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl RouteOracle for FakeOracle {
    async fn find_route(&self, request: &RouteRequest) -> Result<Option<Route>, OracleError> {
        self.requests.lock().unwrap().push(request.clone());
        match &self.behavior {
            OracleBehavior::Fail(message) => Err(OracleError::new(message.clone())),
            OracleBehavior::Route(path) => Ok(Some(Route {
                token_path: path.clone(),
                quote: None,
            })),
            OracleBehavior::NoRoute => Ok(None),
        }
    }
}

/// One call received by [`FakeRequester`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub method: &'static str,
    pub path: String,
    pub params: Vec<(String, String)>,
    pub body: Option<Value>,
}

/// Requester answering from canned JSON payloads keyed by `"METHOD path"`.
///
/// Unknown keys answer `null`.
#[derive(Debug, Clone, Default)]
pub struct FakeRequester {
    responses: Arc<Mutex<HashMap<String, Value>>>,
    expired: Arc<Mutex<HashSet<String>>>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    journal: Journal,
}

impl FakeRequester {
    pub fn new(journal: Journal) -> Self {
        Self {
            journal,
            ..Self::default()
        }
    }

    pub fn respond(self, method: &str, path: &str, payload: Value) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert(format!("{method} {path}"), payload);
        self
    }

    pub fn expire(self, method: &str, path: &str) -> Self {
        self.expired
            .lock()
            .unwrap()
            .insert(format!("{method} {path}"));
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, method: &'static str, path: &str, params: Params<'_>, body: Option<Value>) {
        self.journal
            .lock()
            .unwrap()
            .push(format!("{method} {path}"));
        self.calls.lock().unwrap().push(RecordedCall {
            method,
            path: path.to_owned(),
            params: params
                .iter()
                .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
                .collect(),
            body,
        });
    }

    fn reply<T: DeserializeOwned>(&self, method: &str, path: &str) -> Result<T, RequestError> {
        let key = format!("{method} {path}");
        if self.expired.lock().unwrap().contains(&key) {
            return Err(RequestError::SessionExpired);
        }
        let payload = self
            .responses
            .lock()
            .unwrap()
            .get(&key)
            .cloned()
            .unwrap_or(Value::Null);
        serde_json::from_value(payload).map_err(|source| RequestError::Decode {
            context: path.to_owned(),
            source,
        })
    }
}

impl Requester for FakeRequester {
    async fn get<T>(&self, path: &str, params: Params<'_>) -> Result<T, RequestError>
    where
        T: DeserializeOwned + Send,
    {
        self.record("GET", path, params, None);
        self.reply("GET", path)
    }

    async fn delete<T>(&self, path: &str, params: Params<'_>) -> Result<T, RequestError>
    where
        T: DeserializeOwned + Send,
    {
        self.record("DELETE", path, params, None);
        self.reply("DELETE", path)
    }

    async fn post<T, B>(&self, path: &str, body: &B) -> Result<T, RequestError>
    where
        T: DeserializeOwned + Send,
        B: Serialize + Sync + ?Sized,
    {
        self.record("POST", path, &[], serde_json::to_value(body).ok());
        self.reply("POST", path)
    }

    async fn put<T, B>(&self, path: &str, body: &B) -> Result<T, RequestError>
    where
        T: DeserializeOwned + Send,
        B: Serialize + Sync + ?Sized,
    {
        self.record("PUT", path, &[], serde_json::to_value(body).ok());
        self.reply("PUT", path)
    }

    async fn upload_file<T>(
        &self,
        path: &str,
        contents: Vec<u8>,
        file_name: &str,
    ) -> Result<T, RequestError>
    where
        T: DeserializeOwned + Send,
    {
        let body = serde_json::json!({ "fileName": file_name, "size": contents.len() });
        self.record("UPLOAD", path, &[], Some(body));
        self.reply("UPLOAD", path)
    }

    async fn download(&self, path: &str, params: Params<'_>) -> Result<Vec<u8>, RequestError> {
        self.record("DOWNLOAD", path, params, None);
        let text: String = self.reply("DOWNLOAD", path)?;
        Ok(text.into_bytes())
    }
}

/// Observer keeping every notification.
#[derive(Debug, Clone, Default)]
pub struct RecordingObserver {
    states: Arc<Mutex<Vec<PurchaseState>>>,
    warnings: Arc<Mutex<Vec<String>>>,
    execution_ids: Arc<Mutex<Vec<Option<String>>>>,
}

impl RecordingObserver {
    pub fn states(&self) -> Vec<PurchaseState> {
        self.states.lock().unwrap().clone()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.warnings.lock().unwrap().clone()
    }

    pub fn execution_ids(&self) -> Vec<Option<String>> {
        self.execution_ids.lock().unwrap().clone()
    }
}

impl PurchaseObserver for RecordingObserver {
    fn on_transition(&self, execution_id: Option<&str>, state: &PurchaseState) {
        self.states.lock().unwrap().push(state.clone());
        self.execution_ids
            .lock()
            .unwrap()
            .push(execution_id.map(ToOwned::to_owned));
    }

    fn on_warning(&self, _execution_id: Option<&str>, warning: &str) {
        self.warnings.lock().unwrap().push(warning.to_owned());
    }
}
