//! Read-only access to the SoulboundAI contract
//!
//! Two views back the authorization guard: `balanceOf` (does the address
//! currently hold the SBT) and `tokenOfOwnerByIndex` (its token id for
//! marketplace metadata refreshes). Results are never cached; ownership can
//! change between requests and every check must reflect current chain state.

use alloy::{
    primitives::{Address, U256},
    providers::{ProviderBuilder, RootProvider},
    sol,
    transports::http::{Client, Http},
};
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use std::str::FromStr;

lazy_static! {
    static ref ADDRESS_REGEX: Regex = Regex::new(r"^0x[a-fA-F0-9]{40}$").unwrap();
}

/// Wallet address shape check (0x-prefixed, 20 hex bytes)
pub fn is_valid_address(address: &str) -> bool {
    ADDRESS_REGEX.is_match(address)
}

// Minimal ERC-721 view surface of the SoulboundAI contract
sol! {
    #[sol(rpc)]
    interface ISoulboundAI {
        function balanceOf(address owner) external view returns (uint256);
        function tokenOfOwnerByIndex(address owner, uint256 index) external view returns (uint256);
    }
}

/// Error types for contract reads
#[derive(Debug)]
pub enum ContractReadError {
    ProviderError(String),
    ContractCallError(String),
    InvalidConfig(String),
    InvalidAddress(String),
}

impl std::fmt::Display for ContractReadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContractReadError::ProviderError(msg) => write!(f, "Provider error: {}", msg),
            ContractReadError::ContractCallError(msg) => write!(f, "Contract call error: {}", msg),
            ContractReadError::InvalidConfig(msg) => write!(f, "Invalid config: {}", msg),
            ContractReadError::InvalidAddress(msg) => write!(f, "Invalid address: {}", msg),
        }
    }
}

impl std::error::Error for ContractReadError {}

/// Seam for on-chain ownership checks so the guard can be tested with stubs
#[async_trait]
pub trait TokenGate: Send + Sync {
    async fn holds_token(&self, address: &str) -> Result<bool, ContractReadError>;

    /// Token id held by the address, or None when it is not a holder
    async fn token_id_for(&self, address: &str) -> Result<Option<String>, ContractReadError>;
}

pub struct SoulboundContractService {
    provider: RootProvider<Http<Client>>,
    contract_address: Address,
}

impl SoulboundContractService {
    pub fn new(rpc_url: &str, contract_address: &str) -> Result<Self, ContractReadError> {
        let provider = ProviderBuilder::new().on_http(rpc_url.parse().map_err(|e| {
            ContractReadError::InvalidConfig(format!("Invalid RPC URL: {}", e))
        })?);

        let contract_address = Address::from_str(contract_address).map_err(|e| {
            ContractReadError::InvalidConfig(format!("Invalid contract address: {}", e))
        })?;

        Ok(Self {
            provider,
            contract_address,
        })
    }

    fn parse_owner(address: &str) -> Result<Address, ContractReadError> {
        Address::from_str(address)
            .map_err(|e| ContractReadError::InvalidAddress(format!("{}: {}", address, e)))
    }
}

#[async_trait]
impl TokenGate for SoulboundContractService {
    async fn holds_token(&self, address: &str) -> Result<bool, ContractReadError> {
        let owner = Self::parse_owner(address)?;
        let contract = ISoulboundAI::new(self.contract_address, &self.provider);

        let balance = contract
            .balanceOf(owner)
            .call()
            .await
            .map_err(|e| ContractReadError::ContractCallError(format!("balanceOf: {}", e)))?
            ._0;

        Ok(balance > U256::ZERO)
    }

    async fn token_id_for(&self, address: &str) -> Result<Option<String>, ContractReadError> {
        if !self.holds_token(address).await? {
            return Ok(None);
        }

        let owner = Self::parse_owner(address)?;
        let contract = ISoulboundAI::new(self.contract_address, &self.provider);

        let token_id = contract
            .tokenOfOwnerByIndex(owner, U256::ZERO)
            .call()
            .await
            .map_err(|e| {
                ContractReadError::ContractCallError(format!("tokenOfOwnerByIndex: {}", e))
            })?
            ._0;

        Ok(Some(token_id.to_string()))
    }
}
