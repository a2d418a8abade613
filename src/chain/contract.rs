//! Reward contract reader
//!
//! Implements [`ChainReader`] with two `eth_call`s: the contract's pure
//! key-derivation function and its "already rewarded" view.

use async_trait::async_trait;
use tracing::{debug, info};

use crate::chain::abi::{self, Selector};
use crate::chain::rpc::RpcClient;
use crate::chain::{ChainReader, OnChainKey};
use crate::config::ChainConfig;
use crate::error::{AuditError, ChainError};

pub struct ContractChainReader {
    rpc: RpcClient,
    contract: String,
    block_tag: String,
    derive_key_selector: Selector,
    rewarded_selector: Selector,
}

impl ContractChainReader {
    pub fn new(
        rpc: RpcClient,
        contract_address: &str,
        block_tag: &str,
        derive_key_selector: Selector,
        rewarded_selector: Selector,
    ) -> Result<Self, AuditError> {
        let contract = abi::parse_address(contract_address).map_err(AuditError::Config)?;
        Ok(Self {
            rpc,
            contract,
            block_tag: block_tag.to_string(),
            derive_key_selector,
            rewarded_selector,
        })
    }

    pub fn from_config(config: &ChainConfig) -> Result<Self, AuditError> {
        let rpc = RpcClient::new(&config.rpc_url, config.call_timeout())?;
        let derive_key_selector =
            abi::parse_selector(&config.derive_key_selector).map_err(AuditError::Config)?;
        let rewarded_selector =
            abi::parse_selector(&config.rewarded_selector).map_err(AuditError::Config)?;
        Self::new(
            rpc,
            &config.contract_address,
            &config.block_tag,
            derive_key_selector,
            rewarded_selector,
        )
    }

    pub fn contract_address(&self) -> &str {
        &self.contract
    }

    /// Fail unless the endpoint serves the expected chain.
    pub async fn verify_chain_id(&self, expected: u64) -> Result<(), AuditError> {
        let actual = self.rpc.chain_id().await?;
        if actual != expected {
            return Err(AuditError::Config(format!(
                "RPC endpoint serves chain {} but chain {} is expected",
                actual,
                expected
            )));
        }
        info!("Connected to chain {}", actual);
        Ok(())
    }
}

#[async_trait]
impl ChainReader for ContractChainReader {
    async fn derive_on_chain_key(&self, answer_id: &str) -> Result<OnChainKey, ChainError> {
        if answer_id.is_empty() {
            return Err(ChainError::InvalidInput(
                "answer id must not be empty".to_string(),
            ));
        }

        let data = abi::encode_string_call(&self.derive_key_selector, answer_id);
        let ret = self
            .rpc
            .eth_call(&self.contract, &data, &self.block_tag)
            .await?;
        let key = OnChainKey(abi::decode_bytes32(&ret)?);
        debug!("Answer {} maps to key {}", answer_id, key);
        Ok(key)
    }

    async fn is_rewarded(&self, key: &OnChainKey) -> Result<bool, ChainError> {
        let data = abi::encode_bytes32_call(&self.rewarded_selector, key.as_bytes());
        let ret = self
            .rpc
            .eth_call(&self.contract, &data, &self.block_tag)
            .await?;
        abi::decode_bool(&ret)
    }
}
