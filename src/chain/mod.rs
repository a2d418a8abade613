//! Read-only access to the reward contract.

pub mod abi;
pub mod contract;
pub mod rpc;

use std::fmt;

use async_trait::async_trait;
use serde::{Serialize, Serializer};

use crate::error::ChainError;

/// 32-byte lookup key the reward contract derives from an answer id.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct OnChainKey(pub [u8; 32]);

impl OnChainKey {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// `0x`-prefixed lowercase hex
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    pub fn from_hex(s: &str) -> Result<Self, ChainError> {
        let raw = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(raw)
            .map_err(|e| ChainError::InvalidInput(format!("invalid key hex '{}': {}", s, e)))?;
        let key: [u8; 32] = bytes.try_into().map_err(|v: Vec<u8>| {
            ChainError::InvalidInput(format!("key must be 32 bytes, got {}", v.len()))
        })?;
        Ok(Self(key))
    }
}

impl fmt::Display for OnChainKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for OnChainKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OnChainKey({})", self.to_hex())
    }
}

impl Serialize for OnChainKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

/// Read-only calls against the reward contract.
///
/// Implementations never retry; retry policy belongs to the caller.
#[async_trait]
pub trait ChainReader: Send + Sync {
    /// Ask the contract for the key it uses for `answer_id`.
    ///
    /// The mapping is owned by the contract and must not be recomputed locally.
    async fn derive_on_chain_key(&self, answer_id: &str) -> Result<OnChainKey, ChainError>;

    /// Whether the contract has already paid out for `key`.
    async fn is_rewarded(&self, key: &OnChainKey) -> Result<bool, ChainError>;
}
