//! Reward reconciliation checker
//!
//! Cross-checks the off-chain reward ledger against the reward contract and
//! reports, per accepted answer, whether both sides agree on its payment.
//!
//! ## Module Structure
//!
//! - `chain/`: JSON-RPC transport, ABI codec and the contract-backed reader
//! - `reconcile/`: classification, engine, retry policy and report
//! - `config`: explicit configuration passed to every component
//! - `error`: error kinds shared across the crate
//!
//! Ledger access lives in the `reward-audit-storage` crate.

pub mod chain;
pub mod config;
pub mod error;
pub mod reconcile;

pub use chain::contract::ContractChainReader;
pub use chain::rpc::RpcClient;
pub use chain::{ChainReader, OnChainKey};
pub use config::{AuditConfig, ChainConfig, ConfigOverrides, ReconcileConfig};
pub use error::{AuditError, ChainError, Result};
pub use reconcile::report::{AuditReport, AuditSummary};
pub use reconcile::retry::{Backoff, RetryPolicy};
pub use reconcile::{Classification, ReconciliationEngine, ReconciliationRecord};

pub use reward_audit_storage as storage;
pub use reward_audit_storage::{Answer, LedgerReader, RewardLogEntry, RewardStatus, RewardType};
