//! Audit Configuration
//!
//! Everything the audit needs is carried in one explicit [`AuditConfig`]:
//! - Chain endpoint, contract address and the two function selectors
//! - Ledger database connection
//! - Reconciliation concurrency, batch deadline and retry policy
//!
//! The binary builds it from a TOML file plus CLI/env overrides; library code
//! never reads the process environment.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reward_audit_storage::PgConfig;
use serde::Deserialize;
use tracing::{debug, info};

use crate::chain::abi;
use crate::error::{AuditError, Result};
use crate::reconcile::retry::RetryPolicy;

const CONFIG_DIR_NAME: &str = ".reward-audit";
const CONFIG_FILE_NAME: &str = "config.toml";

/// `answerKey(string) returns (bytes32)`
pub const DEFAULT_DERIVE_KEY_SELECTOR: &str = "0x0341356a";
/// `rewardedAnswers(bytes32) returns (bool)`
pub const DEFAULT_REWARDED_SELECTOR: &str = "0xf4865b78";

/// Complete audit configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    pub chain: ChainConfig,
    pub database: PgConfig,
    pub reconcile: ReconcileConfig,
}

/// Reward contract connection
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    /// JSON-RPC endpoint
    pub rpc_url: String,
    /// Reward contract address (`0x` + 40 hex chars)
    pub contract_address: String,
    /// Upper bound for a single RPC call
    pub call_timeout_secs: u64,
    /// Block tag passed to `eth_call`
    pub block_tag: String,
    /// Selector of the contract's pure key-derivation function
    pub derive_key_selector: String,
    /// Selector of the contract's "already rewarded" view
    pub rewarded_selector: String,
    /// Refuse to run against any other chain when set
    pub expected_chain_id: Option<u64>,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://localhost:8545".to_string(),
            contract_address: String::new(),
            call_timeout_secs: 10,
            block_tag: "latest".to_string(),
            derive_key_selector: DEFAULT_DERIVE_KEY_SELECTOR.to_string(),
            rewarded_selector: DEFAULT_REWARDED_SELECTOR.to_string(),
            expected_chain_id: None,
        }
    }
}

impl fmt::Debug for ChainConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainConfig")
            .field("rpc_url", &self.redacted_rpc_url())
            .field("contract_address", &self.contract_address)
            .field("call_timeout_secs", &self.call_timeout_secs)
            .field("block_tag", &self.block_tag)
            .field("derive_key_selector", &self.derive_key_selector)
            .field("rewarded_selector", &self.rewarded_selector)
            .field("expected_chain_id", &self.expected_chain_id)
            .finish()
    }
}

impl ChainConfig {
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }

    /// Hosted endpoints carry API keys in the path or userinfo; keep only scheme and host.
    pub fn redacted_rpc_url(&self) -> String {
        redact_rpc_url(&self.rpc_url)
    }
}

fn redact_rpc_url(url: &str) -> String {
    let Some((scheme, rest)) = url.split_once("://") else {
        return "[REDACTED]".to_string();
    };
    let (authority, tail) = match rest.find(|c: char| c == '/' || c == '?') {
        Some(i) => rest.split_at(i),
        None => (rest, ""),
    };
    let host = authority.rsplit_once('@').map_or(authority, |(_, host)| host);

    let hides_userinfo = host.len() != authority.len();
    let hides_path = !(tail.is_empty() || tail == "/");
    if !hides_userinfo && !hides_path {
        return url.to_string();
    }
    let path = if hides_path { "/[REDACTED]" } else { "" };
    format!("{}://{}{}", scheme, host, path)
}

/// How the reconciliation batch is executed
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    /// Per-answer checks in flight at once; 1 means strictly sequential
    pub concurrency: usize,
    /// Bound on the whole batch; pending answers become indeterminate
    pub batch_timeout_secs: u64,
    /// Applied to chain reads only
    pub retry: RetryPolicy,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            concurrency: 1,
            batch_timeout_secs: 300,
            retry: RetryPolicy::default(),
        }
    }
}

impl ReconcileConfig {
    pub fn batch_timeout(&self) -> Duration {
        Duration::from_secs(self.batch_timeout_secs)
    }
}

/// Values supplied on the command line or through the environment.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub rpc_url: Option<String>,
    pub contract_address: Option<String>,
    pub database_url: Option<String>,
    pub concurrency: Option<usize>,
    pub batch_timeout_secs: Option<u64>,
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

impl AuditConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| AuditError::Config(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AuditError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        let config = Self::from_toml_str(&contents).map_err(|e| match e {
            AuditError::Config(msg) => {
                AuditError::Config(format!("failed to parse {}: {}", path.display(), msg))
            }
            other => other,
        })?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// An explicit path must exist; otherwise the default location is tried
    /// and built-in defaults are used when nothing is found.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }
        match default_config_path() {
            Some(default) if default.exists() => Self::load(&default),
            _ => {
                debug!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(url) = overrides.rpc_url {
            self.chain.rpc_url = url;
        }
        if let Some(address) = overrides.contract_address {
            self.chain.contract_address = address;
        }
        if let Some(url) = overrides.database_url {
            self.database.url = Some(url);
        }
        if let Some(concurrency) = overrides.concurrency {
            self.reconcile.concurrency = concurrency;
        }
        if let Some(secs) = overrides.batch_timeout_secs {
            self.reconcile.batch_timeout_secs = secs;
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        let chain = &self.chain;
        if !(chain.rpc_url.starts_with("http://") || chain.rpc_url.starts_with("https://")) {
            return Err(AuditError::Config(format!(
                "chain.rpc_url must be an http(s) URL, got '{}'",
                chain.redacted_rpc_url()
            )));
        }
        if chain.contract_address.is_empty() {
            return Err(AuditError::Config(
                "chain.contract_address is not set".to_string(),
            ));
        }
        abi::parse_address(&chain.contract_address).map_err(AuditError::Config)?;
        abi::parse_selector(&chain.derive_key_selector).map_err(AuditError::Config)?;
        abi::parse_selector(&chain.rewarded_selector).map_err(AuditError::Config)?;
        if chain.call_timeout_secs == 0 {
            return Err(AuditError::Config(
                "chain.call_timeout_secs must be positive".to_string(),
            ));
        }

        let reconcile = &self.reconcile;
        if reconcile.concurrency == 0 {
            return Err(AuditError::Config(
                "reconcile.concurrency must be at least 1".to_string(),
            ));
        }
        if reconcile.batch_timeout_secs == 0 {
            return Err(AuditError::Config(
                "reconcile.batch_timeout_secs must be positive".to_string(),
            ));
        }
        if reconcile.retry.max_attempts == 0 {
            return Err(AuditError::Config(
                "reconcile.retry.max_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
