//! Configuration
//!
//! The chain registry (`config.json`) maps a chain identifier to its RPC
//! endpoint, the Safe address and optional per-contract proxy addresses:
//!
//! ```json
//! {
//!   "sepolia": {
//!     "rpc": "local://sepolia",
//!     "safe": "0x...",
//!     "vault_proxy_admin": "0x...",
//!     "vault_proxy_address": "0x..."
//!   }
//! }
//! ```
//!
//! Everything is loaded once and passed explicitly into constructors; core
//! logic never consults process-wide state.

use crate::authority::RetryPolicy;
use crate::core::Address;
use crate::storage::StoreConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Chain registry file name inside the data directory
pub const CHAIN_CONFIG_FILE: &str = "config.json";

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("Unknown chain: {0}")]
    UnknownChain(String),
    #[error("Chain {chain} has no '{key}' entry")]
    MissingKey { chain: String, key: String },
    #[error("Invalid value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },
}

/// Per-network configuration record
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChainConfig {
    /// RPC endpoint (`local://<name>` selects the file-backed devnet authority)
    pub rpc: String,
    /// Address of the authority (Safe)
    pub safe: Address,
    /// EIP-155 chain id, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<u64>,
    /// Auxiliary entries such as `<contract>_proxy_admin`
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl ChainConfig {
    pub fn new(rpc: &str, safe: Address) -> Self {
        Self {
            rpc: rpc.to_string(),
            safe,
            chain_id: None,
            extra: BTreeMap::new(),
        }
    }

    /// Look up an auxiliary address entry
    pub fn address_entry(&self, chain: &str, key: &str) -> Result<Address, ConfigError> {
        let value = self.extra.get(key).ok_or_else(|| ConfigError::MissingKey {
            chain: chain.to_string(),
            key: key.to_string(),
        })?;
        let text = value.as_str().ok_or_else(|| ConfigError::InvalidValue {
            key: key.to_string(),
            reason: "expected an address string".to_string(),
        })?;
        text.parse().map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            reason: format!("{}", e),
        })
    }

    /// `<contract>_proxy_admin`
    pub fn proxy_admin(&self, chain: &str, contract: &str) -> Result<Address, ConfigError> {
        self.address_entry(chain, &format!("{}_proxy_admin", contract))
    }

    /// `<contract>_proxy_address`
    pub fn proxy_address(&self, chain: &str, contract: &str) -> Result<Address, ConfigError> {
        self.address_entry(chain, &format!("{}_proxy_address", contract))
    }

    /// Register a proxy pair for an upgradeable contract
    pub fn set_proxy(&mut self, contract: &str, admin: Address, proxy: Address) {
        self.extra.insert(
            format!("{}_proxy_admin", contract),
            serde_json::Value::String(admin.to_string()),
        );
        self.extra.insert(
            format!("{}_proxy_address", contract),
            serde_json::Value::String(proxy.to_string()),
        );
    }
}

/// All configured chains, keyed by chain identifier
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChainRegistry {
    chains: BTreeMap<String, ChainConfig>,
}

impl ChainRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the registry, treating a missing file as empty
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let file = fs::File::open(path)?;
        let reader = BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }

    /// Write the registry (temp file, then rename)
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let temp_path = path.with_extension("json.tmp");
        let file = fs::File::create(&temp_path)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        fs::rename(&temp_path, path)?;
        Ok(())
    }

    pub fn get(&self, chain: &str) -> Result<&ChainConfig, ConfigError> {
        self.chains
            .get(chain)
            .ok_or_else(|| ConfigError::UnknownChain(chain.to_string()))
    }

    pub fn get_mut(&mut self, chain: &str) -> Result<&mut ChainConfig, ConfigError> {
        self.chains
            .get_mut(chain)
            .ok_or_else(|| ConfigError::UnknownChain(chain.to_string()))
    }

    pub fn insert(&mut self, chain: &str, config: ChainConfig) {
        self.chains.insert(chain.to_string(), config);
    }

    pub fn chains(&self) -> impl Iterator<Item = (&String, &ChainConfig)> {
        self.chains.iter()
    }

    pub fn len(&self) -> usize {
        self.chains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }
}

/// Top-level coordinator configuration
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Root of all persisted state
    pub data_dir: PathBuf,
    /// Proposal store settings
    pub store: StoreConfig,
    /// Retry policy for idempotent authority reads
    pub retry: RetryPolicy,
    /// Per-call timeout handed to authority transports
    pub call_timeout: Duration,
}

impl CoordinatorConfig {
    /// Configuration rooted at `data_dir` with default settings
    pub fn new(data_dir: PathBuf) -> Self {
        let store = StoreConfig {
            data_dir: data_dir.clone(),
            ..Default::default()
        };
        Self {
            data_dir,
            store,
            retry: RetryPolicy::default(),
            call_timeout: Duration::from_secs(30),
        }
    }

    /// Path of the chain registry
    pub fn chain_config_path(&self) -> PathBuf {
        self.data_dir.join(CHAIN_CONFIG_FILE)
    }

    /// Path of the local authority state for a chain
    pub fn devnet_path(&self, chain: &str) -> PathBuf {
        self.data_dir.join("devnet").join(format!("{}.json", chain))
    }

    pub fn load_chains(&self) -> Result<ChainRegistry, ConfigError> {
        ChainRegistry::load(&self.chain_config_path())
    }
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self::new(PathBuf::from(".safe_coordinator"))
    }
}
