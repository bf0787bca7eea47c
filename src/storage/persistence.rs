//! Proposal persistence layer
//!
//! Stores the full proposal collection as one pretty-printed JSON array.
//! Every mutation is a read-modify-write of the whole collection performed
//! under an exclusive file lock, written to a temp file and renamed into
//! place, so concurrent signers on the same store never lose updates.

use super::lock::StoreLock;
use crate::core::{Address, ExecutionRecord, Proposal, Signature, TxHash};
use std::fs;
use std::io::{self, BufReader, BufWriter};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("Proposal not found: {0}")]
    NotFound(TxHash),
    #[error("Signer {signer} already signed proposal {hash}")]
    DuplicateSigner { hash: TxHash, signer: Address },
    #[error("Proposal already executed: {0}")]
    AlreadyExecuted(TxHash),
}

/// Storage configuration
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub data_dir: PathBuf,
    pub proposals_file: String,
    pub backup_enabled: bool,
    pub max_backups: usize,
    /// How long a writer waits for the store lock
    pub lock_timeout: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".safe_coordinator"),
            proposals_file: "proposal_data.json".to_string(),
            backup_enabled: true,
            max_backups: 5,
            lock_timeout: Duration::from_secs(10),
        }
    }
}

/// Durable mapping from transaction hash to proposal record
#[derive(Debug, Clone)]
pub struct ProposalStore {
    config: StoreConfig,
}

impl ProposalStore {
    /// Create a new proposal store
    pub fn new(config: StoreConfig) -> Result<Self, StorageError> {
        fs::create_dir_all(&config.data_dir)?;
        Ok(Self { config })
    }

    /// Create with default configuration
    pub fn with_defaults() -> Result<Self, StorageError> {
        Self::new(StoreConfig::default())
    }

    /// Get the proposals file path
    pub fn proposals_path(&self) -> PathBuf {
        self.config.data_dir.join(&self.config.proposals_file)
    }

    /// Sidecar file writers lock while they rewrite the store
    pub fn lock_path(&self) -> PathBuf {
        self.config
            .data_dir
            .join(format!("{}.lock", self.config.proposals_file))
    }

    fn temp_path(&self) -> PathBuf {
        self.config
            .data_dir
            .join(format!("{}.tmp", self.config.proposals_file))
    }

    /// Get a backup file path
    fn backup_path(&self, index: usize) -> PathBuf {
        self.config
            .data_dir
            .join(format!("{}.backup.{}", self.config.proposals_file, index))
    }

    /// Load every proposal in stored order
    ///
    /// A missing file is an empty collection. A file that exists but does not
    /// parse is an error rather than an empty result, so that a subsequent
    /// write cannot silently discard it.
    pub fn load(&self) -> Result<Vec<Proposal>, StorageError> {
        let path = self.proposals_path();

        if !path.exists() {
            return Ok(Vec::new());
        }

        let file = fs::File::open(&path)?;
        let reader = BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }

    /// Insert `proposal` unless a record with the same hash exists.
    ///
    /// Returns whether an insertion happened.
    pub fn insert_if_absent(&self, proposal: Proposal) -> Result<bool, StorageError> {
        let hash = proposal.hash;
        let inserted = self.update(|proposals| {
            if proposals.iter().any(|p| p.hash == hash) {
                return Ok(false);
            }
            proposals.push(proposal);
            Ok(true)
        })?;

        if inserted {
            log::info!("Stored new proposal {}", hash);
        } else {
            log::info!("Proposal {} already exists, nothing added", hash);
        }
        Ok(inserted)
    }

    /// Look up a proposal by hash
    pub fn find_by_hash(&self, hash: &TxHash) -> Result<Proposal, StorageError> {
        self.load()?
            .into_iter()
            .find(|p| &p.hash == hash)
            .ok_or(StorageError::NotFound(*hash))
    }

    /// Append a signature, rejecting a second signature from the same signer.
    ///
    /// Returns the updated proposal.
    pub fn append_signature(
        &self,
        hash: &TxHash,
        signature: Signature,
    ) -> Result<Proposal, StorageError> {
        let updated = self.update(|proposals| {
            let proposal = proposals
                .iter_mut()
                .find(|p| &p.hash == hash)
                .ok_or(StorageError::NotFound(*hash))?;

            if proposal.has_signed(&signature.signer) {
                return Err(StorageError::DuplicateSigner {
                    hash: *hash,
                    signer: signature.signer,
                });
            }

            proposal.signatures.push(signature);
            Ok(proposal.clone())
        })?;

        log::info!(
            "Proposal {} now has {} signature(s)",
            hash,
            updated.signature_count()
        );
        Ok(updated)
    }

    /// Record the execution outcome of a proposal
    pub fn mark_executed(
        &self,
        hash: &TxHash,
        record: ExecutionRecord,
    ) -> Result<Proposal, StorageError> {
        self.update(|proposals| {
            let proposal = proposals
                .iter_mut()
                .find(|p| &p.hash == hash)
                .ok_or(StorageError::NotFound(*hash))?;

            if proposal.is_executed() {
                return Err(StorageError::AlreadyExecuted(*hash));
            }

            proposal.execution = Some(record);
            Ok(proposal.clone())
        })
    }

    /// Proposals without an execution record, optionally for one chain
    pub fn pending(&self, chain: Option<&str>) -> Result<Vec<Proposal>, StorageError> {
        Ok(self
            .load()?
            .into_iter()
            .filter(|p| !p.is_executed())
            .filter(|p| chain.map_or(true, |c| p.chain == c))
            .collect())
    }

    /// Check if a proposals file exists
    pub fn exists(&self) -> bool {
        self.proposals_path().exists()
    }

    /// Locked read-modify-write of the whole collection.
    ///
    /// Nothing is written when `mutate` returns an error.
    fn update<T, F>(&self, mutate: F) -> Result<T, StorageError>
    where
        F: FnOnce(&mut Vec<Proposal>) -> Result<T, StorageError>,
    {
        let _lock = StoreLock::acquire(&self.lock_path(), self.config.lock_timeout)?;

        let mut proposals = self.load()?;
        let result = mutate(&mut proposals)?;
        self.save(&proposals)?;

        Ok(result)
    }

    /// Write the collection; callers must hold the store lock
    fn save(&self, proposals: &[Proposal]) -> Result<(), StorageError> {
        let path = self.proposals_path();

        // Create backup if enabled
        if self.config.backup_enabled && self.config.max_backups > 0 && path.exists() {
            self.rotate_backups()?;
            fs::copy(&path, self.backup_path(0))?;
        }

        // Write to temporary file first
        let temp_path = self.temp_path();
        {
            let file = fs::File::create(&temp_path)?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, proposals)?;
            let file = writer.into_inner().map_err(|e| e.into_error())?;
            file.sync_all()?;
        }

        // Atomic rename
        fs::rename(&temp_path, &path)?;

        Ok(())
    }

    /// Rotate backup files
    fn rotate_backups(&self) -> Result<(), StorageError> {
        // Delete oldest backup
        let oldest = self.backup_path(self.config.max_backups - 1);
        if oldest.exists() {
            fs::remove_file(&oldest)?;
        }

        // Shift existing backups
        for i in (0..self.config.max_backups - 1).rev() {
            let current = self.backup_path(i);
            if current.exists() {
                let next = self.backup_path(i + 1);
                fs::rename(&current, &next)?;
            }
        }

        Ok(())
    }

    /// List available backups
    pub fn list_backups(&self) -> Vec<usize> {
        (0..self.config.max_backups)
            .filter(|i| self.backup_path(*i).exists())
            .collect()
    }

    /// Load the proposal collection from a backup
    pub fn restore_backup(&self, backup_index: usize) -> Result<Vec<Proposal>, StorageError> {
        let backup_path = self.backup_path(backup_index);
        let file = fs::File::open(&backup_path)?;
        let reader = BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }
}
