use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;
use zeroize::Zeroizing;

use crate::crypto::{self, KdfParams};
use crate::models::CycleRecord;
use crate::record::{self, check_shapes, sort_recent_first, RecordError};

const VAULT_VERSION: u32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("crypto error: {0}")]
    Crypto(#[from] crypto::CryptoError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("record error: {0}")]
    Record(#[from] RecordError),
    #[error("unsupported vault contents version {0}")]
    UnsupportedVersion(u32),
    #[error("data directory not found")]
    NoDataDir,
}

/// Anything that can hand the engine a cycle history.
pub trait RecordSource {
    fn load_records(&self) -> Result<Vec<CycleRecord>, StorageError>;
}

impl RecordSource for Vec<CycleRecord> {
    fn load_records(&self) -> Result<Vec<CycleRecord>, StorageError> {
        let mut records = self.clone();
        sort_recent_first(&mut records);
        Ok(records)
    }
}

/// A file holding a backend cycle-logs JSON array.
#[derive(Debug, Clone)]
pub struct JsonExportSource {
    path: PathBuf,
}

impl JsonExportSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RecordSource for JsonExportSource {
    fn load_records(&self) -> Result<Vec<CycleRecord>, StorageError> {
        let json = fs::read_to_string(&self.path)?;
        Ok(record::parse_records(&json)?)
    }
}

#[derive(Serialize, Deserialize)]
struct VaultContents {
    version: u32,
    records: Vec<CycleRecord>,
}

/// Passphrase-encrypted record file on local disk.
pub struct Vault {
    path: PathBuf,
    passphrase: Zeroizing<String>,
    kdf: KdfParams,
}

impl Vault {
    /// `<local data dir>/cycle-forecast/records.vault`
    pub fn default_path() -> Result<PathBuf, StorageError> {
        let dir = dirs::data_local_dir().ok_or(StorageError::NoDataDir)?;
        Ok(dir.join("cycle-forecast").join("records.vault"))
    }

    pub fn open(path: impl Into<PathBuf>, passphrase: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            passphrase: Zeroizing::new(passphrase.into()),
            kdf: KdfParams::default(),
        }
    }

    /// Argon2 costs used for the next [`Vault::save`]. Loading always uses the
    /// costs recorded in the file.
    pub fn with_kdf(mut self, kdf: KdfParams) -> Self {
        self.kdf = kdf;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Seal `records` to disk. Records that would not load back (blank ids)
    /// are refused and the existing file is left untouched.
    pub fn save(&self, records: &[CycleRecord]) -> Result<(), StorageError> {
        check_shapes(records)?;
        let mut records = records.to_vec();
        sort_recent_first(&mut records);
        let contents = VaultContents {
            version: VAULT_VERSION,
            records,
        };

        let json = Zeroizing::new(serde_json::to_vec(&contents)?);
        let sealed = crypto::seal(&self.passphrase, &json, &self.kdf)?;

        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::write(&self.path, sealed)?;
        debug!(path = %self.path.display(), count = contents.records.len(), "vault saved");
        Ok(())
    }

    pub fn load(&self) -> Result<Vec<CycleRecord>, StorageError> {
        let sealed = fs::read(&self.path)?;
        let json = crypto::open(&self.passphrase, &sealed)?;
        let contents: VaultContents = serde_json::from_slice(&json)?;
        if contents.version != VAULT_VERSION {
            return Err(StorageError::UnsupportedVersion(contents.version));
        }

        let mut records = contents.records;
        sort_recent_first(&mut records);
        Ok(records)
    }

    /// Delete the vault file. A missing file is not an error.
    pub fn wipe(&self) -> Result<(), StorageError> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
            debug!(path = %self.path.display(), "vault wiped");
        }
        Ok(())
    }
}

impl RecordSource for Vault {
    fn load_records(&self) -> Result<Vec<CycleRecord>, StorageError> {
        self.load()
    }
}
