use std::{
    collections::BTreeMap,
    fmt, fs,
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::DocumentId;

const LEDGER_VERSION: u32 = 1;

/// The id of one 3PL integration run, unique per staging record.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IntegrationKey(String);

impl IntegrationKey {
    /// Wraps an integration id. Surrounding whitespace is ignored.
    #[must_use]
    pub fn new(value: impl AsRef<str>) -> Self {
        Self(value.as_ref().trim().to_string())
    }

    /// Returns the id.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IntegrationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A completed integration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// The integration id.
    pub key: IntegrationKey,
    /// The document the run created.
    pub document: DocumentId,
    /// SHA-256 of the raw payload, hex encoded.
    pub payload_fingerprint: String,
    /// When the run completed.
    pub recorded_at: DateTime<Utc>,
}

/// Errors raised by ledger storage.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// The ledger file could not be read or written.
    #[error("failed to access ledger at {path}: {source}")]
    Io {
        /// The ledger file.
        path: PathBuf,
        /// The underlying error.
        source: io::Error,
    },

    /// The ledger file is not a ledger.
    #[error("failed to parse ledger at {path}: {source}")]
    Parse {
        /// The ledger file.
        path: PathBuf,
        /// The underlying error.
        source: serde_json::Error,
    },

    /// The ledger file was written by an incompatible version.
    #[error("unsupported ledger version {version} at {path}")]
    Version {
        /// The ledger file.
        path: PathBuf,
        /// The version found.
        version: u32,
    },
}

/// Hex-encoded SHA-256 of a raw payload.
#[must_use]
pub fn payload_fingerprint(raw: &str) -> String {
    let digest = Sha256::digest(raw.as_bytes());
    digest.iter().map(|byte| format!("{byte:02x}")).collect()
}

/// Storage of completed integrations, keyed by integration id.
pub trait CorrelationLedger {
    /// Returns the entry for `key`, if the integration has already run.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage cannot be read.
    fn lookup(&self, key: &IntegrationKey) -> Result<Option<LedgerEntry>, LedgerError>;

    /// Records a completed integration, replacing any entry with the same key.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage cannot be written.
    fn record(&mut self, entry: LedgerEntry) -> Result<(), LedgerError>;
}

/// A ledger that lives as long as the process.
#[derive(Debug, Clone, Default)]
pub struct MemoryLedger {
    entries: BTreeMap<IntegrationKey, LedgerEntry>,
}

impl MemoryLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of recorded integrations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl CorrelationLedger for MemoryLedger {
    fn lookup(&self, key: &IntegrationKey) -> Result<Option<LedgerEntry>, LedgerError> {
        Ok(self.entries.get(key).cloned())
    }

    fn record(&mut self, entry: LedgerEntry) -> Result<(), LedgerError> {
        self.entries.insert(entry.key.clone(), entry);
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct LedgerFile {
    version: u32,
    entries: Vec<LedgerEntry>,
}

/// A ledger persisted as a JSON file.
///
/// The whole file is rewritten on every record, through a temporary file
/// that replaces the ledger once fully written.
#[derive(Debug)]
pub struct FileLedger {
    path: PathBuf,
    entries: MemoryLedger,
}

impl FileLedger {
    /// Opens the ledger at `path`. A missing file is an empty ledger.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, LedgerError> {
        let path = path.into();
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "starting new ledger");
                return Ok(Self {
                    path,
                    entries: MemoryLedger::new(),
                });
            }
            Err(source) => return Err(LedgerError::Io { path, source }),
        };

        let file: LedgerFile = match serde_json::from_str(&content) {
            Ok(file) => file,
            Err(source) => return Err(LedgerError::Parse { path, source }),
        };
        if file.version != LEDGER_VERSION {
            return Err(LedgerError::Version {
                path,
                version: file.version,
            });
        }

        let entries = MemoryLedger {
            entries: file
                .entries
                .into_iter()
                .map(|entry| (entry.key.clone(), entry))
                .collect(),
        };
        tracing::debug!(path = %path.display(), entries = entries.len(), "loaded ledger");
        Ok(Self { path, entries })
    }

    /// The ledger file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, entries: &MemoryLedger) -> Result<(), LedgerError> {
        let io_error = |source| LedgerError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_error)?;
        }

        let file = LedgerFile {
            version: LEDGER_VERSION,
            entries: entries.entries.values().cloned().collect(),
        };

        let tmp_path = self.path.with_extension("tmp");
        {
            let mut writer = BufWriter::new(fs::File::create(&tmp_path).map_err(io_error)?);
            serde_json::to_writer_pretty(&mut writer, &file)
                .map_err(io::Error::from)
                .map_err(io_error)?;
            writer.write_all(b"\n").map_err(io_error)?;
            writer
                .into_inner()
                .map_err(io::IntoInnerError::into_error)
                .and_then(|file| file.sync_all())
                .map_err(io_error)?;
        }
        fs::rename(&tmp_path, &self.path).map_err(io_error)
    }
}

impl CorrelationLedger for FileLedger {
    fn lookup(&self, key: &IntegrationKey) -> Result<Option<LedgerEntry>, LedgerError> {
        self.entries.lookup(key)
    }

    fn record(&mut self, entry: LedgerEntry) -> Result<(), LedgerError> {
        let mut staged = self.entries.clone();
        staged.record(entry)?;
        self.persist(&staged)?;
        self.entries = staged;
        Ok(())
    }
}
