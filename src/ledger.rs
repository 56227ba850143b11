//! Append-only decision ledger
//!
//! A minimal write-ahead record of routing decisions: single writer,
//! multiple readers, one JSON line per decision, never rewritten. The
//! override resolver reads it back for sub-agent lookups. Prompt content is
//! never stored; [`PromptHash`] is the only content-derived field and its
//! only content-accepting constructor hashes.

use crate::classifier::Tier;
use crate::error::{AppError, AppResult};
use crate::message::Message;
use crate::overrides::OverrideKind;
use crate::registry::{Mode, Provider};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// One-way hash of a prompt's messages
///
/// Roles and contents are fed through SHA-256 with a separator byte so
/// adjacent fields cannot be confused. There is no constructor that stores
/// text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PromptHash(String);

impl PromptHash {
    /// Hash a message list
    pub fn of_messages(messages: &[Message]) -> Self {
        let mut hasher = Sha256::new();
        for message in messages {
            hasher.update(message.role().as_str().as_bytes());
            hasher.update([0u8]);
            hasher.update(message.content().as_bytes());
            hasher.update([0u8]);
        }
        Self(format!("{:x}", hasher.finalize()))
    }

    /// Get the hex digest
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// One persisted routing decision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingLogEntry {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
    pub prompt_hash: PromptHash,
    pub composite_score: f64,
    pub tier: Tier,
    pub selected_model: String,
    pub provider: Provider,
    pub mode: Mode,
    #[serde(rename = "override")]
    pub override_kind: OverrideKind,
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub estimated_cost_usd: f64,
    pub classification_latency_us: u64,
}

/// Read side of the ledger
///
/// The override resolver depends on this trait rather than the file-backed
/// ledger so tests can substitute an in-memory log.
pub trait DecisionLog {
    /// Get the most recent entry recorded for a request id
    fn most_recent_by_request_id(&self, request_id: &str) -> Option<RoutingLogEntry>;
}

/// File-backed decision ledger
///
/// Appends serialize one whole line per entry under a mutex; reads scan a
/// point-in-time snapshot of the file. Read failures degrade to "no entry"
/// because routing must never stall on ledger state.
#[derive(Debug)]
pub struct DecisionLedger {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl DecisionLedger {
    /// Create a ledger backed by the given file path
    ///
    /// The file is created on first append.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Get the ledger file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one entry as a single JSON line
    ///
    /// # Errors
    /// Returns an error if serialization or the file write fails. Callers on
    /// the decision path treat that as "decision made, not recorded" and
    /// warn rather than failing the request.
    pub fn append(&self, entry: &RoutingLogEntry) -> AppResult<()> {
        let line =
            serde_json::to_string(entry).map_err(|source| AppError::LedgerSerialize { source })?;

        let mut buf = line.into_bytes();
        buf.push(b'\n');

        let _guard = match self.write_lock.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| AppError::LedgerAppend {
                path: self.path.display().to_string(),
                source,
            })?;

        // One write call per entry keeps lines whole under concurrent appends
        file.write_all(&buf).map_err(|source| AppError::LedgerAppend {
            path: self.path.display().to_string(),
            source,
        })
    }

    /// Scan the ledger for the most recent entry with the given request id
    ///
    /// Malformed lines are skipped with a warning. A missing or unreadable
    /// file yields `None`; the caller falls through to normal routing.
    pub fn most_recent_by_request_id(&self, request_id: &str) -> Option<RoutingLogEntry> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Failed to open decision ledger for read"
                );
                return None;
            }
        };

        let reader = BufReader::new(file);
        let mut found = None;
        for line in reader.lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    tracing::warn!(
                        path = %self.path.display(),
                        error = %e,
                        "Stopped scanning decision ledger mid-file"
                    );
                    break;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<RoutingLogEntry>(&line) {
                Ok(entry) => {
                    if entry.request_id == request_id {
                        found = Some(entry);
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        path = %self.path.display(),
                        error = %e,
                        "Skipping malformed decision ledger line"
                    );
                }
            }
        }
        found
    }
}

impl DecisionLog for DecisionLedger {
    fn most_recent_by_request_id(&self, request_id: &str) -> Option<RoutingLogEntry> {
        DecisionLedger::most_recent_by_request_id(self, request_id)
    }
}
