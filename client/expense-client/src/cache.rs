//! Advisory client-side cache of the last submitted report.
//!
//! Two keys, matching what the browser build kept in local storage:
//!
//! | Key             | Value                          |
//! |-----------------|--------------------------------|
//! | `reportDetails` | JSON-encoded [`CachedReport`]  |
//! | `reportCount`   | decimal report count           |
//!
//! The contract is always authoritative. Entries recorded against another
//! contract address are ignored, and unreadable entries count as absent.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::address::Address;
use crate::errors::{ClientError, Result};
use crate::reports::ReportHash;

pub const REPORT_DETAILS_KEY: &str = "reportDetails";
pub const REPORT_COUNT_KEY: &str = "reportCount";

/// Minimal string key-value store.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(lock(&self.entries).get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        lock(&self.entries).insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        lock(&self.entries).remove(key);
        Ok(())
    }
}

/// A single JSON object on disk, rewritten on every change.
pub struct JsonFileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl JsonFileStore {
    /// Open (or lazily create) the store at `path`. A missing or unreadable
    /// file starts empty and is overwritten on the next write.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text).unwrap_or_else(|e| {
                warn!("Discarding corrupt report cache {}: {e}", path.display());
                BTreeMap::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                return Err(ClientError::Storage(format!(
                    "cannot read {}: {e}",
                    path.display()
                )))
            }
        };
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        let text = serde_json::to_string_pretty(entries)?;
        std::fs::write(&self.path, text)
            .map_err(|e| ClientError::Storage(format!("cannot write {}: {e}", self.path.display())))
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(lock(&self.entries).get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = lock(&self.entries);
        entries.insert(key.to_string(), value.to_string());
        self.flush(&entries)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = lock(&self.entries);
        if entries.remove(key).is_some() {
            self.flush(&entries)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedReport {
    #[serde(rename = "ipfsHash")]
    pub content_hash: String,
    pub report_hash: ReportHash,
    pub metadata: String,
    pub project_id: u64,
    pub contract: Address,
    pub saved_at: DateTime<Utc>,
}

pub struct ReportCache {
    store: Box<dyn KeyValueStore>,
}

impl ReportCache {
    pub fn new(store: impl KeyValueStore + 'static) -> Self {
        Self {
            store: Box::new(store),
        }
    }

    pub fn save_submission(&self, report: &CachedReport, report_count: u64) -> Result<()> {
        self.store
            .set(REPORT_DETAILS_KEY, &serde_json::to_string(report)?)?;
        self.save_count(report_count)
    }

    pub fn save_count(&self, report_count: u64) -> Result<()> {
        self.store.set(REPORT_COUNT_KEY, &report_count.to_string())
    }

    /// The last submission recorded against `contract`, if readable.
    pub fn load_report(&self, contract: Address) -> Option<CachedReport> {
        let raw = match self.store.get(REPORT_DETAILS_KEY) {
            Ok(raw) => raw?,
            Err(e) => {
                warn!("Report cache unavailable: {e}");
                return None;
            }
        };
        match serde_json::from_str::<CachedReport>(&raw) {
            Ok(report) if report.contract == contract => Some(report),
            Ok(_) => None,
            Err(e) => {
                warn!("Ignoring unreadable cached report: {e}");
                None
            }
        }
    }

    pub fn load_count(&self) -> Option<u64> {
        let raw = self.store.get(REPORT_COUNT_KEY).ok()??;
        match raw.trim().parse() {
            Ok(count) => Some(count),
            Err(_) => {
                warn!("Ignoring unreadable cached report count: {raw}");
                None
            }
        }
    }

    pub fn clear(&self) -> Result<()> {
        self.store.remove(REPORT_DETAILS_KEY)?;
        self.store.remove(REPORT_COUNT_KEY)
    }
}
