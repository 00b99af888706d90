//! Append-only JSONL file store.
//!
//! One JSON entry per line, fsynced on every append so a crash mid-promotion
//! can be recovered by replaying the file.

use crate::audit::entry::AuditEntry;
use crate::audit::filter::AuditFilter;
use crate::audit::store::AuditStore;
use crate::core::{Error, Result};
use async_trait::async_trait;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};

/// File-backed audit store.
pub struct JsonlStore {
    path: PathBuf,
    file: Mutex<File>,
    /// Parsed copy of the file, kept in sync with appends
    cache: RwLock<Vec<AuditEntry>>,
}

impl JsonlStore {
    /// Open or create the store at `path`, loading any existing entries.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut entries = Vec::new();

        if path.exists() {
            let reader = BufReader::new(File::open(&path)?);
            for line in reader.lines() {
                let line = line?;
                if line.trim().is_empty() {
                    continue;
                }
                entries.push(AuditEntry::from_json(&line)?);
            }
        }

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            file: Mutex::new(file),
            cache: RwLock::new(entries),
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl AuditStore for JsonlStore {
    async fn append(&self, entry: &AuditEntry) -> Result<()> {
        let line = entry.to_json()?;
        {
            let mut file = self.file.lock().unwrap();
            writeln!(file, "{}", line).map_err(|e| Error::Durability(e.to_string()))?;
            // Durable before the caller commits the transition.
            file.sync_all().map_err(|e| Error::Durability(e.to_string()))?;
        }
        self.cache.write().unwrap().push(entry.clone());
        Ok(())
    }

    async fn read(&self, seq: u64) -> Result<Option<AuditEntry>> {
        Ok(self
            .cache
            .read()
            .unwrap()
            .iter()
            .find(|e| e.seq == seq)
            .cloned())
    }

    async fn query(&self, filter: &AuditFilter) -> Result<Vec<AuditEntry>> {
        let cache = self.cache.read().unwrap();
        let mut results: Vec<AuditEntry> =
            cache.iter().filter(|e| filter.matches(e)).cloned().collect();
        if let Some(limit) = filter.limit {
            results.truncate(limit);
        }
        Ok(results)
    }

    async fn all(&self) -> Result<Vec<AuditEntry>> {
        Ok(self.cache.read().unwrap().clone())
    }

    async fn len(&self) -> Result<u64> {
        Ok(self.cache.read().unwrap().len() as u64)
    }
}
