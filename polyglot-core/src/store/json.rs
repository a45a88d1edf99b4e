//! JSON-file snapshot backend.
//!
//! Each of the four records lives in its own document under one directory:
//!
//! | Record | File |
//! |--------|------|
//! | adaptive weights | `weights.json` |
//! | language patterns | `language_patterns.json` |
//! | contextual patterns | `contextual_patterns.json` |
//! | correction ledger | `correction_ledger.json` |
//!
//! Writes go through a named temp file in the same directory followed by an
//! atomic rename, so a crash mid-write never leaves a torn record.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{PolyglotError, Result};
use crate::store::{EngineSnapshot, StateStore};

const WEIGHTS_FILE: &str = "weights.json";
const PATTERNS_FILE: &str = "language_patterns.json";
const CONTEXTS_FILE: &str = "contextual_patterns.json";
const LEDGER_FILE: &str = "correction_ledger.json";

/// Snapshot store writing four JSON documents under `dir`.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Platform default state directory for a host application.
    pub fn default_dir(app_name: &str) -> PathBuf {
        std::env::var_os("XDG_DATA_HOME")
            .map(PathBuf::from)
            .or_else(|| {
                std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".local/share"))
            })
            .unwrap_or_else(|| PathBuf::from("."))
            .join(app_name)
    }

    fn write_record<T: Serialize>(&self, file_name: &str, record: &T) -> Result<()> {
        let temp = NamedTempFile::new_in(&self.dir)?;
        let mut writer = BufWriter::new(&temp);
        serde_json::to_writer(&mut writer, record)?;
        writer.flush()?;
        drop(writer);
        temp.persist(self.dir.join(file_name))
            .map_err(|e| PolyglotError::Persistence(e.to_string()))?;
        Ok(())
    }

    fn read_record<T: DeserializeOwned>(
        &self,
        file_name: &'static str,
        default: T,
    ) -> Result<T> {
        let path = self.dir.join(file_name);
        if !path.exists() {
            return Ok(default);
        }
        let reader = BufReader::new(File::open(&path)?);
        serde_json::from_reader(reader).map_err(|e| PolyglotError::CorruptSnapshot {
            record: file_name,
            detail: e.to_string(),
        })
    }

}

impl StateStore for JsonFileStore {
    fn save(&self, snapshot: &EngineSnapshot) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        self.write_record(WEIGHTS_FILE, &snapshot.weights)?;
        self.write_record(PATTERNS_FILE, &snapshot.patterns)?;
        self.write_record(CONTEXTS_FILE, &snapshot.contexts)?;
        self.write_record(LEDGER_FILE, &snapshot.ledger)?;
        debug!(dir = %self.dir.display(), "snapshot saved");
        Ok(())
    }

    fn load(&self, defaults: EngineSnapshot) -> Result<EngineSnapshot> {
        if !self.dir.exists() {
            debug!(dir = %self.dir.display(), "no snapshot directory — first run");
            return Ok(defaults);
        }
        Ok(EngineSnapshot {
            weights: self.read_record(WEIGHTS_FILE, defaults.weights)?,
            patterns: self.read_record(PATTERNS_FILE, defaults.patterns)?,
            contexts: self.read_record(CONTEXTS_FILE, defaults.contexts)?,
            ledger: self.read_record(LEDGER_FILE, defaults.ledger)?,
        })
    }
}
