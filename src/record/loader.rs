//! Load business records from JSON

use super::BusinessRecord;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Failure to load a business record
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid business record JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("meta.periods must be at least 1")]
    InvalidPeriods,
}

impl BusinessRecord {
    /// Parse a record from a JSON string
    pub fn from_json_str(json: &str) -> Result<Self, RecordError> {
        let record: BusinessRecord = serde_json::from_str(json)?;
        record.check_structure()
    }

    /// Minimal structural guard; range validation belongs to the schema layer
    fn check_structure(self) -> Result<Self, RecordError> {
        if self.meta.periods == 0 {
            return Err(RecordError::InvalidPeriods);
        }
        if let Some(id) = self.duplicate_segment_id() {
            log::warn!("segment id '{}' is used more than once", id);
        }
        Ok(self)
    }
}

/// Load a record from a JSON file
pub fn load_record<P: AsRef<Path>>(path: P) -> Result<BusinessRecord, RecordError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| RecordError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let record = load_record_from_reader(BufReader::new(file))?;
    log::info!(
        "loaded '{}' from {} ({} periods, {} segments)",
        record.meta.title,
        path.display(),
        record.meta.periods,
        record.customers.segments.len()
    );
    Ok(record)
}

/// Load a record from any reader (e.g., string buffer, network stream)
pub fn load_record_from_reader<R: Read>(reader: R) -> Result<BusinessRecord, RecordError> {
    let record: BusinessRecord = serde_json::from_reader(reader)?;
    record.check_structure()
}
