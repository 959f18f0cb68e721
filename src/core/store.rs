use std::sync::Arc;

use tracing::{debug, warn};

use super::error::Result;
use super::record::PredictionRecord;
use super::storage::KeyValueStore;

/// Append-only prediction history, one collection per email.
///
/// Assumes a single writer per email. Concurrent appends from several
/// processes would need a version check on the read-modify-write.
#[derive(Clone)]
pub struct RecordStore {
    storage: Arc<dyn KeyValueStore>,
}

pub fn records_key(email: &str) -> String {
    format!("records_{}", email)
}

impl RecordStore {
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self { storage }
    }

    /// Prepend `record` to the collection of `email` and write it back whole
    pub fn append(&self, email: &str, record: &PredictionRecord) -> Result<()> {
        let mut records = self.load(email);
        records.insert(0, record.clone());

        let json = serde_json::to_string(&records)?;
        self.storage.set(&records_key(email), &json)?;

        debug!(email, count = records.len(), "appended prediction record");
        Ok(())
    }

    /// All records of `email`, newest first.
    ///
    /// Missing or unreadable data loads as an empty history.
    pub fn load(&self, email: &str) -> Vec<PredictionRecord> {
        let key = records_key(email);
        let raw = match self.storage.get(&key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!(email, error = %e, "could not read records");
                return Vec::new();
            }
        };

        let mut records: Vec<PredictionRecord> = match serde_json::from_str(&raw) {
            Ok(records) => records,
            Err(e) => {
                warn!(email, error = %e, "stored records are malformed, treating as empty");
                return Vec::new();
            }
        };

        // Skip entries breaking the record invariant, keep the rest
        let mut index = 0;
        records.retain(|record| {
            let keep = record.is_consistent();
            if !keep {
                warn!(email, index, "skipping inconsistent stored record");
            }
            index += 1;
            keep
        });

        records
    }

    pub fn count(&self, email: &str) -> usize {
        self.load(email).len()
    }
}
