use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::Error;
use super::record::{Prediction, PredictionRecord};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    #[default]
    Date,
    Confidence,
}

impl FromStr for SortKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "date" => Ok(SortKey::Date),
            "confidence" => Ok(SortKey::Confidence),
            other => Err(Error::Validation(format!(
                "unknown sort key '{}', expected 'date' or 'confidence'",
                other
            ))),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortKey::Date => f.write_str("date"),
            SortKey::Confidence => f.write_str("confidence"),
        }
    }
}

/// Filter and order a history for display.
///
/// An empty `search_term` keeps everything; otherwise a record is kept when
/// the term appears (case-insensitively) in its date label or prediction
/// label. Both orderings are descending and stable.
pub fn view(
    records: &[PredictionRecord],
    search_term: &str,
    sort_key: SortKey,
) -> Vec<PredictionRecord> {
    let needle = search_term.to_lowercase();
    let mut filtered: Vec<PredictionRecord> = records
        .iter()
        .filter(|record| needle.is_empty() || matches_term(record, &needle))
        .cloned()
        .collect();

    match sort_key {
        SortKey::Date => filtered.sort_by(|a, b| b.date.cmp(&a.date)),
        SortKey::Confidence => filtered.sort_by(|a, b| b.confidence.cmp(&a.confidence)),
    }

    filtered
}

fn matches_term(record: &PredictionRecord, needle: &str) -> bool {
    record.date_label().to_lowercase().contains(needle)
        || record.prediction.label().to_lowercase().contains(needle)
}

/// Counters shown above a history listing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordStats {
    pub total: usize,
    pub positive: usize,
    pub negative: usize,
}

pub fn stats(records: &[PredictionRecord]) -> RecordStats {
    records.iter().fold(
        RecordStats {
            total: records.len(),
            ..RecordStats::default()
        },
        |mut acc, record| {
            match record.prediction {
                Prediction::Positive => acc.positive += 1,
                Prediction::Negative => acc.negative += 1,
                Prediction::Error => {}
            }
            acc
        },
    )
}
