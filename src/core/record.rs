use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::{Error, Result};

/// Lowest confidence a completed prediction may carry
pub const MIN_CONFIDENCE: u8 = 70;
pub const MAX_CONFIDENCE: u8 = 100;

const DATE_LABEL_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Classifier verdict, without the error case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Label {
    Positive,
    Negative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Prediction {
    Positive,
    Negative,
    Error,
}

impl Prediction {
    pub fn label(&self) -> &'static str {
        match self {
            Prediction::Positive => "Positive",
            Prediction::Negative => "Negative",
            Prediction::Error => "Error",
        }
    }
}

impl From<Label> for Prediction {
    fn from(label: Label) -> Self {
        match label {
            Label::Positive => Prediction::Positive,
            Label::Negative => Prediction::Negative,
        }
    }
}

impl fmt::Display for Prediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One analysis outcome as it is persisted in a user's history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionRecord {
    /// When the analysis completed
    pub date: DateTime<Utc>,

    pub prediction: Prediction,

    /// 0 for errors, otherwise 70-100
    pub confidence: u8,

    /// Name of the submitted handwriting sample, if any
    #[serde(default)]
    pub handwriting_file: Option<String>,

    /// Name of the submitted voice sample, if any
    #[serde(default)]
    pub voice_file: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PredictionRecord {
    /// Build the record for a successful classification.
    ///
    /// Fails when the confidence falls outside the accepted range, so an
    /// inconsistent record is never handed to the store.
    pub fn completed(
        label: Label,
        confidence: u8,
        handwriting_file: Option<String>,
        voice_file: Option<String>,
        date: DateTime<Utc>,
    ) -> Result<Self> {
        if !(MIN_CONFIDENCE..=MAX_CONFIDENCE).contains(&confidence) {
            return Err(Error::Analysis(format!(
                "confidence {}% is outside {}-{}%",
                confidence, MIN_CONFIDENCE, MAX_CONFIDENCE
            )));
        }

        Ok(Self {
            date,
            prediction: label.into(),
            confidence,
            handwriting_file,
            voice_file,
            error: None,
        })
    }

    /// Build the in-memory result of a failed analysis
    pub fn failed(message: impl Into<String>, date: DateTime<Utc>) -> Self {
        Self {
            date,
            prediction: Prediction::Error,
            confidence: 0,
            handwriting_file: None,
            voice_file: None,
            error: Some(message.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.prediction == Prediction::Error
    }

    /// Human-readable timestamp, used by search and export
    pub fn date_label(&self) -> String {
        self.date.format(DATE_LABEL_FORMAT).to_string()
    }

    pub fn is_consistent(&self) -> bool {
        match self.prediction {
            Prediction::Error => self.confidence == 0 && self.error.is_some(),
            Prediction::Positive | Prediction::Negative => {
                (MIN_CONFIDENCE..=MAX_CONFIDENCE).contains(&self.confidence)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_date() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap()
    }

    #[test]
    fn test_completed_record() {
        let record = PredictionRecord::completed(
            Label::Positive,
            85,
            Some("spiral.png".to_string()),
            None,
            fixed_date(),
        )
        .unwrap();

        assert_eq!(record.prediction, Prediction::Positive);
        assert_eq!(record.confidence, 85);
        assert!(record.error.is_none());
        assert!(record.is_consistent());
    }

    #[test]
    fn test_completed_rejects_low_confidence() {
        let result = PredictionRecord::completed(Label::Negative, 69, None, None, fixed_date());
        assert!(matches!(result, Err(Error::Analysis(_))));

        let result = PredictionRecord::completed(Label::Negative, 101, None, None, fixed_date());
        assert!(result.is_err());
    }

    #[test]
    fn test_failed_record() {
        let record = PredictionRecord::failed("backend unreachable", fixed_date());
        assert!(record.is_error());
        assert_eq!(record.confidence, 0);
        assert_eq!(record.error.as_deref(), Some("backend unreachable"));
        assert!(record.is_consistent());
    }

    #[test]
    fn test_inconsistent_records() {
        let mut record = PredictionRecord::failed("x", fixed_date());
        record.confidence = 50;
        assert!(!record.is_consistent());

        record.prediction = Prediction::Positive;
        assert!(!record.is_consistent());
    }

    #[test]
    fn test_date_label() {
        let record = PredictionRecord::failed("x", fixed_date());
        assert_eq!(record.date_label(), "2024-03-09 14:05:07");
    }

    #[test]
    fn test_wire_format() {
        let record = PredictionRecord::completed(
            Label::Negative,
            91,
            None,
            Some("voice.wav".to_string()),
            fixed_date(),
        )
        .unwrap();

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["prediction"], "Negative");
        assert_eq!(value["confidence"], 91);
        assert!(value["handwritingFile"].is_null());
        assert_eq!(value["voiceFile"], "voice.wav");
        assert!(value.get("error").is_none());

        let back: PredictionRecord = serde_json::from_value(value).unwrap();
        assert_eq!(back, record);
    }
}
