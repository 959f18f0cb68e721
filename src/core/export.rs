use std::fmt::Write;

use chrono::{DateTime, NaiveDate, Utc};

use super::record::PredictionRecord;

pub const CSV_HEADER: [&str; 5] = [
    "Date",
    "Prediction",
    "Confidence",
    "Handwriting File",
    "Voice File",
];

const MISSING: &str = "N/A";

/// Render records as CSV text, one line per record after the header.
///
/// Fields are joined with commas and never quoted, so a file name containing
/// a comma shifts the columns of its row.
pub fn export_csv(records: &[PredictionRecord]) -> String {
    let mut lines = Vec::with_capacity(records.len() + 1);
    lines.push(CSV_HEADER.join(","));

    for record in records {
        let row = [
            record.date_label(),
            record.prediction.label().to_string(),
            format!("{}%", record.confidence),
            record
                .handwriting_file
                .clone()
                .unwrap_or_else(|| MISSING.to_string()),
            record
                .voice_file
                .clone()
                .unwrap_or_else(|| MISSING.to_string()),
        ];
        lines.push(row.join(","));
    }

    lines.join("\n")
}

pub fn export_file_name(today: NaiveDate) -> String {
    format!("neuropredict-records-{}.csv", today.format("%Y-%m-%d"))
}

/// Plain-text summary of a single result, for the user to keep.
///
/// The `Date:` line is the day the report is produced (`today`), not the
/// record's own timestamp.
pub fn build_report(record: &PredictionRecord, today: NaiveDate) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "NeuroPredict - Parkinson Disease Prediction Report");
    let _ = writeln!(output, "===================================================");
    let _ = writeln!(output);
    let _ = writeln!(output, "Prediction: {}", record.prediction);
    let _ = writeln!(output, "Confidence: {}%", record.confidence);
    let _ = writeln!(output, "Date: {}", today.format("%Y-%m-%d"));
    if let Some(file) = &record.handwriting_file {
        let _ = writeln!(output, "Handwriting sample: {}", file);
    }
    if let Some(file) = &record.voice_file {
        let _ = writeln!(output, "Voice sample: {}", file);
    }
    let _ = writeln!(output);
    let _ = writeln!(
        output,
        "Note: This is not a diagnostic tool. Please consult a healthcare professional."
    );

    output
}

pub fn report_file_name(now: DateTime<Utc>) -> String {
    format!("neuropredict-report-{}.txt", now.timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::record::Label;
    use chrono::TimeZone;

    fn records() -> Vec<PredictionRecord> {
        let date = Utc.with_ymd_and_hms(2024, 2, 10, 8, 30, 0).unwrap();
        vec![
            PredictionRecord::completed(
                Label::Positive,
                87,
                Some("spiral.png".to_string()),
                None,
                date,
            )
            .unwrap(),
            PredictionRecord::completed(
                Label::Negative,
                70,
                None,
                Some("voice.wav".to_string()),
                date,
            )
            .unwrap(),
        ]
    }

    #[test]
    fn test_export_csv() {
        let csv = export_csv(&records());
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "Date,Prediction,Confidence,Handwriting File,Voice File");
        assert_eq!(lines[1], "2024-02-10 08:30:00,Positive,87%,spiral.png,N/A");
        assert_eq!(lines[2], "2024-02-10 08:30:00,Negative,70%,N/A,voice.wav");
        assert!(!csv.ends_with('\n'));
    }

    #[test]
    fn test_export_empty() {
        assert_eq!(
            export_csv(&[]),
            "Date,Prediction,Confidence,Handwriting File,Voice File"
        );
    }

    #[test]
    fn test_commas_are_not_escaped() {
        let mut record = records().remove(0);
        record.handwriting_file = Some("a,b.png".to_string());

        let csv = export_csv(&[record]);
        let row = csv.lines().nth(1).unwrap();
        assert_eq!(row.split(',').count(), 6);
    }

    #[test]
    fn test_file_names() {
        let today = NaiveDate::from_ymd_opt(2024, 2, 10).unwrap();
        assert_eq!(export_file_name(today), "neuropredict-records-2024-02-10.csv");

        let now = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        assert_eq!(report_file_name(now), "neuropredict-report-1700000000123.txt");
    }

    #[test]
    fn test_build_report() {
        let today = NaiveDate::from_ymd_opt(2024, 2, 11).unwrap();
        let report = build_report(&records()[0], today);

        assert!(report.contains("Prediction: Positive"));
        assert!(report.contains("Confidence: 87%"));
        assert!(report.contains("Date: 2024-02-11"));
        assert!(report.contains("Handwriting sample: spiral.png"));
        assert!(!report.contains("Voice sample"));
    }
}
