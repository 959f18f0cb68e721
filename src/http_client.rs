use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::core::error::{Error, Result};
use crate::core::inference::{Classification, InferenceClient, Modality, Upload};
use crate::core::record::Label;

#[derive(Debug, Deserialize)]
struct PredictResponse {
    prediction: Option<String>,
    confidence: Option<f64>,
    error: Option<String>,
}

/// Client for the prediction backend's `POST /api/predict`
pub struct PredictApiClient {
    base_url: String,
    client: Client,
}

impl PredictApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn part(upload: &Upload) -> Result<Part> {
        let part = Part::bytes(upload.bytes.clone()).file_name(upload.file_name.clone());
        match &upload.content_type {
            Some(mime) => part
                .mime_str(mime)
                .map_err(|e| Error::Analysis(format!("invalid content type {}: {}", mime, e))),
            None => Ok(part),
        }
    }
}

#[async_trait]
impl InferenceClient for PredictApiClient {
    async fn classify(
        &self,
        handwriting: Option<&Upload>,
        voice: Option<&Upload>,
    ) -> Result<Classification> {
        let mut form = Form::new();
        for (modality, upload) in [(Modality::Handwriting, handwriting), (Modality::Voice, voice)] {
            if let Some(upload) = upload {
                form = form.part(modality.field_name(), Self::part(upload)?);
            }
        }

        let url = format!("{}/api/predict", self.base_url);
        debug!(%url, "sending prediction request");

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| Error::Analysis(format!("request to {} failed: {}", url, e)))?;

        let status = response.status();
        let body: PredictResponse = response
            .json()
            .await
            .map_err(|e| Error::Analysis(format!("unreadable response ({}): {}", status, e)))?;

        if let Some(message) = body.error {
            return Err(Error::Analysis(message));
        }
        if !status.is_success() {
            return Err(Error::Analysis(format!("backend returned {}", status)));
        }

        parse_classification(body.prediction.as_deref(), body.confidence)
    }
}

/// Map the backend's class names and float confidence onto a Classification
fn parse_classification(prediction: Option<&str>, confidence: Option<f64>) -> Result<Classification> {
    let label = match prediction.map(|p| p.to_lowercase()).as_deref() {
        Some("parkinson") | Some("positive") => Label::Positive,
        Some("healthy") | Some("negative") => Label::Negative,
        Some(other) => {
            return Err(Error::Analysis(format!("unknown prediction '{}'", other)));
        }
        None => return Err(Error::Analysis("response has no prediction".to_string())),
    };

    let confidence = confidence
        .ok_or_else(|| Error::Analysis("response has no confidence".to_string()))?;
    if !(0.0..=100.0).contains(&confidence) {
        return Err(Error::Analysis(format!("confidence {} out of range", confidence)));
    }

    Ok(Classification {
        label,
        confidence: confidence.round() as u8,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_backend_labels() {
        let c = parse_classification(Some("parkinson"), Some(93.27)).unwrap();
        assert_eq!(c.label, Label::Positive);
        assert_eq!(c.confidence, 93);

        let c = parse_classification(Some("Negative"), Some(70.5)).unwrap();
        assert_eq!(c.label, Label::Negative);
        assert_eq!(c.confidence, 71);
    }

    #[test]
    fn test_parse_rejects_bad_payloads() {
        assert!(parse_classification(None, Some(80.0)).is_err());
        assert!(parse_classification(Some("maybe"), Some(80.0)).is_err());
        assert!(parse_classification(Some("healthy"), None).is_err());
        assert!(parse_classification(Some("healthy"), Some(140.0)).is_err());
    }

    #[test]
    fn test_base_url_is_normalized() {
        let client = PredictApiClient::new("http://127.0.0.1:5000/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.base_url, "http://127.0.0.1:5000");
    }
}
