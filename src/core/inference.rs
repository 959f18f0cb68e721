use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use super::error::{Error, Result};
use super::record::{Label, MAX_CONFIDENCE, MIN_CONFIDENCE};

/// Which kind of sample an upload carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modality {
    Handwriting,
    Voice,
}

impl Modality {
    /// Multipart field name expected by the prediction backend
    pub fn field_name(&self) -> &'static str {
        match self {
            Modality::Handwriting => "handwriting",
            Modality::Voice => "voice",
        }
    }

    fn content_type_for(&self, extension: &str) -> Option<&'static str> {
        match (self, extension) {
            (Modality::Handwriting, "jpg" | "jpeg") => Some("image/jpeg"),
            (Modality::Handwriting, "png") => Some("image/png"),
            (Modality::Voice, "wav") => Some("audio/wav"),
            (Modality::Voice, "mp3" | "mpeg") => Some("audio/mpeg"),
            _ => None,
        }
    }

    fn rejection(&self) -> &'static str {
        match self {
            Modality::Handwriting => "Please upload a JPG or PNG image file",
            Modality::Voice => "Please upload a WAV or MP3 audio file",
        }
    }
}

/// An uploaded sample. The bytes are passed through untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: None,
            bytes,
        }
    }

    /// Read a sample from disk, accepting only the formats the modality allows
    pub fn from_path(modality: Modality, path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase())
            .unwrap_or_default();
        let content_type = modality
            .content_type_for(&extension)
            .ok_or_else(|| Error::Validation(modality.rejection().to_string()))?;

        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| Error::Validation(format!("invalid file path: {}", path.display())))?
            .to_string();
        let bytes = std::fs::read(path)?;

        Ok(Self {
            file_name,
            content_type: Some(content_type.to_string()),
            bytes,
        })
    }
}

/// Classifier output: verdict plus confidence in percent (0-100)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub label: Label,
    pub confidence: u8,
}

/// Anything that can turn samples into a classification
#[async_trait]
pub trait InferenceClient: Send + Sync {
    async fn classify(
        &self,
        handwriting: Option<&Upload>,
        voice: Option<&Upload>,
    ) -> Result<Classification>;
}

/// Stand-in classifier: waits, then flips a coin
pub struct SimulatedClient {
    delay: Duration,
    rng: Mutex<StdRng>,
}

impl SimulatedClient {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    pub fn with_seed(delay: Duration, seed: u64) -> Self {
        Self {
            delay,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

#[async_trait]
impl InferenceClient for SimulatedClient {
    async fn classify(
        &self,
        handwriting: Option<&Upload>,
        voice: Option<&Upload>,
    ) -> Result<Classification> {
        debug!(
            handwriting = handwriting.is_some(),
            voice = voice.is_some(),
            delay_ms = self.delay.as_millis() as u64,
            "simulating inference"
        );
        tokio::time::sleep(self.delay).await;

        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        let label = if rng.gen_bool(0.5) {
            Label::Positive
        } else {
            Label::Negative
        };
        let confidence = rng.gen_range(MIN_CONFIDENCE..MAX_CONFIDENCE);

        Ok(Classification { label, confidence })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_simulated_client_range() {
        let client = SimulatedClient::with_seed(Duration::ZERO, 7);
        let upload = Upload::new("spiral.png", vec![1, 2, 3]);

        for _ in 0..200 {
            let result = client.classify(Some(&upload), None).await.unwrap();
            assert!((70..=99).contains(&result.confidence));
        }
    }

    #[tokio::test]
    async fn test_simulated_client_yields_both_labels() {
        let client = SimulatedClient::with_seed(Duration::ZERO, 42);
        let mut positive = 0;
        let mut negative = 0;

        for _ in 0..100 {
            match client.classify(None, None).await.unwrap().label {
                Label::Positive => positive += 1,
                Label::Negative => negative += 1,
            }
        }
        assert!(positive > 0 && negative > 0);
    }

    #[test]
    fn test_upload_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Spiral.PNG");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(b"img")
            .unwrap();

        let upload = Upload::from_path(Modality::Handwriting, &path).unwrap();
        assert_eq!(upload.file_name, "Spiral.PNG");
        assert_eq!(upload.content_type.as_deref(), Some("image/png"));
        assert_eq!(upload.bytes, b"img");
    }

    #[test]
    fn test_upload_rejects_wrong_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("voice.wav");
        std::fs::write(&path, b"riff").unwrap();

        let err = Upload::from_path(Modality::Handwriting, &path).unwrap_err();
        assert!(matches!(err, Error::Validation(ref m) if m.contains("JPG or PNG")));

        let upload = Upload::from_path(Modality::Voice, &path).unwrap();
        assert_eq!(upload.content_type.as_deref(), Some("audio/wav"));
    }
}
