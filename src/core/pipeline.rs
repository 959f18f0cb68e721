use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use tracing::{error, info};

use super::error::{Error, Result};
use super::inference::{InferenceClient, Upload};
use super::record::PredictionRecord;
use super::session::SessionStore;
use super::store::RecordStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Submitting,
    Completed(PredictionRecord),
    /// Holds the error record shown to the user; it is never persisted
    Failed(PredictionRecord),
}

impl PipelineState {
    pub fn name(&self) -> &'static str {
        match self {
            PipelineState::Idle => "idle",
            PipelineState::Submitting => "submitting",
            PipelineState::Completed(_) => "completed",
            PipelineState::Failed(_) => "failed",
        }
    }
}

/// Drives one analysis at a time from upload to stored record
pub struct AnalysisPipeline {
    client: Box<dyn InferenceClient>,
    sessions: SessionStore,
    records: RecordStore,
    state: Mutex<PipelineState>,
}

fn lock(state: &Mutex<PipelineState>) -> MutexGuard<'_, PipelineState> {
    state.lock().unwrap_or_else(|e| e.into_inner())
}

/// Puts the pipeline back to idle if a submission is dropped mid-flight
struct InFlight<'a> {
    state: &'a Mutex<PipelineState>,
    settled: bool,
}

impl InFlight<'_> {
    fn settle(mut self, next: PipelineState) {
        *lock(self.state) = next;
        self.settled = true;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.settled {
            *lock(self.state) = PipelineState::Idle;
        }
    }
}

impl AnalysisPipeline {
    pub fn new(
        client: Box<dyn InferenceClient>,
        sessions: SessionStore,
        records: RecordStore,
    ) -> Self {
        Self {
            client,
            sessions,
            records,
            state: Mutex::new(PipelineState::Idle),
        }
    }

    pub fn state(&self) -> PipelineState {
        lock(&self.state).clone()
    }

    /// The terminal record, if the last submission has finished
    pub fn result(&self) -> Option<PredictionRecord> {
        match &*lock(&self.state) {
            PipelineState::Completed(record) | PipelineState::Failed(record) => {
                Some(record.clone())
            }
            PipelineState::Idle | PipelineState::Submitting => None,
        }
    }

    /// Classify the given samples.
    ///
    /// When a session is active at submission time the record is stored
    /// under its email before the pipeline reports completion.
    pub async fn submit(
        &self,
        handwriting: Option<Upload>,
        voice: Option<Upload>,
    ) -> Result<PredictionRecord> {
        {
            let mut state = lock(&self.state);
            if *state != PipelineState::Idle {
                return Err(Error::Busy(format!("cannot submit while {}", state.name())));
            }
            if handwriting.is_none() && voice.is_none() {
                return Err(Error::Validation(
                    "Please upload at least one file (handwriting or voice)".to_string(),
                ));
            }
            *state = PipelineState::Submitting;
        }
        let in_flight = InFlight {
            state: &self.state,
            settled: false,
        };

        let owner = self.sessions.get_session().map(|session| session.email);
        info!(
            handwriting = handwriting.as_ref().map(|u| u.file_name.as_str()),
            voice = voice.as_ref().map(|u| u.file_name.as_str()),
            signed_in = owner.is_some(),
            "analysis submitted"
        );

        let classified = self
            .client
            .classify(handwriting.as_ref(), voice.as_ref())
            .await;
        let outcome = match classified {
            Ok(classification) => PredictionRecord::completed(
                classification.label,
                classification.confidence,
                handwriting.map(|u| u.file_name),
                voice.map(|u| u.file_name),
                Utc::now(),
            )
            .and_then(|record| self.store(owner.as_deref(), record)),
            Err(e) => Err(e),
        };

        match outcome {
            Ok(record) => {
                info!(
                    prediction = %record.prediction,
                    confidence = record.confidence,
                    "analysis completed"
                );
                in_flight.settle(PipelineState::Completed(record.clone()));
                Ok(record)
            }
            Err(e) => {
                let message = match e {
                    Error::Analysis(message) => message,
                    other => other.to_string(),
                };
                error!(error = %message, "analysis failed");
                in_flight.settle(PipelineState::Failed(PredictionRecord::failed(
                    message.clone(),
                    Utc::now(),
                )));
                Err(Error::Analysis(message))
            }
        }
    }

    fn store(&self, owner: Option<&str>, record: PredictionRecord) -> Result<PredictionRecord> {
        if let Some(email) = owner {
            self.records
                .append(email, &record)
                .map_err(|e| Error::Analysis(format!("could not save record: {}", e)))?;
        }
        Ok(record)
    }

    /// Discard the last result and accept submissions again
    pub fn reset(&self) -> Result<()> {
        let mut state = lock(&self.state);
        match *state {
            PipelineState::Submitting => {
                Err(Error::Busy("cannot reset while submitting".to_string()))
            }
            _ => {
                *state = PipelineState::Idle;
                Ok(())
            }
        }
    }
}
