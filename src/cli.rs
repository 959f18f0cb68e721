use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::Utc;

use neuropredict::config::{Config, InferenceBackend};
use neuropredict::core::{
    build_report, export_csv, export_file_name, report_file_name, stats, view, AnalysisPipeline,
    FileStorage, InferenceClient, Modality, PipelineState, Prediction, PredictionRecord,
    RecordStore, Session, SessionStore, SimulatedClient, SortKey, Upload,
};

/// Stores opened on the configured data directory
struct Workspace {
    config: Config,
    sessions: SessionStore,
    records: RecordStore,
}

impl Workspace {
    fn open(data_dir: Option<PathBuf>) -> Result<Self> {
        let config = Config::new(data_dir)?;
        let storage = Arc::new(
            FileStorage::new(config.storage_dir()).context("Failed to open storage directory")?,
        );

        Ok(Self {
            sessions: SessionStore::new(storage.clone()),
            records: RecordStore::new(storage),
            config,
        })
    }

    fn require_session(&self) -> Result<Session> {
        match self.sessions.get_session() {
            Some(session) => Ok(session),
            None => bail!("Not logged in. Run `neuropredict login` first."),
        }
    }
}

fn build_inference_client(config: &Config) -> Result<Box<dyn InferenceClient>> {
    match config.inference.backend {
        InferenceBackend::Simulated => Ok(Box::new(SimulatedClient::new(Duration::from_millis(
            config.inference.simulated_delay_ms,
        )))),
        #[cfg(feature = "remote-inference")]
        InferenceBackend::Remote => {
            let client = neuropredict::http_client::PredictApiClient::new(
                &config.inference.base_url,
                Duration::from_secs(config.inference.timeout_secs),
            )?;
            Ok(Box::new(client))
        }
        #[cfg(not(feature = "remote-inference"))]
        InferenceBackend::Remote => {
            bail!("Remote inference requires building with the `remote-inference` feature")
        }
    }
}

pub async fn handle_login(email: String, password: String, data_dir: Option<PathBuf>) -> Result<()> {
    let workspace = Workspace::open(data_dir)?;
    let session = workspace.sessions.create_session(&email, &password)?;

    println!("✅ Logged in as {}", session.email);
    println!("Records on file: {}", workspace.records.count(&session.email));
    Ok(())
}

pub async fn handle_logout(data_dir: Option<PathBuf>) -> Result<()> {
    let workspace = Workspace::open(data_dir)?;
    workspace.sessions.destroy_session()?;

    println!("👋 Logged out");
    Ok(())
}

pub async fn handle_whoami(data_dir: Option<PathBuf>) -> Result<()> {
    let workspace = Workspace::open(data_dir)?;

    match workspace.sessions.get_session() {
        Some(session) => {
            println!("Logged in as {}", session.email);
            println!("Since: {}", session.login_time.format("%Y-%m-%d %H:%M:%S UTC"));
        }
        None => println!("Not logged in"),
    }
    Ok(())
}

pub async fn handle_analyze(
    handwriting: Option<PathBuf>,
    voice: Option<PathBuf>,
    report: Option<PathBuf>,
    data_dir: Option<PathBuf>,
) -> Result<()> {
    let workspace = Workspace::open(data_dir)?;

    let handwriting = handwriting
        .map(|path| Upload::from_path(Modality::Handwriting, &path))
        .transpose()?;
    let voice = voice
        .map(|path| Upload::from_path(Modality::Voice, &path))
        .transpose()?;

    let client = build_inference_client(&workspace.config)?;
    let pipeline = AnalysisPipeline::new(
        client,
        workspace.sessions.clone(),
        workspace.records.clone(),
    );

    println!("🔬 Analyzing samples...");
    let outcome = pipeline.submit(handwriting, voice).await;

    match pipeline.state() {
        PipelineState::Completed(record) => {
            print_result(&record);
            match workspace.sessions.get_session() {
                Some(session) => println!("Saved to the history of {}", session.email),
                None => println!("Not logged in: this result was not saved"),
            }
            if let Some(target) = report {
                let path = write_report(&record, &target)?;
                println!("📄 Report written to {}", path.display());
            }
            Ok(())
        }
        PipelineState::Failed(record) => {
            println!("⚠️  Analysis Error");
            if let Some(message) = &record.error {
                println!("{}", message);
            }
            println!("Failed to analyze. Please try again.");
            outcome.map(|_| ()).context("analysis failed")
        }
        // Validation and busy errors leave the pipeline idle
        PipelineState::Idle | PipelineState::Submitting => {
            outcome.map(|_| ()).map_err(anyhow::Error::from)
        }
    }
}

fn print_result(record: &PredictionRecord) {
    let verdict = match record.prediction {
        Prediction::Positive => "Positive for Parkinson's",
        Prediction::Negative => "Negative for Parkinson's",
        Prediction::Error => "Error",
    };
    println!("Prediction Result: {}", verdict);
    println!("Confidence Score: {}%", record.confidence);
    println!(
        "Important: This is not a diagnostic tool. Please consult with healthcare professionals."
    );
}

fn write_report(record: &PredictionRecord, target: &Path) -> Result<PathBuf> {
    let now = Utc::now();
    let path = if target.is_dir() {
        target.join(report_file_name(now))
    } else {
        target.to_path_buf()
    };

    std::fs::write(&path, build_report(record, now.date_naive()))
        .with_context(|| format!("Failed to write report to {}", path.display()))?;
    Ok(path)
}

pub async fn handle_records(
    search: Option<String>,
    sort: SortKey,
    data_dir: Option<PathBuf>,
) -> Result<()> {
    let workspace = Workspace::open(data_dir)?;
    let session = workspace.require_session()?;

    let records = workspace.records.load(&session.email);
    let summary = stats(&records);
    let shown = view(&records, search.as_deref().unwrap_or(""), sort);

    println!("📊 Prediction History for {}", session.email);
    println!(
        "Total Records: {}  Positive Cases: {}  Negative Cases: {}",
        summary.total, summary.positive, summary.negative
    );
    println!();

    if shown.is_empty() {
        println!("No records found");
        if records.is_empty() {
            println!("Start making predictions to see your history here");
        } else {
            println!("Try adjusting your search or filters");
        }
        return Ok(());
    }

    for record in &shown {
        println!(
            "{}  {:<8}  Confidence: {}%",
            record.date_label(),
            record.prediction,
            record.confidence
        );
        if let Some(file) = &record.handwriting_file {
            println!("    Handwriting: {}", file);
        }
        if let Some(file) = &record.voice_file {
            println!("    Voice: {}", file);
        }
    }
    Ok(())
}

pub async fn handle_export(
    search: Option<String>,
    sort: SortKey,
    out: Option<PathBuf>,
    data_dir: Option<PathBuf>,
) -> Result<()> {
    let workspace = Workspace::open(data_dir)?;
    let session = workspace.require_session()?;

    let records = workspace.records.load(&session.email);
    let shown = view(&records, search.as_deref().unwrap_or(""), sort);

    let default_name = export_file_name(Utc::now().date_naive());
    let path = match out {
        Some(path) if path.is_dir() => path.join(default_name),
        Some(path) => path,
        None => PathBuf::from(default_name),
    };

    std::fs::write(&path, export_csv(&shown))
        .with_context(|| format!("Failed to write export to {}", path.display()))?;

    println!("💾 Exported {} records to {}", shown.len(), path.display());
    Ok(())
}
