pub mod error;
pub mod export;
pub mod inference;
pub mod pipeline;
pub mod record;
pub mod session;
pub mod storage;
pub mod store;
pub mod view;

pub use error::{Error, Result};
pub use export::{build_report, export_csv, export_file_name, report_file_name};
pub use inference::{Classification, InferenceClient, Modality, SimulatedClient, Upload};
pub use pipeline::{AnalysisPipeline, PipelineState};
pub use record::{Label, Prediction, PredictionRecord};
pub use session::{Session, SessionStore};
pub use storage::{FileStorage, KeyValueStore, MemoryStorage};
pub use store::RecordStore;
pub use view::{stats, view, RecordStats, SortKey};
