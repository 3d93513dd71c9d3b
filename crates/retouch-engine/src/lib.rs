//! retouch-engine: session orchestration for the retouch editor.
//!
//! [`EditOrchestrator`] ties the managed chain and the history
//! timeline together into whole edit transactions; [`EditWorker`] runs
//! it on a dedicated thread with a superseding command queue;
//! [`AnalysisHub`] feeds background-computed side inputs into every
//! replay.

pub mod analysis_hub;
pub mod orchestrator;
pub mod worker;

pub use analysis_hub::{AnalysisHub, average_luminance};
pub use orchestrator::{EditError, EditOrchestrator, PreviewState};
pub use worker::{EditCommand, EditWorker, PreviewUpdate, WorkerStopped};
