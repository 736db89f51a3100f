//! Sequences fetch, classification, extraction, normalization and
//! persistence for one batch of upstream listings.

pub mod error;
pub mod orchestrator;
pub mod types;

pub use error::{PipelineError, Stage};
pub use orchestrator::Orchestrator;
pub use types::{BatchResult, FailureKind, FragmentRef, ItemFailure, PipelineConfig, ScrapeParams};
