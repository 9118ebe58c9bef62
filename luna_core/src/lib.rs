#![forbid(unsafe_code)]

//! Core domain model and business logic for the Luna cycle tracker.
//!
//! This crate provides:
//! - Domain types (log entries, settings, predictions)
//! - Period episode reconstruction and cycle length estimation
//! - Next-period prediction and regularity classification
//! - Persistence (JSONL journal, settings, repositories)
//! - Insights, cycle status, assistant context and CSV export

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod episodes;
pub mod estimator;
pub mod prediction;
pub mod journal;
pub mod settings;
pub mod store;
pub mod insights;
pub mod status;
pub mod assistant;
pub mod export;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::Config;
pub use episodes::{period_dates, reconstruct_episodes};
pub use estimator::{estimate, CycleEstimate};
pub use prediction::{classify_regularity, classify_samples, predict, predict_from_starts};
pub use store::{record_entry, FileStore, ListOrder, LogRepository, MemoryStore, SettingsRepository};
pub use insights::{summarize, InsightSummary};
pub use status::{cycle_status, CycleStatus};
pub use assistant::{build_context, ChatMessage, ChatRequest, Role};
pub use export::export_csv;
