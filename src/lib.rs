// Library interface for sufferplan
// The CLI and the integration tests both go through these modules

pub mod config;
pub mod error;
pub mod export;
pub mod library;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod planner;
pub mod profile;
pub mod scenario;
pub mod source;

// Re-export commonly used types for convenience
pub use config::AppConfig;
pub use error::{CalculationError, LibraryError, PlannerError, Result};
pub use export::ExportFormat;
pub use library::WorkoutLibrary;
pub use logging::{LogConfig, LogFormat, LogLevel};
pub use metrics::MetricsEngine;
pub use models::*;
pub use planner::{ScenarioPlanner, ScenarioReport, WorkoutReport};
pub use profile::{resolve_effective_profile, EffectiveProfile, StoredProfile};
pub use scenario::{ScenarioAggregator, ScenarioPlan};
pub use source::{SourceKind, SourceSelection, SourceSelector};
