//! Radstruct Domain Layer
//!
//! This crate contains the core domain model for Radstruct, the template-driven
//! radiology report structuring pipeline. It defines the fundamental concepts,
//! value objects, and trait interfaces that all other layers depend upon.
//!
//! ## Key Concepts
//!
//! - **Template**: A user-authored, arbitrarily nested description of what to extract
//! - **ReportBatch**: A group of reports submitted together against one template
//! - **StructuredReport**: One free-text report and its extraction outcome
//! - **Report lifecycle**: `pending → processing → {completed, failed}`
//! - **Batch status**: Always derived from the states of its reports
//!
//! ## Architecture
//!
//! - Pure domain logic only (no I/O)
//! - Infrastructure implementations live in other crates
//! - Trait definitions for storage and dispatch collaborators

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod batch;
pub mod confidence;
pub mod ids;
pub mod report;
pub mod template;
pub mod traits;

// Re-exports for convenience
pub use batch::{BatchProgress, BatchStatus, ReportBatch};
pub use confidence::ConfidenceScore;
pub use ids::{BatchId, ReportId, TemplateId};
pub use report::{ReportInput, ReportStatus, StructuredReport, TransitionError};
pub use template::{Template, TemplateNode};

/// Current time as seconds since the Unix epoch
pub fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
