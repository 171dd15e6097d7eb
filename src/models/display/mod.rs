//! Display model implementations for table and JSON output
//!
//! Display models transform API and batch types into CLI-friendly formats
//! with appropriate column names and serialization.

mod audit;
mod common;
mod project;
mod result;

// Re-export all display types used by CLI commands
pub use audit::AuditDisplay;
pub use project::ProjectDisplay;
pub use result::ResultDisplay;
