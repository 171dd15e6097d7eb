//! Display models for CLI output
//!
//! This module provides shared display model abstractions for converting
//! API response types and batch results into CLI-friendly display formats.

pub mod display;

pub use display::{AuditDisplay, ProjectDisplay, ResultDisplay};
