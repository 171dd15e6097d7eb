//! Shared CLI argument types
//!
//! This module contains reusable argument structs that can be flattened
//! into commands using `#[command(flatten)]`.

mod batch;
mod common;
mod global;

pub use batch::{BatchArgs, ReportArgs, TargetArgs};
pub use common::OutputFormat;
pub use global::GlobalOptions;
