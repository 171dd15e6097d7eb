//! API trait definitions split by responsibility
//!
//! This module organizes the Snyk API surface into focused sub-traits:
//! - [`ListingApi`] - Paginated organization and project listings
//! - [`SettingsApi`] - Per-organization SAST setting
//! - [`ProjectApi`] - Project mutations
//!
//! The [`SastApi`](super::SastApi) super-trait combines all three.

mod listing;
mod project;
mod settings;

pub use listing::ListingApi;
pub use project::ProjectApi;
pub use settings::SettingsApi;
