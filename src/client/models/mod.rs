//! Snyk API data models
//!
//! Public domain types plus the raw wire shapes they are decoded from.

mod org;
mod project;
mod settings;

pub use org::Organization;
pub use project::{Project, SAST_PROJECT_TYPE};

pub(crate) use org::GroupOrgsResponse;
pub(crate) use project::ProjectResource;
pub(crate) use settings::{SastSettingsResponse, sast_settings_patch};
