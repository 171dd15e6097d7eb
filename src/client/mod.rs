//! Snyk API client

pub mod api;
#[cfg(test)]
pub mod fixtures;
#[cfg(test)]
pub mod mock;
pub mod models;
pub mod pagination;
pub mod parallel;
pub mod rate_limit;
pub mod retry;
pub mod snyk;

pub use api::{ListingApi, ProjectApi, SettingsApi};
#[cfg(test)]
#[allow(unused_imports)]
pub use mock::MockSastClient;
pub use models::{Organization, Project};
pub use parallel::{CancelToken, run_bounded};
pub use retry::{RetryPolicy, RetryingClient};
pub use snyk::SnykClient;

/// Snyk API client trait
///
/// Every operation the tool performs against the remote service. Implemented
/// automatically for any type that implements the three focused sub-traits.
pub trait SastApi: ListingApi + SettingsApi + ProjectApi {}

impl<T: ListingApi + SettingsApi + ProjectApi> SastApi for T {}
