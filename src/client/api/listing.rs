//! Listing API trait for collection operations

use async_trait::async_trait;

use crate::client::models::{Organization, Project};
use crate::error::Result;

/// Collection listing operations for the Snyk API
///
/// Every method follows pagination until the remote listing is exhausted and
/// returns one logical sequence. A call is restartable: calling it again
/// starts from the first page.
#[async_trait]
pub trait ListingApi: Send + Sync {
    /// List all organizations in a group, in remote enumeration order
    async fn list_organizations(&self, group_id: &str) -> Result<Vec<Organization>>;

    /// List the SAST projects of an organization
    async fn list_projects(&self, org_id: &str) -> Result<Vec<Project>>;
}
