//! Project mutation API trait

use async_trait::async_trait;

use crate::error::Result;

/// Project management operations for the Snyk API
#[async_trait]
pub trait ProjectApi: Send + Sync {
    /// Permanently delete a project. There is no undo.
    async fn delete_project(&self, org_id: &str, project_id: &str) -> Result<()>;
}
