//! SAST settings API trait

use async_trait::async_trait;

use crate::error::Result;

/// Read and write the per-organization SAST setting
#[async_trait]
pub trait SettingsApi: Send + Sync {
    /// Current SAST setting. An unconfigured organization reads as disabled.
    async fn get_sast_setting(&self, org_id: &str) -> Result<bool>;

    /// Enable or disable SAST for an organization
    async fn set_sast_setting(&self, org_id: &str, enabled: bool) -> Result<()>;
}
