//! Audit record display model

use serde::Serialize;
use tabled::Tabled;

use super::common::{MISSING, sast_state, truncate_string};
use crate::audit::AuditRecord;

/// Audit record display model for table/JSON output.
#[derive(Debug, Clone, Tabled, Serialize)]
pub struct AuditDisplay {
    /// Organization ID
    #[tabled(rename = "ORG ID")]
    pub id: String,

    /// Organization name
    #[tabled(rename = "NAME")]
    pub name: String,

    /// SAST setting
    #[tabled(rename = "SAST")]
    pub sast: String,

    /// Number of SAST projects
    #[tabled(rename = "PROJECTS")]
    pub projects: String,

    /// Fetch error, if any
    #[tabled(rename = "ERROR")]
    pub error: String,
}

impl From<&AuditRecord> for AuditDisplay {
    fn from(record: &AuditRecord) -> Self {
        Self {
            id: record.organization.id.clone(),
            name: record.organization.name.clone(),
            sast: sast_state(record.sast_enabled),
            projects: record
                .project_count
                .map(|c| c.to_string())
                .unwrap_or_else(|| MISSING.to_string()),
            error: record
                .error
                .as_deref()
                .map(|e| truncate_string(e, 60))
                .unwrap_or_default(),
        }
    }
}
