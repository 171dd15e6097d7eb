//! Project display model

use serde::Serialize;
use tabled::Tabled;

use super::common::{MISSING, format_timestamp};
use crate::client::Project;

/// Project display model for table/JSON output.
#[derive(Debug, Clone, Tabled, Serialize)]
pub struct ProjectDisplay {
    /// Project ID
    #[tabled(rename = "PROJECT ID")]
    pub id: String,

    /// Project name
    #[tabled(rename = "NAME")]
    pub name: String,

    /// Owning organization
    #[tabled(rename = "ORG ID")]
    pub org_id: String,

    /// Creation time
    #[tabled(rename = "CREATED")]
    pub created: String,
}

impl From<&Project> for ProjectDisplay {
    fn from(project: &Project) -> Self {
        Self {
            id: project.id.clone(),
            name: project.name.clone(),
            org_id: project.org_id.clone(),
            created: project
                .created
                .as_deref()
                .map(format_timestamp)
                .unwrap_or_else(|| MISSING.to_string()),
        }
    }
}
