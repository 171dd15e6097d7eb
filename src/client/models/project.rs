//! Project models

use serde::{Deserialize, Serialize};

/// Remote project type that marks a Snyk Code (SAST) project
pub const SAST_PROJECT_TYPE: &str = "sast";

/// SAST project owned by an organization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// Project ID
    #[serde(rename = "project_id", alias = "id")]
    pub id: String,

    /// Project name
    #[serde(rename = "project_name", alias = "name")]
    pub name: String,

    /// Owning organization ID
    #[serde(rename = "organization_id", alias = "org_id")]
    pub org_id: String,

    /// Creation timestamp as reported by the API
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
}

/// JSON:API resource object from `GET /orgs/{id}/projects`
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ProjectResource {
    pub id: String,
    #[serde(default)]
    pub attributes: ProjectAttributes,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ProjectAttributes {
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "type")]
    pub project_type: Option<String>,
    #[serde(default)]
    pub created: Option<String>,
}

impl ProjectResource {
    pub fn is_sast(&self) -> bool {
        self.attributes.project_type.as_deref() == Some(SAST_PROJECT_TYPE)
    }

    pub fn into_project(self, org_id: &str) -> Project {
        Project {
            id: self.id,
            name: self.attributes.name,
            org_id: org_id.to_string(),
            created: self.attributes.created,
        }
    }
}
