//! Organization models

use serde::{Deserialize, Serialize};

/// Organization resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    /// Organization ID
    pub id: String,

    /// Organization name
    pub name: String,

    /// Group the organization belongs to
    pub group_id: String,

    /// SAST setting; `None` until fetched
    #[serde(default)]
    pub sast_enabled: Option<bool>,
}

impl Organization {
    /// Display label: name when known, otherwise the ID
    pub fn label(&self) -> &str {
        if self.name.is_empty() {
            &self.id
        } else {
            &self.name
        }
    }
}

/// Raw organization record from the v1 group listing
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct GroupOrg {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// Page of the v1 `GET /group/{id}/orgs` response
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct GroupOrgsResponse {
    #[serde(default)]
    pub orgs: Vec<GroupOrg>,
}

impl GroupOrg {
    pub fn into_organization(self, group_id: &str) -> Organization {
        Organization {
            id: self.id,
            name: self.name,
            group_id: group_id.to_string(),
            sast_enabled: None,
        }
    }
}
