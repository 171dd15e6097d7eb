//! Test fixtures and builders for API model types
//!
//! Provides builder patterns for creating test data with sensible defaults.
//! Import via `use crate::client::fixtures::*` in test modules.

#![allow(dead_code)] // Builder methods are available for future tests

use super::models::{Organization, Project};

// ============================================================================
// OrganizationBuilder
// ============================================================================

/// Builder for creating test Organization instances.
///
/// # Example
/// ```ignore
/// let org = OrganizationBuilder::new("org-123")
///     .name("Test Org")
///     .sast_enabled(true)
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct OrganizationBuilder {
    id: String,
    name: String,
    group_id: String,
    sast_enabled: Option<bool>,
}

impl OrganizationBuilder {
    /// Create a new builder with the given ID.
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: format!("Organization {}", &id),
            id,
            group_id: "grp".to_string(),
            sast_enabled: None,
        }
    }

    /// Set the organization name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the owning group.
    pub fn group(mut self, group_id: impl Into<String>) -> Self {
        self.group_id = group_id.into();
        self
    }

    /// Set the known SAST state.
    pub fn sast_enabled(mut self, enabled: bool) -> Self {
        self.sast_enabled = Some(enabled);
        self
    }

    /// Build the Organization.
    pub fn build(self) -> Organization {
        Organization {
            id: self.id,
            name: self.name,
            group_id: self.group_id,
            sast_enabled: self.sast_enabled,
        }
    }
}

// ============================================================================
// ProjectBuilder
// ============================================================================

/// Builder for creating test Project instances.
#[derive(Debug, Clone)]
pub struct ProjectBuilder {
    id: String,
    name: String,
    org_id: String,
    created: Option<String>,
}

impl ProjectBuilder {
    /// Create a new builder for a project owned by `org_id`.
    pub fn new(id: impl Into<String>, org_id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: format!("project-{}", &id),
            id,
            org_id: org_id.into(),
            created: None,
        }
    }

    /// Set the project name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the creation timestamp.
    pub fn created(mut self, created: impl Into<String>) -> Self {
        self.created = Some(created.into());
        self
    }

    /// Build the Project.
    pub fn build(self) -> Project {
        Project {
            id: self.id,
            name: self.name,
            org_id: self.org_id,
            created: self.created,
        }
    }
}

/// `count` projects `p1..=pN` owned by `org_id`.
pub fn projects_for(org_id: &str, count: usize) -> Vec<Project> {
    (1..=count)
        .map(|i| ProjectBuilder::new(format!("{}-p{}", org_id, i), org_id).build())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_organization_builder_defaults() {
        let org = OrganizationBuilder::new("org-1").build();
        assert_eq!(org.id, "org-1");
        assert_eq!(org.name, "Organization org-1");
        assert_eq!(org.sast_enabled, None);
    }

    #[test]
    fn test_projects_for() {
        let projects = projects_for("org-1", 3);
        assert_eq!(projects.len(), 3);
        assert_eq!(projects[2].id, "org-1-p3");
        assert!(projects.iter().all(|p| p.org_id == "org-1"));
    }
}
