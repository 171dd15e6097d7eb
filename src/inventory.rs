//! SAST project inventory across organizations
//!
//! Lists the SAST projects of a set of organizations for `projects list`,
//! `projects export` and the backup taken before a delete. A failed listing
//! is recorded and the rest continue; an authentication failure stops the
//! run.

use log::{info, warn};
use serde::Serialize;

use crate::client::{CancelToken, Project, SastApi, run_bounded};
use crate::error::{Error, Result};
use crate::input::Target;

/// An organization whose projects could not be listed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListingFailure {
    pub org_id: String,
    pub error: String,
}

/// Projects found, in organization order, plus the listings that failed.
#[derive(Debug, Clone, Default)]
pub struct ProjectInventory {
    pub projects: Vec<Project>,
    pub failures: Vec<ListingFailure>,
}

impl ProjectInventory {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Keep only projects some target refers to: the whole organization, or
    /// that exact project.
    pub fn retain_targeted(&mut self, targets: &[Target]) {
        self.projects.retain(|project| {
            targets.iter().any(|target| match target.project_id() {
                None => target.org_id().as_str() == project.org_id,
                Some(project_id) => {
                    target.org_id().as_str() == project.org_id
                        && project_id.as_str() == project.id
                }
            })
        });
    }
}

/// Distinct organization ids of `targets`, in first-seen order.
pub fn organizations_of(targets: &[Target]) -> Vec<String> {
    let mut orgs: Vec<String> = Vec::new();
    for target in targets {
        let org_id = target.org_id().as_str();
        if !orgs.iter().any(|seen| seen == org_id) {
            orgs.push(org_id.to_string());
        }
    }
    orgs
}

/// List the SAST projects of every organization in `org_ids`.
pub async fn collect_projects(
    client: &dyn SastApi,
    org_ids: Vec<String>,
    concurrency: usize,
    cancel: &CancelToken,
) -> Result<ProjectInventory> {
    let run = run_bounded(org_ids, concurrency, cancel, |org_id| {
        let cancel = cancel.clone();
        async move {
            let listed = client.list_projects(&org_id).await;
            if matches!(&listed, Err(e) if e.is_fatal()) {
                cancel.cancel();
            }
            (org_id, listed)
        }
    })
    .await;

    let mut inventory = ProjectInventory::default();
    for (org_id, listed) in run.completed {
        match listed {
            Ok(projects) => inventory.projects.extend(projects),
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                warn!("Listing projects of org {} failed: {}", org_id, e);
                inventory.failures.push(ListingFailure {
                    org_id,
                    error: e.to_string(),
                });
            }
        }
    }

    if run.not_started > 0 {
        return Err(Error::Other(format!(
            "Listing cancelled; {} organizations were not listed",
            run.not_started
        )));
    }

    info!(
        "Listed {} SAST projects ({} organizations failed)",
        inventory.projects.len(),
        inventory.failures.len()
    );
    Ok(inventory)
}
