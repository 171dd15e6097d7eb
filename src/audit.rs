//! Group-wide SAST audit
//!
//! Enumerates every organization of a group and records its SAST setting and
//! SAST project count. A failing organization is recorded with its error and
//! the audit moves on; only an authentication failure stops it.

use chrono::{DateTime, Utc};
use indicatif::ProgressBar;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::client::{CancelToken, Organization, SastApi, run_bounded};
use crate::error::{Error, Result};

/// Audit state of one organization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub organization: Organization,
    pub sast_enabled: Option<bool>,
    pub project_count: Option<usize>,
    pub fetched_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AuditRecord {
    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }
}

/// Counts derived from a set of audit records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AuditSummary {
    pub total: usize,
    pub enabled: usize,
    pub disabled: usize,
    pub failed: usize,
    pub projects: usize,
}

impl AuditSummary {
    pub fn from_records(records: &[AuditRecord]) -> Self {
        records.iter().fold(
            Self {
                total: records.len(),
                ..Self::default()
            },
            |mut summary, record| {
                if record.is_failed() {
                    summary.failed += 1;
                }
                match record.sast_enabled {
                    Some(true) => summary.enabled += 1,
                    Some(false) => summary.disabled += 1,
                    None => {}
                }
                summary.projects += record.project_count.unwrap_or(0);
                summary
            },
        )
    }
}

/// Knobs for a single audit run.
#[derive(Debug, Clone)]
pub struct AuditOptions {
    pub concurrency: usize,
    pub cancel: CancelToken,
    pub progress: Option<ProgressBar>,
}

impl Default for AuditOptions {
    fn default() -> Self {
        Self {
            concurrency: 8,
            cancel: CancelToken::new(),
            progress: None,
        }
    }
}

/// Audit every organization of `group_id`.
///
/// Records come back in the order the API enumerated the organizations.
pub async fn audit(
    client: &dyn SastApi,
    group_id: &str,
    options: &AuditOptions,
) -> Result<Vec<AuditRecord>> {
    let orgs = client.list_organizations(group_id).await?;
    info!("Auditing {} organizations in group {}", orgs.len(), group_id);

    if let Some(progress) = &options.progress {
        progress.set_length(orgs.len() as u64);
    }

    let run = run_bounded(orgs, options.concurrency, &options.cancel, |org| {
        let cancel = options.cancel.clone();
        let progress = options.progress.clone();
        async move {
            let record = audit_org(client, org).await;
            if matches!(&record, Err(e) if e.is_fatal()) {
                cancel.cancel();
            }
            if let Some(progress) = progress {
                progress.inc(1);
            }
            record
        }
    })
    .await;

    let records = run.completed.into_iter().collect::<Result<Vec<_>>>()?;
    if run.not_started > 0 {
        return Err(Error::Other(format!(
            "Audit cancelled; {} organizations were not checked",
            run.not_started
        )));
    }

    let summary = AuditSummary::from_records(&records);
    info!(
        "Audit of group {} done: {} enabled, {} disabled, {} failed",
        group_id, summary.enabled, summary.disabled, summary.failed
    );
    Ok(records)
}

/// Fetch one organization's state. Only fatal errors are returned as `Err`.
async fn audit_org(client: &dyn SastApi, mut organization: Organization) -> Result<AuditRecord> {
    let mut errors = Vec::new();

    let sast_enabled = match client.get_sast_setting(&organization.id).await {
        Ok(enabled) => Some(enabled),
        Err(e) if e.is_fatal() => return Err(e),
        Err(e) => {
            errors.push(format!("settings: {}", e));
            None
        }
    };

    let project_count = match client.list_projects(&organization.id).await {
        Ok(projects) => Some(projects.len()),
        Err(e) if e.is_fatal() => return Err(e),
        Err(e) => {
            errors.push(format!("projects: {}", e));
            None
        }
    };

    let error = if errors.is_empty() {
        debug!(
            "Org {}: sast_enabled={:?} projects={:?}",
            organization.id, sast_enabled, project_count
        );
        None
    } else {
        let message = errors.join("; ");
        warn!("Audit of org {} failed: {}", organization.id, message);
        Some(message)
    };

    organization.sast_enabled = sast_enabled;
    Ok(AuditRecord {
        organization,
        sast_enabled,
        project_count,
        fetched_at: Utc::now(),
        error,
    })
}
