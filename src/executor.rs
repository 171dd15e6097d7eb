//! Bulk operation executor
//!
//! Applies one [`Operation`] to a resolved target set. Work happens in two
//! phases:
//!
//! 1. **Plan** (read-only): every input target is checked for eligibility,
//!    organizations are expanded to their SAST projects for deletes, and
//!    toggles already in the desired state are settled as skipped.
//! 2. **Apply**: after dry-run and confirmation gates, pending targets are
//!    grouped into one unit per organization. Units run concurrently up to
//!    the concurrency bound; targets inside a unit run in input order.
//!
//! A failing target never stops the others. Authentication failure and
//! cancellation stop new units from starting; units already running finish.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use indicatif::ProgressBar;
use log::{debug, info, warn};
use serde::Serialize;

use crate::client::{CancelToken, SastApi, run_bounded};
use crate::error::{Error, Result};
use crate::input::{Identifier, Target};

/// What to do to every target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "operation", rename_all = "snake_case")]
pub enum Operation {
    /// Set the SAST setting of organization targets
    Toggle { enabled: bool },
    /// Delete project targets; organization targets expand to all their
    /// SAST projects
    DeleteProjects,
    /// Delete every SAST project of organization targets
    DeleteOrgProjects,
}

impl Operation {
    pub fn is_delete(&self) -> bool {
        matches!(self, Operation::DeleteProjects | Operation::DeleteOrgProjects)
    }

    /// Report prefix and label for this operation
    pub fn slug(&self) -> &'static str {
        match self {
            Operation::Toggle { enabled: true } => "enable_sast",
            Operation::Toggle { enabled: false } => "disable_sast",
            Operation::DeleteProjects | Operation::DeleteOrgProjects => "delete_projects",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Toggle { enabled } => write!(f, "{} SAST", toggle_verb(*enabled)),
            Operation::DeleteProjects => write!(f, "delete SAST projects"),
            Operation::DeleteOrgProjects => write!(f, "delete all SAST projects of organizations"),
        }
    }
}

fn toggle_verb(enabled: bool) -> &'static str {
    if enabled { "enable" } else { "disable" }
}

fn state_word(enabled: bool) -> &'static str {
    if enabled { "enabled" } else { "disabled" }
}

/// Lifecycle of one target.
///
/// `Pending -> InProgress -> {Success, Failed}` or `Pending -> Skipped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetStatus {
    Pending,
    InProgress,
    Success,
    Failed,
    Skipped,
}

impl TargetStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TargetStatus::Success | TargetStatus::Failed | TargetStatus::Skipped
        )
    }

    fn can_advance_to(self, next: TargetStatus) -> bool {
        matches!(
            (self, next),
            (TargetStatus::Pending, TargetStatus::InProgress)
                | (TargetStatus::Pending, TargetStatus::Skipped)
                | (TargetStatus::InProgress, TargetStatus::Success)
                | (TargetStatus::InProgress, TargetStatus::Failed)
        )
    }
}

impl fmt::Display for TargetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TargetStatus::Pending => "pending",
            TargetStatus::InProgress => "in progress",
            TargetStatus::Success => "success",
            TargetStatus::Failed => "failed",
            TargetStatus::Skipped => "skipped",
        };
        f.write_str(label)
    }
}

/// Final state of one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationResult {
    pub target: Target,
    pub status: TargetStatus,
    pub detail: String,
}

/// The mutation planned for a target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mutation {
    SetSetting(bool),
    Delete,
}

/// A target moving through the state machine.
#[derive(Debug)]
struct Tracked {
    target: Target,
    status: TargetStatus,
    detail: String,
    mutation: Option<Mutation>,
}

impl Tracked {
    fn pending(target: Target, mutation: Mutation) -> Self {
        Self {
            target,
            status: TargetStatus::Pending,
            detail: String::new(),
            mutation: Some(mutation),
        }
    }

    fn skipped(target: Target, detail: impl Into<String>) -> Self {
        let mut tracked = Self {
            target,
            status: TargetStatus::Pending,
            detail: String::new(),
            mutation: None,
        };
        tracked.advance(TargetStatus::Skipped, detail);
        tracked
    }

    fn failed(target: Target, detail: impl Into<String>) -> Self {
        let mut tracked = Self {
            target,
            status: TargetStatus::Pending,
            detail: String::new(),
            mutation: None,
        };
        tracked.advance(TargetStatus::InProgress, "");
        tracked.advance(TargetStatus::Failed, detail);
        tracked
    }

    fn advance(&mut self, next: TargetStatus, detail: impl Into<String>) {
        debug_assert!(
            self.status.can_advance_to(next),
            "invalid transition {:?} -> {:?}",
            self.status,
            next
        );
        debug!("{}: {:?} -> {:?}", self.target, self.status, next);
        self.status = next;
        self.detail = detail.into();
    }

    fn is_pending(&self) -> bool {
        self.status == TargetStatus::Pending
    }

    fn into_result(self) -> OperationResult {
        OperationResult {
            target: self.target,
            status: self.status,
            detail: self.detail,
        }
    }
}

/// What a batch is about to change, shown to the confirmation predicate.
#[derive(Debug, Clone, Serialize)]
pub struct BatchPlan {
    pub operation: Operation,
    /// Targets that will be mutated, in execution order
    pub mutations: Vec<Target>,
    /// Targets settled during planning (skipped or rejected)
    pub settled: usize,
}

impl BatchPlan {
    /// Number of distinct organizations touched
    pub fn organizations(&self) -> usize {
        let mut orgs: Vec<&str> = self.mutations.iter().map(|t| t.org_id().as_str()).collect();
        orgs.sort_unstable();
        orgs.dedup();
        orgs.len()
    }

    /// One-line description for prompts
    pub fn describe(&self) -> String {
        match self.operation {
            Operation::Toggle { enabled } => format!(
                "{} SAST for {} organization(s)",
                toggle_verb(enabled),
                self.mutations.len()
            ),
            Operation::DeleteProjects | Operation::DeleteOrgProjects => format!(
                "permanently delete {} SAST project(s) across {} organization(s)",
                self.mutations.len(),
                self.organizations()
            ),
        }
    }
}

/// Knobs for a single batch.
#[derive(Debug, Clone)]
pub struct ExecuteOptions {
    pub dry_run: bool,
    pub concurrency: usize,
    /// Shared with the caller; an authentication failure also trips it
    pub cancel: CancelToken,
    pub progress: Option<ProgressBar>,
}

impl Default for ExecuteOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            concurrency: 8,
            cancel: CancelToken::new(),
            progress: None,
        }
    }
}

/// Reconciled result of a batch.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchOutcome {
    /// Results of every target that reached a final state, in input order
    pub results: Vec<OperationResult>,
    /// Targets never started because the batch stopped early
    pub not_started: usize,
    /// Stopped by the caller
    pub cancelled: bool,
    /// Stopped by an authentication failure
    pub aborted: bool,
}

/// Counts per final status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub success: usize,
    pub failed: usize,
    pub skipped: usize,
    pub not_started: usize,
}

impl BatchSummary {
    pub fn total(&self) -> usize {
        self.success + self.failed + self.skipped + self.not_started
    }
}

impl BatchOutcome {
    pub fn summary(&self) -> BatchSummary {
        self.results.iter().fold(
            BatchSummary {
                not_started: self.not_started,
                ..BatchSummary::default()
            },
            |mut summary, result| {
                match result.status {
                    TargetStatus::Success => summary.success += 1,
                    TargetStatus::Failed => summary.failed += 1,
                    TargetStatus::Skipped => summary.skipped += 1,
                    TargetStatus::Pending | TargetStatus::InProgress => {}
                }
                summary
            },
        )
    }

    /// True when nothing failed and the batch ran to completion
    pub fn is_clean(&self) -> bool {
        !self.aborted && !self.cancelled && self.summary().failed == 0
    }

    fn stopped(targets: usize, aborted: bool) -> Self {
        Self {
            results: Vec::new(),
            not_started: targets,
            cancelled: !aborted,
            aborted,
        }
    }
}

/// Run `operation` against `targets`.
///
/// `confirm` is consulted once, before the first mutation, and never in dry
/// run. It is not called when planning leaves nothing to mutate.
pub async fn execute<F>(
    client: &dyn SastApi,
    targets: &[Target],
    operation: Operation,
    options: &ExecuteOptions,
    confirm: F,
) -> BatchOutcome
where
    F: FnOnce(&BatchPlan) -> bool,
{
    info!(
        "Starting batch: {} on {} target(s){}",
        operation,
        targets.len(),
        if options.dry_run { " (dry run)" } else { "" }
    );

    // Phase 1: plan
    let planned = run_bounded(
        targets.to_vec(),
        options.concurrency,
        &options.cancel,
        |target| {
            let cancel = options.cancel.clone();
            async move {
                let planned = plan_target(client, target, operation).await;
                if planned.is_err() {
                    cancel.cancel();
                }
                planned
            }
        },
    )
    .await;

    let mut tracked = Vec::new();
    for entry in planned.completed {
        match entry {
            Ok(steps) => tracked.extend(steps),
            Err(e) => {
                warn!("Batch aborted while planning: {}", e);
                return BatchOutcome::stopped(targets.len(), true);
            }
        }
    }
    if planned.not_started > 0 {
        info!("Batch cancelled while planning; nothing was changed");
        return BatchOutcome::stopped(targets.len(), false);
    }

    let plan = BatchPlan {
        operation,
        mutations: tracked
            .iter()
            .filter(|t| t.is_pending())
            .map(|t| t.target.clone())
            .collect(),
        settled: tracked.iter().filter(|t| !t.is_pending()).count(),
    };

    // Gates
    if options.dry_run {
        for t in tracked.iter_mut().filter(|t| t.is_pending()) {
            let detail = dry_run_detail(t.mutation);
            t.advance(TargetStatus::Skipped, detail);
        }
        return finish(tracked.into_iter().map(Some).collect(), 0, false, false);
    }

    if !plan.mutations.is_empty() && !confirm(&plan) {
        info!("Batch not confirmed; nothing was changed");
        for t in tracked.iter_mut().filter(|t| t.is_pending()) {
            t.advance(TargetStatus::Skipped, "not confirmed");
        }
        return finish(tracked.into_iter().map(Some).collect(), 0, false, false);
    }

    // Phase 2: apply, one unit per organization
    let mut slots: Vec<Option<Tracked>> = Vec::with_capacity(tracked.len());
    let mut units: Vec<Vec<(usize, Tracked)>> = Vec::new();
    let mut unit_of_org: HashMap<String, usize> = HashMap::new();

    for (index, t) in tracked.into_iter().enumerate() {
        if t.is_pending() {
            let org = t.target.org_id().as_str().to_string();
            let unit = *unit_of_org.entry(org).or_insert_with(|| {
                units.push(Vec::new());
                units.len() - 1
            });
            units[unit].push((index, t));
            slots.push(None);
        } else {
            slots.push(Some(t));
        }
    }

    if let Some(progress) = &options.progress {
        progress.set_length(plan.mutations.len() as u64);
    }

    let aborted = AtomicBool::new(false);
    let unit_sizes: Vec<usize> = units.iter().map(Vec::len).collect();
    let applied = run_bounded(units, options.concurrency, &options.cancel, |unit| {
        apply_unit(client, unit, options, &aborted)
    })
    .await;

    let not_started: usize = unit_sizes[applied.completed.len()..].iter().sum();
    for (index, t) in applied.completed.into_iter().flatten() {
        slots[index] = Some(t);
    }

    let aborted = aborted.load(Ordering::SeqCst);
    let cancelled = !aborted && options.cancel.is_cancelled();
    finish(slots, not_started, cancelled, aborted)
}

fn finish(
    slots: Vec<Option<Tracked>>,
    not_started: usize,
    cancelled: bool,
    aborted: bool,
) -> BatchOutcome {
    let outcome = BatchOutcome {
        results: slots.into_iter().flatten().map(Tracked::into_result).collect(),
        not_started,
        cancelled,
        aborted,
    };
    let summary = outcome.summary();
    info!(
        "Batch finished: {} succeeded, {} failed, {} skipped, {} not started",
        summary.success, summary.failed, summary.skipped, summary.not_started
    );
    outcome
}

fn dry_run_detail(mutation: Option<Mutation>) -> String {
    match mutation {
        Some(Mutation::SetSetting(enabled)) => format!("dry run: would {} SAST", toggle_verb(enabled)),
        Some(Mutation::Delete) => "dry run: would delete project".to_string(),
        None => "dry run".to_string(),
    }
}

/// Read-only preparation of one input target. Only fatal errors are `Err`.
async fn plan_target(
    client: &dyn SastApi,
    target: Target,
    operation: Operation,
) -> Result<Vec<Tracked>> {
    let steps = match (operation, &target) {
        (Operation::Toggle { enabled }, Target::Organization { org_id, .. }) => {
            match client.get_sast_setting(org_id.as_str()).await {
                Ok(current) if current == enabled => vec![Tracked::skipped(
                    target,
                    format!("SAST already {}", state_word(enabled)),
                )],
                Ok(_) => vec![Tracked::pending(target, Mutation::SetSetting(enabled))],
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    // The setting write is idempotent; try it anyway
                    warn!("Could not read current setting of {}: {}", target, e);
                    vec![Tracked::pending(target, Mutation::SetSetting(enabled))]
                }
            }
        }
        (Operation::Toggle { .. }, Target::Project { .. }) => vec![Tracked::failed(
            target,
            "SAST can only be toggled on organizations",
        )],
        (Operation::DeleteProjects, Target::Project { .. }) => {
            vec![Tracked::pending(target, Mutation::Delete)]
        }
        (Operation::DeleteOrgProjects, Target::Project { .. }) => vec![Tracked::failed(
            target,
            "expected an organization; use project deletion for single projects",
        )],
        (
            Operation::DeleteProjects | Operation::DeleteOrgProjects,
            Target::Organization { org_id, .. },
        ) => expand_org(client, target.clone(), org_id).await?,
    };
    Ok(steps)
}

/// Expand an organization target to one delete per SAST project.
async fn expand_org(
    client: &dyn SastApi,
    target: Target,
    org_id: &Identifier,
) -> Result<Vec<Tracked>> {
    let projects = match client.list_projects(org_id.as_str()).await {
        Ok(projects) => projects,
        Err(e) if e.is_fatal() => return Err(e),
        Err(e) => {
            warn!("Could not list projects of {}: {}", target, e);
            return Ok(vec![Tracked::failed(
                target,
                format!("could not list projects: {}", e),
            )]);
        }
    };

    if projects.is_empty() {
        return Ok(vec![Tracked::skipped(target, "no SAST projects")]);
    }

    let mut steps = Vec::with_capacity(projects.len());
    for project in projects {
        match Identifier::parse(&project.id) {
            Ok(project_id) => steps.push(Tracked::pending(
                Target::project(org_id.clone(), project_id, Some(project.name)),
                Mutation::Delete,
            )),
            Err(message) => {
                warn!("Ignoring project of {} with unusable id: {}", target, message);
                return Ok(vec![Tracked::failed(
                    target,
                    format!("remote returned an unusable project id: {}", message),
                )]);
            }
        }
    }
    debug!("{} expanded to {} project(s)", target, steps.len());
    Ok(steps)
}

/// Apply every mutation of one organization, in order.
async fn apply_unit(
    client: &dyn SastApi,
    unit: Vec<(usize, Tracked)>,
    options: &ExecuteOptions,
    aborted: &AtomicBool,
) -> Vec<(usize, Tracked)> {
    let mut done = Vec::with_capacity(unit.len());

    for (index, mut t) in unit {
        if aborted.load(Ordering::SeqCst) {
            t.advance(TargetStatus::Skipped, "not attempted: authentication failed");
            done.push((index, t));
            continue;
        }

        t.advance(TargetStatus::InProgress, "");
        match apply(client, &t).await {
            Ok(detail) => t.advance(TargetStatus::Success, detail),
            Err(e) => {
                if e.is_fatal() {
                    aborted.store(true, Ordering::SeqCst);
                    options.cancel.cancel();
                }
                warn!("{} failed: {}", t.target, e);
                t.advance(TargetStatus::Failed, e.to_string());
            }
        }

        if let Some(progress) = &options.progress {
            progress.inc(1);
        }
        done.push((index, t));
    }

    done
}

async fn apply(client: &dyn SastApi, t: &Tracked) -> Result<String> {
    let org_id = t.target.org_id().as_str();
    match (t.mutation, t.target.project_id()) {
        (Some(Mutation::SetSetting(enabled)), _) => {
            client.set_sast_setting(org_id, enabled).await?;
            Ok(format!("SAST {}", state_word(enabled)))
        }
        (Some(Mutation::Delete), Some(project_id)) => {
            client.delete_project(org_id, project_id.as_str()).await?;
            Ok("project deleted".to_string())
        }
        (Some(Mutation::Delete), None) | (None, _) => Err(Error::Other(format!(
            "nothing to apply for {}",
            t.target
        ))),
    }
}
