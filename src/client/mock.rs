//! Mock Snyk API client for testing
//!
//! Provides a mock implementation of the API traits for unit testing
//! without making real API calls. Mutations change the mock's state, so a
//! disabled org reads back as disabled and a deleted project disappears
//! from later listings.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::api::{ListingApi, ProjectApi, SettingsApi};
use super::models::{Organization, Project};
use crate::error::{ApiError, Result};

/// Mock API client for testing.
///
/// Configure expected responses via builder methods, then use in tests.
///
/// # Example
/// ```ignore
/// let mock = MockSastClient::new()
///     .with_orgs("grp", vec![OrganizationBuilder::new("org-1").build()])
///     .await
///     .with_setting("org-1", true)
///     .await;
///
/// assert!(mock.get_sast_setting("org-1").await?);
/// ```
#[derive(Default)]
pub struct MockSastClient {
    /// Organizations per group
    orgs: Arc<Mutex<HashMap<String, Vec<Organization>>>>,
    /// SAST setting per org; unknown orgs read as disabled
    settings: Arc<Mutex<HashMap<String, bool>>>,
    /// SAST projects per org
    projects: Arc<Mutex<HashMap<String, Vec<Project>>>>,
    /// Scripted failures, matched by method and key
    failures: Arc<Mutex<Vec<ScriptedFailure>>>,
    /// Track number of calls for verification
    call_count: Arc<Mutex<CallCounts>>,
    /// Captured requests for test assertions
    captured_requests: Arc<Mutex<Vec<CapturedRequest>>>,
    /// Rate limit after N total calls (simulates 429 response)
    rate_limit_after: Arc<Mutex<Option<usize>>>,
    /// Simulated latency for every call
    latency: Arc<Mutex<Option<Duration>>>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

/// A failure returned when `method` is called with `key`.
#[derive(Debug, Clone)]
struct ScriptedFailure {
    method: &'static str,
    key: String,
    error: ApiError,
    persistent: bool,
}

/// Tracks API call counts for test verification
#[derive(Default, Debug, Clone)]
pub struct CallCounts {
    pub list_organizations: usize,
    pub get_sast_setting: usize,
    pub set_sast_setting: usize,
    pub list_projects: usize,
    pub delete_project: usize,
}

impl CallCounts {
    /// Get total number of API calls made.
    pub fn total(&self) -> usize {
        self.list_organizations
            + self.get_sast_setting
            + self.set_sast_setting
            + self.list_projects
            + self.delete_project
    }

    /// Number of state-changing calls made.
    pub fn mutations(&self) -> usize {
        self.set_sast_setting + self.delete_project
    }
}

/// A captured API request for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedRequest {
    /// The API method called (e.g., "list_projects", "delete_project")
    pub method: String,
    /// Group, org or `org/project` key the call was made for
    pub key: String,
}

impl MockSastClient {
    /// Create a new mock client with default (empty) responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure organizations returned for a group.
    pub async fn with_orgs(self, group_id: &str, orgs: Vec<Organization>) -> Self {
        self.orgs.lock().await.insert(group_id.to_string(), orgs);
        self
    }

    /// Configure the SAST setting of an org.
    pub async fn with_setting(self, org_id: &str, enabled: bool) -> Self {
        self.settings
            .lock()
            .await
            .insert(org_id.to_string(), enabled);
        self
    }

    /// Configure the SAST projects of an org.
    pub async fn with_projects(self, org_id: &str, projects: Vec<Project>) -> Self {
        self.projects
            .lock()
            .await
            .insert(org_id.to_string(), projects);
        self
    }

    /// Fail the next call of `method` for `key` once.
    ///
    /// `key` is the group ID, the org ID, or `org/project` for deletes.
    pub async fn fail_next(self, method: &'static str, key: &str, error: ApiError) -> Self {
        self.push_failure(method, key, error, false).await;
        self
    }

    /// Fail every call of `method` for `key`.
    pub async fn fail_always(self, method: &'static str, key: &str, error: ApiError) -> Self {
        self.push_failure(method, key, error, true).await;
        self
    }

    /// Simulate rate limiting after N calls.
    pub async fn rate_limit_after(self, calls: usize) -> Self {
        *self.rate_limit_after.lock().await = Some(calls);
        self
    }

    /// Delay every call by `latency`.
    pub async fn with_latency(self, latency: Duration) -> Self {
        *self.latency.lock().await = Some(latency);
        self
    }

    /// Get the current call counts.
    pub async fn call_counts(&self) -> CallCounts {
        self.call_count.lock().await.clone()
    }

    /// Get all captured requests for test assertions.
    pub async fn captured_requests(&self) -> Vec<CapturedRequest> {
        self.captured_requests.lock().await.clone()
    }

    /// Highest number of calls observed in flight at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Current SAST setting of an org, if configured or mutated.
    pub async fn setting(&self, org_id: &str) -> Option<bool> {
        self.settings.lock().await.get(org_id).copied()
    }

    /// Current projects of an org.
    pub async fn projects_of(&self, org_id: &str) -> Vec<Project> {
        self.projects
            .lock()
            .await
            .get(org_id)
            .cloned()
            .unwrap_or_default()
    }

    async fn push_failure(&self, method: &'static str, key: &str, error: ApiError, persistent: bool) {
        self.failures.lock().await.push(ScriptedFailure {
            method,
            key: key.to_string(),
            error,
            persistent,
        });
    }

    /// Record the call, simulate latency, and return any scripted failure.
    async fn enter(&self, method: &'static str, key: &str) -> Result<()> {
        let total = {
            let mut counts = self.call_count.lock().await;
            match method {
                "list_organizations" => counts.list_organizations += 1,
                "get_sast_setting" => counts.get_sast_setting += 1,
                "set_sast_setting" => counts.set_sast_setting += 1,
                "list_projects" => counts.list_projects += 1,
                "delete_project" => counts.delete_project += 1,
                _ => {}
            }
            counts.total()
        };
        self.captured_requests.lock().await.push(CapturedRequest {
            method: method.to_string(),
            key: key.to_string(),
        });

        let latency = *self.latency.lock().await;
        if let Some(latency) = latency {
            let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(current, Ordering::SeqCst);
            tokio::time::sleep(latency).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
        }

        {
            let mut failures = self.failures.lock().await;
            if let Some(pos) = failures
                .iter()
                .position(|f| f.method == method && f.key == key)
            {
                let failure = if failures[pos].persistent {
                    failures[pos].clone()
                } else {
                    failures.remove(pos)
                };
                return Err(failure.error.into());
            }
        }

        if let Some(limit) = *self.rate_limit_after.lock().await {
            if total > limit {
                return Err(ApiError::RateLimited {
                    attempts: 1,
                    retry_after: None,
                }
                .into());
            }
        }

        Ok(())
    }
}

#[async_trait]
impl ListingApi for MockSastClient {
    async fn list_organizations(&self, group_id: &str) -> Result<Vec<Organization>> {
        self.enter("list_organizations", group_id).await?;
        let orgs = self
            .orgs
            .lock()
            .await
            .get(group_id)
            .cloned()
            .unwrap_or_default();
        let settings = self.settings.lock().await;
        Ok(orgs
            .into_iter()
            .map(|mut o| {
                if o.sast_enabled.is_none() {
                    o.sast_enabled = settings.get(&o.id).copied();
                }
                o
            })
            .collect())
    }

    async fn list_projects(&self, org_id: &str) -> Result<Vec<Project>> {
        self.enter("list_projects", org_id).await?;
        Ok(self.projects_of(org_id).await)
    }
}

#[async_trait]
impl SettingsApi for MockSastClient {
    async fn get_sast_setting(&self, org_id: &str) -> Result<bool> {
        self.enter("get_sast_setting", org_id).await?;
        Ok(self.setting(org_id).await.unwrap_or(false))
    }

    async fn set_sast_setting(&self, org_id: &str, enabled: bool) -> Result<()> {
        self.enter("set_sast_setting", org_id).await?;
        self.settings
            .lock()
            .await
            .insert(org_id.to_string(), enabled);
        Ok(())
    }
}

#[async_trait]
impl ProjectApi for MockSastClient {
    async fn delete_project(&self, org_id: &str, project_id: &str) -> Result<()> {
        let key = format!("{}/{}", org_id, project_id);
        self.enter("delete_project", &key).await?;

        let mut projects = self.projects.lock().await;
        let owned = projects.entry(org_id.to_string()).or_default();
        let before = owned.len();
        owned.retain(|p| p.id != project_id);
        if owned.len() == before {
            return Err(ApiError::ClientError {
                target: format!("project {}", project_id),
                status: 404,
                message: "Not Found".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::fixtures::{OrganizationBuilder, projects_for};
    use crate::error::Error;

    #[tokio::test]
    async fn test_mock_client_list_organizations() {
        let mock = MockSastClient::new()
            .with_orgs(
                "grp",
                vec![
                    OrganizationBuilder::new("org-1").build(),
                    OrganizationBuilder::new("org-2").build(),
                ],
            )
            .await
            .with_setting("org-2", true)
            .await;

        let orgs = mock.list_organizations("grp").await.unwrap();
        assert_eq!(orgs.len(), 2);
        assert_eq!(orgs[0].sast_enabled, None);
        assert_eq!(orgs[1].sast_enabled, Some(true));
        assert!(mock.list_organizations("other").await.unwrap().is_empty());
        assert_eq!(mock.call_counts().await.list_organizations, 2);
    }

    #[tokio::test]
    async fn test_mock_client_mutations_change_state() {
        let mock = MockSastClient::new()
            .with_setting("org-1", true)
            .await
            .with_projects("org-1", projects_for("org-1", 2))
            .await;

        mock.set_sast_setting("org-1", false).await.unwrap();
        assert!(!mock.get_sast_setting("org-1").await.unwrap());

        mock.delete_project("org-1", "org-1-p1").await.unwrap();
        let remaining = mock.list_projects("org-1").await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, "org-1-p2");

        let counts = mock.call_counts().await;
        assert_eq!(counts.mutations(), 2);
        assert_eq!(counts.total(), 5);
    }

    #[tokio::test]
    async fn test_mock_client_delete_missing_project_is_not_found() {
        let mock = MockSastClient::new();
        let err = mock.delete_project("org-1", "nope").await.unwrap_err();
        assert!(matches!(
            err,
            Error::Api(ApiError::ClientError { status: 404, .. })
        ));
    }

    #[tokio::test]
    async fn test_mock_client_fail_next_is_one_shot() {
        let mock = MockSastClient::new()
            .fail_next("get_sast_setting", "org-1", ApiError::Unauthorized)
            .await;

        assert!(mock.get_sast_setting("org-1").await.is_err());
        assert!(mock.get_sast_setting("org-1").await.is_ok());
        // Other keys are unaffected
        assert!(mock.get_sast_setting("org-2").await.is_ok());
    }

    #[tokio::test]
    async fn test_mock_client_fail_always_persists() {
        let mock = MockSastClient::new()
            .fail_always(
                "list_projects",
                "org-1",
                ApiError::Transient("503".to_string()),
            )
            .await;

        assert!(mock.list_projects("org-1").await.is_err());
        assert!(mock.list_projects("org-1").await.is_err());
    }

    #[tokio::test]
    async fn test_mock_client_rate_limit_after() {
        let mock = MockSastClient::new().rate_limit_after(2).await;

        assert!(mock.get_sast_setting("a").await.is_ok());
        assert!(mock.get_sast_setting("b").await.is_ok());
        let err = mock.get_sast_setting("c").await.unwrap_err();
        assert!(matches!(err, Error::Api(ApiError::RateLimited { .. })));
    }

    #[tokio::test]
    async fn test_mock_client_captured_requests() {
        let mock = MockSastClient::new()
            .with_projects("org-1", projects_for("org-1", 1))
            .await;
        mock.delete_project("org-1", "org-1-p1").await.unwrap();

        let captured = mock.captured_requests().await;
        assert_eq!(captured.len(), 1);
        assert_eq!(captured[0].method, "delete_project");
        assert_eq!(captured[0].key, "org-1/org-1-p1");
    }
}
