//! Bounded exponential backoff for remote calls
//!
//! [`RetryingClient`] wraps any [`SastApi`] implementation and retries
//! rate-limited and transient failures. Authentication and other client
//! errors are returned on the first attempt.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};

use super::api::{ListingApi, ProjectApi, SettingsApi};
use super::models::{Organization, Project};
use super::SastApi;
use crate::error::{ApiError, Error, Result};

/// Retry policy: `base * 2^(attempt-1)`, capped at `max_delay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Delay before the second attempt
    pub base_delay: Duration,
    /// Upper bound for any single delay
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(5, Duration::from_millis(500), Duration::from_secs(30))
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay,
        }
    }

    /// Delay to wait after failed attempt number `attempt` (1-based).
    ///
    /// A server `Retry-After` hint wins over the computed backoff, still
    /// bounded by `max_delay`.
    pub fn delay_for(&self, attempt: u32, hint: Option<Duration>) -> Duration {
        if let Some(hint) = hint {
            return hint.min(self.max_delay);
        }
        let exponent = attempt.saturating_sub(1).min(16);
        self.base_delay
            .saturating_mul(1u32 << exponent)
            .min(self.max_delay)
    }
}

/// Run `op` until it succeeds, fails with a non-retryable error, or the
/// attempt bound is reached.
///
/// When the bound is reached the last error is surfaced, with rate limiting
/// reported as `RateLimited { attempts }`.
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, label: &str, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => {
                if attempt > 1 {
                    debug!("{} succeeded on attempt {}", label, attempt);
                }
                return Ok(value);
            }
            Err(Error::Api(api_err)) if api_err.is_retryable() => {
                if attempt >= policy.max_attempts {
                    warn!(
                        "{} failed after {} attempts: {}",
                        label, attempt, api_err
                    );
                    return Err(match api_err {
                        ApiError::RateLimited { retry_after, .. } => ApiError::RateLimited {
                            attempts: attempt,
                            retry_after,
                        },
                        other => other,
                    }
                    .into());
                }

                let hint = match &api_err {
                    ApiError::RateLimited { retry_after, .. } => *retry_after,
                    _ => None,
                };
                let delay = policy.delay_for(attempt, hint);
                warn!(
                    "{} attempt {}/{} failed ({}); retrying in {:?}",
                    label, attempt, policy.max_attempts, api_err, delay
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

/// Retrying wrapper for any `SastApi` implementation.
pub struct RetryingClient<C: SastApi> {
    inner: C,
    policy: RetryPolicy,
}

impl<C: SastApi> RetryingClient<C> {
    pub fn new(inner: C, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    /// Get the inner client
    #[cfg(test)]
    pub fn inner(&self) -> &C {
        &self.inner
    }
}

#[async_trait]
impl<C: SastApi + 'static> ListingApi for RetryingClient<C> {
    async fn list_organizations(&self, group_id: &str) -> Result<Vec<Organization>> {
        let label = format!("list organizations of group {}", group_id);
        let inner = &self.inner;
        with_retry(&self.policy, &label, move || inner.list_organizations(group_id)).await
    }

    async fn list_projects(&self, org_id: &str) -> Result<Vec<Project>> {
        let label = format!("list projects of org {}", org_id);
        let inner = &self.inner;
        with_retry(&self.policy, &label, move || inner.list_projects(org_id)).await
    }
}

#[async_trait]
impl<C: SastApi + 'static> SettingsApi for RetryingClient<C> {
    async fn get_sast_setting(&self, org_id: &str) -> Result<bool> {
        let label = format!("get SAST setting of org {}", org_id);
        let inner = &self.inner;
        with_retry(&self.policy, &label, move || inner.get_sast_setting(org_id)).await
    }

    async fn set_sast_setting(&self, org_id: &str, enabled: bool) -> Result<()> {
        let label = format!("set SAST setting of org {}", org_id);
        let inner = &self.inner;
        with_retry(&self.policy, &label, move || {
            inner.set_sast_setting(org_id, enabled)
        })
        .await
    }
}

#[async_trait]
impl<C: SastApi + 'static> ProjectApi for RetryingClient<C> {
    async fn delete_project(&self, org_id: &str, project_id: &str) -> Result<()> {
        let label = format!("delete project {} of org {}", project_id, org_id);
        let inner = &self.inner;
        with_retry(&self.policy, &label, move || {
            inner.delete_project(org_id, project_id)
        })
        .await
    }
}
