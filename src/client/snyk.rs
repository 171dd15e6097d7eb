//! Snyk API client implementation

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, RETRY_AFTER};
use reqwest::{Client as HttpClient, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::api::{ListingApi, ProjectApi, SettingsApi};
use super::models::{
    GroupOrgsResponse, Organization, Project, ProjectResource, SastSettingsResponse,
    sast_settings_patch,
};
use super::pagination::{PaginationParams, RestPage, resolve_next_link, v1_has_next_page};
use super::rate_limit::{EndpointCategory, RateLimiterSet};
use crate::error::{ApiError, Result};

/// Snyk API host
pub const DEFAULT_API_HOST: &str = "https://api.snyk.io";

/// REST API version pinned for every REST call
pub const REST_API_VERSION: &str = "2024-05-24";

/// Media type of JSON:API requests and responses
const JSON_API: &str = "application/vnd.api+json";

/// Upper bound on pages followed for a single listing
const MAX_PAGES: usize = 10_000;

/// Snyk API client
///
/// Holds the credential for the lifetime of the process; it is never
/// persisted.
pub struct SnykClient {
    http: HttpClient,
    v1_base: String,
    rest_base: String,
    token: String,
    page_size: usize,
    rate_limiters: RateLimiterSet,
}

impl SnykClient {
    /// Create a new Snyk API client
    ///
    /// `api_host` overrides the default host (scheme + host, no path).
    pub fn new(token: impl Into<String>, api_host: Option<&str>, page_size: usize) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("sastop/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::Transient(e.to_string()))?;

        let host = api_host.unwrap_or(DEFAULT_API_HOST).trim_end_matches('/');

        Ok(Self {
            http,
            v1_base: format!("{}/v1", host),
            rest_base: format!("{}/rest", host),
            token: token.into(),
            page_size,
            rate_limiters: RateLimiterSet::new(),
        })
    }

    fn rest_url(&self, path: &str) -> String {
        format!("{}{}?version={}", self.rest_base, path, REST_API_VERSION)
    }

    /// Send one request and map the response status onto the error taxonomy.
    ///
    /// `target` names the resource for error messages.
    async fn send(
        &self,
        method: Method,
        url: &str,
        query: &[(&'static str, String)],
        body: Option<&Value>,
        target: &str,
    ) -> Result<Response> {
        let category = EndpointCategory::from_url(url);
        self.rate_limiters.wait_for(category).await;

        debug!("{} {}", method, url);
        let mut request = self
            .http
            .request(method, url)
            .header(AUTHORIZATION, format!("token {}", self.token))
            .query(query);

        request = match category {
            EndpointCategory::V1 => request.header(ACCEPT, "application/json"),
            EndpointCategory::Rest => request.header(ACCEPT, JSON_API),
        };

        if let Some(body) = body {
            let content_type = match category {
                EndpointCategory::V1 => "application/json",
                EndpointCategory::Rest => JSON_API,
            };
            request = request
                .header(CONTENT_TYPE, content_type)
                .body(serde_json::to_vec(body)?);
        }

        let response = request.send().await.map_err(ApiError::from)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            self.rate_limiters.activate(category);
        }
        let retry_after = retry_after(response.headers());
        let message = response.text().await.unwrap_or_default();
        Err(classify_status(status, retry_after, target, &message).into())
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&'static str, String)],
        target: &str,
    ) -> Result<T> {
        let response = self.send(Method::GET, url, query, None, target).await?;
        // A body cut off in transit is a transport failure, not a bad payload
        let body = response.bytes().await.map_err(ApiError::from)?;
        let data = serde_json::from_slice::<T>(&body).map_err(|e| {
            ApiError::InvalidResponse(format!("Failed to parse response for {}: {}", target, e))
        })?;
        Ok(data)
    }
}

/// Parse a `Retry-After` header given in seconds.
fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

/// Map a non-success status onto the error taxonomy.
fn classify_status(
    status: StatusCode,
    retry_after: Option<Duration>,
    target: &str,
    body: &str,
) -> ApiError {
    match status {
        StatusCode::UNAUTHORIZED => ApiError::Unauthorized,
        StatusCode::TOO_MANY_REQUESTS => ApiError::RateLimited {
            attempts: 1,
            retry_after,
        },
        s if s.is_server_error() => {
            ApiError::Transient(format!("{} returned {}", target, s.as_u16()))
        }
        s => ApiError::ClientError {
            target: target.to_string(),
            status: s.as_u16(),
            message: server_message(body).unwrap_or_else(|| {
                s.canonical_reason().unwrap_or("request rejected").to_string()
            }),
        },
    }
}

/// Extract a human-readable message from a v1 or JSON:API error body.
fn server_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    if let Some(detail) = value
        .get("errors")
        .and_then(|e| e.get(0))
        .and_then(|e| e.get("detail").or_else(|| e.get("title")))
        .and_then(Value::as_str)
    {
        return Some(detail.to_string());
    }
    value
        .get("message")
        .or_else(|| value.get("error"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

#[async_trait]
impl ListingApi for SnykClient {
    async fn list_organizations(&self, group_id: &str) -> Result<Vec<Organization>> {
        let url = format!("{}/group/{}/orgs", self.v1_base, group_id);
        let target = format!("group {}", group_id);
        let mut organizations = Vec::new();

        for page in 1..=MAX_PAGES {
            let params = PaginationParams::new().page_size(self.page_size).page(page);
            let response: GroupOrgsResponse =
                self.get_json(&url, &params.to_v1_query(), &target).await?;
            let received = response.orgs.len();
            debug!("Group {} page {} returned {} orgs", group_id, page, received);

            organizations.extend(
                response
                    .orgs
                    .into_iter()
                    .map(|o| o.into_organization(group_id)),
            );

            if !v1_has_next_page(received, params.size()) {
                return Ok(organizations);
            }
        }

        Err(ApiError::InvalidResponse(format!(
            "{} still paginating after {} pages",
            target, MAX_PAGES
        ))
        .into())
    }

    async fn list_projects(&self, org_id: &str) -> Result<Vec<Project>> {
        let target = format!("org {}", org_id);
        let params = PaginationParams::new().page_size(self.page_size);
        let mut projects = Vec::new();

        let mut url = format!("{}/orgs/{}/projects", self.rest_base, org_id);
        let mut query = vec![("version", REST_API_VERSION.to_string())];
        query.extend(params.to_rest_query());

        for page in 1..=MAX_PAGES {
            let response: RestPage<ProjectResource> = self.get_json(&url, &query, &target).await?;
            debug!(
                "Org {} project page {} returned {} resources",
                org_id,
                page,
                response.data.len()
            );

            let next = response
                .next_link()
                .map(|link| {
                    resolve_next_link(&self.rest_base, link).ok_or_else(|| {
                        ApiError::InvalidResponse(format!(
                            "{} returned a next link outside the API host: {}",
                            target, link
                        ))
                    })
                })
                .transpose()?;
            projects.extend(
                response
                    .data
                    .into_iter()
                    .filter(ProjectResource::is_sast)
                    .map(|r| r.into_project(org_id)),
            );

            match next {
                // The next link already carries version, limit and cursor
                Some(next_url) => {
                    url = next_url;
                    query.clear();
                }
                None => return Ok(projects),
            }
        }

        Err(ApiError::InvalidResponse(format!(
            "{} still paginating after {} pages",
            target, MAX_PAGES
        ))
        .into())
    }
}

#[async_trait]
impl SettingsApi for SnykClient {
    async fn get_sast_setting(&self, org_id: &str) -> Result<bool> {
        let url = format!("{}/orgs/{}/settings/sast", self.rest_base, org_id);
        let query = [("version", REST_API_VERSION.to_string())];
        let target = format!("org {}", org_id);

        match self.get_json::<SastSettingsResponse>(&url, &query, &target).await {
            Ok(settings) => Ok(settings.enabled()),
            // Settings that were never configured read as disabled
            Err(crate::error::Error::Api(ApiError::ClientError { status: 404, .. })) => {
                debug!("No SAST settings for org {}; treating as disabled", org_id);
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    async fn set_sast_setting(&self, org_id: &str, enabled: bool) -> Result<()> {
        let url = self.rest_url(&format!("/orgs/{}/settings/sast", org_id));
        let body = sast_settings_patch(org_id, enabled);
        let target = format!("org {}", org_id);

        self.send(Method::PATCH, &url, &[], Some(&body), &target)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl ProjectApi for SnykClient {
    async fn delete_project(&self, org_id: &str, project_id: &str) -> Result<()> {
        let url = self.rest_url(&format!("/orgs/{}/projects/{}", org_id, project_id));
        let target = format!("project {} in org {}", project_id, org_id);

        self.send(Method::DELETE, &url, &[], None, &target).await?;
        Ok(())
    }
}
