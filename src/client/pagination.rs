//! Pagination helpers for API requests
//!
//! The v1 group listing is page-numbered (`page`, `perPage`); the REST API is
//! cursor-based and hands back a `links.next` path until the listing is
//! exhausted.

use reqwest::Url;
use serde::Deserialize;

/// Maximum page size accepted by the REST API.
pub const MAX_PAGE_SIZE: usize = 100;

/// Pagination parameters for API requests.
///
/// # Example
/// ```ignore
/// let params = PaginationParams::new().page_size(50).page(2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct PaginationParams {
    /// Number of items per page (default and max: 100)
    pub page_size: Option<usize>,
    /// 1-indexed page number (v1 endpoints only)
    pub page: Option<usize>,
}

impl PaginationParams {
    /// Create new pagination params with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the page size (items per page). Clamped to `MAX_PAGE_SIZE`.
    pub fn page_size(mut self, size: usize) -> Self {
        self.page_size = Some(size.clamp(1, MAX_PAGE_SIZE));
        self
    }

    /// Set the page number.
    pub fn page(mut self, page: usize) -> Self {
        self.page = Some(page);
        self
    }

    /// Effective page size
    pub fn size(&self) -> usize {
        self.page_size.unwrap_or(MAX_PAGE_SIZE)
    }

    /// Query parameters for page-numbered v1 endpoints (`page`, `perPage`).
    pub fn to_v1_query(&self) -> Vec<(&'static str, String)> {
        vec![
            ("page", self.page.unwrap_or(1).to_string()),
            ("perPage", self.size().to_string()),
        ]
    }

    /// Query parameters for cursor-based REST endpoints (`limit`).
    pub fn to_rest_query(&self) -> Vec<(&'static str, String)> {
        vec![("limit", self.size().to_string())]
    }
}

/// A page of a JSON:API collection.
#[derive(Debug, Clone, Deserialize)]
pub struct RestPage<T> {
    /// The resources on this page
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,

    /// Pagination links
    #[serde(default)]
    pub links: Option<RestLinks>,
}

/// JSON:API pagination links
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RestLinks {
    #[serde(default)]
    pub next: Option<String>,
}

impl<T> RestPage<T> {
    /// The `links.next` value, if there is another page.
    pub fn next_link(&self) -> Option<&str> {
        self.links
            .as_ref()
            .and_then(|l| l.next.as_deref())
            .filter(|next| !next.is_empty())
    }
}

/// Resolve a `links.next` value against the REST base URL.
///
/// The API returns either an absolute URL or a path which may or may not
/// repeat the `/rest` prefix. Links that leave the origin of `rest_base`
/// resolve to `None` so the token is never sent elsewhere.
pub fn resolve_next_link(rest_base: &str, next: &str) -> Option<String> {
    let resolved = if next.starts_with("http://") || next.starts_with("https://") {
        next.to_string()
    } else {
        let path = next.strip_prefix("/rest").unwrap_or(next);
        if path.starts_with('/') {
            format!("{}{}", rest_base, path)
        } else {
            format!("{}/{}", rest_base, path)
        }
    };

    let base = Url::parse(rest_base).ok()?;
    let url = Url::parse(&resolved).ok()?;
    (url.origin() == base.origin()).then_some(resolved)
}

/// Whether a page-numbered listing has more pages after a page of `received`
/// items.
pub fn v1_has_next_page(received: usize, page_size: usize) -> bool {
    received > 0 && received >= page_size
}
