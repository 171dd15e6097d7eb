//! Per-endpoint rate limiting for the Snyk API
//!
//! Implements reactive rate limiting that only activates after receiving a 429.
//! The v1 and REST APIs are metered separately.

use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicBool, Ordering};

use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use log::debug;

/// Categories of API endpoints with their rate limits.
///
/// - v1 endpoints: 2000/min per token (~33/sec)
/// - REST endpoints: 1620/min per token (27/sec)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndpointCategory {
    /// `/v1/...`
    V1,
    /// `/rest/...`
    Rest,
}

impl EndpointCategory {
    /// All endpoint categories for initialization.
    pub const ALL: [EndpointCategory; 2] = [EndpointCategory::V1, EndpointCategory::Rest];

    /// Categorize a request URL or path.
    pub fn from_url(url: &str) -> Self {
        if url.contains("/v1/") {
            EndpointCategory::V1
        } else {
            EndpointCategory::Rest
        }
    }

    /// Requests per minute allowed for this category.
    pub fn per_minute(&self) -> u32 {
        match self {
            EndpointCategory::V1 => 2000,
            EndpointCategory::Rest => 1620,
        }
    }
}

/// Rate limiter state for a single endpoint category.
pub struct EndpointRateLimiter {
    limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,
    active: AtomicBool,
    category: EndpointCategory,
}

impl EndpointRateLimiter {
    /// Create a new rate limiter for an endpoint category.
    pub fn new(category: EndpointCategory) -> Self {
        let quota = Quota::per_minute(
            NonZeroU32::new(category.per_minute()).unwrap_or(NonZeroU32::MIN),
        );

        Self {
            limiter: RateLimiter::direct(quota),
            active: AtomicBool::new(false),
            category,
        }
    }

    /// Activate rate limiting for this category.
    pub fn activate(&self) {
        let was_active = self.active.swap(true, Ordering::SeqCst);
        if !was_active {
            debug!("Rate limiting activated for {:?}", self.category);
        }
    }

    /// Check if rate limiting is active.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Wait for permission if rate limiting is active.
    pub async fn wait_if_active(&self) {
        if self.is_active() {
            self.limiter.until_ready().await;
        }
    }
}

/// Collection of rate limiters for all endpoint categories.
///
/// The map is built once and never mutated, so lookups need no lock.
pub struct RateLimiterSet {
    limiters: HashMap<EndpointCategory, EndpointRateLimiter>,
}

impl Default for RateLimiterSet {
    fn default() -> Self {
        Self::new()
    }
}

impl RateLimiterSet {
    /// Create a new set of rate limiters for all endpoint categories.
    pub fn new() -> Self {
        let limiters = EndpointCategory::ALL
            .into_iter()
            .map(|category| (category, EndpointRateLimiter::new(category)))
            .collect();

        Self { limiters }
    }

    /// Wait for rate limit permission for a category (if active).
    pub async fn wait_for(&self, category: EndpointCategory) {
        if let Some(limiter) = self.limiters.get(&category) {
            limiter.wait_if_active().await;
        }
    }

    /// Activate rate limiting for a category (called on 429).
    pub fn activate(&self, category: EndpointCategory) {
        if let Some(limiter) = self.limiters.get(&category) {
            limiter.activate();
        }
    }

    /// Whether a category's limiter has been activated.
    pub fn is_active(&self, category: EndpointCategory) -> bool {
        self.limiters
            .get(&category)
            .is_some_and(EndpointRateLimiter::is_active)
    }
}
