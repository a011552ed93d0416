use chrono::{DateTime, TimeZone, Utc};
use reqwest::Response;
use serde::Serialize;
use std::sync::Mutex;

/// Last rate-limit state reported by GitHub.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct RateLimitSnapshot {
    pub limit: Option<u32>,
    pub remaining: Option<u32>,
    pub reset_at: Option<DateTime<Utc>>,
}

impl RateLimitSnapshot {
    pub fn is_exhausted(&self) -> bool {
        self.remaining == Some(0)
    }
}

/// Records `x-ratelimit-*` headers from every GitHub response.
///
/// The client never waits on this state; it is used to tell an exhausted
/// quota apart from a permission problem and to report quota on health checks.
pub struct RateLimitTracker {
    state: Mutex<RateLimitSnapshot>,
}

impl RateLimitTracker {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(RateLimitSnapshot::default()),
        }
    }

    pub fn update_from_response(&self, response: &Response) {
        let headers = response.headers();
        let header_u64 = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
        };

        let Some(remaining) = header_u64("x-ratelimit-remaining") else {
            return;
        };

        let snapshot = RateLimitSnapshot {
            limit: header_u64("x-ratelimit-limit").map(|v| v as u32),
            remaining: Some(remaining as u32),
            reset_at: header_u64("x-ratelimit-reset")
                .and_then(|ts| Utc.timestamp_opt(ts as i64, 0).single()),
        };

        if snapshot.is_exhausted() {
            tracing::warn!("GitHub rate limit exhausted, resets at {:?}", snapshot.reset_at);
        }

        if let Ok(mut state) = self.state.lock() {
            *state = snapshot;
        }
    }

    pub fn snapshot(&self) -> RateLimitSnapshot {
        self.state
            .lock()
            .map(|state| state.clone())
            .unwrap_or_default()
    }
}

impl Default for RateLimitTracker {
    fn default() -> Self {
        Self::new()
    }
}
