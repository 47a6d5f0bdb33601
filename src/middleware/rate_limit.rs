//! Fixed-window in-memory rate limiting per (client identifier, path).
//!
//! Counters live in this process only; with multiple server instances each
//! instance counts independently. Acceptable for a single-instance
//! deployment, which is the assumption here.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use axum::{
    extract::{Request, State},
    http::{HeaderValue, header::AUTHORIZATION},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::{error::AppError, state::AppState};

#[derive(Debug, Clone, Copy)]
pub struct RateLimitRule {
    pub window: Duration,
    pub max_requests: u32,
}

const DEFAULT_RULE: RateLimitRule = RateLimitRule {
    window: Duration::from_secs(15 * 60),
    max_requests: 100,
};

/// Stricter windows for the abuse-prone endpoints.
pub fn rule_for_path(path: &str) -> RateLimitRule {
    if path.starts_with("/api/orders") {
        RateLimitRule {
            window: Duration::from_secs(60),
            max_requests: 10,
        }
    } else if path.starts_with("/api/auth") {
        RateLimitRule {
            window: Duration::from_secs(60),
            max_requests: 5,
        }
    } else if path.starts_with("/api/upload") {
        RateLimitRule {
            window: Duration::from_secs(60),
            max_requests: 20,
        }
    } else {
        DEFAULT_RULE
    }
}

#[derive(Debug)]
struct WindowEntry {
    count: u32,
    window_start: Instant,
}

#[derive(Debug, Clone, Copy)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub remaining: u32,
    pub reset_after: Duration,
}

#[derive(Debug, Default)]
pub struct RateLimiter {
    entries: Mutex<HashMap<String, WindowEntry>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check(&self, key: &str, rule: RateLimitRule, now: Instant) -> RateLimitDecision {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());

        let entry = entries.entry(key.to_string()).or_insert(WindowEntry {
            count: 0,
            window_start: now,
        });

        // The window is fixed, not sliding: it resets wholesale once elapsed.
        if now.duration_since(entry.window_start) > rule.window {
            entry.count = 0;
            entry.window_start = now;
        }

        let reset_after = rule
            .window
            .saturating_sub(now.duration_since(entry.window_start));

        if entry.count >= rule.max_requests {
            return RateLimitDecision {
                allowed: false,
                remaining: 0,
                reset_after,
            };
        }

        entry.count += 1;
        RateLimitDecision {
            allowed: true,
            remaining: rule.max_requests - entry.count,
            reset_after,
        }
    }

    /// Drops windows that have been idle for over an hour.
    pub fn cleanup(&self, now: Instant) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries
            .retain(|_, e| now.duration_since(e.window_start) < Duration::from_secs(60 * 60));
    }
}

fn client_identifier(request: &Request) -> String {
    let ip = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .or_else(|| {
            request
                .headers()
                .get("x-real-ip")
                .and_then(|v| v.to_str().ok())
        })
        .unwrap_or("unknown");

    let auth = if request.headers().contains_key(AUTHORIZATION) {
        "authenticated"
    } else {
        "anonymous"
    };

    format!("{ip}-{auth}")
}

pub async fn rate_limit_layer(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    let rule = rule_for_path(&path);
    let key = format!("{}-{}", client_identifier(&request), path);

    let decision = state.limiter.check(&key, rule, Instant::now());

    if !decision.allowed {
        let mut response = AppError::TooManyRequests.into_response();
        let retry_after = decision.reset_after.as_secs().max(1);
        response.headers_mut().insert(
            "Retry-After",
            HeaderValue::from_str(&retry_after.to_string())
                .unwrap_or(HeaderValue::from_static("1")),
        );
        response
            .headers_mut()
            .insert("X-RateLimit-Remaining", HeaderValue::from_static("0"));
        return response;
    }

    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&decision.remaining.to_string()) {
        response.headers_mut().insert("X-RateLimit-Remaining", value);
    }
    if let Ok(value) = HeaderValue::from_str(&decision.reset_after.as_secs().to_string()) {
        response.headers_mut().insert("X-RateLimit-Reset", value);
    }
    response
}
