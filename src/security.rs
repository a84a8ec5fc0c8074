use crate::errors::AppError;
use axum::http::HeaderMap;
use governor::{
    clock::DefaultClock,
    state::{keyed::DefaultKeyedStateStore, InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use nonzero_ext::nonzero;
use std::num::NonZeroU32;
use std::sync::Arc;

pub fn require_bearer(headers: &HeaderMap, expected: &str) -> Result<(), AppError> {
    let auth = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AppError::Unauthorized)?;
    if !auth.starts_with("Bearer ") {
        return Err(AppError::Unauthorized);
    }
    let token = &auth[7..];
    if token != expected {
        return Err(AppError::Unauthorized);
    }
    Ok(())
}

pub fn extract_bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.to_string())
}

pub fn check_origin(headers: &HeaderMap, allowed: &[String]) -> Result<(), AppError> {
    let origin = headers
        .get("Origin")
        .and_then(|v| v.to_str().ok())
        .ok_or(AppError::OriginDenied)?;
    if allowed.iter().any(|o| o == origin) {
        Ok(())
    } else {
        Err(AppError::OriginDenied)
    }
}

pub fn content_length_ok(headers: &HeaderMap, max_kb: usize) -> Result<(), AppError> {
    if let Some(len) = headers
        .get(axum::http::header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<usize>().ok())
    {
        if len > max_kb * 1024 {
            return Err(AppError::RequestTooLarge);
        }
    }
    Ok(())
}

/// Global plus per-token call limiters. Requests without a bearer token
/// only pass the global limiter.
#[derive(Clone)]
pub struct RateLimiters {
    global: Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
    per_token: Arc<RateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>>,
}

impl RateLimiters {
    pub fn new(global_rps: u32, global_burst: u32, token_rps: u32, token_burst: u32) -> Self {
        let global_quota = Quota::per_second(nz(global_rps)).allow_burst(nz(global_burst));
        let token_quota = Quota::per_second(nz(token_rps)).allow_burst(nz(token_burst));
        Self {
            global: Arc::new(RateLimiter::direct(global_quota)),
            per_token: Arc::new(RateLimiter::keyed(token_quota)),
        }
    }

    pub fn check(&self, token: Option<&str>) -> Result<(), AppError> {
        if self.global.check().is_err() {
            return Err(AppError::RateLimited);
        }
        if let Some(t) = token {
            if self.per_token.check_key(&t.to_string()).is_err() {
                return Err(AppError::RateLimited);
            }
        }
        Ok(())
    }
}

fn nz(v: u32) -> NonZeroU32 {
    NonZeroU32::new(v).unwrap_or(nonzero!(1u32))
}
