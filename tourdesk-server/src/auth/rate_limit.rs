//! Per-IP fixed-window limits for the public website routes and webhooks

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use shared::error::AppError;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::state::AppState;

/// Public catalog reads per IP per minute
pub const PUBLIC_PER_MINUTE: u32 = 60;
/// Webhook deliveries per IP per minute
pub const WEBHOOK_PER_MINUTE: u32 = 600;

struct IpEntry {
    count: u32,
    window_start: Instant,
}

#[derive(Clone, Default)]
pub struct RateLimiter {
    /// route name -> (IP -> entry)
    inner: Arc<Mutex<HashMap<&'static str, HashMap<String, IpEntry>>>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the request is allowed, `false` if rate-limited.
    pub async fn check(
        &self,
        route: &'static str,
        ip: &str,
        max_requests: u32,
        window_secs: u64,
    ) -> bool {
        let mut map = self.inner.lock().await;
        let route_map = map.entry(route).or_default();
        let now = Instant::now();

        let entry = route_map.entry(ip.to_owned()).or_insert_with(|| IpEntry {
            count: 0,
            window_start: now,
        });

        // Reset window if expired
        if now.duration_since(entry.window_start).as_secs() >= window_secs {
            entry.count = 0;
            entry.window_start = now;
        }

        entry.count += 1;
        entry.count <= max_requests
    }

    /// Remove entries older than 5 minutes
    pub async fn cleanup(&self) {
        let mut map = self.inner.lock().await;
        let cutoff = std::time::Duration::from_secs(300);
        let now = Instant::now();

        for route_map in map.values_mut() {
            route_map.retain(|_, entry| now.duration_since(entry.window_start) < cutoff);
        }

        map.retain(|_, route_map| !route_map.is_empty());
    }

    #[cfg(test)]
    async fn tracked(&self) -> usize {
        self.inner.lock().await.values().map(HashMap::len).sum()
    }
}

/// Client IP: X-Forwarded-For first (load balancer), then peer address.
fn extract_ip(request: &Request) -> String {
    if let Some(forwarded) = request.headers().get("x-forwarded-for")
        && let Ok(val) = forwarded.to_str()
        && let Some(first) = val.split(',').next()
    {
        let ip = first.trim();
        if !ip.is_empty() {
            return ip.to_owned();
        }
    }

    request
        .extensions()
        .get::<axum::extract::ConnectInfo<std::net::SocketAddr>>()
        .map(|ci| ci.0.ip().to_string())
        .unwrap_or_else(|| "unknown".to_owned())
}

async fn limit(
    state: &AppState,
    route: &'static str,
    max_requests: u32,
    request: Request,
    next: Next,
) -> Result<Response, Response> {
    let ip = extract_ip(&request);
    if !state.rate_limiter.check(route, &ip, max_requests, 60).await {
        tracing::warn!(route, ip = %ip, "Rate limit exceeded");
        return Err(AppError::rate_limited().into_response());
    }
    Ok(next.run(request).await)
}

/// Public website routes
pub async fn public_rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, Response> {
    limit(&state, "public", PUBLIC_PER_MINUTE, request, next).await
}

/// WhatsApp webhook deliveries
pub async fn webhook_rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, Response> {
    limit(&state, "webhook", WEBHOOK_PER_MINUTE, request, next).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_fixed_window() {
        let limiter = RateLimiter::new();
        for _ in 0..3 {
            assert!(limiter.check("public", "10.0.0.1", 3, 60).await);
        }
        assert!(!limiter.check("public", "10.0.0.1", 3, 60).await);
        // Other IPs and routes have their own windows
        assert!(limiter.check("public", "10.0.0.2", 3, 60).await);
        assert!(limiter.check("webhook", "10.0.0.1", 3, 60).await);

        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(limiter.check("public", "10.0.0.1", 3, 60).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_drops_stale_windows() {
        let limiter = RateLimiter::new();
        limiter.check("public", "10.0.0.1", 3, 60).await;
        tokio::time::advance(Duration::from_secs(200)).await;
        limiter.check("public", "10.0.0.2", 3, 60).await;
        tokio::time::advance(Duration::from_secs(150)).await;

        limiter.cleanup().await;
        assert_eq!(limiter.tracked().await, 1);
    }

    #[test]
    fn test_extract_ip_prefers_forwarded_for() {
        let request = Request::builder()
            .header("x-forwarded-for", "203.0.113.9, 10.0.0.1")
            .body(axum::body::Body::empty())
            .unwrap();
        assert_eq!(extract_ip(&request), "203.0.113.9");

        let request = Request::builder().body(axum::body::Body::empty()).unwrap();
        assert_eq!(extract_ip(&request), "unknown");
    }
}
