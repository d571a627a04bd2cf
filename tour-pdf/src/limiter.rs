//! Render limiter
//!
//! Two independent limits:
//! - a semaphore bounding how many browsers run at once
//! - a fixed window per client key (requests per minute)

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};
use tokio::time::Instant;
use tracing::warn;

use crate::error::{PdfError, PdfResult};

struct ClientWindow {
    count: u32,
    window_start: Instant,
}

/// Held for the duration of one render
pub struct RenderPermit {
    _permit: OwnedSemaphorePermit,
}

pub struct RenderLimiter {
    slots: Arc<Semaphore>,
    per_window: u32,
    window: Duration,
    queue_timeout: Duration,
    clients: Mutex<HashMap<String, ClientWindow>>,
}

impl RenderLimiter {
    pub fn new(max_concurrent: usize, per_minute: u32) -> Self {
        Self {
            slots: Arc::new(Semaphore::new(max_concurrent.max(1))),
            per_window: per_minute,
            window: Duration::from_secs(60),
            queue_timeout: Duration::from_secs(30),
            clients: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    /// How long to wait for a free render slot before giving up
    pub fn with_queue_timeout(mut self, timeout: Duration) -> Self {
        self.queue_timeout = timeout;
        self
    }

    /// Count one request against `client` in the current window
    pub async fn check(&self, client: &str) -> PdfResult<()> {
        let mut map = self.clients.lock().await;
        let now = Instant::now();
        let entry = map.entry(client.to_owned()).or_insert_with(|| ClientWindow {
            count: 0,
            window_start: now,
        });

        if now.duration_since(entry.window_start) >= self.window {
            entry.count = 0;
            entry.window_start = now;
        }

        if entry.count >= self.per_window {
            let remaining = self
                .window
                .saturating_sub(now.duration_since(entry.window_start));
            warn!(client, "PDF rate limit exceeded");
            return Err(PdfError::RateLimited {
                retry_after_secs: remaining.as_secs().max(1),
            });
        }
        entry.count += 1;
        Ok(())
    }

    /// Charge the client window, then wait for a render slot
    pub async fn acquire(&self, client: &str) -> PdfResult<RenderPermit> {
        self.check(client).await?;
        let permit = tokio::time::timeout(self.queue_timeout, self.slots.clone().acquire_owned())
            .await
            .map_err(|_| PdfError::Busy)?
            .map_err(|_| PdfError::Busy)?;
        Ok(RenderPermit { _permit: permit })
    }

    pub fn available_slots(&self) -> usize {
        self.slots.available_permits()
    }

    /// Forget clients whose window has passed
    pub async fn cleanup(&self) {
        let mut map = self.clients.lock().await;
        let now = Instant::now();
        let window = self.window;
        map.retain(|_, entry| now.duration_since(entry.window_start) < window);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fixed_window_per_client() {
        let limiter = RenderLimiter::new(2, 2);
        assert!(limiter.check("a").await.is_ok());
        assert!(limiter.check("a").await.is_ok());
        assert!(matches!(
            limiter.check("a").await,
            Err(PdfError::RateLimited { .. })
        ));
        // Other clients have their own window
        assert!(limiter.check("b").await.is_ok());
    }

    #[tokio::test]
    async fn test_window_resets() {
        let limiter = RenderLimiter::new(1, 1).with_window(Duration::from_millis(30));
        assert!(limiter.check("a").await.is_ok());
        assert!(limiter.check("a").await.is_err());
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(limiter.check("a").await.is_ok());
    }

    #[tokio::test]
    async fn test_concurrency_slots() {
        let limiter = RenderLimiter::new(1, 10).with_queue_timeout(Duration::from_millis(20));
        let permit = limiter.acquire("a").await.unwrap();
        assert_eq!(limiter.available_slots(), 0);
        assert!(matches!(limiter.acquire("b").await, Err(PdfError::Busy)));
        drop(permit);
        assert!(limiter.acquire("b").await.is_ok());
    }

    #[tokio::test]
    async fn test_cleanup() {
        let limiter = RenderLimiter::new(1, 1).with_window(Duration::from_millis(10));
        limiter.check("a").await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        limiter.cleanup().await;
        assert!(limiter.clients.lock().await.is_empty());
    }
}
