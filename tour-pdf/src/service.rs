//! PdfService: cache in front of a rate-limited renderer

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument};

use crate::cache::{PdfCache, content_key};
use crate::error::PdfResult;
use crate::limiter::RenderLimiter;
use crate::renderer::HtmlToPdf;

#[derive(Debug, Clone)]
pub struct PdfConfig {
    pub cache_ttl: Duration,
    pub cache_max_entries: usize,
    pub max_concurrent: usize,
    pub per_client_per_minute: u32,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(3600),
            cache_max_entries: 64,
            max_concurrent: 2,
            per_client_per_minute: 10,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RenderedPdf {
    pub bytes: Arc<Vec<u8>>,
    /// Content key (hex SHA-256 of the HTML), usable as an ETag
    pub key: String,
    pub cached: bool,
}

pub struct PdfService<R> {
    renderer: R,
    cache: PdfCache,
    limiter: RenderLimiter,
}

impl<R: HtmlToPdf> PdfService<R> {
    pub fn new(renderer: R, config: PdfConfig) -> Self {
        Self {
            renderer,
            cache: PdfCache::new(config.cache_ttl, config.cache_max_entries),
            limiter: RenderLimiter::new(config.max_concurrent, config.per_client_per_minute),
        }
    }

    /// Replace the default limiter (tests, custom windows)
    pub fn with_limiter(mut self, limiter: RenderLimiter) -> Self {
        self.limiter = limiter;
        self
    }

    /// Render `html` for `client_key`.
    ///
    /// A cache hit is returned immediately and does not count against the
    /// client's rate limit.
    #[instrument(skip(self, html), fields(client = client_key))]
    pub async fn render(&self, client_key: &str, html: &str) -> PdfResult<RenderedPdf> {
        let key = content_key(html);
        if let Some(bytes) = self.cache.get(&key).await {
            debug!(key = %key, "PDF cache hit");
            return Ok(RenderedPdf {
                bytes,
                key,
                cached: true,
            });
        }

        let _permit = self.limiter.acquire(client_key).await?;
        let bytes = Arc::new(self.renderer.render(html).await?);
        self.cache.insert(key.clone(), bytes.clone()).await;
        info!(key = %key, pdf_len = bytes.len(), "PDF rendered and cached");

        Ok(RenderedPdf {
            bytes,
            key,
            cached: false,
        })
    }

    pub async fn is_available(&self) -> bool {
        self.renderer.is_available().await
    }

    pub fn cache(&self) -> &PdfCache {
        &self.cache
    }

    /// Periodic housekeeping: expired cache entries and stale client windows
    pub async fn cleanup(&self) -> usize {
        self.limiter.cleanup().await;
        self.cache.cleanup().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PdfError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingRenderer {
        calls: AtomicUsize,
        fail: bool,
    }

    impl HtmlToPdf for CountingRenderer {
        async fn render(&self, html: &str) -> PdfResult<Vec<u8>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(PdfError::RenderFailed("boom".to_string()));
            }
            Ok(format!("%PDF-{}", html.len()).into_bytes())
        }

        async fn is_available(&self) -> bool {
            true
        }
    }

    fn config(per_minute: u32) -> PdfConfig {
        PdfConfig {
            per_client_per_minute: per_minute,
            ..PdfConfig::default()
        }
    }

    #[tokio::test]
    async fn test_second_render_served_from_cache() {
        let service = PdfService::new(CountingRenderer::default(), config(10));
        let first = service.render("staff:1", "<h1>A</h1>").await.unwrap();
        let second = service.render("staff:1", "<h1>A</h1>").await.unwrap();

        assert!(!first.cached);
        assert!(second.cached);
        assert_eq!(first.key, second.key);
        assert_eq!(first.bytes, second.bytes);
        assert_eq!(service.renderer.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cache_hits_do_not_consume_quota() {
        let service = PdfService::new(CountingRenderer::default(), config(1));
        service.render("staff:1", "<h1>A</h1>").await.unwrap();
        for _ in 0..5 {
            assert!(service.render("staff:1", "<h1>A</h1>").await.unwrap().cached);
        }
        // A new document needs a render and the quota is spent
        assert!(matches!(
            service.render("staff:1", "<h1>B</h1>").await,
            Err(PdfError::RateLimited { .. })
        ));
        // Another client is unaffected
        assert!(service.render("staff:2", "<h1>B</h1>").await.is_ok());
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let renderer = CountingRenderer {
            fail: true,
            ..CountingRenderer::default()
        };
        let service = PdfService::new(renderer, config(10));
        assert!(service.render("c", "<p>x</p>").await.is_err());
        assert!(service.render("c", "<p>x</p>").await.is_err());
        assert_eq!(service.renderer.calls.load(Ordering::SeqCst), 2);
        assert!(service.cache().is_empty().await);
    }
}
