//! # tour-pdf
//!
//! HTML to PDF rendering for quotations and invoices.
//!
//! ## Scope
//!
//! This crate handles HOW a PDF is produced:
//! - Headless Chromium invocation (`--print-to-pdf`)
//! - Content-hash memory cache with TTL
//! - Concurrency and per-client rate limiting
//!
//! WHAT goes into the document (quotation layout, letterhead, pricing) stays
//! in tourdesk-server templates.
//!
//! ## Example
//!
//! ```ignore
//! use tour_pdf::{ChromiumRenderer, PdfConfig, PdfService};
//!
//! let renderer = ChromiumRenderer::new("chromium");
//! let service = PdfService::new(renderer, PdfConfig::default());
//!
//! let pdf = service.render("staff:42", "<h1>Kerala 5N/6D</h1>").await?;
//! assert!(pdf.bytes.starts_with(b"%PDF"));
//! ```

mod cache;
mod error;
mod limiter;
mod renderer;
mod service;

// Re-exports
pub use cache::{PdfCache, content_key};
pub use error::{PdfError, PdfResult};
pub use limiter::{RenderLimiter, RenderPermit};
pub use renderer::{ChromiumRenderer, HtmlToPdf};
pub use service::{PdfConfig, PdfService, RenderedPdf};
