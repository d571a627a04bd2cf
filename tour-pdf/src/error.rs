//! Error types for PDF rendering

use thiserror::Error;

/// PDF error types
#[derive(Debug, Error)]
pub enum PdfError {
    /// Browser binary could not be started
    #[error("Failed to launch renderer: {0}")]
    Launch(String),

    /// Browser ran but produced no usable PDF
    #[error("Render failed: {0}")]
    RenderFailed(String),

    /// Browser did not finish in time
    #[error("Render timed out after {0}s")]
    Timeout(u64),

    /// Client exceeded its render quota for the current window
    #[error("Too many PDF requests, retry in {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// All render slots stayed busy for the whole queue wait
    #[error("Renderer busy")]
    Busy,

    /// IO error on the scratch files
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for PDF operations
pub type PdfResult<T> = Result<T, PdfError>;
