//! Renderer adapters turning HTML into PDF bytes

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{info, instrument, warn};

use crate::error::{PdfError, PdfResult};

/// Trait for HTML to PDF adapters
#[allow(async_fn_in_trait)]
pub trait HtmlToPdf {
    /// Render a complete HTML document
    async fn render(&self, html: &str) -> PdfResult<Vec<u8>>;

    /// Check whether the renderer can run at all
    async fn is_available(&self) -> bool;
}

/// Headless Chromium / Chrome
///
/// The HTML is written to a scratch directory and printed with
/// `--print-to-pdf`; the directory is removed when the render finishes.
#[derive(Debug, Clone)]
pub struct ChromiumRenderer {
    program: PathBuf,
    launcher_args: Vec<String>,
    timeout: Duration,
}

impl ChromiumRenderer {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            launcher_args: Vec::new(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Arguments placed before the browser flags (wrappers such as `flatpak run`)
    pub fn with_launcher_args(mut self, args: Vec<String>) -> Self {
        self.launcher_args = args;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.launcher_args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .kill_on_drop(true);
        cmd
    }
}

impl HtmlToPdf for ChromiumRenderer {
    #[instrument(skip(self, html), fields(program = %self.program.display(), html_len = html.len()))]
    async fn render(&self, html: &str) -> PdfResult<Vec<u8>> {
        let dir = tempfile::tempdir()?;
        let input = dir.path().join("document.html");
        let output = dir.path().join("document.pdf");
        tokio::fs::write(&input, html).await?;

        let mut cmd = self.command();
        cmd.arg("--headless")
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--no-pdf-header-footer")
            .arg(format!("--print-to-pdf={}", output.display()))
            .arg(format!("file://{}", input.display()))
            .stderr(Stdio::piped());

        let result = tokio::time::timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| PdfError::Timeout(self.timeout.as_secs()))?
            .map_err(|e| PdfError::Launch(format!("{}: {}", self.program.display(), e)))?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            let tail: String = stderr.lines().rev().take(3).collect::<Vec<_>>().join(" | ");
            warn!(status = %result.status, "Renderer exited with failure");
            return Err(PdfError::RenderFailed(format!("{}: {}", result.status, tail)));
        }

        let bytes = tokio::fs::read(&output)
            .await
            .map_err(|e| PdfError::RenderFailed(format!("no output file: {}", e)))?;
        if !bytes.starts_with(b"%PDF") {
            return Err(PdfError::RenderFailed("output is not a PDF".to_string()));
        }

        info!(pdf_len = bytes.len(), "PDF rendered");
        Ok(bytes)
    }

    #[instrument(skip(self), fields(program = %self.program.display()))]
    async fn is_available(&self) -> bool {
        let mut cmd = self.command();
        cmd.arg("--version").stderr(Stdio::null());
        match tokio::time::timeout(Duration::from_secs(5), cmd.status()).await {
            Ok(Ok(status)) => status.success(),
            Ok(Err(e)) => {
                warn!(error = %e, "Renderer not available");
                false
            }
            Err(_) => {
                warn!("Renderer version check timeout");
                false
            }
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    /// Stand-in browser: writes a minimal PDF to the --print-to-pdf path
    const FAKE_BROWSER: &str = r#"
for arg in "$@"; do
  case "$arg" in
    --print-to-pdf=*) out="${arg#--print-to-pdf=}" ;;
  esac
done
printf '%%PDF-1.4 fake' > "$out"
"#;

    fn script(body: &str) -> (tempfile::TempDir, String) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("browser.sh");
        std::fs::write(&path, body).unwrap();
        (dir, path.display().to_string())
    }

    #[tokio::test]
    async fn test_render_reads_output_file() {
        let (_dir, path) = script(FAKE_BROWSER);
        let renderer = ChromiumRenderer::new("sh").with_launcher_args(vec![path]);
        let pdf = renderer.render("<h1>Quote</h1>").await.unwrap();
        assert!(pdf.starts_with(b"%PDF-1.4"));
    }

    #[tokio::test]
    async fn test_render_failure_exit_code() {
        let (_dir, path) = script("echo 'cannot open display' >&2\nexit 3\n");
        let renderer = ChromiumRenderer::new("sh").with_launcher_args(vec![path]);
        let err = renderer.render("<p></p>").await.unwrap_err();
        match err {
            PdfError::RenderFailed(msg) => assert!(msg.contains("cannot open display")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_render_without_output() {
        let (_dir, path) = script("exit 0\n");
        let renderer = ChromiumRenderer::new("sh").with_launcher_args(vec![path]);
        assert!(matches!(
            renderer.render("<p></p>").await,
            Err(PdfError::RenderFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_render_timeout() {
        let (_dir, path) = script("sleep 5\n");
        let renderer = ChromiumRenderer::new("sh")
            .with_launcher_args(vec![path])
            .with_timeout(Duration::from_millis(100));
        assert!(matches!(
            renderer.render("<p></p>").await,
            Err(PdfError::Timeout(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_program() {
        let renderer = ChromiumRenderer::new("/nonexistent/chromium-browser");
        assert!(matches!(
            renderer.render("<p></p>").await,
            Err(PdfError::Launch(_))
        ));
        assert!(!renderer.is_available().await);
    }
}
