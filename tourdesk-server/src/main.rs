use std::time::Duration;

use tourdesk_server::{AppState, BoxError, Config, api, init_tracing};

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    // Load .env file
    let _ = dotenvy::dotenv();

    init_tracing();

    let config = Config::from_env()?;

    tracing::info!("Starting tourdesk-server (env: {})", config.environment);

    let state = AppState::new(&config).await?;

    if !state.pdf.is_available().await {
        tracing::warn!(
            chrome = %config.chrome_path,
            "PDF renderer not available; quotation PDFs will fail until CHROME_PATH is fixed"
        );
    }

    let app = api::create_router(state.clone());

    // Periodic cleanup (every 5 minutes): rate limiter windows, PDF cache
    let rate_limiter = state.rate_limiter.clone();
    let pdf = state.pdf.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(300));
        loop {
            interval.tick().await;
            rate_limiter.cleanup().await;
            let purged = pdf.cleanup().await;
            if purged > 0 {
                tracing::debug!(purged, "Expired PDF cache entries removed");
            }
        }
    });

    let http_addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&http_addr).await?;
    tracing::info!("tourdesk-server HTTP listening on {http_addr}");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await?;

    Ok(())
}
