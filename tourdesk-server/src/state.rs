//! Application state

use std::sync::Arc;
use std::time::Duration;

use aws_sdk_sesv2::Client as SesClient;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tour_pdf::{ChromiumRenderer, PdfConfig, PdfService};

use crate::BoxError;
use crate::auth::rate_limit::RateLimiter;
use crate::config::{CompanyProfile, Config};
use crate::whatsapp::WhatsAppClient;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL connection pool
    pub pool: PgPool,
    /// Quotation PDF renderer (cache + limiter in front of Chromium)
    pub pdf: Arc<PdfService<ChromiumRenderer>>,
    /// WhatsApp Cloud API client; `None` when the integration is not configured
    pub whatsapp: Option<WhatsAppClient>,
    /// Webhook signing secret
    pub whatsapp_app_secret: String,
    /// Webhook subscription verify token
    pub whatsapp_verify_token: String,
    /// Pause between campaign sends
    pub whatsapp_send_delay: Duration,
    /// SES client; `None` unless staff notifications are enabled
    pub ses: Option<SesClient>,
    /// SES sender email address
    pub ses_from_email: String,
    /// Per-IP limiter for public routes and webhooks
    pub rate_limiter: RateLimiter,
    pub company: Arc<CompanyProfile>,
    pub public_base_url: String,
}

impl AppState {
    /// Connect, migrate and build the state
    pub async fn new(config: &Config) -> Result<Self, BoxError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(&config.database_url)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        let ses = if config.notify_email_enabled {
            let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
            let ses = if let Ok(ses_region) = std::env::var("SES_REGION") {
                let ses_config = aws_config
                    .to_builder()
                    .region(aws_config::Region::new(ses_region))
                    .build();
                SesClient::new(&ses_config)
            } else {
                SesClient::new(&aws_config)
            };
            Some(ses)
        } else {
            tracing::info!("Staff email notifications disabled");
            None
        };

        Ok(Self::build(config, pool, ses))
    }

    /// Assemble the state around an existing pool (tests use a lazy pool)
    pub fn build(config: &Config, pool: PgPool, ses: Option<SesClient>) -> Self {
        let renderer = ChromiumRenderer::new(&config.chrome_path);
        let pdf = PdfService::new(
            renderer,
            PdfConfig {
                cache_ttl: config.pdf_cache_ttl,
                cache_max_entries: config.pdf_cache_max_entries,
                max_concurrent: config.pdf_max_concurrent,
                per_client_per_minute: config.pdf_rate_limit_per_minute,
            },
        );

        let wa = &config.whatsapp;
        let whatsapp = match wa.phone_number_id {
            Some(ref phone_number_id) => Some(WhatsAppClient::new(
                &wa.api_base,
                &wa.api_version,
                phone_number_id,
                &wa.access_token,
            )),
            None => {
                tracing::warn!("WHATSAPP_PHONE_NUMBER_ID not set, WhatsApp sending disabled");
                None
            }
        };

        Self {
            pool,
            pdf: Arc::new(pdf),
            whatsapp,
            whatsapp_app_secret: wa.app_secret.clone(),
            whatsapp_verify_token: wa.verify_token.clone(),
            whatsapp_send_delay: wa.send_delay,
            ses,
            ses_from_email: config.ses_from_email.clone(),
            rate_limiter: RateLimiter::new(),
            company: Arc::new(config.company.clone()),
            public_base_url: config.public_base_url.clone(),
        }
    }
}
