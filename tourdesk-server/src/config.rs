//! Server configuration

use std::time::Duration;

use crate::BoxError;

/// Letterhead printed on quotations; the state code drives the GST split
#[derive(Debug, Clone)]
pub struct CompanyProfile {
    pub name: String,
    /// Two-digit GST state code
    pub state_code: String,
    pub gstin: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

/// WhatsApp Cloud API settings
#[derive(Debug, Clone)]
pub struct WhatsAppConfig {
    /// Graph API base URL
    pub api_base: String,
    pub api_version: String,
    /// Sending phone number ID; the integration is disabled when unset
    pub phone_number_id: Option<String>,
    pub access_token: String,
    /// Webhook signing secret (X-Hub-Signature-256)
    pub app_secret: String,
    /// Webhook subscription verify token
    pub verify_token: String,
    /// Pause between campaign sends
    pub send_delay: Duration,
}

#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection URL
    pub database_url: String,
    pub http_port: u16,
    /// Environment: development | staging | production
    pub environment: String,
    /// Public website base URL (links in messages and PDFs)
    pub public_base_url: String,
    /// Headless Chromium binary
    pub chrome_path: String,
    pub pdf_cache_ttl: Duration,
    pub pdf_cache_max_entries: usize,
    pub pdf_max_concurrent: usize,
    pub pdf_rate_limit_per_minute: u32,
    pub whatsapp: WhatsAppConfig,
    /// SES sender email address
    pub ses_from_email: String,
    /// Send staff notification emails
    pub notify_email_enabled: bool,
    pub company: CompanyProfile,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, BoxError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, BoxError> {
        let environment = get("ENVIRONMENT").unwrap_or_else(|| "development".into());
        let or = |name: &str, default: &str| get(name).unwrap_or_else(|| default.to_string());
        let optional = |name: &str| get(name).filter(|s| !s.trim().is_empty());

        let phone_number_id = optional("WHATSAPP_PHONE_NUMBER_ID");
        // Secrets only matter once the integration is switched on
        let (access_token, app_secret, verify_token) = if phone_number_id.is_some() {
            (
                require_secret(&get, "WHATSAPP_ACCESS_TOKEN", &environment)?,
                require_secret(&get, "WHATSAPP_APP_SECRET", &environment)?,
                require_secret(&get, "WHATSAPP_VERIFY_TOKEN", &environment)?,
            )
        } else {
            (
                get("WHATSAPP_ACCESS_TOKEN").unwrap_or_default(),
                require_secret(&get, "WHATSAPP_APP_SECRET", "development")?,
                require_secret(&get, "WHATSAPP_VERIFY_TOKEN", "development")?,
            )
        };

        Ok(Self {
            database_url: get("DATABASE_URL").ok_or("DATABASE_URL must be set")?,
            http_port: parse_or(&get, "HTTP_PORT", 8080),
            environment: environment.clone(),
            public_base_url: or("PUBLIC_BASE_URL", "http://localhost:8080"),
            chrome_path: or("CHROME_PATH", "chromium"),
            pdf_cache_ttl: Duration::from_secs(parse_or(&get, "PDF_CACHE_TTL_SECS", 3600)),
            pdf_cache_max_entries: parse_or(&get, "PDF_CACHE_MAX_ENTRIES", 64),
            pdf_max_concurrent: parse_or(&get, "PDF_MAX_CONCURRENT", 2),
            pdf_rate_limit_per_minute: parse_or(&get, "PDF_RATE_LIMIT_PER_MINUTE", 10),
            whatsapp: WhatsAppConfig {
                api_base: or("WHATSAPP_API_BASE", "https://graph.facebook.com"),
                api_version: or("WHATSAPP_API_VERSION", "v21.0"),
                phone_number_id,
                access_token,
                app_secret,
                verify_token,
                send_delay: Duration::from_millis(parse_or(&get, "WHATSAPP_SEND_DELAY_MS", 1000)),
            },
            ses_from_email: or("SES_FROM_EMAIL", "noreply@tourdesk.in"),
            notify_email_enabled: get("NOTIFY_EMAIL_ENABLED")
                .is_some_and(|v| matches!(v.trim(), "1" | "true" | "TRUE" | "yes")),
            company: CompanyProfile {
                name: or("COMPANY_NAME", "TourDesk Holidays"),
                state_code: or("COMPANY_STATE_CODE", "32"),
                gstin: optional("COMPANY_GSTIN"),
                address: optional("COMPANY_ADDRESS"),
                phone: optional("COMPANY_PHONE"),
                email: optional("COMPANY_EMAIL"),
            },
        })
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

fn parse_or<T: std::str::FromStr>(get: &impl Fn(&str) -> Option<String>, name: &str, default: T) -> T {
    get(name).and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

/// Require a secret: must be set and non-empty outside development.
fn require_secret(
    get: &impl Fn(&str) -> Option<String>,
    name: &str,
    environment: &str,
) -> Result<String, BoxError> {
    let val = match get(name) {
        Some(v) => v,
        None => {
            if environment != "development" {
                return Err(format!("{name} must be set in {environment} environment").into());
            }
            format!("dev-{name}-not-for-production")
        }
    };
    if val.is_empty() && environment != "development" {
        return Err(format!("{name} must not be empty in {environment} environment").into());
    }
    Ok(val)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[("DATABASE_URL", "postgres://localhost/td")])).unwrap();
        assert_eq!(config.http_port, 8080);
        assert!(config.is_development());
        assert_eq!(config.chrome_path, "chromium");
        assert_eq!(config.pdf_cache_ttl, Duration::from_secs(3600));
        assert_eq!(config.pdf_cache_max_entries, 64);
        assert_eq!(config.pdf_max_concurrent, 2);
        assert_eq!(config.pdf_rate_limit_per_minute, 10);
        assert_eq!(config.whatsapp.api_version, "v21.0");
        assert_eq!(config.whatsapp.send_delay, Duration::from_millis(1000));
        assert!(config.whatsapp.phone_number_id.is_none());
        assert!(!config.notify_email_enabled);
        assert_eq!(config.company.state_code, "32");
    }

    #[test]
    fn test_database_url_required() {
        assert!(Config::from_lookup(lookup(&[])).is_err());
    }

    #[test]
    fn test_whatsapp_secrets_required_in_production() {
        let err = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://db/td"),
            ("ENVIRONMENT", "production"),
            ("WHATSAPP_PHONE_NUMBER_ID", "1234567890"),
            ("WHATSAPP_ACCESS_TOKEN", "token"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("WHATSAPP_APP_SECRET"));

        let config = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://db/td"),
            ("ENVIRONMENT", "production"),
            ("WHATSAPP_PHONE_NUMBER_ID", "1234567890"),
            ("WHATSAPP_ACCESS_TOKEN", "token"),
            ("WHATSAPP_APP_SECRET", "secret"),
            ("WHATSAPP_VERIFY_TOKEN", "verify"),
            ("NOTIFY_EMAIL_ENABLED", "true"),
            ("HTTP_PORT", "9000"),
        ]))
        .unwrap();
        assert_eq!(config.whatsapp.app_secret, "secret");
        assert!(config.notify_email_enabled);
        assert_eq!(config.http_port, 9000);
    }

    #[test]
    fn test_production_without_whatsapp_is_allowed() {
        let config = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://db/td"),
            ("ENVIRONMENT", "production"),
        ]))
        .unwrap();
        assert!(config.whatsapp.phone_number_id.is_none());
    }
}
