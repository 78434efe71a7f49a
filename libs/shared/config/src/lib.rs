use std::env;

use chrono::{FixedOffset, Offset, Utc};
use tracing::warn;

const DEFAULT_CORS_ORIGINS: &str = "http://localhost:5173,http://localhost:5174,http://localhost:3000";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_service_key: String,
    pub jwt_secret: String,
    pub admin_email: String,
    pub admin_password: String,
    pub storage_bucket: String,
    /// Offset of the clinic's wall clock from UTC, in minutes.
    pub clinic_utc_offset_minutes: i32,
    pub cookie_secure: bool,
    pub cors_origins: Vec<String>,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            supabase_url: env::var("SUPABASE_URL")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_URL not set, using empty value");
                    String::new()
                }),
            supabase_service_key: env::var("SUPABASE_SERVICE_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_SERVICE_KEY not set, using empty value");
                    String::new()
                }),
            jwt_secret: env::var("JWT_SECRET")
                .unwrap_or_else(|_| {
                    warn!("JWT_SECRET not set, using empty value");
                    String::new()
                }),
            admin_email: env::var("ADMIN_EMAIL")
                .unwrap_or_else(|_| {
                    warn!("ADMIN_EMAIL not set, admin login disabled");
                    String::new()
                }),
            admin_password: env::var("ADMIN_PASSWORD")
                .unwrap_or_else(|_| {
                    warn!("ADMIN_PASSWORD not set, admin login disabled");
                    String::new()
                }),
            storage_bucket: env::var("STORAGE_BUCKET")
                .unwrap_or_else(|_| {
                    warn!("STORAGE_BUCKET not set, using default");
                    "images".to_string()
                }),
            clinic_utc_offset_minutes: parse_or_default("CLINIC_UTC_OFFSET_MINUTES", 0),
            cookie_secure: parse_or_default("COOKIE_SECURE", false),
            cors_origins: env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| DEFAULT_CORS_ORIGINS.to_string())
                .split(',')
                .map(|origin| origin.trim().to_string())
                .filter(|origin| !origin.is_empty())
                .collect(),
            port: parse_or_default("PORT", 4000),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.supabase_url.is_empty()
            && !self.supabase_service_key.is_empty()
            && !self.jwt_secret.is_empty()
    }

    pub fn is_admin_login_configured(&self) -> bool {
        !self.admin_email.is_empty() && !self.admin_password.is_empty()
    }

    /// Fixed offset used to read "now" on the clinic's wall clock.
    /// Out-of-range values fall back to UTC.
    pub fn clinic_offset(&self) -> FixedOffset {
        self.clinic_utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(|| {
                warn!(
                    "CLINIC_UTC_OFFSET_MINUTES={} is out of range, using UTC",
                    self.clinic_utc_offset_minutes
                );
                Utc.fix()
            })
    }
}

fn parse_or_default<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + std::fmt::Debug,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{} has an invalid value '{}', using default {:?}", key, raw, default);
            default
        }),
        Err(_) => default,
    }
}
