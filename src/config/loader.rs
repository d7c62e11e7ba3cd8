//! Environment-backed configuration loader: `.env` keys layered over
//! built-in defaults, validated up front so misconfiguration fails at
//! startup with exit code 2 instead of mid-stage.

use std::collections::HashMap;

use crate::campaign::stage::default_stages;
use crate::campaign::window::parse_tz_offset;
use crate::config::{
    CampaignConfig, DatabaseConfig, MailerConfig, OrchestratorConfig, ReminderConfig,
};
use crate::error::{ReminderError, Result};
use crate::resilience::SingletonGuard;

/// Load configuration from the process environment (after `.env`).
pub fn load() -> Result<ReminderConfig> {
    dotenvy::dotenv().ok();
    load_from(&|key| std::env::var(key).ok())
}

/// Load configuration from an arbitrary key/value source (tests).
pub fn load_from(get: &dyn Fn(&str) -> Option<String>) -> Result<ReminderConfig> {
    let database = DatabaseConfig {
        url: require(get, "DATABASE_URL")?,
        table_prefix: get("TABLE_PREFIX").unwrap_or_else(|| "wp_".to_string()),
        max_connections: parse_or(get, "DB_MAX_CONNECTIONS", 5)?,
        connect_timeout_seconds: parse_or(get, "DB_CONNECT_TIMEOUT_SECS", 10)?,
    };

    let send_enabled = flag(get, "SEND_EMAILS");
    let endpoint = get("MAIL_ENDPOINT").unwrap_or_default();
    if send_enabled && endpoint.trim().is_empty() {
        return Err(ReminderError::configuration(
            "MAIL_ENDPOINT",
            "required when SEND_EMAILS=true",
        ));
    }

    let from_email = get("FROM_EMAIL").unwrap_or_else(|| "no-reply@example.com".to_string());
    let mailer = MailerConfig {
        endpoint,
        api_token: get("MAIL_API_TOKEN").filter(|t| !t.trim().is_empty()),
        reply_to: get("REPLY_TO").unwrap_or_else(|| from_email.clone()),
        from_email,
        from_name: get("FROM_NAME").unwrap_or_else(|| "Wishlist Reminders".to_string()),
        send_enabled,
        timeout_seconds: parse_or(get, "MAIL_TIMEOUT_SECS", 25)?,
    };

    let base_url = validate_base_url(&require(get, "WISHLIST_URL")?)?;
    let local_tz_offset = get("LOCAL_TZ_OFFSET").unwrap_or_else(|| "-06:00".to_string());
    parse_tz_offset(&local_tz_offset)?;

    let tolerance_hours: i64 = parse_or(get, "WINDOW_TOLERANCE_H", 6)?;
    let campaign = CampaignConfig {
        logo_url: get("LOGO_URL")
            .unwrap_or_else(|| format!("{base_url}/wp-content/uploads/logo.png")),
        placeholder_image: get("PLACEHOLDER_IMG")
            .unwrap_or_else(|| "https://via.placeholder.com/300x300?text=Producto".to_string()),
        base_url,
        local_tz_offset,
        fixed_day_mode: flag(get, "FIXED_8AM_MODE"),
        max_batch: parse_or(get, "MAX_BATCH", 300)?,
        stages: default_stages(tolerance_hours),
    };

    let orchestrator = OrchestratorConfig {
        max_retries: parse_or(get, "ORCH_MAX_RETRIES", 2)?,
        backoff_seconds: backoff_list(get("ORCH_BACKOFF_SECS"))?,
        lock_path: get("LOCK_FILE")
            .map(Into::into)
            .unwrap_or_else(SingletonGuard::default_path),
        local_test_mode: flag(get, "LOCAL_TEST_MODE"),
        test_delay_min: match get("TEST_DELAY_MIN") {
            Some(raw) => Some(raw.trim().parse().map_err(|_| {
                ReminderError::configuration("TEST_DELAY_MIN", format!("not a number: {raw:?}"))
            })?),
            None => None,
        },
    };

    Ok(ReminderConfig {
        database,
        mailer,
        campaign,
        orchestrator,
    })
}

fn require(get: &dyn Fn(&str) -> Option<String>, key: &str) -> Result<String> {
    get(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ReminderError::configuration(key, "missing required value"))
}

fn parse_or<T: std::str::FromStr>(
    get: &dyn Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T> {
    match get(key) {
        Some(raw) => raw.trim().parse().map_err(|_| {
            ReminderError::configuration(key, format!("could not parse value {raw:?}"))
        }),
        None => Ok(default),
    }
}

fn flag(get: &dyn Fn(&str) -> Option<String>, key: &str) -> bool {
    get(key)
        .map(|v| v.trim().eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

/// The storefront base URL must be absolute (scheme + host); everything
/// downstream builds deep links onto it.
fn validate_base_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim().trim_end_matches('/').to_string();
    let parsed = reqwest::Url::parse(&trimmed)
        .map_err(|e| ReminderError::configuration("WISHLIST_URL", e.to_string()))?;

    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return Err(ReminderError::configuration(
            "WISHLIST_URL",
            format!("not an absolute http(s) URL: {raw:?}"),
        ));
    }

    Ok(trimmed)
}

fn backoff_list(raw: Option<String>) -> Result<Vec<u64>> {
    let Some(raw) = raw else {
        return Ok(vec![10, 30]);
    };

    raw.split(',')
        .map(|part| {
            part.trim().parse().map_err(|_| {
                ReminderError::configuration(
                    "ORCH_BACKOFF_SECS",
                    format!("could not parse entry {part:?}"),
                )
            })
        })
        .collect()
}

/// Convenience for tests: a loader source over a map.
pub fn map_source(values: HashMap<&'static str, &'static str>) -> impl Fn(&str) -> Option<String> {
    move |key: &str| values.get(key).map(|v| (*v).to_string())
}
