//! Environment variable overrides.
//!
//! The deployment's process environment is the last config layer before CLI
//! flags. Recognised variables:
//!
//! | Variable              | Field                      |
//! |-----------------------|----------------------------|
//! | `YOTO_CLIENT_ID`      | `yoto.client_id`           |
//! | `YOTO_CLIENT_SECRET`  | `yoto.client_secret`       |
//! | `YOTO_REFRESH_TOKEN`  | `yoto.refresh_token`       |
//! | `YOTO_API_BASE_URL`   | `yoto.api_base_url`        |
//! | `USE_ENV_CREDENTIALS` | `yoto.use_env_credentials` |

use crate::error::{ConfigError, Result};
use crate::types::ProxyConfig;

pub const ENV_CLIENT_ID: &str = "YOTO_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "YOTO_CLIENT_SECRET";
pub const ENV_REFRESH_TOKEN: &str = "YOTO_REFRESH_TOKEN";
pub const ENV_API_BASE_URL: &str = "YOTO_API_BASE_URL";
pub const ENV_USE_ENV_CREDENTIALS: &str = "USE_ENV_CREDENTIALS";

/// Apply overrides from the process environment.
///
/// Returns the names of the variables that were applied.
pub fn apply_env_overrides(config: &mut ProxyConfig) -> Result<Vec<&'static str>> {
    apply_overrides_from(config, |name| std::env::var(name).ok())
}

/// Apply overrides using an arbitrary lookup. Empty values are ignored.
pub fn apply_overrides_from<F>(config: &mut ProxyConfig, lookup: F) -> Result<Vec<&'static str>>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |name: &str| lookup(name).filter(|v| !v.is_empty());
    let mut applied = Vec::new();

    let strings = [
        (ENV_CLIENT_ID, &mut config.yoto.client_id),
        (ENV_CLIENT_SECRET, &mut config.yoto.client_secret),
        (ENV_REFRESH_TOKEN, &mut config.yoto.refresh_token),
        (ENV_API_BASE_URL, &mut config.yoto.api_base_url),
    ];
    for (var, field) in strings {
        if let Some(value) = get(var) {
            *field = Some(value);
            applied.push(var);
        }
    }

    if let Some(value) = get(ENV_USE_ENV_CREDENTIALS) {
        let flag = parse_bool(&value).ok_or_else(|| ConfigError::InvalidEnv {
            var: ENV_USE_ENV_CREDENTIALS.to_string(),
            value: value.clone(),
        })?;
        config.yoto.use_env_credentials = Some(flag);
        applied.push(ENV_USE_ENV_CREDENTIALS);
    }

    if !applied.is_empty() {
        tracing::debug!(vars = ?applied, "Applied environment overrides");
    }
    Ok(applied)
}

/// Parse the usual spellings of a boolean flag.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
