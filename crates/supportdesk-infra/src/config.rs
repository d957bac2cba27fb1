//! Configuration loader for Supportdesk.
//!
//! Reads an optional TOML file named by `SUPPORTDESK_CONFIG` into
//! [`AppConfig`], then applies environment variable overrides on top. The
//! variable lookup is injected so tests never touch the process environment.
//!
//! Unlike missing optional settings, a missing signing secret or an
//! unparseable value is a hard error: the server refuses to start.

use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

use supportdesk_types::config::{AppConfig, Environment, LogFormat, RateLimitRule};

/// Secrets shorter than this are accepted with a warning.
const MIN_RECOMMENDED_SECRET_BYTES: usize = 32;

/// Longest accepted token lifetime: one year.
pub const MAX_TOKEN_TTL_SECS: u64 = 365 * 24 * 60 * 60;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid value for {var}: {message}")]
    Invalid { var: &'static str, message: String },

    #[error("JWT_SECRET must be set to a non-empty value")]
    MissingSecret,
}

/// Load configuration from the real process environment.
pub async fn load_from_env() -> Result<AppConfig, ConfigError> {
    load_config(|name| std::env::var(name).ok()).await
}

/// Load configuration using `env` to look up variables.
pub async fn load_config<F>(env: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match env("SUPPORTDESK_CONFIG").filter(|p| !p.trim().is_empty()) {
        Some(path) => read_config_file(PathBuf::from(path)).await?,
        None => AppConfig::default(),
    };

    apply_env_overrides(&mut config, &env)?;

    if config.auth.secret.trim().is_empty() {
        return Err(ConfigError::MissingSecret);
    }
    if !(1..=MAX_TOKEN_TTL_SECS).contains(&config.auth.token_ttl_secs) {
        return Err(ConfigError::Invalid {
            var: "JWT_EXPIRE",
            message: format!(
                "token lifetime of {}s must be between 1s and {MAX_TOKEN_TTL_SECS}s",
                config.auth.token_ttl_secs
            ),
        });
    }

    Ok(config)
}

/// Warn about settings that load fine but are weak. Call once tracing is
/// installed.
pub fn warn_on_weak_settings(config: &AppConfig) {
    if config.auth.secret.len() < MIN_RECOMMENDED_SECRET_BYTES {
        tracing::warn!(
            "JWT_SECRET is shorter than {MIN_RECOMMENDED_SECRET_BYTES} bytes; use a longer random value"
        );
    }
    if config.environment.is_production() && config.cors.allowed_origins.is_empty() {
        tracing::warn!("ALLOWED_ORIGINS is empty; browsers will be refused by CORS");
    }
}

async fn read_config_file(path: PathBuf) -> Result<AppConfig, ConfigError> {
    let content = match tokio::fs::read_to_string(&path).await {
        Ok(content) => content,
        Err(source) => return Err(ConfigError::Read { path, source }),
    };
    tracing::debug!("Loaded config file {}", path.display());
    toml::from_str(&content).map_err(|source| ConfigError::Parse { path, source })
}

fn apply_env_overrides<F>(config: &mut AppConfig, env: &F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let var = |name: &str| env(name).filter(|v| !v.trim().is_empty());

    if let Some(value) = var("APP_ENV").or_else(|| var("NODE_ENV")) {
        config.environment = value
            .parse::<Environment>()
            .map_err(|message| ConfigError::Invalid { var: "APP_ENV", message })?;
    }

    if let Some(host) = var("HOST") {
        config.server.host = host;
    }
    set_parsed(&var, "PORT", &mut config.server.port)?;

    if let Some(url) = var("DATABASE_URL") {
        config.database.url = url;
    }

    if let Some(secret) = env("JWT_SECRET") {
        config.auth.secret = secret;
    }
    if let Some(expire) = var("JWT_EXPIRE") {
        config.auth.token_ttl_secs = parse_duration_secs(&expire).map_err(|message| {
            ConfigError::Invalid {
                var: "JWT_EXPIRE",
                message,
            }
        })?;
    }
    if let Some(issuer) = var("JWT_ISSUER") {
        config.auth.issuer = issuer;
    }

    let completion = &mut config.completion;
    if let Some(url) = var("AI_API_URL") {
        completion.api_url = url;
    }
    if let Some(key) = var("OPENROUTER_API_KEY") {
        completion.api_key = Some(key);
    }
    if let Some(model) = var("AI_MODEL") {
        completion.model = model;
    }
    set_parsed(&var, "AI_MAX_TOKENS", &mut completion.max_tokens)?;
    set_parsed(&var, "AI_TEMPERATURE", &mut completion.temperature)?;
    set_parsed(&var, "AI_TIMEOUT_SECS", &mut completion.timeout_secs)?;
    set_parsed(&var, "AI_CONTEXT_TURNS", &mut completion.context_turns)?;
    set_parsed(&var, "AI_MAX_ATTEMPTS", &mut completion.max_attempts)?;
    if let Some(app_url) = var("APP_URL") {
        completion.app_url = app_url;
    }

    set_parsed(&var, "MAX_MESSAGE_CHARS", &mut config.chat.max_message_chars)?;

    if let Some(origins) = var("ALLOWED_ORIGINS") {
        config.cors.allowed_origins = origins
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(str::to_string)
            .collect();
    }

    let limits = &mut config.rate_limit;
    let environment = config.environment;
    limits.general = rule_override(
        &var,
        ("RATE_LIMIT_GENERAL_MAX", "RATE_LIMIT_GENERAL_WINDOW_SECS"),
        limits.general_for(environment),
        limits.general,
    )?;
    limits.auth = rule_override(
        &var,
        ("RATE_LIMIT_AUTH_MAX", "RATE_LIMIT_AUTH_WINDOW_SECS"),
        limits.auth_for(environment),
        limits.auth,
    )?;
    limits.chat = rule_override(
        &var,
        ("RATE_LIMIT_CHAT_MAX", "RATE_LIMIT_CHAT_WINDOW_SECS"),
        limits.chat_for(environment),
        limits.chat,
    )?;
    if let Some(skip) = var("SKIP_RATE_LIMIT") {
        limits.skip = skip.trim().eq_ignore_ascii_case("true");
    }
    if let Some(trust) = var("TRUST_PROXY") {
        limits.trust_proxy = parse_bool(&trust).ok_or_else(|| ConfigError::Invalid {
            var: "TRUST_PROXY",
            message: format!("expected true or false, got '{trust}'"),
        })?;
    }

    if let Some(format) = var("LOG_FORMAT") {
        config.logging.format = format
            .parse::<LogFormat>()
            .map_err(|message| ConfigError::Invalid { var: "LOG_FORMAT", message })?;
    }
    if let Some(otel) = var("OTEL_STDOUT") {
        config.logging.otel_stdout = parse_bool(&otel)
            .ok_or_else(|| ConfigError::Invalid {
                var: "OTEL_STDOUT",
                message: format!("expected true or false, got '{otel}'"),
            })?;
    }

    Ok(())
}

fn set_parsed<T, V>(var: &V, name: &'static str, target: &mut T) -> Result<(), ConfigError>
where
    T: FromStr,
    T::Err: Display,
    V: Fn(&str) -> Option<String>,
{
    if let Some(raw) = var(name) {
        *target = raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            var: name,
            message: format!("'{raw}': {e}"),
        })?;
    }
    Ok(())
}

/// Overriding either half of a rule pins the whole rule, starting from the
/// environment default for the other half.
fn rule_override<V>(
    var: &V,
    (max_var, window_var): (&'static str, &'static str),
    default: RateLimitRule,
    current: Option<RateLimitRule>,
) -> Result<Option<RateLimitRule>, ConfigError>
where
    V: Fn(&str) -> Option<String>,
{
    if var(max_var).is_none() && var(window_var).is_none() {
        return Ok(current);
    }
    let mut rule = current.unwrap_or(default);
    set_parsed(var, max_var, &mut rule.max)?;
    set_parsed(var, window_var, &mut rule.window_secs)?;
    Ok(Some(rule))
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

/// Parse a TTL like `24h`, `30m`, `3600s`, `7d`, or bare seconds.
pub fn parse_duration_secs(raw: &str) -> Result<u64, String> {
    let raw = raw.trim();
    let (digits, unit) = match raw.char_indices().find(|(_, c)| !c.is_ascii_digit()) {
        Some((idx, _)) => raw.split_at(idx),
        None => (raw, "s"),
    };
    let value: u64 = digits
        .parse()
        .map_err(|_| format!("'{raw}' is not a duration like 24h, 30m, 3600s or 7d"))?;
    let multiplier = match unit {
        "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        "d" => 24 * 60 * 60,
        other => return Err(format!("unknown duration unit '{other}' in '{raw}'")),
    };
    if value == 0 {
        return Err(format!("'{raw}' must be greater than zero"));
    }
    value
        .checked_mul(multiplier)
        .ok_or_else(|| format!("'{raw}' is too large"))
}
