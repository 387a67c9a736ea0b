/// Environment variable names used by this crate for convenient
/// configuration of the formatter from microservices.
///
/// These are purely helpers; the formatter itself never reads the
/// environment. See [`FormatConfig::from_env`](crate::formatter::FormatConfig::from_env).

/// Set to `yes` to emit the Datadog schema. Any other value selects the
/// generic schema.
pub const DATADOG_LOG_FORMAT_ENABLED_ENV: &str = "DATADOG_LOG_FORMAT_ENABLED";

/// Optional override of the time key (`date` / `timestamp` by default).
pub const LOG_FORMAT_TIME_KEY_ENV: &str = "LOG_FORMAT_TIME_KEY";

/// Optional host name emitted as `host`.
pub const LOG_FORMAT_HOST_ENV: &str = "LOG_FORMAT_HOST";

/// Optional application identity emitted as `source`.
pub const LOG_FORMAT_SOURCE_ENV: &str = "LOG_FORMAT_SOURCE";

/// Read an environment variable or fall back to a provided default.
pub fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Non-empty value of `key`, if set.
pub fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// `true` only when `key` is exactly `yes`.
pub fn env_flag(key: &str) -> bool {
    env_or(key, "no") == "yes"
}
