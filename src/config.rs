//! Relay configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`).

use std::net::SocketAddr;
use std::time::Duration;

use crate::domain::broker::DEFAULT_QUEUE_CAPACITY;

/// Output format of the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable text lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Text
        }
    }
}

/// Behaviour of each `/sse` connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamSettings {
    /// Interval between keep-alive comment frames.
    pub keep_alive: Duration,
    /// Close the stream after this long without a broker event.
    /// `None` keeps it open until the client goes away.
    pub idle_timeout: Option<Duration>,
    /// Send an `event: hello` frame when the stream opens.
    pub hello: bool,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            keep_alive: Duration::from_secs(15),
            idle_timeout: None,
            hello: true,
        }
    }
}

/// Top-level relay configuration.
///
/// Loaded once at startup via [`RelayConfig::from_env`].
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Socket address to bind the HTTP server to (e.g. `0.0.0.0:5000`).
    pub listen_addr: SocketAddr,

    /// Capacity of each subscription queue.
    pub subscriber_queue_capacity: usize,

    /// Per-connection stream behaviour.
    pub stream: StreamSettings,

    /// Timeout applied to REST requests (never to streams).
    pub request_timeout: Duration,

    /// Log output format.
    pub log_format: LogFormat,
}

impl RelayConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to defaults when a variable is not set or does not parse.
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns an error if `LISTEN_ADDR` is set but cannot be parsed as
    /// a [`SocketAddr`].
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    fn from_lookup<F>(lookup: F) -> Result<Self, Box<dyn std::error::Error>>
    where
        F: Fn(&str) -> Option<String>,
    {
        let listen_addr: SocketAddr = lookup("LISTEN_ADDR")
            .unwrap_or_else(|| "0.0.0.0:5000".to_string())
            .parse()?;

        let subscriber_queue_capacity = parse_or(
            lookup("SUBSCRIBER_QUEUE_CAPACITY"),
            DEFAULT_QUEUE_CAPACITY,
        )
        .max(1);

        let keep_alive_secs: u64 = parse_or(lookup("STREAM_KEEP_ALIVE_SECS"), 15);
        let idle_timeout_secs: u64 = parse_or(lookup("STREAM_IDLE_TIMEOUT_SECS"), 0);
        let stream = StreamSettings {
            keep_alive: Duration::from_secs(keep_alive_secs.max(1)),
            idle_timeout: (idle_timeout_secs > 0).then(|| Duration::from_secs(idle_timeout_secs)),
            hello: parse_bool_or(lookup("STREAM_HELLO_ENABLED"), true),
        };

        // A zero timeout would fail every REST request.
        let request_timeout_secs: u64 = parse_or(lookup("REQUEST_TIMEOUT_SECS"), 30);
        let request_timeout = Duration::from_secs(request_timeout_secs.max(1));

        let log_format = lookup("LOG_FORMAT")
            .map(|v| LogFormat::parse(&v))
            .unwrap_or_default();

        Ok(Self {
            listen_addr,
            subscriber_queue_capacity,
            stream,
            request_timeout,
            log_format,
        })
    }
}

/// Parses a variable's value as `T`, returning `default` when it is missing
/// or invalid.
fn parse_or<T: std::str::FromStr>(value: Option<String>, default: T) -> T {
    value.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

/// Parses a boolean. Accepts `"true"`, `"1"`, `"false"`, `"0"`
/// (case-insensitive). Returns `default` otherwise.
fn parse_bool_or(value: Option<String>, default: bool) -> bool {
    match value.as_deref().map(str::trim) {
        Some(v) if v.eq_ignore_ascii_case("true") || v == "1" => true,
        Some(v) if v.eq_ignore_ascii_case("false") || v == "0" => false,
        _ => default,
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<RelayConfig, Box<dyn std::error::Error>> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        RelayConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn log_format_parsing() {
        assert_eq!(LogFormat::parse("json"), LogFormat::Json);
        assert_eq!(LogFormat::parse("JSON"), LogFormat::Json);
        assert_eq!(LogFormat::parse("pretty"), LogFormat::Text);
    }

    #[test]
    fn missing_variables_use_defaults() {
        let Ok(config) = load(&[]) else {
            panic!("empty environment should load");
        };
        assert_eq!(config.listen_addr, SocketAddr::from(([0, 0, 0, 0], 5000)));
        assert_eq!(config.subscriber_queue_capacity, DEFAULT_QUEUE_CAPACITY);
        assert_eq!(config.stream, StreamSettings::default());
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.log_format, LogFormat::Text);
    }

    #[test]
    fn explicit_values_are_applied() {
        let Ok(config) = load(&[
            ("LISTEN_ADDR", "127.0.0.1:8080"),
            ("SUBSCRIBER_QUEUE_CAPACITY", "16"),
            ("STREAM_KEEP_ALIVE_SECS", "5"),
            ("STREAM_IDLE_TIMEOUT_SECS", "600"),
            ("STREAM_HELLO_ENABLED", "false"),
            ("REQUEST_TIMEOUT_SECS", "10"),
            ("LOG_FORMAT", "json"),
        ]) else {
            panic!("valid environment rejected");
        };
        assert_eq!(config.listen_addr, SocketAddr::from(([127, 0, 0, 1], 8080)));
        assert_eq!(config.subscriber_queue_capacity, 16);
        assert_eq!(config.stream.keep_alive, Duration::from_secs(5));
        assert_eq!(config.stream.idle_timeout, Some(Duration::from_secs(600)));
        assert!(!config.stream.hello);
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn invalid_numbers_fall_back_to_defaults() {
        let Ok(config) = load(&[
            ("SUBSCRIBER_QUEUE_CAPACITY", "lots"),
            ("STREAM_KEEP_ALIVE_SECS", "-3"),
            ("STREAM_IDLE_TIMEOUT_SECS", "soon"),
            ("STREAM_HELLO_ENABLED", "maybe"),
            ("REQUEST_TIMEOUT_SECS", "1.5"),
        ]) else {
            panic!("invalid numbers should not be fatal");
        };
        assert_eq!(config.subscriber_queue_capacity, DEFAULT_QUEUE_CAPACITY);
        assert_eq!(config.stream, StreamSettings::default());
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn zero_values_are_raised_to_one() {
        let Ok(config) = load(&[
            ("SUBSCRIBER_QUEUE_CAPACITY", "0"),
            ("STREAM_KEEP_ALIVE_SECS", "0"),
            ("REQUEST_TIMEOUT_SECS", "0"),
        ]) else {
            panic!("zero values should not be fatal");
        };
        assert_eq!(config.subscriber_queue_capacity, 1);
        assert_eq!(config.stream.keep_alive, Duration::from_secs(1));
        assert_eq!(config.request_timeout, Duration::from_secs(1));
    }

    #[test]
    fn unparsable_listen_addr_is_an_error() {
        assert!(load(&[("LISTEN_ADDR", "not-an-address")]).is_err());
        assert!(load(&[("LISTEN_ADDR", "127.0.0.1")]).is_err());
    }

    #[test]
    fn flag_parsing() {
        assert!(parse_bool_or(Some("TRUE".to_string()), false));
        assert!(parse_bool_or(Some("1".to_string()), false));
        assert!(!parse_bool_or(Some("0".to_string()), true));
        assert!(parse_bool_or(None, true));
    }

    #[test]
    fn default_stream_settings_never_time_out() {
        let settings = StreamSettings::default();
        assert_eq!(settings.keep_alive, Duration::from_secs(15));
        assert!(settings.idle_timeout.is_none());
        assert!(settings.hello);
    }
}
