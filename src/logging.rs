use anyhow::{anyhow, bail, Result};
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Logging options loaded alongside the rest of the configuration.
#[derive(Debug, Clone)]
pub struct LogOptions {
    /// Identifier of this application instance, attached to the root span
    pub app_id: Option<String>,
    /// Emit JSON lines instead of human-readable text
    pub json_format: bool,
    /// One of trace, debug, info, warn, error or fatal
    pub output_level: String,
}

impl Default for LogOptions {
    fn default() -> Self {
        Self {
            app_id: None,
            json_format: false,
            output_level: "info".to_string(),
        }
    }
}

/// Parse a configured output level.
///
/// `fatal` is accepted and maps to `error`, the most severe level tracing has.
pub fn parse_level(level: &str) -> Result<Level> {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" | "warning" => Ok(Level::WARN),
        "error" | "fatal" => Ok(Level::ERROR),
        other => bail!("undefined log output level: {}", other),
    }
}

/// Install the global subscriber.
pub fn init(options: &LogOptions) -> Result<()> {
    let level = parse_level(&options.output_level)?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_ascii_lowercase()));

    let registry = tracing_subscriber::registry().with(filter);
    let installed = if options.json_format {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(true))
            .try_init()
    } else {
        registry.with(tracing_subscriber::fmt::layer()).try_init()
    };

    installed.map_err(|e| anyhow!("failed to install log subscriber: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level_known_values() {
        assert_eq!(parse_level("trace").unwrap(), Level::TRACE);
        assert_eq!(parse_level("debug").unwrap(), Level::DEBUG);
        assert_eq!(parse_level("INFO").unwrap(), Level::INFO);
        assert_eq!(parse_level(" warn ").unwrap(), Level::WARN);
        assert_eq!(parse_level("error").unwrap(), Level::ERROR);
    }

    #[test]
    fn test_parse_level_fatal_maps_to_error() {
        assert_eq!(parse_level("fatal").unwrap(), Level::ERROR);
    }

    #[test]
    fn test_parse_level_rejects_unknown() {
        let err = parse_level("verbose").unwrap_err();
        assert!(err.to_string().contains("verbose"));
    }

    #[test]
    fn test_default_options() {
        let options = LogOptions::default();
        assert_eq!(options.output_level, "info");
        assert!(!options.json_format);
        assert!(options.app_id.is_none());
    }
}
