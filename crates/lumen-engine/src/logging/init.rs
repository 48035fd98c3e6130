use std::sync::Once;

/// Filter used when neither the config nor `RUST_LOG` provides one.
///
/// wgpu and naga are chatty at info level; keep them to warnings.
pub const DEFAULT_FILTER: &str = "info,wgpu_core=warn,wgpu_hal=warn,naga=warn";

/// Logger configuration.
///
/// `env_filter` uses `env_logger` filter syntax, e.g. `"lumen_engine=debug,wgpu=warn"`.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub env_filter: Option<String>,
    pub write_style: env_logger::WriteStyle,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            env_filter: None,
            write_style: env_logger::WriteStyle::Auto,
        }
    }
}

impl LoggingConfig {
    pub fn with_filter(filter: impl Into<String>) -> Self {
        Self {
            env_filter: Some(filter.into()),
            ..Self::default()
        }
    }
}

/// Picks the filter: config first, then `RUST_LOG`, then `DEFAULT_FILTER`.
fn effective_filter(config: &LoggingConfig, rust_log: Option<String>) -> String {
    config
        .env_filter
        .clone()
        .filter(|f| !f.trim().is_empty())
        .or(rust_log)
        .unwrap_or_else(|| DEFAULT_FILTER.to_string())
}

static INIT: Once = Once::new();

/// Initializes the global logger. Later calls are ignored.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let filter = effective_filter(&config, std::env::var("RUST_LOG").ok());

        let mut builder = env_logger::Builder::new();
        builder.parse_filters(&filter);
        builder.write_style(config.write_style);
        builder.format_timestamp_millis();

        if builder.try_init().is_err() {
            // Someone else (a test harness) installed a logger first.
            return;
        }
        log::debug!("logging initialized with filter `{filter}`");
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_filter_wins() {
        let cfg = LoggingConfig::with_filter("debug");
        assert_eq!(effective_filter(&cfg, Some("warn".into())), "debug");
    }

    #[test]
    fn rust_log_used_when_config_is_silent() {
        let cfg = LoggingConfig::default();
        assert_eq!(effective_filter(&cfg, Some("warn".into())), "warn");
        assert_eq!(effective_filter(&LoggingConfig::with_filter("  "), Some("warn".into())), "warn");
    }

    #[test]
    fn default_filter_quiets_gpu_crates() {
        let f = effective_filter(&LoggingConfig::default(), None);
        assert_eq!(f, DEFAULT_FILTER);
        assert!(f.contains("wgpu_core=warn"));
    }

    #[test]
    fn init_is_idempotent() {
        init_logging(LoggingConfig::default());
        init_logging(LoggingConfig::with_filter("trace"));
    }
}
