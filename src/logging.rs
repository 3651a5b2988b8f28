use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::info;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::{self, format::FmtSpan};
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Logging section of the settings file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub console_enabled: bool,
    pub file_enabled: bool,
    pub log_directory: PathBuf,
    /// Daily files kept before the oldest is removed
    pub max_files: usize,
    pub include_spans: bool,
    pub include_targets: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            console_enabled: true,
            file_enabled: true,
            log_directory: default_log_directory(),
            max_files: 7,
            include_spans: false,
            include_targets: true,
        }
    }
}

fn default_log_directory() -> PathBuf {
    directories::ProjectDirs::from("com", "sportsbook", "odds")
        .map(|dirs| dirs.data_dir().join("logs"))
        .unwrap_or_else(|| PathBuf::from("logs"))
}

/// Install the global subscriber: console and/or a daily rolling file.
/// `RUST_LOG` takes precedence over the configured level.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .with_context(|| format!("Invalid log level '{}'", config.level))?;

    let span_events = || {
        if config.include_spans {
            FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        }
    };

    let console = config.console_enabled.then(|| {
        fmt::layer()
            .with_target(config.include_targets)
            .with_span_events(span_events())
    });

    let file = if config.file_enabled {
        std::fs::create_dir_all(&config.log_directory).with_context(|| {
            format!("Cannot create log directory {}", config.log_directory.display())
        })?;

        let appender = RollingFileAppender::builder()
            .rotation(Rotation::DAILY)
            .filename_prefix("sportsbook-odds")
            .filename_suffix("log")
            .max_log_files(config.max_files)
            .build(&config.log_directory)
            .context("Cannot open log file")?;

        Some(
            fmt::layer()
                .with_ansi(false)
                .with_target(config.include_targets)
                .with_span_events(span_events())
                .with_writer(appender),
        )
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file)
        .try_init()
        .context("Logging already initialized")?;

    info!(level = %config.level, "Logging initialized");
    if config.file_enabled {
        info!("Writing logs to {}", config.log_directory.display());
    }

    Ok(())
}

/// Fields attached to a structured log line
#[derive(Debug, Clone, Serialize)]
pub struct LogContext {
    pub component: String,
    pub operation: String,
    pub session_id: Option<String>,
    pub league: Option<String>,
    pub event_id: Option<String>,
    pub url: Option<String>,
    pub duration_ms: Option<u64>,
    pub status: Option<String>,
    pub error_category: Option<String>,
    pub additional_fields: HashMap<String, serde_json::Value>,
}

impl LogContext {
    pub fn new(component: impl Into<String>, operation: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            operation: operation.into(),
            session_id: None,
            league: None,
            event_id: None,
            url: None,
            duration_ms: None,
            status: None,
            error_category: None,
            additional_fields: HashMap::new(),
        }
    }

    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_league(mut self, league: impl Into<String>) -> Self {
        self.league = Some(league.into());
        self
    }

    pub fn with_event_id(mut self, event_id: impl Into<String>) -> Self {
        self.event_id = Some(event_id.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration_ms = Some(duration.as_millis() as u64);
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn with_error_category(mut self, category: impl Into<String>) -> Self {
        self.error_category = Some(category.into());
        self
    }

    pub fn with_string_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.additional_fields
            .insert(key.into(), serde_json::Value::String(value.into()));
        self
    }

    pub fn with_number_field(mut self, key: impl Into<String>, value: i64) -> Self {
        self.additional_fields.insert(key.into(), serde_json::Value::from(value));
        self
    }
}

#[doc(hidden)]
#[macro_export]
macro_rules! __log_with_context {
    ($level:expr, $context:expr, $($arg:tt)+) => {
        tracing::event!(
            $level,
            component = %$context.component,
            operation = %$context.operation,
            session_id = ?$context.session_id,
            league = ?$context.league,
            event_id = ?$context.event_id,
            url = ?$context.url,
            duration_ms = ?$context.duration_ms,
            status = ?$context.status,
            error_category = ?$context.error_category,
            fields = ?$context.additional_fields,
            $($arg)+
        )
    };
}

/// `log_info!(context, [fields,] "message", args..)`
#[macro_export]
macro_rules! log_info {
    ($context:expr, $($arg:tt)+) => {
        $crate::__log_with_context!(tracing::Level::INFO, $context, $($arg)+)
    };
}

#[macro_export]
macro_rules! log_warn {
    ($context:expr, $($arg:tt)+) => {
        $crate::__log_with_context!(tracing::Level::WARN, $context, $($arg)+)
    };
}

#[macro_export]
macro_rules! log_error {
    ($context:expr, $($arg:tt)+) => {
        $crate::__log_with_context!(tracing::Level::ERROR, $context, $($arg)+)
    };
}

#[macro_export]
macro_rules! log_debug {
    ($context:expr, $($arg:tt)+) => {
        $crate::__log_with_context!(tracing::Level::DEBUG, $context, $($arg)+)
    };
}

/// Times a stage and logs its duration when finished
pub struct PerformanceLogger {
    context: LogContext,
    started: Instant,
}

impl PerformanceLogger {
    pub fn new(context: LogContext) -> Self {
        Self {
            context,
            started: Instant::now(),
        }
    }

    pub fn finish(self, message: &str) {
        let context = self.context.with_duration(self.started.elapsed());
        log_info!(context, "{}", message);
    }

    pub fn finish_with_status(self, message: &str, status: impl Into<String>) {
        let context = self
            .context
            .with_duration(self.started.elapsed())
            .with_status(status);
        log_info!(context, "{}", message);
    }

    pub fn finish_with_error(self, message: &str, error: &crate::error::ScraperError) {
        let context = self
            .context
            .with_duration(self.started.elapsed())
            .with_status("error")
            .with_error_category(error.category());
        log_error!(context, error = %error, "{}", message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScraperError;

    #[test]
    fn test_context_builders() {
        let context = LogContext::new("expansion", "open_modal")
            .with_session_id("7b1c")
            .with_league("NFL")
            .with_event_id("123")
            .with_url("https://sportsbook.test/event/123")
            .with_number_field("control", 2);

        assert_eq!(context.component, "expansion");
        assert_eq!(context.operation, "open_modal");
        assert_eq!(context.session_id.as_deref(), Some("7b1c"));
        assert_eq!(context.league.as_deref(), Some("NFL"));
        assert_eq!(context.event_id.as_deref(), Some("123"));
        assert_eq!(context.additional_fields["control"], serde_json::json!(2));
    }

    #[test]
    fn test_default_config() {
        let config = LoggingConfig::default();
        assert_eq!(config.level, "info");
        assert!(config.console_enabled);
        assert!(config.log_directory.ends_with("logs"));
    }

    #[test]
    fn test_config_from_partial_yaml() {
        let config: LoggingConfig = serde_yaml::from_str("level: debug\nfile_enabled: false\n").unwrap();
        assert_eq!(config.level, "debug");
        assert!(!config.file_enabled);
        assert_eq!(config.max_files, 7);
    }

    #[test]
    fn test_macros_accept_fields_and_format_args() {
        let context = LogContext::new("test", "macros").with_status("ok");
        log_info!(context, "plain message");
        log_warn!(context, reason = "x", "formatted {}", 1);
        log_debug!(context, "debug {}", "message");
        log_error!(context, "error");

        let timer = PerformanceLogger::new(context.clone());
        timer.finish_with_error("stage failed", &ScraperError::export("disk full"));
        PerformanceLogger::new(context).finish("done");
    }
}
