use std::time::Duration;
use thiserror::Error;

/// Error types for the odds scraper
#[derive(Error, Debug)]
pub enum ScraperError {
    // Startup errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Invalid proxy on line {line}: {reason}")]
    InvalidProxy { line: usize, reason: String },

    #[error("Browser setup failed: {message}")]
    Setup { message: String },

    // Stage errors (fatal for the session)
    #[error("League discovery failed: {message}")]
    Discovery { message: String },

    #[error("Event extraction failed: {message}")]
    Extraction { message: String },

    #[error("Export error: {message}")]
    Export { message: String },

    // Page errors (recoverable by skipping the enclosing unit)
    #[error("Navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("Timed out after {}ms waiting for: {target}", timeout.as_millis())]
    NavigationTimeout { target: String, timeout: Duration },

    #[error("Element not found: {selector}")]
    NotFound { selector: String },

    #[error("Parse error: {message}")]
    Parse { message: String },

    // Driver errors
    #[error("Browser error: {message}")]
    Browser { message: String },
}

impl ScraperError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration { message: message.into() }
    }

    /// Create a browser setup error
    pub fn setup(message: impl Into<String>) -> Self {
        Self::Setup { message: message.into() }
    }

    /// Create a discovery error
    pub fn discovery(message: impl Into<String>) -> Self {
        Self::Discovery { message: message.into() }
    }

    /// Create an extraction error
    pub fn extraction(message: impl Into<String>) -> Self {
        Self::Extraction { message: message.into() }
    }

    /// Create a parse error
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse { message: message.into() }
    }

    /// Create an export error
    pub fn export(message: impl Into<String>) -> Self {
        Self::Export { message: message.into() }
    }

    /// Create a browser driver error
    pub fn browser(message: impl Into<String>) -> Self {
        Self::Browser { message: message.into() }
    }

    pub fn timeout(target: impl Into<String>, timeout: Duration) -> Self {
        Self::NavigationTimeout { target: target.into(), timeout }
    }

    /// Whether the error only invalidates the smallest enclosing unit
    /// (one fragment, one modal control, one event) rather than the session.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Navigation { .. }
            | Self::NavigationTimeout { .. }
            | Self::NotFound { .. }
            | Self::Parse { .. } => true,

            Self::Configuration { .. }
            | Self::InvalidProxy { .. }
            | Self::Setup { .. }
            | Self::Discovery { .. }
            | Self::Extraction { .. }
            | Self::Export { .. }
            | Self::Browser { .. } => false,
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            Self::Configuration { .. } | Self::InvalidProxy { .. } => "configuration",
            Self::Setup { .. } | Self::Browser { .. } => "browser",
            Self::Discovery { .. } => "discovery",
            Self::Extraction { .. } => "extraction",
            Self::Export { .. } => "export",
            Self::Navigation { .. } | Self::NavigationTimeout { .. } => "navigation",
            Self::NotFound { .. } | Self::Parse { .. } => "parse",
        }
    }
}

/// Result type alias for the scraper
pub type ScraperResult<T> = std::result::Result<T, ScraperError>;
