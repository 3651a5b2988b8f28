//! Stages of one scraping cycle, driven through a [`BrowserSession`].
//!
//! [`BrowserSession`]: crate::session::BrowserSession

pub mod discovery;
pub mod events;
pub mod lines;
pub mod parse;

pub use lines::{ExpansionReport, ModalState};
pub use parse::FragmentSelectors;

use crate::config::{BrowserConfig, Selectors, Settings};
use crate::error::ScraperResult;
use crate::logging::LogContext;

/// Runs discovery, extraction and expansion for one session
pub struct OddsScraper<'a> {
    settings: &'a Settings,
    fragments: FragmentSelectors,
    session_id: String,
}

impl<'a> OddsScraper<'a> {
    pub fn new(settings: &'a Settings, session_id: impl Into<String>) -> ScraperResult<Self> {
        Ok(Self {
            fragments: FragmentSelectors::compile(&settings.selectors)?,
            settings,
            session_id: session_id.into(),
        })
    }

    fn browser(&self) -> &BrowserConfig {
        &self.settings.browser
    }

    fn selectors(&self) -> &Selectors {
        &self.settings.selectors
    }

    fn context(&self, component: &str, operation: &str) -> LogContext {
        LogContext::new(component, operation).with_session_id(self.session_id.as_str())
    }
}
