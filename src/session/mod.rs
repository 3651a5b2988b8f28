//! Browser session capability.
//!
//! The extraction stages only talk to the page through [`BrowserSession`],
//! so they run the same against the Playwright backend and against the
//! scripted stub used in tests. Every call that can wait takes a bound.

use async_trait::async_trait;
use std::time::Duration;

pub mod browser;

#[cfg(test)]
pub(crate) mod stub;

pub use self::browser::{PlaywrightLauncher, PlaywrightSession};

use crate::config::ProxyEntry;
use crate::error::ScraperResult;

/// One automated browser with a single active page
#[async_trait(?Send)]
pub trait BrowserSession {
    /// Handle to an element on the current page
    type Element;

    /// Load `url` and wait for the load event
    async fn navigate(&mut self, url: &str, timeout: Duration) -> ScraperResult<()>;

    /// URL the page actually ended on
    async fn current_url(&self) -> ScraperResult<String>;

    /// Wait until `selector` matches, failing with `NavigationTimeout` past the bound
    async fn wait_for(&self, selector: &str, timeout: Duration) -> ScraperResult<Self::Element>;

    async fn query_all(&self, selector: &str) -> ScraperResult<Vec<Self::Element>>;

    async fn query_all_in(
        &self,
        parent: &Self::Element,
        selector: &str,
    ) -> ScraperResult<Vec<Self::Element>>;

    async fn click(&mut self, element: &Self::Element, timeout: Duration) -> ScraperResult<()>;

    async fn click_selector(&mut self, selector: &str, timeout: Duration) -> ScraperResult<()>;

    async fn text_content(&self, element: &Self::Element) -> ScraperResult<String>;

    async fn attribute(&self, element: &Self::Element, name: &str) -> ScraperResult<Option<String>>;

    async fn inner_html(&self, element: &Self::Element) -> ScraperResult<String>;

    /// Serialized HTML of the whole page, including open modals
    async fn page_html(&self) -> ScraperResult<String>;

    /// Release the browser and its driver. Best-effort.
    async fn close(&mut self) -> ScraperResult<()>;
}

/// Creates fresh browser sessions, one per supervisor attempt
#[async_trait(?Send)]
pub trait SessionLauncher {
    type Session: BrowserSession;

    /// Start a browser (optionally behind `proxy`) with the site's home page loaded
    async fn launch(&self, proxy: Option<&ProxyEntry>) -> ScraperResult<Self::Session>;
}
