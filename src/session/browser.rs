use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;
#[cfg(feature = "browser")]
use tracing::{info, warn};

#[cfg(feature = "browser")]
use ::playwright::api::{Browser, DocumentLoadState, ElementHandle, Page, ProxySettings, Viewport};
#[cfg(feature = "browser")]
use ::playwright::Playwright;
use std::future::Future;

use super::{BrowserSession, SessionLauncher};
use crate::config::{BrowserConfig, ProxyEntry, Settings};
use crate::error::{ScraperError, ScraperResult};

/// Upper bound for driver calls that carry no explicit timeout
#[cfg(feature = "browser")]
const DRIVER_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Slack given to the driver's own timeout before the runtime cuts it off
const TIMEOUT_GRACE: Duration = Duration::from_millis(500);

#[cfg(feature = "browser")]
const STEALTH_SCRIPT: &str = r#"
    Object.defineProperty(navigator, 'webdriver', {
        get: () => undefined
    });
    Object.defineProperty(navigator, 'plugins', {
        get: () => [1, 2, 3, 4, 5]
    });
    Object.defineProperty(navigator, 'languages', {
        get: () => ['en-US', 'en']
    });
"#;

const BROWSER_FEATURE_MISSING: &str = "built without the `browser` feature; rebuild with `--features browser`";

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Launches Chromium through Playwright, one instance per session
pub struct PlaywrightLauncher {
    config: BrowserConfig,
    home_url: String,
}

impl PlaywrightLauncher {
    pub fn new(settings: &Settings) -> Self {
        Self {
            config: settings.browser.clone(),
            home_url: settings.base_url().to_string(),
        }
    }

    fn user_agent(&self) -> &str {
        self.config.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT)
    }

    /// Whether this build can start a browser at all
    pub fn ensure_supported() -> ScraperResult<()> {
        if cfg!(feature = "browser") {
            Ok(())
        } else {
            Err(ScraperError::setup(BROWSER_FEATURE_MISSING))
        }
    }
}

/// Browser session backed by Playwright
#[cfg(feature = "browser")]
pub struct PlaywrightSession {
    playwright: Option<Playwright>,
    browser: Browser,
    page: Page,
}

#[cfg(feature = "browser")]
pub struct PageElement(ElementHandle);

#[cfg(feature = "browser")]
fn millis(timeout: Duration) -> f64 {
    timeout.as_millis() as f64
}

/// Run a driver call under a hard runtime bound and map its error.
#[cfg_attr(not(feature = "browser"), allow(dead_code))]
async fn bounded<T, E, F>(target: &str, timeout: Duration, call: F) -> ScraperResult<T>
where
    E: std::fmt::Display,
    F: Future<Output = Result<T, E>>,
{
    match tokio::time::timeout(timeout + TIMEOUT_GRACE, call).await {
        Err(_) => Err(ScraperError::timeout(target, timeout)),
        Ok(Err(e)) => {
            let message = e.to_string();
            if message.contains("Timeout") || message.contains("timeout") {
                Err(ScraperError::timeout(target, timeout))
            } else {
                Err(ScraperError::browser(format!("{}: {}", target, message)))
            }
        }
        Ok(Ok(value)) => Ok(value),
    }
}

/// One browser start-up step, bounded like any driver call but reported as a
/// setup failure
#[cfg_attr(not(feature = "browser"), allow(dead_code))]
async fn setup_step<T, E, F>(step: &str, timeout: Duration, call: F) -> ScraperResult<T>
where
    E: std::fmt::Display,
    F: Future<Output = Result<T, E>>,
{
    bounded(step, timeout, call)
        .await
        .map_err(|e| ScraperError::setup(format!("{} failed: {}", step, e)))
}

#[cfg(feature = "browser")]
impl PlaywrightLauncher {
    async fn open_page(&self, browser: &Browser) -> ScraperResult<Page> {
        let timeout = self.config.launch_timeout();

        let builder = browser
            .context_builder()
            .user_agent(self.user_agent())
            .viewport(Some(Viewport { width: 1920, height: 1080 }));
        let context = setup_step("Browser context", timeout, builder.build()).await?;

        setup_step("Stealth script", timeout, context.add_init_script(STEALTH_SCRIPT)).await?;
        setup_step("Page creation", timeout, context.new_page()).await
    }
}

#[cfg(feature = "browser")]
#[async_trait(?Send)]
impl SessionLauncher for PlaywrightLauncher {
    type Session = PlaywrightSession;

    async fn launch(&self, proxy: Option<&ProxyEntry>) -> ScraperResult<PlaywrightSession> {
        debug!("Initializing Playwright driver");
        let timeout = self.config.launch_timeout();

        let playwright = setup_step("Playwright driver start", timeout, Playwright::initialize()).await?;

        let chromium = playwright.chromium();
        let mut launcher = chromium
            .launcher()
            .headless(self.config.headless)
            .timeout(millis(timeout));

        if let Some(proxy) = proxy {
            info!("Launching browser behind proxy {}", proxy);
            launcher = launcher.proxy(ProxySettings {
                server: proxy.server(),
                bypass: None,
                username: Some(proxy.username.clone()),
                password: Some(proxy.password.clone()),
            });
        }

        let browser = setup_step("Chromium launch", timeout, launcher.launch()).await?;

        let page = match self.open_page(&browser).await {
            Ok(page) => page,
            Err(e) => {
                if let Err(close_error) = bounded("browser close", DRIVER_CALL_TIMEOUT, browser.close()).await {
                    warn!("Failed to close browser after setup error: {}", close_error);
                }
                return Err(e);
            }
        };

        let mut session = PlaywrightSession {
            playwright: Some(playwright),
            browser,
            page,
        };

        if let Err(e) = session.navigate(&self.home_url, self.config.launch_timeout()).await {
            if let Err(close_error) = session.close().await {
                warn!("Failed to close browser after setup error: {}", close_error);
            }
            return Err(ScraperError::setup(format!("Home page did not load: {}", e)));
        }

        Ok(session)
    }
}

#[cfg(feature = "browser")]
#[async_trait(?Send)]
impl BrowserSession for PlaywrightSession {
    type Element = PageElement;

    async fn navigate(&mut self, url: &str, timeout: Duration) -> ScraperResult<()> {
        debug!("Navigating to {}", url);

        let goto = self
            .page
            .goto_builder(url)
            .timeout(millis(timeout))
            .wait_until(DocumentLoadState::Load)
            .goto();

        match bounded(url, timeout, goto).await {
            Ok(_) => Ok(()),
            Err(ScraperError::Browser { message }) => Err(ScraperError::Navigation {
                url: url.to_string(),
                message,
            }),
            Err(e) => Err(e),
        }
    }

    async fn current_url(&self) -> ScraperResult<String> {
        self.page
            .url()
            .map_err(|e| ScraperError::browser(format!("page url: {}", e)))
    }

    async fn wait_for(&self, selector: &str, timeout: Duration) -> ScraperResult<PageElement> {
        let wait = self
            .page
            .wait_for_selector_builder(selector)
            .timeout(millis(timeout))
            .wait_for_selector();

        bounded(selector, timeout, wait)
            .await?
            .map(PageElement)
            .ok_or_else(|| ScraperError::NotFound { selector: selector.to_string() })
    }

    async fn query_all(&self, selector: &str) -> ScraperResult<Vec<PageElement>> {
        let handles = bounded(selector, DRIVER_CALL_TIMEOUT, self.page.query_selector_all(selector)).await?;
        Ok(handles.into_iter().map(PageElement).collect())
    }

    async fn query_all_in(&self, parent: &PageElement, selector: &str) -> ScraperResult<Vec<PageElement>> {
        let handles = bounded(selector, DRIVER_CALL_TIMEOUT, parent.0.query_selector_all(selector)).await?;
        Ok(handles.into_iter().map(PageElement).collect())
    }

    async fn click(&mut self, element: &PageElement, timeout: Duration) -> ScraperResult<()> {
        let click = element.0.click_builder().timeout(millis(timeout)).click();
        bounded("element click", timeout, click).await
    }

    async fn click_selector(&mut self, selector: &str, timeout: Duration) -> ScraperResult<()> {
        let click = self.page.click_builder(selector).timeout(millis(timeout)).click();
        bounded(selector, timeout, click).await
    }

    async fn text_content(&self, element: &PageElement) -> ScraperResult<String> {
        let text = bounded("text content", DRIVER_CALL_TIMEOUT, element.0.text_content()).await?;
        Ok(text.unwrap_or_default())
    }

    async fn attribute(&self, element: &PageElement, name: &str) -> ScraperResult<Option<String>> {
        bounded(name, DRIVER_CALL_TIMEOUT, element.0.get_attribute(name)).await
    }

    async fn inner_html(&self, element: &PageElement) -> ScraperResult<String> {
        bounded("inner html", DRIVER_CALL_TIMEOUT, element.0.inner_html()).await
    }

    async fn page_html(&self) -> ScraperResult<String> {
        bounded("page content", DRIVER_CALL_TIMEOUT, self.page.content()).await
    }

    async fn close(&mut self) -> ScraperResult<()> {
        let result = bounded("browser close", DRIVER_CALL_TIMEOUT, self.browser.close()).await;
        // Dropping the handle stops the driver process
        self.playwright.take();
        result
    }
}

// Stub implementation when browser feature is disabled
#[cfg(not(feature = "browser"))]
pub enum PlaywrightSession {}

#[cfg(not(feature = "browser"))]
#[async_trait(?Send)]
impl SessionLauncher for PlaywrightLauncher {
    type Session = PlaywrightSession;

    async fn launch(&self, _proxy: Option<&ProxyEntry>) -> ScraperResult<PlaywrightSession> {
        debug!(
            "Refusing to launch {} with user agent {}",
            self.home_url,
            self.user_agent()
        );
        Err(ScraperError::setup(BROWSER_FEATURE_MISSING))
    }
}

#[cfg(not(feature = "browser"))]
#[async_trait(?Send)]
impl BrowserSession for PlaywrightSession {
    type Element = ();

    async fn navigate(&mut self, _url: &str, _timeout: Duration) -> ScraperResult<()> {
        match *self {}
    }

    async fn current_url(&self) -> ScraperResult<String> {
        match *self {}
    }

    async fn wait_for(&self, _selector: &str, _timeout: Duration) -> ScraperResult<()> {
        match *self {}
    }

    async fn query_all(&self, _selector: &str) -> ScraperResult<Vec<()>> {
        match *self {}
    }

    async fn query_all_in(&self, _parent: &(), _selector: &str) -> ScraperResult<Vec<()>> {
        match *self {}
    }

    async fn click(&mut self, _element: &(), _timeout: Duration) -> ScraperResult<()> {
        match *self {}
    }

    async fn click_selector(&mut self, _selector: &str, _timeout: Duration) -> ScraperResult<()> {
        match *self {}
    }

    async fn text_content(&self, _element: &()) -> ScraperResult<String> {
        match *self {}
    }

    async fn attribute(&self, _element: &(), _name: &str) -> ScraperResult<Option<String>> {
        match *self {}
    }

    async fn inner_html(&self, _element: &()) -> ScraperResult<String> {
        match *self {}
    }

    async fn page_html(&self) -> ScraperResult<String> {
        match *self {}
    }

    async fn close(&mut self) -> ScraperResult<()> {
        match *self {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_launcher_uses_configured_user_agent() {
        let mut settings = Settings::with_timeout(5);
        let launcher = PlaywrightLauncher::new(&settings);
        assert_eq!(launcher.user_agent(), DEFAULT_USER_AGENT);

        settings.browser.user_agent = Some("odds-bot/1.0".to_string());
        let launcher = PlaywrightLauncher::new(&settings);
        assert_eq!(launcher.user_agent(), "odds-bot/1.0");
        assert_eq!(launcher.home_url, "https://barstoolsportsbook.com");
    }

    #[tokio::test]
    async fn test_stalled_setup_step_times_out() {
        let stalled = std::future::pending::<Result<(), String>>();

        let error = setup_step("Playwright driver start", Duration::from_millis(10), stalled)
            .await
            .unwrap_err();

        assert!(matches!(error, ScraperError::Setup { .. }));
        assert!(error.to_string().contains("Playwright driver start failed: Timed out after 10ms"));
    }

    #[tokio::test]
    async fn test_failed_setup_step_is_setup_error() {
        let error = setup_step("Chromium launch", Duration::from_secs(1), async { Err::<(), _>("executable missing") })
            .await
            .unwrap_err();

        assert!(matches!(error, ScraperError::Setup { .. }));
        assert!(error.to_string().contains("executable missing"));
    }

    #[cfg(not(feature = "browser"))]
    #[tokio::test]
    async fn test_launch_without_browser_feature_is_setup_error() {
        let launcher = PlaywrightLauncher::new(&Settings::with_timeout(5));
        let error = launcher.launch(None).await.err().unwrap();
        assert!(matches!(error, ScraperError::Setup { .. }));
        assert!(PlaywrightLauncher::ensure_supported().unwrap_err().to_string().contains("--features browser"));
    }

    #[cfg(feature = "browser")]
    #[test]
    fn test_browser_build_is_supported() {
        assert!(PlaywrightLauncher::ensure_supported().is_ok());
    }
}
