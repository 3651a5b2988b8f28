use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

pub mod proxy;

pub use proxy::{load_proxies, ProxyEntry, ProxyRotation};

use crate::error::{ScraperError, ScraperResult};
use crate::logging::LoggingConfig;

/// Application settings, loaded once at startup and passed down
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Delay between cycles, in seconds
    pub timeout: u64,
    #[serde(default)]
    pub use_proxy: bool,
    #[serde(default = "default_proxies_path")]
    pub proxies_path: PathBuf,
    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,
    /// Stop a session cleanly after this many cycles; unbounded when unset
    #[serde(default)]
    pub max_cycles: Option<u64>,
    #[serde(default = "default_restart_delay_ms")]
    pub restart_delay_ms: u64,
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub selectors: Selectors,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub base_url: String,
    /// Path between the base URL and the league segment of an event page
    pub competition_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    pub headless: bool,
    pub user_agent: Option<String>,
    pub launch_timeout_ms: u64,
    pub navigation_timeout_ms: u64,
    pub category_timeout_ms: u64,
    pub events_timeout_ms: u64,
    pub lines_timeout_ms: u64,
    pub click_timeout_ms: u64,
    pub close_timeout_ms: u64,
    pub startup_modal_timeout_ms: u64,
    /// Fixed pause after clicking an "all lines" control before the modal is read
    pub modal_settle_ms: u64,
}

/// CSS selectors for the live page and for the HTML fragments read from it
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Selectors {
    // Page selectors, resolved by the browser
    pub startup_modal_close: String,
    pub sport_category: String,
    pub league_menu_item: String,
    pub events_container: String,
    pub event_card: String,
    pub all_lines_button: String,
    pub modal_close: String,

    // Fragment selectors, resolved against rendered HTML
    pub start_date: String,
    pub team_name: String,
    pub team_score: String,
    pub odds_row: String,
    pub line_group: String,
    pub line_label: String,
    pub line_price: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://barstoolsportsbook.com".to_string(),
            competition_path: "sport/football/organization/united-states/competition".to_string(),
        }
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: false,
            user_agent: None,
            launch_timeout_ms: 60_000,
            navigation_timeout_ms: 30_000,
            category_timeout_ms: 5_000,
            events_timeout_ms: 5_000,
            lines_timeout_ms: 30_000,
            click_timeout_ms: 2_000,
            close_timeout_ms: 2_000,
            startup_modal_timeout_ms: 3_000,
            modal_settle_ms: 2_000,
        }
    }
}

impl BrowserConfig {
    pub fn launch_timeout(&self) -> Duration {
        Duration::from_millis(self.launch_timeout_ms)
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout_ms)
    }

    pub fn category_timeout(&self) -> Duration {
        Duration::from_millis(self.category_timeout_ms)
    }

    pub fn events_timeout(&self) -> Duration {
        Duration::from_millis(self.events_timeout_ms)
    }

    pub fn lines_timeout(&self) -> Duration {
        Duration::from_millis(self.lines_timeout_ms)
    }

    pub fn click_timeout(&self) -> Duration {
        Duration::from_millis(self.click_timeout_ms)
    }

    pub fn close_timeout(&self) -> Duration {
        Duration::from_millis(self.close_timeout_ms)
    }

    pub fn startup_modal_timeout(&self) -> Duration {
        Duration::from_millis(self.startup_modal_timeout_ms)
    }

    pub fn modal_settle(&self) -> Duration {
        Duration::from_millis(self.modal_settle_ms)
    }
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            startup_modal_close: "button[data-testid='modal-close-button']".to_string(),
            sport_category: "#__next > div > div.z-0.flex.min-h-full.flex-col.flex-nowrap > main > div:nth-child(1) > div > nav > ul > li:nth-child(21)".to_string(),
            league_menu_item: "li[data-testid='sport-menu-item']".to_string(),
            events_container: "div[data-testid='marketplace-shelf-']".to_string(),
            event_card: ".bg-card-primary.rounded.p-4".to_string(),
            all_lines_button: "button.flex.cursor-pointer.select-none.items-center".to_string(),
            modal_close: "button[aria-label='Close']".to_string(),

            start_date: "span.mr-2".to_string(),
            team_name: r#"div[class="text-primary text-description text-primary"]"#.to_string(),
            team_score: r#"div[class="text-subdued-primary mt-0.5 text-footnote"]"#.to_string(),
            odds_row: r#"div[class="flex items-center gap-2 pt-2 w-[53%]"]"#.to_string(),
            line_group: r#"div[class="bg-card-primary flex flex-col gap-4"]"#.to_string(),
            line_label: r#"span[class="font-medium text-selector-label-deselected"]"#.to_string(),
            line_price: "span.font-bold".to_string(),
        }
    }
}

impl Selectors {
    /// Selectors parsed locally with the `scraper` crate
    fn fragment_selectors(&self) -> [(&'static str, &str); 7] {
        [
            ("start_date", self.start_date.as_str()),
            ("team_name", self.team_name.as_str()),
            ("team_score", self.team_score.as_str()),
            ("odds_row", self.odds_row.as_str()),
            ("line_group", self.line_group.as_str()),
            ("line_label", self.line_label.as_str()),
            ("line_price", self.line_price.as_str()),
        ]
    }
}

fn default_proxies_path() -> PathBuf {
    PathBuf::from("proxies.txt")
}

fn default_output_path() -> PathBuf {
    PathBuf::from("output.json")
}

fn default_restart_delay_ms() -> u64 {
    1_000
}

impl Settings {
    /// Settings with every optional field at its default
    pub fn with_timeout(timeout: u64) -> Self {
        Self {
            timeout,
            use_proxy: false,
            proxies_path: default_proxies_path(),
            output_path: default_output_path(),
            max_cycles: None,
            restart_delay_ms: default_restart_delay_ms(),
            site: SiteConfig::default(),
            browser: BrowserConfig::default(),
            selectors: Selectors::default(),
            logging: LoggingConfig::default(),
        }
    }

    /// Load settings from a YAML file
    pub async fn load_from_file<P: AsRef<Path>>(path: P) -> ScraperResult<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            ScraperError::config(format!("Cannot read settings file {}: {}", path.display(), e))
        })?;

        let settings = Self::from_yaml(&content)?;
        info!("Settings loaded from {}", path.display());
        Ok(settings)
    }

    /// Parse and validate settings from YAML text
    pub fn from_yaml(content: &str) -> ScraperResult<Self> {
        let document: serde_yaml::Value = serde_yaml::from_str(content)
            .map_err(|e| ScraperError::config(format!("Invalid settings YAML: {}", e)))?;

        // Checked before typed deserialization so the message names the field
        match document.get("timeout").and_then(serde_yaml::Value::as_u64) {
            Some(timeout) if timeout > 0 => {}
            _ => return Err(ScraperError::config("Timeout in settings must be a positive integer")),
        }

        let settings: Settings = serde_yaml::from_value(document)
            .map_err(|e| ScraperError::config(format!("Invalid settings: {}", e)))?;

        settings.validate()?;
        Ok(settings)
    }

    /// Validate configuration values
    pub fn validate(&self) -> ScraperResult<()> {
        if self.timeout == 0 {
            return Err(ScraperError::config("Timeout in settings must be a positive integer"));
        }

        let base_url = url::Url::parse(&self.site.base_url)
            .map_err(|e| ScraperError::config(format!("Invalid base_url '{}': {}", self.site.base_url, e)))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(ScraperError::config(format!(
                "base_url must be http or https, got '{}'",
                base_url.scheme()
            )));
        }

        let browser = &self.browser;
        let timeouts = [
            ("launch_timeout_ms", browser.launch_timeout_ms),
            ("navigation_timeout_ms", browser.navigation_timeout_ms),
            ("category_timeout_ms", browser.category_timeout_ms),
            ("events_timeout_ms", browser.events_timeout_ms),
            ("lines_timeout_ms", browser.lines_timeout_ms),
            ("click_timeout_ms", browser.click_timeout_ms),
            ("close_timeout_ms", browser.close_timeout_ms),
            ("startup_modal_timeout_ms", browser.startup_modal_timeout_ms),
        ];
        for (name, value) in timeouts {
            if value == 0 {
                return Err(ScraperError::config(format!("browser.{} must be > 0", name)));
            }
        }

        for (name, selector) in self.selectors.fragment_selectors() {
            scraper::Selector::parse(selector).map_err(|e| {
                ScraperError::config(format!("Invalid selector {} '{}': {:?}", name, selector, e))
            })?;
        }

        if self.max_cycles == Some(0) {
            return Err(ScraperError::config("max_cycles must be > 0 when set"));
        }

        Ok(())
    }

    /// Delay between cycles
    pub fn cycle_delay(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    pub fn restart_delay(&self) -> Duration {
        Duration::from_millis(self.restart_delay_ms)
    }

    /// Home page of the site, without a trailing slash
    pub fn base_url(&self) -> &str {
        self.site.base_url.trim_end_matches('/')
    }

    /// Detail page of one event. Compared verbatim against the page URL
    /// after navigation to detect redirects.
    pub fn event_url(&self, league_name: &str, event_id: &str) -> String {
        format!(
            "{}/{}/{}/event/{}",
            self.base_url(),
            self.site.competition_path.trim_matches('/'),
            league_name.to_lowercase(),
            event_id
        )
    }
}

/// Environment-based configuration overrides
pub struct ConfigOverrides;

impl ConfigOverrides {
    /// Apply environment variable overrides to settings
    pub fn apply(settings: &mut Settings) {
        Self::apply_from(settings, |key| std::env::var(key).ok());
    }

    fn apply_from(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(timeout) = lookup("SBO_TIMEOUT").and_then(|v| v.parse::<u64>().ok()) {
            settings.timeout = timeout;
        }

        if let Some(use_proxy) = lookup("SBO_USE_PROXY") {
            settings.use_proxy = use_proxy.to_lowercase() == "true";
        }

        if let Some(output) = lookup("SBO_OUTPUT") {
            settings.output_path = PathBuf::from(output);
        }

        if let Some(headless) = lookup("SBO_HEADLESS") {
            settings.browser.headless = headless.to_lowercase() == "true";
        }

        if let Some(level) = lookup("SBO_LOG_LEVEL") {
            settings.logging.level = level;
        }
    }
}
