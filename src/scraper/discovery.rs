use tracing::debug;

use super::OddsScraper;
use crate::error::{ScraperError, ScraperResult};
use crate::logging::PerformanceLogger;
use crate::session::BrowserSession;

impl OddsScraper<'_> {
    /// Close the promotional modal some visits open with. Returns whether one was closed.
    pub async fn dismiss_startup_modal<S: BrowserSession>(&self, session: &mut S) -> bool {
        let context = self.context("discovery", "startup_modal");
        let selector = &self.selectors().startup_modal_close;

        let button = match session.wait_for(selector, self.browser().startup_modal_timeout()).await {
            Ok(button) => button,
            Err(e) => {
                debug!("No startup modal: {}", e);
                return false;
            }
        };

        match session.click(&button, self.browser().click_timeout()).await {
            Ok(()) => {
                crate::log_info!(context, "Startup modal dismissed");
                true
            }
            Err(e) => {
                crate::log_warn!(context, error = %e, "Startup modal could not be closed");
                false
            }
        }
    }

    /// Re-open the home page and return the handles of every league in the
    /// sport category menu
    pub async fn discover_leagues<S: BrowserSession>(&self, session: &mut S) -> ScraperResult<Vec<S::Element>> {
        let home = self.settings.base_url();
        let timer = PerformanceLogger::new(self.context("discovery", "leagues").with_url(home));

        session
            .navigate(home, self.browser().navigation_timeout())
            .await
            .map_err(|e| ScraperError::discovery(format!("Home page unavailable: {}", e)))?;

        let selectors = self.selectors();
        let category = session
            .wait_for(&selectors.sport_category, self.browser().category_timeout())
            .await
            .map_err(|e| ScraperError::discovery(format!("Sport category not found: {}", e)))?;

        session
            .click(&category, self.browser().click_timeout())
            .await
            .map_err(|e| ScraperError::discovery(format!("Sport category not clickable: {}", e)))?;

        let leagues = session
            .query_all(&selectors.league_menu_item)
            .await
            .map_err(|e| ScraperError::discovery(format!("League menu unreadable: {}", e)))?;

        if leagues.is_empty() {
            return Err(ScraperError::discovery("League menu is empty"));
        }

        timer.finish(&format!("{} leagues discovered", leagues.len()));
        Ok(leagues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::session::stub::{StubElement, StubSession, StubSite};

    fn settings() -> Settings {
        let mut settings = Settings::with_timeout(1);
        settings.site.base_url = StubSite::default().base_url;
        settings
    }

    #[tokio::test]
    async fn test_discovers_every_league() {
        let site = StubSite::default().with_league("NFL", vec![]).with_league("NCAAF", vec![]);
        let mut session = StubSession::new(site);
        let settings = settings();
        let scraper = OddsScraper::new(&settings, "test").unwrap();

        let leagues = scraper.discover_leagues(&mut session).await.unwrap();

        assert_eq!(leagues, vec![StubElement::League(0), StubElement::League(1)]);
        assert_eq!(session.journal().borrow().navigations, vec![settings.base_url().to_string()]);
    }

    #[tokio::test]
    async fn test_missing_category_is_fatal() {
        let site = StubSite {
            category_present: false,
            ..StubSite::default().with_league("NFL", vec![])
        };
        let mut session = StubSession::new(site);
        let settings = settings();
        let scraper = OddsScraper::new(&settings, "test").unwrap();

        let error = scraper.discover_leagues(&mut session).await.unwrap_err();
        assert_eq!(error.category(), "discovery");
        assert!(!error.is_recoverable());
    }

    #[tokio::test]
    async fn test_empty_menu_is_fatal() {
        let mut session = StubSession::new(StubSite::default());
        let settings = settings();
        let scraper = OddsScraper::new(&settings, "test").unwrap();

        let error = scraper.discover_leagues(&mut session).await.unwrap_err();
        assert!(error.to_string().contains("empty"));
    }

    #[tokio::test]
    async fn test_unreachable_home_is_fatal() {
        let settings = settings();
        let site = StubSite {
            unreachable: vec![settings.base_url().to_string()],
            ..StubSite::default().with_league("NFL", vec![])
        };
        let mut session = StubSession::new(site);
        let scraper = OddsScraper::new(&settings, "test").unwrap();

        assert!(scraper.discover_leagues(&mut session).await.is_err());
    }

    #[tokio::test]
    async fn test_startup_modal_is_optional() {
        let settings = settings();
        let scraper = OddsScraper::new(&settings, "test").unwrap();

        let mut quiet = StubSession::new(StubSite::default());
        assert!(!scraper.dismiss_startup_modal(&mut quiet).await);

        let mut promo = StubSession::new(StubSite {
            startup_modal: true,
            ..StubSite::default()
        });
        assert!(scraper.dismiss_startup_modal(&mut promo).await);
        assert!(promo.journal().borrow().startup_dismissed);
    }
}
