use super::parse::{parse_event_fragment, parse_event_id};
use super::OddsScraper;
use crate::error::{ScraperError, ScraperResult};
use crate::logging::PerformanceLogger;
use crate::model::{EventData, LeagueEventsList};
use crate::session::BrowserSession;

impl OddsScraper<'_> {
    /// Select one league from the menu and parse its event cards.
    ///
    /// A card that fails to parse is logged and skipped. Driver errors fail the
    /// whole league.
    pub async fn extract_league<S: BrowserSession>(
        &self,
        session: &mut S,
        league: &S::Element,
    ) -> ScraperResult<LeagueEventsList> {
        let browser = self.browser();
        let selectors = self.selectors();

        session
            .click(league, browser.click_timeout())
            .await
            .map_err(|e| ScraperError::extraction(format!("League not selectable: {}", e)))?;

        let name = session
            .text_content(league)
            .await
            .map_err(|e| ScraperError::extraction(format!("League name unreadable: {}", e)))?
            .trim()
            .to_string();
        if name.is_empty() {
            return Err(ScraperError::extraction("League menu entry has no name"));
        }

        let context = self.context("extraction", "league").with_league(name.as_str());
        let timer = PerformanceLogger::new(context.clone());

        let container = session
            .wait_for(&selectors.events_container, browser.events_timeout())
            .await
            .map_err(|e| ScraperError::extraction(format!("No events container for {}: {}", name, e)))?;

        let fragments = session
            .query_all_in(&container, &selectors.event_card)
            .await
            .map_err(|e| ScraperError::extraction(format!("Event cards of {} unreadable: {}", name, e)))?;

        let mut events = Vec::with_capacity(fragments.len());
        for (index, fragment) in fragments.iter().enumerate() {
            match self.read_event(session, fragment).await {
                Ok(event) => events.push(event),
                Err(e) if e.is_recoverable() => {
                    let skipped = context.clone().with_error_category(e.category());
                    crate::log_warn!(skipped, fragment = index, error = %e, "Skipping malformed event");
                }
                Err(e) => {
                    timer.finish_with_error("Event cards unreadable", &e);
                    return Err(ScraperError::extraction(format!("Event card {} of {}: {}", index, name, e)));
                }
            }
        }

        match LeagueEventsList::new(name, events) {
            Ok(list) => {
                timer.finish_with_status(&format!("{} events parsed", list.events().len()), "ok");
                Ok(list)
            }
            Err(e) => {
                timer.finish_with_error("League produced no events", &e);
                Err(e)
            }
        }
    }

    async fn read_event<S: BrowserSession>(&self, session: &S, fragment: &S::Element) -> ScraperResult<EventData> {
        let id_attr = session.attribute(fragment, "id").await?;
        let id = parse_event_id(id_attr.as_deref())?;
        let html = session.inner_html(fragment).await?;
        parse_event_fragment(id, &html, &self.fragments)
    }
}
