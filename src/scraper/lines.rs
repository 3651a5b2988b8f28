use tracing::debug;

use super::parse::{parse_modal_lines, LineKind};
use super::OddsScraper;
use crate::logging::{LogContext, PerformanceLogger};
use crate::model::{EventData, LeagueEventsList};
use crate::session::BrowserSession;

/// Progress of one "all lines" control
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalState {
    Idle,
    ModalOpen,
    Parsed,
    /// Lines recorded and the modal dismissed
    Closed,
    /// The modal would not close; the rest of the event's controls are abandoned
    Stuck,
    /// Nothing rendered, no close attempted
    Skipped,
}

impl ModalState {
    fn is_terminal(self) -> bool {
        matches!(self, ModalState::Closed | ModalState::Stuck | ModalState::Skipped)
    }
}

/// How each event fared during expansion
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpansionReport {
    pub expanded: usize,
    pub redirected: usize,
    pub skipped: usize,
    pub stuck: usize,
}

impl ExpansionReport {
    pub fn total(&self) -> usize {
        self.expanded + self.redirected + self.skipped + self.stuck
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EventOutcome {
    Expanded,
    Redirected,
    Skipped,
    Stuck,
}

impl OddsScraper<'_> {
    /// Visit every event's detail page and append its alternate spreads and
    /// totals in place. Failures stay inside the event they happen in.
    pub async fn expand_alternate_lines<S: BrowserSession>(
        &self,
        session: &mut S,
        leagues: &mut [LeagueEventsList],
    ) -> ExpansionReport {
        let timer = PerformanceLogger::new(self.context("expansion", "alternate_lines"));
        let mut report = ExpansionReport::default();

        for league in leagues.iter_mut() {
            let league_name = league.league_name().to_string();
            for event in league.events_mut() {
                match self.expand_event(session, &league_name, event).await {
                    EventOutcome::Expanded => report.expanded += 1,
                    EventOutcome::Redirected => report.redirected += 1,
                    EventOutcome::Skipped => report.skipped += 1,
                    EventOutcome::Stuck => report.stuck += 1,
                }
            }
        }

        timer.finish_with_status(
            &format!(
                "{} expanded, {} redirected, {} skipped, {} stuck",
                report.expanded, report.redirected, report.skipped, report.stuck
            ),
            "ok",
        );
        report
    }

    async fn expand_event<S: BrowserSession>(
        &self,
        session: &mut S,
        league_name: &str,
        event: &mut EventData,
    ) -> EventOutcome {
        let url = self.settings.event_url(league_name, &event.id);
        let context = self
            .context("expansion", "event")
            .with_league(league_name)
            .with_event_id(event.id.as_str())
            .with_url(url.as_str());

        if let Err(e) = session.navigate(&url, self.browser().navigation_timeout()).await {
            let context = context.with_error_category(e.category());
            crate::log_warn!(context, error = %e, "Detail page unavailable, skipping event");
            return EventOutcome::Skipped;
        }

        match session.current_url().await {
            Ok(current) if current == url => {}
            Ok(current) => {
                crate::log_info!(context, landed = %current, "Detail page redirected, skipping event");
                return EventOutcome::Redirected;
            }
            Err(e) => {
                crate::log_warn!(context, error = %e, "Page URL unreadable, skipping event");
                return EventOutcome::Skipped;
            }
        }

        let selector = &self.selectors().all_lines_button;
        if let Err(e) = session.wait_for(selector, self.browser().lines_timeout()).await {
            crate::log_warn!(context, error = %e, "No lines controls, skipping event");
            return EventOutcome::Skipped;
        }

        let controls = match session.query_all(selector).await {
            Ok(controls) if !controls.is_empty() => controls,
            Ok(_) => {
                crate::log_warn!(context, "Lines controls vanished, skipping event");
                return EventOutcome::Skipped;
            }
            Err(e) => {
                crate::log_warn!(context, error = %e, "Lines controls unreadable, skipping event");
                return EventOutcome::Skipped;
            }
        };

        for (index, control) in controls.iter().enumerate() {
            let state = self.drive_modal(session, control, index, event, &context).await;
            if state == ModalState::Stuck {
                let context = context.clone().with_number_field("control", index as i64);
                crate::log_warn!(
                    context,
                    remaining = controls.len() - index - 1,
                    "Modal would not close, abandoning the event's remaining controls"
                );
                return EventOutcome::Stuck;
            }
        }

        EventOutcome::Expanded
    }

    /// Run one control through Idle, ModalOpen, Parsed and into a terminal state
    async fn drive_modal<S: BrowserSession>(
        &self,
        session: &mut S,
        control: &S::Element,
        index: usize,
        event: &mut EventData,
        context: &LogContext,
    ) -> ModalState {
        let browser = self.browser();
        let kind = LineKind::for_control(index);
        let mut state = ModalState::Idle;

        while !state.is_terminal() {
            state = match state {
                ModalState::Idle => {
                    // The modal sometimes opens even when the click reports failure
                    if let Err(e) = session.click(control, browser.click_timeout()).await {
                        debug!("Lines control {} click failed: {}", index, e);
                    }
                    tokio::time::sleep(browser.modal_settle()).await;
                    ModalState::ModalOpen
                }
                ModalState::ModalOpen => match session.page_html().await {
                    Ok(html) => {
                        let lines = parse_modal_lines(&html, &self.fragments);
                        if lines.groups == 0 {
                            crate::log_warn!(context, control = index, "Lines modal did not render");
                            ModalState::Skipped
                        } else {
                            if lines.malformed > 0 {
                                crate::log_warn!(
                                    context,
                                    control = index,
                                    malformed = lines.malformed,
                                    "Skipping malformed alternate rows"
                                );
                            }
                            debug!("Control {} yielded {} {:?} rows", index, lines.rows.len(), kind);
                            for row in lines.rows {
                                row.apply(kind, &mut event.teams);
                            }
                            ModalState::Parsed
                        }
                    }
                    Err(e) => {
                        crate::log_warn!(context, control = index, error = %e, "Page unreadable with modal open");
                        ModalState::Skipped
                    }
                },
                ModalState::Parsed => {
                    match session
                        .click_selector(&self.selectors().modal_close, browser.close_timeout())
                        .await
                    {
                        Ok(()) => ModalState::Closed,
                        Err(e) => {
                            debug!("Modal close failed: {}", e);
                            ModalState::Stuck
                        }
                    }
                }
                terminal => terminal,
            };
        }

        state
    }
}
