use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use crate::config::Settings;
use crate::error::{ScraperError, ScraperResult};
use crate::export::{export_leagues, ExportStats};
use crate::logging::{LogContext, PerformanceLogger};
use crate::scraper::{ExpansionReport, OddsScraper};
use crate::session::BrowserSession;

/// Where a session is in its cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionState {
    Starting,
    Ready,
    Discovering,
    Extracting,
    Expanding,
    Exporting,
    Waiting,
    Failed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Starting => "starting",
            SessionState::Ready => "ready",
            SessionState::Discovering => "discovering",
            SessionState::Extracting => "extracting",
            SessionState::Expanding => "expanding",
            SessionState::Exporting => "exporting",
            SessionState::Waiting => "waiting",
            SessionState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// A session that stopped cleanly after its configured number of cycles
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub cycles: u64,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// A session torn down by a fatal error
#[derive(Debug, Error)]
#[error("Session {session_id} failed after {cycles} cycle(s): {error}")]
pub struct SessionFailure {
    pub session_id: String,
    pub cycles: u64,
    #[source]
    pub error: ScraperError,
}

/// Result of one successful cycle
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub expansion: ExpansionReport,
    pub export: ExportStats,
}

/// Owns one browser session and runs discovery, extraction, expansion and
/// export on it until it fails or reaches `max_cycles`
pub struct SessionOrchestrator<'a, S: BrowserSession> {
    settings: &'a Settings,
    session: S,
    session_id: String,
    state: SessionState,
    cycles: u64,
    started_at: DateTime<Utc>,
}

impl<'a, S: BrowserSession> SessionOrchestrator<'a, S> {
    /// Wrap a freshly launched session
    pub fn new(settings: &'a Settings, session: S) -> Self {
        Self {
            settings,
            session,
            session_id: Uuid::new_v4().to_string(),
            state: SessionState::Starting,
            cycles: 0,
            started_at: Utc::now(),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    fn context(&self, operation: &str) -> LogContext {
        LogContext::new("orchestrator", operation).with_session_id(self.session_id.as_str())
    }

    fn set_state(&mut self, next: SessionState) {
        let context = self.context("transition");
        crate::log_info!(context, from = %self.state, to = %next, cycle = self.cycles + 1, "Session state changed");
        self.state = next;
    }

    /// Run cycles until a fatal error or the cycle limit. The session is
    /// closed either way.
    pub async fn run(mut self) -> Result<SessionSummary, SessionFailure> {
        let scraper = match OddsScraper::new(self.settings, self.session_id.as_str()) {
            Ok(scraper) => scraper,
            Err(e) => return Err(self.fail(e).await),
        };

        self.set_state(SessionState::Ready);
        scraper.dismiss_startup_modal(&mut self.session).await;

        loop {
            let report = match self.run_cycle(&scraper).await {
                Ok(report) => report,
                Err(e) => return Err(self.fail(e).await),
            };
            self.cycles += 1;

            let context = self.context("cycle");
            crate::log_info!(
                context,
                cycle = self.cycles,
                leagues = report.export.leagues,
                events = report.export.events,
                expanded = report.expansion.expanded,
                redirected = report.expansion.redirected,
                skipped = report.expansion.skipped,
                stuck = report.expansion.stuck,
                "Cycle complete"
            );

            if self.settings.max_cycles.is_some_and(|max| self.cycles >= max) {
                self.close_session().await;
                let context = self.context("finish");
                crate::log_info!(context, cycles = self.cycles, "Cycle limit reached, session finished");
                return Ok(SessionSummary {
                    session_id: self.session_id,
                    cycles: self.cycles,
                    started_at: self.started_at,
                    finished_at: Utc::now(),
                });
            }

            self.set_state(SessionState::Waiting);
            tokio::time::sleep(self.settings.cycle_delay()).await;
        }
    }

    /// One pass over every league. League N+1 is extracted only after league N,
    /// and expansion starts only once every league is extracted.
    pub async fn run_cycle(&mut self, scraper: &OddsScraper<'_>) -> ScraperResult<CycleReport> {
        let timer = PerformanceLogger::new(self.context("cycle"));

        self.set_state(SessionState::Discovering);
        let handles = scraper.discover_leagues(&mut self.session).await?;

        self.set_state(SessionState::Extracting);
        let mut leagues = Vec::with_capacity(handles.len());
        for handle in &handles {
            leagues.push(scraper.extract_league(&mut self.session, handle).await?);
        }

        self.set_state(SessionState::Expanding);
        let expansion = scraper.expand_alternate_lines(&mut self.session, &mut leagues).await;

        self.set_state(SessionState::Exporting);
        let export = export_leagues(&self.settings.output_path, &leagues).await?;

        timer.finish_with_status(
            &format!(
                "Exported {} leagues, {} events, {} bytes to {}",
                export.leagues,
                export.events,
                export.bytes_written,
                self.settings.output_path.display()
            ),
            "ok",
        );

        Ok(CycleReport { expansion, export })
    }

    async fn fail(&mut self, error: ScraperError) -> SessionFailure {
        self.set_state(SessionState::Failed);
        let context = self.context("failure").with_error_category(error.category());
        crate::log_error!(context, error = %error, cycles = self.cycles, "Session failed");

        self.close_session().await;
        SessionFailure {
            session_id: self.session_id.clone(),
            cycles: self.cycles,
            error,
        }
    }

    async fn close_session(&mut self) {
        if let Err(e) = self.session.close().await {
            let context = self.context("close");
            crate::log_warn!(context, error = %e, "Browser did not close cleanly");
        }
    }
}
