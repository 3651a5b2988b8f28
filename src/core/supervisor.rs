use tracing::info;

use super::orchestrator::{SessionFailure, SessionOrchestrator, SessionSummary};
use crate::config::{ProxyRotation, Settings};
use crate::error::ScraperError;
use crate::logging::LogContext;
use crate::session::SessionLauncher;

/// How one supervisor attempt ended
#[derive(Debug)]
pub enum AttemptOutcome {
    Completed(SessionSummary),
    Failed(SessionFailure),
    LaunchFailed(ScraperError),
}

/// Totals over every attempt made by [`Supervisor::run`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SupervisorReport {
    pub attempts: u64,
    pub completed: u64,
    pub failed: u64,
    pub launch_failures: u64,
}

/// Outer restart loop: every attempt gets a fresh browser behind the next proxy
pub struct Supervisor<L: SessionLauncher> {
    launcher: L,
    settings: Settings,
    proxies: Option<ProxyRotation>,
    attempts: u64,
}

impl<L: SessionLauncher> Supervisor<L> {
    pub fn new(launcher: L, settings: Settings, proxies: Option<ProxyRotation>) -> Self {
        Self {
            launcher,
            settings,
            proxies,
            attempts: 0,
        }
    }

    /// Launch one session and run it to completion. Never panics on session
    /// errors; they come back as the outcome.
    pub async fn run_attempt(&mut self) -> AttemptOutcome {
        tokio::time::sleep(self.settings.restart_delay()).await;
        self.attempts += 1;

        let proxy = self.proxies.as_mut().map(|rotation| rotation.next_proxy().clone());
        let mut context = LogContext::new("supervisor", "attempt").with_number_field("attempt", self.attempts as i64);
        if let Some(proxy) = &proxy {
            context = context.with_string_field("proxy", proxy.to_string());
        }
        crate::log_info!(context, "Starting browser session");

        let session = match self.launcher.launch(proxy.as_ref()).await {
            Ok(session) => session,
            Err(e) => {
                let context = context.with_error_category(e.category());
                crate::log_error!(context, error = %e, "Browser launch failed");
                return AttemptOutcome::LaunchFailed(e);
            }
        };

        let orchestrator = SessionOrchestrator::new(&self.settings, session);
        let context = context.with_session_id(orchestrator.session_id());

        match orchestrator.run().await {
            Ok(summary) => {
                crate::log_info!(context, cycles = summary.cycles, "Session finished");
                AttemptOutcome::Completed(summary)
            }
            Err(failure) => {
                let context = context.with_error_category(failure.error.category());
                crate::log_warn!(context, error = %failure, "Session ended, restarting");
                AttemptOutcome::Failed(failure)
            }
        }
    }

    /// Keep restarting sessions; forever when `max_attempts` is `None`
    pub async fn run(&mut self, max_attempts: Option<u64>) -> SupervisorReport {
        let mut report = SupervisorReport::default();

        while max_attempts.map_or(true, |max| report.attempts < max) {
            match self.run_attempt().await {
                AttemptOutcome::Completed(_) => report.completed += 1,
                AttemptOutcome::Failed(_) => report.failed += 1,
                AttemptOutcome::LaunchFailed(_) => report.launch_failures += 1,
            }
            report.attempts += 1;
        }

        info!(
            "Supervisor stopped after {} attempts ({} completed, {} failed, {} launch failures)",
            report.attempts, report.completed, report.failed, report.launch_failures
        );
        report
    }
}
