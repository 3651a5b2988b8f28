//! Sportsbook odds collector
//!
//! Drives a browser over a sportsbook's football section and keeps a JSON
//! snapshot of every league's events fresh:
//! - League discovery and event-card extraction
//! - Alternate spread and total lines from each event's detail page
//! - Ordered JSON export, rewritten every cycle
//! - Session orchestration with a restarting, proxy-rotating supervisor

pub mod config;
pub mod core;
pub mod error;
pub mod export;
pub mod logging;
pub mod model;
pub mod scraper;
pub mod session;

// Re-export main types for convenience
pub use crate::config::Settings;
pub use crate::core::{SessionOrchestrator, Supervisor};
pub use crate::error::{ScraperError, ScraperResult};
pub use crate::model::{EventData, LeagueEventsList, MatchSpread, TeamData, TotalPoints};
