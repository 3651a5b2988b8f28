use serde::{Deserialize, Serialize};

use crate::error::{ScraperError, ScraperResult};

/// One alternate point-spread line for one team
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSpread {
    pub spread: String,
    pub moneyline: String,
}

/// One alternate over/under line for one team
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TotalPoints {
    pub total: String,
    pub moneyline: String,
}

/// One side of an event with its base odds and alternate lines
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamData {
    pub name: String,
    pub score: String,
    pub spread: String,
    pub total: String,
    pub moneyline: String,
    #[serde(default)]
    pub match_spreads: Vec<MatchSpread>,
    #[serde(default)]
    pub total_points: Vec<TotalPoints>,
}

impl TeamData {
    /// Team with base odds only; alternate lines are filled in later
    pub fn new(
        name: impl Into<String>,
        score: impl Into<String>,
        spread: impl Into<String>,
        total: impl Into<String>,
        moneyline: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            score: score.into(),
            spread: spread.into(),
            total: total.into(),
            moneyline: moneyline.into(),
            match_spreads: Vec::new(),
            total_points: Vec::new(),
        }
    }
}

/// One scheduled match. `teams[0]` is the side listed first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventData {
    pub id: String,
    pub start_date: String,
    pub teams: [TeamData; 2],
}

/// All events parsed for one league. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawLeagueEventsList")]
pub struct LeagueEventsList {
    league_name: String,
    events: Vec<EventData>,
}

/// Unchecked wire form, validated through [`LeagueEventsList::new`]
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawLeagueEventsList {
    league_name: String,
    events: Vec<EventData>,
}

impl TryFrom<RawLeagueEventsList> for LeagueEventsList {
    type Error = ScraperError;

    fn try_from(raw: RawLeagueEventsList) -> ScraperResult<Self> {
        Self::new(raw.league_name, raw.events)
    }
}

impl LeagueEventsList {
    pub fn new(league_name: impl Into<String>, events: Vec<EventData>) -> ScraperResult<Self> {
        let league_name = league_name.into();
        if events.is_empty() {
            return Err(ScraperError::extraction(format!(
                "League '{}' has no parsable events",
                league_name
            )));
        }

        Ok(Self { league_name, events })
    }

    pub fn league_name(&self) -> &str {
        &self.league_name
    }

    pub fn events(&self) -> &[EventData] {
        &self.events
    }

    /// Mutable access for alternate-line expansion. The event list itself
    /// cannot grow or shrink through this.
    pub fn events_mut(&mut self) -> &mut [EventData] {
        &mut self.events
    }
}
