use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::ser::PrettyFormatter;

use crate::error::{ScraperError, ScraperResult};
use crate::model::LeagueEventsList;

/// Leagues keyed by name, in the order they were first seen
struct LeagueDocument<'a> {
    entries: Vec<&'a LeagueEventsList>,
}

impl<'a> LeagueDocument<'a> {
    /// A repeated league name replaces the earlier value but keeps its position
    fn new(leagues: &'a [LeagueEventsList]) -> Self {
        let mut entries: Vec<&'a LeagueEventsList> = Vec::with_capacity(leagues.len());
        for league in leagues {
            match entries
                .iter()
                .position(|existing| existing.league_name() == league.league_name())
            {
                Some(index) => entries[index] = league,
                None => entries.push(league),
            }
        }
        Self { entries }
    }

    fn event_count(&self) -> usize {
        self.entries.iter().map(|league| league.events().len()).sum()
    }
}

impl Serialize for LeagueDocument<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for league in &self.entries {
            map.serialize_entry(league.league_name(), league)?;
        }
        map.end()
    }
}

/// Rendered document plus what went into it
pub(super) struct Rendered {
    pub bytes: Vec<u8>,
    pub leagues: usize,
    pub events: usize,
}

/// Serialize leagues as one JSON object, four-space indented, no trailing newline
pub(super) fn render_leagues(leagues: &[LeagueEventsList]) -> ScraperResult<Rendered> {
    let document = LeagueDocument::new(leagues);

    let mut bytes = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut bytes, PrettyFormatter::with_indent(b"    "));
    document
        .serialize(&mut serializer)
        .map_err(|e| ScraperError::export(format!("Serialization failed: {}", e)))?;

    Ok(Rendered {
        leagues: document.entries.len(),
        events: document.event_count(),
        bytes,
    })
}
