//! Pure parsing of rendered HTML: event cards and the "all lines" modal.

use scraper::{ElementRef, Html, Selector};

use crate::config::Selectors;
use crate::error::{ScraperError, ScraperResult};
use crate::model::{EventData, MatchSpread, TeamData, TotalPoints};

/// Fragment selectors, compiled once per session
#[derive(Debug, Clone)]
pub struct FragmentSelectors {
    start_date: Selector,
    team_name: Selector,
    team_score: Selector,
    odds_row: Selector,
    line_group: Selector,
    line_label: Selector,
    line_price: Selector,
}

impl FragmentSelectors {
    pub fn compile(selectors: &Selectors) -> ScraperResult<Self> {
        Ok(Self {
            start_date: compile("start_date", &selectors.start_date)?,
            team_name: compile("team_name", &selectors.team_name)?,
            team_score: compile("team_score", &selectors.team_score)?,
            odds_row: compile("odds_row", &selectors.odds_row)?,
            line_group: compile("line_group", &selectors.line_group)?,
            line_label: compile("line_label", &selectors.line_label)?,
            line_price: compile("line_price", &selectors.line_price)?,
        })
    }
}

fn compile(name: &str, css: &str) -> ScraperResult<Selector> {
    Selector::parse(css)
        .map_err(|e| ScraperError::config(format!("Invalid selector {} '{}': {:?}", name, css, e)))
}

/// Rendered text of an element. Only the surrounding whitespace the markup
/// adds is dropped; inner text is kept verbatim.
fn element_text(element: &ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Event id from a card's `id` attribute, which reads `prefix|id`
pub fn parse_event_id(id_attr: Option<&str>) -> ScraperResult<String> {
    let attr = id_attr.ok_or_else(|| ScraperError::parse("Event fragment has no id attribute"))?;

    match attr.split('|').nth(1).map(str::trim) {
        Some(id) if !id.is_empty() => Ok(id.to_string()),
        _ => Err(ScraperError::parse(format!(
            "Event id attribute '{}' has no id segment",
            attr
        ))),
    }
}

/// Parse one event card into an event with base odds only
pub fn parse_event_fragment(
    id: String,
    html: &str,
    selectors: &FragmentSelectors,
) -> ScraperResult<EventData> {
    let fragment = Html::parse_fragment(html);

    let start_date = fragment
        .select(&selectors.start_date)
        .next()
        .map(|e| element_text(&e))
        .ok_or_else(|| ScraperError::parse(format!("Event {} has no start date", id)))?;

    let [home_name, away_name] = exactly_two(&fragment, &selectors.team_name, "team names", &id)?;
    let [home_score, away_score] = exactly_two(&fragment, &selectors.team_score, "scores", &id)?;

    if home_name.is_empty() || away_name.is_empty() {
        return Err(ScraperError::parse(format!("Event {} has an empty team name", id)));
    }

    let mut rows = fragment.select(&selectors.odds_row);
    let [home_spread, home_total, home_moneyline] = odds_cells(rows.next(), &id)?;
    let [away_spread, away_total, away_moneyline] = odds_cells(rows.next(), &id)?;

    Ok(EventData {
        id,
        start_date,
        teams: [
            TeamData::new(home_name, home_score, home_spread, home_total, home_moneyline),
            TeamData::new(away_name, away_score, away_spread, away_total, away_moneyline),
        ],
    })
}

fn exactly_two(fragment: &Html, selector: &Selector, what: &str, id: &str) -> ScraperResult<[String; 2]> {
    let values: Vec<String> = fragment.select(selector).map(|e| element_text(&e)).collect();

    <[String; 2]>::try_from(values).map_err(|values| {
        ScraperError::parse(format!("Event {} has {} {}, expected 2", id, values.len(), what))
    })
}

/// `(spread, total, moneyline)` from the element children of one odds row
fn odds_cells(row: Option<ElementRef<'_>>, id: &str) -> ScraperResult<[String; 3]> {
    let row = row.ok_or_else(|| ScraperError::parse(format!("Event {} is missing an odds row", id)))?;
    let cells: Vec<String> = row
        .children()
        .filter_map(ElementRef::wrap)
        .map(|cell| element_text(&cell))
        .collect();

    <[String; 3]>::try_from(cells).map_err(|cells| {
        ScraperError::parse(format!("Event {} odds row has {} cells, expected 3", id, cells.len()))
    })
}

/// Which alternate-line list a modal feeds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Spread,
    Total,
}

impl LineKind {
    /// The first control on a detail page opens spreads, every later one totals
    pub fn for_control(index: usize) -> Self {
        if index == 0 {
            LineKind::Spread
        } else {
            LineKind::Total
        }
    }
}

/// One alternates row: a label and a price per team, home first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlternateRow {
    pub labels: [String; 2],
    pub prices: [String; 2],
}

impl AlternateRow {
    pub fn apply(self, kind: LineKind, teams: &mut [TeamData; 2]) {
        let [home_label, away_label] = self.labels;
        let [home_price, away_price] = self.prices;

        for (team, (label, price)) in teams
            .iter_mut()
            .zip([(home_label, home_price), (away_label, away_price)])
        {
            match kind {
                LineKind::Spread => team.match_spreads.push(MatchSpread {
                    spread: label,
                    moneyline: price,
                }),
                LineKind::Total => team.total_points.push(TotalPoints {
                    total: label,
                    moneyline: price,
                }),
            }
        }
    }
}

/// What a rendered page holds for an open modal
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModalLines {
    /// Line groups found on the page; zero means the modal never rendered
    pub groups: usize,
    pub rows: Vec<AlternateRow>,
    /// Rows without exactly two labels and two prices
    pub malformed: usize,
}

/// Read the alternate lines out of the page while a modal is open
pub fn parse_modal_lines(page_html: &str, selectors: &FragmentSelectors) -> ModalLines {
    let document = Html::parse_document(page_html);
    let groups: Vec<ElementRef<'_>> = document.select(&selectors.line_group).collect();

    let mut lines = ModalLines {
        groups: groups.len(),
        ..ModalLines::default()
    };

    // First group is the primary line
    let Some(alternates) = groups.get(1) else {
        return lines;
    };

    for row in alternates.children().filter_map(ElementRef::wrap) {
        let labels: Vec<String> = row.select(&selectors.line_label).map(|e| element_text(&e)).collect();
        let prices: Vec<String> = row.select(&selectors.line_price).map(|e| element_text(&e)).collect();

        match (<[String; 2]>::try_from(labels), <[String; 2]>::try_from(prices)) {
            (Ok(labels), Ok(prices)) => lines.rows.push(AlternateRow { labels, prices }),
            _ => lines.malformed += 1,
        }
    }

    lines
}
