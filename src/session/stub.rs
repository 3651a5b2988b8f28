//! Scripted in-memory site for exercising the stages without a browser.

use async_trait::async_trait;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use super::{BrowserSession, SessionLauncher};
use crate::config::{ProxyEntry, Selectors};
use crate::error::{ScraperError, ScraperResult};

pub const STUB_BASE_URL: &str = "https://sportsbook.test";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StubElement {
    StartupModalClose,
    CategoryButton,
    League(usize),
    EventsContainer(usize),
    Event(usize, usize),
    LinesControl(usize),
}

#[derive(Debug, Clone)]
pub struct StubEvent {
    pub id_attr: Option<String>,
    pub html: String,
}

#[derive(Debug, Clone)]
pub struct StubLeague {
    pub name: String,
    pub has_container: bool,
    pub events: Vec<StubEvent>,
}

#[derive(Debug, Clone)]
pub struct StubModal {
    pub html: String,
    pub closable: bool,
}

#[derive(Debug, Clone)]
pub struct StubSite {
    pub base_url: String,
    pub startup_modal: bool,
    pub category_present: bool,
    pub leagues: Vec<StubLeague>,
    /// Detail pages by URL; any other URL redirects home
    pub detail_pages: HashMap<String, Vec<StubModal>>,
    pub unreachable: Vec<String>,
    /// `(league, event)` cards whose markup the driver cannot read
    pub detached: Vec<(usize, usize)>,
}

impl Default for StubSite {
    fn default() -> Self {
        Self {
            base_url: STUB_BASE_URL.to_string(),
            startup_modal: false,
            category_present: true,
            leagues: Vec::new(),
            detail_pages: HashMap::new(),
            unreachable: Vec::new(),
            detached: Vec::new(),
        }
    }
}

impl StubSite {
    pub fn with_league(mut self, name: &str, events: Vec<StubEvent>) -> Self {
        self.leagues.push(StubLeague {
            name: name.to_string(),
            has_container: true,
            events,
        });
        self
    }

    pub fn with_detail_page(mut self, url: &str, modals: Vec<StubModal>) -> Self {
        self.detail_pages.insert(url.to_string(), modals);
        self
    }
}

/// `(name, score, spread, total, moneyline)` for one side of an event card
pub type TeamRow<'a> = (&'a str, &'a str, &'a str, &'a str, &'a str);

/// Event card markup in the layout the default selectors expect
pub fn event_card(id_attr: &str, start_date: &str, home: TeamRow, away: TeamRow) -> StubEvent {
    let odds_row = |team: TeamRow| {
        format!(
            r#"<div class="flex items-center gap-2 pt-2 w-[53%]"><button>{}</button> <button>{}</button> <button>{}</button></div>"#,
            team.2, team.3, team.4
        )
    };

    let html = format!(
        r#"<div class="flex justify-between"><span class="mr-2">{date}</span><span>More wagers</span></div>
<div class="flex">
  <div><div class="text-primary text-description text-primary">{home_name}</div><div class="text-subdued-primary mt-0.5 text-footnote">{home_score}</div></div>
  <div><div class="text-primary text-description text-primary">{away_name}</div><div class="text-subdued-primary mt-0.5 text-footnote">{away_score}</div></div>
</div>
{home_odds}
{away_odds}"#,
        date = start_date,
        home_name = home.0,
        home_score = home.1,
        away_name = away.0,
        away_score = away.1,
        home_odds = odds_row(home),
        away_odds = odds_row(away),
    );

    StubEvent {
        id_attr: Some(id_attr.to_string()),
        html,
    }
}

/// "All lines" modal: a primary group followed by the alternates group.
/// Each alternate row is `(label_home, price_home, label_away, price_away)`.
pub fn lines_modal(alternates: &[(&str, &str, &str, &str)], closable: bool) -> StubModal {
    let row = |(label_home, price_home, label_away, price_away): &(&str, &str, &str, &str)| {
        format!(
            r#"<div class="flex"><button><span class="font-medium text-selector-label-deselected">{}</span><span class="font-bold">{}</span></button><button><span class="font-medium text-selector-label-deselected">{}</span><span class="font-bold">{}</span></button></div>"#,
            label_home, price_home, label_away, price_away
        )
    };

    let html = format!(
        r#"<div role="dialog">
<div class="bg-card-primary flex flex-col gap-4">{primary}</div>
<div class="bg-card-primary flex flex-col gap-4">{alternates}</div>
<button aria-label="Close">x</button>
</div>"#,
        primary = row(&("PRIMARY", "-110", "PRIMARY", "-110")),
        alternates = alternates.iter().map(row).collect::<Vec<_>>().join(""),
    );

    StubModal { html, closable }
}

/// Everything the session did, shared so tests can inspect it after the
/// session has been moved into a stage or closed
#[derive(Debug, Default)]
pub struct Journal {
    pub navigations: Vec<String>,
    pub control_clicks: Vec<(String, usize)>,
    pub close_attempts: usize,
    pub startup_dismissed: bool,
    pub closed: bool,
}

pub struct StubSession {
    site: StubSite,
    selectors: Selectors,
    journal: Rc<RefCell<Journal>>,
    current_url: String,
    category_open: bool,
    selected_league: Option<usize>,
    open_modal: Option<usize>,
    startup_modal_open: bool,
}

impl StubSession {
    pub fn new(site: StubSite) -> Self {
        Self::with_journal(site, Rc::new(RefCell::new(Journal::default())))
    }

    pub fn with_journal(site: StubSite, journal: Rc<RefCell<Journal>>) -> Self {
        Self {
            current_url: site.base_url.clone(),
            startup_modal_open: site.startup_modal,
            site,
            selectors: Selectors::default(),
            journal,
            category_open: false,
            selected_league: None,
            open_modal: None,
        }
    }

    pub fn journal(&self) -> Rc<RefCell<Journal>> {
        self.journal.clone()
    }

    fn on_home(&self) -> bool {
        self.current_url == self.site.base_url
    }

    fn modals(&self) -> Option<&Vec<StubModal>> {
        self.site.detail_pages.get(&self.current_url)
    }

    fn timed_out(selector: &str, timeout: Duration) -> ScraperError {
        ScraperError::timeout(selector, timeout)
    }
}

#[async_trait(?Send)]
impl BrowserSession for StubSession {
    type Element = StubElement;

    async fn navigate(&mut self, url: &str, timeout: Duration) -> ScraperResult<()> {
        self.journal.borrow_mut().navigations.push(url.to_string());
        if self.site.unreachable.iter().any(|u| u == url) {
            return Err(Self::timed_out(url, timeout));
        }

        self.category_open = false;
        self.selected_league = None;
        self.open_modal = None;
        self.current_url = if url == self.site.base_url || self.site.detail_pages.contains_key(url) {
            url.to_string()
        } else {
            self.site.base_url.clone()
        };
        Ok(())
    }

    async fn current_url(&self) -> ScraperResult<String> {
        Ok(self.current_url.clone())
    }

    async fn wait_for(&self, selector: &str, timeout: Duration) -> ScraperResult<StubElement> {
        let s = &self.selectors;
        let found = if selector == s.startup_modal_close {
            self.startup_modal_open.then_some(StubElement::StartupModalClose)
        } else if selector == s.sport_category {
            (self.on_home() && self.site.category_present).then_some(StubElement::CategoryButton)
        } else if selector == s.events_container {
            self.selected_league
                .filter(|&i| self.site.leagues[i].has_container)
                .map(StubElement::EventsContainer)
        } else if selector == s.all_lines_button {
            self.modals()
                .filter(|modals| !modals.is_empty())
                .map(|_| StubElement::LinesControl(0))
        } else {
            return Err(ScraperError::NotFound { selector: selector.to_string() });
        };

        found.ok_or_else(|| Self::timed_out(selector, timeout))
    }

    async fn query_all(&self, selector: &str) -> ScraperResult<Vec<StubElement>> {
        let s = &self.selectors;
        if selector == s.league_menu_item && self.category_open {
            Ok((0..self.site.leagues.len()).map(StubElement::League).collect())
        } else if selector == s.all_lines_button {
            let count = self.modals().map(Vec::len).unwrap_or(0);
            Ok((0..count).map(StubElement::LinesControl).collect())
        } else {
            Ok(Vec::new())
        }
    }

    async fn query_all_in(&self, parent: &StubElement, selector: &str) -> ScraperResult<Vec<StubElement>> {
        match parent {
            StubElement::EventsContainer(league) if selector == self.selectors.event_card => {
                let count = self.site.leagues[*league].events.len();
                Ok((0..count).map(|event| StubElement::Event(*league, event)).collect())
            }
            _ => Ok(Vec::new()),
        }
    }

    async fn click(&mut self, element: &StubElement, timeout: Duration) -> ScraperResult<()> {
        match element {
            StubElement::StartupModalClose => {
                self.startup_modal_open = false;
                self.journal.borrow_mut().startup_dismissed = true;
            }
            StubElement::CategoryButton => self.category_open = true,
            StubElement::League(index) => self.selected_league = Some(*index),
            StubElement::LinesControl(index) => {
                self.journal
                    .borrow_mut()
                    .control_clicks
                    .push((self.current_url.clone(), *index));
                // A modal left open covers the controls
                if self.open_modal.is_some() {
                    return Err(Self::timed_out("all lines control", timeout));
                }
                self.open_modal = Some(*index);
            }
            StubElement::EventsContainer(_) | StubElement::Event(..) => {}
        }
        Ok(())
    }

    async fn click_selector(&mut self, selector: &str, timeout: Duration) -> ScraperResult<()> {
        if selector != self.selectors.modal_close {
            return Err(ScraperError::NotFound { selector: selector.to_string() });
        }

        self.journal.borrow_mut().close_attempts += 1;
        let closable = match (self.open_modal, self.modals()) {
            (Some(index), Some(modals)) => modals[index].closable,
            _ => false,
        };
        if !closable {
            return Err(Self::timed_out(selector, timeout));
        }
        self.open_modal = None;
        Ok(())
    }

    async fn text_content(&self, element: &StubElement) -> ScraperResult<String> {
        match element {
            StubElement::League(index) => Ok(self.site.leagues[*index].name.clone()),
            _ => Ok(String::new()),
        }
    }

    async fn attribute(&self, element: &StubElement, name: &str) -> ScraperResult<Option<String>> {
        match element {
            StubElement::Event(league, event) if name == "id" => {
                Ok(self.site.leagues[*league].events[*event].id_attr.clone())
            }
            _ => Ok(None),
        }
    }

    async fn inner_html(&self, element: &StubElement) -> ScraperResult<String> {
        match element {
            StubElement::Event(league, event) if self.site.detached.contains(&(*league, *event)) => {
                Err(ScraperError::browser("element is not attached to the DOM"))
            }
            StubElement::Event(league, event) => Ok(self.site.leagues[*league].events[*event].html.clone()),
            _ => Ok(String::new()),
        }
    }

    async fn page_html(&self) -> ScraperResult<String> {
        let modal = match (self.open_modal, self.modals()) {
            (Some(index), Some(modals)) => modals[index].html.as_str(),
            _ => "",
        };
        Ok(format!("<html><body><main></main>{}</body></html>", modal))
    }

    async fn close(&mut self) -> ScraperResult<()> {
        self.journal.borrow_mut().closed = true;
        Ok(())
    }
}

/// Hands out stub sessions and records which proxy each launch received
pub struct StubLauncher {
    pub site: StubSite,
    pub fail_launch: bool,
    pub launches: Rc<RefCell<Vec<Option<String>>>>,
    pub journal: Rc<RefCell<Journal>>,
}

impl StubLauncher {
    pub fn new(site: StubSite) -> Self {
        Self {
            site,
            fail_launch: false,
            launches: Rc::new(RefCell::new(Vec::new())),
            journal: Rc::new(RefCell::new(Journal::default())),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_launch: true,
            ..Self::new(StubSite::default())
        }
    }
}

#[async_trait(?Send)]
impl SessionLauncher for StubLauncher {
    type Session = StubSession;

    async fn launch(&self, proxy: Option<&ProxyEntry>) -> ScraperResult<StubSession> {
        self.launches.borrow_mut().push(proxy.map(|p| p.host.clone()));
        if self.fail_launch {
            return Err(ScraperError::setup("stub browser refused to start"));
        }
        Ok(StubSession::with_journal(self.site.clone(), self.journal.clone()))
    }
}
