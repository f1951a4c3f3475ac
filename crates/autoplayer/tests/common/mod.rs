//! Scripted in-memory browser page for driving the handlers without Chrome.
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use autoplayer::browser::{BrowserPage, ClickKind};
use autoplayer::config::NavigationSettings;
use autoplayer::html;
use autoplayer::pages::SitePage;
use autoplayer::{AutoplayerError, Selector};
use once_cell::sync::Lazy;
use regex::Regex;

static CSS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([a-zA-Z]*)(?:#([\w-]+))?(?:\.([\w-]+))?((?:\[[^\]]+\])*)$").unwrap()
});
static CSS_ATTR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\[\s*([\w-]+)\s*=\s*['"]([^'"]*)['"]\s*\]"#).unwrap());
static QUOTED_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"'([^']*)'").unwrap());

pub const NOT_FOUND_HTML: &str = "<html><body>Not Found</body></html>";

#[derive(Default)]
struct FakeState {
    url: String,
    html: String,
    /// Pages served per URL; the last one stays once the queue is drained
    routes: HashMap<String, VecDeque<String>>,
    /// Selector (display form) -> URL the click navigates to
    clicks: HashMap<String, String>,
    /// Remaining timeouts to return for a URL before it loads
    failures: HashMap<String, u32>,
    visited: Vec<String>,
    clicked: Vec<(String, ClickKind)>,
    filled: Vec<(String, String)>,
    popup: Option<Arc<FakePage>>,
}

pub struct FakePage {
    state: Mutex<FakeState>,
}

impl FakePage {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(FakeState::default()),
        })
    }

    pub fn route(&self, url: &str, page_html: impl Into<String>) -> &Self {
        self.state
            .lock()
            .unwrap()
            .routes
            .entry(url.to_string())
            .or_default()
            .push_back(page_html.into());
        self
    }

    pub fn on_click(&self, selector: impl Into<Selector>, target_url: &str) -> &Self {
        self.state
            .lock()
            .unwrap()
            .clicks
            .insert(selector.into().to_string(), target_url.to_string());
        self
    }

    pub fn fail_times(&self, url: &str, times: u32) -> &Self {
        self.state
            .lock()
            .unwrap()
            .failures
            .insert(url.to_string(), times);
        self
    }

    pub fn set_popup(&self, popup: Arc<FakePage>) {
        self.state.lock().unwrap().popup = Some(popup);
    }

    /// Show a page without going through a route.
    pub fn show(&self, url: &str, page_html: impl Into<String>) {
        let mut state = self.state.lock().unwrap();
        state.url = url.to_string();
        state.html = page_html.into();
    }

    pub fn visited(&self) -> Vec<String> {
        self.state.lock().unwrap().visited.clone()
    }

    pub fn clicked(&self) -> Vec<(String, ClickKind)> {
        self.state.lock().unwrap().clicked.clone()
    }

    pub fn filled(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().filled.clone()
    }

    pub fn current_html(&self) -> String {
        self.state.lock().unwrap().html.clone()
    }

    fn navigate(&self, url: &str) -> Result<(), AutoplayerError> {
        let mut state = self.state.lock().unwrap();
        state.visited.push(url.to_string());

        if let Some(remaining) = state.failures.get_mut(url) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(AutoplayerError::Timeout(format!("load of {url}")));
            }
        }

        let page_html = if url == "about:blank" {
            String::new()
        } else {
            match state.routes.get_mut(url) {
                Some(queue) if queue.len() > 1 => queue.pop_front().unwrap_or_default(),
                Some(queue) => queue.front().cloned().unwrap_or_default(),
                None => NOT_FOUND_HTML.to_string(),
            }
        };
        state.url = url.to_string();
        state.html = page_html;
        Ok(())
    }

    fn count_matches(&self, selector: &Selector) -> usize {
        let page_html = self.current_html();
        match selector {
            Selector::Css(css) => count_css(&page_html, css),
            Selector::Text(text) => page_html.matches(&format!(">{text}<")).count(),
            Selector::XPath(xpath) => QUOTED_RE
                .captures(xpath)
                .map(|caps| page_html.matches(&caps[1]).count())
                .unwrap_or(0),
            Selector::Invalid(_) => 0,
        }
    }
}

fn count_css(page_html: &str, css: &str) -> usize {
    let Some(caps) = CSS_RE.captures(css.trim()) else {
        return 0;
    };
    let name = caps.get(1).map(|m| m.as_str()).filter(|n| !n.is_empty());
    let id = caps.get(2).map(|m| m.as_str());
    let class = caps.get(3).map(|m| m.as_str());
    let attrs: Vec<(String, String)> = CSS_ATTR_RE
        .captures_iter(caps.get(4).map_or("", |m| m.as_str()))
        .map(|a| (a[1].to_string(), a[2].to_string()))
        .collect();

    html::tags(page_html, name)
        .iter()
        .filter(|tag| id.map_or(true, |id| tag.attr("id") == Some(id)))
        .filter(|tag| class.map_or(true, |class| tag.has_class(class)))
        .filter(|tag| attrs.iter().all(|(k, v)| tag.matches(k, v)))
        .count()
}

#[async_trait::async_trait]
impl BrowserPage for FakePage {
    async fn goto(&self, url: &str, _timeout: Duration) -> Result<(), AutoplayerError> {
        self.navigate(url)
    }

    async fn reload(&self, _timeout: Duration) -> Result<(), AutoplayerError> {
        let url = self.state.lock().unwrap().url.clone();
        self.navigate(&url)
    }

    async fn content(&self) -> Result<String, AutoplayerError> {
        Ok(self.current_html())
    }

    async fn url(&self) -> Result<String, AutoplayerError> {
        Ok(self.state.lock().unwrap().url.clone())
    }

    async fn evaluate(&self, _script: &str) -> Result<serde_json::Value, AutoplayerError> {
        Ok(serde_json::Value::Null)
    }

    async fn count(&self, selector: &Selector) -> Result<usize, AutoplayerError> {
        Ok(self.count_matches(selector))
    }

    async fn click(
        &self,
        selector: &Selector,
        kind: ClickKind,
        _wait_for_navigation: Option<Duration>,
    ) -> Result<(), AutoplayerError> {
        if self.count_matches(selector) == 0 {
            return Err(AutoplayerError::ElementNotFound(selector.to_string()));
        }
        let target = {
            let mut state = self.state.lock().unwrap();
            state.clicked.push((selector.to_string(), kind));
            state.clicks.get(&selector.to_string()).cloned()
        };
        match target {
            Some(url) => self.navigate(&url),
            None => Ok(()),
        }
    }

    async fn fill(&self, selector: &Selector, text: &str) -> Result<(), AutoplayerError> {
        if self.count_matches(selector) == 0 {
            return Err(AutoplayerError::ElementNotFound(selector.to_string()));
        }
        self.state
            .lock()
            .unwrap()
            .filled
            .push((selector.to_string(), text.to_string()));
        Ok(())
    }

    async fn click_expect_popup(
        &self,
        selector: &Selector,
        _timeout: Duration,
    ) -> Result<Arc<dyn BrowserPage>, AutoplayerError> {
        self.click(selector, ClickKind::Native, None).await?;
        let popup = self.state.lock().unwrap().popup.clone();
        popup
            .map(|p| p as Arc<dyn BrowserPage>)
            .ok_or_else(|| AutoplayerError::Timeout("no popup opened".to_string()))
    }
}

/// Retry budgets of the real bot with no waiting.
pub fn fast_settings() -> NavigationSettings {
    NavigationSettings {
        navigation_timeout: Duration::from_millis(300),
        settle_delay: Duration::ZERO,
        ..NavigationSettings::default()
    }
}

pub fn site(page: &Arc<FakePage>) -> SitePage {
    SitePage::new(page.clone(), fast_settings())
}

// Page fixtures

pub const GAME: &str = "https://www.neopets.com/games/nq2/nq2.phtml";

pub fn overworld_html(coords: &str) -> String {
    format!(
        r##"<html><body><div class="contentModule phpGamesNonPortalView">
        <table><tr><td onmouseover="coords({coords})"><img src="//images.neopets.com/nq2/t/lp.gif"></td></tr></table>
        <img src="//images.neopets.com/nq2/x/nav.gif" usemap="#navmap" border="0">
        <map name="navmap">
          <area shape="poly" alt="North" coords="10,0,30,20" href="javascript:dosub(1);">
          <area shape="poly" alt="South" href="javascript:dosub(2);">
          <area shape="poly" alt="West" href="javascript:dosub(3);">
          <area shape="poly" alt="East" href="javascript:dosub(4);">
          <area shape="poly" alt="Northwest" href="javascript:dosub(5);">
          <area shape="poly" alt="Southwest" href="javascript:dosub(6);">
          <area shape="poly" alt="Northeast" href="javascript:dosub(7);">
          <area shape="poly" alt="Southeast" href="javascript:dosub(8);">
        </map>
        <a href="nq2.phtml?act=travel&mode=1">Normal</a> <a href="nq2.phtml?act=travel&mode=2">Hunting</a>
        </div></body></html>"##
    )
}

pub fn battle_start_html() -> String {
    r#"<html><body><div class="contentModule phpGamesNonPortalView">
    <b>You are attacked by a Plains Lupe!</b><br>
    <a href="nq2.phtml?start=1"><img src="//images.neopets.com/nq2/x/com_begin.gif" alt="Begin the Fight!" border="0"></a>
    </div></body></html>"#
        .to_string()
}

/// A battle screen. `party` and `enemies` are `(name, current, max)`.
fn battle_html(party: &[(&str, i32, i32)], enemies: &[(&str, i32, i32)], controls: &str) -> String {
    let party_cells: String = party
        .iter()
        .map(|(name, cur, max)| {
            format!("<td><b>{name}</b><br><font size=1>{cur}/{max}</font></td>")
        })
        .collect();
    let enemy_cells: String = enemies
        .iter()
        .map(|(name, cur, max)| format!("<td>{name}<br><font size=1>{cur}/{max}</font></td>"))
        .collect();
    format!(
        r##"<html><body><div class="contentModule phpGamesNonPortalView">
        <table><tr>{party_cells}</tr><tr>{enemy_cells}</tr></table>
        {controls}
        </div></body></html>"##
    )
}

pub fn player_turn_html(
    actor: u8,
    party: &[(&str, i32, i32)],
    enemies: &[(&str, i32, i32)],
    potions: &[(u32, &str)],
) -> String {
    let options: String = potions
        .iter()
        .map(|(id, name)| format!(r#"<option value="{id}">{name} (1)</option>"#))
        .collect();
    battle_html(
        party,
        enemies,
        &format!(
            r#"<form name="ff"><input type="hidden" name="nxactor" value="{actor}">
            <img src="//images.neopets.com/nq2/x/com_atk.gif"> <img src="//images.neopets.com/nq2/x/com_flee.gif">
            <select name="use_id">{options}</select></form>"#
        ),
    )
}

pub fn enemy_turn_html(
    enemy: u8,
    party: &[(&str, i32, i32)],
    enemies: &[(&str, i32, i32)],
) -> String {
    battle_html(
        party,
        enemies,
        &format!(
            r#"<form name="ff"><input type="hidden" name="nxactor" value="{enemy}">
            <img src="//images.neopets.com/nq2/x/com_next.gif"></form>"#
        ),
    )
}

pub fn battle_over_html() -> String {
    r#"<html><body><div class="contentModule phpGamesNonPortalView">
    <b>You have won this fight!</b>
    <img src="//images.neopets.com/nq2/x/com_end.gif">
    <a href="nq2.phtml?finish=1">Click here to return to the map</a>
    </div></body></html>"#
        .to_string()
}

pub fn command_url(target: i32, fact: u8, parm: &str, use_id: &str, actor: u8) -> String {
    format!("{GAME}?target={target}&fact={fact}&parm={parm}&use_id={use_id}&nxactor={actor}")
}

pub fn movement_url(direction: u8) -> String {
    format!("{GAME}?act=move&dir={direction}")
}

/// Wire a direction-pad click to a movement URL that serves `pages` in order.
pub fn route_step(page: &FakePage, alt: &str, direction: u8, pages: &[String]) {
    let url = movement_url(direction);
    page.on_click(format!("area[alt=\"{alt}\"]"), &url);
    for page_html in pages {
        page.route(&url, page_html.clone());
    }
}

/// Wire the start button, an attack turn and the return link for a one-turn
/// battle that ends on `map_html`.
pub fn route_one_turn_battle(page: &FakePage, map_html: &str) {
    page.on_click("img[alt='Begin the Fight!']", &format!("{GAME}?start=1"));
    page.route(
        &format!("{GAME}?start=1"),
        player_turn_html(1, &[("Rohane", 60, 60)], &[("Plains Lupe", 12, 12)], &[]),
    );
    page.route(&command_url(5, 3, "", "-1", 1), battle_over_html());
    page.on_click("a[href='nq2.phtml?finish=1']", &format!("{GAME}?finish=1"));
    page.route(&format!("{GAME}?finish=1"), map_html.to_string());
}
