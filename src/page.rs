//! A loaded page: the live document, its environment, the listener table and
//! the controllers, plus the browser default actions that follow dispatch.

use kuchiki::NodeRef;
use serde::Serialize;

use crate::app::App;
use crate::config::ChromeConfig;
use crate::dom;
use crate::environment::{Environment, ScrollBehavior};
use crate::events::{Event, EventCx, Listeners, Outcome};
use crate::markup;
use crate::navigation::{self, NavVariant};
use crate::theme::{ColorScheme, Theme};
use crate::viewport::{Rect, ScrollBox};

#[derive(Debug, thiserror::Error)]
pub enum PageError {
    #[error("no element matches {0:?}")]
    NoMatch(String),
    #[error("serialize page: {0}")]
    Serialize(#[from] std::io::Error),
}

#[derive(Debug, Clone, Serialize)]
pub struct HeadingState {
    pub id: String,
    pub text: String,
    pub level: u8,
}

/// Observable chrome state of a page at one point in time.
#[derive(Debug, Clone, Serialize)]
pub struct ChromeState {
    pub theme: Option<Theme>,
    pub navigation: Option<NavVariant>,
    pub navigation_open: bool,
    pub scroll_locked: bool,
    pub open_dropdowns: usize,
    pub toc_hidden: bool,
    pub headings: Vec<HeadingState>,
    pub active_heading: Option<String>,
    pub scroll_y: f64,
}

pub struct Page {
    document: NodeRef,
    env: Environment,
    listeners: Listeners,
    app: Option<App>,
    touch_y: Option<f64>,
}

impl Page {
    /// Parses `html` and runs document-ready startup.
    pub fn load(html: &str, env: Environment, config: &ChromeConfig) -> Self {
        let document = markup::parse_document(html);
        let listeners = Listeners::default();
        let mut env = env;
        let app = App::start(&document, config, &mut env, &listeners);
        let mut page = Self {
            document,
            env,
            listeners,
            app: Some(app),
            touch_y: None,
        };
        // Observers report the initial state once, like the browser does.
        page.dispatch(Event::Scroll);
        page
    }

    pub fn document(&self) -> &NodeRef {
        &self.document
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    pub fn env_mut(&mut self) -> &mut Environment {
        &mut self.env
    }

    pub fn app(&self) -> Option<&App> {
        self.app.as_ref()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn take_trace(&mut self) -> Vec<String> {
        self.env.take_trace()
    }

    pub fn select(&self, selector: &str) -> Result<NodeRef, PageError> {
        dom::select_first(&self.document, selector)
            .ok_or_else(|| PageError::NoMatch(selector.to_string()))
    }

    pub fn has_class(&self, selector: &str, class: &str) -> bool {
        dom::select_first(&self.document, selector).is_some_and(|n| dom::has_class(&n, class))
    }

    pub fn attr(&self, selector: &str, name: &str) -> Option<String> {
        dom::select_first(&self.document, selector).and_then(|n| dom::attr(&n, name))
    }

    pub fn html(&self) -> Result<String, PageError> {
        Ok(markup::serialize(&self.document)?)
    }

    /// Drops every controller, which unregisters all of their listeners.
    pub fn teardown(&mut self) {
        self.app = None;
    }

    pub fn click(&mut self, selector: &str) -> Result<Outcome, PageError> {
        let target = self.select(selector)?;
        Ok(self.click_node(&target))
    }

    pub fn click_node(&mut self, target: &NodeRef) -> Outcome {
        self.dispatch(Event::Click {
            target: target.clone(),
        })
    }

    pub fn key_down(&mut self, key: &str) -> Outcome {
        self.dispatch(Event::KeyDown {
            key: key.to_string(),
        })
    }

    pub fn wheel(&mut self, selector: &str, delta_y: f64) -> Result<Outcome, PageError> {
        let target = self.select(selector)?;
        Ok(self.dispatch(Event::Wheel { target, delta_y }))
    }

    pub fn touch_start(&mut self, selector: &str, client_y: f64) -> Result<Outcome, PageError> {
        let target = self.select(selector)?;
        Ok(self.dispatch(Event::TouchStart { target, client_y }))
    }

    pub fn touch_move(&mut self, selector: &str, client_y: f64) -> Result<Outcome, PageError> {
        let target = self.select(selector)?;
        Ok(self.dispatch(Event::TouchMove { target, client_y }))
    }

    /// The visitor scrolls the page directly (scrollbar, keyboard).
    pub fn scroll_to(&mut self, y: f64) {
        self.scroll_page(y);
    }

    pub fn set_system_scheme(&mut self, scheme: ColorScheme) -> Outcome {
        self.env.color_scheme = Some(scheme);
        self.dispatch(Event::ColorSchemeChange(scheme))
    }

    /// Returns the new theme, or `None` once the page is torn down.
    pub fn toggle_theme(&mut self) -> Option<Theme> {
        let app = self.app.as_mut()?;
        app.theme.toggle_theme(&mut self.env);
        Some(app.theme.theme())
    }

    pub fn set_rect(&mut self, selector: &str, rect: Rect) -> Result<(), PageError> {
        let node = self.select(selector)?;
        self.env.layout.set_rect(&node, rect);
        Ok(())
    }

    pub fn set_scroll_box(&mut self, selector: &str, scroll_box: ScrollBox) -> Result<(), PageError> {
        let node = self.select(selector)?;
        self.env.layout.set_scroll_box(&node, scroll_box);
        Ok(())
    }

    pub fn scroll_locked(&self) -> bool {
        dom::select_first(&self.document, "body").is_some_and(|b| navigation::is_scroll_locked(&b))
    }

    pub fn state(&self) -> ChromeState {
        let app = self.app.as_ref();
        let nav = app.and_then(|a| a.navigation.as_ref());
        let toc = app.and_then(|a| a.toc.as_ref());
        ChromeState {
            theme: app.map(|a| a.theme.theme()),
            navigation: nav.map(|n| n.variant()),
            navigation_open: nav.is_some_and(|n| n.is_open()),
            scroll_locked: self.scroll_locked(),
            open_dropdowns: app
                .and_then(|a| a.dropdowns.as_ref())
                .map_or(0, |d| d.open_count()),
            toc_hidden: toc.is_some_and(|t| t.is_hidden()),
            headings: toc
                .map(|t| {
                    t.entries()
                        .iter()
                        .map(|e| HeadingState {
                            id: e.id.clone(),
                            text: e.text.clone(),
                            level: e.level,
                        })
                        .collect()
                })
                .unwrap_or_default(),
            active_heading: toc.and_then(|t| t.active()).map(|e| e.id.clone()),
            scroll_y: self.env.viewport.scroll_y,
        }
    }

    pub fn dispatch(&mut self, event: Event) -> Outcome {
        let requests_before = self.env.scroll_requests.len();
        let mut cx = EventCx::new(&mut self.env);
        if let Some(app) = self.app.as_mut() {
            for level in self.listeners.propagation_path(&event) {
                for route in level {
                    app.handle(route, &event, &mut cx);
                }
                if cx.outcome().propagation_stopped {
                    break;
                }
            }
        }
        let outcome = cx.outcome();

        if !outcome.default_prevented {
            self.default_action(&event, outcome);
        }
        if let Some(request) = self.env.scroll_requests[requests_before..].last().copied() {
            self.scroll_page(request.top);
        }
        outcome
    }

    fn default_action(&mut self, event: &Event, outcome: Outcome) {
        match event {
            Event::Click { target } => self.follow_link(target),
            Event::Wheel { target, delta_y } => {
                self.scroll_gesture(target, *delta_y, outcome.propagation_stopped);
            }
            Event::TouchStart { client_y, .. } => self.touch_y = Some(*client_y),
            Event::TouchMove { target, client_y } => {
                if let Some(last) = self.touch_y.replace(*client_y) {
                    self.scroll_gesture(target, last - *client_y, outcome.propagation_stopped);
                }
            }
            Event::KeyDown { .. } | Event::Scroll | Event::ColorSchemeChange(_) => {}
        }
    }

    fn follow_link(&mut self, target: &NodeRef) {
        let Some(link) = dom::closest(target, "a[href]") else {
            return;
        };
        let Some(href) = dom::attr(&link, "href") else {
            return;
        };
        tracing::debug!(%href, "following link");
        self.env.navigations.push(href.clone());

        let Some(fragment) = href.strip_prefix('#').filter(|f| !f.is_empty()) else {
            return;
        };
        let anchor = dom::select_all(&self.document, "[id]")
            .into_iter()
            .find(|n| dom::attr(n, "id").as_deref() == Some(fragment));
        if let Some(rect) = anchor.and_then(|a| self.env.layout.rect(&a)) {
            self.env.request_scroll(rect.top, ScrollBehavior::Instant);
        }
    }

    /// A gesture whose propagation was stopped scrolls the innermost
    /// scrollable element; otherwise it scrolls the page.
    fn scroll_gesture(&mut self, target: &NodeRef, delta_y: f64, contained: bool) {
        if contained {
            if let Some(scroll_box) = self.env.layout.nearest_scroll_box_mut(target) {
                scroll_box.scroll_by(delta_y);
            }
            return;
        }
        if self.scroll_locked() {
            return;
        }
        self.scroll_page(self.env.viewport.scroll_y + delta_y);
    }

    fn scroll_page(&mut self, y: f64) {
        let y = self.env.viewport.clamp_scroll(y);
        if y == self.env.viewport.scroll_y {
            return;
        }
        self.env.viewport.scroll_y = y;
        self.dispatch(Event::Scroll);
    }
}
