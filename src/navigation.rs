use kuchiki::NodeRef;
use serde::Serialize;

use crate::config::NavigationConfig;
use crate::dom;
use crate::environment::Environment;
use crate::events::{Event, EventCx, EventKind, ListenTarget, ListenerGuard, Listeners, Route};

const ACTIVE: &str = "active";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NavVariant {
    /// Hamburger toggles a menu rendered in the page flow.
    Inline,
    /// Hamburger opens a slide-in panel over a dimming overlay.
    Overlay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavRoute {
    Trigger,
    Close,
    Overlay,
    Link,
    Escape,
    OutsideClick,
}

pub struct NavigationController {
    variant: NavVariant,
    trigger: NodeRef,
    panel: NodeRef,
    overlay: Option<NodeRef>,
    body: Option<NodeRef>,
    /// Body `style` attribute from before the scroll lock, while locked.
    saved_body_style: Option<Option<String>>,
    _guards: Vec<ListenerGuard>,
}

impl NavigationController {
    /// Returns `None` when the page has no hamburger or nothing for it to open.
    pub fn attach(
        document: &NodeRef,
        config: &NavigationConfig,
        skip_links: &str,
        env: &mut Environment,
        listeners: &Listeners,
    ) -> Option<Self> {
        let trigger = dom::select_first(document, &config.hamburger)?;
        let side_panel = dom::select_first(document, &config.side_panel);
        let overlay = dom::select_first(document, &config.overlay);

        let (variant, panel, overlay) = match (side_panel, overlay) {
            (Some(panel), Some(overlay)) => (NavVariant::Overlay, panel, Some(overlay)),
            _ => {
                let menu = dom::select_first(document, &config.inline_menu)?;
                (NavVariant::Inline, menu, None)
            }
        };

        let mut guards = vec![
            listeners.on(
                ListenTarget::Node(trigger.clone()),
                EventKind::Click,
                Route::Nav(NavRoute::Trigger),
            ),
            listeners.on(
                ListenTarget::Document,
                EventKind::KeyDown,
                Route::Nav(NavRoute::Escape),
            ),
        ];
        // Links that only open a submenu must not close the panel.
        for link in dom::select_within(&panel, "a") {
            if dom::matches(&link, skip_links) {
                continue;
            }
            guards.push(listeners.on(
                ListenTarget::Node(link),
                EventKind::Click,
                Route::Nav(NavRoute::Link),
            ));
        }
        match variant {
            NavVariant::Inline => guards.push(listeners.on(
                ListenTarget::Document,
                EventKind::Click,
                Route::Nav(NavRoute::OutsideClick),
            )),
            NavVariant::Overlay => {
                if let Some(close) = dom::select_first(&panel, &config.close) {
                    guards.push(listeners.on(
                        ListenTarget::Node(close),
                        EventKind::Click,
                        Route::Nav(NavRoute::Close),
                    ));
                }
                if let Some(overlay) = &overlay {
                    guards.push(listeners.on(
                        ListenTarget::Node(overlay.clone()),
                        EventKind::Click,
                        Route::Nav(NavRoute::Overlay),
                    ));
                }
            }
        }

        env.trace(format!("nav:attach {}", variant_name(variant)));
        tracing::debug!(variant = variant_name(variant), "navigation attached");
        Some(Self {
            variant,
            trigger,
            panel,
            overlay,
            body: dom::select_first(document, "body"),
            saved_body_style: None,
            _guards: guards,
        })
    }

    pub fn variant(&self) -> NavVariant {
        self.variant
    }

    pub fn is_open(&self) -> bool {
        dom::has_class(&self.panel, ACTIVE)
    }

    pub fn handle(&mut self, route: NavRoute, event: &Event, cx: &mut EventCx<'_>) {
        match route {
            NavRoute::Trigger => {
                if self.is_open() {
                    self.close(cx.env);
                } else {
                    self.open(cx.env);
                }
            }
            NavRoute::Close | NavRoute::Overlay | NavRoute::Link => {
                if self.is_open() {
                    self.close(cx.env);
                }
            }
            NavRoute::Escape => {
                let is_escape = matches!(
                    event,
                    Event::KeyDown { key } if key == "Escape" || key == "Esc"
                );
                if is_escape && self.is_open() {
                    self.close(cx.env);
                }
            }
            NavRoute::OutsideClick => {
                let Some(target) = event.target() else {
                    return;
                };
                let inside =
                    dom::contains(&self.trigger, target) || dom::contains(&self.panel, target);
                if !inside && self.is_open() {
                    self.close(cx.env);
                }
            }
        }
    }

    pub fn open(&mut self, env: &mut Environment) {
        dom::add_class(&self.trigger, ACTIVE);
        dom::add_class(&self.panel, ACTIVE);
        if let Some(overlay) = &self.overlay {
            dom::add_class(overlay, ACTIVE);
        }
        if self.variant == NavVariant::Overlay {
            self.lock_scroll();
        }
        env.trace("nav:open");
    }

    /// Clears every open marker and undoes the scroll lock.
    pub fn close(&mut self, env: &mut Environment) {
        dom::remove_class(&self.trigger, ACTIVE);
        dom::remove_class(&self.panel, ACTIVE);
        if let Some(overlay) = &self.overlay {
            dom::remove_class(overlay, ACTIVE);
        }
        self.unlock_scroll();
        env.trace("nav:close");
    }

    fn lock_scroll(&mut self) {
        let Some(body) = &self.body else { return };
        if self.saved_body_style.is_none() {
            self.saved_body_style = Some(dom::attr(body, "style"));
        }
        dom::set_style_property(body, "overflow", "hidden");
    }

    fn unlock_scroll(&mut self) {
        let (Some(body), Some(saved)) = (&self.body, self.saved_body_style.take()) else {
            return;
        };
        match saved {
            Some(style) => dom::set_attr(body, "style", &style),
            None => dom::remove_attr(body, "style"),
        }
    }
}

fn variant_name(variant: NavVariant) -> &'static str {
    match variant {
        NavVariant::Inline => "inline",
        NavVariant::Overlay => "overlay",
    }
}

/// Whether background scrolling is suspended on `body`.
pub fn is_scroll_locked(body: &NodeRef) -> bool {
    dom::style_property(body, "overflow").as_deref() == Some("hidden")
}
