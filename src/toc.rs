//! Table of contents built from the content headings, with scroll-spy
//! highlighting and offset-aware jumps.

use std::collections::HashSet;

use kuchiki::NodeRef;

use crate::config::TocConfig;
use crate::dom;
use crate::environment::{Environment, ScrollBehavior};
use crate::events::{Event, EventCx, EventKind, ListenTarget, ListenerGuard, Listeners, Route};
use crate::markup::{self, TocLink};
use crate::viewport::IntersectionObserver;

const ACTIVE: &str = "active";
const HIDDEN: &str = "hidden";
const HEADINGS: &str = "h1, h2, h3, h4, h5, h6";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TocRoute {
    /// Index into the heading list.
    Link(usize),
    Scroll,
    Wheel,
    TouchStart,
    TouchMove,
}

#[derive(Debug, Clone)]
pub struct HeadingEntry {
    pub element: NodeRef,
    pub id: String,
    pub text: String,
    pub level: u8,
    pub link: NodeRef,
}

pub struct TocController {
    entries: Vec<HeadingEntry>,
    observer: IntersectionObserver,
    surface: NodeRef,
    header: Option<NodeRef>,
    scroll_margin: f64,
    active: Option<usize>,
    touch_y: Option<f64>,
    _guards: Vec<ListenerGuard>,
}

impl TocController {
    /// Needs both the TOC container and the content region; `None` otherwise.
    pub fn attach(
        document: &NodeRef,
        config: &TocConfig,
        env: &mut Environment,
        listeners: &Listeners,
    ) -> Option<Self> {
        let container = dom::select_first(document, &config.container)?;
        let content = dom::select_first(document, &config.content)?;
        let surface =
            dom::closest(&container, &config.surface).unwrap_or_else(|| container.clone());

        for stale in dom::select_within(&container, "ul.toc-list") {
            stale.detach();
        }

        let headings = dom::select_within(&content, HEADINGS);
        let observer = IntersectionObserver::new(config.trigger_band(), headings.clone());
        let mut controller = Self {
            entries: Vec::new(),
            observer,
            surface: surface.clone(),
            header: dom::select_first(document, &config.header),
            scroll_margin: config.scroll_margin,
            active: None,
            touch_y: None,
            _guards: Vec::new(),
        };

        if headings.is_empty() {
            dom::add_class(&surface, HIDDEN);
            env.trace("toc:hidden");
            tracing::debug!("no headings in content region; toc hidden");
            return Some(controller);
        }
        dom::remove_class(&surface, HIDDEN);

        let ids = assign_ids(document, &headings);
        let texts: Vec<String> = headings
            .iter()
            .map(|h| h.text_contents().trim().to_string())
            .collect();
        let levels: Vec<u8> = headings.iter().map(heading_level).collect();

        let links: Vec<TocLink<'_>> = ids
            .iter()
            .zip(&texts)
            .zip(&levels)
            .map(|((id, text), level)| TocLink {
                id,
                text,
                level: *level,
            })
            .collect();
        let Some(list) = markup::fragment_node(markup::toc_list(&links), "ul") else {
            tracing::warn!("toc list markup did not parse; toc left empty");
            return Some(controller);
        };
        container.append(list.clone());
        let anchors = dom::select_within(&list, "a.toc-link");

        controller.entries = headings
            .into_iter()
            .zip(ids)
            .zip(texts)
            .zip(levels)
            .zip(anchors)
            .map(|((((element, id), text), level), link)| HeadingEntry {
                element,
                id,
                text,
                level,
                link,
            })
            .collect();

        let mut guards: Vec<ListenerGuard> = controller
            .entries
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                listeners.on(
                    ListenTarget::Node(entry.link.clone()),
                    EventKind::Click,
                    Route::Toc(TocRoute::Link(i)),
                )
            })
            .collect();
        guards.push(listeners.on(
            ListenTarget::Window,
            EventKind::Scroll,
            Route::Toc(TocRoute::Scroll),
        ));
        for (kind, route) in [
            (EventKind::Wheel, TocRoute::Wheel),
            (EventKind::TouchStart, TocRoute::TouchStart),
            (EventKind::TouchMove, TocRoute::TouchMove),
        ] {
            guards.push(listeners.on(
                ListenTarget::Node(surface.clone()),
                kind,
                Route::Toc(route),
            ));
        }
        controller._guards = guards;

        env.trace(format!("toc:build {}", controller.entries.len()));
        tracing::debug!(headings = controller.entries.len(), "toc built");
        Some(controller)
    }

    pub fn entries(&self) -> &[HeadingEntry] {
        &self.entries
    }

    pub fn active(&self) -> Option<&HeadingEntry> {
        self.active.and_then(|i| self.entries.get(i))
    }

    pub fn is_hidden(&self) -> bool {
        dom::has_class(&self.surface, HIDDEN)
    }

    pub fn handle(&mut self, route: TocRoute, event: &Event, cx: &mut EventCx<'_>) {
        match (route, event) {
            (TocRoute::Link(i), Event::Click { .. }) => {
                cx.prevent_default();
                self.jump_to(i, cx.env);
            }
            (TocRoute::Scroll, Event::Scroll) => self.observe(cx.env),
            (TocRoute::Wheel, Event::Wheel { target, delta_y }) => {
                self.contain_gesture(target, *delta_y, cx);
            }
            (TocRoute::TouchStart, Event::TouchStart { client_y, .. }) => {
                self.touch_y = Some(*client_y);
            }
            (TocRoute::TouchMove, Event::TouchMove { target, client_y }) => {
                let Some(last) = self.touch_y.replace(*client_y) else {
                    return;
                };
                // Finger moving up scrolls content down.
                self.contain_gesture(target, last - *client_y, cx);
            }
            _ => {}
        }
    }

    fn observe(&mut self, env: &mut Environment) {
        let records = self.observer.take_records(&env.viewport, &env.layout);
        if records.is_empty() {
            return;
        }
        // Headings that stayed inside the band report nothing, so pick from the
        // full state. With nothing inside, the last active link stays.
        if let Some(index) = self.observer.first_intersecting() {
            self.set_active(index, env);
        }
    }

    fn set_active(&mut self, index: usize, env: &mut Environment) {
        if self.active == Some(index) {
            return;
        }
        for entry in &self.entries {
            dom::remove_class(&entry.link, ACTIVE);
        }
        if let Some(entry) = self.entries.get(index) {
            dom::add_class(&entry.link, ACTIVE);
            env.trace(format!("toc:active {}", entry.id));
            self.active = Some(index);
        }
    }

    fn jump_to(&self, index: usize, env: &mut Environment) {
        let Some(entry) = self.entries.get(index) else {
            return;
        };
        let Some(rect) = env.layout.rect(&entry.element) else {
            tracing::debug!(id = %entry.id, "heading has no geometry; jump skipped");
            return;
        };
        let header_height = self
            .header
            .as_ref()
            .and_then(|h| env.layout.rect(h))
            .map(|r| r.height)
            .unwrap_or(0.0);
        let top = env.request_scroll(
            rect.top - header_height - self.scroll_margin,
            ScrollBehavior::Smooth,
        );
        tracing::debug!(id = %entry.id, top, "toc jump");
    }

    /// Lets the panel keep a gesture while it can still scroll that way.
    fn contain_gesture(&self, target: &NodeRef, delta_y: f64, cx: &mut EventCx<'_>) {
        let room = cx
            .env
            .layout
            .nearest_scroll_box_within(target, &self.surface)
            .is_some_and(|b| b.has_room(delta_y));
        if room {
            cx.stop_propagation();
        }
    }
}

fn heading_level(heading: &NodeRef) -> u8 {
    dom::tag_name(heading)
        .and_then(|t| t.strip_prefix('h').and_then(|n| n.parse().ok()))
        .unwrap_or(1)
}

/// Keeps unique existing ids; gives every other heading `heading-{index}`,
/// suffixed until it clashes with nothing else in the document.
fn assign_ids(document: &NodeRef, headings: &[NodeRef]) -> Vec<String> {
    let taken: HashSet<String> = dom::select_all(document, "[id]")
        .iter()
        .filter_map(|n| dom::attr(n, "id"))
        .collect();
    let mut claimed = HashSet::new();

    headings
        .iter()
        .enumerate()
        .map(|(index, heading)| {
            let existing = dom::attr(heading, "id")
                .map(|id| id.trim().to_string())
                .filter(|id| !id.is_empty());
            let id = match existing {
                Some(id) if !claimed.contains(&id) => id,
                _ => {
                    let base = format!("heading-{index}");
                    let mut candidate = base.clone();
                    let mut n = 1;
                    while taken.contains(&candidate) || claimed.contains(&candidate) {
                        candidate = format!("{base}-{n}");
                        n += 1;
                    }
                    candidate
                }
            };
            dom::set_attr(heading, "id", &id);
            claimed.insert(id.clone());
            id
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids_for(html: &str) -> Vec<String> {
        let doc = markup::parse_document(html);
        let headings = dom::select_all(&doc, HEADINGS);
        assign_ids(&doc, &headings)
    }

    #[test]
    fn keeps_existing_and_synthesizes_missing_ids() {
        assert_eq!(
            ids_for(r#"<h1 id="intro">a</h1><h2>b</h2><h3 id=" ">c</h3>"#),
            vec!["intro", "heading-1", "heading-2"]
        );
    }

    #[test]
    fn duplicate_and_colliding_ids_are_resolved() {
        assert_eq!(
            ids_for(
                r#"<div id="heading-0"></div><h2>a</h2><h2 id="dup">b</h2><h2 id="dup">c</h2>"#
            ),
            vec!["heading-0-1", "dup", "heading-2"]
        );
    }

    #[test]
    fn levels_come_from_tag_names() {
        let doc = markup::parse_document("<h1>a</h1><h4>b</h4><h6>c</h6>");
        let levels: Vec<u8> = dom::select_all(&doc, HEADINGS)
            .iter()
            .map(heading_level)
            .collect();
        assert_eq!(levels, vec![1, 4, 6]);
    }
}
