//! Dropdown menus with one level of nesting.
//!
//! Each `.nav-dropdown` is open when it carries `active`. Opening a top-level
//! dropdown closes the other top-level ones together with everything nested
//! under them; opening a nested dropdown only closes its siblings under the
//! same parent menu.

use kuchiki::NodeRef;

use crate::config::DropdownConfig;
use crate::dom;
use crate::environment::Environment;
use crate::events::{Event, EventCx, EventKind, ListenTarget, ListenerGuard, Listeners, Route};

const ACTIVE: &str = "active";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropdownRoute {
    /// Index into the controller's toggle list.
    Toggle(usize),
    OutsideClick,
}

struct Dropdown {
    container: NodeRef,
    nested: bool,
}

pub struct DropdownController {
    dropdowns: Vec<Dropdown>,
    /// `(toggle, index of the dropdown it controls)`.
    toggles: Vec<(NodeRef, usize)>,
    _guards: Vec<ListenerGuard>,
}

impl DropdownController {
    pub fn attach(
        document: &NodeRef,
        config: &DropdownConfig,
        env: &mut Environment,
        listeners: &Listeners,
    ) -> Option<Self> {
        let containers = dom::select_all(document, &config.container);
        let dropdowns: Vec<Dropdown> = containers
            .iter()
            .map(|container| {
                let inside_other = containers
                    .iter()
                    .any(|other| other != container && dom::contains(other, container));
                Dropdown {
                    container: container.clone(),
                    nested: inside_other || dom::has_class(container, &config.nested_class),
                }
            })
            .collect();

        let mut toggles = Vec::new();
        for toggle in dom::select_all(document, &config.toggle) {
            let Some(owner) = dom::closest(&toggle, &config.container) else {
                tracing::debug!("dropdown toggle outside any dropdown; skipped");
                continue;
            };
            if let Some(index) = dropdowns.iter().position(|d| d.container == owner) {
                toggles.push((toggle, index));
            }
        }
        if toggles.is_empty() {
            return None;
        }

        let mut guards: Vec<ListenerGuard> = toggles
            .iter()
            .enumerate()
            .map(|(i, (toggle, _))| {
                listeners.on(
                    ListenTarget::Node(toggle.clone()),
                    EventKind::Click,
                    Route::Dropdown(DropdownRoute::Toggle(i)),
                )
            })
            .collect();
        guards.push(listeners.on(
            ListenTarget::Document,
            EventKind::Click,
            Route::Dropdown(DropdownRoute::OutsideClick),
        ));

        env.trace(format!("dropdown:attach {}", dropdowns.len()));
        Some(Self {
            dropdowns,
            toggles,
            _guards: guards,
        })
    }

    pub fn open_count(&self) -> usize {
        self.dropdowns
            .iter()
            .filter(|d| dom::has_class(&d.container, ACTIVE))
            .count()
    }

    pub fn handle(&mut self, route: DropdownRoute, event: &Event, cx: &mut EventCx<'_>) {
        match route {
            DropdownRoute::Toggle(i) => {
                cx.prevent_default();
                if let Some(&(_, index)) = self.toggles.get(i) {
                    self.toggle(index);
                }
            }
            DropdownRoute::OutsideClick => {
                let Some(target) = event.target() else {
                    return;
                };
                let inside = self
                    .dropdowns
                    .iter()
                    .any(|d| dom::contains(&d.container, target));
                if !inside {
                    self.close_all();
                }
            }
        }
    }

    fn toggle(&self, index: usize) {
        let current = &self.dropdowns[index];
        let was_open = dom::has_class(&current.container, ACTIVE);

        for (i, other) in self.dropdowns.iter().enumerate() {
            if i == index {
                continue;
            }
            let competing = if current.nested {
                other.nested && same_parent(&other.container, &current.container)
            } else {
                !other.nested
            };
            if competing {
                self.close_tree(i);
            }
        }

        if was_open {
            self.close_tree(index);
        } else {
            dom::add_class(&current.container, ACTIVE);
        }
    }

    /// Closes a dropdown and every dropdown beneath it.
    fn close_tree(&self, index: usize) {
        let root = &self.dropdowns[index].container;
        for d in &self.dropdowns {
            if dom::contains(root, &d.container) {
                dom::remove_class(&d.container, ACTIVE);
            }
        }
    }

    fn close_all(&self) {
        for d in &self.dropdowns {
            dom::remove_class(&d.container, ACTIVE);
        }
    }
}

fn same_parent(a: &NodeRef, b: &NodeRef) -> bool {
    match (a.parent(), b.parent()) {
        (Some(pa), Some(pb)) => pa == pb,
        _ => false,
    }
}
