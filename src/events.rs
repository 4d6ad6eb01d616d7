//! Event model and listener table.
//!
//! Controllers register listeners through [`Listeners::on`] and keep the
//! returned [`ListenerGuard`]s. Dropping a guard removes its listener, so a
//! controller that is dropped leaves nothing behind in the table.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use kuchiki::NodeRef;

use crate::dropdown::DropdownRoute;
use crate::environment::Environment;
use crate::navigation::NavRoute;
use crate::theme::{ColorScheme, ThemeRoute};
use crate::toc::TocRoute;

#[derive(Debug, Clone)]
pub enum Event {
    Click { target: NodeRef },
    KeyDown { key: String },
    Wheel { target: NodeRef, delta_y: f64 },
    TouchStart { target: NodeRef, client_y: f64 },
    TouchMove { target: NodeRef, client_y: f64 },
    Scroll,
    ColorSchemeChange(ColorScheme),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Click,
    KeyDown,
    Wheel,
    TouchStart,
    TouchMove,
    Scroll,
    ColorSchemeChange,
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::Click { .. } => EventKind::Click,
            Event::KeyDown { .. } => EventKind::KeyDown,
            Event::Wheel { .. } => EventKind::Wheel,
            Event::TouchStart { .. } => EventKind::TouchStart,
            Event::TouchMove { .. } => EventKind::TouchMove,
            Event::Scroll => EventKind::Scroll,
            Event::ColorSchemeChange(_) => EventKind::ColorSchemeChange,
        }
    }

    pub fn target(&self) -> Option<&NodeRef> {
        match self {
            Event::Click { target }
            | Event::Wheel { target, .. }
            | Event::TouchStart { target, .. }
            | Event::TouchMove { target, .. } => Some(target),
            Event::KeyDown { .. } | Event::Scroll | Event::ColorSchemeChange(_) => None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum ListenTarget {
    Node(NodeRef),
    Document,
    Window,
    /// The `(prefers-color-scheme: dark)` media query.
    ColorScheme,
}

/// Which controller handler a listener invokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Theme(ThemeRoute),
    Nav(NavRoute),
    Dropdown(DropdownRoute),
    Toc(TocRoute),
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    pub default_prevented: bool,
    pub propagation_stopped: bool,
}

/// Handed to every handler while an event is being dispatched.
pub struct EventCx<'a> {
    pub env: &'a mut Environment,
    pub(crate) outcome: Outcome,
}

impl<'a> EventCx<'a> {
    pub fn new(env: &'a mut Environment) -> Self {
        Self {
            env,
            outcome: Outcome::default(),
        }
    }

    pub fn prevent_default(&mut self) {
        self.outcome.default_prevented = true;
    }

    pub fn stop_propagation(&mut self) {
        self.outcome.propagation_stopped = true;
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }
}

struct Entry {
    id: u64,
    target: ListenTarget,
    kind: EventKind,
    route: Route,
}

#[derive(Default)]
struct Table {
    next_id: u64,
    entries: Vec<Entry>,
}

#[derive(Clone, Default)]
pub struct Listeners(Rc<RefCell<Table>>);

impl Listeners {
    pub fn on(&self, target: ListenTarget, kind: EventKind, route: Route) -> ListenerGuard {
        let mut table = self.0.borrow_mut();
        let id = table.next_id;
        table.next_id += 1;
        table.entries.push(Entry {
            id,
            target,
            kind,
            route,
        });
        ListenerGuard {
            table: Rc::downgrade(&self.0),
            id,
        }
    }

    pub fn len(&self) -> usize {
        self.0.borrow().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Routes for `event`, grouped into propagation levels: the target node
    /// first, then each ancestor, then the document (or the window / media
    /// query for events without a node target).
    pub fn propagation_path(&self, event: &Event) -> Vec<Vec<Route>> {
        let table = self.0.borrow();
        let kind = event.kind();
        let collect = |pred: &dyn Fn(&ListenTarget) -> bool| -> Vec<Route> {
            table
                .entries
                .iter()
                .filter(|e| e.kind == kind && pred(&e.target))
                .map(|e| e.route)
                .collect()
        };

        let mut levels = Vec::new();
        match event {
            Event::Scroll => levels.push(collect(&|t| matches!(t, ListenTarget::Window))),
            Event::ColorSchemeChange(_) => {
                levels.push(collect(&|t| matches!(t, ListenTarget::ColorScheme)))
            }
            Event::KeyDown { .. } => {
                levels.push(collect(&|t| matches!(t, ListenTarget::Document)))
            }
            _ => {
                if let Some(target) = event.target() {
                    for node in target.inclusive_ancestors() {
                        levels.push(collect(&|t| {
                            matches!(t, ListenTarget::Node(n) if *n == node)
                        }));
                    }
                }
                levels.push(collect(&|t| matches!(t, ListenTarget::Document)));
            }
        }
        levels.retain(|l| !l.is_empty());
        levels
    }
}

/// Removes its listener when dropped.
#[must_use = "dropping the guard removes the listener immediately"]
pub struct ListenerGuard {
    table: Weak<RefCell<Table>>,
    id: u64,
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        if let Some(table) = self.table.upgrade() {
            table.borrow_mut().entries.retain(|e| e.id != self.id);
        }
    }
}
