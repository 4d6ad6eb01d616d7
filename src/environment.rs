use serde::Serialize;

use crate::storage::ResilientStore;
use crate::theme::ColorScheme;
use crate::viewport::{Layout, Viewport};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrollBehavior {
    Instant,
    Smooth,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScrollRequest {
    pub top: f64,
    pub behavior: ScrollBehavior,
}

/// Everything outside the document that the controllers read or affect.
pub struct Environment {
    pub store: ResilientStore,
    pub color_scheme: Option<ColorScheme>,
    pub viewport: Viewport,
    pub layout: Layout,
    pub scroll_requests: Vec<ScrollRequest>,
    /// Hrefs of links whose default navigation was allowed to proceed.
    pub navigations: Vec<String>,
    trace: Vec<String>,
}

impl Environment {
    pub fn new(store: ResilientStore) -> Self {
        Self {
            store,
            color_scheme: None,
            viewport: Viewport::default(),
            layout: Layout::default(),
            scroll_requests: Vec::new(),
            navigations: Vec::new(),
            trace: Vec::new(),
        }
    }

    pub fn with_color_scheme(mut self, scheme: Option<ColorScheme>) -> Self {
        self.color_scheme = scheme;
        self
    }

    pub fn with_viewport(mut self, viewport: Viewport) -> Self {
        self.viewport = viewport;
        self
    }

    /// Asks for the page to scroll to `top`; returns the clamped offset.
    pub fn request_scroll(&mut self, top: f64, behavior: ScrollBehavior) -> f64 {
        let top = self.viewport.clamp_scroll(top);
        self.scroll_requests.push(ScrollRequest { top, behavior });
        top
    }

    pub fn trace(&mut self, entry: impl Into<String>) {
        let entry = entry.into();
        tracing::trace!(%entry, "chrome");
        self.trace.push(entry);
    }

    pub fn take_trace(&mut self) -> Vec<String> {
        std::mem::take(&mut self.trace)
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new(ResilientStore::default())
    }
}
