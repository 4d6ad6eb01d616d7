//! Geometry for a document that has no layout engine: element boxes are fed
//! in from outside, and the viewport is a vertical window over them.

use std::sync::LazyLock;

use kuchiki::NodeRef;
use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub top: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(top: f64, height: f64) -> Self {
        Self { top, height }
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

/// Internal scroll state of an element with its own overflow.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollBox {
    pub scroll_top: f64,
    pub scroll_height: f64,
    pub client_height: f64,
}

impl ScrollBox {
    pub fn max_scroll(&self) -> f64 {
        (self.scroll_height - self.client_height).max(0.0)
    }

    /// Whether a gesture of `delta_y` still has room to move the content.
    pub fn has_room(&self, delta_y: f64) -> bool {
        if delta_y > 0.0 {
            self.scroll_top < self.max_scroll()
        } else if delta_y < 0.0 {
            self.scroll_top > 0.0
        } else {
            false
        }
    }

    pub fn scroll_by(&mut self, delta_y: f64) {
        self.scroll_top = (self.scroll_top + delta_y).clamp(0.0, self.max_scroll());
    }
}

#[derive(Debug, Default)]
pub struct Layout {
    rects: Vec<(NodeRef, Rect)>,
    scroll_boxes: Vec<(NodeRef, ScrollBox)>,
}

impl Layout {
    pub fn set_rect(&mut self, node: &NodeRef, rect: Rect) {
        match self.rects.iter_mut().find(|(n, _)| n == node) {
            Some(entry) => entry.1 = rect,
            None => self.rects.push((node.clone(), rect)),
        }
    }

    pub fn rect(&self, node: &NodeRef) -> Option<Rect> {
        self.rects.iter().find(|(n, _)| n == node).map(|(_, r)| *r)
    }

    pub fn set_scroll_box(&mut self, node: &NodeRef, scroll_box: ScrollBox) {
        match self.scroll_boxes.iter_mut().find(|(n, _)| n == node) {
            Some(entry) => entry.1 = scroll_box,
            None => self.scroll_boxes.push((node.clone(), scroll_box)),
        }
    }

    pub fn scroll_box(&self, node: &NodeRef) -> Option<ScrollBox> {
        self.scroll_boxes
            .iter()
            .find(|(n, _)| n == node)
            .map(|(_, b)| *b)
    }

    fn scroll_owner(&self, node: &NodeRef) -> Option<NodeRef> {
        node.inclusive_ancestors()
            .find(|a| self.scroll_boxes.iter().any(|(n, _)| n == a))
    }

    /// Innermost registered scroll box at or above `node`, provided it is
    /// `limit` or sits inside it.
    pub fn nearest_scroll_box_within(&self, node: &NodeRef, limit: &NodeRef) -> Option<ScrollBox> {
        let owner = self.scroll_owner(node)?;
        if !owner.inclusive_ancestors().any(|a| a == *limit) {
            return None;
        }
        self.scroll_box(&owner)
    }

    pub fn nearest_scroll_box_mut(&mut self, node: &NodeRef) -> Option<&mut ScrollBox> {
        let owner = self.scroll_owner(node)?;
        self.scroll_boxes
            .iter_mut()
            .find(|(n, _)| *n == owner)
            .map(|(_, b)| b)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub scroll_y: f64,
    pub height: f64,
    /// Upper bound for `scroll_y`; `None` leaves the page unbounded.
    pub max_scroll: Option<f64>,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            scroll_y: 0.0,
            height: 800.0,
            max_scroll: None,
        }
    }
}

impl Viewport {
    pub fn clamp_scroll(&self, y: f64) -> f64 {
        let y = y.max(0.0);
        match self.max_scroll {
            Some(max) => y.min(max),
            None => y,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Length {
    Px(f64),
    Percent(f64),
}

impl Length {
    fn resolve(self, extent: f64) -> f64 {
        match self {
            Length::Px(v) => v,
            Length::Percent(p) => extent * p / 100.0,
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("invalid root margin {0:?}: expected 1-4 lengths in px or %")]
pub struct RootMarginError(pub String);

/// CSS margin shorthand applied to the viewport to form the trigger band.
/// Negative values shrink the band.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RootMargin {
    pub top: Length,
    pub right: Length,
    pub bottom: Length,
    pub left: Length,
}

static LENGTH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<num>[+-]?(?:\d+(?:\.\d+)?|\.\d+))(?P<unit>px|%)?$").expect("length regex")
});

impl RootMargin {
    pub fn parse(raw: &str) -> Result<Self, RootMarginError> {
        let err = || RootMarginError(raw.to_string());
        let mut lengths = Vec::with_capacity(4);
        for token in raw.split_whitespace() {
            let caps = LENGTH_RE.captures(token).ok_or_else(err)?;
            let num: f64 = caps["num"].parse().map_err(|_| err())?;
            let length = match caps.name("unit").map(|m| m.as_str()) {
                Some("%") => Length::Percent(num),
                Some(_) => Length::Px(num),
                // Only a bare zero may drop its unit.
                None if num == 0.0 => Length::Px(0.0),
                None => return Err(err()),
            };
            lengths.push(length);
        }
        let (top, right, bottom, left) = match lengths.as_slice() {
            [a] => (*a, *a, *a, *a),
            [v, h] => (*v, *h, *v, *h),
            [t, h, b] => (*t, *h, *b, *h),
            [t, r, b, l] => (*t, *r, *b, *l),
            _ => return Err(err()),
        };
        Ok(Self {
            top,
            right,
            bottom,
            left,
        })
    }

    /// Vertical trigger band in document coordinates as `(top, bottom)`.
    pub fn band(&self, viewport: &Viewport) -> (f64, f64) {
        let top = viewport.scroll_y - self.top.resolve(viewport.height);
        let bottom = viewport.scroll_y + viewport.height + self.bottom.resolve(viewport.height);
        (top, bottom)
    }
}

#[derive(Debug, Clone)]
pub struct IntersectionEntry {
    pub index: usize,
    pub target: NodeRef,
    pub is_intersecting: bool,
}

/// Tracks a fixed, ordered set of targets against the trigger band and reports
/// only the targets whose state flipped since the previous call.
pub struct IntersectionObserver {
    margin: RootMargin,
    targets: Vec<NodeRef>,
    last: Vec<Option<bool>>,
}

impl IntersectionObserver {
    pub fn new(margin: RootMargin, targets: Vec<NodeRef>) -> Self {
        let last = vec![None; targets.len()];
        Self {
            margin,
            targets,
            last,
        }
    }

    /// Index of the first target, in document order, inside the band as of
    /// the last [`IntersectionObserver::take_records`].
    pub fn first_intersecting(&self) -> Option<usize> {
        self.last.iter().position(|state| *state == Some(true))
    }

    pub fn take_records(&mut self, viewport: &Viewport, layout: &Layout) -> Vec<IntersectionEntry> {
        let (band_top, band_bottom) = self.margin.band(viewport);
        let mut records = Vec::new();
        for (index, target) in self.targets.iter().enumerate() {
            let is_intersecting = layout
                .rect(target)
                .is_some_and(|r| r.top <= band_bottom && r.bottom() >= band_top);
            if self.last[index] != Some(is_intersecting) {
                self.last[index] = Some(is_intersecting);
                records.push(IntersectionEntry {
                    index,
                    target: target.clone(),
                    is_intersecting,
                });
            }
        }
        records
    }
}
