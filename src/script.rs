//! Scripted interactions replayed against a loaded page.

use std::path::Path;

use anyhow::Context as _;
use serde::Deserialize;

use crate::page::{Page, PageError};
use crate::theme::ColorScheme;
use crate::viewport::{Rect, ScrollBox};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub enum ScriptStep {
    Click(String),
    Key(String),
    Scroll(f64),
    Wheel {
        selector: String,
        delta_y: f64,
    },
    TouchStart {
        selector: String,
        client_y: f64,
    },
    TouchMove {
        selector: String,
        client_y: f64,
    },
    SystemScheme(ColorScheme),
    ToggleTheme,
    Rect {
        selector: String,
        top: f64,
        height: f64,
    },
    ScrollBox {
        selector: String,
        scroll_top: f64,
        scroll_height: f64,
        client_height: f64,
    },
}

pub fn load_script(path: &Path) -> anyhow::Result<Vec<ScriptStep>> {
    let bytes = std::fs::read(path).with_context(|| format!("read {}", path.display()))?;
    serde_json::from_slice(&bytes).with_context(|| format!("parse event script {}", path.display()))
}

/// Runs one step. Steps aimed at elements the page does not have fail with
/// [`PageError::NoMatch`]; the caller decides whether that is fatal.
pub fn apply_step(page: &mut Page, step: &ScriptStep) -> Result<(), PageError> {
    match step {
        ScriptStep::Click(selector) => {
            page.click(selector)?;
        }
        ScriptStep::Key(key) => {
            page.key_down(key);
        }
        ScriptStep::Scroll(y) => page.scroll_to(*y),
        ScriptStep::Wheel { selector, delta_y } => {
            page.wheel(selector, *delta_y)?;
        }
        ScriptStep::TouchStart { selector, client_y } => {
            page.touch_start(selector, *client_y)?;
        }
        ScriptStep::TouchMove { selector, client_y } => {
            page.touch_move(selector, *client_y)?;
        }
        ScriptStep::SystemScheme(scheme) => {
            page.set_system_scheme(*scheme);
        }
        ScriptStep::ToggleTheme => {
            page.toggle_theme();
        }
        ScriptStep::Rect {
            selector,
            top,
            height,
        } => page.set_rect(selector, Rect::new(*top, *height))?,
        ScriptStep::ScrollBox {
            selector,
            scroll_top,
            scroll_height,
            client_height,
        } => page.set_scroll_box(
            selector,
            ScrollBox {
                scroll_top: *scroll_top,
                scroll_height: *scroll_height,
                client_height: *client_height,
            },
        )?,
    }
    Ok(())
}
