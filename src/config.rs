//! Selectors, storage key and tuning constants for the page chrome.
//!
//! Every field has a default matching the stock site markup, so an empty JSON
//! object (or no config file at all) is a valid configuration.

use std::path::Path;

use kuchiki::Selectors;
use serde::{Deserialize, Serialize};

use crate::theme::ThemePolicy;
use crate::viewport::{RootMargin, RootMarginError};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("read config {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("parse config {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
    #[error("invalid selector for {field}: {selector:?}")]
    Selector { field: &'static str, selector: String },
    #[error("toc.root_margin: {0}")]
    RootMargin(#[from] RootMarginError),
    #[error("{field} must be a non-empty string")]
    Empty { field: &'static str },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChromeConfig {
    pub theme: ThemeConfig,
    pub navigation: NavigationConfig,
    pub dropdown: DropdownConfig,
    pub toc: TocConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThemeConfig {
    pub storage_key: String,
    pub policy: ThemePolicy,
    pub attribute: String,
    pub toggle: String,
    pub light_icon: String,
    pub dark_icon: String,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            storage_key: "theme".to_string(),
            policy: ThemePolicy::System,
            attribute: "data-theme".to_string(),
            toggle: ".theme-toggle".to_string(),
            light_icon: ".light-icon".to_string(),
            dark_icon: ".dark-icon".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NavigationConfig {
    pub hamburger: String,
    pub inline_menu: String,
    pub side_panel: String,
    pub overlay: String,
    pub close: String,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            hamburger: ".hamburger-menu".to_string(),
            inline_menu: ".mobile-nav".to_string(),
            side_panel: ".side-nav".to_string(),
            overlay: ".side-nav-overlay".to_string(),
            close: ".side-nav-close".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DropdownConfig {
    pub container: String,
    pub toggle: String,
    /// Class that marks a dropdown as nested even when it is not inside another.
    pub nested_class: String,
}

impl Default for DropdownConfig {
    fn default() -> Self {
        Self {
            container: ".nav-dropdown".to_string(),
            toggle: ".nav-dropdown-toggle".to_string(),
            nested_class: "nested".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TocConfig {
    pub container: String,
    pub surface: String,
    pub content: String,
    pub header: String,
    /// Trigger band as a CSS margin shorthand applied to the viewport.
    pub root_margin: String,
    /// Extra gap left above a heading after a TOC jump, in px.
    pub scroll_margin: f64,
}

impl Default for TocConfig {
    fn default() -> Self {
        Self {
            container: "#toc".to_string(),
            surface: ".toc-sidebar".to_string(),
            content: ".post-content".to_string(),
            header: "header".to_string(),
            root_margin: "-20% 0px -70% 0px".to_string(),
            scroll_margin: 20.0,
        }
    }
}

impl TocConfig {
    /// Falls back to the default band when the configured one does not parse.
    pub fn trigger_band(&self) -> RootMargin {
        match RootMargin::parse(&self.root_margin) {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!(error = %e, "falling back to default trigger band");
                RootMargin::parse(&TocConfig::default().root_margin)
                    .expect("default root margin parses")
            }
        }
    }
}

impl ChromeConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let display = path.display().to_string();
        let bytes = std::fs::read(path).map_err(|source| ConfigError::Read {
            path: display.clone(),
            source,
        })?;
        let config: ChromeConfig =
            serde_json::from_slice(&bytes).map_err(|source| ConfigError::Parse {
                path: display,
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.theme.storage_key.trim().is_empty() {
            return Err(ConfigError::Empty {
                field: "theme.storage_key",
            });
        }
        if self.theme.attribute.trim().is_empty() {
            return Err(ConfigError::Empty {
                field: "theme.attribute",
            });
        }
        if self.dropdown.nested_class.trim().is_empty() {
            return Err(ConfigError::Empty {
                field: "dropdown.nested_class",
            });
        }

        let selectors: [(&'static str, &str); 14] = [
            ("theme.toggle", self.theme.toggle.as_str()),
            ("theme.light_icon", self.theme.light_icon.as_str()),
            ("theme.dark_icon", self.theme.dark_icon.as_str()),
            ("navigation.hamburger", self.navigation.hamburger.as_str()),
            ("navigation.inline_menu", self.navigation.inline_menu.as_str()),
            ("navigation.side_panel", self.navigation.side_panel.as_str()),
            ("navigation.overlay", self.navigation.overlay.as_str()),
            ("navigation.close", self.navigation.close.as_str()),
            ("dropdown.container", self.dropdown.container.as_str()),
            ("dropdown.toggle", self.dropdown.toggle.as_str()),
            ("toc.container", self.toc.container.as_str()),
            ("toc.surface", self.toc.surface.as_str()),
            ("toc.content", self.toc.content.as_str()),
            ("toc.header", self.toc.header.as_str()),
        ];
        for (field, selector) in selectors {
            if Selectors::compile(selector).is_err() {
                return Err(ConfigError::Selector {
                    field,
                    selector: selector.to_string(),
                });
            }
        }

        RootMargin::parse(&self.toc.root_margin)?;
        Ok(())
    }
}
