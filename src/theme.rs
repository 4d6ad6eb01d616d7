//! Light/dark theme: persisted preference, OS fallback and the toggle control.

use std::fmt;
use std::str::FromStr;

use kuchiki::NodeRef;
use serde::{Deserialize, Serialize};

use crate::config::ThemeConfig;
use crate::dom;
use crate::environment::Environment;
use crate::events::{Event, EventCx, EventKind, ListenTarget, ListenerGuard, Listeners, Route};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown theme {0:?}")]
pub struct UnknownTheme(String);

impl FromStr for Theme {
    type Err = UnknownTheme;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(UnknownTheme(other.to_string())),
        }
    }
}

/// OS-level `prefers-color-scheme` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ColorScheme {
    Light,
    Dark,
}

impl From<ColorScheme> for Theme {
    fn from(scheme: ColorScheme) -> Self {
        match scheme {
            ColorScheme::Light => Theme::Light,
            ColorScheme::Dark => Theme::Dark,
        }
    }
}

/// Theme used while the visitor has not picked one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemePolicy {
    /// Follow the OS color scheme; light when the OS reports nothing.
    System,
    Light,
    Dark,
}

impl ThemePolicy {
    pub fn resolve(self, scheme: Option<ColorScheme>) -> Theme {
        match self {
            ThemePolicy::System => scheme.map(Theme::from).unwrap_or(Theme::Light),
            ThemePolicy::Light => Theme::Light,
            ThemePolicy::Dark => Theme::Dark,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeRoute {
    Toggle,
    SchemeChange,
}

pub struct ThemeController {
    theme: Theme,
    config: ThemeConfig,
    root: Option<NodeRef>,
    light_icon: Option<NodeRef>,
    dark_icon: Option<NodeRef>,
    _guards: Vec<ListenerGuard>,
}

impl ThemeController {
    pub fn attach(
        document: &NodeRef,
        config: &ThemeConfig,
        env: &mut Environment,
        listeners: &Listeners,
    ) -> Self {
        let stored = stored_theme(config, env);
        let theme = stored.unwrap_or_else(|| config.policy.resolve(env.color_scheme));

        let mut controller = Self {
            theme,
            config: config.clone(),
            root: dom::select_first(document, "html"),
            light_icon: dom::select_first(document, &config.light_icon),
            dark_icon: dom::select_first(document, &config.dark_icon),
            _guards: Vec::new(),
        };
        controller.apply(env);

        if let Some(toggle) = dom::select_first(document, &config.toggle) {
            controller._guards.push(listeners.on(
                ListenTarget::Node(toggle),
                EventKind::Click,
                Route::Theme(ThemeRoute::Toggle),
            ));
        }
        controller._guards.push(listeners.on(
            ListenTarget::ColorScheme,
            EventKind::ColorSchemeChange,
            Route::Theme(ThemeRoute::SchemeChange),
        ));

        tracing::debug!(theme = %theme, stored = stored.is_some(), "theme attached");
        controller
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn toggle_theme(&mut self, env: &mut Environment) {
        self.set_theme(self.theme.toggled(), env);
    }

    pub fn set_theme(&mut self, theme: Theme, env: &mut Environment) {
        self.theme = theme;
        env.store.set(&self.config.storage_key, theme.as_str());
        self.apply(env);
    }

    pub fn handle(&mut self, route: ThemeRoute, event: &Event, cx: &mut EventCx<'_>) {
        match (route, event) {
            (ThemeRoute::Toggle, Event::Click { .. }) => self.toggle_theme(cx.env),
            (ThemeRoute::SchemeChange, Event::ColorSchemeChange(scheme)) => {
                // An explicit choice always wins over the OS.
                if stored_theme(&self.config, cx.env).is_some() {
                    return;
                }
                self.theme = self.config.policy.resolve(Some(*scheme));
                self.apply(cx.env);
            }
            _ => {}
        }
    }

    fn apply(&self, env: &mut Environment) {
        if let Some(root) = &self.root {
            dom::set_attr(root, &self.config.attribute, self.theme.as_str());
        }
        env.trace(format!("theme:apply {}", self.theme));

        let (Some(light_icon), Some(dark_icon)) = (&self.light_icon, &self.dark_icon) else {
            return;
        };
        // The visible icon names the theme a click switches to.
        match self.theme {
            Theme::Dark => {
                dom::remove_class(light_icon, "hidden");
                dom::add_class(dark_icon, "hidden");
            }
            Theme::Light => {
                dom::add_class(light_icon, "hidden");
                dom::remove_class(dark_icon, "hidden");
            }
        }
    }
}

fn stored_theme(config: &ThemeConfig, env: &Environment) -> Option<Theme> {
    let raw = env.store.get(&config.storage_key)?;
    match raw.parse() {
        Ok(theme) => Some(theme),
        Err(e) => {
            tracing::warn!(error = %e, "ignoring stored theme");
            None
        }
    }
}
