use kuchiki::NodeRef;

use crate::config::ChromeConfig;
use crate::dropdown::DropdownController;
use crate::environment::Environment;
use crate::events::{Event, EventCx, Listeners, Route};
use crate::navigation::NavigationController;
use crate::theme::ThemeController;
use crate::toc::TocController;

/// Every controller of one loaded page. Built once at document-ready and owned
/// by the page; dropping it unregisters all listeners.
pub struct App {
    pub theme: ThemeController,
    pub navigation: Option<NavigationController>,
    pub dropdowns: Option<DropdownController>,
    pub toc: Option<TocController>,
}

impl App {
    /// Theme goes first so the root attribute is set before anything else runs.
    pub fn start(
        document: &NodeRef,
        config: &ChromeConfig,
        env: &mut Environment,
        listeners: &Listeners,
    ) -> Self {
        let theme = ThemeController::attach(document, &config.theme, env, listeners);

        let navigation = NavigationController::attach(
            document,
            &config.navigation,
            &config.dropdown.toggle,
            env,
            listeners,
        );
        if navigation.is_none() {
            tracing::debug!("no navigation markup; hamburger disabled");
        }

        let dropdowns = DropdownController::attach(document, &config.dropdown, env, listeners);
        if dropdowns.is_none() {
            tracing::debug!("no dropdown toggles found");
        }

        let toc = TocController::attach(document, &config.toc, env, listeners);
        if toc.is_none() {
            tracing::debug!("no toc container or content region; toc disabled");
        }

        env.trace("ready");
        Self {
            theme,
            navigation,
            dropdowns,
            toc,
        }
    }

    pub fn handle(&mut self, route: Route, event: &Event, cx: &mut EventCx<'_>) {
        match route {
            Route::Theme(r) => self.theme.handle(r, event, cx),
            Route::Nav(r) => {
                if let Some(nav) = &mut self.navigation {
                    nav.handle(r, event, cx);
                }
            }
            Route::Dropdown(r) => {
                if let Some(dropdowns) = &mut self.dropdowns {
                    dropdowns.handle(r, event, cx);
                }
            }
            Route::Toc(r) => {
                if let Some(toc) = &mut self.toc {
                    toc.handle(r, event, cx);
                }
            }
        }
    }
}
