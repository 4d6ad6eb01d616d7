use site_chrome::config::ChromeConfig;
use site_chrome::dom;
use site_chrome::environment::{Environment, ScrollBehavior};
use site_chrome::navigation::NavVariant;
use site_chrome::page::Page;
use site_chrome::storage::{DisabledStore, MemoryStore, ResilientStore};
use site_chrome::theme::{ColorScheme, Theme};
use site_chrome::viewport::{Rect, ScrollBox};

const POST: &str = r##"<!DOCTYPE html>
<html lang="en">
<head><title>Post</title></head>
<body>
<header class="site-header">
  <button class="hamburger-menu" id="burger">menu</button>
  <button class="theme-toggle" id="toggle"><span class="light-icon hidden">L</span><span class="dark-icon">D</span></button>
  <nav class="site-nav">
    <div class="nav-dropdown" id="docs">
      <a href="#" class="nav-dropdown-toggle" id="docs-t">Docs</a>
      <ul>
        <li class="nav-dropdown" id="guides"><a href="#" class="nav-dropdown-toggle" id="guides-t">Guides</a></li>
        <li class="nav-dropdown" id="api"><a href="#" class="nav-dropdown-toggle" id="api-t">API</a></li>
      </ul>
    </div>
    <div class="nav-dropdown" id="blog"><a href="#" class="nav-dropdown-toggle" id="blog-t">Blog</a></div>
  </nav>
</header>
<div class="side-nav-overlay" id="overlay"></div>
<aside class="side-nav" id="panel">
  <button class="side-nav-close" id="close">x</button>
  <a href="/about/" id="about">About</a>
</aside>
<main>
  <aside class="toc-sidebar" id="sidebar"><div id="toc"></div></aside>
  <article class="post-content">
    <h1>Intro</h1><p>one</p>
    <h2>Details</h2><p>two</p>
    <h2>More</h2><p>three</p>
  </article>
  <p id="elsewhere">elsewhere</p>
</main>
</body>
</html>"##;

const INLINE_NAV: &str = r##"<html><body>
<button class="hamburger-menu" id="burger">menu</button>
<nav class="mobile-nav" id="menu">
  <p id="menu-text">Sections</p>
  <a href="/posts/" id="posts">Posts</a>
  <div class="nav-dropdown" id="more"><a href="#" class="nav-dropdown-toggle" id="more-t">More</a></div>
</nav>
<p id="elsewhere">elsewhere</p>
</body></html>"##;

fn load(html: &str, env: Environment) -> Page {
    Page::load(html, env, &ChromeConfig::default())
}

fn load_default(html: &str) -> Page {
    load(html, Environment::default())
}

fn active_links(page: &Page) -> Vec<String> {
    dom::select_all(page.document(), "a.toc-link.active")
        .iter()
        .filter_map(|a| dom::attr(a, "href"))
        .collect()
}

#[test]
fn theme_is_applied_once_before_anything_else() {
    let mut page = load_default(POST);
    let trace = page.take_trace();

    assert_eq!(trace.first().map(String::as_str), Some("theme:apply light"));
    let ready = trace.iter().position(|t| t == "ready").unwrap();
    let applies = trace[..ready]
        .iter()
        .filter(|t| t.starts_with("theme:apply"))
        .count();
    assert_eq!(applies, 1, "trace: {trace:?}");
    assert!(trace[1..ready].iter().any(|t| t == "nav:attach overlay"));
    assert!(trace[1..ready].iter().any(|t| t == "toc:build 3"));
    assert_eq!(page.attr("html", "data-theme").as_deref(), Some("light"));
}

#[test]
fn stored_preference_wins_over_os_scheme() {
    let store = MemoryStore::with_entry("theme", "dark");
    let env = Environment::new(ResilientStore::new(store)).with_color_scheme(Some(ColorScheme::Light));
    let mut page = load(POST, env);
    assert_eq!(page.attr("html", "data-theme").as_deref(), Some("dark"));

    page.set_system_scheme(ColorScheme::Light);
    assert_eq!(page.state().theme, Some(Theme::Dark));
}

#[test]
fn without_preference_the_os_scheme_is_followed() {
    let env = Environment::default().with_color_scheme(Some(ColorScheme::Dark));
    let mut page = load(POST, env);
    assert_eq!(page.state().theme, Some(Theme::Dark));

    page.set_system_scheme(ColorScheme::Light);
    assert_eq!(page.attr("html", "data-theme").as_deref(), Some("light"));
}

#[test]
fn toggling_twice_restores_theme_and_writes_each_time() {
    let store = MemoryStore::default();
    let handle = store.clone();
    let mut page = load(POST, Environment::new(ResilientStore::new(store)));
    assert_eq!(handle.writes(), 0);

    // Clicking the icon inside the button bubbles up to the toggle.
    page.click(".dark-icon").unwrap();
    assert_eq!(page.attr("html", "data-theme").as_deref(), Some("dark"));
    assert_eq!(handle.writes(), 1);
    assert!(!page.has_class(".light-icon", "hidden"));
    assert!(page.has_class(".dark-icon", "hidden"));

    page.click("#toggle").unwrap();
    assert_eq!(page.attr("html", "data-theme").as_deref(), Some("light"));
    assert_eq!(handle.writes(), 2);
    assert!(page.has_class(".light-icon", "hidden"));
    assert!(!page.has_class(".dark-icon", "hidden"));
}

#[test]
fn unavailable_storage_still_toggles() {
    let env = Environment::new(ResilientStore::new(DisabledStore));
    let mut page = load(POST, env);
    assert_eq!(page.state().theme, Some(Theme::Light));

    assert_eq!(page.toggle_theme(), Some(Theme::Dark));
    assert_eq!(page.attr("html", "data-theme").as_deref(), Some("dark"));
    // The failed write is remembered for the rest of the page.
    assert_eq!(page.env().store.get("theme").as_deref(), Some("dark"));
    assert_eq!(page.toggle_theme(), Some(Theme::Light));
}

#[test]
fn garbage_stored_theme_is_ignored() {
    let store = MemoryStore::with_entry("theme", "sepia");
    let page = load(POST, Environment::new(ResilientStore::new(store)));
    assert_eq!(page.state().theme, Some(Theme::Light));
}

#[test]
fn top_level_dropdowns_are_mutually_exclusive() {
    let mut page = load_default(POST);

    let outcome = page.click("#docs-t").unwrap();
    assert!(outcome.default_prevented);
    page.click("#guides-t").unwrap();
    assert!(page.has_class("#docs", "active"));
    assert!(page.has_class("#guides", "active"));

    page.click("#api-t").unwrap();
    assert!(page.has_class("#docs", "active"));
    assert!(!page.has_class("#guides", "active"));
    assert!(page.has_class("#api", "active"));

    page.click("#blog-t").unwrap();
    assert!(page.has_class("#blog", "active"));
    assert!(!page.has_class("#docs", "active"));
    assert!(!page.has_class("#api", "active"));
    assert_eq!(page.state().open_dropdowns, 1);
    assert!(page.env().navigations.is_empty());
}

#[test]
fn outside_click_closes_all_dropdowns() {
    let mut page = load_default(POST);
    page.click("#docs-t").unwrap();
    page.click("#api-t").unwrap();
    assert_eq!(page.state().open_dropdowns, 2);

    page.click("#elsewhere").unwrap();
    assert_eq!(page.state().open_dropdowns, 0);
}

#[test]
fn toc_lists_every_heading_with_unique_ids() {
    let page = load_default(POST);
    let state = page.state();
    let summary: Vec<(&str, &str, u8)> = state
        .headings
        .iter()
        .map(|h| (h.id.as_str(), h.text.as_str(), h.level))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("heading-0", "Intro", 1),
            ("heading-1", "Details", 2),
            ("heading-2", "More", 2),
        ]
    );

    let links = dom::select_all(page.document(), "#toc ul.toc-list a.toc-link");
    let hrefs: Vec<String> = links.iter().filter_map(|a| dom::attr(a, "href")).collect();
    assert_eq!(hrefs, vec!["#heading-0", "#heading-1", "#heading-2"]);
    assert!(dom::has_class(&links[1], "toc-level-2"));
    assert!(page.attr("h2", "id").is_some());
    assert!(!state.toc_hidden);
}

#[test]
fn scroll_spy_marks_exactly_one_link() {
    let mut page = load_default(POST);
    page.set_rect("#heading-0", Rect::new(100.0, 30.0)).unwrap();
    page.set_rect("#heading-1", Rect::new(1000.0, 30.0)).unwrap();
    page.set_rect("#heading-2", Rect::new(2000.0, 30.0)).unwrap();

    // Band is 20%..30% of an 800px viewport: [scroll + 160, scroll + 240].
    page.scroll_to(850.0);
    assert_eq!(active_links(&page), vec!["#heading-1"]);
    assert_eq!(page.state().active_heading.as_deref(), Some("heading-1"));

    page.scroll_to(1850.0);
    assert_eq!(active_links(&page), vec!["#heading-2"]);

    // Leaving the band without another heading entering keeps the last one.
    page.scroll_to(5000.0);
    assert_eq!(active_links(&page), vec!["#heading-2"]);
}

#[test]
fn scroll_spy_moves_on_when_the_active_heading_leaves_first() {
    let mut page = load_default(POST);
    page.set_rect("#heading-0", Rect::new(1000.0, 30.0)).unwrap();
    page.set_rect("#heading-1", Rect::new(1050.0, 30.0)).unwrap();

    // Band [1010, 1090]: both headings enter together, the first one wins.
    page.scroll_to(850.0);
    assert_eq!(active_links(&page), vec!["#heading-0"]);

    // Band [1060, 1140]: only the second heading is still inside.
    page.scroll_to(900.0);
    assert_eq!(active_links(&page), vec!["#heading-1"]);
    assert_eq!(page.state().active_heading.as_deref(), Some("heading-1"));
}

#[test]
fn toc_click_scrolls_below_the_fixed_header() {
    let mut page = load_default(POST);
    page.set_rect("header", Rect::new(0.0, 60.0)).unwrap();
    page.set_rect("#heading-2", Rect::new(2000.0, 30.0)).unwrap();

    let outcome = page.click("a[href='#heading-2']").unwrap();
    assert!(outcome.default_prevented);

    let request = *page.env().scroll_requests.last().unwrap();
    assert_eq!(request.top, 1920.0);
    assert_eq!(request.behavior, ScrollBehavior::Smooth);
    assert_eq!(page.state().scroll_y, 1920.0);
    assert!(page.env().navigations.is_empty());
}

#[test]
fn toc_click_without_geometry_does_nothing() {
    let mut page = load_default(POST);
    page.click("a[href='#heading-1']").unwrap();
    assert!(page.env().scroll_requests.is_empty());
    assert_eq!(page.state().scroll_y, 0.0);
}

#[test]
fn toc_is_hidden_without_headings() {
    let html = r#"<html><body>
        <aside class="toc-sidebar" id="sidebar"><div id="toc"></div></aside>
        <article class="post-content"><p>no headings here</p></article>
        </body></html>"#;
    let mut page = load_default(html);
    assert!(page.state().toc_hidden);
    assert!(page.has_class("#sidebar", "hidden"));
    assert!(dom::select_first(page.document(), "ul.toc-list").is_none());
    assert!(page.take_trace().iter().any(|t| t == "toc:hidden"));
}

#[test]
fn toc_panel_keeps_wheel_while_it_can_scroll() {
    let mut page = load_default(POST);
    page.set_scroll_box(
        "#sidebar",
        ScrollBox {
            scroll_top: 0.0,
            scroll_height: 1000.0,
            client_height: 400.0,
        },
    )
    .unwrap();

    let outcome = page.wheel("#toc", 100.0).unwrap();
    assert!(outcome.propagation_stopped);
    let sidebar = page.select("#sidebar").unwrap();
    assert_eq!(page.env().layout.scroll_box(&sidebar).unwrap().scroll_top, 100.0);
    assert_eq!(page.state().scroll_y, 0.0);

    page.wheel("#toc", 1000.0).unwrap();
    assert_eq!(page.env().layout.scroll_box(&sidebar).unwrap().scroll_top, 600.0);

    // At the bottom the page takes over.
    let outcome = page.wheel("#toc", 50.0).unwrap();
    assert!(!outcome.propagation_stopped);
    assert_eq!(page.state().scroll_y, 50.0);
}

#[test]
fn scrollable_ancestor_outside_the_toc_does_not_capture_the_wheel() {
    let html = POST.replace("<main>", r#"<main id="outer">"#);
    let mut page = load_default(&html);
    page.set_scroll_box(
        "#outer",
        ScrollBox {
            scroll_top: 0.0,
            scroll_height: 3000.0,
            client_height: 800.0,
        },
    )
    .unwrap();

    let outcome = page.wheel("#toc", 100.0).unwrap();
    assert!(!outcome.propagation_stopped);
    assert_eq!(page.state().scroll_y, 100.0);
    let outer = page.select("#outer").unwrap();
    assert_eq!(page.env().layout.scroll_box(&outer).unwrap().scroll_top, 0.0);
}

#[test]
fn toc_panel_keeps_touch_drags() {
    let mut page = load_default(POST);
    page.set_scroll_box(
        "#sidebar",
        ScrollBox {
            scroll_top: 0.0,
            scroll_height: 1000.0,
            client_height: 400.0,
        },
    )
    .unwrap();

    page.touch_start("#toc", 500.0).unwrap();
    let outcome = page.touch_move("#toc", 420.0).unwrap();
    assert!(outcome.propagation_stopped);
    let sidebar = page.select("#sidebar").unwrap();
    assert_eq!(page.env().layout.scroll_box(&sidebar).unwrap().scroll_top, 80.0);
    assert_eq!(page.state().scroll_y, 0.0);
}

#[test]
fn overlay_scroll_lock_is_released_by_every_close_path() {
    let mut page = load_default(POST);
    assert_eq!(page.state().navigation, Some(NavVariant::Overlay));

    let closers: [(&str, fn(&mut Page)); 5] = [
        ("close button", |p| {
            p.click("#close").unwrap();
        }),
        ("overlay", |p| {
            p.click("#overlay").unwrap();
        }),
        ("escape", |p| {
            p.key_down("Escape");
        }),
        ("panel link", |p| {
            p.click("#about").unwrap();
        }),
        ("hamburger", |p| {
            p.click("#burger").unwrap();
        }),
    ];
    for (name, close) in closers {
        page.click("#burger").unwrap();
        assert!(page.state().navigation_open, "{name}");
        assert!(page.scroll_locked(), "{name}");
        assert!(page.has_class("#overlay", "active"), "{name}");

        close(&mut page);
        assert!(!page.state().navigation_open, "{name}");
        assert!(!page.scroll_locked(), "{name}");
        assert!(!page.has_class("#overlay", "active"), "{name}");
        assert!(!page.has_class("#burger", "active"), "{name}");
        assert_eq!(page.attr("body", "style"), None, "{name}");
    }
    assert_eq!(page.env().navigations, vec!["/about/"]);
}

#[test]
fn scroll_lock_blocks_page_scrolling_and_restores_body_style() {
    let html = POST.replace("<body>", r#"<body style="color: red">"#);
    let mut page = load_default(&html);

    page.click("#burger").unwrap();
    page.wheel("#elsewhere", 120.0).unwrap();
    assert_eq!(page.state().scroll_y, 0.0);

    page.key_down("Esc");
    assert_eq!(page.attr("body", "style").as_deref(), Some("color: red"));
    page.wheel("#elsewhere", 120.0).unwrap();
    assert_eq!(page.state().scroll_y, 120.0);
}

#[test]
fn other_keys_leave_the_panel_open() {
    let mut page = load_default(POST);
    page.click("#burger").unwrap();
    page.key_down("Enter");
    assert!(page.state().navigation_open);
}

#[test]
fn inline_menu_opens_in_place_and_closes_on_outside_click() {
    let mut page = load_default(INLINE_NAV);
    assert_eq!(page.state().navigation, Some(NavVariant::Inline));

    page.click("#burger").unwrap();
    assert!(page.has_class("#menu", "active"));
    assert!(page.has_class("#burger", "active"));
    assert!(!page.scroll_locked());

    page.click("#menu-text").unwrap();
    assert!(page.state().navigation_open);
    page.click("#more-t").unwrap();
    assert!(page.state().navigation_open, "submenu toggles keep the menu open");
    assert!(page.has_class("#more", "active"));

    page.click("#elsewhere").unwrap();
    assert!(!page.state().navigation_open);
    assert!(!page.has_class("#burger", "active"));
}

#[test]
fn inline_menu_closes_on_link_and_escape() {
    let mut page = load_default(INLINE_NAV);
    page.click("#burger").unwrap();
    page.click("#posts").unwrap();
    assert!(!page.state().navigation_open);
    assert_eq!(page.env().navigations, vec!["/posts/"]);

    page.click("#burger").unwrap();
    page.key_down("Escape");
    assert!(!page.state().navigation_open);
}

#[test]
fn fragment_links_jump_to_their_anchor() {
    let html = r##"<html><body><a href="#target" id="jump">go</a><div id="target">x</div></body></html>"##;
    let mut page = load_default(html);
    page.set_rect("#target", Rect::new(640.0, 20.0)).unwrap();
    page.click("#jump").unwrap();
    assert_eq!(page.state().scroll_y, 640.0);
    assert_eq!(
        page.env().scroll_requests.last().map(|r| r.behavior),
        Some(ScrollBehavior::Instant)
    );
}

#[test]
fn bare_page_gets_only_the_theme() {
    let page = load_default("<p>plain</p>");
    let state = page.state();
    assert_eq!(state.theme, Some(Theme::Light));
    assert_eq!(state.navigation, None);
    assert!(state.headings.is_empty());
    assert_eq!(page.listener_count(), 1);
}

#[test]
fn teardown_removes_every_listener() {
    let mut page = load_default(POST);
    assert!(page.listener_count() > 10);

    page.teardown();
    assert_eq!(page.listener_count(), 0);

    page.click("#toggle").unwrap();
    assert_eq!(page.attr("html", "data-theme").as_deref(), Some("light"));
    assert_eq!(page.toggle_theme(), None);
}
