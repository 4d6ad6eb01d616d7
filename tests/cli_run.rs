use std::path::Path;

use clap::Parser as _;
use serde_json::Value;
use tempfile::tempdir;

use site_chrome::{CliArgs, ProgressMode};

const POST: &str = r##"<!DOCTYPE html>
<html><head><title>Post</title></head>
<body>
<header><button class="theme-toggle">theme</button></header>
<aside class="toc-sidebar"><div id="toc"></div></aside>
<article class="post-content">
  <h1>Intro</h1><p>a</p>
  <h2>Details</h2><p>b</p>
  <h2>More</h2><p>c</p>
</article>
</body></html>"##;

const ABOUT: &str = r#"<html><body><button class="theme-toggle">theme</button><p>About us</p></body></html>"#;

fn write(path: &Path, contents: &str) {
    std::fs::write(path, contents).unwrap();
}

fn args(dir: &Path) -> CliArgs {
    CliArgs {
        input: vec![dir.join("post.html"), dir.join("about.html")],
        config: None,
        store: Some(dir.join("prefs.json")),
        system_scheme: None,
        viewport_height: 800.0,
        events: Some(dir.join("events.json")),
        report: Some(dir.join("report.json")),
        dump_dir: Some(dir.join("out")),
        progress: ProgressMode::Never,
    }
}

#[test]
fn replays_script_across_pages_and_reports() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("post.html"), POST);
    write(&dir.path().join("about.html"), ABOUT);
    write(
        &dir.path().join("events.json"),
        r##"[
            "toggle_theme",
            {"rect": {"selector": "#heading-1", "top": 1000, "height": 30}},
            {"scroll": 850}
        ]"##,
    );

    site_chrome::run(args(dir.path())).unwrap();

    let report: Value =
        serde_json::from_slice(&std::fs::read(dir.path().join("report.json")).unwrap()).unwrap();
    let pages = report.as_array().unwrap();
    assert_eq!(pages.len(), 2);

    // The first page's choice is what the second page starts from.
    assert_eq!(pages[0]["theme"], "dark");
    assert_eq!(pages[1]["theme"], "light");

    assert_eq!(pages[0]["headings"].as_array().unwrap().len(), 3);
    assert_eq!(pages[0]["headings"][1]["level"], 2);
    assert_eq!(pages[0]["active_heading"], "heading-1");
    assert_eq!(pages[0]["skipped_steps"], 0);
    assert_eq!(pages[1]["skipped_steps"], 1);
    assert_eq!(pages[1]["navigation"], Value::Null);

    let prefs: Value =
        serde_json::from_slice(&std::fs::read(dir.path().join("prefs.json")).unwrap()).unwrap();
    assert_eq!(prefs["theme"], "light");

    let dumped = std::fs::read_to_string(dir.path().join("out").join("post.html")).unwrap();
    assert!(dumped.contains(r#"data-theme="dark""#));
    assert!(dumped.contains(r##"href="#heading-2""##));
}

#[test]
fn each_report_carries_only_its_own_trace() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("post.html"), POST);
    write(&dir.path().join("about.html"), ABOUT);
    write(&dir.path().join("events.json"), r#"["toggle_theme"]"#);

    site_chrome::run(args(dir.path())).unwrap();

    let report: Value =
        serde_json::from_slice(&std::fs::read(dir.path().join("report.json")).unwrap()).unwrap();
    let post: Vec<&str> = report[0]["trace"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(Value::as_str)
        .collect();
    assert_eq!(post.first(), Some(&"theme:apply light"));
    assert!(post.contains(&"toc:build 3"));
    assert_eq!(post.last(), Some(&"theme:apply dark"));

    let about: Vec<&str> = report[1]["trace"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(Value::as_str)
        .collect();
    assert_eq!(about, vec!["theme:apply dark", "ready", "theme:apply light"]);
}

#[test]
fn inputs_sharing_a_file_name_cannot_be_dumped_together() {
    let dir = tempdir().unwrap();
    std::fs::create_dir(dir.path().join("blog")).unwrap();
    write(&dir.path().join("post.html"), POST);
    write(&dir.path().join("blog").join("post.html"), POST);
    write(&dir.path().join("events.json"), "[]");

    let mut args = args(dir.path());
    args.input = vec![dir.path().join("post.html"), dir.path().join("blog").join("post.html")];
    let err = site_chrome::run(args).unwrap_err();
    assert!(err.to_string().contains("post.html"));
    assert!(!dir.path().join("out").exists());
    assert!(!dir.path().join("report.json").exists());
}

#[test]
fn corrupt_store_degrades_to_session_memory() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("post.html"), POST);
    write(&dir.path().join("about.html"), ABOUT);
    write(&dir.path().join("events.json"), r#"["toggle_theme"]"#);
    write(&dir.path().join("prefs.json"), "not json");

    site_chrome::run(args(dir.path())).unwrap();

    let report: Value =
        serde_json::from_slice(&std::fs::read(dir.path().join("report.json")).unwrap()).unwrap();
    // Nothing persists, so every page starts light and toggles to dark.
    assert_eq!(report[0]["theme"], "dark");
    assert_eq!(report[1]["theme"], "dark");
}

#[test]
fn system_scheme_and_config_are_honored() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("post.html"), POST);
    write(&dir.path().join("about.html"), ABOUT);
    write(&dir.path().join("events.json"), "[]");
    write(
        &dir.path().join("config.json"),
        r#"{"theme": {"storage_key": "site-theme"}}"#,
    );

    let mut args = args(dir.path());
    args.system_scheme = Some(site_chrome::theme::ColorScheme::Dark);
    args.config = Some(dir.path().join("config.json"));
    site_chrome::run(args).unwrap();

    let report: Value =
        serde_json::from_slice(&std::fs::read(dir.path().join("report.json")).unwrap()).unwrap();
    assert_eq!(report[0]["theme"], "dark");
    assert!(!dir.path().join("prefs.json").exists(), "no toggle, no write");
}

#[test]
fn invalid_config_is_rejected() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("post.html"), POST);
    write(&dir.path().join("about.html"), ABOUT);
    write(&dir.path().join("events.json"), "[]");
    write(
        &dir.path().join("config.json"),
        r#"{"toc": {"root_margin": "twenty percent"}}"#,
    );

    let mut args = args(dir.path());
    args.config = Some(dir.path().join("config.json"));
    assert!(site_chrome::run(args).is_err());
}

#[test]
fn missing_input_is_an_error() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("events.json"), "[]");
    let err = site_chrome::run(args(dir.path())).unwrap_err();
    assert!(format!("{err:#}").contains("post.html"));
}

#[test]
fn parses_command_line() {
    let args = CliArgs::try_parse_from([
        "site-chrome",
        "--input",
        "a.html",
        "--input",
        "b.html",
        "--system-scheme",
        "dark",
        "--progress",
        "never",
    ])
    .unwrap();
    assert_eq!(args.input.len(), 2);
    assert_eq!(args.viewport_height, 800.0);
    assert!(args.store.is_none());

    assert!(CliArgs::try_parse_from(["site-chrome"]).is_err());
}
