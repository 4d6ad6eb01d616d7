pub mod app;
mod cli;
pub mod config;
pub mod dom;
pub mod dropdown;
pub mod environment;
pub mod events;
pub mod markup;
pub mod navigation;
pub mod page;
mod progress;
pub mod script;
pub mod storage;
pub mod theme;
pub mod toc;
pub mod viewport;

use std::collections::HashSet;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::Serialize;

use cli::Args;
use config::ChromeConfig;
use environment::{Environment, ScrollRequest};
use navigation::NavVariant;
use page::{HeadingState, Page, PageError};
use storage::{DisabledStore, JsonFileStore, MemoryStore, ResilientStore};
use theme::Theme;
use viewport::Viewport;

pub use cli::ProgressMode;
pub use cli::Args as CliArgs;

/// What one page looked like after startup and the replayed script.
#[derive(Debug, Clone, Serialize)]
pub struct PageReport {
    pub path: PathBuf,
    pub theme: Option<Theme>,
    pub navigation: Option<NavVariant>,
    pub navigation_open: bool,
    pub open_dropdowns: usize,
    pub headings: Vec<HeadingState>,
    pub active_heading: Option<String>,
    pub navigations: Vec<String>,
    pub scroll_requests: Vec<ScrollRequest>,
    pub skipped_steps: usize,
    /// Lifecycle effects in order, from startup through the last step.
    pub trace: Vec<String>,
}

/// Where each page's preference store comes from. A file is reopened for every
/// page so a choice made on one page is seen by the next; the in-memory store
/// shares its entries between clones.
enum StoreSource {
    File(PathBuf),
    Memory(MemoryStore),
}

impl StoreSource {
    fn open(&self) -> ResilientStore {
        match self {
            StoreSource::File(path) => match JsonFileStore::open(path) {
                Ok(store) => ResilientStore::new(store),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "preference store unavailable");
                    ResilientStore::new(DisabledStore)
                }
            },
            StoreSource::Memory(store) => ResilientStore::new(store.clone()),
        }
    }
}

pub fn run(args: Args) -> anyhow::Result<()> {
    use std::io::IsTerminal as _;

    let progress_enabled = match args.progress {
        ProgressMode::Always => true,
        ProgressMode::Never => false,
        ProgressMode::Auto => std::io::stderr().is_terminal(),
    };
    let mut progress = progress::Progress::new(progress_enabled);
    progress.set_stage("loading config");

    let config = match &args.config {
        Some(path) => ChromeConfig::load(path)?,
        None => ChromeConfig::default(),
    };
    config.validate().context("invalid config")?;

    let steps = match &args.events {
        Some(path) => script::load_script(path)?,
        None => Vec::new(),
    };

    let source = match &args.store {
        Some(path) => StoreSource::File(path.clone()),
        None => StoreSource::Memory(MemoryStore::default()),
    };

    if let Some(dir) = &args.dump_dir {
        let mut names = HashSet::new();
        for path in &args.input {
            let name = dump_name(path);
            if !names.insert(name.clone()) {
                anyhow::bail!(
                    "more than one input would be dumped to {}",
                    dir.join(name).display()
                );
            }
        }
        std::fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    }

    progress.set_pages_total(args.input.len());
    let mut reports = Vec::with_capacity(args.input.len());
    for path in &args.input {
        progress.set_stage(format!("loading {}", path.display()));
        let html =
            std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;

        let env = Environment::new(source.open())
            .with_color_scheme(args.system_scheme)
            .with_viewport(Viewport {
                height: args.viewport_height,
                ..Viewport::default()
            });
        let mut page = Page::load(&html, env, &config);

        let mut skipped_steps = 0;
        for (i, step) in steps.iter().enumerate() {
            match script::apply_step(&mut page, step) {
                Ok(()) => {}
                Err(PageError::NoMatch(selector)) => {
                    tracing::warn!(step = i, %selector, page = %path.display(), "step skipped");
                    skipped_steps += 1;
                    progress.step_skipped();
                }
                Err(e) => return Err(e).with_context(|| format!("step {i} on {}", path.display())),
            }
        }

        if let Some(dir) = &args.dump_dir {
            dump_page(&page, path, dir)?;
        }

        reports.push(report_for(&mut page, path, skipped_steps));
        page.teardown();
        progress.page_done(&path.display().to_string());
    }

    progress.set_stage("writing report");
    let json = serde_json::to_string_pretty(&reports).context("serialize report")?;
    match &args.report {
        Some(path) => {
            std::fs::write(path, json).with_context(|| format!("write {}", path.display()))?
        }
        None => println!("{json}"),
    }

    progress.finish();
    Ok(())
}

fn report_for(page: &mut Page, path: &Path, skipped_steps: usize) -> PageReport {
    let state = page.state();
    PageReport {
        path: path.to_path_buf(),
        theme: state.theme,
        navigation: state.navigation,
        navigation_open: state.navigation_open,
        open_dropdowns: state.open_dropdowns,
        headings: state.headings,
        active_heading: state.active_heading,
        navigations: page.env().navigations.clone(),
        scroll_requests: page.env().scroll_requests.clone(),
        skipped_steps,
        trace: page.take_trace(),
    }
}

fn dump_page(page: &Page, path: &Path, dir: &Path) -> anyhow::Result<()> {
    let out = dir.join(dump_name(path));
    let html = page
        .html()
        .with_context(|| format!("serialize {}", path.display()))?;
    std::fs::write(&out, html).with_context(|| format!("write {}", out.display()))?;
    Ok(())
}

fn dump_name(path: &Path) -> OsString {
    path.file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "page.html".into())
}
