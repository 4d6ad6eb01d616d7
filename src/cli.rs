use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::theme::ColorScheme;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ProgressMode {
    /// Enable progress UI when stderr is a TTY.
    Auto,
    /// Always enable progress UI (even when piped).
    Always,
    /// Never show progress UI.
    Never,
}

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Args {
    /// HTML pages to load, in visiting order. The theme store carries over from one page to the next.
    #[arg(long, required = true)]
    pub input: Vec<PathBuf>,

    /// JSON config overriding selectors, storage key, theme policy and TOC tuning.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// JSON file backing the theme preference store.
    ///
    /// If omitted, an in-memory store is shared by the pages of this run and discarded afterwards.
    #[arg(long)]
    pub store: Option<PathBuf>,

    /// OS color scheme reported to the pages. Unset means the OS reports no preference.
    #[arg(long, value_enum)]
    pub system_scheme: Option<ColorScheme>,

    /// Viewport height in px, used for the TOC trigger band.
    #[arg(long, default_value_t = 800.0)]
    pub viewport_height: f64,

    /// JSON array of interaction steps replayed on every page after startup.
    #[arg(long)]
    pub events: Option<PathBuf>,

    /// Where to write the JSON report (stdout when omitted).
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Directory receiving the final HTML of every page.
    #[arg(long)]
    pub dump_dir: Option<PathBuf>,

    /// Progress display: `auto`, `always`, or `never`.
    #[arg(long, value_enum, default_value = "auto")]
    pub progress: ProgressMode,
}
