use std::time::{Duration, Instant};

use indicatif::{HumanDuration, MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};

pub struct Progress {
    enabled: bool,
    start: Instant,

    // UI
    mp: Option<MultiProgress>,
    stage: ProgressBar,
    pages: ProgressBar,

    // Counters
    pages_done: u64,
    steps_skipped: u64,
}

impl Progress {
    pub fn new(enabled: bool) -> Self {
        let start = Instant::now();

        if !enabled {
            return Self {
                enabled: false,
                start,
                mp: None,
                stage: ProgressBar::hidden(),
                pages: ProgressBar::hidden(),
                pages_done: 0,
                steps_skipped: 0,
            };
        }

        let mp = MultiProgress::with_draw_target(ProgressDrawTarget::stderr());

        let stage = mp.add(ProgressBar::new_spinner());
        if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}  [{elapsed_precise}]") {
            stage.set_style(style);
        }
        stage.enable_steady_tick(Duration::from_millis(80));
        stage.set_message("starting");

        let pages = mp.add(ProgressBar::new(0));
        if let Ok(style) = ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} {msg}") {
            pages.set_style(style.progress_chars("##-"));
        }
        pages.set_message("pages");

        Self {
            enabled: true,
            start,
            mp: Some(mp),
            stage,
            pages,
            pages_done: 0,
            steps_skipped: 0,
        }
    }

    pub fn set_stage(&self, msg: impl Into<String>) {
        if !self.enabled {
            return;
        }
        self.stage.set_message(msg.into());
    }

    pub fn set_pages_total(&self, total: usize) {
        if self.enabled {
            self.pages.set_length(total as u64);
        }
    }

    pub fn page_done(&mut self, name: &str) {
        self.pages_done += 1;
        if self.enabled {
            self.pages.inc(1);
            self.pages.set_message(name.to_string());
        }
    }

    pub fn step_skipped(&mut self) {
        self.steps_skipped += 1;
    }

    pub fn finish(&self) {
        if !self.enabled {
            return;
        }
        self.stage.finish_with_message("done");
        self.pages.finish_and_clear();
        if let Some(mp) = &self.mp {
            // Best effort: the summary line is cosmetic.
            let _ = mp.println(format!(
                "{} pages, {} skipped steps in {}",
                self.pages_done,
                self.steps_skipped,
                HumanDuration(self.start.elapsed())
            ));
        }
    }
}
