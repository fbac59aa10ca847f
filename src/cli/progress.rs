//! Terminal progress display
//!
//! Bars are drawn on stderr only when it is a terminal; otherwise a hidden
//! bar is handed out so callers never branch on it.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use crate::errors::{AppError, Result};

const BAR_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}";
const SPINNER_TEMPLATE: &str = "{spinner:.green} {msg}";
const TICK: Duration = Duration::from_millis(120);

/// When to draw progress
#[derive(Debug, Clone, Copy)]
pub struct ProgressConfig {
    /// Draw at all (off in quiet mode)
    pub enabled: bool,
    /// Whether stderr is a terminal
    pub is_terminal: bool,
}

impl ProgressConfig {
    /// Detect the terminal; `quiet` turns drawing off
    pub fn detect(quiet: bool) -> Self {
        Self {
            enabled: !quiet,
            is_terminal: atty::is(atty::Stream::Stderr),
        }
    }

    fn draws(&self) -> bool {
        self.enabled && self.is_terminal
    }

    /// Per-file download bar; the reconciler sets its length
    pub fn download_bar(&self) -> Result<ProgressBar> {
        if !self.draws() {
            return Ok(ProgressBar::hidden());
        }
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::default_bar()
                .template(BAR_TEMPLATE)
                .map_err(|e| AppError::generic(format!("Progress bar template error: {}", e)))?
                .progress_chars("##-"),
        );
        Ok(bar)
    }

    /// Spinner for a phase of unknown length, such as a crawl
    pub fn spinner(&self, message: impl Into<String>) -> Result<ProgressBar> {
        if !self.draws() {
            return Ok(ProgressBar::hidden());
        }
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template(SPINNER_TEMPLATE)
                .map_err(|e| AppError::generic(format!("Spinner template error: {}", e)))?
                .tick_strings(&["◐", "◓", "◑", "◒"]),
        );
        spinner.set_message(message.into());
        spinner.enable_steady_tick(TICK);
        Ok(spinner)
    }
}
