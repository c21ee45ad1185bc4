//! Spinners around Graph calls
//!
//! Everything draws to stderr so JSON written to stdout stays clean.

use caviz::error::Result;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::future::Future;
use std::time::Duration;

/// Container for a spinner and a bar that draw at the same time
pub fn create_multi_progress() -> MultiProgress {
    MultiProgress::new()
}

fn start_spinner(spinner: ProgressBar, message: &str) -> ProgressBar {
    let style = ProgressStyle::default_spinner()
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
        .template("{spinner:.cyan} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    spinner.set_style(style);
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

pub fn create_spinner(message: &str) -> ProgressBar {
    start_spinner(ProgressBar::new_spinner(), message)
}

/// Spinner drawn as one line of `multi`
pub fn create_spinner_in(multi: &MultiProgress, message: &str) -> ProgressBar {
    start_spinner(multi.add(ProgressBar::new_spinner()), message)
}

/// Bar counting resolved users, drawn as one line of `multi`
pub fn create_user_bar(multi: &MultiProgress, total: u64) -> ProgressBar {
    let bar = multi.add(ProgressBar::new(total));
    let style = ProgressStyle::default_bar()
        .template("{spinner:.cyan} Resolving users [{bar:30.cyan/blue}] {pos}/{len}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▓▒░ ");
    bar.set_style(style);
    bar
}

fn finish(spinner: &ProgressBar, template: &str, prefix: &'static str, message: String) {
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template(template)
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_prefix(prefix);
    spinner.finish_with_message(message);
}

/// Run `task` behind `spinner`
///
/// On success `done` builds the closing line; `None` clears the spinner
/// instead. On failure the spinner ends with `failure` and the error is
/// returned unchanged.
pub async fn with_spinner<T, F, D>(spinner: ProgressBar, failure: &str, task: F, done: D) -> Result<T>
where
    F: Future<Output = Result<T>>,
    D: FnOnce(&T) -> Option<String>,
{
    match task.await {
        Ok(value) => {
            match done(&value) {
                Some(line) => finish(&spinner, "{prefix:.green} {msg}", "✓", line),
                None => spinner.finish_and_clear(),
            }
            Ok(value)
        }
        Err(e) => {
            finish(&spinner, "{prefix:.red} {msg}", "✗", failure.to_string());
            Err(e)
        }
    }
}
