//! Spinner shown while waiting on the AI provider.

use indicatif::{ProgressBar, ProgressStyle};
use std::future::Future;
use std::time::Duration;

const TICK: Duration = Duration::from_millis(90);

pub fn spinner(message: impl Into<String>) -> ProgressBar {
    let style = ProgressStyle::with_template("{spinner:.magenta} {msg} {elapsed:.dim}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ");
    let pb = ProgressBar::new_spinner();
    pb.set_style(style);
    pb.set_message(message.into());
    pb.enable_steady_tick(TICK);
    pb
}

/// Await `fut` behind a spinner; the spinner is cleared either way.
pub async fn with_spinner<F: Future>(message: impl Into<String>, fut: F) -> F::Output {
    let pb = spinner(message);
    let out = fut.await;
    pb.finish_and_clear();
    out
}
