//! Progress and state notification.

use std::fmt;

use tracing::{debug, info};

type ProgressFn = Box<dyn Fn(u8, Option<&str>)>;
type StateFn = Box<dyn Fn(&str)>;

/// Optional observers for a backup or restore run.
///
/// Every notification is also logged; a missing callback is not an error.
#[derive(Default)]
pub struct Notifier {
    progress: Option<ProgressFn>,
    state: Option<StateFn>,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs the progress callback: `(percentage, current table label)`.
    pub fn on_progress(mut self, callback: impl Fn(u8, Option<&str>) + 'static) -> Self {
        self.progress = Some(Box::new(callback));
        self
    }

    /// Installs the state callback, which receives lifecycle texts.
    pub fn on_state(mut self, callback: impl Fn(&str) + 'static) -> Self {
        self.state = Some(Box::new(callback));
        self
    }

    pub fn progress(&self, percent: u8, label: Option<&str>) {
        debug!(percent, label, "progress");
        if let Some(callback) = &self.progress {
            callback(percent.min(100), label);
        }
    }

    pub fn state(&self, text: &str) {
        info!("{text}");
        if let Some(callback) = &self.state {
            callback(text);
        }
    }
}

impl fmt::Debug for Notifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field("progress", &self.progress.is_some())
            .field("state", &self.state.is_some())
            .finish()
    }
}

/// Integer percentage of `done` over `total`, clamped to 100.
///
/// An empty total counts as complete.
pub fn percent(done: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    let value = done.saturating_mul(100) / total;
    value.min(100) as u8
}
