use std::sync::Mutex;
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};

use crate::app::{ProgressEvent, ProgressSink};

/// Style for the byte counter once the total size is known.
pub fn default_bytes_style() -> ProgressStyle {
    ProgressStyle::with_template(
        "  {spinner:.dim} {prefix:10!} [{elapsed_precise}] [{bar:30!.bright.yellow/dim.white}] {bytes:>9}/{total_bytes:9} @ {bytes_per_sec}",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar())
    .progress_chars("━━╾─")
}

/// Style for a transfer whose size the server did not announce.
pub fn unknown_length_style() -> ProgressStyle {
    ProgressStyle::with_template("  {spinner:.dim} {prefix:10!} [{elapsed_precise}] {bytes:>9}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

pub fn long_running_progress_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.green} {prefix:.bold} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

/// Renders fetch progress on stderr: a status spinner plus a byte bar while downloading.
pub struct TerminalProgress {
    multi: MultiProgress,
    status: ProgressBar,
    transfer: Mutex<Option<ProgressBar>>,
}

impl TerminalProgress {
    pub fn new() -> Self {
        let multi = MultiProgress::with_draw_target(ProgressDrawTarget::stderr_with_hz(20));
        let status = multi.add(ProgressBar::new_spinner());
        status.set_style(long_running_progress_style());
        status.enable_steady_tick(Duration::from_millis(100));
        Self {
            multi,
            status,
            transfer: Mutex::new(None),
        }
    }

    pub fn finish(&self) {
        if let Ok(mut transfer) = self.transfer.lock() {
            if let Some(bar) = transfer.take() {
                bar.finish();
            }
        }
        self.status.finish_and_clear();
    }

    fn transfer_bar(&self, total: Option<u64>) -> Option<ProgressBar> {
        let mut slot = self.transfer.lock().ok()?;
        let bar = slot.get_or_insert_with(|| {
            let bar = self.multi.add(ProgressBar::no_length());
            bar.set_style(unknown_length_style());
            bar.set_prefix("Download");
            bar
        });
        if let Some(total) = total {
            if bar.length() != Some(total) {
                bar.set_length(total);
                bar.set_style(default_bytes_style());
            }
        }
        Some(bar.clone())
    }
}

impl Default for TerminalProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for TerminalProgress {
    fn event(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::Phase { phase, message } => {
                self.status.set_prefix(phase.label());
                self.status.set_message(message);
            }
            ProgressEvent::Transfer { downloaded, total } => {
                if let Some(bar) = self.transfer_bar(total) {
                    bar.set_position(downloaded);
                }
            }
        }
    }
}
