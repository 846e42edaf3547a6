use indicatif::{ProgressBar, ProgressStyle};
use std::cell::RefCell;
use std::path::Path;
use wallkeeper_core::{SyncAction, SyncReport, SyncReporter};

/// Progress bar over the selection, cleared when the batch ends.
pub struct CliReporter {
    bar: RefCell<Option<ProgressBar>>,
}

impl CliReporter {
    pub fn new() -> Self {
        Self {
            bar: RefCell::new(None),
        }
    }
}

impl SyncReporter for CliReporter {
    fn on_batch_start(&self, action: SyncAction, total: usize) {
        let pb = ProgressBar::new(total as u64);
        if let Ok(style) = ProgressStyle::with_template(
            "  {spinner:.cyan} {prefix} [{bar:30.cyan/dim}] {pos}/{len} {wide_msg}",
        ) {
            pb.set_style(
                style
                    .progress_chars("━╸─")
                    .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
            );
        }
        pb.set_prefix(action.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(80));
        *self.bar.borrow_mut() = Some(pb);
    }

    fn on_item_start(&self, _position: usize, path: &Path) {
        if let Some(pb) = self.bar.borrow().as_ref() {
            let name = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            pb.set_message(name);
        }
    }

    fn on_item_complete(&self, _position: usize, _path: &Path) {
        if let Some(pb) = self.bar.borrow().as_ref() {
            pb.inc(1);
        }
    }

    fn on_batch_complete(&self, _report: &SyncReport) {
        if let Some(pb) = self.bar.borrow_mut().take() {
            pb.finish_and_clear();
        }
    }
}
