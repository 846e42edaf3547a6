use std::path::Path;

use crate::engine::{SyncAction, SyncReport};

/// Trait for reporting batch progress.
///
/// CLI implements with indicatif. All methods have default no-op implementations.
pub trait SyncReporter {
    fn on_batch_start(&self, _action: SyncAction, _total: usize) {}
    fn on_item_start(&self, _position: usize, _path: &Path) {}
    fn on_item_complete(&self, _position: usize, _path: &Path) {}
    fn on_batch_complete(&self, _report: &SyncReport) {}
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl SyncReporter for SilentReporter {}
