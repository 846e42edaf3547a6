pub mod catalog;
pub mod classifier;
pub mod config;
pub mod engine;
pub mod error;
pub mod index;
pub mod notifier;
pub mod progress;
pub mod resolver;
pub mod transform;

pub use classifier::{DirectoryToken, Region, WallpaperStem};
pub use config::{AppConfig, Roots};
pub use engine::{AutoConfirm, Confirmation, Outcome, SyncAction, SyncEngine, SyncReport};
pub use error::Error;
pub use index::WallpaperSetIndex;
pub use notifier::{ExternalNotifier, ShellNotifier, SilentNotifier};
pub use progress::{SilentReporter, SyncReporter};
pub use resolver::{Classification, MembershipResolver, MenuActions, OVERLAY_PRIORITY};
pub use transform::{Bounds, CommandTransform, ImageTransform, RasterTransform};
