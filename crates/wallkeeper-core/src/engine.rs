use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

use crate::catalog::SourceCatalog;
use crate::classifier::{WallpaperStem, DERIVED_EXTENSION};
use crate::config::{AppConfig, Roots};
use crate::error::Error;
use crate::index::{WallpaperSetIndex, PARTIAL_PREFIX};
use crate::notifier::{ExternalNotifier, ShellNotifier};
use crate::progress::SyncReporter;
use crate::resolver::{Classification, MembershipResolver};
use crate::transform::{self, Bounds, ImageTransform, RasterTransform};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncAction {
    Add,
    Remove,
    LocateSource,
}

impl SyncAction {
    /// Classification a path must have for this action to apply.
    pub const fn required(self) -> Classification {
        match self {
            SyncAction::Add => Classification::Addable,
            SyncAction::Remove => Classification::Removable,
            SyncAction::LocateSource => Classification::SourceLookupable,
        }
    }

    pub const fn mutates(self) -> bool {
        !matches!(self, SyncAction::LocateSource)
    }
}

impl fmt::Display for SyncAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SyncAction::Add => "add to wallpapers",
            SyncAction::Remove => "remove from wallpapers",
            SyncAction::LocateSource => "go to source wallpaper",
        };
        f.write_str(label)
    }
}

/// Asked once per path before a mutating action touches the filesystem.
pub trait Confirmation {
    fn confirm(&self, action: SyncAction, path: &Path) -> bool;
}

pub struct AutoConfirm;

impl Confirmation for AutoConfirm {
    fn confirm(&self, _action: SyncAction, _path: &Path) -> bool {
        true
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Wallpaper written at this path.
    Added(PathBuf),
    /// Wallpaper deleted from this path.
    Removed(PathBuf),
    /// Source pictures revealed in the file manager.
    Located(Vec<PathBuf>),
}

#[derive(Debug)]
pub struct SyncReport {
    pub action: SyncAction,
    pub completed: Vec<(PathBuf, Outcome)>,
    pub skipped: Vec<(PathBuf, Classification)>,
    pub declined: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, Error)>,
}

impl SyncReport {
    fn new(action: SyncAction) -> Self {
        Self {
            action,
            completed: Vec::new(),
            skipped: Vec::new(),
            declined: Vec::new(),
            failed: Vec::new(),
        }
    }

    /// True when at least one derived file was written or deleted.
    pub fn mutated(&self) -> bool {
        self.completed
            .iter()
            .any(|(_, outcome)| !matches!(outcome, Outcome::Located(_)))
    }
}

/// Performs Add / Remove / LocateSource against the two roots.
///
/// Holds no state between calls: every call lists the derived root afresh.
/// Callers serialize calls that touch the same stem.
pub struct SyncEngine {
    roots: Roots,
    bounds: Bounds,
    ignore_patterns: Vec<String>,
    transform: Box<dyn ImageTransform>,
    notifier: Box<dyn ExternalNotifier>,
    confirmation: Box<dyn Confirmation>,
}

impl SyncEngine {
    pub fn new(roots: Roots) -> Self {
        Self {
            roots,
            bounds: Bounds::DEFAULT,
            ignore_patterns: Vec::new(),
            transform: Box::new(RasterTransform::default()),
            notifier: Box::new(ShellNotifier),
            confirmation: Box::new(AutoConfirm),
        }
    }

    pub fn from_config(config: &AppConfig, roots: Roots) -> Self {
        Self {
            bounds: config.bounds(),
            ignore_patterns: config.ignore_patterns.clone(),
            transform: transform::from_config(config),
            ..Self::new(roots)
        }
    }

    pub fn with_bounds(mut self, bounds: Bounds) -> Self {
        self.bounds = bounds;
        self
    }

    pub fn with_transform(mut self, transform: impl ImageTransform + 'static) -> Self {
        self.transform = Box::new(transform);
        self
    }

    pub fn with_notifier(mut self, notifier: impl ExternalNotifier + 'static) -> Self {
        self.notifier = Box::new(notifier);
        self
    }

    pub fn with_confirmation(mut self, confirmation: impl Confirmation + 'static) -> Self {
        self.confirmation = Box::new(confirmation);
        self
    }

    pub fn roots(&self) -> &Roots {
        &self.roots
    }

    pub fn load_index(&self) -> WallpaperSetIndex {
        WallpaperSetIndex::load_or_empty(&self.roots.derived)
    }

    pub fn resolver<'a>(&'a self, index: &'a WallpaperSetIndex) -> MembershipResolver<'a> {
        MembershipResolver::new(&self.roots, index).with_ignore_patterns(&self.ignore_patterns)
    }

    /// Materializes one Addable picture and refreshes overlays.
    pub fn add(&self, path: &Path) -> Result<PathBuf, Error> {
        let index = self.load_index();
        self.require(path, SyncAction::Add, &self.resolver(&index))?;
        let dest = self.materialize(path)?;
        self.notifier.refresh();
        Ok(dest)
    }

    /// Deletes the wallpaper of one Removable picture and refreshes overlays.
    pub fn remove(&self, path: &Path) -> Result<PathBuf, Error> {
        let index = self.load_index();
        self.require(path, SyncAction::Remove, &self.resolver(&index))?;
        let removed = self.unmaterialize(path)?;
        self.notifier.refresh();
        Ok(removed)
    }

    /// Reveals every source picture sharing the wallpaper's stem.
    pub fn locate_source(&self, path: &Path) -> Result<Vec<PathBuf>, Error> {
        let index = self.load_index();
        let resolver = self.resolver(&index);
        self.require(path, SyncAction::LocateSource, &resolver)?;
        Ok(self.reveal_matches(path, resolver.catalog()))
    }

    /// Runs `action` over a selection. Ineligible paths are skipped, failures
    /// are collected, and overlays are refreshed once if anything changed.
    pub fn apply<P: AsRef<Path>>(
        &self,
        action: SyncAction,
        selection: &[P],
        reporter: &dyn SyncReporter,
    ) -> SyncReport {
        let index = self.load_index();
        let resolver = self.resolver(&index);
        let mut report = SyncReport::new(action);

        reporter.on_batch_start(action, selection.len());
        for (position, path) in selection.iter().enumerate() {
            let path = path.as_ref();
            reporter.on_item_start(position, path);

            let classification = resolver.classify(path);
            if classification != action.required() {
                report.skipped.push((path.to_path_buf(), classification));
            } else if action.mutates() && !self.confirmation.confirm(action, path) {
                debug!("{} declined for {}", action, path.display());
                report.declined.push(path.to_path_buf());
            } else {
                let result = match action {
                    SyncAction::Add => self.materialize(path).map(Outcome::Added),
                    SyncAction::Remove => self.unmaterialize(path).map(Outcome::Removed),
                    SyncAction::LocateSource => {
                        Ok(Outcome::Located(self.reveal_matches(path, resolver.catalog())))
                    }
                };
                match result {
                    Ok(outcome) => report.completed.push((path.to_path_buf(), outcome)),
                    Err(Error::PathNotFound(_)) => {
                        debug!("{} vanished before {}", path.display(), action);
                        report
                            .skipped
                            .push((path.to_path_buf(), Classification::Unmanaged));
                    }
                    Err(err) => {
                        error!("Failed to {} {}: {}", action, path.display(), err);
                        report.failed.push((path.to_path_buf(), err));
                    }
                }
            }

            reporter.on_item_complete(position, path);
        }

        if report.mutated() {
            self.notifier.refresh();
        }
        info!(
            "{}: {} done, {} skipped, {} declined, {} failed",
            action,
            report.completed.len(),
            report.skipped.len(),
            report.declined.len(),
            report.failed.len()
        );
        reporter.on_batch_complete(&report);
        report
    }

    fn require(
        &self,
        path: &Path,
        action: SyncAction,
        resolver: &MembershipResolver<'_>,
    ) -> Result<(), Error> {
        if !path.exists() {
            return Err(Error::PathNotFound(path.to_path_buf()));
        }
        let classification = resolver.classify(path);
        if classification == action.required() {
            Ok(())
        } else {
            Err(Error::NotEligible {
                path: path.to_path_buf(),
                action,
                classification,
            })
        }
    }

    /// `.jpg` pictures are copied under their own name, anything else is
    /// converted to `<stem>.jpg`. Output is staged in a hidden temporary
    /// file and published with a no-clobber rename.
    fn materialize(&self, path: &Path) -> Result<PathBuf, Error> {
        let stem = WallpaperStem::of(path).ok_or_else(|| Error::PathNotFound(path.to_path_buf()))?;
        let verbatim = path
            .extension()
            .is_some_and(|ext| ext == DERIVED_EXTENSION);
        let file_name = match path.file_name() {
            Some(name) if verbatim => name.to_os_string(),
            _ => stem.file_name(DERIVED_EXTENSION),
        };
        let dest = self.roots.derived.join(file_name);
        if !path.exists() {
            return Err(Error::PathNotFound(path.to_path_buf()));
        }
        if dest.exists() {
            return Err(Error::DestinationExists(dest));
        }

        fs::create_dir_all(&self.roots.derived)?;
        let staging = tempfile::Builder::new()
            .prefix(PARTIAL_PREFIX)
            .suffix(&format!(".{}", DERIVED_EXTENSION))
            .tempfile_in(&self.roots.derived)?
            .into_temp_path();

        let written = if verbatim {
            fs::copy(path, &staging).map(drop).map_err(Error::from)
        } else {
            self.transform.convert(path, &staging, self.bounds)
        };
        if let Err(err) = written {
            if !path.exists() {
                return Err(Error::PathNotFound(path.to_path_buf()));
            }
            return Err(err);
        }

        staging.persist_noclobber(&dest).map_err(|err| {
            if err.error.kind() == io::ErrorKind::AlreadyExists {
                Error::DestinationExists(dest.clone())
            } else {
                Error::Io(err.error)
            }
        })?;

        info!("Added {} as {}", path.display(), dest.display());
        Ok(dest)
    }

    /// Deletes `<stem>.jpg`. If it is already gone, reloads the index once
    /// and deletes whatever file now carries the stem.
    fn unmaterialize(&self, path: &Path) -> Result<PathBuf, Error> {
        let stem = WallpaperStem::of(path).ok_or_else(|| Error::PathNotFound(path.to_path_buf()))?;
        let target = self.roots.derived.join(stem.file_name(DERIVED_EXTENSION));

        match fs::remove_file(&target) {
            Ok(()) => {
                info!("Removed {}", target.display());
                Ok(target)
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!("{} missing, reloading wallpaper index", target.display());
                let index = self.load_index();
                let Some(actual) = index.file_for(&stem) else {
                    return Err(Error::NotFound(target));
                };
                match fs::remove_file(actual) {
                    Ok(()) => {
                        info!("Removed {}", actual.display());
                        Ok(actual.to_path_buf())
                    }
                    Err(err) if err.kind() == io::ErrorKind::NotFound => {
                        Err(Error::NotFound(target))
                    }
                    Err(err) => Err(err.into()),
                }
            }
            Err(err) => Err(err.into()),
        }
    }

    fn reveal_matches(&self, path: &Path, catalog: &SourceCatalog) -> Vec<PathBuf> {
        let matches = catalog.matches_for(path);
        if matches.is_empty() {
            debug!("No source picture left for {}", path.display());
        }
        for found in &matches {
            self.notifier.open_and_select(found);
        }
        matches
    }
}
