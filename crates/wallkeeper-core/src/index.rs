use ahash::AHashMap;
use std::collections::hash_map::Entry;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::classifier::WallpaperStem;
use crate::error::Error;

/// Prefix of in-flight Add outputs inside the derived root.
pub const PARTIAL_PREFIX: &str = ".wallkeeper-";

/// Snapshot of the wallpaper stems materialized in the derived root.
///
/// Built from one non-recursive listing and never updated in place. Reload
/// after every Add/Remove.
#[derive(Debug, Clone)]
pub struct WallpaperSetIndex {
    root: PathBuf,
    entries: AHashMap<WallpaperStem, PathBuf>,
}

impl WallpaperSetIndex {
    pub fn empty(derived_root: &Path) -> Self {
        Self {
            root: derived_root.to_path_buf(),
            entries: AHashMap::new(),
        }
    }

    /// Lists regular files directly inside `derived_root`. When two files
    /// share a stem the first one enumerated is kept.
    pub fn load(derived_root: &Path) -> Result<Self, Error> {
        let listing = fs::read_dir(derived_root).map_err(|source| Error::DirectoryUnavailable {
            path: derived_root.to_path_buf(),
            source,
        })?;

        let mut entries: AHashMap<WallpaperStem, PathBuf> = AHashMap::new();
        for entry in listing {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!(
                        "Error reading entry in directory {}: {}",
                        derived_root.display(),
                        err
                    );
                    continue;
                }
            };

            let path = entry.path();
            if !path.is_file() || is_partial(&path) {
                continue;
            }
            let Some(stem) = WallpaperStem::of(&path) else {
                continue;
            };

            match entries.entry(stem) {
                Entry::Occupied(existing) => debug!(
                    "Stem '{}' already indexed from {}, ignoring {}",
                    existing.key(),
                    existing.get().display(),
                    path.display()
                ),
                Entry::Vacant(slot) => {
                    slot.insert(path);
                }
            }
        }

        debug!(
            "Indexed {} wallpapers in {}",
            entries.len(),
            derived_root.display()
        );
        Ok(Self {
            root: derived_root.to_path_buf(),
            entries,
        })
    }

    /// Like [`load`](Self::load), but an unavailable directory is an empty set.
    pub fn load_or_empty(derived_root: &Path) -> Self {
        match Self::load(derived_root) {
            Ok(index) => index,
            Err(err) => {
                warn!("{}; treating wallpaper set as empty", err);
                Self::empty(derived_root)
            }
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn contains(&self, stem: &WallpaperStem) -> bool {
        self.entries.contains_key(stem)
    }

    /// The derived file that carries `stem`, as seen when the index was built.
    pub fn file_for(&self, stem: &WallpaperStem) -> Option<&Path> {
        self.entries.get(stem).map(PathBuf::as_path)
    }

    /// Stems in sorted order.
    pub fn stems(&self) -> Vec<&WallpaperStem> {
        let mut stems: Vec<&WallpaperStem> = self.entries.keys().collect();
        stems.sort();
        stems
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn is_partial(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with(PARTIAL_PREFIX))
}
