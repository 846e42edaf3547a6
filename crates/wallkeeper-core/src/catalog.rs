use ahash::AHashMap;
use glob::Pattern;
use std::path::{Path, PathBuf};
use tracing::{debug, error, warn};
use walkdir::WalkDir;

use crate::classifier::{same_physical_path, WallpaperStem};

/// Every regular file under the source root, grouped by stem.
#[derive(Debug, Default)]
pub struct SourceCatalog {
    by_stem: AHashMap<WallpaperStem, Vec<PathBuf>>,
    total_files: usize,
}

impl SourceCatalog {
    /// Recursive walk of `source_root`, sorted by file name within each
    /// directory. Unreadable entries are logged and skipped; a missing root
    /// yields an empty catalog.
    pub fn scan(source_root: &Path, ignore_globs: &[String]) -> Self {
        let mut catalog = Self::default();

        if !source_root.is_dir() {
            warn!(
                "Source root {} is unavailable; no source pictures to match",
                source_root.display()
            );
            return catalog;
        }

        let ignore_patterns: Vec<Pattern> = ignore_globs
            .iter()
            .filter_map(|glob| match Pattern::new(glob) {
                Ok(p) => Some(p),
                Err(e) => {
                    error!("Invalid glob pattern '{}': {}", glob, e);
                    None
                }
            })
            .collect();

        let walker = WalkDir::new(source_root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                !ignore_patterns
                    .iter()
                    .any(|pattern| pattern.matches_path(entry.path()))
            });

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    error!("Error walking {}: {}", source_root.display(), err);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.into_path();
            if let Some(stem) = WallpaperStem::of(&path) {
                catalog.by_stem.entry(stem).or_default().push(path);
                catalog.total_files += 1;
            }
        }

        debug!(
            "Catalogued {} files under {}",
            catalog.total_files,
            source_root.display()
        );
        catalog
    }

    /// Files sharing `path`'s stem, excluding `path` itself.
    pub fn matches_for(&self, path: &Path) -> Vec<PathBuf> {
        let Some(stem) = WallpaperStem::of(path) else {
            return Vec::new();
        };
        self.by_stem
            .get(&stem)
            .map(|candidates| {
                candidates
                    .iter()
                    .filter(|candidate| !same_physical_path(candidate, path))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.total_files
    }

    pub fn is_empty(&self) -> bool {
        self.total_files == 0
    }
}
