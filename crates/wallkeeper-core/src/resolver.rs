use std::cell::OnceCell;
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::catalog::SourceCatalog;
use crate::classifier::{self, Region, WallpaperStem};
use crate::config::Roots;
use crate::index::WallpaperSetIndex;

/// Priority reported alongside the overlay (0 is highest, 100 lowest).
pub const OVERLAY_PRIORITY: i32 = 90;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    /// Source picture with no wallpaper yet.
    Addable,
    /// Source picture whose stem is already a wallpaper.
    Removable,
    /// Wallpaper with at least one other file of the same stem in the source tree.
    SourceLookupable,
    Unmanaged,
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Classification::Addable => "addable",
            Classification::Removable => "removable",
            Classification::SourceLookupable => "source-lookupable",
            Classification::Unmanaged => "unmanaged",
        };
        f.write_str(label)
    }
}

/// Actions worth offering for a selection. Each flag is set if any selected
/// path qualifies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MenuActions {
    pub add: bool,
    pub remove: bool,
    pub goto_source: bool,
}

impl MenuActions {
    pub fn is_empty(&self) -> bool {
        !(self.add || self.remove || self.goto_source)
    }

    fn include(mut self, classification: Classification) -> Self {
        match classification {
            Classification::Addable => self.add = true,
            Classification::Removable => self.remove = true,
            Classification::SourceLookupable => self.goto_source = true,
            Classification::Unmanaged => {}
        }
        self
    }
}

/// Classifies paths against one index snapshot.
///
/// The source catalog needed for wallpaper lookups is scanned on first use
/// and shared by every later query on the same resolver.
pub struct MembershipResolver<'a> {
    roots: &'a Roots,
    index: &'a WallpaperSetIndex,
    ignore_patterns: &'a [String],
    catalog: OnceCell<SourceCatalog>,
}

impl<'a> MembershipResolver<'a> {
    pub fn new(roots: &'a Roots, index: &'a WallpaperSetIndex) -> Self {
        Self {
            roots,
            index,
            ignore_patterns: &[],
            catalog: OnceCell::new(),
        }
    }

    pub fn with_ignore_patterns(mut self, patterns: &'a [String]) -> Self {
        self.ignore_patterns = patterns;
        self
    }

    pub fn index(&self) -> &WallpaperSetIndex {
        self.index
    }

    pub fn catalog(&self) -> &SourceCatalog {
        self.catalog
            .get_or_init(|| SourceCatalog::scan(&self.roots.source, self.ignore_patterns))
    }

    pub fn classify(&self, path: &Path) -> Classification {
        let classification = match fs::metadata(path) {
            Ok(metadata) if metadata.is_file() => self.classify_file(path),
            _ => Classification::Unmanaged,
        };
        debug!("{} -> {}", path.display(), classification);
        classification
    }

    fn classify_file(&self, path: &Path) -> Classification {
        match classifier::region_within(path, self.roots) {
            Region::Derived => {
                if self.catalog().matches_for(path).is_empty() {
                    Classification::Unmanaged
                } else {
                    Classification::SourceLookupable
                }
            }
            Region::Source => match WallpaperStem::of(path) {
                Some(stem) if self.index.contains(&stem) => Classification::Removable,
                Some(_) => Classification::Addable,
                None => Classification::Unmanaged,
            },
            Region::Outside => Classification::Unmanaged,
        }
    }

    /// Overlay is drawn only on pictures that already have a wallpaper.
    pub fn show_overlay(&self, path: &Path) -> bool {
        self.classify(path) == Classification::Removable
    }

    pub fn menu_actions<P: AsRef<Path>>(&self, selection: &[P]) -> MenuActions {
        selection
            .iter()
            .map(|path| self.classify(path.as_ref()))
            .fold(MenuActions::default(), MenuActions::include)
    }
}
