//! Path-only rules: ancestry against the two named folders, and stem identity.
//!
//! Nothing here lists directories. The only filesystem access is an existence
//! check on the candidate itself.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::config::Roots;

/// Folder name that marks the source tree.
pub const SOURCE_DIR_NAME: &str = "Pictures";

/// Folder name that marks the derived (wallpaper) tree.
pub const DERIVED_DIR_NAME: &str = "CustomWallpapers";

/// Extension every materialized wallpaper carries.
pub const DERIVED_EXTENSION: &str = "jpg";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectoryToken {
    SourceRoot,
    DerivedRoot,
}

impl DirectoryToken {
    pub const fn dir_name(self) -> &'static str {
        match self {
            DirectoryToken::SourceRoot => SOURCE_DIR_NAME,
            DirectoryToken::DerivedRoot => DERIVED_DIR_NAME,
        }
    }
}

/// Where a path sits relative to the two named folders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    Derived,
    Source,
    Outside,
}

/// Identity key linking a source picture to its wallpaper copy.
///
/// Compared byte-for-byte as the filesystem reports it: no case folding and
/// no Unicode normalization.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WallpaperStem(OsString);

impl WallpaperStem {
    pub fn of(path: &Path) -> Option<Self> {
        path.file_stem().map(|stem| Self(stem.to_os_string()))
    }

    pub fn as_os_str(&self) -> &OsStr {
        &self.0
    }

    /// File name `<stem>.<extension>`.
    pub fn file_name(&self, extension: &str) -> OsString {
        let mut name = self.0.clone();
        name.push(".");
        name.push(extension);
        name
    }
}

impl fmt::Display for WallpaperStem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

/// Directories above `path`, nearest first, ending at the filesystem root.
pub fn parent_dirs(path: &Path) -> impl Iterator<Item = &Path> {
    path.ancestors().skip(1)
}

/// Absolute form with `.` dropped and `..` applied lexically. Symlinks are
/// left alone so a linked `Pictures` keeps its name.
pub fn normalize(path: &Path) -> Option<PathBuf> {
    let absolute = std::path::absolute(path).ok()?;
    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    Some(normalized)
}

fn absolute_existing(path: &Path) -> Option<PathBuf> {
    if !path.exists() {
        return None;
    }
    normalize(path)
}

/// True when some directory above `path` is named after `token`.
/// A path that does not exist is never under anything.
pub fn is_under_named_ancestor(path: &Path, token: DirectoryToken) -> bool {
    let Some(absolute) = absolute_existing(path) else {
        return false;
    };
    let name = OsStr::new(token.dir_name());
    let found = parent_dirs(&absolute).any(|dir| dir.file_name() == Some(name));
    found
}

/// Single upward walk. A `CustomWallpapers` ancestor wins over any
/// `Pictures` ancestor, wherever the two sit in the chain.
pub fn region_of(path: &Path) -> Region {
    let Some(absolute) = absolute_existing(path) else {
        return Region::Outside;
    };

    let mut in_source = false;
    for dir in parent_dirs(&absolute) {
        match dir.file_name().and_then(OsStr::to_str) {
            Some(DERIVED_DIR_NAME) => return Region::Derived,
            Some(SOURCE_DIR_NAME) => in_source = true,
            _ => {}
        }
    }

    if in_source {
        Region::Source
    } else {
        Region::Outside
    }
}

/// [`region_of`], plus containment in the configured roots, whatever
/// those directories are called. The derived root still wins.
pub fn region_within(path: &Path, roots: &Roots) -> Region {
    let Some(absolute) = absolute_existing(path) else {
        return Region::Outside;
    };
    let inside = |root: &Path| normalize(root).is_some_and(|root| absolute.starts_with(root));

    match region_of(path) {
        Region::Derived => Region::Derived,
        _ if inside(&roots.derived) => Region::Derived,
        Region::Source => Region::Source,
        _ if inside(&roots.source) => Region::Source,
        Region::Outside => Region::Outside,
    }
}

pub fn stems_equal(a: &Path, b: &Path) -> bool {
    match (a.file_stem(), b.file_stem()) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// Compares canonical forms when both resolve, raw paths otherwise.
pub fn same_physical_path(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}
