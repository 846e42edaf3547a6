use config::{Config, Environment, File as ConfigFile};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::classifier::{DirectoryToken, DERIVED_DIR_NAME, SOURCE_DIR_NAME};
use crate::error::Error;
use crate::transform::Bounds;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub source_root: Option<String>,
    pub derived_root: Option<String>,
    pub max_width: u32,
    pub max_height: u32,
    pub jpeg_quality: u8,
    pub ignore_patterns: Vec<String>,
    pub converter: ConverterConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            source_root: None,
            derived_root: None,
            max_width: Bounds::DEFAULT.max_width,
            max_height: Bounds::DEFAULT.max_height,
            jpeg_quality: 90,
            ignore_patterns: Vec::new(),
            converter: ConverterConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn bounds(&self) -> Bounds {
        Bounds {
            max_width: self.max_width,
            max_height: self.max_height,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConverterKind {
    /// In-process decode/resize/encode.
    #[default]
    Raster,
    /// External program, see [`crate::transform::CommandTransform`].
    Command,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConverterConfig {
    pub kind: ConverterKind,
    pub program: String,
    pub args: Vec<String>,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            kind: ConverterKind::Raster,
            program: "magick".to_string(),
            args: Vec::new(),
        }
    }
}

/// Reads `Config.{toml,yaml,json}` if present, then `WALLKEEPER_*` variables
/// (`WALLKEEPER_SOURCE_ROOT`, `WALLKEEPER_CONVERTER__PROGRAM`).
pub fn load_configuration() -> Result<AppConfig, Error> {
    let builder = Config::builder()
        .add_source(ConfigFile::with_name("Config").required(false))
        .add_source(
            Environment::with_prefix("WALLKEEPER")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;
    Ok(builder.try_deserialize::<AppConfig>()?)
}

/// The two directory tokens bound to real directories for one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Roots {
    pub source: PathBuf,
    pub derived: PathBuf,
}

impl Roots {
    pub fn new(source: impl Into<PathBuf>, derived: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            derived: derived.into(),
        }
    }

    /// `<source>/CustomWallpapers`.
    pub fn under(source: impl Into<PathBuf>) -> Self {
        let source = source.into();
        let derived = source.join(DERIVED_DIR_NAME);
        Self { source, derived }
    }

    /// Configured roots, falling back to `<home>/Pictures` and its
    /// `CustomWallpapers` child.
    pub fn resolve(config: &AppConfig) -> Result<Self, Error> {
        let source = match &config.source_root {
            Some(root) => PathBuf::from(root),
            None => dirs::home_dir()
                .map(|home| home.join(SOURCE_DIR_NAME))
                .ok_or_else(|| Error::Other("Could not determine home directory".to_string()))?,
        };
        let derived = match &config.derived_root {
            Some(root) => PathBuf::from(root),
            None => source.join(DERIVED_DIR_NAME),
        };
        Ok(Self { source, derived })
    }

    pub fn path(&self, token: DirectoryToken) -> &Path {
        match token {
            DirectoryToken::SourceRoot => &self.source,
            DirectoryToken::DerivedRoot => &self.derived,
        }
    }
}
