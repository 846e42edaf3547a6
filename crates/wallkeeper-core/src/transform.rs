//! Convert-and-resize into the wallpaper format.

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageReader};
use std::ffi::OsString;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::process::Command;
use tracing::debug;

use crate::config::{AppConfig, ConverterKind};
use crate::error::Error;

/// Bounding box a converted wallpaper must fit in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub max_width: u32,
    pub max_height: u32,
}

impl Bounds {
    pub const DEFAULT: Bounds = Bounds {
        max_width: 1920,
        max_height: 1080,
    };
}

impl Default for Bounds {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Writes `dest` as a JPEG rendition of `source` fitting `bounds`.
/// Blocks until the output is complete or the conversion has failed.
pub trait ImageTransform {
    fn convert(&self, source: &Path, dest: &Path, bounds: Bounds) -> Result<(), Error>;
}

pub fn from_config(config: &AppConfig) -> Box<dyn ImageTransform> {
    match config.converter.kind {
        ConverterKind::Raster => Box::new(RasterTransform::new(config.jpeg_quality)),
        ConverterKind::Command => {
            let converter = &config.converter;
            if converter.args.is_empty() {
                Box::new(CommandTransform::imagemagick(&converter.program))
            } else {
                Box::new(CommandTransform::new(&converter.program, converter.args.clone()))
            }
        }
    }
}

/// Decodes with the `image` crate, downscales to fit, encodes JPEG.
#[derive(Debug, Clone, Copy)]
pub struct RasterTransform {
    quality: u8,
}

impl RasterTransform {
    pub fn new(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
        }
    }
}

impl Default for RasterTransform {
    fn default() -> Self {
        Self::new(90)
    }
}

impl ImageTransform for RasterTransform {
    fn convert(&self, source: &Path, dest: &Path, bounds: Bounds) -> Result<(), Error> {
        let failed = |reason: String| Error::ConversionFailed {
            path: source.to_path_buf(),
            reason,
        };

        let img = ImageReader::open(source)
            .map_err(|e| failed(e.to_string()))?
            .with_guessed_format()
            .map_err(|e| failed(e.to_string()))?
            .decode()
            .map_err(|e| failed(e.to_string()))?;

        let (width, height) = img.dimensions();
        let fitted = fit_within(img, bounds);
        debug!(
            "Converting {} ({}x{}) to {}x{}",
            source.display(),
            width,
            height,
            fitted.width(),
            fitted.height()
        );

        let file = File::create(dest).map_err(|e| failed(e.to_string()))?;
        let encoder = JpegEncoder::new_with_quality(BufWriter::new(file), self.quality);
        fitted
            .to_rgb8()
            .write_with_encoder(encoder)
            .map_err(|e| failed(e.to_string()))
    }
}

/// Keeps aspect ratio. Images already inside the box are left alone.
fn fit_within(img: DynamicImage, bounds: Bounds) -> DynamicImage {
    let (width, height) = img.dimensions();
    if width <= bounds.max_width && height <= bounds.max_height {
        return img;
    }
    img.resize(bounds.max_width, bounds.max_height, FilterType::CatmullRom)
}

/// Runs an external converter. Arguments may contain `{input}`, `{output}`,
/// `{width}` and `{height}`.
#[derive(Debug, Clone)]
pub struct CommandTransform {
    program: String,
    args: Vec<String>,
}

impl CommandTransform {
    pub fn new(program: &str, args: Vec<String>) -> Self {
        Self {
            program: program.to_string(),
            args,
        }
    }

    /// ImageMagick, shrinking only (`>` geometry flag).
    pub fn imagemagick(program: &str) -> Self {
        let args = ["{input}", "-resize", "{width}x{height}>", "{output}"]
            .iter()
            .map(|arg| arg.to_string())
            .collect();
        Self::new(program, args)
    }

    fn render_args(&self, source: &Path, dest: &Path, bounds: Bounds) -> Vec<OsString> {
        self.args
            .iter()
            .map(|arg| match arg.as_str() {
                "{input}" => source.as_os_str().to_os_string(),
                "{output}" => dest.as_os_str().to_os_string(),
                _ => OsString::from(
                    arg.replace("{input}", &source.to_string_lossy())
                        .replace("{output}", &dest.to_string_lossy())
                        .replace("{width}", &bounds.max_width.to_string())
                        .replace("{height}", &bounds.max_height.to_string()),
                ),
            })
            .collect()
    }
}

impl ImageTransform for CommandTransform {
    fn convert(&self, source: &Path, dest: &Path, bounds: Bounds) -> Result<(), Error> {
        let args = self.render_args(source, dest, bounds);
        debug!("Running {} {:?}", self.program, args);

        let output = Command::new(&self.program)
            .args(&args)
            .output()
            .map_err(|e| Error::ConversionFailed {
                path: source.to_path_buf(),
                reason: format!("failed to run {}: {}", self.program, e),
            })?;

        if output.status.success() {
            return Ok(());
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(Error::ConversionFailed {
            path: source.to_path_buf(),
            reason: format!("{} exited with {}: {}", self.program, output.status, stderr.trim()),
        })
    }
}
