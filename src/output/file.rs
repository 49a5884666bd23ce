//! File sink: timestamped, collision-free names under the save folder.

use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};
use image::DynamicImage;

use super::{OutputDescriptor, OutputError, OutputFormat};
use crate::capture::RasterImage;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

const TIMESTAMP_TOKEN: &str = "{timestamp}";

pub fn timestamp(at: &NaiveDateTime) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// First free path for `descriptor` at time `at`.
///
/// `Screenshot_{timestamp}` becomes `Screenshot_2024-01-02_03-04-05.png`,
/// then `..._1.png`, `..._2.png` while earlier names exist. This is a plain
/// existence check, not a lock against concurrent writers.
pub fn resolve_path(descriptor: &OutputDescriptor, at: &NaiveDateTime) -> PathBuf {
    let stem = descriptor.pattern.replace(TIMESTAMP_TOKEN, &timestamp(at));
    let extension = descriptor.extension();

    let candidate = descriptor.directory.join(format!("{}.{}", stem, extension));
    if !candidate.exists() {
        return candidate;
    }

    (1u32..)
        .map(|n| descriptor.directory.join(format!("{}_{}.{}", stem, n, extension)))
        .find(|path| !path.exists())
        .unwrap_or(candidate)
}

/// Write `image` using the current local time. Consumes the image.
pub fn save(image: RasterImage, descriptor: &OutputDescriptor) -> Result<PathBuf, OutputError> {
    save_at(image, descriptor, &Local::now().naive_local())
}

pub fn save_at(
    image: RasterImage,
    descriptor: &OutputDescriptor,
    at: &NaiveDateTime,
) -> Result<PathBuf, OutputError> {
    ensure_dir(&descriptor.directory)?;

    let path = resolve_path(descriptor, at);
    let format = descriptor.output_format();

    let start = std::time::Instant::now();
    let pixels = DynamicImage::ImageRgba8(image.into_rgba());
    let encoded = match format {
        OutputFormat::Jpeg => DynamicImage::ImageRgb8(pixels.to_rgb8()),
        _ => pixels,
    };

    encoded
        .save_with_format(&path, format.image_format())
        .map_err(|e| OutputError::Write {
            path: path.clone(),
            reason: e.to_string(),
        })?;

    log::info!(
        "[OUTPUT] Saved {:?} to {} in {}ms",
        format,
        path.display(),
        start.elapsed().as_millis()
    );
    Ok(path)
}

fn ensure_dir(dir: &Path) -> Result<(), OutputError> {
    std::fs::create_dir_all(dir).map_err(|source| OutputError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })
}
