//! Writes cover images into a thumbnail directory under deterministic names.

use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageFormat, imageops::FilterType};
use thiserror::Error;

use crate::domain::CoverBuffer;

pub const HIGH_EDGE_PX: u32 = 800;
pub const LOW_EDGE_PX: u32 = 80;

#[derive(Debug, Error)]
pub enum CoverError {
    #[error("failed to decode cover image: {0}")]
    Decode(#[source] image::ImageError),

    #[error("failed to write cover {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to create cover directory: {0}")]
    Fs(#[from] std::io::Error),
}

/// Paths of a persisted cover. `low` is only set for dual-resolution writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverPaths {
    pub high: String,
    pub low: Option<String>,
}

/// Keeps ids usable as file names.
fn file_stem(id: &str) -> String {
    let stem: String = id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if stem.is_empty() { "cover".to_string() } else { stem }
}

pub fn cover_path(dir: &Path, id: &str, variant: &str) -> PathBuf {
    dir.join(format!("{}-{variant}.png", file_stem(id)))
}

/// Shrinks to fit `max_edge`; smaller images are kept as they are.
fn fit(image: &DynamicImage, max_edge: u32) -> DynamicImage {
    if image.width() <= max_edge && image.height() <= max_edge {
        image.clone()
    } else {
        image.resize(max_edge, max_edge, FilterType::Triangle)
    }
}

fn save(image: &DynamicImage, path: PathBuf) -> Result<String, CoverError> {
    image
        .save_with_format(&path, ImageFormat::Png)
        .map_err(|source| CoverError::Write {
            path: path.clone(),
            source,
        })?;
    Ok(path.to_string_lossy().to_string())
}

/// Persists `buffer` as `<dir>/<id>-high.png` and, when `dual`, `<dir>/<id>-low.png`.
///
/// Writing the same id again overwrites the previous files.
pub fn write_cover(
    buffer: &CoverBuffer,
    dir: &Path,
    id: &str,
    dual: bool,
) -> Result<CoverPaths, CoverError> {
    let image = image::load_from_memory(buffer.as_bytes()).map_err(CoverError::Decode)?;
    std::fs::create_dir_all(dir)?;

    let high = save(&fit(&image, HIGH_EDGE_PX), cover_path(dir, id, "high"))?;
    let low = if dual {
        Some(save(&fit(&image, LOW_EDGE_PX), cover_path(dir, id, "low"))?)
    } else {
        None
    };

    log::debug!("stored cover for {id} at {high}");
    Ok(CoverPaths { high, low })
}

#[cfg(test)]
pub(crate) fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let image = DynamicImage::new_rgb8(width, height);
    let mut bytes = std::io::Cursor::new(Vec::new());
    image
        .write_to(&mut bytes, ImageFormat::Png)
        .expect("encode test png");
    bytes.into_inner()
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    #[test]
    fn dual_write_produces_both_sizes() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("thumbs");
        let buffer = CoverBuffer(png_bytes(1000, 500));

        let paths = write_cover(&buffer, &dir, "abc123", true).unwrap();

        assert_eq!(paths.high, cover_path(&dir, "abc123", "high").to_string_lossy());
        let low = paths.low.expect("low variant");

        let high_img = image::open(Path::new(&paths.high)).unwrap();
        let low_img = image::open(Path::new(&low)).unwrap();
        assert_eq!((high_img.width(), high_img.height()), (800, 400));
        assert_eq!((low_img.width(), low_img.height()), (80, 40));
    }

    #[test]
    fn single_write_skips_low_variant() {
        let tmp = tempfile::tempdir().unwrap();
        let buffer = CoverBuffer(png_bytes(10, 10));

        let paths = write_cover(&buffer, tmp.path(), "42", false).unwrap();

        assert!(paths.low.is_none());
        assert!(!cover_path(tmp.path(), "42", "low").exists());
        // small images are not upscaled
        let high_img = image::open(Path::new(&paths.high)).unwrap();
        assert_eq!((high_img.width(), high_img.height()), (10, 10));
    }

    #[test]
    fn garbage_buffer_is_a_decode_error() {
        let tmp = tempfile::tempdir().unwrap();
        let err = write_cover(&CoverBuffer(b"not an image".to_vec()), tmp.path(), "x", true)
            .unwrap_err();
        assert!(matches!(err, CoverError::Decode(_)));
    }

    #[test]
    fn ids_are_sanitised() {
        let path = cover_path(Path::new("/cache"), "../etc/passwd", "high");
        assert_eq!(path, Path::new("/cache/___etc_passwd-high.png"));
    }
}
