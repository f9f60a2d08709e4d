use anyhow::{Context, Result};
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat};
use std::fs;
use std::path::{Component, Path, PathBuf};

use super::metadata::OpenedImage;
use crate::config::ThumbnailConfig;
use crate::error::Error;

/// What `ThumbnailWriter::ensure` did for one image
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThumbnailOutcome {
    /// A thumbnail was already on disk and was left untouched.
    Exists(PathBuf),
    Created(PathBuf),
    /// Dry run: the thumbnail is missing and would have been written.
    WouldCreate(PathBuf),
}

/// Writes thumbnails next to the images they belong to.
///
/// `outputs/images/foo.png` maps to `outputs/images/thumbnails/foo.webp`.
/// Thumbnails are plain files; the catalog does not track them.
pub struct ThumbnailWriter {
    outputs_root: PathBuf,
    images_dir: String,
    dir_name: String,
    extension: String,
    size: u32,
    quality: f32,
}

impl ThumbnailWriter {
    pub fn new(outputs_root: &Path, images_dir: &str, config: &ThumbnailConfig) -> Self {
        Self {
            outputs_root: outputs_root.to_path_buf(),
            images_dir: images_dir.to_string(),
            dir_name: config.dir_name.clone(),
            extension: config.extension.clone(),
            size: config.size,
            quality: config.quality,
        }
    }

    /// Compute the thumbnail path for an image below the outputs root.
    pub fn thumbnail_path(&self, image_path: &Path) -> Result<PathBuf> {
        let rel = image_path
            .strip_prefix(&self.outputs_root)
            .map_err(|_| Error::NotUnderRoot {
                path: image_path.to_path_buf(),
                root: self.outputs_root.clone(),
            })?;

        let mut parts: Vec<&std::ffi::OsStr> = rel
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part),
                _ => None,
            })
            .collect();

        let Some(file_name) = parts.pop() else {
            return Err(Error::NotUnderRoot {
                path: image_path.to_path_buf(),
                root: self.outputs_root.clone(),
            }
            .into());
        };

        let mut thumb = self.outputs_root.clone();
        for (i, part) in parts.iter().enumerate() {
            thumb.push(part);
            if i == 0 && *part == self.images_dir.as_str() {
                thumb.push(&self.dir_name);
            }
        }
        thumb.push(file_name);
        thumb.set_extension(&self.extension);

        Ok(thumb)
    }

    /// Make sure a thumbnail exists for `image_path`.
    ///
    /// Existing thumbnails are never regenerated. `source` may carry the
    /// already-read file so it is not read twice; pixels are only decoded
    /// when a thumbnail is actually written.
    pub fn ensure(&self, image_path: &Path, source: Option<&OpenedImage>, dry_run: bool) -> Result<ThumbnailOutcome> {
        let thumb_path = self.thumbnail_path(image_path)?;

        if thumb_path.exists() {
            return Ok(ThumbnailOutcome::Exists(thumb_path));
        }

        if dry_run {
            tracing::debug!("[DRY][THUMB] Would create {}", thumb_path.display());
            return Ok(ThumbnailOutcome::WouldCreate(thumb_path));
        }

        let image = match source {
            Some(opened) => opened.decode(),
            None => image::open(image_path).map_err(Into::into),
        }
        .with_context(|| format!("Failed to decode {}", image_path.display()))?;

        if let Some(parent) = thumb_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let (src_w, src_h) = image.dimensions();
        let (width, height) = thumbnail_dimensions(src_w, src_h, self.size);
        let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
        let thumbnail = rgb.resize_exact(width, height, FilterType::Lanczos3);

        self.write(&thumbnail, &thumb_path)
            .with_context(|| format!("Failed to write {}", thumb_path.display()))?;

        tracing::debug!("[THUMB] Created {}", thumb_path.display());
        Ok(ThumbnailOutcome::Created(thumb_path))
    }

    /// WebP goes through libwebp for lossy output at the configured quality;
    /// other extensions use the `image` encoders.
    fn write(&self, thumbnail: &DynamicImage, thumb_path: &Path) -> Result<()> {
        if self.extension.eq_ignore_ascii_case("webp") {
            let rgb = thumbnail.to_rgb8();
            let encoded = webp::Encoder::from_rgb(rgb.as_raw(), rgb.width(), rgb.height())
                .encode_simple(false, self.quality)
                .map_err(|e| anyhow::anyhow!("WebP encoding failed: {:?}", e))?;
            fs::write(thumb_path, &*encoded)?;
            return Ok(());
        }

        let format = ImageFormat::from_extension(&self.extension)
            .ok_or_else(|| anyhow::anyhow!("Unsupported thumbnail extension '{}'", self.extension))?;
        thumbnail.save_with_format(thumb_path, format)?;
        Ok(())
    }
}

/// Scale so the longer edge equals `size`, keeping the aspect ratio.
pub fn thumbnail_dimensions(width: u32, height: u32, size: u32) -> (u32, u32) {
    let scale = |edge: u32, longer: u32| -> u32 {
        let scaled = u64::from(edge) * u64::from(size) / u64::from(longer.max(1));
        (scaled as u32).max(1)
    };

    if width >= height {
        (size, scale(height, width))
    } else {
        (scale(width, height), size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;
    use tempfile::tempdir;

    fn writer(root: &Path, size: u32) -> ThumbnailWriter {
        let config = ThumbnailConfig { size, ..ThumbnailConfig::default() };
        ThumbnailWriter::new(root, "images", &config)
    }

    fn write_source(path: &Path, width: u32, height: u32) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        RgbImage::from_pixel(width, height, image::Rgb([10, 200, 30]))
            .save(path)
            .unwrap();
    }

    #[test]
    fn test_thumbnail_path() {
        let root = Path::new("/data/outputs");
        let w = writer(root, 256);

        assert_eq!(
            w.thumbnail_path(&root.join("images/a/b.png")).unwrap(),
            root.join("images/thumbnails/a/b.webp")
        );
        assert_eq!(
            w.thumbnail_path(&root.join("images/foo.png")).unwrap(),
            root.join("images/thumbnails/foo.webp")
        );
        // Only an `images` first component gets the thumbnail directory
        assert_eq!(
            w.thumbnail_path(&root.join("other/foo.png")).unwrap(),
            root.join("other/foo.webp")
        );
    }

    #[test]
    fn test_thumbnail_path_outside_root() {
        let w = writer(Path::new("/data/outputs"), 256);
        let err = w.thumbnail_path(Path::new("/elsewhere/images/a.png")).unwrap_err();
        assert!(matches!(err.downcast_ref::<Error>(), Some(Error::NotUnderRoot { .. })));
    }

    #[test]
    fn test_thumbnail_dimensions() {
        assert_eq!(thumbnail_dimensions(1024, 512, 256), (256, 128));
        assert_eq!(thumbnail_dimensions(512, 1024, 256), (128, 256));
        assert_eq!(thumbnail_dimensions(300, 300, 256), (256, 256));
        assert_eq!(thumbnail_dimensions(1000, 333, 256), (256, 85));
        assert_eq!(thumbnail_dimensions(10000, 1, 256), (256, 1));
        // Small sources are scaled up like any other
        assert_eq!(thumbnail_dimensions(64, 32, 256), (256, 128));
    }

    #[test]
    fn test_ensure_creates_once() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let source = root.join("images/a/b.png");
        write_source(&source, 40, 20);
        let w = writer(root, 16);

        let expected = root.join("images/thumbnails/a/b.webp");
        assert_eq!(w.ensure(&source, None, false).unwrap(), ThumbnailOutcome::Created(expected.clone()));

        let thumb = image::open(&expected).unwrap();
        assert_eq!(thumb.dimensions(), (16, 8));
        let modified = fs::metadata(&expected).unwrap().modified().unwrap();

        assert_eq!(w.ensure(&source, None, false).unwrap(), ThumbnailOutcome::Exists(expected.clone()));
        assert_eq!(fs::metadata(&expected).unwrap().modified().unwrap(), modified);
    }

    #[test]
    fn test_ensure_never_overwrites() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let source = root.join("images/b.png");
        write_source(&source, 40, 20);

        let thumb_path = root.join("images/thumbnails/b.webp");
        fs::create_dir_all(thumb_path.parent().unwrap()).unwrap();
        fs::write(&thumb_path, b"stale").unwrap();

        let w = writer(root, 16);
        assert_eq!(w.ensure(&source, None, false).unwrap(), ThumbnailOutcome::Exists(thumb_path.clone()));
        assert_eq!(fs::read(&thumb_path).unwrap(), b"stale");
    }

    #[test]
    fn test_ensure_uses_opened_source() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let source = root.join("images/virtual.png");
        write_source(&source, 10, 30);
        let opened = OpenedImage::open(&source).unwrap();
        // The file is gone, so the bytes held by `opened` must be used
        fs::remove_file(&source).unwrap();

        let w = writer(root, 12);
        let outcome = w.ensure(&source, Some(&opened), false).unwrap();
        let expected = root.join("images/thumbnails/virtual.webp");
        assert_eq!(outcome, ThumbnailOutcome::Created(expected.clone()));
        assert_eq!(image::open(&expected).unwrap().dimensions(), (4, 12));
    }

    #[test]
    fn test_webp_quality_is_applied() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let source = root.join("images/noise.png");
        crate::scanner::test_png::write(&source, 64, 64, &[]);

        let encoded_size = |quality: f32, out: &Path| -> u64 {
            let config = ThumbnailConfig { size: 64, quality, ..ThumbnailConfig::default() };
            ThumbnailWriter::new(out, "images", &config).ensure(&source, None, false).unwrap();
            let thumb = out.join("images/thumbnails/noise.webp");
            assert_eq!(&fs::read(&thumb).unwrap()[8..12], b"WEBP");
            let size = fs::metadata(&thumb).unwrap().len();
            fs::remove_file(&thumb).unwrap();
            size
        };

        let low = encoded_size(5.0, root);
        let high = encoded_size(100.0, root);
        assert!(low < high, "quality 5 gave {} bytes, quality 100 gave {}", low, high);
    }

    #[test]
    fn test_other_extension_uses_image_encoder() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let source = root.join("images/a.png");
        write_source(&source, 40, 20);

        let config = ThumbnailConfig { size: 10, extension: "png".to_string(), ..ThumbnailConfig::default() };
        let w = ThumbnailWriter::new(root, "images", &config);
        let expected = root.join("images/thumbnails/a.png");
        assert_eq!(w.ensure(&source, None, false).unwrap(), ThumbnailOutcome::Created(expected.clone()));
        assert_eq!(image::image_dimensions(&expected).unwrap(), (10, 5));
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let source = root.join("images/a.png");
        write_source(&source, 40, 20);

        let w = writer(root, 16);
        let expected = root.join("images/thumbnails/a.webp");
        assert_eq!(w.ensure(&source, None, true).unwrap(), ThumbnailOutcome::WouldCreate(expected));
        assert!(!root.join("images/thumbnails").exists());
    }
}
