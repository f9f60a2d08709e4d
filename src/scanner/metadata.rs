//! Reading an image once and pulling the InvokeAI text chunks out of it.

use anyhow::{Context, Result};
use image::{DynamicImage, ImageReader};
use serde_json::Value;
use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;

/// PNG text chunk holding the generation parameters as JSON.
pub const METADATA_KEY: &str = "invokeai_metadata";
/// PNG text chunk holding the node graph; only its presence matters here.
pub const GRAPH_KEY: &str = "invokeai_graph";

const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";

/// An image file's header facts plus the embedded metadata the catalog stores.
///
/// Only the header and the chunks ahead of the pixel data are parsed. The file
/// bytes are kept so a thumbnail can be decoded later without reading the
/// file again.
pub struct OpenedImage {
    bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Raw `invokeai_metadata` text, stored verbatim in the catalog.
    pub metadata_raw: Option<String>,
    /// Parsed metadata; `None` when absent, empty or not valid JSON.
    pub metadata: Option<Value>,
    /// Whether an `invokeai_graph` chunk is present.
    pub has_workflow: bool,
}

impl OpenedImage {
    pub fn open(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let (width, height, mut chunks) = if bytes.starts_with(PNG_SIGNATURE) {
            read_png_header(&bytes)
                .with_context(|| format!("Failed to read PNG header of {}", path.display()))?
        } else {
            let (width, height) = ImageReader::new(Cursor::new(&bytes))
                .with_guessed_format()?
                .into_dimensions()
                .with_context(|| format!("Failed to read image header of {}", path.display()))?;
            (width, height, HashMap::new())
        };

        let metadata_raw = chunks.remove(METADATA_KEY);
        let metadata = metadata_raw.as_deref().and_then(parse_metadata);
        let has_workflow = chunks.contains_key(GRAPH_KEY);

        Ok(Self {
            bytes,
            width,
            height,
            metadata_raw,
            metadata,
            has_workflow,
        })
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// The file contents as read by `open`.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Decode the pixel data.
    pub fn decode(&self) -> Result<DynamicImage> {
        Ok(image::load_from_memory(&self.bytes)?)
    }
}

fn parse_metadata(raw: &str) -> Option<Value> {
    if raw.is_empty() {
        return None;
    }
    match serde_json::from_str(raw) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::debug!("Ignoring malformed {} chunk: {}", METADATA_KEY, e);
            None
        }
    }
}

/// Dimensions plus the tEXt, zTXt and iTXt chunks found before the image data.
///
/// A compressed chunk that fails to inflate is skipped rather than failing the
/// whole file.
fn read_png_header(bytes: &[u8]) -> Result<(u32, u32, HashMap<String, String>)> {
    let decoder = png::Decoder::new(Cursor::new(bytes));
    let reader = decoder.read_info()?;
    let info = reader.info();

    let mut chunks = HashMap::new();

    for chunk in &info.uncompressed_latin1_text {
        chunks.insert(chunk.keyword.clone(), chunk.text.clone());
    }

    for chunk in &info.compressed_latin1_text {
        match chunk.get_text() {
            Ok(text) => {
                chunks.insert(chunk.keyword.clone(), text);
            }
            Err(e) => tracing::warn!("Unreadable zTXt chunk '{}': {}", chunk.keyword, e),
        }
    }

    for chunk in &info.utf8_text {
        match chunk.get_text() {
            Ok(text) => {
                chunks.insert(chunk.keyword.clone(), text);
            }
            Err(e) => tracing::warn!("Unreadable iTXt chunk '{}': {}", chunk.keyword, e),
        }
    }

    Ok((info.width, info.height, chunks))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::test_png;
    use tempfile::tempdir;

    #[test]
    fn test_reads_metadata_and_graph() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.png");
        test_png::write(
            &path,
            8,
            4,
            &[(METADATA_KEY, r#"{"created": "2024-01-02T03:04:05.000000Z"}"#), (GRAPH_KEY, "not json at all")],
        );

        let opened = OpenedImage::open(&path).unwrap();
        assert_eq!(opened.dimensions(), (8, 4));
        assert_eq!(
            opened.metadata_raw.as_deref(),
            Some(r#"{"created": "2024-01-02T03:04:05.000000Z"}"#)
        );
        assert_eq!(
            opened.metadata.as_ref().and_then(|m| m.get("created")).and_then(|v| v.as_str()),
            Some("2024-01-02T03:04:05.000000Z")
        );
        assert!(opened.has_workflow);
    }

    #[test]
    fn test_malformed_json_keeps_raw_text() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.png");
        test_png::write(&path, 2, 2, &[(METADATA_KEY, "{broken")]);

        let opened = OpenedImage::open(&path).unwrap();
        assert_eq!(opened.metadata_raw.as_deref(), Some("{broken"));
        assert!(opened.metadata.is_none());
        assert!(!opened.has_workflow);
    }

    #[test]
    fn test_plain_png_has_no_metadata() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.png");
        test_png::write(&path, 3, 5, &[]);

        let opened = OpenedImage::open(&path).unwrap();
        assert_eq!(opened.dimensions(), (3, 5));
        assert!(opened.metadata_raw.is_none());
        assert!(opened.metadata.is_none());
        assert!(!opened.has_workflow);
    }

    #[test]
    fn test_truncated_pixel_data_still_opens() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.png");
        test_png::write(&path, 64, 64, &[(METADATA_KEY, r#"{"time": "2023-12-31 10:00:00"}"#)]);
        let bytes = std::fs::read(&path).unwrap();
        std::fs::write(&path, &bytes[..bytes.len() - 40]).unwrap();

        let opened = OpenedImage::open(&path).unwrap();
        assert_eq!(opened.dimensions(), (64, 64));
        assert!(opened.metadata.is_some());
        assert!(opened.decode().is_err());
    }

    #[test]
    fn test_non_png_reads_dimensions_only() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.jpg");
        image::RgbImage::from_pixel(6, 9, image::Rgb([1, 2, 3])).save(&path).unwrap();

        let opened = OpenedImage::open(&path).unwrap();
        assert_eq!(opened.dimensions(), (6, 9));
        assert!(opened.metadata_raw.is_none());
        assert!(!opened.has_workflow);
        assert_eq!(opened.decode().unwrap().width(), 6);
    }

    #[test]
    fn test_garbage_file_is_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.png");
        std::fs::write(&path, b"definitely not an image").unwrap();

        assert!(OpenedImage::open(&path).is_err());
    }

    #[test]
    fn test_missing_file_is_error() {
        let dir = tempdir().unwrap();
        assert!(OpenedImage::open(&dir.path().join("missing.png")).is_err());
    }
}
