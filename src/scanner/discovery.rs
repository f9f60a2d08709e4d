use anyhow::Result;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Find image files below `directory`, skipping anything inside a directory
/// named `excluded_dir` (the thumbnail tree). Paths come back sorted.
pub fn discover_images(directory: &Path, extensions: &[String], excluded_dir: &str) -> Result<Vec<PathBuf>> {
    let mut images = Vec::new();

    let walker = WalkDir::new(directory)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| !(e.depth() > 0 && e.file_type().is_dir() && e.file_name() == excluded_dir));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };
        let path = entry.path();

        if entry.file_type().is_file() {
            if let Some(ext) = path.extension() {
                let ext_lower = ext.to_string_lossy().to_lowercase();
                if extensions.iter().any(|e| e.to_lowercase() == ext_lower) {
                    images.push(path.to_path_buf());
                }
            }
        }
    }

    // Sort by path for consistent ordering
    images.sort();

    Ok(images)
}
