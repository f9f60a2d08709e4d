use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub thumbnails: ThumbnailConfig,

    #[serde(default)]
    pub reindex: ReindexConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThumbnailConfig {
    /// Long edge of generated thumbnails, in pixels.
    #[serde(default = "default_thumb_size")]
    pub size: u32,

    /// Directory inserted after `images/` for thumbnails; excluded from scans.
    #[serde(default = "default_thumb_dir_name")]
    pub dir_name: String,

    #[serde(default = "default_thumb_extension")]
    pub extension: String,

    /// Lossy WebP quality, 0-100.
    #[serde(default = "default_thumb_quality")]
    pub quality: f32,
}

fn default_thumb_size() -> u32 {
    256
}

fn default_thumb_dir_name() -> String {
    "thumbnails".to_string()
}

fn default_thumb_extension() -> String {
    "webp".to_string()
}

fn default_thumb_quality() -> f32 {
    90.0
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            size: default_thumb_size(),
            dir_name: default_thumb_dir_name(),
            extension: default_thumb_extension(),
            quality: default_thumb_quality(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReindexConfig {
    /// Subdirectory of the outputs root holding full-size images.
    #[serde(default = "default_images_dir")]
    pub images_dir: String,

    #[serde(default = "default_image_extensions")]
    pub image_extensions: Vec<String>,

    /// Import boards are named "<prefix> DD-MM-YY".
    #[serde(default = "default_board_prefix")]
    pub board_prefix: String,
}

fn default_images_dir() -> String {
    "images".to_string()
}

fn default_image_extensions() -> Vec<String> {
    vec!["png".to_string()]
}

fn default_board_prefix() -> String {
    "Recovered".to_string()
}

impl Default for ReindexConfig {
    fn default() -> Self {
        Self {
            images_dir: default_images_dir(),
            image_extensions: default_image_extensions(),
            board_prefix: default_board_prefix(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// When set, logs are also written to a daily file in this directory.
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

impl Config {
    /// Load the config from `path`, else `INVOKEDB_CONFIG`, else the default
    /// location.
    ///
    /// A file named explicitly must exist; only a missing file at the default
    /// location yields the defaults. The tools never write config.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load_from(path);
        }
        if let Ok(path) = std::env::var("INVOKEDB_CONFIG") {
            return Self::load_from(Path::new(&path));
        }

        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            tracing::debug!("Config file not found at {:?}, using defaults", path);
            Ok(Config::default())
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("invokedb")
            .join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.thumbnails.size, 256);
        assert_eq!(config.thumbnails.dir_name, "thumbnails");
        assert_eq!(config.thumbnails.extension, "webp");
        assert_eq!(config.thumbnails.quality, 90.0);
        assert_eq!(config.reindex.images_dir, "images");
        assert_eq!(config.reindex.image_extensions, vec!["png".to_string()]);
        assert_eq!(config.reindex.board_prefix, "Recovered");
        assert!(config.logging.dir.is_none());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[thumbnails]\nsize = 128\nquality = 75.5\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.thumbnails.size, 128);
        assert_eq!(config.thumbnails.quality, 75.5);
        assert_eq!(config.thumbnails.dir_name, "thumbnails");
        assert_eq!(config.reindex.board_prefix, "Recovered");
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let dir = tempdir().unwrap();
        let err = Config::load(Some(&dir.path().join("absent.toml"))).unwrap_err();
        assert!(format!("{:#}", err).contains("absent.toml"));
    }

    #[test]
    fn test_malformed_file_is_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[thumbnails\nsize = ").unwrap();
        assert!(Config::load(Some(&path)).is_err());
    }
}
