//! Bulk reclassification of the images on a board.
//!
//! Only `image_category` and `image_origin` change; `is_intermediate`,
//! timestamps and everything else stay as they are.

use anyhow::Result;
use tracing::{debug, info};

use crate::db::{Board, Database, ImageCategory, ImageOrigin};
use crate::error::Error;

/// Target classification for a board's images.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reclassification {
    /// `user` / `external`: shown as uploaded assets.
    Assets,
    /// `general` / `internal`: shown as regular generated images.
    General,
}

impl Reclassification {
    pub fn category(&self) -> ImageCategory {
        match self {
            Reclassification::Assets => ImageCategory::User,
            Reclassification::General => ImageCategory::General,
        }
    }

    pub fn origin(&self) -> ImageOrigin {
        match self {
            Reclassification::Assets => ImageOrigin::External,
            Reclassification::General => ImageOrigin::Internal,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Reclassification::Assets => "assets",
            Reclassification::General => "general/internal",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReclassifySummary {
    pub board: Board,
    /// Images linked to the board.
    pub found: usize,
    /// Rows changed, or that would be changed in a dry run.
    pub updated: usize,
}

/// Reclassify every image on the board named `board_name` (case-insensitive).
///
/// An unknown board is an error raised before anything is written. All
/// updates run in one transaction.
pub fn reclassify_board(
    db: &Database,
    board_name: &str,
    target: Reclassification,
    dry_run: bool,
) -> Result<ReclassifySummary> {
    let board = db
        .find_board_by_name_ci(board_name)?
        .ok_or_else(|| Error::BoardNotFound(board_name.to_string()))?;

    debug!("[INFO] Using board_name = '{}', board_id = {}", board.board_name, board.board_id);

    let image_names = db.images_for_board(&board.board_id)?;
    let found = image_names.len();

    if image_names.is_empty() {
        info!("No images found for this board. Nothing to do.");
        return Ok(ReclassifySummary { board, found, updated: 0 });
    }

    debug!("[INFO] Found {} images in this board.", found);

    let updated = if dry_run {
        info!("[DRY] Would update the following images as {}:", target.label());
        let mut would_update = 0;
        for name in &image_names {
            match db.get_image(name)? {
                Some(image) => {
                    info!("  - {} ({}/{})", name, image.category, image.origin);
                    would_update += 1;
                }
                None => debug!("  - {} has no image row, skipping", name),
            }
        }
        would_update
    } else {
        debug!("[INFO] Updating {} images as {}...", found, target.label());
        let updated = db.set_classification(&image_names, target.category(), target.origin())?;
        debug!("[OK] Updated {} rows in images.", updated);
        updated
    };

    Ok(ReclassifySummary { board, found, updated })
}
