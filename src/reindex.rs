//! Reconcile the outputs directory with the catalog.
//!
//! Every image file below `<outputs>/images` that has no `images` row gets one,
//! classified as a plain internal image (`general` / `internal`, not
//! intermediate), and is linked into a board named after the day of the run.
//! Sorting these into assets or anything else is left to the operator.
//!
//! Each file is its own unit of work: rows are committed as they are written
//! and a failure on one file is recorded and the run moves on.

use anyhow::Result;
use chrono::{Local, NaiveDate};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::config::Config;
use crate::db::{Board, Database, ImageCategory, ImageOrigin, NewImage};
use crate::error::Error;
use crate::scanner::{discover_images, resolve_created_at, OpenedImage, ThumbnailOutcome, ThumbnailWriter};

#[derive(Debug, Clone, Copy, Default)]
pub struct ReindexOptions {
    /// Report what would happen without touching the catalog or the disk.
    pub dry_run: bool,
    /// Write missing thumbnails for newly imported images.
    pub gen_thumbs: bool,
}

/// Pipeline step at which a file failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Lookup,
    Read,
    Timestamp,
    Insert,
    Board,
    Link,
    Thumbnail,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Lookup => "lookup",
            Stage::Read => "read",
            Stage::Timestamp => "timestamp",
            Stage::Insert => "insert",
            Stage::Board => "board",
            Stage::Link => "link",
            Stage::Thumbnail => "thumbnail",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// Already in the catalog.
    Skipped,
    Imported { thumbnail: Option<ThumbnailOutcome> },
    Failed { stage: Stage, reason: String },
}

#[derive(Debug, Clone)]
pub struct FileReport {
    pub path: PathBuf,
    pub image_name: String,
    pub outcome: FileOutcome,
}

#[derive(Debug, Clone, Default)]
pub struct ReindexSummary {
    pub files: Vec<FileReport>,
    /// Board new images were linked into; `None` when nothing was imported.
    pub board: Option<Board>,
}

impl ReindexSummary {
    pub fn found(&self) -> usize {
        self.files.len()
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::Skipped))
    }

    pub fn imported(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::Imported { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::Failed { .. }))
    }

    /// Thumbnails written, or that would have been written in a dry run.
    pub fn thumbnails_created(&self) -> usize {
        self.count(|o| {
            matches!(
                o,
                FileOutcome::Imported {
                    thumbnail: Some(ThumbnailOutcome::Created(_) | ThumbnailOutcome::WouldCreate(_))
                }
            )
        })
    }

    fn count(&self, pred: impl Fn(&FileOutcome) -> bool) -> usize {
        self.files.iter().filter(|f| pred(&f.outcome)).count()
    }
}

/// Name of the board a run on `date` imports into, e.g. "Recovered 21-11-25".
pub fn import_board_name(prefix: &str, date: NaiveDate) -> String {
    format!("{} {}", prefix, date.format("%d-%m-%y"))
}

pub struct Reindexer<'a> {
    db: &'a Database,
    images_root: PathBuf,
    extensions: Vec<String>,
    thumbnail_dir: String,
    thumbnails: ThumbnailWriter,
    options: ReindexOptions,
    board_name: String,
    board: Option<Board>,
}

impl<'a> Reindexer<'a> {
    pub fn new(db: &'a Database, config: &Config, outputs_root: &Path, options: ReindexOptions) -> Self {
        let board_name = import_board_name(&config.reindex.board_prefix, Local::now().date_naive());
        Self {
            db,
            images_root: outputs_root.join(&config.reindex.images_dir),
            extensions: config.reindex.image_extensions.clone(),
            thumbnail_dir: config.thumbnails.dir_name.clone(),
            thumbnails: ThumbnailWriter::new(outputs_root, &config.reindex.images_dir, &config.thumbnails),
            options,
            board_name,
            board: None,
        }
    }

    /// Import into a board with this name instead of the dated default.
    #[cfg(test)]
    fn with_board_name(mut self, board_name: impl Into<String>) -> Self {
        self.board_name = board_name.into();
        self
    }

    pub fn board_name(&self) -> &str {
        &self.board_name
    }

    pub fn run(mut self) -> Result<ReindexSummary> {
        if !self.images_root.is_dir() {
            return Err(Error::MissingDirectory(self.images_root.clone()).into());
        }

        let paths = discover_images(&self.images_root, &self.extensions, &self.thumbnail_dir)?;
        info!("Found {} image file(s) under {}", paths.len(), self.images_root.display());

        let mut files = Vec::with_capacity(paths.len());
        for path in paths {
            let report = self.process_file(&path);
            if let FileOutcome::Failed { stage, reason } = &report.outcome {
                error!("[ERR] {} failed at {}: {}", path.display(), stage, reason);
            }
            files.push(report);
        }

        Ok(ReindexSummary {
            files,
            board: self.board,
        })
    }

    fn process_file(&mut self, path: &Path) -> FileReport {
        let image_name = self.image_name(path);
        let outcome = self.import_file(path, &image_name);
        FileReport {
            path: path.to_path_buf(),
            image_name,
            outcome,
        }
    }

    /// Identity of an image: its path relative to the images root.
    fn image_name(&self, path: &Path) -> String {
        path.strip_prefix(&self.images_root)
            .unwrap_or(path)
            .to_string_lossy()
            .into_owned()
    }

    fn import_file(&mut self, path: &Path, image_name: &str) -> FileOutcome {
        match self.db.image_exists(image_name) {
            Ok(true) => {
                debug!("[SKIP] {} already in DB", image_name);
                return FileOutcome::Skipped;
            }
            Ok(false) => {}
            Err(e) => return failed(Stage::Lookup, e),
        }

        // Holds the file bytes until this function returns
        let opened = match OpenedImage::open(path) {
            Ok(opened) => opened,
            Err(e) => return failed(Stage::Read, e),
        };

        let created_at = match resolve_created_at(opened.metadata.as_ref(), path) {
            Ok(ts) => ts,
            Err(e) => return failed(Stage::Timestamp, e),
        };

        debug!("[FILE] {} -> name={}", path.display(), image_name);

        let (width, height) = opened.dimensions();
        let record = NewImage {
            image_name: image_name.to_string(),
            origin: ImageOrigin::Internal,
            category: ImageCategory::General,
            width,
            height,
            metadata: opened.metadata_raw.clone(),
            is_intermediate: false,
            has_workflow: opened.has_workflow,
            created_at,
        };

        if let Err(e) = self.insert(&record) {
            return failed(Stage::Insert, e);
        }

        let board_id = match self.import_board() {
            Ok(board) => board.board_id.clone(),
            Err(e) => return failed(Stage::Board, e),
        };

        if let Err(e) = self.link(&board_id, image_name) {
            return failed(Stage::Link, e);
        }

        let thumbnail = if self.options.gen_thumbs {
            match self.thumbnails.ensure(path, Some(&opened), self.options.dry_run) {
                Ok(outcome) => Some(outcome),
                Err(e) => return failed(Stage::Thumbnail, e),
            }
        } else {
            None
        };

        FileOutcome::Imported { thumbnail }
    }

    fn insert(&self, record: &NewImage) -> Result<()> {
        if self.options.dry_run {
            info!(
                "[DRY][INSERT] {} cat={}, origin={}, intermediate={}, has_workflow={}",
                record.image_name,
                record.category,
                record.origin,
                record.is_intermediate as u8,
                record.has_workflow as u8,
            );
            return Ok(());
        }

        self.db.insert_image(record)?;
        debug!("[INSERT] {}", record.image_name);
        Ok(())
    }

    /// The board for this run, looked up or created on first use.
    fn import_board(&mut self) -> Result<&Board> {
        if self.board.is_none() {
            let board = if self.options.dry_run {
                match self.db.find_board_by_name(&self.board_name)? {
                    Some(board) => {
                        debug!("[DRY][BOARD] Reusing board '{}' (id={})", board.board_name, board.board_id);
                        board
                    }
                    None => {
                        let board = Board {
                            board_id: Uuid::new_v4().to_string(),
                            board_name: self.board_name.clone(),
                        };
                        debug!("[DRY][BOARD] Would create board '{}' (id={})", board.board_name, board.board_id);
                        board
                    }
                }
            } else {
                let (board, created) = self.db.ensure_board(&self.board_name)?;
                if created {
                    info!("[BOARD] Created board '{}' (id={})", board.board_name, board.board_id);
                } else {
                    debug!("[BOARD] Reusing board '{}' (id={})", board.board_name, board.board_id);
                }
                board
            };
            self.board = Some(board);
        }

        self.board
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("import board unavailable"))
    }

    fn link(&self, board_id: &str, image_name: &str) -> Result<()> {
        if self.options.dry_run {
            debug!("[DRY][BOARD] Would link {} -> {}", image_name, board_id);
            return Ok(());
        }

        self.db.link_image(board_id, image_name)?;
        debug!("[BOARD] Linked {} -> {}", image_name, board_id);
        Ok(())
    }
}

fn failed(stage: Stage, err: anyhow::Error) -> FileOutcome {
    FileOutcome::Failed {
        stage,
        reason: format!("{:#}", err),
    }
}
