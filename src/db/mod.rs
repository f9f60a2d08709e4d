//! Access to the InvokeAI catalog (`invokeai.db`).
//!
//! Only the `images`, `boards` and `board_images` tables are touched. Every
//! statement runs in autocommit mode unless noted otherwise.

mod schema;
pub mod boards;
pub mod images;

use anyhow::{Context, Result};
use rusqlite::Connection;
use std::path::Path;

use crate::error::Error;

pub use boards::Board;
pub use images::{ImageCategory, ImageOrigin, ImageRecord, NewImage};
pub use schema::SCHEMA;

pub struct Database {
    pub(crate) conn: Connection,
}

impl Database {
    /// Open an existing catalog. The tools never create one.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(Error::MissingDatabase(path.to_path_buf()).into());
        }
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database {}", path.display()))?;
        Ok(Self { conn })
    }

    /// Catalog held in memory, mainly for tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }

    /// Create the tables the tools rely on if they are missing.
    ///
    /// Real catalogs are created and migrated by the application itself; this
    /// exists for fixture databases.
    pub fn initialize(&self) -> Result<()> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }
}
