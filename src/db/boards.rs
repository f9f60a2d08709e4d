//! Boards (named collections of images) and their membership links.

use anyhow::Result;
use rusqlite::OptionalExtension;
use uuid::Uuid;

use super::Database;

/// A board row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    pub board_id: String,
    pub board_name: String,
}

impl Database {
    /// Exact-name lookup.
    pub fn find_board_by_name(&self, board_name: &str) -> Result<Option<Board>> {
        let board = self
            .conn
            .query_row(
                "SELECT board_id, board_name FROM boards WHERE board_name = ?",
                [board_name],
                |row| Ok(Board { board_id: row.get(0)?, board_name: row.get(1)? }),
            )
            .optional()?;
        Ok(board)
    }

    /// Case-insensitive lookup, as used when the operator names a board.
    pub fn find_board_by_name_ci(&self, board_name: &str) -> Result<Option<Board>> {
        let board = self
            .conn
            .query_row(
                "SELECT board_id, board_name FROM boards WHERE LOWER(board_name) = LOWER(?)",
                [board_name],
                |row| Ok(Board { board_id: row.get(0)?, board_name: row.get(1)? }),
            )
            .optional()?;
        Ok(board)
    }

    pub fn create_board(&self, board_name: &str) -> Result<Board> {
        let board_id = Uuid::new_v4().to_string();
        self.conn.execute(
            "INSERT INTO boards (board_id, board_name) VALUES (?, ?)",
            rusqlite::params![board_id, board_name],
        )?;
        Ok(Board { board_id, board_name: board_name.to_string() })
    }

    /// Reuse the board with this exact name, or create it.
    ///
    /// Lookup and insert are separate statements, so two runs racing on the
    /// same name can both create a board.
    pub fn ensure_board(&self, board_name: &str) -> Result<(Board, bool)> {
        if let Some(board) = self.find_board_by_name(board_name)? {
            return Ok((board, false));
        }
        Ok((self.create_board(board_name)?, true))
    }

    /// Link an image into a board. Existing links are left alone.
    pub fn link_image(&self, board_id: &str, image_name: &str) -> Result<bool> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO board_images (board_id, image_name) VALUES (?, ?)",
            rusqlite::params![board_id, image_name],
        )?;
        Ok(inserted > 0)
    }

    #[cfg(test)]
    pub(crate) fn count_boards_named(&self, board_name: &str) -> Result<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM boards WHERE board_name = ?",
            [board_name],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}
