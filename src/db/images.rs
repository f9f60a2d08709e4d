//! Image rows: existence checks, inserts and classification updates.

use anyhow::{anyhow, Result};
use rusqlite::OptionalExtension;
use std::fmt;
use std::str::FromStr;

use super::Database;

/// Where an image came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageOrigin {
    Internal,
    External,
}

impl ImageOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageOrigin::Internal => "internal",
            ImageOrigin::External => "external",
        }
    }
}

impl FromStr for ImageOrigin {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "internal" => Ok(ImageOrigin::Internal),
            "external" => Ok(ImageOrigin::External),
            _ => Err(anyhow!("Unknown image origin: {}", s)),
        }
    }
}

impl fmt::Display for ImageOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the application shows an image as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageCategory {
    General,
    User,
    Control,
    Mask,
    Other,
}

impl ImageCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageCategory::General => "general",
            ImageCategory::User => "user",
            ImageCategory::Control => "control",
            ImageCategory::Mask => "mask",
            ImageCategory::Other => "other",
        }
    }
}

impl FromStr for ImageCategory {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "general" => Ok(ImageCategory::General),
            "user" => Ok(ImageCategory::User),
            "control" => Ok(ImageCategory::Control),
            "mask" => Ok(ImageCategory::Mask),
            "other" => Ok(ImageCategory::Other),
            _ => Err(anyhow!("Unknown image category: {}", s)),
        }
    }
}

impl fmt::Display for ImageCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A row to be inserted into `images`.
#[derive(Debug, Clone)]
pub struct NewImage {
    pub image_name: String,
    pub origin: ImageOrigin,
    pub category: ImageCategory,
    pub width: u32,
    pub height: u32,
    pub metadata: Option<String>,
    pub is_intermediate: bool,
    pub has_workflow: bool,
    /// Stored as both `created_at` and `updated_at`.
    pub created_at: String,
}

/// An `images` row as read back from the catalog.
#[derive(Debug, Clone)]
pub struct ImageRecord {
    pub image_name: String,
    pub origin: ImageOrigin,
    pub category: ImageCategory,
    pub width: i64,
    pub height: i64,
    pub metadata: Option<String>,
    pub is_intermediate: bool,
    pub has_workflow: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl Database {
    pub fn image_exists(&self, image_name: &str) -> Result<bool> {
        let found = self
            .conn
            .query_row(
                "SELECT 1 FROM images WHERE image_name = ?",
                [image_name],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    pub fn insert_image(&self, image: &NewImage) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO images (
                image_name,
                image_origin,
                image_category,
                width,
                height,
                metadata,
                is_intermediate,
                created_at,
                updated_at,
                has_workflow
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            rusqlite::params![
                image.image_name,
                image.origin.as_str(),
                image.category.as_str(),
                image.width,
                image.height,
                image.metadata,
                image.is_intermediate,
                image.created_at,
                image.created_at,
                image.has_workflow,
            ],
        )?;
        Ok(())
    }

    pub fn get_image(&self, image_name: &str) -> Result<Option<ImageRecord>> {
        let row = self
            .conn
            .query_row(
                r#"
                SELECT image_name, image_origin, image_category, width, height, metadata,
                       is_intermediate, has_workflow, created_at, updated_at
                FROM images
                WHERE image_name = ?
                "#,
                [image_name],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, i64>(3)?,
                        row.get::<_, i64>(4)?,
                        row.get::<_, Option<String>>(5)?,
                        row.get::<_, Option<bool>>(6)?,
                        row.get::<_, Option<bool>>(7)?,
                        row.get::<_, String>(8)?,
                        row.get::<_, String>(9)?,
                    ))
                },
            )
            .optional()?;

        let Some((name, origin, category, width, height, metadata, intermediate, workflow, created_at, updated_at)) = row
        else {
            return Ok(None);
        };

        Ok(Some(ImageRecord {
            image_name: name,
            origin: origin.parse()?,
            category: category.parse()?,
            width,
            height,
            metadata,
            is_intermediate: intermediate.unwrap_or(false),
            has_workflow: workflow.unwrap_or(false),
            created_at,
            updated_at,
        }))
    }

    #[cfg(test)]
    pub(crate) fn count_images(&self) -> Result<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM images", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Names of all images linked to a board, in link order.
    pub fn images_for_board(&self, board_id: &str) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT image_name FROM board_images WHERE board_id = ? ORDER BY rowid")?;
        let names = stmt
            .query_map([board_id], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(names)
    }

    /// Set category and origin of the named images in one transaction.
    ///
    /// Returns the number of rows changed. No other column is written.
    pub fn set_classification(
        &self,
        image_names: &[String],
        category: ImageCategory,
        origin: ImageOrigin,
    ) -> Result<usize> {
        let tx = self.conn.unchecked_transaction()?;
        let mut updated = 0;
        {
            let mut stmt = tx.prepare(
                r#"
                UPDATE images
                SET
                    image_category = ?,
                    image_origin   = ?
                WHERE image_name = ?
                "#,
            )?;
            for name in image_names {
                updated += stmt.execute(rusqlite::params![category.as_str(), origin.as_str(), name])?;
            }
        }
        tx.commit()?;
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.initialize().unwrap();
        db
    }

    fn new_image(name: &str) -> NewImage {
        NewImage {
            image_name: name.to_string(),
            origin: ImageOrigin::Internal,
            category: ImageCategory::General,
            width: 640,
            height: 480,
            metadata: Some("{\"seed\": 1}".to_string()),
            is_intermediate: false,
            has_workflow: true,
            created_at: "2024-01-02 03:04:05.000000".to_string(),
        }
    }

    #[test]
    fn test_enum_strings() {
        assert_eq!(ImageOrigin::External.as_str(), "external");
        assert_eq!("internal".parse::<ImageOrigin>().unwrap(), ImageOrigin::Internal);
        assert_eq!(ImageCategory::User.to_string(), "user");
        assert_eq!("mask".parse::<ImageCategory>().unwrap(), ImageCategory::Mask);
        assert!("bogus".parse::<ImageCategory>().is_err());
    }

    #[test]
    fn test_insert_and_read_back() {
        let db = catalog();
        assert!(!db.image_exists("a.png").unwrap());

        db.insert_image(&new_image("a.png")).unwrap();

        assert!(db.image_exists("a.png").unwrap());
        assert!(!db.image_exists("A.png").unwrap());

        let record = db.get_image("a.png").unwrap().unwrap();
        assert_eq!(record.origin, ImageOrigin::Internal);
        assert_eq!(record.category, ImageCategory::General);
        assert_eq!((record.width, record.height), (640, 480));
        assert_eq!(record.metadata.as_deref(), Some("{\"seed\": 1}"));
        assert!(!record.is_intermediate);
        assert!(record.has_workflow);
        assert_eq!(record.created_at, "2024-01-02 03:04:05.000000");
        assert_eq!(record.updated_at, record.created_at);
    }

    #[test]
    fn test_duplicate_insert_fails() {
        let db = catalog();
        db.insert_image(&new_image("a.png")).unwrap();
        assert!(db.insert_image(&new_image("a.png")).is_err());
        assert_eq!(db.count_images().unwrap(), 1);
    }

    #[test]
    fn test_set_classification_counts_changed_rows() {
        let db = catalog();
        db.insert_image(&new_image("a.png")).unwrap();
        db.insert_image(&new_image("b.png")).unwrap();

        let names = vec!["a.png".to_string(), "b.png".to_string(), "missing.png".to_string()];
        let updated = db
            .set_classification(&names, ImageCategory::User, ImageOrigin::External)
            .unwrap();
        assert_eq!(updated, 2);

        let record = db.get_image("b.png").unwrap().unwrap();
        assert_eq!(record.category, ImageCategory::User);
        assert_eq!(record.origin, ImageOrigin::External);
        assert_eq!(record.created_at, "2024-01-02 03:04:05.000000");
        assert!(record.has_workflow);
    }

    #[test]
    fn test_set_classification_empty() {
        let db = catalog();
        let updated = db
            .set_classification(&[], ImageCategory::General, ImageOrigin::Internal)
            .unwrap();
        assert_eq!(updated, 0);
    }
}
