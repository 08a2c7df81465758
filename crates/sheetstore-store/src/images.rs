use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::params;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::Image;

impl Database {
    /// Store a new image. `file_url` is kept exactly as given.
    pub fn insert_image(&self, file_name: &str, file_url: &str) -> Result<Image> {
        // fixed-width timestamps so text ordering matches time ordering
        let created_at = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);

        let id = self.conn().query_row(
            "INSERT INTO images (file_name, file_url, created_at)
             VALUES (?1, ?2, ?3)
             RETURNING id",
            params![file_name, file_url, created_at],
            |row| row.get(0),
        )?;

        self.get_image(id)
    }

    pub fn get_image(&self, id: i64) -> Result<Image> {
        self.conn()
            .query_row(
                "SELECT id, file_name, file_url, created_at
                 FROM images
                 WHERE id = ?1",
                params![id],
                row_to_image,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })
    }

    /// Newest first. The payload column is never read.
    pub fn list_images(&self) -> Result<Vec<Image>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, file_name, NULL, created_at
             FROM images
             ORDER BY created_at DESC, id DESC",
        )?;

        let rows = stmt.query_map([], row_to_image)?;

        let mut images = Vec::new();
        for row in rows {
            images.push(row?);
        }
        Ok(images)
    }

    pub fn delete_image(&self, id: i64) -> Result<bool> {
        let affected = self
            .conn()
            .execute("DELETE FROM images WHERE id = ?1", params![id])?;
        Ok(affected > 0)
    }
}

fn row_to_image(row: &rusqlite::Row<'_>) -> rusqlite::Result<Image> {
    let id: i64 = row.get(0)?;
    let file_name: String = row.get(1)?;
    let file_url: Option<String> = row.get(2)?;
    let created_str: String = row.get(3)?;

    let created_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&created_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e)))?;

    Ok(Image {
        id,
        file_name,
        file_url,
        created_at,
    })
}
