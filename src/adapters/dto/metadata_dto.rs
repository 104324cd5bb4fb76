use sqlx::{sqlite::SqliteRow, FromRow, Row};

use crate::domain::models::file::FileRecord;

impl FromRow<'_, SqliteRow> for FileRecord {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        let size: i64 = row.try_get("size")?;

        Ok(FileRecord {
            id: row.try_get("id")?,
            owner: row.try_get("owner")?,
            original_name: row.try_get("original_name")?,
            stored_name: row.try_get("stored_name")?,
            mimetype: row.try_get("mimetype")?,
            size: u64::try_from(size).map_err(|e| sqlx::Error::ColumnDecode {
                index: "size".to_string(),
                source: Box::new(e),
            })?,
            upload_time: row.try_get("upload_time")?,
            lifetime: row.try_get("lifetime")?,
        })
    }
}
