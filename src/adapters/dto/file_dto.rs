use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::models::file::FileRecord;

#[derive(Debug, Serialize)]
pub struct FileResponse {
    pub id: String,
    pub owner: Option<String>,
    #[serde(rename = "originalName")]
    pub original_name: String,
    #[serde(rename = "storedName")]
    pub stored_name: String,
    pub mimetype: String,
    pub size: u64,
    #[serde(rename = "uploadTime")]
    pub upload_time: DateTime<Utc>,
    pub lifetime: i64,
    #[serde(rename = "expiresAt")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(rename = "isFileAvailable")]
    pub is_file_available: bool,
}

impl FileResponse {
    pub fn new(record: FileRecord, is_file_available: bool) -> Self {
        let expires_at = record.expires_at();

        Self {
            id: record.id,
            owner: record.owner,
            original_name: record.original_name,
            stored_name: record.stored_name,
            mimetype: record.mimetype,
            size: record.size,
            upload_time: record.upload_time,
            lifetime: record.lifetime,
            expires_at,
            is_file_available,
        }
    }
}
