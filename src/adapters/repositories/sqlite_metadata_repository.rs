use async_trait::async_trait;
use sqlx::{query, query_as, Sqlite, SqlitePool, Transaction};

use crate::{
    application::{
        error::ApplicationError,
        repositories::metadata_repository::{MetadataRepository, MetadataSession},
    },
    domain::models::file::FileRecord,
};

const SELECT_FILES: &str = r#"
    SELECT id, owner, original_name, stored_name, mimetype, size, upload_time, lifetime
    FROM files
"#;

pub struct SqliteMetadataRepository {
    pool: SqlitePool,
}

impl SqliteMetadataRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn file_not_found() -> ApplicationError {
    ApplicationError::NotFound("File not found".to_string())
}

#[async_trait]
impl MetadataRepository for SqliteMetadataRepository {
    async fn create_file(&self, record: FileRecord) -> Result<FileRecord, ApplicationError> {
        let query = r#"
            INSERT INTO files (
                id, owner, original_name, stored_name, mimetype, size, upload_time, lifetime
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id, owner, original_name, stored_name, mimetype, size, upload_time, lifetime
        "#;

        let size = i64::try_from(record.size).map_err(|_| {
            ApplicationError::InternalError(format!("File size {} cannot be stored", record.size))
        })?;

        query_as::<_, FileRecord>(query)
            .bind(&record.id)
            .bind(&record.owner)
            .bind(&record.original_name)
            .bind(&record.stored_name)
            .bind(&record.mimetype)
            .bind(size)
            .bind(record.upload_time)
            .bind(record.lifetime.max(0))
            .fetch_one(&self.pool)
            .await
            .map_err(|e| ApplicationError::DatabaseError(e.to_string()))
    }

    async fn get_file(&self, file_id: &str) -> Result<FileRecord, ApplicationError> {
        let query = format!("{} WHERE id = ?", SELECT_FILES);

        query_as::<_, FileRecord>(&query)
            .bind(file_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| ApplicationError::DatabaseError(e.to_string()))?
            .ok_or_else(file_not_found)
    }

    async fn list_files(&self) -> Result<Vec<FileRecord>, ApplicationError> {
        let query = format!("{} ORDER BY upload_time, id", SELECT_FILES);

        query_as::<_, FileRecord>(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| ApplicationError::DatabaseError(e.to_string()))
    }

    async fn list_files_by_owner(&self, owner: &str) -> Result<Vec<FileRecord>, ApplicationError> {
        let query = format!("{} WHERE owner = ? ORDER BY upload_time DESC, id", SELECT_FILES);

        query_as::<_, FileRecord>(&query)
            .bind(owner)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| ApplicationError::DatabaseError(e.to_string()))
    }

    async fn delete_file(&self, file_id: &str) -> Result<FileRecord, ApplicationError> {
        let query = r#"
            DELETE FROM files WHERE id = ?
            RETURNING id, owner, original_name, stored_name, mimetype, size, upload_time, lifetime
        "#;

        query_as::<_, FileRecord>(query)
            .bind(file_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| ApplicationError::DatabaseError(e.to_string()))?
            .ok_or_else(file_not_found)
    }

    async fn begin(&self) -> Result<Box<dyn MetadataSession>, ApplicationError> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| ApplicationError::DatabaseError(e.to_string()))?;
        Ok(Box::new(SqliteMetadataSession { tx }))
    }
}

pub struct SqliteMetadataSession {
    tx: Transaction<'static, Sqlite>,
}

#[async_trait]
impl MetadataSession for SqliteMetadataSession {
    async fn delete_file(&mut self, file_id: &str) -> Result<bool, ApplicationError> {
        let result = query("DELETE FROM files WHERE id = ?")
            .bind(file_id)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| ApplicationError::DatabaseError(e.to_string()))?;
        Ok(result.rows_affected() > 0)
    }

    async fn commit(self: Box<Self>) -> Result<(), ApplicationError> {
        self.tx
            .commit()
            .await
            .map_err(|e| ApplicationError::DatabaseError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::database::connect_in_memory;
    use chrono::{Duration, Utc};

    fn record(id: &str, lifetime: i64) -> FileRecord {
        FileRecord {
            id: id.to_string(),
            owner: None,
            original_name: format!("{}.txt", id),
            stored_name: format!("{}.txt", id),
            mimetype: "text/plain".to_string(),
            size: 5,
            upload_time: Utc::now() - Duration::seconds(10),
            lifetime,
        }
    }

    async fn repository() -> SqliteMetadataRepository {
        SqliteMetadataRepository::new(connect_in_memory().await.unwrap())
    }

    #[tokio::test]
    async fn create_then_get_round_trips_every_field() {
        let repo = repository().await;
        let created = repo.create_file(record("abcdefgh", 3600)).await.unwrap();

        let fetched = repo.get_file("abcdefgh").await.unwrap();

        assert_eq!(created, fetched);
        assert_eq!(fetched.lifetime, 3600);
    }

    #[tokio::test]
    async fn size_past_i64_is_refused() {
        let repo = repository().await;
        let mut huge = record("abcdefgh", 0);
        huge.size = u64::MAX;

        let err = repo.create_file(huge).await.unwrap_err();

        assert!(matches!(err, ApplicationError::InternalError(_)));
        assert!(repo.list_files().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_record_is_not_found() {
        let repo = repository().await;
        let err = repo.get_file("missing0").await.unwrap_err();
        assert!(matches!(err, ApplicationError::NotFound(_)));
        let err = repo.delete_file("missing0").await.unwrap_err();
        assert!(matches!(err, ApplicationError::NotFound(_)));
    }

    #[tokio::test]
    async fn stored_name_must_be_unique() {
        let repo = repository().await;
        repo.create_file(record("abcdefgh", 0)).await.unwrap();
        let mut duplicate = record("12345678", 0);
        duplicate.stored_name = "abcdefgh.txt".to_string();

        assert!(repo.create_file(duplicate).await.is_err());
    }

    #[tokio::test]
    async fn session_deletions_are_invisible_until_commit() {
        let repo = repository().await;
        repo.create_file(record("aaaaaaaa", 0)).await.unwrap();
        repo.create_file(record("bbbbbbbb", 0)).await.unwrap();

        let mut session = repo.begin().await.unwrap();
        assert!(session.delete_file("aaaaaaaa").await.unwrap());
        assert!(!session.delete_file("missing0").await.unwrap());
        session.commit().await.unwrap();

        let ids: Vec<String> = repo.list_files().await.unwrap().into_iter().map(|f| f.id).collect();
        assert_eq!(ids, vec!["bbbbbbbb".to_string()]);
    }

    #[tokio::test]
    async fn dropped_session_rolls_back() {
        let repo = repository().await;
        repo.create_file(record("aaaaaaaa", 0)).await.unwrap();

        {
            let mut session = repo.begin().await.unwrap();
            session.delete_file("aaaaaaaa").await.unwrap();
        }

        assert_eq!(repo.list_files().await.unwrap().len(), 1);
    }
}
