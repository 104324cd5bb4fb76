use async_trait::async_trait;
use sqlx::{query, query_as, SqlitePool};

use crate::{
    application::{error::ApplicationError, repositories::user_repository::UserRepository},
    domain::models::user::User,
};

pub struct SqliteUserRepository {
    pool: SqlitePool,
}

impl SqliteUserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    async fn create_user(&self, user: User) -> Result<User, ApplicationError> {
        let query = r#"
            INSERT INTO users (username, hashed_password, hashed_token, is_admin)
            VALUES (?, ?, ?, ?)
            RETURNING username, hashed_password, hashed_token, is_admin
        "#;

        query_as::<_, User>(query)
            .bind(&user.username)
            .bind(&user.hashed_password)
            .bind(&user.hashed_token)
            .bind(user.is_admin)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e.as_database_error() {
                Some(db) if db.is_unique_violation() => ApplicationError::BadRequest(format!(
                    "Username {} is already taken",
                    user.username
                )),
                _ => ApplicationError::DatabaseError(e.to_string()),
            })
    }

    async fn get_user(&self, username: &str) -> Result<Option<User>, ApplicationError> {
        let query = r#"
            SELECT username, hashed_password, hashed_token, is_admin
            FROM users WHERE username = ?
        "#;

        query_as::<_, User>(query)
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| ApplicationError::DatabaseError(e.to_string()))
    }

    async fn set_token_hash(&self, username: &str, token_hash: &str) -> Result<(), ApplicationError> {
        let result = query("UPDATE users SET hashed_token = ? WHERE username = ?")
            .bind(token_hash)
            .bind(username)
            .execute(&self.pool)
            .await
            .map_err(|e| ApplicationError::DatabaseError(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(ApplicationError::NotFound(format!(
                "User {} not found",
                username
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::database::connect_in_memory;

    fn user(name: &str) -> User {
        User {
            username: name.to_string(),
            hashed_password: "$argon2id$placeholder".to_string(),
            hashed_token: None,
            is_admin: false,
        }
    }

    #[tokio::test]
    async fn duplicate_username_is_rejected() {
        let repo = SqliteUserRepository::new(connect_in_memory().await.unwrap());
        repo.create_user(user("test-user")).await.unwrap();

        let err = repo.create_user(user("test-user")).await.unwrap_err();

        match err {
            ApplicationError::BadRequest(msg) => {
                assert_eq!(msg, "Username test-user is already taken")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn token_hash_is_replaced() {
        let repo = SqliteUserRepository::new(connect_in_memory().await.unwrap());
        repo.create_user(user("test-user")).await.unwrap();

        repo.set_token_hash("test-user", "first").await.unwrap();
        repo.set_token_hash("test-user", "second").await.unwrap();

        let stored = repo.get_user("test-user").await.unwrap().unwrap();
        assert_eq!(stored.hashed_token.as_deref(), Some("second"));
        assert!(repo.get_user("nobody").await.unwrap().is_none());
        assert!(repo.set_token_hash("nobody", "x").await.is_err());
    }
}
