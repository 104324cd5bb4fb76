use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("unprocessable: {0}")]
    Unprocessable(String),

    #[error("payload too large")]
    PayloadTooLarge,

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("database error: {0}")]
    DatabaseError(String),

    #[error("internal error: {0}")]
    InternalError(String),
}
