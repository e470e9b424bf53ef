use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum UserError {
    #[error("user with email '{email}' already exists")]
    DuplicateEmail { email: String },

    #[error("weekday index {index} is out of range 0..=6")]
    InvalidWeekdayIndex { index: i64 },

    #[error("user not found: {id}")]
    UserNotFound { id: Uuid },

    #[error("persistence failure")]
    Persistence(#[source] sqlx::Error),

    #[error("token issuance failed")]
    TokenIssue(#[source] anyhow::Error),
}

impl From<sqlx::Error> for UserError {
    fn from(e: sqlx::Error) -> Self {
        Self::Persistence(e)
    }
}
