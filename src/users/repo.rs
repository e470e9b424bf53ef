use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::error::UserError;
use super::model::{NewUser, User, UserSummary};

/// Persistence operations the user service relies on.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a user. Fails with `DuplicateEmail` if the email is taken.
    async fn create(&self, user: NewUser) -> Result<User, UserError>;

    /// Flip active/inactive on every user in one atomic update.
    /// Returns the number of rows touched.
    async fn toggle_all_statuses(&self) -> Result<u64, UserError>;

    /// Name and email of users created on `weekday` (0 = Sunday, UTC).
    async fn find_by_weekday(&self, weekday: u8) -> Result<Vec<UserSummary>, UserError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, UserError>;

    /// Exact, case-sensitive email match.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, UserError>;
}

#[derive(Clone)]
pub struct PgUserRepository {
    db: PgPool,
}

impl PgUserRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, user: NewUser) -> Result<User, UserError> {
        let email = user.email.clone();
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, name, email, password_hash, address, latitude, longitude, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, name, email, password_hash, address, latitude, longitude, status, created_at
            "#,
        )
        .bind(user.id)
        .bind(user.name)
        .bind(user.email)
        .bind(user.password_hash)
        .bind(user.address)
        .bind(user.latitude)
        .bind(user.longitude)
        .bind(user.status)
        .bind(user.created_at)
        .fetch_one(&self.db)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                UserError::DuplicateEmail { email }
            }
            other => UserError::Persistence(other),
        })
    }

    async fn toggle_all_statuses(&self) -> Result<u64, UserError> {
        let result = sqlx::query(
            r#"
            UPDATE users
               SET status = CASE status
                              WHEN 'active' THEN 'inactive'::user_status
                              ELSE 'active'::user_status
                            END
            "#,
        )
        .execute(&self.db)
        .await?;
        Ok(result.rows_affected())
    }

    async fn find_by_weekday(&self, weekday: u8) -> Result<Vec<UserSummary>, UserError> {
        let rows = sqlx::query_as::<_, UserSummary>(
            r#"
            SELECT name, email
              FROM users
             WHERE EXTRACT(DOW FROM created_at AT TIME ZONE 'UTC')::int = $1
             ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(i32::from(weekday))
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, UserError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, address, latitude, longitude, status, created_at
              FROM users
             WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, UserError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, address, latitude, longitude, status, created_at
              FROM users
             WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }
}
