use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::error::UserError;
use super::model::{NewUser, User, UserSummary};
use super::repo::UserRepository;

/// In-process repository backed by a vector, for tests.
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<Vec<User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn all(&self) -> Vec<User> {
        self.users.read().await.clone()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: NewUser) -> Result<User, UserError> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.email == user.email) {
            return Err(UserError::DuplicateEmail { email: user.email });
        }
        let row = User {
            id: user.id,
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            address: user.address,
            latitude: user.latitude,
            longitude: user.longitude,
            status: user.status,
            created_at: user.created_at,
        };
        users.push(row.clone());
        Ok(row)
    }

    async fn toggle_all_statuses(&self) -> Result<u64, UserError> {
        let mut users = self.users.write().await;
        for u in users.iter_mut() {
            u.status = u.status.toggled();
        }
        Ok(users.len() as u64)
    }

    async fn find_by_weekday(&self, weekday: u8) -> Result<Vec<UserSummary>, UserError> {
        let users = self.users.read().await;
        let mut matching: Vec<&User> = users
            .iter()
            .filter(|u| {
                let utc = u.created_at.to_offset(time::UtcOffset::UTC);
                utc.weekday().number_days_from_sunday() == weekday
            })
            .collect();
        matching.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(matching
            .into_iter()
            .map(|u| UserSummary {
                name: u.name.clone(),
                email: u.email.clone(),
            })
            .collect())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, UserError> {
        Ok(self.users.read().await.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, UserError> {
        Ok(self
            .users
            .read()
            .await
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }
}

/// Repository whose every call fails as if the pool were closed.
pub struct FailingUserRepository;

#[async_trait]
impl UserRepository for FailingUserRepository {
    async fn create(&self, _user: NewUser) -> Result<User, UserError> {
        Err(sqlx::Error::PoolClosed.into())
    }

    async fn toggle_all_statuses(&self) -> Result<u64, UserError> {
        Err(sqlx::Error::PoolClosed.into())
    }

    async fn find_by_weekday(&self, _weekday: u8) -> Result<Vec<UserSummary>, UserError> {
        Err(sqlx::Error::PoolClosed.into())
    }

    async fn find_by_id(&self, _id: Uuid) -> Result<Option<User>, UserError> {
        Err(sqlx::Error::PoolClosed.into())
    }

    async fn find_by_email(&self, _email: &str) -> Result<Option<User>, UserError> {
        Err(sqlx::Error::PoolClosed.into())
    }
}
