use std::sync::Arc;

use axum::extract::FromRef;
use time::OffsetDateTime;
use tracing::{info, instrument};
use uuid::Uuid;

use super::error::UserError;
use super::model::{
    NewUser, RegisteredUser, Registration, UserRecord, UserStatus, WeekdayListing, WEEKDAYS,
};
use super::repo::UserRepository;
use crate::auth::{JwtKeys, TokenIssuer};
use crate::geo::haversine_distance_km;
use crate::state::AppState;

#[derive(Clone)]
pub struct UserService {
    repo: Arc<dyn UserRepository>,
    tokens: Arc<dyn TokenIssuer>,
}

impl FromRef<AppState> for UserService {
    fn from_ref(state: &AppState) -> Self {
        Self::new(state.users.clone(), Arc::new(JwtKeys::from_ref(state)))
    }
}

impl UserService {
    pub fn new(repo: Arc<dyn UserRepository>, tokens: Arc<dyn TokenIssuer>) -> Self {
        Self { repo, tokens }
    }

    /// Persist a new active user and issue a token for it.
    #[instrument(skip(self, reg), fields(email = %reg.email))]
    pub async fn register_user(&self, reg: Registration) -> Result<RegisteredUser, UserError> {
        let new_user = NewUser {
            id: Uuid::new_v4(),
            name: reg.name,
            email: reg.email,
            password_hash: reg.password_hash,
            address: reg.address,
            latitude: reg.latitude,
            longitude: reg.longitude,
            status: UserStatus::Active,
            created_at: OffsetDateTime::now_utc(),
        };

        let user = self.repo.create(new_user).await?;
        let token = self.tokens.issue(user.id).map_err(UserError::TokenIssue)?;

        info!(user_id = %user.id, "user registered");
        Ok(RegisteredUser {
            user: UserRecord::from(user),
            token,
        })
    }

    /// Whether an account already uses exactly this email.
    pub async fn email_taken(&self, email: &str) -> Result<bool, UserError> {
        Ok(self.repo.find_by_email(email).await?.is_some())
    }

    /// Flips the status of every user, no filtering. Returns rows touched.
    #[instrument(skip(self))]
    pub async fn toggle_all_user_statuses(&self) -> Result<u64, UserError> {
        let updated = self.repo.toggle_all_statuses().await?;
        info!(updated, "all user statuses toggled");
        Ok(updated)
    }

    /// Groups users by creation weekday for each requested index
    /// (0 = sunday). The whole input is checked before querying.
    #[instrument(skip(self))]
    pub async fn list_users_by_weekdays(
        &self,
        weekdays: &[i64],
    ) -> Result<WeekdayListing, UserError> {
        let days = weekdays
            .iter()
            .map(|&index| {
                u8::try_from(index)
                    .ok()
                    .filter(|d| usize::from(*d) < WEEKDAYS.len())
                    .ok_or(UserError::InvalidWeekdayIndex { index })
            })
            .collect::<Result<Vec<u8>, _>>()?;

        let mut listing = WeekdayListing::default();
        for day in days {
            let users = self.repo.find_by_weekday(day).await?;
            listing.insert(WEEKDAYS[usize::from(day)], users);
        }
        Ok(listing)
    }

    /// Great-circle distance in km from the user's stored coordinates.
    #[instrument(skip(self))]
    pub async fn distance_from_user(
        &self,
        user_id: Uuid,
        destination_latitude: f64,
        destination_longitude: f64,
    ) -> Result<f64, UserError> {
        let user = self
            .repo
            .find_by_id(user_id)
            .await?
            .ok_or(UserError::UserNotFound { id: user_id })?;

        Ok(haversine_distance_km(
            user.latitude,
            user.longitude,
            destination_latitude,
            destination_longitude,
        ))
    }
}
