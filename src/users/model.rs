use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Active,
    Inactive,
}

#[cfg(test)]
impl UserStatus {
    pub fn toggled(self) -> Self {
        match self {
            UserStatus::Active => UserStatus::Inactive,
            UserStatus::Inactive => UserStatus::Active,
        }
    }
}

/// User row in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // Argon2 hash, not exposed in JSON
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub status: UserStatus,
    pub created_at: OffsetDateTime,
}

/// Fully assembled user, ready to be inserted.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub status: UserStatus,
    pub created_at: OffsetDateTime,
}

/// Validated registration input. The password is already hashed.
#[derive(Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Public view of a user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserRecord {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub status: UserStatus,
    pub created_at: OffsetDateTime,
}

impl From<User> for UserRecord {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            name: u.name,
            email: u.email,
            address: u.address,
            latitude: u.latitude,
            longitude: u.longitude,
            status: u.status,
            created_at: u.created_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RegisteredUser {
    pub user: UserRecord,
    pub token: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct UserSummary {
    pub name: String,
    pub email: String,
}

pub const WEEKDAYS: [&str; 7] = [
    "sunday",
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
];

/// Users grouped by weekday name, in first-seen key order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeekdayListing {
    buckets: Vec<(&'static str, Vec<UserSummary>)>,
}

impl WeekdayListing {
    /// Sets the bucket for `day`. A repeated day replaces the earlier
    /// value but keeps its original position.
    pub fn insert(&mut self, day: &'static str, users: Vec<UserSummary>) {
        match self.buckets.iter_mut().find(|(d, _)| *d == day) {
            Some((_, existing)) => *existing = users,
            None => self.buckets.push((day, users)),
        }
    }

    #[cfg(test)]
    pub fn get(&self, day: &str) -> Option<&[UserSummary]> {
        self.buckets
            .iter()
            .find(|(d, _)| *d == day)
            .map(|(_, users)| users.as_slice())
    }

    #[cfg(test)]
    pub fn days(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.buckets.iter().map(|(d, _)| *d)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

impl Serialize for WeekdayListing {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.buckets.iter().map(|(d, users)| (*d, users)))
    }
}
