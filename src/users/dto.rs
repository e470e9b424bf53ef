use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::model::{UserStatus, WeekdayListing};

/// Request bodies keep raw JSON values so that a wrong type is reported
/// against its own field instead of failing the whole body.
#[derive(Deserialize)]
pub struct CreateUserRequest {
    pub name: Option<Value>,
    pub email: Option<Value>,
    pub password: Option<Value>,
    pub address: Option<Value>,
    pub latitude: Option<Value>,
    pub longitude: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct DistanceRequest {
    pub destination_latitude: Option<Value>,
    pub destination_longitude: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct UserListingRequest {
    pub week_number: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct CreatedUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub status: UserStatus,
    pub register_at: String, // "YYYY-MM-DD HH:MM:SS", UTC
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct CreateUserResponse {
    pub status_code: u16,
    pub message: &'static str,
    pub data: CreatedUser,
}

#[derive(Debug, Serialize)]
pub struct StatusChangeResponse {
    pub status_code: u16,
    pub message: &'static str,
    pub updated: u64,
}

#[derive(Debug, Serialize)]
pub struct DistanceResponse {
    pub status_code: u16,
    pub message: &'static str,
    pub distance: String,
}

#[derive(Debug, Serialize)]
pub struct UserListingResponse {
    pub status_code: u16,
    pub message: &'static str,
    pub data: WeekdayListing,
}
