use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use time::{format_description::FormatItem, macros::format_description, UtcOffset};
use tracing::{error, info, instrument, warn};

use super::dto::{
    CreateUserRequest, CreateUserResponse, CreatedUser, DistanceRequest, DistanceResponse,
    StatusChangeResponse, UserListingRequest, UserListingResponse,
};
use super::model::Registration;
use super::services::UserService;
use super::validation::{
    candidate_email, validate_create_user, validate_destination, validate_week_numbers,
};
use crate::{auth::AuthUser, error::ApiError, geo::round_km, state::AppState};

const REGISTER_AT_FORMAT: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

pub fn public_routes() -> Router<AppState> {
    Router::new().route("/create-user", post(create_user))
}

/// Every handler here takes `AuthUser`, so a bearer token is required.
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/change-status", post(change_status))
        .route("/get-distance", post(get_distance))
        .route("/get-user-listing", post(get_user_listing))
}

#[instrument(skip(state, service, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    State(service): State<UserService>,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<Json<CreateUserResponse>, ApiError> {
    let Json(body) = payload?;
    let email_taken = match candidate_email(&body) {
        Some(email) => service
            .email_taken(&email)
            .await
            .map_err(|e| ApiError::from_user_error(e, "User creation failed"))?,
        None => false,
    };
    let input = validate_create_user(body, email_taken).map_err(|errors| {
        warn!(?errors, "create user validation failed");
        ApiError::validation(errors)
    })?;

    let password_hash = state.hasher.hash(&input.password).map_err(|e| {
        error!(error = %e, "hash_password failed");
        ApiError::internal("User creation failed", e)
    })?;

    let registered = service
        .register_user(Registration {
            name: input.name,
            email: input.email,
            password_hash,
            address: input.address,
            latitude: input.latitude,
            longitude: input.longitude,
        })
        .await
        .map_err(|e| ApiError::from_user_error(e, "User creation failed"))?;

    let user = registered.user;
    let register_at = user
        .created_at
        .to_offset(UtcOffset::UTC)
        .format(REGISTER_AT_FORMAT)
        .map_err(|e| ApiError::internal("User creation failed", e))?;

    Ok(Json(CreateUserResponse {
        status_code: 200,
        message: "User created successfully",
        data: CreatedUser {
            id: user.id,
            name: user.name,
            email: user.email,
            address: user.address,
            latitude: user.latitude,
            longitude: user.longitude,
            status: user.status,
            register_at,
            token: registered.token,
        },
    }))
}

#[instrument(skip(service))]
pub async fn change_status(
    State(service): State<UserService>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<StatusChangeResponse>, ApiError> {
    let updated = service
        .toggle_all_user_statuses()
        .await
        .map_err(|e| ApiError::from_user_error(e, "Failed to update user statuses"))?;

    info!(%user_id, updated, "statuses toggled by user");
    Ok(Json(StatusChangeResponse {
        status_code: 200,
        message: "All user statuses have been updated successfully.",
        updated,
    }))
}

#[instrument(skip(service, payload))]
pub async fn get_distance(
    State(service): State<UserService>,
    AuthUser(user_id): AuthUser,
    payload: Result<Json<DistanceRequest>, JsonRejection>,
) -> Result<Json<DistanceResponse>, ApiError> {
    let Json(body) = payload?;
    let (lat, lon) = validate_destination(body).map_err(ApiError::validation)?;

    let distance = service
        .distance_from_user(user_id, lat, lon)
        .await
        .map_err(|e| ApiError::from_user_error(e, "Distance calculation failed"))?;

    Ok(Json(DistanceResponse {
        status_code: 200,
        message: "Distance calculated successfully",
        distance: format!("{} km", round_km(distance)),
    }))
}

#[instrument(skip(service, payload))]
pub async fn get_user_listing(
    State(service): State<UserService>,
    AuthUser(_user_id): AuthUser,
    payload: Result<Json<UserListingRequest>, JsonRejection>,
) -> Result<Json<UserListingResponse>, ApiError> {
    let Json(body) = payload?;
    let weekdays = validate_week_numbers(body).map_err(ApiError::validation)?;

    let data = service
        .list_users_by_weekdays(&weekdays)
        .await
        .map_err(|e| ApiError::from_user_error(e, "Failed to fetch users"))?;

    Ok(Json(UserListingResponse {
        status_code: 200,
        message: "Users fetched successfully",
        data,
    }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        extract::FromRef,
        http::{header, Request, StatusCode},
        Router,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use uuid::Uuid;

    use crate::{
        app::build_app,
        auth::{Argon2Hasher, JwtKeys},
        state::AppState,
        users::memory::FailingUserRepository,
    };

    async fn send(app: &Router, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        let mut req = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(t) = token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {t}"));
        }
        let res = app
            .clone()
            .oneshot(req.body(Body::from(body.to_string())).unwrap())
            .await
            .unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    fn registration(email: &str) -> Value {
        json!({
            "name": "Grace Hopper",
            "email": email,
            "password": "cobol-rules",
            "address": "Arlington, VA",
            "latitude": 0.0,
            "longitude": 0.0
        })
    }

    async fn register(app: &Router, email: &str) -> String {
        let (status, body) = send(app, "/api/create-user", None, registration(email)).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["data"]["token"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn create_user_returns_record_and_token() {
        let app = build_app(AppState::fake());
        let (status, body) =
            send(&app, "/api/create-user", None, registration("grace@example.com")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status_code"], 200);
        assert_eq!(body["message"], "User created successfully");
        let data = &body["data"];
        assert_eq!(data["email"], "grace@example.com");
        assert_eq!(data["status"], "active");
        assert!(data.get("password").is_none());
        assert!(data.get("password_hash").is_none());
        assert_eq!(data["register_at"].as_str().unwrap().len(), 19);
        assert!(!data["token"].as_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_user_duplicate_email_is_validation_error() {
        let app = build_app(AppState::fake());
        register(&app, "dup@example.com").await;

        let (status, body) =
            send(&app, "/api/create-user", None, registration("dup@example.com")).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["message"], "Validation error");
        assert_eq!(body["errors"]["email"][0], "The email has already been taken.");
    }

    #[tokio::test]
    async fn create_user_reports_field_errors() {
        let app = build_app(AppState::fake());
        let (status, body) = send(
            &app,
            "/api/create-user",
            None,
            json!({ "name": "", "email": "nope", "latitude": 95 }),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["errors"]["name"].is_array());
        assert!(body["errors"]["email"].is_array());
        assert!(body["errors"]["latitude"].is_array());
        assert!(body["errors"]["longitude"].is_array());
    }

    #[tokio::test]
    async fn create_user_accepts_numeric_string_coordinates() {
        let app = build_app(AppState::fake());
        let mut body = registration("numeric@example.com");
        body["latitude"] = json!("51.5");
        body["longitude"] = json!("-0.13");

        let (status, body) = send(&app, "/api/create-user", None, body).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["data"]["latitude"], 51.5);
        assert_eq!(body["data"]["longitude"], -0.13);
    }

    #[tokio::test]
    async fn create_user_reports_non_numeric_coordinate_on_its_field() {
        let app = build_app(AppState::fake());
        let mut body = registration("abc@example.com");
        body["latitude"] = json!("abc");

        let (status, body) = send(&app, "/api/create-user", None, body).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            body["errors"]["latitude"][0],
            "The latitude field must be a number."
        );
        assert!(body["errors"].get("body").is_none());
    }

    #[tokio::test]
    async fn create_user_reports_taken_email_with_other_field_errors() {
        let app = build_app(AppState::fake());
        register(&app, "taken@example.com").await;

        let mut body = registration("taken@example.com");
        body["name"] = json!("");
        let (status, body) = send(&app, "/api/create-user", None, body).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["errors"]["name"][0], "The name field is required.");
        assert_eq!(body["errors"]["email"][0], "The email has already been taken.");
    }

    #[tokio::test]
    async fn create_user_persistence_failure_is_internal_error() {
        let fake = AppState::fake();
        let state = AppState::from_parts(
            fake.config.clone(),
            Arc::new(FailingUserRepository),
            Arc::new(Argon2Hasher),
        );
        let app = build_app(state);
        let (status, body) =
            send(&app, "/api/create-user", None, registration("x@example.com")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "User creation failed");
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn protected_routes_require_bearer_token() {
        let app = build_app(AppState::fake());
        for uri in ["/api/change-status", "/api/get-distance", "/api/get-user-listing"] {
            let (status, body) = send(&app, uri, None, json!({})).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
            assert_eq!(body["status_code"], 401);

            let (status, _) = send(&app, uri, Some("garbage"), json!({})).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
        }
    }

    #[tokio::test]
    async fn change_status_reports_updated_rows() {
        let app = build_app(AppState::fake());
        let token = register(&app, "a@example.com").await;
        register(&app, "b@example.com").await;

        let (status, body) = send(&app, "/api/change-status", Some(&token), json!({})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["message"],
            "All user statuses have been updated successfully."
        );
        assert_eq!(body["updated"], 2);
    }

    #[tokio::test]
    async fn get_distance_from_authenticated_user() {
        let app = build_app(AppState::fake());
        let token = register(&app, "geo@example.com").await;

        let (status, body) = send(
            &app,
            "/api/get-distance",
            Some(&token),
            json!({ "destination_latitude": 0, "destination_longitude": 90 }),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["distance"], "10007.54 km");

        let (status, body) = send(
            &app,
            "/api/get-distance",
            Some(&token),
            json!({ "destination_latitude": 0, "destination_longitude": 0 }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["distance"], "0 km");
    }

    #[tokio::test]
    async fn get_distance_for_unknown_user_is_unauthorized() {
        let state = AppState::fake();
        let token = JwtKeys::from_ref(&state).sign_access(Uuid::new_v4()).unwrap();
        let app = build_app(state);

        let (status, _) = send(
            &app,
            "/api/get-distance",
            Some(&token),
            json!({ "destination_latitude": 1, "destination_longitude": 1 }),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn get_user_listing_buckets_by_registration_day() {
        let app = build_app(AppState::fake());
        let (status, created) = send(
            &app,
            "/api/create-user",
            None,
            registration("today@example.com"),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{created}");
        let token = created["data"]["token"].as_str().unwrap();

        // the bucket comes from the stored timestamp, not the test's clock
        let register_at = created["data"]["register_at"].as_str().unwrap();
        let registered_on = time::Date::parse(
            &register_at[..10],
            time::macros::format_description!("[year]-[month]-[day]"),
        )
        .unwrap();
        let day = registered_on.weekday().number_days_from_sunday();
        let other = (day + 1) % 7;

        let (status, body) = send(
            &app,
            "/api/get-user-listing",
            Some(token),
            json!({ "week_number": [day, other] }),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        let data = body["data"].as_object().unwrap();
        assert_eq!(data.len(), 2);
        let day_name = crate::users::model::WEEKDAYS[day as usize];
        let other_name = crate::users::model::WEEKDAYS[other as usize];
        assert_eq!(data[day_name][0]["email"], "today@example.com");
        assert_eq!(data[day_name][0]["name"], "Grace Hopper");
        assert!(data[day_name][0].get("address").is_none());
        assert!(data[other_name].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn get_user_listing_reports_non_integer_days_per_field() {
        let app = build_app(AppState::fake());
        let token = register(&app, "ints@example.com").await;

        let (status, body) = send(
            &app,
            "/api/get-user-listing",
            Some(&token),
            json!({ "week_number": [1, "x"] }),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            body["errors"]["week_number"][0],
            "The week number.1 field must be an integer."
        );
        assert!(body["errors"].get("body").is_none());
    }

    #[tokio::test]
    async fn get_user_listing_rejects_bad_input() {
        let app = build_app(AppState::fake());
        let token = register(&app, "l@example.com").await;

        let (status, body) = send(
            &app,
            "/api/get-user-listing",
            Some(&token),
            json!({ "week_number": [7] }),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["errors"]["week_number"].is_array());

        let (status, _) = send(
            &app,
            "/api/get-user-listing",
            Some(&token),
            json!({ "week_number": [] }),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, _) = send(
            &app,
            "/api/get-user-listing",
            Some(&token),
            json!({ "week_number": "monday" }),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }
}
