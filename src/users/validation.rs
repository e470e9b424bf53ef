use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

use super::dto::{CreateUserRequest, DistanceRequest, UserListingRequest};
use crate::error::FieldErrors;

const MAX_LEN: usize = 255;

/// Registration input that passed every field rule.
pub struct ValidCreateUser {
    pub name: String,
    pub email: String,
    pub password: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// The trimmed email of a registration request, if it is well formed.
/// Used to look up an existing account before the other rules run.
pub fn candidate_email(req: &CreateUserRequest) -> Option<String> {
    req.email
        .as_ref()
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|e| is_valid_email(e) && e.chars().count() <= MAX_LEN)
        .map(String::from)
}

fn push(errors: &mut FieldErrors, field: &str, message: String) {
    errors.entry(field.to_string()).or_default().push(message);
}

fn label(field: &str) -> String {
    field.replace('_', " ")
}

fn is_missing(value: &Option<Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(Value::Array(a)) => a.is_empty(),
        Some(_) => false,
    }
}

fn required(errors: &mut FieldErrors, field: &str) {
    push(errors, field, format!("The {} field is required.", label(field)));
}

fn required_string(errors: &mut FieldErrors, field: &str, value: Option<Value>) -> Option<String> {
    if is_missing(&value) {
        required(errors, field);
        return None;
    }
    match value {
        Some(Value::String(s)) => Some(s.trim().to_string()),
        _ => {
            push(errors, field, format!("The {} field must be a string.", label(field)));
            None
        }
    }
}

fn max_length(errors: &mut FieldErrors, field: &str, value: &str) {
    if value.chars().count() > MAX_LEN {
        push(
            errors,
            field,
            format!(
                "The {} field must not be greater than {MAX_LEN} characters.",
                label(field)
            ),
        );
    }
}

/// Numbers and numeric strings are both accepted.
fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
}

fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

fn coordinate(errors: &mut FieldErrors, field: &str, value: Option<Value>, bound: f64) -> Option<f64> {
    if is_missing(&value) {
        required(errors, field);
        return None;
    }
    match value.as_ref().and_then(as_number) {
        None => {
            push(errors, field, format!("The {} field must be a number.", label(field)));
            None
        }
        Some(v) if !(-bound..=bound).contains(&v) => {
            push(
                errors,
                field,
                format!("The {} field must be between -{bound} and {bound}.", label(field)),
            );
            None
        }
        Some(v) => Some(v),
    }
}

/// `email_taken` comes from a repository lookup on [`candidate_email`], so
/// a taken email is reported alongside every other field error.
pub fn validate_create_user(
    req: CreateUserRequest,
    email_taken: bool,
) -> Result<ValidCreateUser, FieldErrors> {
    let mut errors = FieldErrors::new();

    let name = required_string(&mut errors, "name", req.name);
    if let Some(name) = &name {
        max_length(&mut errors, "name", name);
    }

    let email = required_string(&mut errors, "email", req.email);
    if let Some(email) = &email {
        if !is_valid_email(email) {
            push(
                &mut errors,
                "email",
                "The email field must be a valid email address.".into(),
            );
        }
        max_length(&mut errors, "email", email);
        if email_taken {
            push(&mut errors, "email", "The email has already been taken.".into());
        }
    }

    // passwords are not trimmed
    let password = match req.password {
        Some(Value::String(p)) if !p.is_empty() => Some(p),
        Some(Value::String(_)) | Some(Value::Null) | None => {
            required(&mut errors, "password");
            None
        }
        Some(_) => {
            push(&mut errors, "password", "The password field must be a string.".into());
            None
        }
    };

    let address = required_string(&mut errors, "address", req.address);
    let latitude = coordinate(&mut errors, "latitude", req.latitude, 90.0);
    let longitude = coordinate(&mut errors, "longitude", req.longitude, 180.0);

    match (name, email, password, address, latitude, longitude) {
        (Some(name), Some(email), Some(password), Some(address), Some(latitude), Some(longitude))
            if errors.is_empty() =>
        {
            Ok(ValidCreateUser {
                name,
                email,
                password,
                address,
                latitude,
                longitude,
            })
        }
        _ => Err(errors),
    }
}

pub fn validate_destination(req: DistanceRequest) -> Result<(f64, f64), FieldErrors> {
    let mut errors = FieldErrors::new();
    let lat = coordinate(&mut errors, "destination_latitude", req.destination_latitude, 90.0);
    let lon = coordinate(&mut errors, "destination_longitude", req.destination_longitude, 180.0);
    match (lat, lon) {
        (Some(lat), Some(lon)) => Ok((lat, lon)),
        _ => Err(errors),
    }
}

/// Requires a non-empty array of integers. Range checks on the indices
/// belong to the service.
pub fn validate_week_numbers(req: UserListingRequest) -> Result<Vec<i64>, FieldErrors> {
    let mut errors = FieldErrors::new();
    if is_missing(&req.week_number) {
        required(&mut errors, "week_number");
        return Err(errors);
    }
    let Some(Value::Array(items)) = req.week_number else {
        push(
            &mut errors,
            "week_number",
            "The week number field must be an array.".into(),
        );
        return Err(errors);
    };

    let mut days = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        match as_integer(item) {
            Some(day) => days.push(day),
            None => push(
                &mut errors,
                "week_number",
                format!("The week number.{i} field must be an integer."),
            ),
        }
    }

    if errors.is_empty() {
        Ok(days)
    } else {
        Err(errors)
    }
}
