use lazy_static::lazy_static;
use regex::Regex;

use crate::auth::dto::{LoginRequest, RegisterRequest};
use crate::auth::password::meets_complexity_policy;
use crate::error::{ApiError, FieldError};
use crate::users::dto::{CreateUserRequest, EditUserRequest};

pub fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

const PASSWORD_POLICY_MSG: &str =
    "Password must be at least 6 characters long and contain lowercase, uppercase, digit and special characters";

fn check_email(errors: &mut Vec<FieldError>, email: &str) {
    if !is_valid_email(email) {
        errors.push(FieldError::new("email", "Invalid email format"));
    }
}

fn check_password_policy(errors: &mut Vec<FieldError>, password: &str) {
    if !meets_complexity_policy(password) {
        errors.push(FieldError::new("password", PASSWORD_POLICY_MSG));
    }
}

fn check_profile_fields(
    errors: &mut Vec<FieldError>,
    first_name: &str,
    last_name: &str,
    phone_number: &str,
    address: &str,
    city: &str,
) {
    let required = [
        ("first_name", first_name, "First name is required"),
        ("last_name", last_name, "Last name is required"),
        ("phone_number", phone_number, "Phone number is required"),
        ("address", address, "Address is required"),
        ("city", city, "City is required"),
    ];
    for (path, value, message) in required {
        if value.trim().is_empty() {
            errors.push(FieldError::new(path, message));
        }
    }
}

/// Turns a non-empty error list into the 422 response.
pub fn ensure(errors: Vec<FieldError>) -> Result<(), ApiError> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ApiError::Validation(errors))
    }
}

pub fn validate_register(req: &RegisterRequest) -> Vec<FieldError> {
    let mut errors = Vec::new();
    check_email(&mut errors, &req.email);
    check_password_policy(&mut errors, &req.password);
    check_profile_fields(
        &mut errors,
        &req.first_name,
        &req.last_name,
        &req.phone_number,
        &req.address,
        &req.city,
    );
    errors
}

pub fn validate_create(req: &CreateUserRequest) -> Vec<FieldError> {
    let mut errors = Vec::new();
    check_email(&mut errors, &req.email);
    check_password_policy(&mut errors, &req.password);
    check_profile_fields(
        &mut errors,
        &req.first_name,
        &req.last_name,
        &req.phone_number,
        &req.address,
        &req.city,
    );
    errors
}

pub fn validate_login(req: &LoginRequest) -> Vec<FieldError> {
    let mut errors = Vec::new();
    if req.email.trim().is_empty() {
        errors.push(FieldError::new("email", "Email is required"));
    }
    if req.password.chars().count() < 6 {
        errors.push(FieldError::new(
            "password",
            "Password must be at least 6 characters long",
        ));
    }
    errors
}

pub fn validate_edit(req: &EditUserRequest) -> Vec<FieldError> {
    let mut errors = Vec::new();
    check_email(&mut errors, &req.email);
    check_profile_fields(
        &mut errors,
        &req.first_name,
        &req.last_name,
        &req.phone_number,
        &req.address,
        &req.city,
    );
    errors
}
