use once_cell::sync::Lazy;
use regex::Regex;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::error::AppError;

static USER_ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9]{5,}$").unwrap());

pub fn validate_user_id(user_id: &str) -> Result<(), ValidationError> {
    if USER_ID_RE.is_match(user_id) {
        Ok(())
    } else {
        let mut err = ValidationError::new("user_id");
        err.message = Some("User id must be at least 5 alphanumeric characters.".into());
        Err(err)
    }
}

/// At least 8 alphanumeric characters with one lowercase, one uppercase and
/// one digit.
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    let long_enough = password.len() >= 8;
    let alphanumeric = password.chars().all(|c| c.is_ascii_alphanumeric());
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());

    if long_enough && alphanumeric && has_lower && has_upper && has_digit {
        Ok(())
    } else {
        let mut err = ValidationError::new("password");
        err.message = Some(
            "Password must be at least 8 alphanumeric characters and contain a lowercase letter, an uppercase letter and a digit."
                .into(),
        );
        Err(err)
    }
}

/// Flattens derive-generated validation errors into the app error taxonomy,
/// keeping the first field message as the response body.
pub trait ValidateExt {
    fn validate_app(&self) -> Result<(), AppError>;
}

impl<T: Validate> ValidateExt for T {
    fn validate_app(&self) -> Result<(), AppError> {
        self.validate().map_err(into_app_error)
    }
}

fn into_app_error(errors: ValidationErrors) -> AppError {
    let message = errors
        .field_errors()
        .into_iter()
        .flat_map(|(_, field_errors)| field_errors.iter())
        .filter_map(|error| error.message.as_ref())
        .map(|message| message.to_string())
        .next()
        .unwrap_or_else(|| "Invalid request.".to_string());

    AppError::Validation(message)
}
