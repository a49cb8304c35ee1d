use axum::{http::StatusCode, Json};
use regex::Regex;
use std::sync::OnceLock;
use validator::{ValidationError, ValidationErrors};

static PHONE_NUMBER: OnceLock<Regex> = OnceLock::new();

pub fn validate_phone_number(phone: &str) -> Result<(), ValidationError> {
    let re = PHONE_NUMBER.get_or_init(|| {
        Regex::new(r"^\+?[1-9]\d{0,15}$").expect("Invalid phone number pattern")
    });

    if re.is_match(phone) {
        Ok(())
    } else {
        let mut error = ValidationError::new("INVALID_PHONE_NUMBER");
        error.message = Some("Invalid phone number format".into());
        Err(error)
    }
}

// Flatten validator's nested error map into the single `error` string the
// rest of the API speaks.
pub fn into_response(errors: ValidationErrors) -> (StatusCode, Json<serde_json::Value>) {
    let message = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| match &error.message {
                Some(message) => message.to_string(),
                None => format!("Invalid value for {}", field),
            })
        })
        .next()
        .unwrap_or_else(|| "Invalid request payload".to_string());

    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({ "error": message })),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_international_numbers() {
        assert!(validate_phone_number("+1234567890").is_ok());
        assert!(validate_phone_number("4915770000000").is_ok());
    }

    #[test]
    fn rejects_leading_zero_and_letters() {
        assert!(validate_phone_number("0123").is_err());
        assert!(validate_phone_number("call-me").is_err());
        assert!(validate_phone_number("").is_err());
    }
}
