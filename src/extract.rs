use axum::extract::FromRequest;

use crate::error::AppError;

/// `Json` whose rejection renders as the standard error envelope.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Parses a path segment as a positive user ID.
pub fn parse_user_id(raw: &str) -> Result<i64, AppError> {
    match raw.parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(AppError::BadRequest(format!("invalid user id: {raw:?}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_positive_integers_only() {
        assert_eq!(parse_user_id("42").unwrap(), 42);
        assert!(parse_user_id("0").is_err());
        assert!(parse_user_id("-1").is_err());
        assert!(parse_user_id("abc").is_err());
        assert!(parse_user_id("1.5").is_err());
    }
}
