use lazy_static::lazy_static;
use regex::Regex;

use super::dto::{CreateUserRequest, UpdateUserRequest};
use crate::{auth::password::MAX_PASSWORD_BYTES, error::AppError, error::FieldViolation};

const USERNAME_MIN: usize = 3;
const USERNAME_MAX: usize = 50;
const PASSWORD_MIN: usize = 6;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn check_username(username: &str, out: &mut Vec<FieldViolation>) {
    let len = username.chars().count();
    if !(USERNAME_MIN..=USERNAME_MAX).contains(&len) {
        out.push(FieldViolation::new(
            "username",
            format!("must be between {USERNAME_MIN} and {USERNAME_MAX} characters"),
        ));
    }
}

fn check_email(email: &str, out: &mut Vec<FieldViolation>) {
    if !is_valid_email(email) {
        out.push(FieldViolation::new("email", "must be a valid email address"));
    }
}

fn check_password(password: &str, out: &mut Vec<FieldViolation>) {
    if password.chars().count() < PASSWORD_MIN {
        out.push(FieldViolation::new(
            "password",
            format!("must be at least {PASSWORD_MIN} characters"),
        ));
    } else if password.len() > MAX_PASSWORD_BYTES {
        out.push(FieldViolation::new(
            "password",
            format!("must be at most {MAX_PASSWORD_BYTES} bytes"),
        ));
    }
}

fn finish<T>(value: T, violations: Vec<FieldViolation>) -> Result<T, AppError> {
    if violations.is_empty() {
        Ok(value)
    } else {
        Err(AppError::Validation(violations))
    }
}

/// Normalized, checked input for user creation.
#[derive(Debug)]
pub struct NewUserInput {
    pub username: String,
    pub email: String,
    pub password: String,
}

pub fn validate_create(req: CreateUserRequest) -> Result<NewUserInput, AppError> {
    let input = NewUserInput {
        username: req.username.trim().to_string(),
        email: normalize_email(&req.email),
        password: req.password,
    };
    let mut violations = Vec::new();
    check_username(&input.username, &mut violations);
    check_email(&input.email, &mut violations);
    check_password(&input.password, &mut violations);
    finish(input, violations)
}

/// Fields of an update request that carry a value.
#[derive(Debug, Default)]
pub struct UserPatch {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

pub fn validate_update(req: UpdateUserRequest) -> Result<UserPatch, AppError> {
    let patch = UserPatch {
        username: req
            .username
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty()),
        email: req
            .email
            .map(|e| normalize_email(&e))
            .filter(|e| !e.is_empty()),
        password: req.password.filter(|p| !p.is_empty()),
    };
    let mut violations = Vec::new();
    if let Some(username) = &patch.username {
        check_username(username, &mut violations);
    }
    if let Some(email) = &patch.email {
        check_email(email, &mut violations);
    }
    if let Some(password) = &patch.password {
        check_password(password, &mut violations);
    }
    finish(patch, violations)
}

/// Login only checks presence; wrong formats fall through to "invalid credentials".
pub fn validate_login(email: &str, password: &str) -> Result<String, AppError> {
    let email = normalize_email(email);
    let mut violations = Vec::new();
    if email.is_empty() {
        violations.push(FieldViolation::new("email", "is required"));
    }
    if password.is_empty() {
        violations.push(FieldViolation::new("password", "is required"));
    }
    finish(email, violations)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create(username: &str, email: &str, password: &str) -> CreateUserRequest {
        CreateUserRequest {
            username: username.into(),
            email: email.into(),
            password: password.into(),
        }
    }

    fn fields(err: AppError) -> Vec<&'static str> {
        match err {
            AppError::Validation(v) => v.into_iter().map(|f| f.field).collect(),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn accepts_valid_create_and_normalizes_email() {
        let input = validate_create(create(" johndoe ", " John@Example.com", "securepassword"))
            .expect("valid input");
        assert_eq!(input.username, "johndoe");
        assert_eq!(input.email, "john@example.com");
        assert_eq!(input.password, "securepassword");
    }

    #[test]
    fn reports_every_bad_field() {
        let err = validate_create(create("jo", "not-an-email", "short")).unwrap_err();
        assert_eq!(fields(err), vec!["username", "email", "password"]);
    }

    #[test]
    fn username_bounds_count_characters() {
        assert!(validate_create(create("abc", "a@b.co", "123456")).is_ok());
        assert!(validate_create(create(&"x".repeat(50), "a@b.co", "123456")).is_ok());
        assert!(validate_create(create(&"x".repeat(51), "a@b.co", "123456")).is_err());
        assert!(validate_create(create("äöü", "a@b.co", "123456")).is_ok());
    }

    #[test]
    fn password_minimum_counts_characters() {
        // three characters, six bytes
        let err = validate_create(create("johndoe", "a@b.co", "äöü")).unwrap_err();
        assert_eq!(fields(err), vec!["password"]);
        assert!(validate_create(create("johndoe", "a@b.co", "äöüäöü")).is_ok());
    }

    #[test]
    fn update_ignores_empty_fields() {
        let patch = validate_update(UpdateUserRequest {
            username: Some("".into()),
            email: None,
            password: Some("".into()),
        })
        .unwrap();
        assert!(patch.username.is_none());
        assert!(patch.email.is_none());
        assert!(patch.password.is_none());
    }

    #[test]
    fn update_checks_present_fields() {
        let err = validate_update(UpdateUserRequest {
            username: None,
            email: Some("nope".into()),
            password: Some("123".into()),
        })
        .unwrap_err();
        assert_eq!(fields(err), vec!["email", "password"]);
    }

    #[test]
    fn login_requires_both_fields() {
        assert_eq!(fields(validate_login("", "").unwrap_err()), vec!["email", "password"]);
        assert_eq!(validate_login(" A@B.io ", "x").unwrap(), "a@b.io");
    }
}
