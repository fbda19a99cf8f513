//! Request validation.
//!
//! Validators are plain functions from request DTOs to domain values. Every
//! field is checked and all failures are reported together.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDateTime, Utc};
use regex::Regex;

use super::dto::{RegisterRequest, TodoRequest};
use super::error::ValidationError;
use crate::domain::{NewTodo, Priority, TITLE_MAX_LENGTH, Timestamp, TodoChanges};

pub const USERNAME_MAX_LENGTH: usize = 150;
pub const EMAIL_MAX_LENGTH: usize = 254;

const REQUIRED: &str = "This field is required.";
const NOT_NULL: &str = "This field may not be null.";
const NOT_BLANK: &str = "This field may not be blank.";
const INVALID_DATETIME: &str = "Datetime has wrong format. Use one of these formats instead: \
     YYYY-MM-DDThh:mm[:ss[.uuuuuu]][+HH:MM|-HH:MM|Z].";
const INVALID_USERNAME: &str = "Enter a valid username. This value may contain only letters, \
     numbers, and @/./+/-/_ characters.";
const INVALID_EMAIL: &str = "Enter a valid email address.";

fn too_long(limit: usize) -> String {
    format!("Ensure this field has no more than {limit} characters.")
}

// =============================================================================
// Field Validators
// =============================================================================

/// Validates a title: trimmed, non-empty, at most [`TITLE_MAX_LENGTH`] characters.
///
/// # Errors
///
/// Returns the field message when the title is blank or too long.
pub fn validate_title(title: &str) -> Result<String, String> {
    let title = title.trim();

    if title.is_empty() {
        return Err(NOT_BLANK.to_string());
    }
    if title.chars().count() > TITLE_MAX_LENGTH {
        return Err(too_long(TITLE_MAX_LENGTH));
    }

    Ok(title.to_string())
}

/// Validates a numeric priority.
///
/// # Errors
///
/// Returns `"N" is not a valid choice.` for values outside 1 to 3.
pub fn validate_priority(value: i64) -> Result<Priority, String> {
    Priority::from_value(value).ok_or_else(|| format!("\"{value}\" is not a valid choice."))
}

/// Parses a due date.
///
/// Accepts RFC 3339 and offset-less ISO 8601 date-times; the latter are read as UTC.
///
/// # Errors
///
/// Returns the field message when the text is not a recognized date-time.
pub fn validate_due_date(value: &str) -> Result<Timestamp, String> {
    let value = value.trim();

    if let Ok(datetime) = DateTime::parse_from_rfc3339(value) {
        return Ok(Timestamp::from_datetime(datetime.with_timezone(&Utc)));
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|naive| Timestamp::from_datetime(naive.and_utc()))
        .ok_or_else(|| INVALID_DATETIME.to_string())
}

/// Resolves a nullable, non-null field, recording an error for `null`.
fn non_null<'a, T>(
    field: &str,
    value: Option<&'a Option<T>>,
    errors: &mut ValidationError,
) -> Option<&'a T> {
    match value {
        Some(Some(value)) => Some(value),
        Some(None) => {
            errors.push(field, NOT_NULL);
            None
        }
        None => None,
    }
}

fn record<T>(field: &str, result: Result<T, String>, errors: &mut ValidationError) -> Option<T> {
    result.map_err(|message| errors.push(field, message)).ok()
}

// =============================================================================
// Todo Validators
// =============================================================================

/// Validates the fields of `request` into a set of changes.
///
/// With `title_required`, a missing title is an error.
fn validate_todo_fields(
    request: &TodoRequest,
    title_required: bool,
) -> Result<TodoChanges, ValidationError> {
    let mut errors = ValidationError::default();

    if title_required && request.title.is_none() {
        errors.push("title", REQUIRED);
    }
    let title = non_null("title", request.title.as_ref(), &mut errors)
        .and_then(|title| record("title", validate_title(title), &mut errors));

    let description = non_null("description", request.description.as_ref(), &mut errors)
        .map(|description| description.trim().to_string());

    let completed = non_null("completed", request.completed.as_ref(), &mut errors).copied();

    let priority = non_null("priority", request.priority.as_ref(), &mut errors)
        .and_then(|priority| record("priority", validate_priority(*priority), &mut errors));

    let due_date = match &request.due_date {
        Some(Some(text)) => record("due_date", validate_due_date(text), &mut errors).map(Some),
        Some(None) => Some(None),
        None => None,
    };

    errors.into_result(TodoChanges {
        title,
        description,
        completed,
        priority,
        due_date,
    })
}

/// Validates a create request. `title` is required; other fields take defaults.
///
/// # Errors
///
/// Returns every field error found.
pub fn validate_create_request(request: &TodoRequest) -> Result<NewTodo, ValidationError> {
    let changes = validate_todo_fields(request, true)?;

    let Some(title) = changes.title else {
        return Err(ValidationError::single("title", REQUIRED));
    };

    Ok(NewTodo::new(title)
        .with_description(changes.description.unwrap_or_default())
        .with_completed(changes.completed.unwrap_or(false))
        .with_priority(changes.priority.unwrap_or_default())
        .with_due_date(changes.due_date.flatten()))
}

/// Validates a full replacement. Omitted optional fields reset to their defaults.
///
/// # Errors
///
/// Returns every field error found.
pub fn validate_replace_request(request: &TodoRequest) -> Result<TodoChanges, ValidationError> {
    validate_create_request(request).map(TodoChanges::replacing_with)
}

/// Validates a partial update. Only supplied fields change.
///
/// # Errors
///
/// Returns every field error found.
pub fn validate_update_request(request: &TodoRequest) -> Result<TodoChanges, ValidationError> {
    validate_todo_fields(request, false)
}

// =============================================================================
// Registration Validators
// =============================================================================

/// A registration that passed validation; the password is still plain text.
#[derive(Clone, PartialEq, Eq)]
pub struct ValidatedRegistration {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for ValidatedRegistration {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("ValidatedRegistration")
            .field("username", &self.username)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Letters, digits and `@` `.` `+` `-` `_`.
static USERNAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w.@+-]+$").expect("Invalid username regex pattern"));

/// `local@domain.tld`: a local part without whitespace, then two or more
/// dot-separated labels that neither start nor end with `-`.
static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[^\s@]+@(?:[\p{L}\p{N}](?:[\p{L}\p{N}-]*[\p{L}\p{N}])?\.)+[\p{L}\p{N}](?:[\p{L}\p{N}-]*[\p{L}\p{N}])?$",
    )
    .expect("Invalid email regex pattern")
});

/// Validates a username.
///
/// # Errors
///
/// Returns the field message when the username is blank, too long, or has disallowed characters.
pub fn validate_username(username: &str) -> Result<String, String> {
    if username.trim().is_empty() {
        return Err(NOT_BLANK.to_string());
    }
    if username.chars().count() > USERNAME_MAX_LENGTH {
        return Err(too_long(USERNAME_MAX_LENGTH));
    }
    if !USERNAME_PATTERN.is_match(username) {
        return Err(INVALID_USERNAME.to_string());
    }
    Ok(username.to_string())
}

/// Validates an optional email. Empty means "not provided".
///
/// # Errors
///
/// Returns the field message when the address is too long or not `local@domain.tld`.
pub fn validate_email(email: &str) -> Result<String, String> {
    let email = email.trim();
    if email.is_empty() {
        return Ok(String::new());
    }
    if email.chars().count() > EMAIL_MAX_LENGTH {
        return Err(too_long(EMAIL_MAX_LENGTH));
    }
    if !EMAIL_PATTERN.is_match(email) {
        return Err(INVALID_EMAIL.to_string());
    }
    Ok(email.to_string())
}

/// Validates a registration request.
///
/// # Errors
///
/// Returns every field error found.
pub fn validate_registration(
    request: &RegisterRequest,
) -> Result<ValidatedRegistration, ValidationError> {
    let mut errors = ValidationError::default();

    let username = match &request.username {
        Some(username) => record("username", validate_username(username), &mut errors),
        None => {
            errors.push("username", REQUIRED);
            None
        }
    };

    let password = match &request.password {
        Some(password) if password.trim().is_empty() => {
            errors.push("password", NOT_BLANK);
            None
        }
        Some(password) => Some(password.clone()),
        None => {
            errors.push("password", REQUIRED);
            None
        }
    };

    let email = request
        .email
        .as_deref()
        .map_or(Some(String::new()), |email| {
            record("email", validate_email(email), &mut errors)
        });

    match (username, password, email) {
        (Some(username), Some(password), Some(email)) if errors.is_empty() => {
            Ok(ValidatedRegistration {
                username,
                email,
                password,
            })
        }
        _ => Err(errors),
    }
}

// =============================================================================
// Tests
// =============================================================================
