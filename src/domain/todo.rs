//! To-do item domain model.
//!
//! Items are plain values. Builders and `apply` return new values instead of
//! mutating in place, so the same update logic runs unchanged against every
//! storage backend.

use std::num::ParseIntError;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::status::{DerivedStatus, derive_status};
use super::user::UserId;

/// Maximum length of a to-do title, in characters.
pub const TITLE_MAX_LENGTH: usize = 100;

// =============================================================================
// Value Objects - Newtypes
// =============================================================================

/// Unique identifier for a to-do item, assigned by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TodoId(i64);

impl TodoId {
    /// Creates a `TodoId` from a raw store identifier.
    #[must_use]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the raw identifier.
    #[must_use]
    pub const fn value(self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for TodoId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

impl FromStr for TodoId {
    type Err = ParseIntError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        value.parse().map(Self)
    }
}

/// A timestamp wrapper for `DateTime<Utc>`.
///
/// This provides a consistent timestamp type throughout the domain model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Creates a `Timestamp` from a `DateTime<Utc>`.
    #[must_use]
    pub const fn from_datetime(datetime: DateTime<Utc>) -> Self {
        Self(datetime)
    }

    /// Returns the inner `DateTime<Utc>`.
    #[must_use]
    pub const fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Returns the current time as a `Timestamp`.
    ///
    /// **Note**: This is an impure function (side effect: system clock).
    /// Request handlers call it once and pass the value down, so every record
    /// in one response is classified against the same instant.
    #[must_use]
    pub fn now() -> Self {
        Self(Utc::now())
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0.to_rfc3339())
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(datetime: DateTime<Utc>) -> Self {
        Self(datetime)
    }
}

// =============================================================================
// Priority
// =============================================================================

/// The priority level of a to-do item.
///
/// Serialized as its numeric value (`1`, `2`, `3`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Priority {
    /// Low priority (value: 1).
    #[default]
    Low,
    /// Medium priority (value: 2).
    Medium,
    /// High priority (value: 3).
    High,
}

impl Priority {
    /// Returns the numeric value of the priority.
    #[must_use]
    pub const fn value(self) -> u8 {
        match self {
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
        }
    }

    /// Looks up a priority by its numeric value.
    #[must_use]
    pub const fn from_value(value: i64) -> Option<Self> {
        match value {
            1 => Some(Self::Low),
            2 => Some(Self::Medium),
            3 => Some(Self::High),
            _ => None,
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(formatter, "Low"),
            Self::Medium => write!(formatter, "Medium"),
            Self::High => write!(formatter, "High"),
        }
    }
}

impl PartialOrd for Priority {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Priority {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.value().cmp(&other.value())
    }
}

/// Error returned when a numeric value is not a known priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("\"{0}\" is not a valid choice.")]
pub struct InvalidPriority(pub i64);

impl TryFrom<u8> for Priority {
    type Error = InvalidPriority;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_value(i64::from(value)).ok_or(InvalidPriority(i64::from(value)))
    }
}

impl TryFrom<i16> for Priority {
    type Error = InvalidPriority;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        Self::from_value(i64::from(value)).ok_or(InvalidPriority(i64::from(value)))
    }
}

impl From<Priority> for u8 {
    fn from(priority: Priority) -> Self {
        priority.value()
    }
}

// =============================================================================
// Todo
// =============================================================================

/// A to-do item.
///
/// `owner` is bound when the item is stored and no operation changes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Todo {
    /// Store-assigned identifier.
    pub id: TodoId,
    /// The user this item belongs to.
    pub owner: UserId,
    /// Short title (at most [`TITLE_MAX_LENGTH`] characters).
    pub title: String,
    /// Free-form description; empty when not provided.
    pub description: String,
    /// Whether the item has been completed.
    pub completed: bool,
    /// Priority level.
    pub priority: Priority,
    /// Optional due date.
    pub due_date: Option<Timestamp>,
    /// Timestamp when the item was created.
    pub created_at: Timestamp,
    /// Timestamp when the item was last modified.
    pub updated_at: Timestamp,
}

impl Todo {
    /// Returns the derived status of this item at `now`.
    #[must_use]
    pub fn status_at(&self, now: Timestamp) -> DerivedStatus {
        derive_status(self.completed, self.due_date, now)
    }

    /// Returns a new item with `changes` applied and `updated_at` set to `timestamp`.
    ///
    /// Identifier, owner and creation time are never touched.
    #[must_use]
    pub fn apply(self, changes: TodoChanges, timestamp: Timestamp) -> Self {
        Self {
            title: changes.title.unwrap_or(self.title),
            description: changes.description.unwrap_or(self.description),
            completed: changes.completed.unwrap_or(self.completed),
            priority: changes.priority.unwrap_or(self.priority),
            due_date: changes.due_date.unwrap_or(self.due_date),
            updated_at: timestamp,
            ..self
        }
    }
}

// =============================================================================
// NewTodo
// =============================================================================

/// Validated data for an item that has not been stored yet.
///
/// # Examples
///
/// ```
/// use todo_service::domain::{NewTodo, Priority};
///
/// let draft = NewTodo::new("Buy milk").with_priority(Priority::High);
/// assert!(!draft.completed);
/// assert_eq!(draft.description, "");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTodo {
    /// Title of the item.
    pub title: String,
    /// Description (empty by default).
    pub description: String,
    /// Completion flag (false by default).
    pub completed: bool,
    /// Priority (Low by default).
    pub priority: Priority,
    /// Optional due date.
    pub due_date: Option<Timestamp>,
}

impl NewTodo {
    /// Creates a draft with the given title and default values for everything else.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            completed: false,
            priority: Priority::Low,
            due_date: None,
        }
    }

    /// Returns a new draft with the given description.
    #[must_use]
    pub fn with_description(self, description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ..self
        }
    }

    /// Returns a new draft with the given completion flag.
    #[must_use]
    pub fn with_completed(self, completed: bool) -> Self {
        Self { completed, ..self }
    }

    /// Returns a new draft with the given priority.
    #[must_use]
    pub fn with_priority(self, priority: Priority) -> Self {
        Self { priority, ..self }
    }

    /// Returns a new draft with the given due date.
    #[must_use]
    pub fn with_due_date(self, due_date: Option<Timestamp>) -> Self {
        Self { due_date, ..self }
    }

    /// Builds the stored item from this draft.
    ///
    /// Both timestamps are set to `timestamp`.
    #[must_use]
    pub fn into_todo(self, id: TodoId, owner: UserId, timestamp: Timestamp) -> Todo {
        Todo {
            id,
            owner,
            title: self.title,
            description: self.description,
            completed: self.completed,
            priority: self.priority,
            due_date: self.due_date,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }
}

// =============================================================================
// TodoChanges
// =============================================================================

/// A set of field changes for an existing item.
///
/// `None` leaves a field untouched. For `due_date`, `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoChanges {
    /// New title.
    pub title: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New completion flag.
    pub completed: Option<bool>,
    /// New priority.
    pub priority: Option<Priority>,
    /// New due date, or `Some(None)` to clear it.
    pub due_date: Option<Option<Timestamp>>,
}

impl TodoChanges {
    /// Changes that overwrite every mutable field with the values of `draft`.
    #[must_use]
    pub fn replacing_with(draft: NewTodo) -> Self {
        Self {
            title: Some(draft.title),
            description: Some(draft.description),
            completed: Some(draft.completed),
            priority: Some(draft.priority),
            due_date: Some(draft.due_date),
        }
    }

    /// Returns `true` if no field would change.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.completed.is_none()
            && self.priority.is_none()
            && self.due_date.is_none()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn timestamp(seconds: i64) -> Timestamp {
        Timestamp::from_datetime(DateTime::from_timestamp(seconds, 0).unwrap())
    }

    fn stored(draft: NewTodo) -> Todo {
        draft.into_todo(TodoId::new(7), UserId::new(1), timestamp(1_000))
    }

    // -------------------------------------------------------------------------
    // TodoId Tests
    // -------------------------------------------------------------------------

    #[rstest]
    #[case("42", Some(42))]
    #[case("-3", Some(-3))]
    #[case("abc", None)]
    #[case("", None)]
    #[case("1.5", None)]
    fn test_todo_id_from_str(#[case] input: &str, #[case] expected: Option<i64>) {
        let parsed = input.parse::<TodoId>().ok().map(TodoId::value);
        assert_eq!(parsed, expected);
    }

    // -------------------------------------------------------------------------
    // Priority Tests
    // -------------------------------------------------------------------------

    #[rstest]
    #[case(1, Some(Priority::Low))]
    #[case(2, Some(Priority::Medium))]
    #[case(3, Some(Priority::High))]
    #[case(0, None)]
    #[case(4, None)]
    #[case(-1, None)]
    fn test_priority_from_value(#[case] value: i64, #[case] expected: Option<Priority>) {
        assert_eq!(Priority::from_value(value), expected);
    }

    #[rstest]
    fn test_priority_default_is_low() {
        assert_eq!(Priority::default(), Priority::Low);
    }

    #[rstest]
    fn test_priority_ordering_follows_value() {
        assert!(Priority::Low < Priority::Medium);
        assert!(Priority::Medium < Priority::High);
    }

    #[rstest]
    fn test_priority_serializes_as_integer() {
        assert_eq!(serde_json::to_string(&Priority::High).unwrap(), "3");
        let parsed: Priority = serde_json::from_str("2").unwrap();
        assert_eq!(parsed, Priority::Medium);
        assert!(serde_json::from_str::<Priority>("9").is_err());
    }

    #[rstest]
    fn test_invalid_priority_message() {
        assert_eq!(
            InvalidPriority(5).to_string(),
            "\"5\" is not a valid choice."
        );
    }

    // -------------------------------------------------------------------------
    // NewTodo Tests
    // -------------------------------------------------------------------------

    #[rstest]
    fn test_new_todo_defaults() {
        let todo = stored(NewTodo::new("Write report"));

        assert_eq!(todo.title, "Write report");
        assert_eq!(todo.description, "");
        assert!(!todo.completed);
        assert_eq!(todo.priority, Priority::Low);
        assert!(todo.due_date.is_none());
        assert_eq!(todo.created_at, todo.updated_at);
        assert_eq!(todo.owner, UserId::new(1));
    }

    #[rstest]
    fn test_new_todo_builders() {
        let due = timestamp(5_000);
        let todo = stored(
            NewTodo::new("Ship")
                .with_description("release 1.0")
                .with_completed(true)
                .with_priority(Priority::High)
                .with_due_date(Some(due)),
        );

        assert_eq!(todo.description, "release 1.0");
        assert!(todo.completed);
        assert_eq!(todo.priority, Priority::High);
        assert_eq!(todo.due_date, Some(due));
    }

    // -------------------------------------------------------------------------
    // Apply Tests
    // -------------------------------------------------------------------------

    #[rstest]
    fn test_apply_title_only_keeps_other_fields() {
        let due = timestamp(9_000);
        let original = stored(
            NewTodo::new("Old")
                .with_priority(Priority::Medium)
                .with_due_date(Some(due)),
        );
        let later = timestamp(2_000);

        let changes = TodoChanges {
            title: Some("New".to_string()),
            ..TodoChanges::default()
        };
        let updated = original.clone().apply(changes, later);

        assert_eq!(updated.title, "New");
        assert_eq!(updated.completed, original.completed);
        assert_eq!(updated.priority, original.priority);
        assert_eq!(updated.due_date, original.due_date);
        assert_eq!(updated.created_at, original.created_at);
        assert_eq!(updated.updated_at, later);
        assert_eq!(updated.id, original.id);
        assert_eq!(updated.owner, original.owner);
    }

    #[rstest]
    fn test_apply_clears_due_date() {
        let original = stored(NewTodo::new("Task").with_due_date(Some(timestamp(9_000))));
        let changes = TodoChanges {
            due_date: Some(None),
            ..TodoChanges::default()
        };

        let updated = original.apply(changes, timestamp(2_000));

        assert!(updated.due_date.is_none());
    }

    #[rstest]
    fn test_replacing_with_resets_omitted_fields() {
        let original = stored(
            NewTodo::new("Task")
                .with_description("details")
                .with_priority(Priority::High)
                .with_due_date(Some(timestamp(9_000))),
        );

        let changes = TodoChanges::replacing_with(NewTodo::new("Replaced"));
        let updated = original.apply(changes, timestamp(2_000));

        assert_eq!(updated.title, "Replaced");
        assert_eq!(updated.description, "");
        assert_eq!(updated.priority, Priority::Low);
        assert!(updated.due_date.is_none());
    }

    #[rstest]
    fn test_todo_changes_is_empty() {
        assert!(TodoChanges::default().is_empty());
        assert!(
            !TodoChanges {
                completed: Some(true),
                ..TodoChanges::default()
            }
            .is_empty()
        );
    }

    #[rstest]
    fn test_status_at_overdue_until_completed() {
        let now = timestamp(10_000);
        let todo = stored(NewTodo::new("Late").with_due_date(Some(timestamp(9_999))));

        assert_eq!(todo.status_at(now), DerivedStatus::Overdue);

        let done = todo.apply(
            TodoChanges {
                completed: Some(true),
                ..TodoChanges::default()
            },
            now,
        );
        assert_eq!(done.status_at(now), DerivedStatus::Completed);
    }
}
