//! Derived status of a to-do item.
//!
//! Status is never stored. It is computed from the completion flag, the due
//! date and a reference instant supplied by the caller.

use serde::{Deserialize, Serialize};

use super::todo::Timestamp;

/// Status of an item as seen at a particular instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DerivedStatus {
    /// Open and not past its due date.
    Pending,
    /// Marked as completed.
    Completed,
    /// Open and its due date is strictly before the reference instant.
    Overdue,
}

impl DerivedStatus {
    /// Returns the wire name of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Overdue => "overdue",
        }
    }
}

impl std::fmt::Display for DerivedStatus {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Computes the status of an item at `now`.
///
/// Completion wins over everything else. An open item is overdue only when
/// its due date is strictly earlier than `now`.
///
/// # Examples
///
/// ```
/// use todo_service::domain::{DerivedStatus, Timestamp, derive_status};
///
/// let now = Timestamp::now();
/// assert_eq!(derive_status(true, Some(now), now), DerivedStatus::Completed);
/// assert_eq!(derive_status(false, Some(now), now), DerivedStatus::Pending);
/// assert_eq!(derive_status(false, None, now), DerivedStatus::Pending);
/// ```
#[must_use]
pub fn derive_status(completed: bool, due_date: Option<Timestamp>, now: Timestamp) -> DerivedStatus {
    if completed {
        return DerivedStatus::Completed;
    }
    match due_date {
        Some(due) if due < now => DerivedStatus::Overdue,
        _ => DerivedStatus::Pending,
    }
}
