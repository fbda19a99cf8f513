//! Per-owner item counts.

use serde::Serialize;

use super::status::DerivedStatus;
use super::todo::{Timestamp, Todo};

/// Counts over one owner's items, partitioned by derived status.
///
/// `total == completed + pending + overdue` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct TodoStatistics {
    pub total: u64,
    pub completed: u64,
    pub pending: u64,
    pub overdue: u64,
}

impl TodoStatistics {
    /// Builds statistics from raw counts, deriving `pending` as the remainder.
    #[must_use]
    pub const fn from_counts(total: u64, completed: u64, overdue: u64) -> Self {
        Self {
            total,
            completed,
            pending: total.saturating_sub(completed).saturating_sub(overdue),
            overdue,
        }
    }

    /// Counts `todos` by their status at `now`.
    pub fn tally<'a, I>(todos: I, now: Timestamp) -> Self
    where
        I: IntoIterator<Item = &'a Todo>,
    {
        todos
            .into_iter()
            .fold(Self::default(), |statistics, todo| statistics.record(todo.status_at(now)))
    }

    /// Returns new statistics with one more item of `status`.
    #[must_use]
    pub const fn record(self, status: DerivedStatus) -> Self {
        let total = self.total + 1;
        match status {
            DerivedStatus::Completed => Self {
                total,
                completed: self.completed + 1,
                ..self
            },
            DerivedStatus::Pending => Self {
                total,
                pending: self.pending + 1,
                ..self
            },
            DerivedStatus::Overdue => Self {
                total,
                overdue: self.overdue + 1,
                ..self
            },
        }
    }
}
