//! List query model: status filter, search terms and ordering.
//!
//! These types are parsed from raw query-string values and evaluated purely
//! in memory. The `PostgreSQL` backend translates the same values into SQL,
//! and both must select and order identically.

use std::cmp::Ordering;

use super::status::DerivedStatus;
use super::todo::{Timestamp, Todo};

// =============================================================================
// StatusFilter
// =============================================================================

/// Status filter for item listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusFilter {
    /// `completed == true`.
    Completed,
    /// `completed == false`, regardless of due date.
    Pending,
    /// `completed == false` and due date strictly before now.
    Overdue,
}

impl StatusFilter {
    /// Parses a filter name. Matching is exact on the lowercase names;
    /// anything else yields `None` (no filtering).
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "completed" => Some(Self::Completed),
            "pending" => Some(Self::Pending),
            "overdue" => Some(Self::Overdue),
            _ => None,
        }
    }

    /// Returns `true` if `todo` passes this filter at `now`.
    #[must_use]
    pub fn matches(self, todo: &Todo, now: Timestamp) -> bool {
        match self {
            Self::Completed => todo.completed,
            Self::Pending => !todo.completed,
            Self::Overdue => todo.status_at(now) == DerivedStatus::Overdue,
        }
    }
}

// =============================================================================
// SearchTerms
// =============================================================================

/// Lowercased search terms; every term must occur in the title or description.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchTerms(Vec<String>);

impl SearchTerms {
    /// Splits `value` on whitespace and commas. Returns `None` when no term remains.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let terms: Vec<String> = value
            .split(|character: char| character.is_whitespace() || character == ',')
            .filter(|term| !term.is_empty())
            .map(str::to_lowercase)
            .collect();

        if terms.is_empty() { None } else { Some(Self(terms)) }
    }

    /// Returns the parsed terms, already lowercased.
    #[must_use]
    pub fn terms(&self) -> &[String] {
        &self.0
    }

    /// Returns `true` if every term occurs in the title or the description.
    #[must_use]
    pub fn matches(&self, todo: &Todo) -> bool {
        let title = todo.title.to_lowercase();
        let description = todo.description.to_lowercase();
        self.0
            .iter()
            .all(|term| title.contains(term.as_str()) || description.contains(term.as_str()))
    }
}

// =============================================================================
// Ordering
// =============================================================================

/// A field items may be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderingField {
    CreatedAt,
    DueDate,
    Priority,
}

impl OrderingField {
    /// Parses a field name.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "created_at" => Some(Self::CreatedAt),
            "due_date" => Some(Self::DueDate),
            "priority" => Some(Self::Priority),
            _ => None,
        }
    }

    /// Returns the SQL column backing this field.
    #[must_use]
    pub const fn column(self) -> &'static str {
        match self {
            Self::CreatedAt => "created_at",
            Self::DueDate => "due_date",
            Self::Priority => "priority",
        }
    }

    /// Ascending comparison. A missing due date sorts after every present one.
    fn compare_ascending(self, left: &Todo, right: &Todo) -> Ordering {
        match self {
            Self::CreatedAt => left.created_at.cmp(&right.created_at),
            Self::Priority => left.priority.cmp(&right.priority),
            Self::DueDate => match (left.due_date, right.due_date) {
                (Some(left), Some(right)) => left.cmp(&right),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
        }
    }
}

/// One ordering key with its direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OrderingTerm {
    pub field: OrderingField,
    pub descending: bool,
}

impl OrderingTerm {
    /// Parses `field` or `-field`.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        let (descending, name) = value
            .strip_prefix('-')
            .map_or((false, value), |rest| (true, rest));
        OrderingField::parse(name).map(|field| Self { field, descending })
    }

    #[must_use]
    pub fn compare(&self, left: &Todo, right: &Todo) -> Ordering {
        let ordering = self.field.compare_ascending(left, right);
        if self.descending {
            ordering.reverse()
        } else {
            ordering
        }
    }
}

/// Ordering for item listings.
///
/// The requested keys are always followed by `created_at` descending and then
/// `id` descending, so every ordering is total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoOrdering(Vec<OrderingTerm>);

impl Default for TodoOrdering {
    fn default() -> Self {
        Self(vec![OrderingTerm {
            field: OrderingField::CreatedAt,
            descending: true,
        }])
    }
}

impl TodoOrdering {
    /// Parses a comma-separated list of keys, dropping unknown ones.
    ///
    /// Falls back to the default ordering when nothing recognized remains.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        let terms: Vec<OrderingTerm> = value.split(',').filter_map(OrderingTerm::parse).collect();
        if terms.is_empty() {
            Self::default()
        } else {
            Self(terms)
        }
    }

    /// Returns the requested keys, without the implicit tie-break.
    #[must_use]
    pub fn terms(&self) -> &[OrderingTerm] {
        &self.0
    }

    /// Compares two items by the requested keys, then by the tie-break.
    #[must_use]
    pub fn compare(&self, left: &Todo, right: &Todo) -> Ordering {
        self.0
            .iter()
            .map(|term| term.compare(left, right))
            .find(|ordering| ordering.is_ne())
            .unwrap_or_else(|| {
                right
                    .created_at
                    .cmp(&left.created_at)
                    .then_with(|| right.id.cmp(&left.id))
            })
    }
}

// =============================================================================
// TodoQuery
// =============================================================================

/// A parsed list query.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TodoQuery {
    pub status: Option<StatusFilter>,
    pub search: Option<SearchTerms>,
    pub ordering: TodoOrdering,
}

impl TodoQuery {
    /// Builds a query from raw query-string values.
    ///
    /// Unrecognized values never fail; they simply apply no restriction.
    #[must_use]
    pub fn from_params(status: Option<&str>, search: Option<&str>, ordering: Option<&str>) -> Self {
        Self {
            status: status.and_then(StatusFilter::parse),
            search: search.and_then(SearchTerms::parse),
            ordering: ordering.map(TodoOrdering::parse).unwrap_or_default(),
        }
    }

    #[must_use]
    pub fn with_status(self, status: StatusFilter) -> Self {
        Self {
            status: Some(status),
            ..self
        }
    }

    /// Returns `true` if `todo` passes the status and search filters at `now`.
    #[must_use]
    pub fn matches(&self, todo: &Todo, now: Timestamp) -> bool {
        self.status.is_none_or(|status| status.matches(todo, now))
            && self.search.as_ref().is_none_or(|search| search.matches(todo))
    }

    /// Filters and orders `todos`. Ownership scoping is the caller's job.
    pub fn apply<'a, I>(&self, todos: I, now: Timestamp) -> Vec<Todo>
    where
        I: IntoIterator<Item = &'a Todo>,
    {
        let mut selected: Vec<Todo> = todos
            .into_iter()
            .filter(|todo| self.matches(todo, now))
            .cloned()
            .collect();
        selected.sort_by(|left, right| self.ordering.compare(left, right));
        selected
    }
}

// =============================================================================
// Tests
// =============================================================================
