use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use super::dates;

/// Ordered `Low < Medium < High`, matching the Postgres enum.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "task_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl std::str::FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(format!("unknown priority `{other}`, expected low, medium or high")),
        }
    }
}

/// Task record in the database.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    #[serde(with = "dates::option")]
    pub due_date: Option<Date>,
    pub priority: Priority,
    pub is_completed: bool,
    pub is_important: bool,
    pub owner_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Fields needed to insert a task; flags start cleared.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<Date>,
    pub priority: Priority,
    pub owner_id: Uuid,
}

/// Editable columns to overwrite. `None` leaves a column untouched;
/// `Some(None)` clears a nullable one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub due_date: Option<Option<Date>>,
    pub priority: Option<Priority>,
    pub is_completed: Option<bool>,
}

/// Public part of a task's owner, shown in listings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskOwner {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskWithOwner {
    #[serde(flatten)]
    pub task: Task,
    pub owner: TaskOwner,
}

/// Row shape of the listing join.
#[derive(Debug, FromRow)]
pub(crate) struct TaskListRow {
    #[sqlx(flatten)]
    pub task: Task,
    pub owner_name: String,
    pub owner_email: String,
}

impl From<TaskListRow> for TaskWithOwner {
    fn from(row: TaskListRow) -> Self {
        let owner = TaskOwner {
            id: row.task.owner_id,
            name: row.owner_name,
            email: row.owner_email,
        };
        Self {
            task: row.task,
            owner,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub priority: Option<Priority>,
    pub is_completed: Option<bool>,
    pub is_important: Option<bool>,
}

#[cfg(test)]
impl TaskFilter {
    pub fn matches(&self, task: &Task) -> bool {
        self.priority.map_or(true, |p| task.priority == p)
            && self.is_completed.map_or(true, |c| task.is_completed == c)
            && self.is_important.map_or(true, |i| task.is_important == i)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortBy {
    /// Earliest due first; undated tasks last.
    DueDate,
    /// High before low.
    Priority,
    /// Newest first.
    CreatedAt,
    /// Most recently touched first.
    #[default]
    UpdatedAt,
}

impl SortBy {
    /// Unknown selectors fall back to the default ordering.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("dueDate") => SortBy::DueDate,
            Some("priority") => SortBy::Priority,
            Some("createdAt") => SortBy::CreatedAt,
            _ => SortBy::UpdatedAt,
        }
    }

    pub(crate) fn order_by_sql(self) -> &'static str {
        match self {
            SortBy::DueDate => " ORDER BY t.due_date ASC NULLS LAST, t.id",
            SortBy::Priority => " ORDER BY t.priority DESC, t.id",
            SortBy::CreatedAt => " ORDER BY t.created_at DESC, t.id",
            SortBy::UpdatedAt => " ORDER BY t.updated_at DESC, t.id",
        }
    }

    /// Same ordering as [`SortBy::order_by_sql`], for the in-memory store.
    #[cfg(test)]
    pub fn compare(self, a: &Task, b: &Task) -> std::cmp::Ordering {
        use std::cmp::Ordering;
        let primary = match self {
            SortBy::DueDate => match (a.due_date, b.due_date) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
            SortBy::Priority => b.priority.cmp(&a.priority),
            SortBy::CreatedAt => b.created_at.cmp(&a.created_at),
            SortBy::UpdatedAt => b.updated_at.cmp(&a.updated_at),
        };
        primary.then_with(|| a.id.cmp(&b.id))
    }
}
