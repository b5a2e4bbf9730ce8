use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use time::Date;

use super::dates;
use super::repo_types::{Priority, SortBy, Task, TaskFilter};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    #[serde(default)]
    pub title: String,
    pub description: Option<String>,
    #[serde(default, with = "dates::option")]
    pub due_date: Option<Date>,
    pub priority: Option<Priority>,
}

/// Partial update. Absent fields are left alone; `null` clears the
/// optional ones. Flags other than completion and the owner are not
/// editable here.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "nullable_string")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "dates::nullable")]
    pub due_date: Option<Option<Date>>,
    pub priority: Option<Priority>,
    pub is_completed: Option<bool>,
}

fn nullable_string<'de, D>(d: D) -> Result<Option<Option<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<String>::deserialize(d).map(Some)
}

/// Query-string filters. An empty value (`?priority=`) means no filter.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTasksQuery {
    #[serde(default, deserialize_with = "blank_as_none")]
    pub priority: Option<Priority>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub is_completed: Option<bool>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub is_important: Option<bool>,
    pub sort_by: Option<String>,
}

fn blank_as_none<'de, D, T>(d: D) -> Result<Option<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: FromStr,
    T::Err: fmt::Display,
{
    match Option::<String>::deserialize(d)? {
        Some(raw) if !raw.trim().is_empty() => {
            raw.trim().parse().map(Some).map_err(serde::de::Error::custom)
        }
        _ => Ok(None),
    }
}

impl ListTasksQuery {
    pub fn filter(&self) -> TaskFilter {
        TaskFilter {
            priority: self.priority,
            is_completed: self.is_completed,
            is_important: self.is_important,
        }
    }

    pub fn sort(&self) -> SortBy {
        SortBy::parse(self.sort_by.as_deref())
    }
}

#[derive(Debug, Serialize)]
pub struct TaskResponse {
    pub message: String,
    pub task: Task,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_request_distinguishes_clear_from_absent() {
        let req: UpdateTaskRequest =
            serde_json::from_str(r#"{"description":null,"priority":"high"}"#).unwrap();
        assert_eq!(req.description, Some(None));
        assert_eq!(req.due_date, None);
        assert_eq!(req.priority, Some(Priority::High));
        assert_eq!(req.title, None);
    }

    #[test]
    fn update_request_ignores_protected_fields() {
        let req: UpdateTaskRequest =
            serde_json::from_str(r#"{"isImportant":true,"ownerId":"x","isCompleted":true}"#).unwrap();
        assert_eq!(req.is_completed, Some(true));
        assert!(req.title.is_none());
    }

    #[test]
    fn create_request_defaults() {
        let req: CreateTaskRequest = serde_json::from_str(r#"{"title":"T1"}"#).unwrap();
        assert_eq!(req.title, "T1");
        assert!(req.priority.is_none());
        assert!(req.due_date.is_none());
        assert!(serde_json::from_str::<CreateTaskRequest>(r#"{"title":"T","priority":"urgent"}"#).is_err());
    }

    #[test]
    fn list_query_builds_filter_and_sort() {
        let q = ListTasksQuery {
            priority: Some(Priority::Low),
            is_completed: Some(false),
            is_important: None,
            sort_by: Some("dueDate".into()),
        };
        assert_eq!(
            q.filter(),
            TaskFilter { priority: Some(Priority::Low), is_completed: Some(false), is_important: None }
        );
        assert_eq!(q.sort(), SortBy::DueDate);
        assert_eq!(ListTasksQuery::default().sort(), SortBy::UpdatedAt);
    }

    #[test]
    fn list_query_treats_blank_values_as_unset() {
        let q: ListTasksQuery = serde_json::from_str(
            r#"{"priority":"","isCompleted":" ","isImportant":"true","sortBy":""}"#,
        )
        .unwrap();
        assert_eq!(q.priority, None);
        assert_eq!(q.is_completed, None);
        assert_eq!(q.is_important, Some(true));
        assert_eq!(q.sort(), SortBy::UpdatedAt);

        let q: ListTasksQuery = serde_json::from_str(r#"{"priority":"high"}"#).unwrap();
        assert_eq!(q.priority, Some(Priority::High));

        assert!(serde_json::from_str::<ListTasksQuery>(r#"{"priority":"urgent"}"#).is_err());
        assert!(serde_json::from_str::<ListTasksQuery>(r#"{"isCompleted":"maybe"}"#).is_err());
    }
}
