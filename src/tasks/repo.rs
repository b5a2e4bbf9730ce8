use anyhow::Context;
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::tasks::repo_types::{
    NewTask, SortBy, Task, TaskFilter, TaskListRow, TaskPatch, TaskWithOwner,
};

const TASK_COLUMNS: &str = "id, title, description, due_date, priority, is_completed, \
                            is_important, owner_id, created_at, updated_at";

/// Task persistence. Every mutation touches a single row; methods keyed by
/// id return `None` when the row does not exist.
#[async_trait]
pub trait TaskRepo: Send + Sync {
    async fn insert(&self, task: NewTask) -> anyhow::Result<Task>;

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Task>>;

    async fn list(&self, filter: TaskFilter, sort: SortBy) -> anyhow::Result<Vec<TaskWithOwner>>;

    /// Writes only the columns set in `patch` and bumps `updated_at`.
    async fn update(&self, id: Uuid, patch: TaskPatch) -> anyhow::Result<Option<Task>>;

    async fn toggle_completed(&self, id: Uuid) -> anyhow::Result<Option<Task>>;

    async fn toggle_important(&self, id: Uuid) -> anyhow::Result<Option<Task>>;

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool>;
}

fn list_query(filter: TaskFilter, sort: SortBy) -> QueryBuilder<'static, Postgres> {
    let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
        "SELECT t.id, t.title, t.description, t.due_date, t.priority, t.is_completed, \
         t.is_important, t.owner_id, t.created_at, t.updated_at, \
         u.name AS owner_name, u.email AS owner_email \
         FROM tasks t JOIN users u ON u.id = t.owner_id WHERE TRUE",
    );
    if let Some(priority) = filter.priority {
        qb.push(" AND t.priority = ").push_bind(priority);
    }
    if let Some(done) = filter.is_completed {
        qb.push(" AND t.is_completed = ").push_bind(done);
    }
    if let Some(important) = filter.is_important {
        qb.push(" AND t.is_important = ").push_bind(important);
    }
    qb.push(sort.order_by_sql());
    qb
}

/// Single-statement update; columns absent from the patch keep whatever
/// value the row holds when the statement runs.
fn update_query(id: Uuid, patch: TaskPatch) -> QueryBuilder<'static, Postgres> {
    let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE tasks SET ");
    {
        let mut set = qb.separated(", ");
        if let Some(title) = patch.title {
            set.push("title = ").push_bind_unseparated(title);
        }
        if let Some(description) = patch.description {
            set.push("description = ").push_bind_unseparated(description);
        }
        if let Some(due_date) = patch.due_date {
            set.push("due_date = ").push_bind_unseparated(due_date);
        }
        if let Some(priority) = patch.priority {
            set.push("priority = ").push_bind_unseparated(priority);
        }
        if let Some(done) = patch.is_completed {
            set.push("is_completed = ").push_bind_unseparated(done);
        }
        set.push("updated_at = now()");
    }
    qb.push(" WHERE id = ").push_bind(id);
    qb.push(" RETURNING ").push(TASK_COLUMNS);
    qb
}

#[derive(Clone)]
pub struct PgTaskRepo {
    db: PgPool,
}

impl PgTaskRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TaskRepo for PgTaskRepo {
    async fn insert(&self, task: NewTask) -> anyhow::Result<Task> {
        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            INSERT INTO tasks (title, description, due_date, priority, owner_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {TASK_COLUMNS}
            "#
        ))
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.due_date)
        .bind(task.priority)
        .bind(task.owner_id)
        .fetch_one(&self.db)
        .await
        .context("insert task")?;
        Ok(task)
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Task>> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find task by id")?;
        Ok(task)
    }

    async fn list(&self, filter: TaskFilter, sort: SortBy) -> anyhow::Result<Vec<TaskWithOwner>> {
        let rows = list_query(filter, sort)
            .build_query_as::<TaskListRow>()
            .fetch_all(&self.db)
            .await
            .context("list tasks")?;
        Ok(rows.into_iter().map(TaskWithOwner::from).collect())
    }

    async fn update(&self, id: Uuid, patch: TaskPatch) -> anyhow::Result<Option<Task>> {
        let task = update_query(id, patch)
            .build_query_as::<Task>()
            .fetch_optional(&self.db)
            .await
            .context("update task")?;
        Ok(task)
    }

    async fn toggle_completed(&self, id: Uuid) -> anyhow::Result<Option<Task>> {
        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            UPDATE tasks SET is_completed = NOT is_completed, updated_at = now()
             WHERE id = $1
            RETURNING {TASK_COLUMNS}
            "#
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("toggle task completed")?;
        Ok(task)
    }

    async fn toggle_important(&self, id: Uuid) -> anyhow::Result<Option<Task>> {
        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            UPDATE tasks SET is_important = NOT is_important, updated_at = now()
             WHERE id = $1
            RETURNING {TASK_COLUMNS}
            "#
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("toggle task important")?;
        Ok(task)
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await
            .context("delete task")?;
        Ok(result.rows_affected() > 0)
    }
}
