use tracing::info;
use uuid::Uuid;

use crate::{
    auth::claims::Identity,
    error::AppError,
    tasks::{
        dto::{CreateTaskRequest, ListTasksQuery, UpdateTaskRequest},
        policy::{authorize, Action},
        repo::TaskRepo,
        repo_types::{NewTask, Task, TaskPatch, TaskWithOwner},
    },
};

fn not_found() -> AppError {
    AppError::NotFound("Task not found".into())
}

fn clean_optional(text: Option<String>) -> Option<String> {
    text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())
}

fn clean_title(title: &str) -> Result<String, AppError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(AppError::Validation("Title is required".into()));
    }
    Ok(title.to_string())
}

/// Existence first, then policy: a missing id is a 404 for everyone.
async fn load_authorized(
    repo: &dyn TaskRepo,
    actor: &Identity,
    id: Uuid,
    action: Action,
) -> Result<Task, AppError> {
    let task = repo.find_by_id(id).await?.ok_or_else(not_found)?;
    authorize(actor, task.owner_id, action)?;
    Ok(task)
}

pub async fn create_task(
    repo: &dyn TaskRepo,
    actor: &Identity,
    req: CreateTaskRequest,
) -> Result<Task, AppError> {
    let title = clean_title(&req.title)?;
    authorize(actor, actor.id, Action::CreateOwn)?;

    let task = repo
        .insert(NewTask {
            title,
            description: clean_optional(req.description),
            due_date: req.due_date,
            priority: req.priority.unwrap_or_default(),
            owner_id: actor.id,
        })
        .await?;

    info!(task_id = %task.id, owner = %actor.id, "task created");
    Ok(task)
}

/// Lists every user's tasks; not scoped to the caller.
pub async fn list_tasks(
    repo: &dyn TaskRepo,
    actor: &Identity,
    query: &ListTasksQuery,
) -> Result<Vec<TaskWithOwner>, AppError> {
    authorize(actor, actor.id, Action::Read)?;
    Ok(repo.list(query.filter(), query.sort()).await?)
}

pub async fn update_task(
    repo: &dyn TaskRepo,
    actor: &Identity,
    id: Uuid,
    req: UpdateTaskRequest,
) -> Result<Task, AppError> {
    let patch = TaskPatch {
        title: req.title.as_deref().map(clean_title).transpose()?,
        description: req.description.map(clean_optional),
        due_date: req.due_date,
        priority: req.priority,
        is_completed: req.is_completed,
    };

    load_authorized(repo, actor, id, Action::UpdateOwn).await?;
    let task = repo.update(id, patch).await?.ok_or_else(not_found)?;
    info!(task_id = %task.id, actor = %actor.id, "task updated");
    Ok(task)
}

pub async fn toggle_completed(
    repo: &dyn TaskRepo,
    actor: &Identity,
    id: Uuid,
) -> Result<Task, AppError> {
    load_authorized(repo, actor, id, Action::ToggleComplete).await?;
    let task = repo.toggle_completed(id).await?.ok_or_else(not_found)?;
    info!(task_id = %task.id, actor = %actor.id, completed = task.is_completed, "task completion toggled");
    Ok(task)
}

pub async fn toggle_important(
    repo: &dyn TaskRepo,
    actor: &Identity,
    id: Uuid,
) -> Result<Task, AppError> {
    load_authorized(repo, actor, id, Action::ToggleImportant).await?;
    let task = repo.toggle_important(id).await?.ok_or_else(not_found)?;
    info!(task_id = %task.id, actor = %actor.id, important = task.is_important, "task importance toggled");
    Ok(task)
}

pub async fn delete_task(repo: &dyn TaskRepo, actor: &Identity, id: Uuid) -> Result<(), AppError> {
    load_authorized(repo, actor, id, Action::Delete).await?;
    if !repo.delete(id).await? {
        return Err(not_found());
    }
    info!(task_id = %id, actor = %actor.id, "task deleted");
    Ok(())
}
