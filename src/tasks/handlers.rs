use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    auth::extractors::AuthUser,
    error::AppError,
    extract::{ApiJson, ApiPath, ApiQuery},
    state::AppState,
};

use super::dto::{
    CreateTaskRequest, ListTasksQuery, MessageResponse, TaskResponse, UpdateTaskRequest,
};
use super::repo_types::TaskWithOwner;
use super::services;

pub fn task_routes() -> Router<AppState> {
    Router::new()
        .route("/tasks", get(list_tasks).post(create_task))
        .route("/tasks/:id", put(update_task).delete(delete_task))
        .route("/tasks/:id/completed", put(mark_completed))
        .route("/tasks/:id/important", put(mark_important))
}

#[instrument(skip(state, body))]
pub async fn create_task(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    ApiJson(body): ApiJson<CreateTaskRequest>,
) -> Result<(StatusCode, Json<TaskResponse>), AppError> {
    let task = services::create_task(state.tasks.as_ref(), &identity, body).await?;
    Ok((
        StatusCode::CREATED,
        Json(TaskResponse {
            message: "Task created successfully".into(),
            task,
        }),
    ))
}

#[instrument(skip(state))]
pub async fn list_tasks(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    ApiQuery(query): ApiQuery<ListTasksQuery>,
) -> Result<Json<Vec<TaskWithOwner>>, AppError> {
    let tasks = services::list_tasks(state.tasks.as_ref(), &identity, &query).await?;
    Ok(Json(tasks))
}

#[instrument(skip(state, body))]
pub async fn update_task(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<UpdateTaskRequest>,
) -> Result<Json<TaskResponse>, AppError> {
    let task = services::update_task(state.tasks.as_ref(), &identity, id, body).await?;
    Ok(Json(TaskResponse {
        message: "Task updated successfully".into(),
        task,
    }))
}

#[instrument(skip(state))]
pub async fn mark_completed(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<TaskResponse>, AppError> {
    let task = services::toggle_completed(state.tasks.as_ref(), &identity, id).await?;
    let state_word = if task.is_completed { "completed" } else { "incomplete" };
    Ok(Json(TaskResponse {
        message: format!("Task marked as {state_word}"),
        task,
    }))
}

#[instrument(skip(state))]
pub async fn mark_important(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<TaskResponse>, AppError> {
    let task = services::toggle_important(state.tasks.as_ref(), &identity, id).await?;
    let state_word = if task.is_important { "important" } else { "not important" };
    Ok(Json(TaskResponse {
        message: format!("Task marked as {state_word}"),
        task,
    }))
}

#[instrument(skip(state))]
pub async fn delete_task(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    services::delete_task(state.tasks.as_ref(), &identity, id).await?;
    Ok(Json(MessageResponse {
        message: "Task deleted successfully",
    }))
}
