use axum::{
    extract::{Path, State},
    response::Json,
};
use common::{TaskCompletionDto, TaskDto};
use ledger::task::{complete_task as complete, completed_task_ids, list_active_tasks};
use model::entities::task;
use tracing::{debug, info, instrument, trace};

use crate::error::ApiError;
use crate::gate::AuthSession;
use crate::helpers::converters::{completion_to_dto, task_to_dto};
use crate::schemas::{ACTIVE_TASKS_KEY, ApiResponse, AppState, CachedData, ErrorResponse};

async fn active_tasks(state: &AppState) -> Result<Vec<task::Model>, ApiError> {
    if let Some(CachedData::ActiveTasks(tasks)) = state.cache.get(ACTIVE_TASKS_KEY).await {
        trace!("Active tasks served from cache");
        return Ok(tasks);
    }

    let tasks = list_active_tasks(&state.db).await?;
    state
        .cache
        .insert(ACTIVE_TASKS_KEY.to_string(), CachedData::ActiveTasks(tasks.clone()))
        .await;
    Ok(tasks)
}

/// List active tasks, highest reward first
#[utoipa::path(
    get,
    path = "/api/v1/tasks",
    tag = "tasks",
    security(("session_token" = [])),
    responses(
        (status = 200, description = "Tasks retrieved successfully", body = ApiResponse<Vec<TaskDto>>),
        (status = 401, description = "Not signed in", body = ErrorResponse)
    )
)]
#[instrument(skip(state, auth), fields(account_id = auth.account_id()))]
pub async fn get_tasks(
    State(state): State<AppState>,
    auth: AuthSession,
) -> Result<Json<ApiResponse<Vec<TaskDto>>>, ApiError> {
    let tasks = active_tasks(&state).await?;
    let done = completed_task_ids(&state.db, auth.account_id()).await?;
    debug!("{} active tasks, {} completed by user", tasks.len(), done.len());

    let data = tasks
        .into_iter()
        .map(|task| {
            let completed = done.contains(&task.id);
            task_to_dto(task, completed)
        })
        .collect();
    Ok(Json(ApiResponse::ok(data, "Tasks retrieved successfully")))
}

/// Complete a task and collect its reward
///
/// A task pays out once per user; repeating the call is rejected.
#[utoipa::path(
    post,
    path = "/api/v1/tasks/{task_id}/complete",
    tag = "tasks",
    security(("session_token" = [])),
    params(
        ("task_id" = i32, Path, description = "Task ID"),
    ),
    responses(
        (status = 200, description = "Task completed", body = ApiResponse<TaskCompletionDto>),
        (status = 401, description = "Not signed in", body = ErrorResponse),
        (status = 404, description = "Task not found", body = ErrorResponse),
        (status = 409, description = "Task already completed", body = ErrorResponse)
    )
)]
#[instrument(skip(state, auth), fields(account_id = auth.account_id()))]
pub async fn complete_task(
    Path(task_id): Path<i32>,
    State(state): State<AppState>,
    auth: AuthSession,
) -> Result<Json<ApiResponse<TaskCompletionDto>>, ApiError> {
    trace!("Entering complete_task function for task_id: {}", task_id);
    let completion = complete(&state.db, auth.account_id(), task_id).await?;
    info!(
        "Task {} completed by user {}, earned {}",
        task_id,
        auth.account_id(),
        common::format_usd(completion.record.earnings)
    );
    Ok(Json(ApiResponse::ok(completion_to_dto(completion), "Task completed successfully")))
}
