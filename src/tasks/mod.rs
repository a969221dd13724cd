//! Tasks (tâches) of a worksite, their rescheduling and their sub-task shortcuts.

pub mod schedule;
pub mod storage;
pub mod types;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::core::crud::{crud_routes, create_record, fetch_record, list_records, update_record};
use crate::core::shared::error::ApiError;
use crate::core::shared::state::AppState;
use crate::core::urls::ApiUrls;
use crate::subtasks::{SubTask, SubTaskFilter, SubTaskInput};

pub use schedule::{plan_reschedule, RescheduleRequest};
pub use types::*;

pub async fn handle_reschedule_task(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    payload: Result<Json<RescheduleRequest>, JsonRejection>,
) -> Result<Json<Task>, ApiError> {
    let Json(request) = payload?;
    let task = fetch_record::<Task>(&state, id).await?;
    let update = plan_reschedule(&task, request)?;
    Ok(Json(update_record::<Task>(&state, id, update).await?))
}

pub async fn handle_list_task_subtasks(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<SubTask>>, ApiError> {
    fetch_record::<Task>(&state, id).await?;
    let filter = SubTaskFilter {
        task_id: Some(id),
        ..SubTaskFilter::default()
    };
    Ok(Json(list_records::<SubTask>(&state, filter).await?))
}

pub async fn handle_create_task_subtask(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    payload: Result<Json<SubTaskInput>, JsonRejection>,
) -> Result<(StatusCode, Json<SubTask>), ApiError> {
    let Json(mut input) = payload?;
    fetch_record::<Task>(&state, id).await?;
    input.task_id = Some(id);
    let created = create_record::<SubTask>(&state, input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub fn configure_task_routes() -> Router<Arc<AppState>> {
    crud_routes::<Task>(ApiUrls::TASKS, ApiUrls::TASK_BY_ID)
        .route(ApiUrls::TASK_RESCHEDULE, patch(handle_reschedule_task))
        .route(
            ApiUrls::TASK_SUBTASKS,
            get(handle_list_task_subtasks).post(handle_create_task_subtask),
        )
}
