//! The planning board: entries linking a task to a person or resource on a
//! given day and slot, plus the board's read models.

pub mod moves;
pub mod storage;
pub mod types;
pub mod views;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    routing::{get, patch},
    Json, Router,
};
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::core::crud::{crud_routes, fetch_record, list_records, update_record};
use crate::core::shared::dates::{DayRange, WeekRange};
use crate::core::shared::error::ApiError;
use crate::core::shared::state::AppState;
use crate::core::storage::ValidationError;
use crate::core::urls::ApiUrls;
use crate::settings::working_day_hours;
use crate::tasks::{Task, TaskFilter};
use crate::users::{User, UserFilter};

pub use moves::{plan_move, MoveRequest};
pub use types::*;
use views::{CalendarWeek, GanttChart, GanttQuery, HeatmapDay, RangeQuery, WeekQuery, WorkloadWeek};

/// Entries dated on or before `last_day`; recurring ones may land later.
async fn entries_until(
    state: &AppState,
    last_day: chrono::NaiveDate,
) -> Result<Vec<PlanningEntry>, ApiError> {
    let filter = PlanningFilter {
        to: Some(last_day),
        ..PlanningFilter::default()
    };
    list_records::<PlanningEntry>(state, filter).await
}

fn requested_week(query: WeekQuery) -> Result<WeekRange, ValidationError> {
    match query.week {
        Some(week) => Ok(week),
        None => WeekRange::containing(Utc::now().date_naive()),
    }
}

pub async fn handle_move_entry(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    payload: Result<Json<MoveRequest>, JsonRejection>,
) -> Result<Json<PlanningEntry>, ApiError> {
    let Json(request) = payload?;
    let entry = fetch_record::<PlanningEntry>(&state, id).await?;
    let update = plan_move(&entry, request)?;
    Ok(Json(update_record::<PlanningEntry>(&state, id, update).await?))
}

pub async fn handle_calendar(
    State(state): State<Arc<AppState>>,
    query: Result<Query<WeekQuery>, QueryRejection>,
) -> Result<Json<CalendarWeek>, ApiError> {
    let Query(query) = query?;
    let week = requested_week(query)?;
    let entries = entries_until(&state, week.end).await?;
    Ok(Json(views::calendar_week(&entries, week)))
}

pub async fn handle_gantt(
    State(state): State<Arc<AppState>>,
    query: Result<Query<GanttQuery>, QueryRejection>,
) -> Result<Json<GanttChart>, ApiError> {
    let Query(query) = query?;
    let filter = TaskFilter {
        worksite_id: query.worksite_id,
        ..TaskFilter::default()
    };
    let tasks = list_records::<Task>(&state, filter).await?;
    Ok(Json(views::gantt_chart(&tasks, Utc::now().date_naive())))
}

pub async fn handle_heatmap(
    State(state): State<Arc<AppState>>,
    query: Result<Query<RangeQuery>, QueryRejection>,
) -> Result<Json<Vec<HeatmapDay>>, ApiError> {
    let Query(query) = query?;
    let range = DayRange::new(query.from, query.to)?;
    let entries = entries_until(&state, range.to).await?;
    Ok(Json(views::heatmap(&entries, range)))
}

pub async fn handle_workload(
    State(state): State<Arc<AppState>>,
    query: Result<Query<WeekQuery>, QueryRejection>,
) -> Result<Json<WorkloadWeek>, ApiError> {
    let Query(query) = query?;
    let week = requested_week(query)?;
    let entries = entries_until(&state, week.end).await?;
    let users = list_records::<User>(&state, UserFilter::default()).await?;
    let day_hours = working_day_hours(&state).await?;
    Ok(Json(views::workload(&entries, &users, week, day_hours)))
}

pub fn configure_planning_routes() -> Router<Arc<AppState>> {
    crud_routes::<PlanningEntry>(ApiUrls::PLANNING, ApiUrls::PLANNING_BY_ID)
        .route(ApiUrls::PLANNING_MOVE, patch(handle_move_entry))
        .route(ApiUrls::PLANNING_CALENDAR, get(handle_calendar))
        .route(ApiUrls::PLANNING_GANTT, get(handle_gantt))
        .route(ApiUrls::PLANNING_HEATMAP, get(handle_heatmap))
        .route(ApiUrls::PLANNING_WORKLOAD, get(handle_workload))
}
