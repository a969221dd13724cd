//! Handlers implementing the uniform list/get/create/update/delete contract
//! for any [`Record`] the store knows about.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::core::shared::error::ApiError;
use crate::core::shared::state::AppState;
use crate::core::shared::utils::run_blocking;
use crate::core::storage::{Record, Repository, Store};

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
}

pub async fn list_records<R>(state: &AppState, filter: R::Filter) -> Result<Vec<R>, ApiError>
where
    R: Record,
    dyn Store: Repository<R>,
{
    let store = state.store.clone();
    run_blocking(move || <dyn Store as Repository<R>>::list(&*store, &filter)).await
}

pub async fn fetch_record<R>(state: &AppState, id: Uuid) -> Result<R, ApiError>
where
    R: Record,
    dyn Store: Repository<R>,
{
    let store = state.store.clone();
    run_blocking(move || <dyn Store as Repository<R>>::get(&*store, id))
        .await?
        .ok_or_else(|| ApiError::not_found(R::LABEL))
}

pub async fn create_record<R>(state: &AppState, input: R::Input) -> Result<R, ApiError>
where
    R: Record,
    dyn Store: Repository<R>,
{
    let record = R::create(Uuid::new_v4(), input, Utc::now())?;
    let store = state.store.clone();
    let created = run_blocking(move || <dyn Store as Repository<R>>::insert(&*store, record)).await?;
    log::info!("Created {} {}", R::LABEL, created.id());
    Ok(created)
}

pub async fn update_record<R>(state: &AppState, id: Uuid, input: R::Input) -> Result<R, ApiError>
where
    R: Record,
    dyn Store: Repository<R>,
{
    let store = state.store.clone();
    let updated = run_blocking(move || {
        <dyn Store as Repository<R>>::update(&*store, id, input, Utc::now())
    })
    .await?
    .ok_or_else(|| ApiError::not_found(R::LABEL))?;
    log::info!("Updated {} {}", R::LABEL, id);
    Ok(updated)
}

pub async fn delete_record<R>(state: &AppState, id: Uuid) -> Result<(), ApiError>
where
    R: Record,
    dyn Store: Repository<R>,
{
    let store = state.store.clone();
    let deleted = run_blocking(move || <dyn Store as Repository<R>>::delete(&*store, id)).await?;
    if !deleted {
        return Err(ApiError::not_found(R::LABEL));
    }
    log::info!("Deleted {} {}", R::LABEL, id);
    Ok(())
}

pub async fn handle_list<R>(
    State(state): State<Arc<AppState>>,
    query: Result<Query<R::Filter>, QueryRejection>,
) -> Result<Json<Vec<R>>, ApiError>
where
    R: Record,
    dyn Store: Repository<R>,
{
    let Query(filter) = query?;
    Ok(Json(list_records::<R>(&state, filter).await?))
}

pub async fn handle_get<R>(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<R>, ApiError>
where
    R: Record,
    dyn Store: Repository<R>,
{
    Ok(Json(fetch_record::<R>(&state, id).await?))
}

pub async fn handle_create<R>(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<R::Input>, JsonRejection>,
) -> Result<(StatusCode, Json<R>), ApiError>
where
    R: Record,
    dyn Store: Repository<R>,
{
    let Json(input) = payload?;
    let created = create_record::<R>(&state, input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn handle_update<R>(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    payload: Result<Json<R::Input>, JsonRejection>,
) -> Result<Json<R>, ApiError>
where
    R: Record,
    dyn Store: Repository<R>,
{
    let Json(input) = payload?;
    Ok(Json(update_record::<R>(&state, id, input).await?))
}

pub async fn handle_delete<R>(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Uuid>>, ApiError>
where
    R: Record,
    dyn Store: Repository<R>,
{
    delete_record::<R>(&state, id).await?;
    Ok(Json(ApiResponse {
        success: true,
        data: Some(id),
        message: Some(format!("{} supprimé", R::LABEL)),
    }))
}

/// `GET`/`POST` on `collection`, `GET`/`PUT`/`PATCH`/`DELETE` on `item`.
pub fn crud_routes<R>(collection: &str, item: &str) -> Router<Arc<AppState>>
where
    R: Record,
    dyn Store: Repository<R>,
{
    Router::new()
        .route(collection, get(handle_list::<R>).post(handle_create::<R>))
        .route(
            item,
            get(handle_get::<R>)
                .put(handle_update::<R>)
                .patch(handle_update::<R>)
                .delete(handle_delete::<R>),
        )
}
