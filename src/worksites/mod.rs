//! Worksites (chantiers): the construction sites every task hangs off.

pub mod storage;
pub mod types;

use axum::Router;
use std::sync::Arc;

use crate::core::crud::crud_routes;
use crate::core::shared::state::AppState;
use crate::core::urls::ApiUrls;

pub use types::*;

pub fn configure_worksite_routes() -> Router<Arc<AppState>> {
    crud_routes::<Worksite>(ApiUrls::WORKSITES, ApiUrls::WORKSITE_BY_ID)
}
