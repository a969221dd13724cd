//! Runtime configuration of the planning board (`/api/configuration`): a free
//! key/value map stored by the backend, shown over the server's defaults.

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::get,
    Json, Router,
};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::core::config::PlanningConfig;
use crate::core::shared::dates::{hours_between, parse_hour};
use crate::core::shared::error::ApiError;
use crate::core::shared::state::AppState;
use crate::core::shared::utils::run_blocking;
use crate::core::storage::{SettingsRepository, ValidationError};
use crate::core::urls::ApiUrls;

pub const DAY_START_KEY: &str = "heure_debut_journee";
pub const DAY_END_KEY: &str = "heure_fin_journee";

pub type Settings = BTreeMap<String, Value>;

fn defaults(planning: &PlanningConfig) -> Settings {
    BTreeMap::from([
        (DAY_START_KEY.to_string(), Value::from(planning.day_start.clone())),
        (DAY_END_KEY.to_string(), Value::from(planning.day_end.clone())),
    ])
}

/// Stored keys laid over the defaults.
pub fn effective(planning: &PlanningConfig, stored: Settings) -> Settings {
    let mut merged = defaults(planning);
    merged.extend(stored);
    merged
}

fn validate_changes(changes: &Map<String, Value>) -> Result<(), ValidationError> {
    for key in [DAY_START_KEY, DAY_END_KEY] {
        match changes.get(key) {
            None | Some(Value::Null) => {}
            Some(Value::String(raw)) => {
                parse_hour(raw)?;
            }
            Some(_) => {
                return Err(ValidationError::new(format!(
                    "Le champ '{key}' doit être une heure HH:MM"
                )))
            }
        }
    }
    Ok(())
}

/// Length in hours of the working day, from stored settings, falling back
/// to the server configuration when they are missing or inconsistent.
pub fn day_length(planning: &PlanningConfig, settings: &Settings) -> f64 {
    let hour = |key: &str, fallback: &str| {
        settings
            .get(key)
            .and_then(Value::as_str)
            .and_then(|raw| parse_hour(raw).ok())
            .or_else(|| parse_hour(fallback).ok())
    };
    let configured = match (
        hour(DAY_START_KEY, &planning.day_start),
        hour(DAY_END_KEY, &planning.day_end),
    ) {
        (Some(start), Some(end)) => hours_between(start, end),
        _ => 0.0,
    };
    if configured > 0.0 {
        return configured;
    }
    match (parse_hour(&planning.day_start), parse_hour(&planning.day_end)) {
        (Ok(start), Ok(end)) => hours_between(start, end),
        _ => 0.0,
    }
}

pub async fn load_settings(state: &AppState) -> Result<Settings, ApiError> {
    let store = state.store.clone();
    let stored = run_blocking(move || store.load_settings()).await?;
    Ok(effective(&state.config.planning, stored))
}

pub async fn working_day_hours(state: &AppState) -> Result<f64, ApiError> {
    let settings = load_settings(state).await?;
    Ok(day_length(&state.config.planning, &settings))
}

pub async fn handle_get_settings(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Settings>, ApiError> {
    Ok(Json(load_settings(&state).await?))
}

pub async fn handle_update_settings(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Settings>, ApiError> {
    let Json(body) = payload?;
    let Value::Object(changes) = body else {
        return Err(ApiError::Validation(
            "La configuration doit être un objet JSON".to_string(),
        ));
    };
    validate_changes(&changes)?;

    let keys: Vec<String> = changes.keys().cloned().collect();
    let store = state.store.clone();
    let stored = run_blocking(move || store.merge_settings(changes)).await?;
    log::info!("Updated configuration keys {keys:?}");

    Ok(Json(effective(&state.config.planning, stored)))
}

pub fn configure_settings_routes() -> Router<Arc<AppState>> {
    Router::new().route(
        ApiUrls::SETTINGS,
        get(handle_get_settings)
            .put(handle_update_settings)
            .patch(handle_update_settings),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_stored_values_override_defaults() {
        let planning = PlanningConfig::default();
        let stored = BTreeMap::from([
            (DAY_START_KEY.to_string(), json!("07:00")),
            ("theme".to_string(), json!("sombre")),
        ]);
        let settings = effective(&planning, stored);
        assert_eq!(settings[DAY_START_KEY], "07:00");
        assert_eq!(settings[DAY_END_KEY], "17:00");
        assert_eq!(settings["theme"], "sombre");
    }

    #[test]
    fn test_day_length() {
        let planning = PlanningConfig::default();
        assert_eq!(day_length(&planning, &defaults(&planning)), 9.0);

        let inverted = BTreeMap::from([
            (DAY_START_KEY.to_string(), json!("18:00")),
            (DAY_END_KEY.to_string(), json!("08:00")),
        ]);
        assert_eq!(day_length(&planning, &inverted), 9.0);
    }

    #[test]
    fn test_hour_keys_are_checked() {
        let mut changes = Map::new();
        changes.insert(DAY_START_KEY.to_string(), json!("7h"));
        assert!(validate_changes(&changes).is_err());

        changes.insert(DAY_START_KEY.to_string(), json!(null));
        assert!(validate_changes(&changes).is_ok());

        changes.insert(DAY_END_KEY.to_string(), json!(17));
        assert!(validate_changes(&changes).is_err());
    }
}
