//! Moving a task on the board: the new start date is given, the duration is kept.

use chrono::NaiveDate;
use serde::Deserialize;

use super::types::{Task, TaskInput};
use crate::core::shared::validation::{date_order, required};
use crate::core::storage::ValidationError;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RescheduleRequest {
    #[serde(rename = "date_debut", alias = "start_date")]
    pub start_date: Option<NaiveDate>,
    #[serde(rename = "date_fin", alias = "end_date")]
    pub end_date: Option<NaiveDate>,
}

/// Builds the partial update placing `task` on its new dates.
///
/// Without an explicit end date the task keeps its current span; an undated
/// task becomes a one-day task.
pub fn plan_reschedule(task: &Task, request: RescheduleRequest) -> Result<TaskInput, ValidationError> {
    let start = required(request.start_date, "date_debut")?;
    let end = match request.end_date {
        Some(end) => end,
        None => match task.span() {
            Some((old_start, old_end)) => start
                .checked_add_signed(old_end - old_start)
                .ok_or_else(|| ValidationError::new("La date de fin dépasse le calendrier"))?,
            None => start,
        },
    };
    date_order(Some(start), Some(end))?;

    Ok(TaskInput {
        start_date: Some(start),
        end_date: Some(end),
        ..TaskInput::default()
    })
}
