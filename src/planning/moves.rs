//! Dragging an entry to another day, slot or assignee.

use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use uuid::Uuid;

use super::types::{PlanningEntry, PlanningInput};
use crate::core::shared::dates::hour_format;
use crate::core::shared::validation::required;
use crate::core::storage::ValidationError;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MoveRequest {
    #[serde(alias = "day")]
    pub date: Option<NaiveDate>,
    #[serde(rename = "heure_debut", alias = "start_hour", default, with = "hour_format")]
    pub start_hour: Option<NaiveTime>,
    #[serde(rename = "heure_fin", alias = "end_hour", default, with = "hour_format")]
    pub end_hour: Option<NaiveTime>,
    #[serde(rename = "ressource_id", alias = "resource_id")]
    pub resource_id: Option<Uuid>,
    #[serde(rename = "utilisateur_id", alias = "user_id")]
    pub user_id: Option<Uuid>,
}

/// Partial update moving `entry`. A new start hour without an end keeps the
/// slot length; a slot pushed past midnight is rejected.
pub fn plan_move(entry: &PlanningEntry, request: MoveRequest) -> Result<PlanningInput, ValidationError> {
    let day = required(request.date, "date")?;

    let end_hour = match (request.start_hour, request.end_hour) {
        (_, Some(end)) => Some(end),
        (Some(start), None) => match (entry.start_hour, entry.end_hour) {
            (Some(old_start), Some(old_end)) => {
                let (end, wrapped) = start.overflowing_add_signed(old_end - old_start);
                if wrapped != 0 {
                    return Err(ValidationError::new(
                        "Le créneau déplacé dépasse minuit",
                    ));
                }
                Some(end)
            }
            _ => None,
        },
        (None, None) => None,
    };

    Ok(PlanningInput {
        day: Some(day),
        start_hour: request.start_hour,
        end_hour,
        resource_id: request.resource_id,
        user_id: request.user_id,
        ..PlanningInput::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::storage::Record;
    use chrono::Utc;

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn slot(start: NaiveTime, end: NaiveTime) -> PlanningEntry {
        PlanningEntry::create(
            Uuid::new_v4(),
            PlanningInput {
                task_id: Some(Uuid::new_v4()),
                day: NaiveDate::from_ymd_opt(2025, 6, 2),
                start_hour: Some(start),
                end_hour: Some(end),
                ..PlanningInput::default()
            },
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn test_new_start_keeps_length() {
        let entry = slot(hm(8, 0), hm(10, 30));
        let update = plan_move(
            &entry,
            MoveRequest {
                date: NaiveDate::from_ymd_opt(2025, 6, 3),
                start_hour: Some(hm(13, 0)),
                ..MoveRequest::default()
            },
        )
        .unwrap();
        assert_eq!(update.start_hour, Some(hm(13, 0)));
        assert_eq!(update.end_hour, Some(hm(15, 30)));
    }

    #[test]
    fn test_past_midnight_rejected() {
        let entry = slot(hm(8, 0), hm(12, 0));
        let result = plan_move(
            &entry,
            MoveRequest {
                date: NaiveDate::from_ymd_opt(2025, 6, 3),
                start_hour: Some(hm(22, 0)),
                ..MoveRequest::default()
            },
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_date_required() {
        let entry = slot(hm(8, 0), hm(12, 0));
        assert!(plan_move(&entry, MoveRequest::default()).is_err());
    }

    #[test]
    fn test_reassignment_only() {
        let entry = slot(hm(8, 0), hm(12, 0));
        let user = Uuid::new_v4();
        let update = plan_move(
            &entry,
            MoveRequest {
                date: NaiveDate::from_ymd_opt(2025, 6, 2),
                user_id: Some(user),
                ..MoveRequest::default()
            },
        )
        .unwrap();
        assert_eq!(update.user_id, Some(user));
        assert!(update.start_hour.is_none());
        assert!(update.end_hour.is_none());
    }
}
