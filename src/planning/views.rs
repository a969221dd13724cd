//! Read models behind the board's calendar, Gantt, heatmap and workload views.
//!
//! Everything here is pure: handlers load the records and pass them in.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

use super::types::PlanningEntry;
use crate::core::shared::dates::{span_days, DayRange, WeekRange};
use crate::tasks::Task;
use crate::users::User;

pub const MAX_INTENSITY: u8 = 4;

#[derive(Debug, Clone, Deserialize)]
pub struct WeekQuery {
    #[serde(rename = "semaine", alias = "week")]
    pub week: Option<WeekRange>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GanttQuery {
    #[serde(rename = "chantierId", alias = "chantier_id")]
    pub worksite_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RangeQuery {
    #[serde(rename = "du", alias = "from")]
    pub from: NaiveDate,
    #[serde(rename = "au", alias = "to")]
    pub to: NaiveDate,
}

#[derive(Debug, Clone, Serialize)]
pub struct CalendarSlot {
    #[serde(rename = "entree_id")]
    pub entry_id: Uuid,
    #[serde(rename = "tache_id")]
    pub task_id: Uuid,
    #[serde(rename = "ressource_id")]
    pub resource_id: Option<Uuid>,
    #[serde(rename = "utilisateur_id")]
    pub user_id: Option<Uuid>,
    #[serde(rename = "heure_debut", with = "crate::core::shared::dates::hour_format")]
    pub start_hour: Option<NaiveTime>,
    #[serde(rename = "heure_fin", with = "crate::core::shared::dates::hour_format")]
    pub end_hour: Option<NaiveTime>,
    #[serde(rename = "statut")]
    pub status: String,
    #[serde(rename = "recurrente")]
    pub recurring: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CalendarDay {
    pub date: NaiveDate,
    #[serde(rename = "creneaux")]
    pub slots: Vec<CalendarSlot>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CalendarWeek {
    #[serde(rename = "semaine")]
    pub label: String,
    #[serde(flatten)]
    pub range: WeekRange,
    #[serde(rename = "jours")]
    pub days: Vec<CalendarDay>,
}

/// The week's slots day by day, recurring entries expanded, cancelled ones left out.
pub fn calendar_week(entries: &[PlanningEntry], week: WeekRange) -> CalendarWeek {
    let days = week
        .days()
        .map(|date| {
            let mut slots: Vec<CalendarSlot> = entries
                .iter()
                .filter(|e| !e.is_cancelled() && e.occurs_on(date))
                .map(|e| CalendarSlot {
                    entry_id: e.id,
                    task_id: e.task_id,
                    resource_id: e.resource_id,
                    user_id: e.user_id,
                    start_hour: e.start_hour,
                    end_hour: e.end_hour,
                    status: e.status.clone(),
                    recurring: e.is_recurring(),
                })
                .collect();
            // Timed slots first, by start hour.
            slots.sort_by_key(|s| (s.start_hour.is_none(), s.start_hour));
            CalendarDay { date, slots }
        })
        .collect();

    CalendarWeek {
        label: week.iso_label(),
        range: week,
        days,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GanttBar {
    #[serde(rename = "tache_id")]
    pub task_id: Uuid,
    #[serde(rename = "titre")]
    pub title: String,
    #[serde(rename = "debut")]
    pub start: NaiveDate,
    #[serde(rename = "fin")]
    pub end: NaiveDate,
    #[serde(rename = "duree_jours")]
    pub duration_days: i64,
    #[serde(rename = "progression")]
    pub progress: i32,
    #[serde(rename = "statut")]
    pub status: String,
    #[serde(rename = "dependances")]
    pub dependencies: Vec<Uuid>,
    #[serde(rename = "en_retard")]
    pub late: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct GanttChart {
    #[serde(rename = "debut")]
    pub start: Option<NaiveDate>,
    #[serde(rename = "fin")]
    pub end: Option<NaiveDate>,
    #[serde(rename = "barres")]
    pub bars: Vec<GanttBar>,
    #[serde(rename = "non_planifiees")]
    pub unscheduled: Vec<Uuid>,
}

pub fn gantt_chart(tasks: &[Task], today: NaiveDate) -> GanttChart {
    let mut bars = Vec::new();
    let mut unscheduled = Vec::new();

    for task in tasks {
        let Some((start, end)) = task.span() else {
            unscheduled.push(task.id);
            continue;
        };
        bars.push(GanttBar {
            task_id: task.id,
            title: task.title.clone(),
            start,
            end,
            duration_days: span_days(start, end),
            progress: task.progress,
            status: task.status.clone(),
            dependencies: task.dependencies.clone(),
            late: task.is_late(today),
        });
    }
    bars.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.title.cmp(&b.title)));

    GanttChart {
        start: bars.iter().map(|b| b.start).min(),
        end: bars.iter().map(|b| b.end).max(),
        bars,
        unscheduled,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatmapDay {
    pub date: NaiveDate,
    #[serde(rename = "creneaux")]
    pub slots: usize,
    #[serde(rename = "heures")]
    pub hours: f64,
    #[serde(rename = "intensite")]
    pub intensity: u8,
}

/// Daily occupation over `range`. Intensity is scaled 1..=4 against the
/// busiest day's slot count; empty days are 0.
pub fn heatmap(entries: &[PlanningEntry], range: DayRange) -> Vec<HeatmapDay> {
    let mut days: Vec<HeatmapDay> = range
        .days()
        .map(|date| {
            let occurring = entries
                .iter()
                .filter(|e| !e.is_cancelled() && e.occurs_on(date));
            let (slots, hours) = occurring.fold((0, 0.0), |(n, h), e| {
                (n + 1, h + e.slot_hours().unwrap_or(0.0))
            });
            HeatmapDay {
                date,
                slots,
                hours,
                intensity: 0,
            }
        })
        .collect();

    let busiest = days.iter().map(|d| d.slots).max().unwrap_or(0);
    if busiest > 0 {
        for day in &mut days {
            if day.slots > 0 {
                let scaled = (day.slots * usize::from(MAX_INTENSITY)).div_ceil(busiest);
                day.intensity = scaled.min(usize::from(MAX_INTENSITY)) as u8;
            }
        }
    }
    days
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayLoad {
    pub date: NaiveDate,
    #[serde(rename = "heures")]
    pub hours: f64,
    #[serde(rename = "charge_pourcentage")]
    pub load_percent: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserWorkload {
    #[serde(rename = "utilisateur_id")]
    pub user_id: Uuid,
    #[serde(rename = "nom")]
    pub name: Option<String>,
    #[serde(rename = "jours")]
    pub days: Vec<DayLoad>,
    #[serde(rename = "total_heures")]
    pub total_hours: f64,
    /// Against five working days.
    #[serde(rename = "charge_pourcentage")]
    pub load_percent: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkloadWeek {
    #[serde(rename = "semaine")]
    pub label: String,
    #[serde(rename = "heures_journee")]
    pub day_hours: f64,
    #[serde(rename = "utilisateurs")]
    pub users: Vec<UserWorkload>,
}

fn percent(hours: f64, capacity: f64) -> i64 {
    if capacity <= 0.0 {
        return 0;
    }
    (hours * 100.0 / capacity).round() as i64
}

/// Planned hours per user and day of `week`. A slot without hours counts as
/// a full working day of `day_hours`.
pub fn workload(entries: &[PlanningEntry], users: &[User], week: WeekRange, day_hours: f64) -> WorkloadWeek {
    let names: HashMap<Uuid, &str> = users.iter().map(|u| (u.id, u.name.as_str())).collect();

    let mut per_user: BTreeMap<Uuid, BTreeMap<NaiveDate, f64>> =
        users.iter().map(|u| (u.id, BTreeMap::new())).collect();
    for date in week.days() {
        for entry in entries.iter().filter(|e| !e.is_cancelled() && e.occurs_on(date)) {
            let Some(user_id) = entry.user_id else {
                continue;
            };
            *per_user
                .entry(user_id)
                .or_default()
                .entry(date)
                .or_insert(0.0) += entry.slot_hours().unwrap_or(day_hours);
        }
    }

    let mut rows: Vec<UserWorkload> = per_user
        .into_iter()
        .map(|(user_id, hours_by_day)| {
            let days: Vec<DayLoad> = week
                .days()
                .map(|date| {
                    let hours = hours_by_day.get(&date).copied().unwrap_or(0.0);
                    DayLoad {
                        date,
                        hours,
                        load_percent: percent(hours, day_hours),
                    }
                })
                .collect();
            let total_hours: f64 = days.iter().map(|d| d.hours).sum();
            UserWorkload {
                user_id,
                name: names.get(&user_id).map(|n| n.to_string()),
                days,
                total_hours,
                load_percent: percent(total_hours, day_hours * 5.0),
            }
        })
        .collect();
    rows.sort_by(|a, b| {
        b.total_hours
            .total_cmp(&a.total_hours)
            .then_with(|| a.name.cmp(&b.name))
    });

    WorkloadWeek {
        label: week.iso_label(),
        day_hours,
        users: rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::storage::Record;
    use crate::planning::types::PlanningInput;
    use crate::tasks::TaskInput;
    use crate::users::UserInput;
    use chrono::Utc;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn hour(h: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, 0, 0).unwrap()
    }

    fn entry(day: NaiveDate, hours: Option<(u32, u32)>, recurrence: &str, user: Option<Uuid>) -> PlanningEntry {
        PlanningEntry::create(
            Uuid::new_v4(),
            PlanningInput {
                task_id: Some(Uuid::new_v4()),
                user_id: user,
                day: Some(day),
                start_hour: hours.map(|(s, _)| hour(s)),
                end_hour: hours.map(|(_, e)| hour(e)),
                recurrence: Some(recurrence.to_string()),
                ..PlanningInput::default()
            },
            Utc::now(),
        )
        .unwrap()
    }

    fn week_10() -> WeekRange {
        "2025-W10".parse().unwrap()
    }

    #[test]
    fn test_calendar_expands_recurrence_and_skips_cancelled() {
        let monday = date(2025, 3, 3);
        let daily = entry(monday, Some((14, 16)), "quotidienne", None);
        let once = entry(date(2025, 3, 5), Some((8, 10)), "aucune", None);
        let mut cancelled = entry(date(2025, 3, 5), Some((10, 11)), "aucune", None);
        cancelled.status = "annule".to_string();

        let calendar = calendar_week(&[daily.clone(), once.clone(), cancelled], week_10());
        assert_eq!(calendar.label, "2025-W10");
        assert_eq!(calendar.days.len(), 7);
        assert!(calendar.days.iter().all(|d| d.slots.iter().any(|s| s.entry_id == daily.id)));

        let wednesday = &calendar.days[2];
        assert_eq!(wednesday.slots.len(), 2);
        assert_eq!(wednesday.slots[0].entry_id, once.id);
        assert!(wednesday.slots[1].recurring);
    }

    #[test]
    fn test_gantt_bars_and_unscheduled() {
        let now = Utc::now();
        let task = |title: &str, start: Option<NaiveDate>, end: Option<NaiveDate>| {
            Task::create(
                Uuid::new_v4(),
                TaskInput {
                    title: Some(title.to_string()),
                    start_date: start,
                    end_date: end,
                    ..TaskInput::default()
                },
                now,
            )
            .unwrap()
        };
        let foundations = task("Fondations", Some(date(2025, 3, 3)), Some(date(2025, 3, 7)));
        let walls = task("Murs", Some(date(2025, 3, 10)), None);
        let cleanup = task("Nettoyage", None, None);

        let chart = gantt_chart(&[walls, foundations, cleanup.clone()], date(2025, 3, 8));
        assert_eq!(chart.bars.len(), 2);
        assert_eq!(chart.bars[0].title, "Fondations");
        assert_eq!(chart.bars[0].duration_days, 5);
        assert!(chart.bars[0].late);
        assert_eq!(chart.bars[1].duration_days, 1);
        assert!(!chart.bars[1].late);
        assert_eq!(chart.start, Some(date(2025, 3, 3)));
        assert_eq!(chart.end, Some(date(2025, 3, 10)));
        assert_eq!(chart.unscheduled, vec![cleanup.id]);
    }

    #[test]
    fn test_heatmap_intensity_scale() {
        let monday = date(2025, 3, 3);
        let entries = vec![
            entry(monday, Some((8, 12)), "aucune", None),
            entry(monday, Some((13, 17)), "aucune", None),
            entry(monday, None, "aucune", None),
            entry(monday, None, "aucune", None),
            entry(date(2025, 3, 4), Some((8, 10)), "aucune", None),
        ];
        let range = DayRange::new(monday, date(2025, 3, 5)).unwrap();
        let days = heatmap(&entries, range);

        assert_eq!(days.len(), 3);
        assert_eq!(days[0].slots, 4);
        assert_eq!(days[0].hours, 8.0);
        assert_eq!(days[0].intensity, MAX_INTENSITY);
        assert_eq!(days[1].intensity, 1);
        assert_eq!(days[2].intensity, 0);
    }

    #[test]
    fn test_workload_per_user() {
        let now = Utc::now();
        let user = User::create(
            Uuid::new_v4(),
            UserInput {
                name: Some("Inès".to_string()),
                email: Some("ines@btp.fr".to_string()),
                ..UserInput::default()
            },
            now,
        )
        .unwrap();
        let idle = User::create(
            Uuid::new_v4(),
            UserInput {
                name: Some("Marc".to_string()),
                email: Some("marc@btp.fr".to_string()),
                ..UserInput::default()
            },
            now,
        )
        .unwrap();

        let monday = date(2025, 3, 3);
        let entries = vec![
            entry(monday, Some((8, 12)), "aucune", Some(user.id)),
            entry(monday, Some((13, 17)), "aucune", Some(user.id)),
            entry(date(2025, 3, 4), None, "aucune", Some(user.id)),
        ];
        let load = workload(&entries, &[user.clone(), idle.clone()], week_10(), 9.0);

        assert_eq!(load.users.len(), 2);
        let busy = &load.users[0];
        assert_eq!(busy.user_id, user.id);
        assert_eq!(busy.days[0].hours, 8.0);
        assert_eq!(busy.days[0].load_percent, 89);
        assert_eq!(busy.days[1].hours, 9.0);
        assert_eq!(busy.total_hours, 17.0);
        assert_eq!(busy.load_percent, 38);
        assert_eq!(load.users[1].total_hours, 0.0);
        assert_eq!(load.users[1].name.as_deref(), Some("Marc"));
    }
}
