//! Calendar arithmetic for the planning board: ISO weeks, months, day
//! ranges and `HH:MM` hours on the wire.

use chrono::{Datelike, Days, Duration, NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Deserializer, Serialize};
use std::str::FromStr;

use crate::core::storage::ValidationError;

pub const MAX_RANGE_DAYS: i64 = 366;

/// Monday-to-Sunday week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WeekRange {
    #[serde(rename = "debut")]
    pub start: NaiveDate,
    #[serde(rename = "fin")]
    pub end: NaiveDate,
}

impl WeekRange {
    /// Fails for the first and last few days chrono can represent.
    pub fn containing(date: NaiveDate) -> Result<Self, ValidationError> {
        let out_of_range = || ValidationError::new(format!("Semaine hors calendrier: {date}"));
        let offset = Days::new(u64::from(date.weekday().num_days_from_monday()));
        let start = date.checked_sub_days(offset).ok_or_else(out_of_range)?;
        let end = start.checked_add_days(Days::new(6)).ok_or_else(out_of_range)?;
        Ok(Self { start, end })
    }

    pub fn previous(&self) -> Result<Self, ValidationError> {
        let day = self.start.checked_sub_days(Days::new(7)).ok_or_else(|| {
            ValidationError::new(format!("Semaine hors calendrier: {}", self.start))
        })?;
        Self::containing(day)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// True when the inclusive span `[start, end]` shares a day with the week.
    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        start <= self.end && end >= self.start
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        self.start.iter_days().take(7)
    }

    pub fn iso_label(&self) -> String {
        let week = self.start.iso_week();
        format!("{}-W{:02}", week.year(), week.week())
    }
}

impl FromStr for WeekRange {
    type Err = ValidationError;

    /// Accepts `2025-W07` or any date inside the wanted week.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let raw = raw.trim();
        let invalid = || ValidationError::new(format!("Semaine invalide: '{raw}'"));

        if let Some((year, week)) = raw.split_once("-W").or_else(|| raw.split_once("-w")) {
            let year: i32 = year.parse().map_err(|_| invalid())?;
            let week: u32 = week.parse().map_err(|_| invalid())?;
            let monday = NaiveDate::from_isoywd_opt(year, week, Weekday::Mon).ok_or_else(invalid)?;
            return Self::containing(monday);
        }

        let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| invalid())?;
        Self::containing(date)
    }
}

impl<'de> Deserialize<'de> for WeekRange {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Inclusive range of days, at most [`MAX_RANGE_DAYS`] long.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DayRange {
    #[serde(rename = "du")]
    pub from: NaiveDate,
    #[serde(rename = "au")]
    pub to: NaiveDate,
}

impl DayRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self, ValidationError> {
        if to < from {
            return Err(ValidationError::new(
                "La date 'au' doit être postérieure ou égale à 'du'",
            ));
        }
        if (to - from).num_days() >= MAX_RANGE_DAYS {
            return Err(ValidationError::new(format!(
                "La période ne peut pas dépasser {MAX_RANGE_DAYS} jours"
            )));
        }
        Ok(Self { from, to })
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let count = (self.to - self.from).num_days() + 1;
        self.from.iter_days().take(count as usize)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }
}

impl From<WeekRange> for DayRange {
    fn from(week: WeekRange) -> Self {
        Self {
            from: week.start,
            to: week.end,
        }
    }
}

pub fn month_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.day0()))
}

pub fn next_month_start(date: NaiveDate) -> Option<NaiveDate> {
    month_start(date)
        .checked_add_days(Days::new(32))
        .map(month_start)
}

pub fn previous_month_start(date: NaiveDate) -> Option<NaiveDate> {
    month_start(date).pred_opt().map(month_start)
}

/// Number of days covered by the inclusive span, at least 1.
pub fn span_days(start: NaiveDate, end: NaiveDate) -> i64 {
    ((end - start).num_days() + 1).max(1)
}

pub fn parse_hour(raw: &str) -> Result<NaiveTime, ValidationError> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .map_err(|_| ValidationError::new(format!("Heure invalide: '{raw}' (attendu HH:MM)")))
}

pub fn hours_between(start: NaiveTime, end: NaiveTime) -> f64 {
    (end - start).num_minutes() as f64 / 60.0
}

/// `Option<NaiveTime>` as `"HH:MM"` on the wire.
pub mod hour_format {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<NaiveTime>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(time) => serializer.serialize_str(&time.format("%H:%M").to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<NaiveTime>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        raw.map(|s| super::parse_hour(&s).map_err(serde::de::Error::custom))
            .transpose()
    }
}
