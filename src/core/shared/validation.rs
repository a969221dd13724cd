use chrono::{NaiveDate, NaiveTime};
use regex::Regex;
use std::sync::LazyLock;

use crate::core::storage::ValidationError;

pub fn required<T>(value: Option<T>, field: &str) -> Result<T, ValidationError> {
    value.ok_or_else(|| ValidationError::new(format!("Le champ '{field}' est requis")))
}

/// Present and non-blank; returns the trimmed text.
pub fn required_text(value: Option<String>, field: &str) -> Result<String, ValidationError> {
    non_blank(required(value, field)?, field)
}

pub fn non_blank(value: String, field: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::new(format!(
            "Le champ '{field}' ne peut pas être vide"
        )));
    }
    Ok(trimmed.to_string())
}

pub fn one_of(value: &str, allowed: &[&str], field: &str) -> Result<(), ValidationError> {
    if allowed.contains(&value) {
        return Ok(());
    }
    Err(ValidationError::new(format!(
        "Valeur invalide pour '{field}': '{value}' (attendu: {})",
        allowed.join(", ")
    )))
}

pub fn non_negative(value: Option<f64>, field: &str) -> Result<(), ValidationError> {
    match value {
        Some(v) if !(v >= 0.0) => Err(ValidationError::new(format!(
            "Le champ '{field}' doit être positif"
        ))),
        _ => Ok(()),
    }
}

pub fn percentage(value: i32, field: &str) -> Result<(), ValidationError> {
    if (0..=100).contains(&value) {
        return Ok(());
    }
    Err(ValidationError::new(format!(
        "Le champ '{field}' doit être compris entre 0 et 100"
    )))
}

pub fn date_order(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<(), ValidationError> {
    match (start, end) {
        (Some(start), Some(end)) if end < start => Err(ValidationError::new(
            "La date de fin doit être postérieure ou égale à la date de début",
        )),
        _ => Ok(()),
    }
}

pub fn hour_order(start: Option<NaiveTime>, end: Option<NaiveTime>) -> Result<(), ValidationError> {
    match (start, end) {
        (Some(start), Some(end)) if end <= start => Err(ValidationError::new(
            "L'heure de fin doit être postérieure à l'heure de début",
        )),
        _ => Ok(()),
    }
}

const MAX_EMAIL_LEN: usize = 254;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)+$",
    )
    .expect("Invalid email regex")
});

static COLOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#[0-9a-fA-F]{6}$").expect("Invalid colour regex"));

pub fn hex_color(value: &str) -> Result<(), ValidationError> {
    if COLOR_RE.is_match(value) {
        return Ok(());
    }
    Err(ValidationError::new(format!(
        "Couleur invalide: '{value}' (attendu #RRGGBB)"
    )))
}

pub fn email(value: &str) -> Result<(), ValidationError> {
    if value.len() <= MAX_EMAIL_LEN && EMAIL_RE.is_match(value) {
        return Ok(());
    }
    Err(ValidationError::new(format!("Email invalide: '{value}'")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_text_trims_and_rejects_blank() {
        assert_eq!(required_text(Some("  Lot A ".into()), "nom").unwrap(), "Lot A");
        assert!(required_text(Some("   ".into()), "nom").is_err());
        let err = required_text(None, "nom").unwrap_err();
        assert_eq!(err.to_string(), "Le champ 'nom' est requis");
    }

    #[test]
    fn test_non_negative_rejects_nan() {
        assert!(non_negative(Some(f64::NAN), "budget").is_err());
        assert!(non_negative(Some(-1.0), "budget").is_err());
        assert!(non_negative(Some(0.0), "budget").is_ok());
        assert!(non_negative(None, "budget").is_ok());
    }

    #[test]
    fn test_hex_color() {
        assert!(hex_color("#3b82f6").is_ok());
        assert!(hex_color("3b82f6").is_err());
        assert!(hex_color("#3b82fg").is_err());
        assert!(hex_color("#3B82F6").is_ok());
        assert!(hex_color("#3b82f6 ").is_err());
    }

    #[test]
    fn test_email() {
        assert!(email("chef@btp.fr").is_ok());
        assert!(email("chef.btp.fr").is_err());
        assert!(email("@btp.fr").is_err());
        assert!(email("a@.").is_err());
        assert!(email("a b@c.d").is_err());
        assert!(email("chef@localhost").is_err());
        let long = format!("{}@btp.fr", "a".repeat(250));
        assert!(email(&long).is_err());
    }

    #[test]
    fn test_hour_order_requires_strictly_later_end() {
        let h = |s: &str| Some(crate::core::shared::dates::parse_hour(s).unwrap());
        assert!(hour_order(h("08:00"), h("08:00")).is_err());
        assert!(hour_order(h("08:00"), h("12:00")).is_ok());
        assert!(hour_order(h("08:00"), None).is_ok());
    }
}
