use std::env;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::policy::DEFAULT_DOCTOR_NOTE_THRESHOLD_DAYS;

/// Business-rule knobs, separate from deployment settings so the service
/// can be constructed without an environment in tests.
#[derive(Clone, Debug)]
pub struct LeaveRules {
    pub doctor_note_threshold_days: u32,
    pub default_annual_entitlement: Decimal,
    pub default_sick_entitlement: Decimal,
}

impl Default for LeaveRules {
    fn default() -> Self {
        Self {
            doctor_note_threshold_days: DEFAULT_DOCTOR_NOTE_THRESHOLD_DAYS,
            default_annual_entitlement: Decimal::from(25),
            default_sick_entitlement: Decimal::from(10),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Settings {
    pub database_url: String,
    pub holidays: Vec<NaiveDate>,
    pub rules: LeaveRules,
}

impl Settings {
    pub fn from_env() -> Result<Self, String> {
        let database_url =
            env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set".to_string())?;

        let holidays = match env::var("HOLIDAYS") {
            Ok(raw) => parse_holidays(&raw)?,
            Err(_) => Vec::new(),
        };

        let mut rules = LeaveRules::default();
        if let Ok(raw) = env::var("DOCTOR_NOTE_THRESHOLD_DAYS") {
            rules.doctor_note_threshold_days = raw
                .parse()
                .map_err(|_| format!("DOCTOR_NOTE_THRESHOLD_DAYS is not a number: {raw}"))?;
        }
        if let Ok(raw) = env::var("DEFAULT_ANNUAL_ENTITLEMENT") {
            rules.default_annual_entitlement = raw
                .parse()
                .map_err(|_| format!("DEFAULT_ANNUAL_ENTITLEMENT is not a decimal: {raw}"))?;
        }
        if let Ok(raw) = env::var("DEFAULT_SICK_ENTITLEMENT") {
            rules.default_sick_entitlement = raw
                .parse()
                .map_err(|_| format!("DEFAULT_SICK_ENTITLEMENT is not a decimal: {raw}"))?;
        }

        Ok(Self {
            database_url,
            holidays,
            rules,
        })
    }
}

/// HOLIDAYS is a comma-separated list of ISO dates, e.g.
/// `2026-01-01,2026-12-25`.
fn parse_holidays(raw: &str) -> Result<Vec<NaiveDate>, String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .map_err(|e| format!("invalid holiday date {s:?}: {e}"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_holiday_list() {
        let days = parse_holidays("2026-01-01, 2026-12-25").unwrap();
        assert_eq!(days.len(), 2);
        assert_eq!(days[0], NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
    }

    #[test]
    fn empty_list_is_fine() {
        assert!(parse_holidays("").unwrap().is_empty());
    }

    #[test]
    fn rejects_garbage_dates() {
        assert!(parse_holidays("not-a-date").is_err());
    }
}
