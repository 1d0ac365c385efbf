//! Job-seeker preference: raw submission, validation, canonical form.

use core::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use talentmatch_core::FieldErrors;

pub const MAX_LOCATION_LEN: usize = 200;
pub const MAX_CURRENCY_LEN: usize = 3;
pub const DEFAULT_CURRENCY: &str = "INR";

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkMode {
    Remote,
    Onsite,
}

impl WorkMode {
    pub const VARIANTS: [&'static str; 2] = ["REMOTE", "ONSITE"];

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkMode::Remote => "REMOTE",
            WorkMode::Onsite => "ONSITE",
        }
    }
}

impl FromStr for WorkMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "REMOTE" => Ok(WorkMode::Remote),
            "ONSITE" => Ok(WorkMode::Onsite),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EmploymentType {
    FullTime,
    Internship,
}

impl EmploymentType {
    pub const VARIANTS: [&'static str; 2] = ["FULL_TIME", "INTERNSHIP"];

    pub fn as_str(&self) -> &'static str {
        match self {
            EmploymentType::FullTime => "FULL_TIME",
            EmploymentType::Internship => "INTERNSHIP",
        }
    }
}

impl FromStr for EmploymentType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "FULL_TIME" => Ok(EmploymentType::FullTime),
            "INTERNSHIP" => Ok(EmploymentType::Internship),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CompanySize {
    Sme,
    Startup,
    Mnc,
}

impl CompanySize {
    pub const VARIANTS: [&'static str; 3] = ["SME", "STARTUP", "MNC"];

    pub fn as_str(&self) -> &'static str {
        match self {
            CompanySize::Sme => "SME",
            CompanySize::Startup => "STARTUP",
            CompanySize::Mnc => "MNC",
        }
    }
}

impl FromStr for CompanySize {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SME" => Ok(CompanySize::Sme),
            "STARTUP" => Ok(CompanySize::Startup),
            "MNC" => Ok(CompanySize::Mnc),
            _ => Err(()),
        }
    }
}

/// Raw preference submission, exactly as the client sent it.
///
/// Everything is optional here; [`PreferenceDraft::normalize`] decides what
/// is missing, malformed, or contradictory and reports all of it at once.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PreferenceDraft {
    pub work_mode: Option<String>,
    pub employment_type: Option<String>,
    pub internship_duration_weeks: Option<i64>,
    pub location: Option<String>,
    pub company_size: Option<String>,
    pub stipend_min: Option<Decimal>,
    pub stipend_max: Option<Decimal>,
    pub stipend_currency: Option<String>,
    #[serde(default = "default_save_preference")]
    pub save_preference: bool,
}

fn default_save_preference() -> bool {
    true
}

/// Canonical, validated preference.
///
/// Immutable once snapshotted into a run. `location` is stored trimmed and
/// lowercased; matching uses case-insensitive containment so nothing is lost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preference {
    pub work_mode: WorkMode,
    pub employment_type: EmploymentType,
    pub internship_duration_weeks: Option<u32>,
    pub location: String,
    pub company_size: CompanySize,
    pub stipend_min: Option<Decimal>,
    pub stipend_max: Option<Decimal>,
    pub stipend_currency: String,
}

impl Preference {
    pub fn stipend_range(&self) -> Option<(Decimal, Decimal)> {
        match (self.stipend_min, self.stipend_max) {
            (Some(min), Some(max)) => Some((min, max)),
            _ => None,
        }
    }
}

impl PreferenceDraft {
    /// Validate and normalize into a canonical [`Preference`].
    ///
    /// Collects every violated field; callers get the complete error set in
    /// one response rather than the first failure.
    pub fn normalize(&self) -> Result<Preference, FieldErrors> {
        let mut errors = FieldErrors::new();

        let work_mode = require_choice::<WorkMode>(
            self.work_mode.as_deref(),
            "work_mode",
            &WorkMode::VARIANTS,
            &mut errors,
        );
        let employment_type = require_choice::<EmploymentType>(
            self.employment_type.as_deref(),
            "employment_type",
            &EmploymentType::VARIANTS,
            &mut errors,
        );
        let company_size = require_choice::<CompanySize>(
            self.company_size.as_deref(),
            "company_size",
            &CompanySize::VARIANTS,
            &mut errors,
        );

        let location = match self.location.as_deref().map(str::trim) {
            None | Some("") => {
                errors.push("location", "This field is required.");
                None
            }
            Some(loc) if loc.len() > MAX_LOCATION_LEN => {
                errors.push("location", format!("Max length is {MAX_LOCATION_LEN}."));
                None
            }
            Some(loc) => Some(loc.to_lowercase()),
        };

        let internship_duration_weeks = match self.internship_duration_weeks {
            Some(weeks) if weeks < 1 => {
                errors.push("internship_duration_weeks", "Must be at least 1.");
                None
            }
            Some(weeks) => Some(weeks as u32),
            None => None,
        };

        match employment_type {
            Some(EmploymentType::Internship) if internship_duration_weeks.is_none() => {
                errors.push(
                    "internship_duration_weeks",
                    "Required for internship employment type.",
                );
            }
            Some(EmploymentType::FullTime) if self.internship_duration_weeks.is_some() => {
                errors.push(
                    "internship_duration_weeks",
                    "Must be empty for full-time employment type.",
                );
            }
            _ => {}
        }

        if self.stipend_min.is_some() != self.stipend_max.is_some() {
            errors.push(
                "stipend",
                "Both stipend_min and stipend_max are required when stipend is provided.",
            );
        }
        if let (Some(min), Some(max)) = (self.stipend_min, self.stipend_max) {
            if min > max {
                errors.push(
                    "stipend_min",
                    "stipend_min must be less than or equal to stipend_max.",
                );
            }
        }

        let stipend_currency = match self.stipend_currency.as_deref().map(str::trim) {
            None | Some("") => DEFAULT_CURRENCY.to_string(),
            Some(cur) if cur.len() > MAX_CURRENCY_LEN => {
                errors.push("stipend_currency", format!("Max length is {MAX_CURRENCY_LEN}."));
                DEFAULT_CURRENCY.to_string()
            }
            Some(cur) => cur.to_string(),
        };

        let (Some(work_mode), Some(employment_type), Some(company_size), Some(location)) =
            (work_mode, employment_type, company_size, location)
        else {
            // Required fields missing; errors already carry the details.
            return Err(errors);
        };

        errors.into_result(Preference {
            work_mode,
            employment_type,
            internship_duration_weeks,
            location,
            company_size,
            stipend_min: self.stipend_min,
            stipend_max: self.stipend_max,
            stipend_currency,
        })
    }
}

fn require_choice<T: FromStr>(
    raw: Option<&str>,
    field: &str,
    variants: &[&str],
    errors: &mut FieldErrors,
) -> Option<T> {
    match raw {
        None | Some("") => {
            errors.push(field, "This field is required.");
            None
        }
        Some(value) => match value.parse::<T>() {
            Ok(parsed) => Some(parsed),
            Err(_) => {
                errors.push(field, format!("Must be one of: {}", variants.join(", ")));
                None
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_internship_draft() -> PreferenceDraft {
        PreferenceDraft {
            work_mode: Some("REMOTE".into()),
            employment_type: Some("INTERNSHIP".into()),
            internship_duration_weeks: Some(12),
            location: Some("  Bangalore  ".into()),
            company_size: Some("STARTUP".into()),
            stipend_min: None,
            stipend_max: None,
            stipend_currency: None,
            save_preference: true,
        }
    }

    #[test]
    fn normalizes_location_and_defaults_currency() {
        let pref = valid_internship_draft().normalize().unwrap();
        assert_eq!(pref.location, "bangalore");
        assert_eq!(pref.stipend_currency, "INR");
        assert_eq!(pref.internship_duration_weeks, Some(12));
    }

    #[test]
    fn reports_every_missing_field_at_once() {
        let errors = PreferenceDraft::default().normalize().unwrap_err();
        for field in ["work_mode", "employment_type", "location", "company_size"] {
            assert!(errors.contains(field), "missing error for {field}");
        }
    }

    #[test]
    fn rejects_unknown_choice_values() {
        let mut draft = valid_internship_draft();
        draft.work_mode = Some("HYBRID".into());
        let errors = draft.normalize().unwrap_err();
        assert!(errors.contains("work_mode"));
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn internship_requires_duration() {
        let mut draft = valid_internship_draft();
        draft.internship_duration_weeks = None;
        let errors = draft.normalize().unwrap_err();
        assert!(errors.contains("internship_duration_weeks"));
    }

    #[test]
    fn full_time_forbids_duration() {
        let mut draft = valid_internship_draft();
        draft.employment_type = Some("FULL_TIME".into());
        let errors = draft.normalize().unwrap_err();
        assert!(errors.contains("internship_duration_weeks"));
    }

    #[test]
    fn stipend_bounds_are_both_or_neither() {
        let mut draft = valid_internship_draft();
        draft.stipend_min = Some(Decimal::from(10_000));
        let errors = draft.normalize().unwrap_err();
        assert!(errors.contains("stipend"));
    }

    #[test]
    fn stipend_min_must_not_exceed_max() {
        let mut draft = valid_internship_draft();
        draft.stipend_min = Some(Decimal::from(20_000));
        draft.stipend_max = Some(Decimal::from(10_000));
        let errors = draft.normalize().unwrap_err();
        assert!(errors.contains("stipend_min"));
    }

    #[test]
    fn overlong_location_rejected() {
        let mut draft = valid_internship_draft();
        draft.location = Some("x".repeat(MAX_LOCATION_LEN + 1));
        let errors = draft.normalize().unwrap_err();
        assert!(errors.contains("location"));
    }
}
