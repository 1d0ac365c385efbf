//! Job corpus record.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use talentmatch_core::JobId;

use crate::preference::{CompanySize, EmploymentType, WorkMode};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApplyType {
    EasyApply,
    External,
}

/// A posting in the job corpus.
///
/// Read-only during filtering: runs never mutate catalog data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPosting {
    pub id: JobId,
    /// External listing reference (source system identifier).
    pub listing_ref: String,
    pub title: String,
    pub company_name: String,
    pub location: String,
    pub work_mode: WorkMode,
    pub employment_type: EmploymentType,
    pub internship_duration_weeks: Option<u32>,
    pub company_size: CompanySize,
    pub stipend_min: Option<Decimal>,
    pub stipend_max: Option<Decimal>,
    pub stipend_currency: String,
    pub job_url: String,
    pub apply_url: Option<String>,
    pub apply_type: Option<ApplyType>,
    pub description: String,
    pub published_at: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}
