//! Recruiter-imported candidate records and the requisition they target.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use talentmatch_core::{CandidateId, RequisitionId};

use crate::preference::CollegeTier;

/// A recruiter's job opening that candidates are ranked against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Requisition {
    pub id: RequisitionId,
    pub job_description: String,
    pub created_at: DateTime<Utc>,
}

/// A coding-platform metric reading extracted from a candidate's profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformSignal {
    pub platform: String,
    pub metric: String,
    pub value: f64,
}

/// Structured candidate attributes used by the hard filter and scoring.
///
/// Fields may be missing when upstream extraction could not recover them;
/// the hard filter treats missing required data as failed criteria, never as
/// an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateProfile {
    pub id: CandidateId,
    pub requisition_id: RequisitionId,
    pub name: String,
    pub email: String,
    pub college_tier: Option<CollegeTier>,
    pub experience_years: Option<f64>,
    pub platform_signals: Vec<PlatformSignal>,
    pub skills_text: String,
    pub projects_text: String,
    pub created_at: DateTime<Utc>,
}

impl CandidateProfile {
    pub fn signal(&self, platform: &str, metric: &str) -> Option<&PlatformSignal> {
        self.platform_signals
            .iter()
            .find(|s| s.platform.eq_ignore_ascii_case(platform) && s.metric.eq_ignore_ascii_case(metric))
    }
}
