//! Deterministic filter pipeline over the job corpus.
//!
//! Pure function of (corpus, preference): no clock, no I/O, stable ordering.
//! Stage counts are recorded after every stage so a run's metrics fully
//! explain how the corpus narrowed.

use serde::{Deserialize, Serialize};

use crate::job::JobPosting;
use crate::preference::{EmploymentType, Preference};

/// Hard cap on jobs handed to the scoring stage.
pub const MAX_AGENT_JOBS: usize = 300;

/// Per-stage survivor counts.
///
/// Counts are monotonically non-increasing in stage order; a stage that does
/// not apply (non-internship duration filter, absent stipend range) records
/// the previous stage's count.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterMetrics {
    pub initial_count: usize,
    pub after_primary_filters: usize,
    pub after_internship_duration: usize,
    pub after_stipend_overlap: usize,
    pub ordered_count: usize,
    pub capped_count: usize,
}

#[derive(Debug, Clone)]
pub struct FilterOutcome {
    pub jobs: Vec<JobPosting>,
    pub metrics: FilterMetrics,
}

/// Apply the ordered filter stages and return the capped, ranked survivors.
pub fn filter_jobs(corpus: &[JobPosting], preference: &Preference, cap: usize) -> FilterOutcome {
    let mut metrics = FilterMetrics {
        initial_count: corpus.len(),
        ..FilterMetrics::default()
    };

    let mut jobs: Vec<&JobPosting> = corpus
        .iter()
        .filter(|job| {
            job.work_mode == preference.work_mode
                && job.employment_type == preference.employment_type
                && job.company_size == preference.company_size
                && job.location.to_lowercase().contains(&preference.location)
        })
        .collect();
    metrics.after_primary_filters = jobs.len();

    if preference.employment_type == EmploymentType::Internship {
        jobs.retain(|job| job.internship_duration_weeks == preference.internship_duration_weeks);
    }
    metrics.after_internship_duration = jobs.len();

    if let Some((pref_min, pref_max)) = preference.stipend_range() {
        jobs.retain(|job| match (job.stipend_min, job.stipend_max) {
            (Some(job_min), Some(job_max)) => {
                job.stipend_currency == preference.stipend_currency
                    && job_max >= pref_min
                    && job_min <= pref_max
            }
            _ => false,
        });
    }
    metrics.after_stipend_overlap = jobs.len();

    // Stable sort: equal publish dates keep created_at ordering; jobs with no
    // publish date sort last.
    jobs.sort_by(|a, b| {
        b.published_at
            .cmp(&a.published_at)
            .then(b.created_at.cmp(&a.created_at))
    });
    metrics.ordered_count = jobs.len();

    jobs.truncate(cap);
    metrics.capped_count = jobs.len();

    FilterOutcome {
        jobs: jobs.into_iter().cloned().collect(),
        metrics,
    }
}
