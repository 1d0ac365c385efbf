//! Pass/fail eligibility check applied before candidate scoring.

use serde::{Deserialize, Serialize};

use crate::candidate::CandidateProfile;
use crate::preference::{PlatformCriterion, RecruiterPreference};

/// One criterion evaluated against the candidate's extracted signals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionComparison {
    pub criterion: PlatformCriterion,
    pub matched: bool,
    pub found_value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HardFilterOutcome {
    pub passes_hard_filter: bool,
    pub filter_reasons: Vec<String>,
}

/// Evaluate every coding-platform criterion.
///
/// A criterion with no matching signal is a miss, not an error.
pub fn evaluate_criteria(
    preference: &RecruiterPreference,
    candidate: &CandidateProfile,
) -> Vec<CriterionComparison> {
    preference
        .coding_platform_criteria
        .iter()
        .map(|criterion| match candidate.signal(&criterion.platform, &criterion.metric) {
            Some(signal) => CriterionComparison {
                criterion: criterion.clone(),
                matched: criterion.operator.holds(signal.value, criterion.value),
                found_value: Some(signal.value),
            },
            None => CriterionComparison {
                criterion: criterion.clone(),
                matched: false,
                found_value: None,
            },
        })
        .collect()
}

/// Apply the recruiter's eligibility criteria.
///
/// Never fails on missing candidate data: an unknown tier or absent
/// experience counts as a failed criterion with an explanatory reason.
pub fn hard_filter(
    preference: &RecruiterPreference,
    candidate: &CandidateProfile,
    comparisons: &[CriterionComparison],
) -> HardFilterOutcome {
    let mut reasons = Vec::new();
    let mut passes = true;

    match candidate.college_tier {
        Some(tier) if preference.allows_tier(tier) => {}
        Some(tier) => {
            passes = false;
            reasons.push(format!("College tier mismatch: {}", tier.as_str()));
        }
        None => {
            passes = false;
            reasons.push("College tier mismatch: UNKNOWN".to_string());
        }
    }

    match candidate.experience_years {
        Some(years) if preference.experience_in_range(years) => {}
        Some(_) => {
            passes = false;
            reasons.push("Experience outside preferred range".to_string());
        }
        None => {
            passes = false;
            reasons.push("Experience not provided".to_string());
        }
    }

    for comparison in comparisons {
        if comparison.matched {
            continue;
        }
        passes = false;
        let rule = &comparison.criterion;
        match comparison.found_value {
            Some(found) => reasons.push(format!(
                "Coding criteria mismatch: {} {} is {found}, requires {} {}",
                rule.platform,
                rule.metric,
                rule.operator.as_str(),
                rule.value,
            )),
            None => reasons.push(format!(
                "Coding criteria mismatch: no {} {} signal found",
                rule.platform, rule.metric,
            )),
        }
    }

    HardFilterOutcome {
        passes_hard_filter: passes,
        filter_reasons: reasons,
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use talentmatch_core::{CandidateId, RequisitionId};

    use super::*;
    use crate::candidate::PlatformSignal;
    use crate::preference::{CollegeTier, ComparisonOp};

    fn preference() -> RecruiterPreference {
        RecruiterPreference {
            requisition_id: RequisitionId::new(),
            college_tiers: vec![CollegeTier::Tier1, CollegeTier::Tier2],
            min_experience_years: 0.0,
            max_experience_years: 2.0,
            number_of_openings: 2,
            coding_platform_criteria: vec![PlatformCriterion {
                platform: "codeforces".to_string(),
                metric: "rating".to_string(),
                operator: ComparisonOp::Gte,
                value: 1400.0,
            }],
        }
    }

    fn candidate() -> CandidateProfile {
        CandidateProfile {
            id: CandidateId::new(),
            requisition_id: RequisitionId::new(),
            name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
            college_tier: Some(CollegeTier::Tier1),
            experience_years: Some(1.0),
            platform_signals: vec![PlatformSignal {
                platform: "codeforces".to_string(),
                metric: "rating".to_string(),
                value: 1500.0,
            }],
            skills_text: String::new(),
            projects_text: String::new(),
            created_at: Utc::now(),
        }
    }

    fn run(preference: &RecruiterPreference, candidate: &CandidateProfile) -> HardFilterOutcome {
        let comparisons = evaluate_criteria(preference, candidate);
        hard_filter(preference, candidate, &comparisons)
    }

    #[test]
    fn eligible_candidate_passes_with_no_reasons() {
        let outcome = run(&preference(), &candidate());
        assert!(outcome.passes_hard_filter);
        assert!(outcome.filter_reasons.is_empty());
    }

    #[test]
    fn disallowed_tier_fails() {
        let mut c = candidate();
        c.college_tier = Some(CollegeTier::Tier3);
        let outcome = run(&preference(), &c);
        assert!(!outcome.passes_hard_filter);
        assert!(outcome.filter_reasons[0].contains("College tier mismatch: TIER_3"));
    }

    #[test]
    fn unknown_tier_fails_with_reason_not_error() {
        let mut c = candidate();
        c.college_tier = None;
        let outcome = run(&preference(), &c);
        assert!(!outcome.passes_hard_filter);
        assert!(outcome.filter_reasons[0].contains("UNKNOWN"));
    }

    #[test]
    fn experience_outside_range_fails() {
        let mut c = candidate();
        c.experience_years = Some(5.0);
        let outcome = run(&preference(), &c);
        assert!(!outcome.passes_hard_filter);
        assert!(outcome
            .filter_reasons
            .iter()
            .any(|r| r.contains("Experience outside preferred range")));
    }

    #[test]
    fn missing_experience_fails_with_reason() {
        let mut c = candidate();
        c.experience_years = None;
        let outcome = run(&preference(), &c);
        assert!(!outcome.passes_hard_filter);
        assert!(outcome
            .filter_reasons
            .iter()
            .any(|r| r.contains("Experience not provided")));
    }

    #[test]
    fn missing_signal_counts_as_failed_criterion() {
        let mut c = candidate();
        c.platform_signals.clear();
        let outcome = run(&preference(), &c);
        assert!(!outcome.passes_hard_filter);
        assert!(outcome
            .filter_reasons
            .iter()
            .any(|r| r.contains("no codeforces rating signal found")));
    }

    #[test]
    fn operator_semantics() {
        assert!(ComparisonOp::Gte.holds(1500.0, 1400.0));
        assert!(!ComparisonOp::Gte.holds(1399.0, 1400.0));
        assert!(ComparisonOp::Lte.holds(10.0, 100.0));
        assert!(!ComparisonOp::Lte.holds(101.0, 100.0));
        assert!(ComparisonOp::Eq.holds(5.0, 5.0));
        assert!(!ComparisonOp::Eq.holds(5.1, 5.0));
    }

    #[test]
    fn below_threshold_reports_found_value() {
        let mut c = candidate();
        c.platform_signals[0].value = 1200.0;
        let outcome = run(&preference(), &c);
        assert!(!outcome.passes_hard_filter);
        assert!(outcome.filter_reasons.iter().any(|r| r.contains("1200")));
    }
}
