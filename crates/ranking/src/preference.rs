//! Recruiter eligibility preference for a job requisition.

use core::str::FromStr;

use serde::{Deserialize, Serialize};

use talentmatch_core::{FieldErrors, RequisitionId};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CollegeTier {
    Tier1,
    Tier2,
    Tier3,
}

impl CollegeTier {
    pub const VARIANTS: [&'static str; 3] = ["TIER_1", "TIER_2", "TIER_3"];

    pub fn as_str(&self) -> &'static str {
        match self {
            CollegeTier::Tier1 => "TIER_1",
            CollegeTier::Tier2 => "TIER_2",
            CollegeTier::Tier3 => "TIER_3",
        }
    }
}

impl FromStr for CollegeTier {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TIER_1" => Ok(CollegeTier::Tier1),
            "TIER_2" => Ok(CollegeTier::Tier2),
            "TIER_3" => Ok(CollegeTier::Tier3),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComparisonOp {
    Gte,
    Lte,
    Eq,
}

impl ComparisonOp {
    pub const VARIANTS: [&'static str; 3] = ["gte", "lte", "eq"];

    pub fn as_str(&self) -> &'static str {
        match self {
            ComparisonOp::Gte => "gte",
            ComparisonOp::Lte => "lte",
            ComparisonOp::Eq => "eq",
        }
    }

    pub fn holds(&self, found: f64, target: f64) -> bool {
        match self {
            ComparisonOp::Gte => found >= target,
            ComparisonOp::Lte => found <= target,
            ComparisonOp::Eq => found == target,
        }
    }
}

impl FromStr for ComparisonOp {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gte" => Ok(ComparisonOp::Gte),
            "lte" => Ok(ComparisonOp::Lte),
            "eq" => Ok(ComparisonOp::Eq),
            _ => Err(()),
        }
    }
}

/// A single coding-platform requirement, e.g. codeforces rating >= 1400.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformCriterion {
    pub platform: String,
    pub metric: String,
    pub operator: ComparisonOp,
    pub value: f64,
}

/// Validated per-requisition eligibility criteria.
///
/// Required precondition for any ranking run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecruiterPreference {
    pub requisition_id: RequisitionId,
    pub college_tiers: Vec<CollegeTier>,
    pub min_experience_years: f64,
    pub max_experience_years: f64,
    pub number_of_openings: u32,
    pub coding_platform_criteria: Vec<PlatformCriterion>,
}

impl RecruiterPreference {
    pub fn allows_tier(&self, tier: CollegeTier) -> bool {
        self.college_tiers.contains(&tier)
    }

    pub fn experience_in_range(&self, years: f64) -> bool {
        years >= self.min_experience_years && years <= self.max_experience_years
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CriterionDraft {
    pub platform: Option<String>,
    pub metric: Option<String>,
    pub operator: Option<String>,
    pub value: Option<f64>,
}

/// Raw upsert payload for a recruiter preference.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecruiterPreferenceDraft {
    #[serde(default)]
    pub college_tiers: Vec<String>,
    pub min_experience_years: Option<f64>,
    pub max_experience_years: Option<f64>,
    pub number_of_openings: Option<i64>,
    #[serde(default)]
    pub coding_platform_criteria: Vec<CriterionDraft>,
}

impl RecruiterPreferenceDraft {
    /// Validate into a canonical [`RecruiterPreference`], collecting every
    /// violation. Duplicate tiers are removed, first occurrence wins.
    pub fn validate(
        &self,
        requisition_id: RequisitionId,
    ) -> Result<RecruiterPreference, FieldErrors> {
        let mut errors = FieldErrors::new();

        let mut college_tiers: Vec<CollegeTier> = Vec::new();
        if self.college_tiers.is_empty() {
            errors.push("college_tiers", "At least one college tier is required.");
        }
        for raw in &self.college_tiers {
            match raw.parse::<CollegeTier>() {
                Ok(tier) => {
                    if !college_tiers.contains(&tier) {
                        college_tiers.push(tier);
                    }
                }
                Err(_) => {
                    errors.push(
                        "college_tiers",
                        format!("Must be one of: {}", CollegeTier::VARIANTS.join(", ")),
                    );
                }
            }
        }

        let min_experience = match self.min_experience_years {
            None => {
                errors.push("min_experience_years", "This field is required.");
                None
            }
            Some(min) if !min.is_finite() || min < 0.0 => {
                errors.push("min_experience_years", "Must be at least 0.");
                None
            }
            Some(min) => Some(min),
        };
        let max_experience = match self.max_experience_years {
            None => {
                errors.push("max_experience_years", "This field is required.");
                None
            }
            Some(max) if !max.is_finite() || max < 0.0 => {
                errors.push("max_experience_years", "Must be at least 0.");
                None
            }
            Some(max) => Some(max),
        };
        if let (Some(min), Some(max)) = (min_experience, max_experience) {
            if max < min {
                errors.push(
                    "max_experience_years",
                    "Must be greater than or equal to min_experience_years.",
                );
            }
        }

        let number_of_openings = match self.number_of_openings {
            None => {
                errors.push("number_of_openings", "This field is required.");
                None
            }
            Some(n) if n < 1 => {
                errors.push("number_of_openings", "Must be at least 1.");
                None
            }
            Some(n) => Some(n as u32),
        };

        let mut criteria = Vec::with_capacity(self.coding_platform_criteria.len());
        for (idx, draft) in self.coding_platform_criteria.iter().enumerate() {
            let field = format!("coding_platform_criteria[{idx}]");
            let platform = draft
                .platform
                .as_deref()
                .map(str::trim)
                .filter(|p| !p.is_empty());
            let metric = draft
                .metric
                .as_deref()
                .map(str::trim)
                .filter(|m| !m.is_empty());
            let operator = draft
                .operator
                .as_deref()
                .and_then(|op| op.trim().to_lowercase().parse::<ComparisonOp>().ok());
            let value = draft.value.filter(|v| v.is_finite());

            match (platform, metric, operator, value) {
                (Some(platform), Some(metric), Some(operator), Some(value)) => {
                    criteria.push(PlatformCriterion {
                        platform: platform.to_lowercase(),
                        metric: metric.to_lowercase(),
                        operator,
                        value,
                    });
                }
                _ => {
                    errors.push(
                        field,
                        format!(
                            "Each criterion requires platform, metric, operator ({}) and a numeric value.",
                            ComparisonOp::VARIANTS.join("/")
                        ),
                    );
                }
            }
        }

        let (Some(min_experience_years), Some(max_experience_years), Some(number_of_openings)) =
            (min_experience, max_experience, number_of_openings)
        else {
            return Err(errors);
        };

        errors.into_result(RecruiterPreference {
            requisition_id,
            college_tiers,
            min_experience_years,
            max_experience_years,
            number_of_openings,
            coding_platform_criteria: criteria,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_draft() -> RecruiterPreferenceDraft {
        RecruiterPreferenceDraft {
            college_tiers: vec!["TIER_1".into(), "TIER_2".into()],
            min_experience_years: Some(0.0),
            max_experience_years: Some(2.0),
            number_of_openings: Some(2),
            coding_platform_criteria: vec![CriterionDraft {
                platform: Some("codeforces".into()),
                metric: Some("rating".into()),
                operator: Some("gte".into()),
                value: Some(1400.0),
            }],
        }
    }

    #[test]
    fn valid_draft_passes() {
        let pref = valid_draft().validate(RequisitionId::new()).unwrap();
        assert_eq!(pref.college_tiers, vec![CollegeTier::Tier1, CollegeTier::Tier2]);
        assert_eq!(pref.coding_platform_criteria.len(), 1);
        assert_eq!(pref.number_of_openings, 2);
    }

    #[test]
    fn empty_tiers_rejected() {
        let mut draft = valid_draft();
        draft.college_tiers.clear();
        let errors = draft.validate(RequisitionId::new()).unwrap_err();
        assert!(errors.contains("college_tiers"));
    }

    #[test]
    fn unknown_tier_rejected() {
        let mut draft = valid_draft();
        draft.college_tiers = vec!["TIER_4".into()];
        let errors = draft.validate(RequisitionId::new()).unwrap_err();
        assert!(errors.contains("college_tiers"));
    }

    #[test]
    fn duplicate_tiers_deduplicated() {
        let mut draft = valid_draft();
        draft.college_tiers = vec!["TIER_2".into(), "TIER_1".into(), "TIER_2".into()];
        let pref = draft.validate(RequisitionId::new()).unwrap();
        assert_eq!(pref.college_tiers, vec![CollegeTier::Tier2, CollegeTier::Tier1]);
    }

    #[test]
    fn inverted_experience_range_rejected() {
        let mut draft = valid_draft();
        draft.min_experience_years = Some(3.0);
        draft.max_experience_years = Some(2.0);
        let errors = draft.validate(RequisitionId::new()).unwrap_err();
        assert!(errors.contains("max_experience_years"));
    }

    #[test]
    fn zero_openings_rejected() {
        let mut draft = valid_draft();
        draft.number_of_openings = Some(0);
        let errors = draft.validate(RequisitionId::new()).unwrap_err();
        assert!(errors.contains("number_of_openings"));
    }

    #[test]
    fn malformed_criterion_rejected() {
        let mut draft = valid_draft();
        draft.coding_platform_criteria = vec![CriterionDraft {
            platform: Some("codeforces".into()),
            ..CriterionDraft::default()
        }];
        let errors = draft.validate(RequisitionId::new()).unwrap_err();
        assert!(errors.contains("coding_platform_criteria[0]"));
    }

    #[test]
    fn unknown_operator_rejected() {
        let mut draft = valid_draft();
        draft.coding_platform_criteria[0].operator = Some("gt".into());
        let errors = draft.validate(RequisitionId::new()).unwrap_err();
        assert!(errors.contains("coding_platform_criteria[0]"));
    }
}
