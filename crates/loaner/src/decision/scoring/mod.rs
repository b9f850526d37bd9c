//! Synthetic credit score (CIBIL-style) derived from applicant attributes alone.

mod rules;

pub use rules::ScoreRule;

use std::fmt;

use serde::{Deserialize, Serialize};

use super::domain::{ApplicantProfile, FeatureRecord, ProfileDefaults};

/// Credit score clamped to `MIN..=MAX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CreditScore(u16);

impl CreditScore {
    pub const MIN: u16 = 300;
    pub const MAX: u16 = 900;
    pub const BASE: i32 = 600;

    pub fn from_raw(raw: i32) -> Self {
        let clamped = raw.clamp(i32::from(Self::MIN), i32::from(Self::MAX));
        Self(clamped as u16)
    }

    pub fn value(self) -> u16 {
        self.0
    }

    pub fn meets(self, threshold: u16) -> bool {
        self.0 >= threshold
    }
}

impl fmt::Display for CreditScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One fired rule and the points it contributed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreAdjustment {
    pub rule: ScoreRule,
    pub points: i16,
}

/// Score together with the adjustments that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreBreakdown {
    pub base: i32,
    pub adjustments: Vec<ScoreAdjustment>,
    pub unclamped: i32,
    pub score: CreditScore,
}

impl ScoreBreakdown {
    pub fn summary(&self) -> String {
        if self.adjustments.is_empty() {
            return format!("base {} with no adjustments", self.base);
        }

        let parts = self
            .adjustments
            .iter()
            .map(|adjustment| format!("{:+} {}", adjustment.points, adjustment.rule.label()))
            .collect::<Vec<_>>()
            .join(", ");
        format!("base {}: {}", self.base, parts)
    }
}

/// Pure estimator; the defaults table decides what omitted fields count as.
#[derive(Debug, Clone, Default)]
pub struct CreditScoreEstimator {
    defaults: ProfileDefaults,
}

impl CreditScoreEstimator {
    pub fn new(defaults: ProfileDefaults) -> Self {
        Self { defaults }
    }

    pub fn defaults(&self) -> &ProfileDefaults {
        &self.defaults
    }

    pub fn estimate(&self, profile: &ApplicantProfile) -> CreditScore {
        self.breakdown(profile).score
    }

    pub fn breakdown(&self, profile: &ApplicantProfile) -> ScoreBreakdown {
        Self::score_features(&profile.features(&self.defaults))
    }

    pub fn score_features(features: &FeatureRecord) -> ScoreBreakdown {
        let adjustments = rules::fired_rules(features);
        let unclamped = CreditScore::BASE
            + adjustments
                .iter()
                .map(|adjustment| i32::from(adjustment.points))
                .sum::<i32>();

        ScoreBreakdown {
            base: CreditScore::BASE,
            adjustments,
            unclamped,
            score: CreditScore::from_raw(unclamped),
        }
    }
}
