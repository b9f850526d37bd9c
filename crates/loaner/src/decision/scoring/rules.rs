use serde::{Deserialize, Serialize};

use super::super::domain::FeatureRecord;
use super::ScoreAdjustment;

/// Additive adjustments applied on top of the base score.
///
/// Each rule reads the feature record directly, never another rule's outcome, so the
/// evaluation order has no effect on the total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreRule {
    EstablishedCreditHistory,
    HigherApplicantIncome,
    SupportingCoapplicantIncome,
    GraduateEducation,
    UrbanProperty,
    ExtendedLoanTerm,
    LargeHousehold,
    SelfEmployed,
    NoApplicantIncome,
    NoCoapplicantIncome,
    MissingCreditHistory,
}

impl ScoreRule {
    pub const ALL: [ScoreRule; 11] = [
        ScoreRule::EstablishedCreditHistory,
        ScoreRule::HigherApplicantIncome,
        ScoreRule::SupportingCoapplicantIncome,
        ScoreRule::GraduateEducation,
        ScoreRule::UrbanProperty,
        ScoreRule::ExtendedLoanTerm,
        ScoreRule::LargeHousehold,
        ScoreRule::SelfEmployed,
        ScoreRule::NoApplicantIncome,
        ScoreRule::NoCoapplicantIncome,
        ScoreRule::MissingCreditHistory,
    ];

    pub fn points(self) -> i16 {
        match self {
            ScoreRule::EstablishedCreditHistory => 100,
            ScoreRule::HigherApplicantIncome => 50,
            ScoreRule::SupportingCoapplicantIncome => 25,
            ScoreRule::GraduateEducation => 25,
            ScoreRule::UrbanProperty => 25,
            ScoreRule::ExtendedLoanTerm => -25,
            ScoreRule::LargeHousehold => -25,
            ScoreRule::SelfEmployed => -20,
            ScoreRule::NoApplicantIncome => -50,
            ScoreRule::NoCoapplicantIncome => -20,
            ScoreRule::MissingCreditHistory => -100,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ScoreRule::EstablishedCreditHistory => "credit history on file",
            ScoreRule::HigherApplicantIncome => "applicant income above 4000",
            ScoreRule::SupportingCoapplicantIncome => "coapplicant income above 2000",
            ScoreRule::GraduateEducation => "graduate education",
            ScoreRule::UrbanProperty => "urban property",
            ScoreRule::ExtendedLoanTerm => "loan term beyond 360 months",
            ScoreRule::LargeHousehold => "two or more dependents",
            ScoreRule::SelfEmployed => "self-employed",
            ScoreRule::NoApplicantIncome => "no applicant income",
            ScoreRule::NoCoapplicantIncome => "no coapplicant income",
            ScoreRule::MissingCreditHistory => "no credit history",
        }
    }

    pub(crate) fn applies(self, features: &FeatureRecord) -> bool {
        match self {
            ScoreRule::EstablishedCreditHistory => features.credit_history == 1,
            ScoreRule::HigherApplicantIncome => features.applicant_income > 4000,
            ScoreRule::SupportingCoapplicantIncome => features.coapplicant_income > 2000,
            ScoreRule::GraduateEducation => features.education.eq_ignore_ascii_case("graduate"),
            ScoreRule::UrbanProperty => features.property_area.eq_ignore_ascii_case("urban"),
            ScoreRule::ExtendedLoanTerm => features.loan_amount_term > 360,
            // String comparison: "2" and "3+" are penalized alike.
            ScoreRule::LargeHousehold => !matches!(features.dependents.as_str(), "0" | "1"),
            ScoreRule::SelfEmployed => features.self_employed.eq_ignore_ascii_case("yes"),
            ScoreRule::NoApplicantIncome => features.applicant_income == 0,
            ScoreRule::NoCoapplicantIncome => features.coapplicant_income == 0,
            ScoreRule::MissingCreditHistory => features.credit_history == 0,
        }
    }
}

pub(crate) fn fired_rules(features: &FeatureRecord) -> Vec<ScoreAdjustment> {
    ScoreRule::ALL
        .into_iter()
        .filter(|rule| rule.applies(features))
        .map(|rule| ScoreAdjustment {
            rule,
            points: rule.points(),
        })
        .collect()
}
