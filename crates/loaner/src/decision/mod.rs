//! Loan decision fusion: a trained eligibility classifier and amount regressor combined with
//! a deterministic credit-score heuristic, followed by an eligibility-gated offer lookup.

pub mod domain;
pub mod engine;
pub mod models;
pub mod offers;
pub mod predictor;
pub mod router;
pub mod scoring;

#[cfg(test)]
mod tests;

pub use domain::{
    ApplicantProfile, FeatureRecord, FieldValue, LoanApplication, LoanRequest, ProfileDefaults,
    ValidationError, DEFAULT_LOAN_TYPE,
};
pub use engine::{
    Assessment, AssessmentResponse, Decision, DecisionEngine, DecisionError, DecisionPolicy,
    DecisionReason,
};
pub use models::{
    LinearAmountModel, LogisticEligibilityModel, ModelArtifact, ModelError, UnavailablePredictor,
};
pub use offers::{
    catalog_status, filter_offers, select_offers, CatalogError, CatalogSnapshot, CatalogStatus,
    CsvOfferCatalog, LoanOffer, OfferCatalog, StaticOfferCatalog,
};
pub use predictor::{
    AmountPrediction, AmountPredictor, EligibilityPrediction, EligibilityPredictor,
    PredictorError,
};
pub use router::decision_router;
pub use scoring::{CreditScore, CreditScoreEstimator, ScoreAdjustment, ScoreBreakdown, ScoreRule};
