use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::response::Response;
use serde_json::Value;

use crate::decision::domain::{ApplicantProfile, FeatureRecord};
use crate::decision::engine::{DecisionEngine, DecisionPolicy};
use crate::decision::offers::{LoanOffer, OfferCatalog, StaticOfferCatalog};
use crate::decision::predictor::{
    AmountPrediction, AmountPredictor, EligibilityPrediction, EligibilityPredictor,
    PredictorError,
};

/// Classifier double returning a fixed label and counting calls.
pub(super) struct FixedClassifier {
    pub(super) approve: bool,
    pub(super) calls: AtomicUsize,
}

impl FixedClassifier {
    pub(super) fn approving() -> Self {
        Self {
            approve: true,
            calls: AtomicUsize::new(0),
        }
    }

    pub(super) fn rejecting() -> Self {
        Self {
            approve: false,
            calls: AtomicUsize::new(0),
        }
    }
}

impl EligibilityPredictor for FixedClassifier {
    fn predict(&self, _features: &FeatureRecord) -> Result<EligibilityPrediction, PredictorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        EligibilityPrediction::from_label(i64::from(self.approve))
    }
}

/// Regressor double echoing a fraction of the applicant income.
pub(super) struct IncomeShareRegressor;

impl AmountPredictor for IncomeShareRegressor {
    fn predict(&self, features: &FeatureRecord) -> Result<AmountPrediction, PredictorError> {
        AmountPrediction::new(features.applicant_income as f64 * 0.03)
    }
}

pub(super) struct BrokenPredictor;

impl EligibilityPredictor for BrokenPredictor {
    fn predict(&self, _features: &FeatureRecord) -> Result<EligibilityPrediction, PredictorError> {
        Err(PredictorError::Unavailable(
            "eligibility model artifact missing".to_string(),
        ))
    }
}

impl AmountPredictor for BrokenPredictor {
    fn predict(&self, _features: &FeatureRecord) -> Result<AmountPrediction, PredictorError> {
        Err(PredictorError::Unavailable(
            "amount model artifact missing".to_string(),
        ))
    }
}

/// Regressor that blocks long enough to trip boundary timeouts.
pub(super) struct StalledRegressor(pub(super) Duration);

impl AmountPredictor for StalledRegressor {
    fn predict(&self, _features: &FeatureRecord) -> Result<AmountPrediction, PredictorError> {
        std::thread::sleep(self.0);
        AmountPrediction::new(100.0)
    }
}

pub(super) fn offer(loan_type: &str, bank: &str, rate: &str) -> LoanOffer {
    LoanOffer {
        loan_type: loan_type.to_string(),
        bank_name: bank.to_string(),
        interest_rate: rate.to_string(),
        source_link: format!(
            "https://www.bankbazaar.com/{}-interest-rate.html",
            loan_type.to_lowercase().replace(' ', "-")
        ),
    }
}

pub(super) fn market_offers() -> Vec<LoanOffer> {
    vec![
        offer("Home Loan", "SBI", "8.50% - 9.85%"),
        offer("Car Loan", "HDFC Bank", "9.40% onwards"),
        offer("Home Loan", "HDFC Bank", "8.75% - 9.65%"),
        offer("Home Loan", "ICICI Bank", "8.75% - 9.80%"),
        offer("Personal Loan", "Axis Bank", "10.49% onwards"),
        offer("Home Loan", "Axis Bank", "8.75% - 9.15%"),
        offer("Home Loan", "Kotak Mahindra Bank", "8.75% onwards"),
        offer("Home Loan", "Bank of Baroda", "8.40% - 10.60%"),
        offer("Car Loan", "SBI", "9.20% - 10.15%"),
    ]
}

pub(super) fn market_catalog() -> Arc<dyn OfferCatalog> {
    Arc::new(StaticOfferCatalog::new(market_offers()))
}

/// Profile scoring 825: every bonus, no penalty.
pub(super) fn strong_profile() -> ApplicantProfile {
    ApplicantProfile {
        gender: Some("Female".to_string()),
        married: Some("Yes".to_string()),
        dependents: Some("0".to_string()),
        education: Some("Graduate".to_string()),
        self_employed: Some("No".to_string()),
        applicant_income: Some(5000),
        coapplicant_income: Some(3000),
        loan_amount_term: Some(360),
        credit_history: Some(1),
        property_area: Some("Urban".to_string()),
    }
}

/// Profile scoring 610: credit history on file, dragged down by every other factor.
pub(super) fn thin_profile() -> ApplicantProfile {
    ApplicantProfile {
        applicant_income: Some(3500),
        coapplicant_income: Some(0),
        credit_history: Some(1),
        dependents: Some("3+".to_string()),
        self_employed: Some("Yes".to_string()),
        loan_amount_term: Some(480),
        property_area: Some("Rural".to_string()),
        education: Some("Not Graduate".to_string()),
        ..ApplicantProfile::default()
    }
}

pub(super) fn engine_with(
    classifier: Arc<dyn EligibilityPredictor>,
    regressor: Arc<dyn AmountPredictor>,
    catalog: Arc<dyn OfferCatalog>,
) -> DecisionEngine {
    DecisionEngine::new(classifier, regressor, catalog).with_policy(DecisionPolicy::default())
}

pub(super) fn approving_engine() -> DecisionEngine {
    engine_with(
        Arc::new(FixedClassifier::approving()),
        Arc::new(IncomeShareRegressor),
        market_catalog(),
    )
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 16 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
