use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use loaner::decision::{
    catalog_status, CsvOfferCatalog, DecisionEngine, DecisionReason, EligibilityPrediction,
    EligibilityPredictor, LinearAmountModel, LoanApplication, LogisticEligibilityModel,
    OfferCatalog, ProfileDefaults, UnavailablePredictor,
};
use serde_json::json;

fn workspace_file(relative: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../..")
        .join(relative)
}

fn shipped_engine() -> DecisionEngine {
    let eligibility = LogisticEligibilityModel::load(workspace_file("models/eligibility_model.json"))
        .expect("eligibility artifact loads");
    let amount = LinearAmountModel::load(workspace_file("models/amount_model.json"))
        .expect("amount artifact loads");
    let catalog = CsvOfferCatalog::open(workspace_file("data/loan_interest_rates.csv"));

    DecisionEngine::new(Arc::new(eligibility), Arc::new(amount), Arc::new(catalog))
}

fn application(value: serde_json::Value) -> LoanApplication {
    serde_json::from_value(value).expect("payload deserializes")
}

#[tokio::test]
async fn established_applicant_is_approved_with_home_loan_offers() {
    let engine = shipped_engine();

    let response = engine
        .assess(application(json!({
            "Gender": "Male",
            "Married": "Yes",
            "Dependents": "0",
            "Education": "Graduate",
            "Self_Employed": "No",
            "ApplicantIncome": 5000,
            "CoapplicantIncome": 3000,
            "Loan_Amount_Term": 360,
            "Credit_History": 1,
            "Property_Area": "Urban",
            "DesiredLoanAmount": 150000,
            "LoanType": "Home Loan",
        })))
        .await
        .expect("assessment succeeds")
        .into_response();

    assert_eq!(response.cibil_score, 825);
    assert!(response.eligible);
    assert_eq!(response.reason, DecisionReason::Approved);
    assert!((response.predicted_amount - 156.5).abs() < 1e-6);
    assert_eq!(response.loans.len(), 5);
    assert_eq!(response.loans[0].bank_name, "State Bank of India");
    assert!(response
        .loans
        .iter()
        .all(|offer| offer.loan_type == "Home Loan"));
}

#[tokio::test]
async fn model_approval_below_threshold_is_vetoed() {
    let engine = shipped_engine();
    let payload = json!({
        "Married": "Yes",
        "Dependents": "3+",
        "Education": "Not Graduate",
        "Self_Employed": "Yes",
        "ApplicantIncome": 3500,
        "CoapplicantIncome": 0,
        "Loan_Amount_Term": 480,
        "Credit_History": 1,
        "Property_Area": "Semiurban",
    });

    let request = application(payload.clone())
        .validate()
        .expect("payload validates");
    let features = request.profile.features(&ProfileDefaults::default());
    let classifier = LogisticEligibilityModel::load(workspace_file("models/eligibility_model.json"))
        .expect("eligibility artifact loads");
    assert_eq!(
        classifier.predict(&features),
        Ok(EligibilityPrediction::Eligible),
        "the classifier alone approves this applicant"
    );

    let assessment = engine
        .assess(application(payload))
        .await
        .expect("assessment succeeds");

    assert_eq!(assessment.decision.score.value(), 610);
    assert!(!assessment.decision.eligible);
    assert_eq!(assessment.decision.reason, DecisionReason::Rejected);
    assert!(assessment.offers.is_empty());
}

#[tokio::test]
async fn empty_application_is_rejected_on_defaults() {
    let response = shipped_engine()
        .assess_within(LoanApplication::default(), Duration::from_secs(5))
        .await
        .expect("assessment succeeds")
        .into_response();

    assert_eq!(response.cibil_score, 430);
    assert!(!response.eligible);
    assert!((response.predicted_amount - 67.0).abs() < 1e-6);
    assert!(response.loans.is_empty());
}

#[tokio::test]
async fn missing_artifact_fails_requests_not_startup() {
    let catalog = CsvOfferCatalog::open(workspace_file("data/loan_interest_rates.csv"));
    let engine = DecisionEngine::new(
        Arc::new(UnavailablePredictor::new("eligibility model not loaded")),
        Arc::new(UnavailablePredictor::new("amount model not loaded")),
        Arc::new(catalog),
    );

    let error = engine
        .assess(LoanApplication::default())
        .await
        .expect_err("predictions unavailable");
    assert!(error.to_string().contains("not loaded"));
}

#[test]
fn shipped_catalog_lists_every_loan_type() {
    let catalog = CsvOfferCatalog::open(workspace_file("data/loan_interest_rates.csv"));
    let snapshot = catalog.snapshot().expect("catalog loads");
    assert_eq!(snapshot.offers.len(), 14);

    let status = catalog_status(&catalog);
    assert!(status.available);
    assert_eq!(
        status.loan_types,
        vec!["Home Loan", "Car Loan", "Personal Loan"]
    );
}
