use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::domain::{
    ApplicantProfile, LoanApplication, LoanRequest, ProfileDefaults, ValidationError,
};
use super::offers::{select_offers, LoanOffer, OfferCatalog};
use super::predictor::{
    AmountPrediction, AmountPredictor, EligibilityPrediction, EligibilityPredictor,
    PredictorError,
};
use super::scoring::{CreditScore, CreditScoreEstimator, ScoreBreakdown};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecisionReason {
    Approved,
    Rejected,
}

/// Outcome of one assessment. `eligible` holds only when the classifier approves and the
/// credit score clears the policy threshold.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Decision {
    pub eligible: bool,
    pub reason: DecisionReason,
    pub score: CreditScore,
    pub predicted_amount: AmountPrediction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecisionPolicy {
    pub approval_threshold: u16,
    pub max_offers: usize,
}

impl Default for DecisionPolicy {
    fn default() -> Self {
        Self {
            approval_threshold: 650,
            max_offers: 5,
        }
    }
}

impl DecisionPolicy {
    /// The score acts as a veto: a model approval below the threshold is still rejected.
    pub fn fuse(&self, prediction: EligibilityPrediction, score: CreditScore) -> DecisionReason {
        if prediction.is_eligible() && score.meets(self.approval_threshold) {
            DecisionReason::Approved
        } else {
            DecisionReason::Rejected
        }
    }
}

/// Decision plus the offers attached to it.
#[derive(Debug, Clone, PartialEq)]
pub struct Assessment {
    pub decision: Decision,
    pub loan_type: String,
    pub offers: Vec<LoanOffer>,
}

impl Assessment {
    pub fn into_response(self) -> AssessmentResponse {
        AssessmentResponse {
            cibil_score: self.decision.score.value(),
            predicted_amount: self.decision.predicted_amount.value(),
            eligible: self.decision.eligible,
            reason: self.decision.reason,
            loans: self.offers,
        }
    }
}

/// Wire shape returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentResponse {
    pub cibil_score: u16,
    pub predicted_amount: f64,
    pub eligible: bool,
    pub reason: DecisionReason,
    pub loans: Vec<LoanOffer>,
}

#[derive(Debug, thiserror::Error)]
pub enum DecisionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Predictor(#[from] PredictorError),
    #[error("assessment did not complete within {} ms", .0.as_millis())]
    Timeout(Duration),
}

/// Fuses both predictors with the credit-score heuristic and attaches catalog offers.
pub struct DecisionEngine {
    eligibility: Arc<dyn EligibilityPredictor>,
    amount: Arc<dyn AmountPredictor>,
    catalog: Arc<dyn OfferCatalog>,
    estimator: CreditScoreEstimator,
    policy: DecisionPolicy,
}

impl DecisionEngine {
    pub fn new(
        eligibility: Arc<dyn EligibilityPredictor>,
        amount: Arc<dyn AmountPredictor>,
        catalog: Arc<dyn OfferCatalog>,
    ) -> Self {
        Self {
            eligibility,
            amount,
            catalog,
            estimator: CreditScoreEstimator::default(),
            policy: DecisionPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: DecisionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_defaults(mut self, defaults: ProfileDefaults) -> Self {
        self.estimator = CreditScoreEstimator::new(defaults);
        self
    }

    pub fn policy(&self) -> DecisionPolicy {
        self.policy
    }

    pub fn estimator(&self) -> &CreditScoreEstimator {
        &self.estimator
    }

    pub fn catalog(&self) -> &dyn OfferCatalog {
        self.catalog.as_ref()
    }

    /// Run both predictors concurrently on the same feature record and fuse the result.
    ///
    /// Either prediction failing aborts the decision; no partial result is produced.
    pub async fn decide(&self, profile: &ApplicantProfile) -> Result<Decision, DecisionError> {
        let features = Arc::new(profile.features(self.estimator.defaults()));

        let eligibility = Arc::clone(&self.eligibility);
        let eligibility_features = Arc::clone(&features);
        let amount = Arc::clone(&self.amount);
        let amount_features = Arc::clone(&features);

        let (prediction, predicted_amount) = tokio::try_join!(
            run_blocking(move || eligibility.predict(&eligibility_features)),
            run_blocking(move || amount.predict(&amount_features))
        )
        .inspect_err(|err| warn!(error = %err, "prediction failed"))?;

        let breakdown = CreditScoreEstimator::score_features(&features);
        debug!(score = %breakdown.score, detail = %breakdown.summary(), "credit score estimated");

        let reason = self.policy.fuse(prediction, breakdown.score);
        Ok(Decision {
            eligible: reason == DecisionReason::Approved,
            reason,
            score: breakdown.score,
            predicted_amount,
        })
    }

    pub fn select_offers(&self, loan_type: &str, eligible: bool) -> Vec<LoanOffer> {
        select_offers(
            self.catalog.as_ref(),
            loan_type,
            eligible,
            self.policy.max_offers,
        )
    }

    pub fn explain(&self, profile: &ApplicantProfile) -> ScoreBreakdown {
        self.estimator.breakdown(profile)
    }

    /// Validate the raw payload, decide, and attach offers.
    pub async fn assess(&self, application: LoanApplication) -> Result<Assessment, DecisionError> {
        let request = application.validate()?;
        self.assess_request(request).await
    }

    pub async fn assess_request(&self, request: LoanRequest) -> Result<Assessment, DecisionError> {
        let LoanRequest {
            profile,
            loan_type,
            desired_loan_amount,
        } = request;

        let decision = self.decide(&profile).await?;
        let offers = self.select_offers(&loan_type, decision.eligible);

        info!(
            score = decision.score.value(),
            eligible = decision.eligible,
            predicted_amount = decision.predicted_amount.value(),
            desired_loan_amount,
            loan_type = %loan_type,
            offers = offers.len(),
            "loan assessment completed"
        );

        Ok(Assessment {
            decision,
            loan_type,
            offers,
        })
    }

    /// [`assess`](Self::assess) bounded by `timeout`; running out of time fails closed.
    pub async fn assess_within(
        &self,
        application: LoanApplication,
        timeout: Duration,
    ) -> Result<Assessment, DecisionError> {
        match tokio::time::timeout(timeout, self.assess(application)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(timeout_ms = timeout.as_millis() as u64, "loan assessment timed out");
                Err(DecisionError::Timeout(timeout))
            }
        }
    }
}

async fn run_blocking<T, F>(job: F) -> Result<T, PredictorError>
where
    F: FnOnce() -> Result<T, PredictorError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(job)
        .await
        .map_err(|err| PredictorError::Unavailable(format!("prediction task failed: {err}")))?
}
