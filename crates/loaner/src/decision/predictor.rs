use serde::{Deserialize, Serialize};

use super::domain::FeatureRecord;

/// Binary label produced by the eligibility classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EligibilityPrediction {
    Ineligible,
    Eligible,
}

impl EligibilityPrediction {
    pub fn from_label(label: i64) -> Result<Self, PredictorError> {
        match label {
            0 => Ok(Self::Ineligible),
            1 => Ok(Self::Eligible),
            other => Err(PredictorError::InvalidOutput(format!(
                "classifier returned label {other}, expected 0 or 1"
            ))),
        }
    }

    pub fn label(self) -> u8 {
        match self {
            Self::Ineligible => 0,
            Self::Eligible => 1,
        }
    }

    pub fn is_eligible(self) -> bool {
        matches!(self, Self::Eligible)
    }
}

/// Non-negative loan amount suggested by the regressor.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct AmountPrediction(f64);

impl AmountPrediction {
    /// Negative regressor output floors at zero; NaN and infinities are rejected.
    pub fn new(value: f64) -> Result<Self, PredictorError> {
        if !value.is_finite() {
            return Err(PredictorError::InvalidOutput(format!(
                "regressor returned non-finite amount {value}"
            )));
        }
        Ok(Self(if value <= 0.0 { 0.0 } else { value }))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

/// Offline-trained classifier consumed as an opaque capability.
pub trait EligibilityPredictor: Send + Sync {
    fn predict(&self, features: &FeatureRecord) -> Result<EligibilityPrediction, PredictorError>;
}

/// Offline-trained regressor consumed as an opaque capability.
pub trait AmountPredictor: Send + Sync {
    fn predict(&self, features: &FeatureRecord) -> Result<AmountPrediction, PredictorError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PredictorError {
    #[error("predictor unavailable: {0}")]
    Unavailable(String),
    #[error("predictor returned an invalid result: {0}")]
    InvalidOutput(String),
}
