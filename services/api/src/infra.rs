use loaner::config::{AppConfig, CatalogConfig, ModelConfig};
use loaner::decision::{
    AmountPredictor, CsvOfferCatalog, DecisionEngine, EligibilityPredictor, LinearAmountModel,
    LogisticEligibilityModel, UnavailablePredictor,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) struct Predictors {
    pub(crate) eligibility: Arc<dyn EligibilityPredictor>,
    pub(crate) amount: Arc<dyn AmountPredictor>,
}

/// Load both artifacts. A missing or broken artifact is logged and replaced with a predictor
/// that fails every request, so the process still starts.
pub(crate) fn load_predictors(config: &ModelConfig) -> Predictors {
    let eligibility: Arc<dyn EligibilityPredictor> =
        match LogisticEligibilityModel::load(&config.eligibility_path) {
            Ok(model) => {
                info!(path = %config.eligibility_path.display(), "eligibility model loaded");
                Arc::new(model)
            }
            Err(err) => {
                error!(error = %err, "eligibility model unavailable");
                Arc::new(UnavailablePredictor::new(format!(
                    "eligibility model not loaded: {err}"
                )))
            }
        };

    let amount: Arc<dyn AmountPredictor> = match LinearAmountModel::load(&config.amount_path) {
        Ok(model) => {
            info!(path = %config.amount_path.display(), "amount model loaded");
            Arc::new(model)
        }
        Err(err) => {
            error!(error = %err, "amount model unavailable");
            Arc::new(UnavailablePredictor::new(format!(
                "amount model not loaded: {err}"
            )))
        }
    };

    Predictors {
        eligibility,
        amount,
    }
}

pub(crate) fn open_catalog(config: &CatalogConfig) -> Arc<CsvOfferCatalog> {
    Arc::new(CsvOfferCatalog::open(&config.path))
}

pub(crate) fn build_engine(config: &AppConfig, catalog: Arc<CsvOfferCatalog>) -> DecisionEngine {
    let Predictors {
        eligibility,
        amount,
    } = load_predictors(&config.models);
    DecisionEngine::new(eligibility, amount, catalog).with_policy(config.decision.policy())
}
