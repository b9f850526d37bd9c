//! Market loan offers: the catalog abstraction and the eligibility-gated selection over it.

mod csv_catalog;

pub use csv_catalog::{parse_offers, read_catalog, CsvOfferCatalog};

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// One row of the rates table. Rows are never modified, only filtered and truncated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanOffer {
    #[serde(rename = "Loan Type")]
    pub loan_type: String,
    #[serde(rename = "Bank")]
    pub bank_name: String,
    #[serde(rename = "Interest Rate")]
    pub interest_rate: String,
    #[serde(rename = "Link")]
    pub source_link: String,
}

impl LoanOffer {
    /// Case-insensitive substring match; rows without a loan type never match.
    pub fn matches_loan_type(&self, query: &str) -> bool {
        let loan_type = self.loan_type.trim();
        if loan_type.is_empty() {
            return false;
        }
        loan_type.to_lowercase().contains(&query.to_lowercase())
    }
}

/// Point-in-time copy of the catalog.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogSnapshot {
    pub offers: Vec<LoanOffer>,
    pub loaded_at: DateTime<Utc>,
}

impl CatalogSnapshot {
    pub fn new(offers: Vec<LoanOffer>) -> Self {
        Self {
            offers,
            loaded_at: Utc::now(),
        }
    }

    /// Distinct loan types in first-seen order.
    pub fn loan_types(&self) -> Vec<String> {
        let mut seen: Vec<String> = Vec::new();
        for offer in &self.offers {
            let loan_type = offer.loan_type.trim();
            if !loan_type.is_empty() && !seen.iter().any(|known| known == loan_type) {
                seen.push(loan_type.to_string());
            }
        }
        seen
    }
}

/// Read access to the externally maintained rates table.
pub trait OfferCatalog: Send + Sync {
    fn snapshot(&self) -> Result<Arc<CatalogSnapshot>, CatalogError>;
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("offer catalog not found at {}", .0.display())]
    Missing(PathBuf),
    #[error("failed to read offer catalog {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed offer catalog: {0}")]
    Malformed(#[from] csv::Error),
    #[error("offer catalog is missing the '{0}' column")]
    MissingColumn(&'static str),
    #[error("offer catalog has not been loaded")]
    NotLoaded,
}

/// Matching offers in catalog order, at most `limit` of them.
pub fn filter_offers(offers: &[LoanOffer], loan_type: &str, limit: usize) -> Vec<LoanOffer> {
    offers
        .iter()
        .filter(|offer| offer.matches_loan_type(loan_type))
        .take(limit)
        .cloned()
        .collect()
}

/// Offers for an assessed applicant. Ineligible applicants get none; an unavailable catalog
/// degrades to an empty list instead of failing the decision.
pub fn select_offers(
    catalog: &dyn OfferCatalog,
    loan_type: &str,
    eligible: bool,
    limit: usize,
) -> Vec<LoanOffer> {
    if !eligible {
        return Vec::new();
    }

    match catalog.snapshot() {
        Ok(snapshot) => filter_offers(&snapshot.offers, loan_type, limit),
        Err(err) => {
            warn!(error = %err, loan_type, "offer catalog unavailable; returning no offers");
            Vec::new()
        }
    }
}

/// Summary exposed by the catalog status endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogStatus {
    pub available: bool,
    pub offers: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loaded_at: Option<DateTime<Utc>>,
    pub loan_types: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

pub fn catalog_status(catalog: &dyn OfferCatalog) -> CatalogStatus {
    match catalog.snapshot() {
        Ok(snapshot) => CatalogStatus {
            available: true,
            offers: snapshot.offers.len(),
            loaded_at: Some(snapshot.loaded_at),
            loan_types: snapshot.loan_types(),
            detail: None,
        },
        Err(err) => CatalogStatus {
            available: false,
            offers: 0,
            loaded_at: None,
            loan_types: Vec::new(),
            detail: Some(err.to_string()),
        },
    }
}

/// Fixed in-memory catalog, or an absent one.
#[derive(Debug, Clone, Default)]
pub struct StaticOfferCatalog {
    snapshot: Option<Arc<CatalogSnapshot>>,
}

impl StaticOfferCatalog {
    pub fn new(offers: Vec<LoanOffer>) -> Self {
        Self {
            snapshot: Some(Arc::new(CatalogSnapshot::new(offers))),
        }
    }

    pub fn unavailable() -> Self {
        Self { snapshot: None }
    }
}

impl OfferCatalog for StaticOfferCatalog {
    fn snapshot(&self) -> Result<Arc<CatalogSnapshot>, CatalogError> {
        self.snapshot.clone().ok_or(CatalogError::NotLoaded)
    }
}
