use crate::infra::{build_engine, open_catalog};
use chrono::SecondsFormat;
use clap::Args;
use loaner::config::AppConfig;
use loaner::decision::{
    filter_offers, Assessment, LoanApplication, LoanOffer, OfferCatalog, ScoreBreakdown,
};
use loaner::error::AppError;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub(crate) struct AssessArgs {
    /// JSON file holding the applicant fields (same keys as the HTTP payload)
    #[arg(long)]
    pub(crate) profile: PathBuf,
    /// Override the LoanType named in the profile
    #[arg(long)]
    pub(crate) loan_type: Option<String>,
    /// Print the credit-score rule breakdown
    #[arg(long)]
    pub(crate) explain: bool,
    /// Emit the HTTP response payload instead of a text summary
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct OffersArgs {
    /// Loan type to match (case-insensitive, partial)
    #[arg(long, default_value = loaner::decision::DEFAULT_LOAN_TYPE)]
    pub(crate) loan_type: String,
    /// Maximum number of offers to print (defaults to the configured limit)
    #[arg(long)]
    pub(crate) limit: Option<usize>,
}

pub(crate) async fn run_assess(args: AssessArgs) -> Result<(), AppError> {
    let AssessArgs {
        profile,
        loan_type,
        explain,
        json,
    } = args;

    let config = AppConfig::load()?;
    let raw = std::fs::read_to_string(&profile)?;
    let mut application: LoanApplication = serde_json::from_str(&raw)?;
    if let Some(loan_type) = loan_type {
        application.loan_type = Some(loan_type.as_str().into());
    }

    let engine = build_engine(&config, open_catalog(&config.catalog));
    let request = application
        .validate()
        .map_err(loaner::decision::DecisionError::from)?;
    let breakdown = engine.explain(&request.profile);
    let assessment = engine.assess_request(request).await?;

    if json {
        let payload = serde_json::to_string_pretty(&assessment.into_response())?;
        println!("{payload}");
        return Ok(());
    }

    render_assessment(&assessment, explain.then_some(&breakdown));
    Ok(())
}

pub(crate) fn run_offers(args: OffersArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let catalog = open_catalog(&config.catalog);
    let limit = args.limit.unwrap_or(config.decision.max_offers);

    let snapshot = match catalog.snapshot() {
        Ok(snapshot) => snapshot,
        Err(err) => {
            println!("Offer catalog unavailable: {err}");
            return Ok(());
        }
    };

    println!(
        "Offer catalog {} (loaded {})",
        catalog.path().display(),
        snapshot
            .loaded_at
            .to_rfc3339_opts(SecondsFormat::Secs, true)
    );
    let offers = filter_offers(&snapshot.offers, &args.loan_type, limit);
    if offers.is_empty() {
        println!("No offers match '{}'.", args.loan_type);
        return Ok(());
    }
    render_offers(&offers);
    Ok(())
}

fn render_assessment(assessment: &Assessment, breakdown: Option<&ScoreBreakdown>) {
    let decision = &assessment.decision;
    println!("Loan assessment");
    println!("  Credit score: {}", decision.score);
    println!(
        "  Decision: {:?} (eligible: {})",
        decision.reason, decision.eligible
    );
    println!(
        "  Predicted amount: {:.2}",
        decision.predicted_amount.value()
    );

    if let Some(breakdown) = breakdown {
        println!("  Score breakdown: {}", breakdown.summary());
        if breakdown.unclamped != i32::from(breakdown.score.value()) {
            println!("    (clamped from {})", breakdown.unclamped);
        }
    }

    if assessment.offers.is_empty() {
        if decision.eligible {
            println!("  No catalog offers match '{}'.", assessment.loan_type);
        }
        return;
    }

    println!("  Offers for '{}':", assessment.loan_type);
    render_offers(&assessment.offers);
}

fn render_offers(offers: &[LoanOffer]) {
    for offer in offers {
        println!(
            "    - {:<22} {:<18} {} ({})",
            offer.bank_name, offer.interest_rate, offer.loan_type, offer.source_link
        );
    }
}
