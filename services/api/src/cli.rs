use crate::assess::{run_assess, run_offers, AssessArgs, OffersArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use loaner::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Loan Decision Engine",
    about = "Serve or run loan eligibility assessments from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Assess one applicant profile read from a JSON file
    Assess(AssessArgs),
    /// List catalog offers matching a loan type
    Offers(OffersArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Assess(args) => run_assess(args).await,
        Command::Offers(args) => run_offers(args),
    }
}
