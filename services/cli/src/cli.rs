use crate::report::{run_report, ReportArgs};
use crate::session;
use clap::{Args, Parser, Subcommand};
use easy_apply::error::AppError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "easy-apply",
    about = "Search job portals and submit Easy Apply applications from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log in and apply to every matching job (default command)
    Run(RunArgs),
    /// Summarise recorded outcomes and optionally export them as CSV
    Report(ReportArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct RunArgs {
    /// Folder holding config.yaml, secrets.yaml, answers.json and the output logs
    #[arg(long)]
    pub(crate) data_dir: Option<PathBuf>,
    /// Resume to upload instead of the one named in config.yaml
    #[arg(long)]
    pub(crate) resume: Option<PathBuf>,
    /// Override max_pages from config.yaml
    #[arg(long)]
    pub(crate) max_pages: Option<u32>,
    /// Override the configured WebDriver endpoint
    #[arg(long)]
    pub(crate) webdriver_url: Option<String>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Run(RunArgs::default()));

    match command {
        Command::Run(args) => session::run(args).await,
        Command::Report(args) => run_report(args),
    }
}
