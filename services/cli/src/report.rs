use clap::Args;
use easy_apply::config::{AppConfig, DataConfig};
use easy_apply::error::AppError;
use easy_apply::workflows::apply::{export_csv, summarize, JsonOutcomeLog, OutcomeSummary};
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

#[derive(Args, Debug, Default)]
pub(crate) struct ReportArgs {
    /// Folder holding the output logs (defaults to the configured data folder)
    #[arg(long)]
    pub(crate) data_dir: Option<PathBuf>,
    /// Write every recorded outcome to this CSV file
    #[arg(long)]
    pub(crate) csv: Option<PathBuf>,
    /// Number of companies to list, ordered by successful applications
    #[arg(long, default_value_t = 10)]
    pub(crate) top: usize,
}

pub(crate) fn run_report(args: ReportArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;
    if let Some(root) = args.data_dir {
        config.data = DataConfig::new(root);
    }

    let log = JsonOutcomeLog::new(config.data.output_dir());
    let summary = summarize(&log)?;
    render_summary(&log, &summary, args.top);

    if let Some(path) = args.csv {
        let file = File::create(&path)?;
        let written = export_csv(&log, BufWriter::new(file))?;
        println!("\nExported {written} records to {}", path.display());
    }

    Ok(())
}

fn render_summary(log: &JsonOutcomeLog, summary: &OutcomeSummary, top: usize) {
    println!("Outcome report for {}", log.directory().display());
    if summary.total() == 0 {
        println!("  No outcomes recorded yet");
        return;
    }

    for (class, count) in &summary.counts {
        println!("  {class:<8} {count}");
    }
    println!("  {:<8} {}", "total", summary.total());

    if summary.companies.is_empty() {
        return;
    }
    let mut companies: Vec<(&String, &usize)> = summary.companies.iter().collect();
    companies.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));

    println!("\nCompanies applied to:");
    for (company, count) in companies.into_iter().take(top) {
        println!("  {company}: {count}");
    }
}
