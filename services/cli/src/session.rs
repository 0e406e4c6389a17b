use crate::cli::RunArgs;
use easy_apply::browser::{Browser, WebDriverClient};
use easy_apply::config::{AppConfig, DataConfig, SearchParameters, Secrets};
use easy_apply::error::AppError;
use easy_apply::telemetry;
use easy_apply::workflows::apply::{
    ApplierSettings, AuthError, Authenticator, EasyApplier, EligibilityConfig, EligibilityFilter,
    FixedAnswerer, JsonOutcomeLog, OperatorConsole, QuestionAnswerStore, QuestionAnswerer,
    SessionOrchestrator, SessionReport, StdinOperator, Timings,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) async fn run(mut args: RunArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(root) = args.data_dir.take() {
        config.data = DataConfig::new(root);
    }
    if let Some(url) = args.webdriver_url.take() {
        config.webdriver.url = url;
    }

    telemetry::init(&config.telemetry)?;

    let mut params = SearchParameters::load(&config.data.search_config_path())?;
    if let Some(max_pages) = args.max_pages {
        params.max_pages = max_pages;
    }
    let resume = args.resume.take().or_else(|| params.uploads.resume.clone());
    if params.portal(&config.portal_name).is_none() {
        return Err(AuthError::UnknownPortal(config.portal_name.clone()).into());
    }

    let secrets = Secrets::load(&config.data.secrets_path())?;
    let answers = Arc::new(QuestionAnswerStore::load(&config.data.answers_path())?);
    let outcomes = Arc::new(JsonOutcomeLog::create(config.data.output_dir())?);

    let capabilities = WebDriverClient::chrome_capabilities(&config.webdriver.browser_args);
    let browser = Arc::new(WebDriverClient::connect(&config.webdriver.url, capabilities).await?);
    info!(
        ?config.environment,
        session = browser.session_id(),
        portal = %config.portal_name,
        "browser session started"
    );

    let result = apply(
        browser.clone(),
        &config,
        &params,
        secrets,
        answers,
        outcomes,
        resume,
    )
    .await;

    if let Err(err) = browser.quit().await {
        warn!(error = %err, "failed to close browser session");
    }

    let report = result?;
    print_report(&report, &config.data);
    Ok(())
}

async fn apply(
    browser: Arc<WebDriverClient>,
    config: &AppConfig,
    params: &SearchParameters,
    secrets: Secrets,
    answers: Arc<QuestionAnswerStore>,
    outcomes: Arc<JsonOutcomeLog>,
    resume: Option<PathBuf>,
) -> Result<SessionReport, AppError> {
    let timings = Timings::default();
    let operator: Arc<dyn OperatorConsole> = Arc::new(StdinOperator::new());

    let authenticator = Authenticator::new(
        browser.clone(),
        params.job_portals.clone(),
        secrets,
        operator.clone(),
        timings.clone(),
    );
    if !authenticator.start(&config.portal_name).await? {
        return Err(AppError::LoginFailed(config.portal_name.clone()));
    }

    let answerer: Arc<dyn QuestionAnswerer> =
        Arc::new(FixedAnswerer::new(config.default_answer.clone()));
    let settings = ApplierSettings {
        resume_path: resume,
        timings: timings.clone(),
        ..ApplierSettings::default()
    };
    let applier = EasyApplier::new(browser.clone(), answers, answerer, settings);
    let filter = EligibilityFilter::new(EligibilityConfig::from_parameters(params));

    let mut orchestrator =
        SessionOrchestrator::new(browser, outcomes, filter, applier, operator, timings);
    Ok(orchestrator.start_applying(params).await?)
}

fn print_report(report: &SessionReport, data: &DataConfig) {
    let elapsed = report.finished_at - report.started_at;
    println!("Easy Apply session finished");
    println!(
        "  Started {} and ran for {} minutes",
        report.started_at.format("%Y-%m-%d %H:%M UTC"),
        elapsed.num_minutes()
    );
    println!(
        "  Searches: {}  Result pages: {}",
        report.searches, report.pages
    );
    println!(
        "  Applied: {}  Failed: {}  Skipped: {}",
        report.applied, report.failed, report.skipped
    );
    println!("  Outcome logs: {}", data.output_dir().display());
}
