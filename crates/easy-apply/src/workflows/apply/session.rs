use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;
use thiserror::Error;

use crate::browser::{Browser, BrowserError};
use crate::config::SearchParameters;

use super::applier::{ApplyError, EasyApplier, FailureDisposition};
use super::domain::{Job, OutcomeClass, OutcomeRecord};
use super::eligibility::{EligibilityDecision, EligibilityFilter};
use super::operator::OperatorConsole;
use super::outcomes::{OutcomeLog, OutcomeLogError};
use super::pacing::{wait_between_pages, Timings};
use super::search::{extract_jobs, load_results_page, SearchError, SearchUrlBuilder};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Outcome(#[from] OutcomeLogError),
    #[error(transparent)]
    Browser(#[from] BrowserError),
    #[error(transparent)]
    Search(#[from] SearchError),
    #[error(transparent)]
    Apply(#[from] ApplyError),
}

impl SessionError {
    /// Errors that end the whole session rather than the current page.
    pub fn is_fatal(&self) -> bool {
        match self {
            SessionError::Outcome(_) => true,
            SessionError::Browser(err) => err.is_fatal(),
            SessionError::Search(err) => err.is_fatal(),
            SessionError::Apply(err) => err.disposition() == FailureDisposition::AbortSession,
        }
    }
}

/// Per-session bookkeeping owned by the orchestrator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub seen_jobs: HashSet<String>,
    pub applied: u32,
    pub failed: u32,
    pub skipped: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub searches: u32,
    pub pages: u32,
    pub applied: u32,
    pub failed: u32,
    pub skipped: u32,
}

/// Walks every (position, location) search, screens each parsed job, and
/// records exactly one outcome per processed tile.
pub struct SessionOrchestrator<B: ?Sized, L: ?Sized> {
    browser: Arc<B>,
    outcomes: Arc<L>,
    filter: EligibilityFilter,
    applier: EasyApplier<B>,
    operator: Arc<dyn OperatorConsole>,
    timings: Timings,
    state: SessionState,
    rng: StdRng,
}

impl<B, L> SessionOrchestrator<B, L>
where
    B: Browser + ?Sized,
    L: OutcomeLog + ?Sized,
{
    pub fn new(
        browser: Arc<B>,
        outcomes: Arc<L>,
        filter: EligibilityFilter,
        applier: EasyApplier<B>,
        operator: Arc<dyn OperatorConsole>,
        timings: Timings,
    ) -> Self {
        Self {
            browser,
            outcomes,
            filter,
            applier,
            operator,
            timings,
            state: SessionState::default(),
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub async fn start_applying(
        &mut self,
        params: &SearchParameters,
    ) -> Result<SessionReport, SessionError> {
        let started_at = Utc::now();
        let urls = SearchUrlBuilder::from_parameters(params);

        let mut searches: Vec<(String, String)> = params
            .positions
            .iter()
            .filter(|position| !position.trim().is_empty())
            .flat_map(|position| {
                params
                    .locations
                    .iter()
                    .filter(|location| !location.trim().is_empty())
                    .map(move |location| (position.clone(), location.clone()))
            })
            .collect();
        searches.shuffle(&mut self.rng);
        tracing::info!(searches = searches.len(), max_pages = params.max_pages, "starting application session");

        let mut searches_run = 0;
        let mut pages = 0;
        for (position, location) in &searches {
            searches_run += 1;
            tracing::info!(%position, %location, "starting search");

            for page in 0..params.max_pages {
                match self.run_page(&urls, position, location, page).await {
                    Ok(0) => {
                        tracing::info!(%position, %location, page, "no jobs found, ending search");
                        break;
                    }
                    Ok(count) => {
                        pages += 1;
                        tracing::debug!(page, jobs = count, "finished page");
                    }
                    Err(err) if err.is_fatal() => {
                        tracing::error!(%position, %location, page, error = %err, "session aborted");
                        return Err(err);
                    }
                    Err(err) => {
                        tracing::error!(%position, %location, page, error = %err, "page failed, moving to next search");
                        break;
                    }
                }

                if page + 1 < params.max_pages {
                    wait_between_pages(&*self.operator, &self.timings, &mut self.rng).await;
                }
            }
        }

        let report = SessionReport {
            started_at,
            finished_at: Utc::now(),
            searches: searches_run,
            pages,
            applied: self.state.applied,
            failed: self.state.failed,
            skipped: self.state.skipped,
        };
        tracing::info!(
            applied = report.applied,
            failed = report.failed,
            skipped = report.skipped,
            "finished applying to all jobs"
        );
        Ok(report)
    }

    async fn run_page(
        &mut self,
        urls: &SearchUrlBuilder,
        position: &str,
        location: &str,
        page: u32,
    ) -> Result<usize, SessionError> {
        let url = urls.page_url(position, location, page);
        load_results_page(&*self.browser, &url, &self.timings, &mut self.rng).await?;
        let jobs = extract_jobs(&*self.browser).await?;

        let count = jobs.len();
        for job in jobs {
            self.apply_job(job).await?;
        }
        Ok(count)
    }

    /// Screens, applies, and records one job. Only session-fatal errors escape.
    pub async fn apply_job(&mut self, mut job: Job) -> Result<(), SessionError> {
        tracing::debug!(job = %job, "considering job");
        if !self.is_job_suitable(&job)? {
            return Ok(());
        }

        match self.applier.apply(&mut job).await {
            Ok(()) => {
                self.record(OutcomeClass::Success, &job)?;
                self.state.applied += 1;
            }
            Err(err) if err.disposition() == FailureDisposition::AbortSession => {
                return Err(err.into());
            }
            Err(err) => {
                tracing::error!(job = %job, error = %err, "failed to apply");
                self.record(OutcomeClass::Failed, &job)?;
                self.state.failed += 1;
            }
        }
        Ok(())
    }

    /// Runs the eligibility checks and writes the skipped record on rejection.
    pub fn is_job_suitable(&mut self, job: &Job) -> Result<bool, SessionError> {
        let decision = self
            .filter
            .evaluate(job, &self.state.seen_jobs, &*self.outcomes)?;
        self.state.seen_jobs.insert(job.link().to_string());

        match decision {
            EligibilityDecision::Eligible => Ok(true),
            EligibilityDecision::Skip(reason) => {
                tracing::info!(job = %job, reason = %reason.summary(), "skipping job");
                self.record(OutcomeClass::Skipped, job)?;
                self.state.skipped += 1;
                Ok(false)
            }
        }
    }

    fn record(&self, class: OutcomeClass, job: &Job) -> Result<(), SessionError> {
        self.outcomes
            .append(class, &OutcomeRecord::from_job(job))
            .map_err(SessionError::from)
    }
}
