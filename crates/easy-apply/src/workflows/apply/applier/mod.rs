//! Easy Apply form driver.
//!
//! One call to [`EasyApplier::apply`] walks a job's wizard from navigation to
//! submission. Each attempt restarts from the job page; failures are
//! classified into a [`FailureDisposition`] that decides whether another
//! attempt is worth making.

mod fields;
mod locator;

pub use fields::{choose_dropdown_index, classify, FieldKind};

use std::path::PathBuf;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use thiserror::Error;

use crate::browser::{
    click_or_script, find_first, find_first_in, wait_for_element, Browser, BrowserError,
    ElementHandle, Locator,
};

use super::answers::{AnswerError, QuestionAnswerStore, QuestionAnswerer};
use super::domain::Job;
use super::pacing::{pause, settle, Timings};
use super::selectors::{
    DESCRIPTION_TEXT, FORM_CONTAINER, FORM_SECTION, HIRING_TEAM_HEADING, INLINE_ERROR,
    MODAL_CONFIRM, MODAL_DISMISS, PREMIUM_URL_FRAGMENT, PRIMARY_ACTION, QUESTION_LABEL,
    RECRUITER_PROFILE_LINK, SEE_MORE_DESCRIPTION, SUBMIT_LABEL, UNFOLLOW_TOGGLE,
};

#[derive(Debug, Clone)]
pub struct ApplierSettings {
    pub resume_path: Option<PathBuf>,
    pub max_attempts: u32,
    pub premium_return_attempts: u32,
    pub max_form_steps: u32,
    pub timings: Timings,
}

impl Default for ApplierSettings {
    fn default() -> Self {
        Self {
            resume_path: None,
            max_attempts: 3,
            premium_return_attempts: 3,
            max_form_steps: 20,
            timings: Timings::default(),
        }
    }
}

/// Where the current attempt is in the wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyState {
    Idle,
    Navigated,
    EasyApplyLocated,
    EasyApplyClicked,
    Filling { step: u32 },
    Next,
    Submitted,
    Done,
    Aborted,
}

/// What the caller should do with a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureDisposition {
    Retry,
    AbortJob,
    AbortSession,
}

#[derive(Debug, Error)]
pub enum ApplyError {
    #[error("no clickable easy apply button found")]
    NoApplyButton,
    #[error("form rejected the answers: {}", .0.join("; "))]
    FormErrors(Vec<String>),
    #[error("stuck on the premium upsell page after {attempts} attempts to return")]
    PremiumRedirect { attempts: u32 },
    #[error("job description not found")]
    MissingDescription,
    #[error("{0} control not found")]
    MissingControl(&'static str),
    #[error("form did not reach submit within {0} steps")]
    TooManySteps(u32),
    #[error(transparent)]
    Browser(#[from] BrowserError),
    #[error(transparent)]
    Answerer(#[from] AnswerError),
}

impl ApplyError {
    pub fn disposition(&self) -> FailureDisposition {
        match self {
            ApplyError::Browser(err) if err.is_fatal() => FailureDisposition::AbortSession,
            ApplyError::PremiumRedirect { .. } => FailureDisposition::AbortJob,
            _ => FailureDisposition::Retry,
        }
    }
}

pub struct EasyApplier<B: ?Sized> {
    browser: Arc<B>,
    answers: Arc<QuestionAnswerStore>,
    answerer: Arc<dyn QuestionAnswerer>,
    settings: ApplierSettings,
    rng: StdRng,
    state: ApplyState,
}

impl<B> EasyApplier<B>
where
    B: Browser + ?Sized,
{
    pub fn new(
        browser: Arc<B>,
        answers: Arc<QuestionAnswerStore>,
        answerer: Arc<dyn QuestionAnswerer>,
        settings: ApplierSettings,
    ) -> Self {
        Self {
            browser,
            answers,
            answerer,
            settings,
            rng: StdRng::from_entropy(),
            state: ApplyState::Idle,
        }
    }

    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    pub fn state(&self) -> ApplyState {
        self.state
    }

    /// Applies to `job`, retrying retryable failures up to `max_attempts`.
    pub async fn apply(&mut self, job: &mut Job) -> Result<(), ApplyError> {
        let max_attempts = self.settings.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.attempt(job).await {
                Ok(()) => {
                    tracing::info!(job = %job, attempt, "application submitted");
                    return Ok(());
                }
                Err(err) => {
                    let disposition = err.disposition();
                    tracing::error!(job = %job, attempt, ?disposition, error = %err, "application attempt failed");
                    if disposition != FailureDisposition::Retry || attempt >= max_attempts {
                        return Err(err);
                    }
                    attempt += 1;
                    pause(self.settings.timings.retry_backoff, &mut self.rng).await;
                }
            }
        }
    }

    async fn attempt(&mut self, job: &mut Job) -> Result<(), ApplyError> {
        self.state = ApplyState::Idle;
        match self.run_wizard(job).await {
            Ok(()) => {
                self.transition(ApplyState::Done, job);
                Ok(())
            }
            Err(err) => {
                self.transition(ApplyState::Aborted, job);
                if err.disposition() != FailureDisposition::AbortSession {
                    self.discard().await;
                }
                Err(err)
            }
        }
    }

    async fn run_wizard(&mut self, job: &mut Job) -> Result<(), ApplyError> {
        self.browser.goto(job.link()).await?;
        self.transition(ApplyState::Navigated, job);
        pause(self.settings.timings.after_navigation, &mut self.rng).await;
        self.ensure_not_premium(job).await?;

        if let Err(err) = self
            .browser
            .execute("if (document.activeElement) { document.activeElement.blur(); }", &[])
            .await
        {
            if err.is_fatal() {
                return Err(err.into());
            }
            tracing::debug!(error = %err, "unable to blur active element");
        }

        let button = self.locate_easy_apply(job).await?;
        self.transition(ApplyState::EasyApplyLocated, job);
        self.ensure_not_premium(job).await?;

        let description = self.job_description().await?;
        job.set_description(description);
        let recruiter = self.recruiter_link().await?;
        job.set_recruiter_link(recruiter);

        click_or_script(&*self.browser, &button).await?;
        self.transition(ApplyState::EasyApplyClicked, job);

        self.fill_form(job).await
    }

    fn transition(&mut self, next: ApplyState, job: &Job) {
        tracing::debug!(job = %job, from = ?self.state, to = ?next, "apply state");
        self.state = next;
    }

    /// Re-navigates away from the premium upsell page a bounded number of times.
    async fn ensure_not_premium(&self, job: &Job) -> Result<(), ApplyError> {
        let mut url = self.browser.current_url().await?;
        let mut attempts = 0;
        while url.contains(PREMIUM_URL_FRAGMENT) && attempts < self.settings.premium_return_attempts
        {
            attempts += 1;
            tracing::warn!(job = %job, attempts, "redirected to premium page, returning to the job");
            self.browser.goto(job.link()).await?;
            settle(self.settings.timings.premium_return).await;
            url = self.browser.current_url().await?;
        }
        if url.contains(PREMIUM_URL_FRAGMENT) {
            return Err(ApplyError::PremiumRedirect { attempts });
        }
        Ok(())
    }

    async fn job_description(&self) -> Result<String, ApplyError> {
        let browser = &*self.browser;
        if let Some(see_more) = find_first(browser, &Locator::xpath(SEE_MORE_DESCRIPTION)).await? {
            match click_or_script(browser, &see_more).await {
                Ok(()) => settle(self.settings.timings.description_expand).await,
                Err(err) if err.is_fatal() => return Err(err.into()),
                Err(err) => tracing::debug!(error = %err, "unable to expand description"),
            }
        }

        match find_first(browser, &Locator::class(DESCRIPTION_TEXT)).await? {
            Some(element) => Ok(browser.text(&element).await?),
            None => {
                tracing::error!("job description element not found");
                Err(ApplyError::MissingDescription)
            }
        }
    }

    /// First profile link under "Meet the hiring team"; empty when absent.
    async fn recruiter_link(&self) -> Result<String, ApplyError> {
        let browser = &*self.browser;
        let timings = &self.settings.timings;
        let heading = match wait_for_element(
            browser,
            &Locator::xpath(HIRING_TEAM_HEADING),
            timings.element_timeout,
            timings.poll_interval,
        )
        .await
        {
            Ok(heading) => heading,
            Err(err) if err.is_fatal() => return Err(err.into()),
            Err(err) => {
                tracing::debug!(error = %err, "hiring team section not found");
                return Ok(String::new());
            }
        };

        let link = match find_first_in(browser, &heading, &Locator::xpath(RECRUITER_PROFILE_LINK)).await
        {
            Ok(Some(anchor)) => browser.attribute(&anchor, "href").await,
            Ok(None) => Ok(None),
            Err(err) => Err(err),
        };
        match link {
            Ok(link) => Ok(link.unwrap_or_default()),
            Err(err) if err.is_fatal() => Err(err.into()),
            Err(err) => {
                tracing::warn!(error = %err, "unable to read recruiter link");
                Ok(String::new())
            }
        }
    }

    async fn fill_form(&mut self, job: &mut Job) -> Result<(), ApplyError> {
        for step in 1..=self.settings.max_form_steps {
            self.transition(ApplyState::Filling { step }, job);
            self.fill_sections(job).await?;
            if self.next_or_submit(job).await? {
                self.transition(ApplyState::Submitted, job);
                return Ok(());
            }
            self.transition(ApplyState::Next, job);
        }
        Err(ApplyError::TooManySteps(self.settings.max_form_steps))
    }

    async fn fill_sections(&mut self, job: &mut Job) -> Result<(), ApplyError> {
        let timings = &self.settings.timings;
        let container = match wait_for_element(
            &*self.browser,
            &Locator::class(FORM_CONTAINER),
            timings.form_timeout,
            timings.poll_interval,
        )
        .await
        {
            Ok(container) => container,
            Err(err) if err.is_fatal() => return Err(err.into()),
            Err(err) => {
                tracing::error!(error = %err, "easy apply form not found");
                return Ok(());
            }
        };

        let sections = match self
            .browser
            .find_all_in(&container, &Locator::class(FORM_SECTION))
            .await
        {
            Ok(sections) => sections,
            Err(err) if err.is_fatal() => return Err(err.into()),
            Err(err) => {
                tracing::error!(error = %err, "unable to list form sections");
                return Ok(());
            }
        };

        for section in &sections {
            if let Err(err) = self.fill_section(job, section).await {
                if err.disposition() == FailureDisposition::AbortSession {
                    return Err(err);
                }
                tracing::warn!(job = %job, error = %err, "unable to fill form section");
            }
        }
        Ok(())
    }

    /// Clicks the primary action. Returns `true` once the application is submitted.
    async fn next_or_submit(&mut self, job: &Job) -> Result<bool, ApplyError> {
        let browser = &*self.browser;
        let Some(button) = find_first(browser, &Locator::class(PRIMARY_ACTION)).await? else {
            return Err(ApplyError::MissingControl("primary action"));
        };
        let label = browser.text(&button).await?.to_lowercase();

        if label.contains(SUBMIT_LABEL) {
            tracing::debug!(job = %job, "submitting application");
            self.unfollow_company().await?;
            pause(self.settings.timings.step_pause, &mut self.rng).await;
            click_or_script(&*self.browser, &button).await?;
            pause(self.settings.timings.step_pause, &mut self.rng).await;
            return Ok(true);
        }

        pause(self.settings.timings.step_pause, &mut self.rng).await;
        click_or_script(&*self.browser, &button).await?;
        pause(self.settings.timings.after_next, &mut self.rng).await;
        self.check_for_errors().await?;
        Ok(false)
    }

    async fn unfollow_company(&self) -> Result<(), ApplyError> {
        let browser = &*self.browser;
        let result = match find_first(browser, &Locator::xpath(UNFOLLOW_TOGGLE)).await {
            Ok(Some(toggle)) => click_or_script(browser, &toggle).await,
            Ok(None) => Ok(()),
            Err(err) => Err(err),
        };
        match result {
            Err(err) if err.is_fatal() => Err(err.into()),
            Err(err) => {
                tracing::debug!(error = %err, "unable to unfollow company");
                Ok(())
            }
            Ok(()) => Ok(()),
        }
    }

    async fn check_for_errors(&self) -> Result<(), ApplyError> {
        let browser = &*self.browser;
        let elements = browser.find_all(&Locator::class(INLINE_ERROR)).await?;
        if elements.is_empty() {
            return Ok(());
        }
        let mut messages = Vec::with_capacity(elements.len());
        for element in &elements {
            messages.push(browser.text(element).await?.trim().to_string());
        }
        tracing::error!(errors = ?messages, "form reported validation errors");
        Err(ApplyError::FormErrors(messages))
    }

    /// Dismisses the modal and confirms the discard, each step independently.
    async fn discard(&mut self) {
        tracing::debug!("discarding application");
        self.click_best_effort(MODAL_DISMISS).await;
        pause(self.settings.timings.discard_pause, &mut self.rng).await;
        self.click_best_effort(MODAL_CONFIRM).await;
        pause(self.settings.timings.discard_pause, &mut self.rng).await;
    }

    async fn click_best_effort(&self, class: &str) {
        let browser = &*self.browser;
        match find_first(browser, &Locator::class(class)).await {
            Ok(Some(element)) => {
                if let Err(err) = click_or_script(browser, &element).await {
                    tracing::warn!(control = class, error = %err, "discard click failed");
                }
            }
            Ok(None) => tracing::debug!(control = class, "discard control not present"),
            Err(err) => tracing::warn!(control = class, error = %err, "discard control lookup failed"),
        }
    }

    async fn question_text(&self, section: &ElementHandle) -> Result<String, BrowserError> {
        match find_first_in(&*self.browser, section, &Locator::tag(QUESTION_LABEL)).await? {
            Some(label) => Ok(self.browser.text(&label).await?.trim().to_string()),
            None => Ok(String::new()),
        }
    }
}
