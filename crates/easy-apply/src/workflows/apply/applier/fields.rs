use std::fs;

use rand::Rng;

use crate::browser::{click_or_script, find_first_in, Browser, BrowserError, ElementHandle, Locator};
use crate::workflows::apply::domain::Job;
use crate::workflows::apply::selectors::{FILE_INPUT, OPTION, RADIO_INPUT, SELECT, TEXT_INPUT};

use super::{ApplyError, EasyApplier};

/// A form section's control, probed in priority order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    Upload(ElementHandle),
    Dropdown(ElementHandle),
    FreeText(ElementHandle),
    SingleChoice(Vec<ElementHandle>),
    Unknown,
}

impl FieldKind {
    pub fn label(&self) -> &'static str {
        match self {
            FieldKind::Upload(_) => "upload",
            FieldKind::Dropdown(_) => "dropdown",
            FieldKind::FreeText(_) => "free text",
            FieldKind::SingleChoice(_) => "single choice",
            FieldKind::Unknown => "unknown",
        }
    }
}

pub async fn classify<B>(browser: &B, section: &ElementHandle) -> Result<FieldKind, BrowserError>
where
    B: Browser + ?Sized,
{
    if let Some(input) = find_first_in(browser, section, &Locator::css(FILE_INPUT)).await? {
        return Ok(FieldKind::Upload(input));
    }
    if let Some(select) = find_first_in(browser, section, &Locator::tag(SELECT)).await? {
        return Ok(FieldKind::Dropdown(select));
    }
    if let Some(input) = find_first_in(browser, section, &Locator::css(TEXT_INPUT)).await? {
        return Ok(FieldKind::FreeText(input));
    }
    let radios = browser
        .find_all_in(section, &Locator::css(RADIO_INPUT))
        .await?;
    if !radios.is_empty() {
        return Ok(FieldKind::SingleChoice(radios));
    }
    Ok(FieldKind::Unknown)
}

/// Index to select among `len` options. The first option is a placeholder and
/// is never chosen; a list of fewer than two options is left alone.
pub fn choose_dropdown_index<R>(len: usize, rng: &mut R) -> Option<usize>
where
    R: Rng + ?Sized,
{
    if len < 2 {
        return None;
    }
    Some(rng.gen_range(1..len))
}

impl<B> EasyApplier<B>
where
    B: Browser + ?Sized,
{
    pub(super) async fn fill_section(
        &mut self,
        job: &mut Job,
        section: &ElementHandle,
    ) -> Result<(), ApplyError> {
        let kind = classify(&*self.browser, section).await?;
        let question = self.question_text(section).await?;
        tracing::debug!(field = kind.label(), %question, "filling form section");

        if question.is_empty() && !matches!(kind, FieldKind::Upload(_)) {
            tracing::warn!(field = kind.label(), "form section has no question label, leaving it empty");
            return Ok(());
        }

        match kind {
            FieldKind::Upload(input) => self.upload_resume(job, &input).await,
            FieldKind::Dropdown(select) => self.choose_dropdown(&select, &question).await,
            FieldKind::FreeText(input) => self.answer_free_text(job, &input, &question).await,
            FieldKind::SingleChoice(options) => self.choose_single(&options, &question).await,
            FieldKind::Unknown => {
                tracing::warn!(%question, "unhandled form field, leaving it empty");
                Ok(())
            }
        }
    }

    async fn upload_resume(&self, job: &mut Job, input: &ElementHandle) -> Result<(), ApplyError> {
        let Some(configured) = self.settings.resume_path.as_ref() else {
            tracing::warn!("no resume configured, skipping upload");
            return Ok(());
        };
        let resume = match fs::canonicalize(configured) {
            Ok(path) => path,
            Err(err) => {
                tracing::warn!(path = %configured.display(), error = %err, "resume file unavailable, skipping upload");
                return Ok(());
            }
        };

        self.browser
            .send_keys(input, &resume.to_string_lossy())
            .await?;
        tracing::debug!(path = %resume.display(), "resume uploaded");
        job.set_pdf_path(resume);
        Ok(())
    }

    async fn choose_dropdown(&mut self, select: &ElementHandle, question: &str) -> Result<(), ApplyError> {
        let options = self
            .browser
            .find_all_in(select, &Locator::tag(OPTION))
            .await?;
        let Some(index) = choose_dropdown_index(options.len(), &mut self.rng) else {
            tracing::debug!(%question, options = options.len(), "dropdown has no real choices");
            return Ok(());
        };
        let choice = &options[index];
        click_or_script(&*self.browser, choice).await?;
        let text = self.browser.text(choice).await.unwrap_or_default();
        tracing::debug!(%question, choice = %text, "dropdown option selected");
        Ok(())
    }

    async fn answer_free_text(
        &self,
        job: &Job,
        input: &ElementHandle,
        question: &str,
    ) -> Result<(), ApplyError> {
        let answer = match self.answers.lookup(question) {
            Some(stored) => {
                tracing::debug!(%question, "answer found in store");
                stored.to_string()
            }
            None => {
                tracing::info!(%question, "no stored answer, asking the answerer");
                self.answerer.answer_question(job, question).await?
            }
        };

        if let Err(err) = self.browser.clear(input).await {
            if err.is_fatal() {
                return Err(err.into());
            }
            tracing::debug!(error = %err, "unable to clear text field");
        }
        self.browser.send_keys(input, &answer).await?;
        tracing::debug!(%question, %answer, "text answer entered");
        Ok(())
    }

    async fn choose_single(&mut self, options: &[ElementHandle], question: &str) -> Result<(), ApplyError> {
        if options.is_empty() {
            return Ok(());
        }
        let index = self.rng.gen_range(0..options.len());
        click_or_script(&*self.browser, &options[index]).await?;
        tracing::debug!(%question, index, "radio option selected");
        Ok(())
    }
}
