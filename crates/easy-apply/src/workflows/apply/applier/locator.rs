use crate::browser::{
    scroll_to, wait_for_element, wait_until_interactable, Browser, BrowserError, ElementHandle,
    Locator,
};
use crate::workflows::apply::domain::Job;
use crate::workflows::apply::pacing::pause;
use crate::workflows::apply::selectors::{EASY_APPLY_ARIA, EASY_APPLY_BUTTONS, EASY_APPLY_TEXT};

use super::{ApplyError, EasyApplier};

const LOCATE_PASSES: usize = 2;
const SCROLL_STEP: u64 = 300;
const SCROLL_END: u64 = 3_600;

struct ButtonStrategy {
    description: &'static str,
    xpath: &'static str,
    wait_for_presence: bool,
}

static EASY_APPLY_STRATEGIES: [ButtonStrategy; 3] = [
    ButtonStrategy {
        description: "apply buttons labelled Easy Apply",
        xpath: EASY_APPLY_BUTTONS,
        wait_for_presence: false,
    },
    ButtonStrategy {
        description: "aria-label containing 'Easy Apply to'",
        xpath: EASY_APPLY_ARIA,
        wait_for_presence: true,
    },
    ButtonStrategy {
        description: "button text search",
        xpath: EASY_APPLY_TEXT,
        wait_for_presence: true,
    },
];

impl<B> EasyApplier<B>
where
    B: Browser + ?Sized,
{
    /// Two passes over the strategies, reloading the page between them.
    pub(super) async fn locate_easy_apply(&mut self, job: &Job) -> Result<ElementHandle, ApplyError> {
        for pass in 0..LOCATE_PASSES {
            self.ensure_not_premium(job).await?;
            self.scroll_slowly().await?;

            for strategy in &EASY_APPLY_STRATEGIES {
                tracing::debug!(strategy = strategy.description, pass, "searching for easy apply button");
                match self.first_interactable(strategy).await {
                    Ok(Some(button)) => return Ok(button),
                    Ok(None) => {
                        tracing::debug!(strategy = strategy.description, "no clickable match")
                    }
                    Err(err) if err.is_fatal() => return Err(err.into()),
                    Err(err) => {
                        tracing::warn!(strategy = strategy.description, error = %err, "easy apply search failed")
                    }
                }
            }

            self.ensure_not_premium(job).await?;
            if pass + 1 < LOCATE_PASSES {
                tracing::debug!("reloading page before searching again");
                self.browser.refresh().await?;
                pause(self.settings.timings.reload_settle, &mut self.rng).await;
            }
        }

        match self.browser.page_source().await {
            Ok(markup) => tracing::error!(job = %job, page_source = %markup, "no clickable easy apply button"),
            Err(err) if err.is_fatal() => return Err(err.into()),
            Err(err) => tracing::error!(job = %job, error = %err, "no clickable easy apply button, page source unavailable"),
        }
        Err(ApplyError::NoApplyButton)
    }

    async fn first_interactable(
        &self,
        strategy: &ButtonStrategy,
    ) -> Result<Option<ElementHandle>, BrowserError> {
        let browser = &*self.browser;
        let timings = &self.settings.timings;
        let locator = Locator::xpath(strategy.xpath);

        if strategy.wait_for_presence {
            match wait_for_element(browser, &locator, timings.element_timeout, timings.poll_interval).await {
                Ok(_) => {}
                Err(BrowserError::Timeout { .. }) => return Ok(None),
                Err(err) => return Err(err),
            }
        }

        let candidates = browser.find_all(&locator).await?;
        for (index, candidate) in candidates.into_iter().enumerate() {
            match wait_until_interactable(browser, &candidate, timings.element_timeout, timings.poll_interval).await {
                Ok(()) => return Ok(Some(candidate)),
                Err(err) if err.is_fatal() => return Err(err),
                Err(err) => tracing::warn!(index, error = %err, "easy apply candidate not clickable"),
            }
        }
        Ok(None)
    }

    /// Scrolls down and back up in small steps so lazy sections render.
    async fn scroll_slowly(&mut self) -> Result<(), ApplyError> {
        let offsets: Vec<u64> = (0..=SCROLL_END).step_by(SCROLL_STEP as usize).collect();
        for offset in offsets.iter().chain(offsets.iter().rev()) {
            if let Err(err) = scroll_to(&*self.browser, *offset).await {
                if err.is_fatal() {
                    return Err(err.into());
                }
                tracing::debug!(error = %err, "scroll step failed");
                return Ok(());
            }
            pause(self.settings.timings.scroll_step_pause, &mut self.rng).await;
        }
        Ok(())
    }
}
