mod config;
mod policy;
mod rules;

pub use config::EligibilityConfig;
pub use policy::{EligibilityDecision, SkipReason};

use std::collections::HashSet;

use super::domain::{Job, OutcomeClass};
use super::outcomes::{OutcomeLog, OutcomeLogError};

/// Stateless screening over a parsed job, the session's seen links, and the success log.
#[derive(Debug, Clone)]
pub struct EligibilityFilter {
    config: EligibilityConfig,
}

impl EligibilityFilter {
    pub fn new(config: EligibilityConfig) -> Self {
        Self { config }
    }

    /// Runs the checks in order and stops at the first failure.
    pub fn evaluate<L>(
        &self,
        job: &Job,
        seen: &HashSet<String>,
        log: &L,
    ) -> Result<EligibilityDecision, OutcomeLogError>
    where
        L: OutcomeLog + ?Sized,
    {
        if let Some(word) = rules::blacklisted_title_word(job.title(), &self.config.title_blacklist)
        {
            return Ok(EligibilityDecision::Skip(SkipReason::BlacklistedTitle {
                word,
            }));
        }
        if rules::company_blacklisted(job.company(), &self.config.company_blacklist) {
            return Ok(EligibilityDecision::Skip(SkipReason::BlacklistedCompany));
        }
        if seen.contains(job.link()) {
            return Ok(EligibilityDecision::Skip(SkipReason::AlreadySeen));
        }

        if self.config.apply_once_at_company && self.already_applied_to(job.company(), log)? {
            return Ok(EligibilityDecision::Skip(
                SkipReason::AlreadyAppliedToCompany,
            ));
        }

        if let Some(score) =
            rules::keyword_score(job.title(), job.description(), &self.config.keywords)
        {
            if score < self.config.match_threshold {
                return Ok(EligibilityDecision::Skip(SkipReason::KeywordMismatch {
                    score,
                    threshold: self.config.match_threshold,
                }));
            }
        }

        if !job.is_easy_apply() {
            return Ok(EligibilityDecision::Skip(SkipReason::NotEasyApply {
                apply_method: job.apply_method().to_string(),
            }));
        }

        Ok(EligibilityDecision::Eligible)
    }

    fn already_applied_to<L>(&self, company: &str, log: &L) -> Result<bool, OutcomeLogError>
    where
        L: OutcomeLog + ?Sized,
    {
        let company = rules::normalize_company(company);
        Ok(log
            .read(OutcomeClass::Success)?
            .iter()
            .any(|record| rules::normalize_company(&record.company) == company))
    }
}
