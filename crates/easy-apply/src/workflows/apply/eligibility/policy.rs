/// Screening verdict for one parsed job.
#[derive(Debug, Clone, PartialEq)]
pub enum EligibilityDecision {
    Eligible,
    Skip(SkipReason),
}

impl EligibilityDecision {
    pub fn is_eligible(&self) -> bool {
        matches!(self, EligibilityDecision::Eligible)
    }

    pub fn summary(&self) -> String {
        match self {
            EligibilityDecision::Eligible => "eligible".to_string(),
            EligibilityDecision::Skip(reason) => reason.summary(),
        }
    }
}

/// Why a job was skipped, in check order.
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    BlacklistedTitle { word: String },
    BlacklistedCompany,
    AlreadySeen,
    AlreadyAppliedToCompany,
    KeywordMismatch { score: f64, threshold: f64 },
    NotEasyApply { apply_method: String },
}

impl SkipReason {
    pub fn summary(&self) -> String {
        match self {
            SkipReason::BlacklistedTitle { word } => {
                format!("title contains blacklisted word '{word}'")
            }
            SkipReason::BlacklistedCompany => "company is blacklisted".to_string(),
            SkipReason::AlreadySeen => "job link already seen this session".to_string(),
            SkipReason::AlreadyAppliedToCompany => {
                "already applied at this company".to_string()
            }
            SkipReason::KeywordMismatch { score, threshold } => format!(
                "keyword match {:.2} below threshold {:.2}",
                score, threshold
            ),
            SkipReason::NotEasyApply { apply_method } => {
                format!("apply method '{apply_method}' is not easy apply")
            }
        }
    }
}
