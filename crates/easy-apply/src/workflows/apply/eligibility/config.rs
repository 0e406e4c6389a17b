use crate::config::SearchParameters;

/// Screening settings, normalised once so every comparison is lowercase.
#[derive(Debug, Clone, PartialEq)]
pub struct EligibilityConfig {
    pub title_blacklist: Vec<String>,
    pub company_blacklist: Vec<String>,
    pub keywords: Vec<String>,
    pub match_threshold: f64,
    pub apply_once_at_company: bool,
}

impl EligibilityConfig {
    pub fn from_parameters(params: &SearchParameters) -> Self {
        Self {
            title_blacklist: params
                .title_blacklist
                .iter()
                .map(|word| word.to_lowercase())
                .collect(),
            company_blacklist: params
                .company_blacklist
                .iter()
                .map(|company| super::rules::normalize_company(company))
                .collect(),
            keywords: params
                .job_matching_algorithm
                .keywords
                .iter()
                .map(|keyword| keyword.to_lowercase())
                .collect(),
            match_threshold: params.job_matching_algorithm.match_threshold,
            apply_once_at_company: params.apply_once_at_company,
        }
    }
}

impl Default for EligibilityConfig {
    fn default() -> Self {
        Self {
            title_blacklist: Vec::new(),
            company_blacklist: Vec::new(),
            keywords: Vec::new(),
            match_threshold: 0.75,
            apply_once_at_company: false,
        }
    }
}
