use std::collections::HashSet;
use std::path::Path;

use super::common::*;
use crate::config::SearchParameters;
use crate::workflows::apply::domain::Job;
use crate::workflows::apply::eligibility::{
    EligibilityConfig, EligibilityDecision, EligibilityFilter, SkipReason,
};

const LINK: &str = "https://www.linkedin.com/jobs/view/202/";

fn filter(config: EligibilityConfig) -> EligibilityFilter {
    EligibilityFilter::new(config)
}

fn title_blacklist(words: &[&str]) -> EligibilityConfig {
    EligibilityConfig {
        title_blacklist: words.iter().map(|word| word.to_string()).collect(),
        ..EligibilityConfig::default()
    }
}

fn evaluate(filter: &EligibilityFilter, job: &Job) -> EligibilityDecision {
    filter
        .evaluate(job, &HashSet::new(), &MemoryOutcomeLog::default())
        .expect("memory log never fails")
}

#[test]
fn title_words_match_whole_words_only() {
    let filter = filter(title_blacklist(&["lead"]));

    let leader = job("Team Leader Wanted", "Ferrous Logistics", LINK);
    assert_eq!(evaluate(&filter, &leader), EligibilityDecision::Eligible);

    let lead = job("Lead Engineer", "Ferrous Logistics", LINK);
    match evaluate(&filter, &lead) {
        EligibilityDecision::Skip(SkipReason::BlacklistedTitle { word }) => assert_eq!(word, "lead"),
        other => panic!("expected blacklisted title, got {other:?}"),
    }
}

#[test]
fn multi_word_title_entries_never_match() {
    let filter = filter(title_blacklist(&["senior engineer"]));
    let senior = job("Senior Engineer", "Ferrous Logistics", LINK);

    assert!(evaluate(&filter, &senior).is_eligible());
}

#[test]
fn company_blacklist_ignores_case_and_padding() {
    let config = EligibilityConfig {
        company_blacklist: vec!["evil corp".to_string()],
        ..EligibilityConfig::default()
    };
    let filter = filter(config);
    let target = job("Rust Engineer", "  EVIL Corp ", LINK);

    match evaluate(&filter, &target) {
        EligibilityDecision::Skip(SkipReason::BlacklistedCompany) => {}
        other => panic!("expected blacklisted company, got {other:?}"),
    }
}

#[test]
fn seen_links_are_skipped() {
    let filter = filter(EligibilityConfig::default());
    let target = job("Rust Engineer", "Ferrous Logistics", LINK);
    let seen: HashSet<String> = [target.link().to_string()].into_iter().collect();

    let decision = filter
        .evaluate(&target, &seen, &MemoryOutcomeLog::default())
        .expect("memory log never fails");

    assert_eq!(decision, EligibilityDecision::Skip(SkipReason::AlreadySeen));
}

#[test]
fn apply_once_matches_companies_after_normalising() {
    let log = MemoryOutcomeLog::with_success("Acme");
    let target = job("Rust Engineer", "ACME ", LINK);

    let once = filter(EligibilityConfig {
        apply_once_at_company: true,
        ..EligibilityConfig::default()
    });
    let decision = once
        .evaluate(&target, &HashSet::new(), &log)
        .expect("memory log never fails");
    assert_eq!(
        decision,
        EligibilityDecision::Skip(SkipReason::AlreadyAppliedToCompany)
    );

    let repeat = filter(EligibilityConfig::default());
    let decision = repeat
        .evaluate(&target, &HashSet::new(), &log)
        .expect("memory log never fails");
    assert!(decision.is_eligible());
}

#[test]
fn zero_threshold_and_empty_keywords_accept_everything() {
    let target = job("Gardener", "Green Thumbs", LINK);

    let zero = filter(EligibilityConfig {
        keywords: vec!["rust".to_string(), "tokio".to_string()],
        match_threshold: 0.0,
        ..EligibilityConfig::default()
    });
    assert!(evaluate(&zero, &target).is_eligible());

    let empty = filter(EligibilityConfig {
        keywords: Vec::new(),
        match_threshold: 1.0,
        ..EligibilityConfig::default()
    });
    assert!(evaluate(&empty, &target).is_eligible());
}

#[test]
fn keyword_score_below_threshold_is_skipped() {
    let filter = filter(EligibilityConfig {
        keywords: vec!["rust".to_string(), "tokio".to_string()],
        match_threshold: 0.75,
        ..EligibilityConfig::default()
    });
    let target = job("Rust Engineer", "Ferrous Logistics", LINK);

    match evaluate(&filter, &target) {
        EligibilityDecision::Skip(SkipReason::KeywordMismatch { score, threshold }) => {
            assert!((score - 0.5).abs() < f64::EPSILON);
            assert!((threshold - 0.75).abs() < f64::EPSILON);
        }
        other => panic!("expected keyword mismatch, got {other:?}"),
    }
}

#[test]
fn description_counts_toward_keyword_score() {
    let filter = filter(EligibilityConfig {
        keywords: vec!["rust".to_string(), "tokio".to_string()],
        match_threshold: 1.0,
        ..EligibilityConfig::default()
    });
    let mut target = job("Rust Engineer", "Ferrous Logistics", LINK);
    target.set_description("Async services on Tokio.");

    assert!(evaluate(&filter, &target).is_eligible());
}

#[test]
fn non_easy_apply_methods_are_skipped_last() {
    let external = Job::new(
        "Lead Engineer".to_string(),
        "Ferrous Logistics".to_string(),
        "Berlin".to_string(),
        LINK.to_string(),
        "Applied".to_string(),
    )
    .expect("fixture job is complete");

    match evaluate(&filter(EligibilityConfig::default()), &external) {
        EligibilityDecision::Skip(SkipReason::NotEasyApply { apply_method }) => {
            assert_eq!(apply_method, "Applied")
        }
        other => panic!("expected not easy apply, got {other:?}"),
    }

    match evaluate(&filter(title_blacklist(&["lead"])), &external) {
        EligibilityDecision::Skip(SkipReason::BlacklistedTitle { .. }) => {}
        other => panic!("expected the title check to win, got {other:?}"),
    }
}

#[test]
fn decisions_are_deterministic() {
    let filter = filter(EligibilityConfig {
        title_blacklist: vec!["intern".to_string()],
        keywords: vec!["rust".to_string()],
        match_threshold: 0.5,
        ..EligibilityConfig::default()
    });
    let target = job("Rust Engineer", "Ferrous Logistics", LINK);

    let first = evaluate(&filter, &target);
    let second = evaluate(&filter, &target);

    assert_eq!(first, second);
    assert_eq!(first.summary(), "eligible");
}

#[test]
fn config_from_parameters_lowercases_lists() {
    let params = SearchParameters::from_yaml_str(
        "positions: [Rust Engineer]\nlocations: [Berlin]\ntitle_blacklist: [Senior]\ncompany_blacklist: [' Evil Corp ']\njob_matching_algorithm:\n  keywords: [Rust, Tokio]\n  match_threshold: 0.5\n",
        Path::new("config.yaml"),
    )
    .expect("config parses");

    let config = EligibilityConfig::from_parameters(&params);

    assert_eq!(config.title_blacklist, vec!["senior".to_string()]);
    assert_eq!(config.company_blacklist, vec!["evil corp".to_string()]);
    assert_eq!(config.keywords, vec!["rust".to_string(), "tokio".to_string()]);
    assert!((config.match_threshold - 0.5).abs() < f64::EPSILON);
}
