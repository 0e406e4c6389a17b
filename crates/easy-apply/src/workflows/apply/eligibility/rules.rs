pub(crate) fn normalize_company(name: &str) -> String {
    name.trim().to_lowercase()
}

/// First title word (space-split, lowercase) that equals a blacklist entry.
/// Multi-word entries never match a single word.
pub(crate) fn blacklisted_title_word(title: &str, blacklist: &[String]) -> Option<String> {
    let title = title.to_lowercase();
    title
        .split(' ')
        .find(|word| blacklist.iter().any(|entry| entry == word))
        .map(str::to_string)
}

pub(crate) fn company_blacklisted(company: &str, blacklist: &[String]) -> bool {
    let company = normalize_company(company);
    blacklist.iter().any(|entry| *entry == company)
}

/// Fraction of keywords found in the title or description. `None` without keywords.
pub(crate) fn keyword_score(title: &str, description: &str, keywords: &[String]) -> Option<f64> {
    if keywords.is_empty() {
        return None;
    }
    let title = title.to_lowercase();
    let description = description.to_lowercase();
    let matched = keywords
        .iter()
        .filter(|keyword| title.contains(keyword.as_str()) || description.contains(keyword.as_str()))
        .count();
    Some(matched as f64 / keywords.len() as f64)
}
