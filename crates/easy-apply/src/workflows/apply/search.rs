use rand::Rng;

use crate::browser::{
    find_first, find_first_in, scroll_height, scroll_to, wait_for_element, Browser, BrowserError,
    ElementHandle, Locator,
};
use crate::config::SearchParameters;

use super::domain::Job;
use super::pacing::{pause, settle, Timings};
use super::selectors::{
    RESULTS_LIST, RESULTS_LIST_READY, RESULT_TILE, TILE_APPLY_METHOD, TILE_COMPANY, TILE_LOCATION,
    TILE_TITLE,
};

pub const SEARCH_BASE_URL: &str = "https://www.linkedin.com/jobs/search/?";
pub const RESULTS_PER_PAGE: u32 = 25;
const MAX_SCROLL_ROUNDS: usize = 10;

const DEFAULT_APPLY_METHOD: &str = "Applied";

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("search results list not found on {url}")]
    ResultsMissing { url: String },
    #[error(transparent)]
    Browser(#[from] BrowserError),
}

impl SearchError {
    pub fn is_fatal(&self) -> bool {
        match self {
            SearchError::Browser(err) => err.is_fatal(),
            SearchError::ResultsMissing { .. } => false,
        }
    }
}

/// Builds paginated search URLs with the configured filters baked in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchUrlBuilder {
    base: String,
}

impl SearchUrlBuilder {
    pub fn from_parameters(params: &SearchParameters) -> Self {
        let mut filters = Vec::new();

        if params.remote {
            filters.push("f_WRA=true".to_string());
        }

        let levels: Vec<String> = params
            .experience_level
            .enabled()
            .map(experience_code)
            .collect();
        if !levels.is_empty() {
            filters.push(format!("f_E={}", levels.join(",")));
        }

        let job_types: Vec<String> = params.job_types.enabled().map(job_type_code).collect();
        if !job_types.is_empty() {
            filters.push(format!("f_JT={}", job_types.join(",")));
        }

        if let Some(posted) = params.date.first_enabled().and_then(date_code) {
            filters.push(format!("f_TPR={posted}"));
        }

        if let Some(distance) = params.distance.filter(|distance| *distance > 0) {
            filters.push(format!("distance={distance}"));
        }

        Self {
            base: format!("{SEARCH_BASE_URL}{}", filters.join("&")),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base
    }

    pub fn page_url(&self, position: &str, location: &str, page: u32) -> String {
        format!(
            "{}&keywords={}&location={}&start={}",
            self.base,
            urlencoding::encode(position),
            urlencoding::encode(location),
            page * RESULTS_PER_PAGE
        )
    }
}

fn experience_code(level: &str) -> String {
    let code = match level.trim().to_lowercase().as_str() {
        "internship" => "1",
        "entry" => "2",
        "associate" => "3",
        "mid-senior level" | "mid_senior_level" | "mid-senior" => "4",
        "director" => "5",
        "executive" => "6",
        _ => return urlencoding::encode(level.trim()).into_owned(),
    };
    code.to_string()
}

fn job_type_code(job_type: &str) -> String {
    let code = match job_type.trim().to_lowercase().as_str() {
        "full-time" | "full_time" => "F",
        "contract" => "C",
        "part-time" | "part_time" => "P",
        "temporary" => "T",
        "internship" => "I",
        "other" => "O",
        "volunteer" => "V",
        _ => return urlencoding::encode(job_type.trim()).into_owned(),
    };
    code.to_string()
}

fn date_code(date: &str) -> Option<String> {
    let code = match date.trim().to_lowercase().as_str() {
        "all time" | "all_time" => return None,
        "24 hours" | "24_hours" => "r86400",
        "week" => "r604800",
        "month" => "r2592000",
        _ => return Some(urlencoding::encode(date.trim()).into_owned()),
    };
    Some(code.to_string())
}

/// Navigates to a results page and lets lazily loaded tiles render.
/// A results container that never shows up is logged; parsing decides what to do.
pub async fn load_results_page<B, R>(
    browser: &B,
    url: &str,
    timings: &Timings,
    rng: &mut R,
) -> Result<(), BrowserError>
where
    B: Browser + ?Sized,
    R: Rng + ?Sized,
{
    tracing::debug!(%url, "loading search results page");
    browser.goto(url).await?;

    match wait_for_element(
        browser,
        &Locator::class(RESULTS_LIST_READY),
        timings.results_timeout,
        timings.poll_interval,
    )
    .await
    {
        Ok(_) => tracing::debug!("search results list loaded"),
        Err(err) if err.is_fatal() => return Err(err),
        Err(err) => tracing::error!(error = %err, "search results list did not load in time"),
    }

    scroll_until_stable(browser, timings).await?;
    pause(timings.page_settle, rng).await;
    Ok(())
}

/// Scrolls to the bottom until the document height stops growing.
pub async fn scroll_until_stable<B>(browser: &B, timings: &Timings) -> Result<(), BrowserError>
where
    B: Browser + ?Sized,
{
    let mut last_height = scroll_height(browser).await?;
    for _ in 0..MAX_SCROLL_ROUNDS {
        scroll_to(browser, last_height).await?;
        settle(timings.scroll_settle).await;
        let height = scroll_height(browser).await?;
        if height == last_height {
            break;
        }
        last_height = height;
    }
    tracing::debug!(height = last_height, "finished scrolling results");
    Ok(())
}

/// Parses every tile on the current page. Tiles missing required fields are dropped.
pub async fn extract_jobs<B>(browser: &B) -> Result<Vec<Job>, SearchError>
where
    B: Browser + ?Sized,
{
    let Some(list) = find_first(browser, &Locator::class(RESULTS_LIST)).await? else {
        let url = browser.current_url().await.unwrap_or_default();
        return Err(SearchError::ResultsMissing { url });
    };

    let tiles = browser
        .find_all_in(&list, &Locator::class(RESULT_TILE))
        .await?;
    if tiles.is_empty() {
        tracing::info!("no job tiles on this page");
        return Ok(Vec::new());
    }

    let mut jobs = Vec::with_capacity(tiles.len());
    for tile in &tiles {
        match parse_tile(browser, tile).await {
            Ok(Some(job)) => jobs.push(job),
            Ok(None) => {}
            Err(err) if err.is_fatal() => return Err(err.into()),
            Err(err) => tracing::warn!(error = %err, "unable to read job tile, dropping it"),
        }
    }
    tracing::debug!(parsed = jobs.len(), tiles = tiles.len(), "job tiles parsed");
    Ok(jobs)
}

async fn parse_tile<B>(browser: &B, tile: &ElementHandle) -> Result<Option<Job>, BrowserError>
where
    B: Browser + ?Sized,
{
    let (title, link) = match find_first_in(browser, tile, &Locator::class(TILE_TITLE)).await? {
        Some(anchor) => {
            let title = browser.text(&anchor).await?;
            let link = browser.attribute(&anchor, "href").await?.unwrap_or_default();
            (title, link)
        }
        None => {
            tracing::warn!("job tile has no title link");
            (String::new(), String::new())
        }
    };
    let company = tile_text(browser, tile, TILE_COMPANY).await?.unwrap_or_default();
    let location = tile_text(browser, tile, TILE_LOCATION).await?.unwrap_or_default();
    let apply_method = match tile_text(browser, tile, TILE_APPLY_METHOD).await? {
        Some(method) if !method.trim().is_empty() => method,
        _ => {
            tracing::debug!("apply method missing, assuming '{DEFAULT_APPLY_METHOD}'");
            DEFAULT_APPLY_METHOD.to_string()
        }
    };

    match Job::new(title, company, location, link, apply_method) {
        Ok(job) => Ok(Some(job)),
        Err(err) => {
            tracing::warn!(error = %err, "dropping incomplete job tile");
            Ok(None)
        }
    }
}

async fn tile_text<B>(
    browser: &B,
    tile: &ElementHandle,
    class: &str,
) -> Result<Option<String>, BrowserError>
where
    B: Browser + ?Sized,
{
    match find_first_in(browser, tile, &Locator::class(class)).await? {
        Some(element) => Ok(Some(browser.text(&element).await?)),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Toggles;
    use std::path::Path;

    fn params() -> SearchParameters {
        SearchParameters::from_yaml_str(
            "positions: [Rust Engineer]\nlocations: [Berlin]\n",
            Path::new("config.yaml"),
        )
        .expect("minimal config parses")
    }

    #[test]
    fn base_url_without_filters_has_no_query_pairs() {
        let builder = SearchUrlBuilder::from_parameters(&params());
        assert_eq!(builder.base_url(), SEARCH_BASE_URL);
    }

    #[test]
    fn filters_map_names_to_codes() {
        let mut params = params();
        params.remote = true;
        params.experience_level = Toggles::new([("entry", true), ("director", false), ("executive", true)]);
        params.job_types = Toggles::new([("full-time", true), ("contract", true)]);
        params.date = Toggles::new([("all time", false), ("week", true), ("month", true)]);
        params.distance = Some(25);

        let builder = SearchUrlBuilder::from_parameters(&params);
        assert_eq!(
            builder.base_url(),
            "https://www.linkedin.com/jobs/search/?f_WRA=true&f_E=2,6&f_JT=F,C&f_TPR=r604800&distance=25"
        );
    }

    #[test]
    fn all_time_and_zero_distance_add_no_filter() {
        let mut params = params();
        params.date = Toggles::new([("all time", true)]);
        params.distance = Some(0);
        let builder = SearchUrlBuilder::from_parameters(&params);
        assert_eq!(builder.base_url(), SEARCH_BASE_URL);
    }

    #[test]
    fn page_url_encodes_terms_and_offsets_by_page() {
        let builder = SearchUrlBuilder::from_parameters(&params());
        let url = builder.page_url("Rust Engineer", "São Paulo", 2);
        assert!(url.ends_with("&keywords=Rust%20Engineer&location=S%C3%A3o%20Paulo&start=50"));
    }
}
