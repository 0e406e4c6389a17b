//! Browser automation seam.
//!
//! Every workflow talks to the page through the [`Browser`] trait so the
//! orchestration logic can run against a scripted double in tests and against
//! a W3C WebDriver endpoint in production.

pub mod webdriver;

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tokio::time::{sleep, Instant};

pub use webdriver::WebDriverClient;

/// How an element is located on the page.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Locator {
    Css(String),
    XPath(String),
}

impl Locator {
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    pub fn xpath(expression: impl Into<String>) -> Self {
        Self::XPath(expression.into())
    }

    pub fn class(name: &str) -> Self {
        Self::Css(format!(".{name}"))
    }

    pub fn id(name: &str) -> Self {
        Self::Css(format!("#{name}"))
    }

    pub fn tag(name: &str) -> Self {
        Self::Css(name.to_string())
    }

    /// W3C location strategy and value.
    pub fn strategy(&self) -> (&'static str, &str) {
        match self {
            Locator::Css(selector) => ("css selector", selector.as_str()),
            Locator::XPath(expression) => ("xpath", expression.as_str()),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Css(selector) => write!(f, "css `{selector}`"),
            Locator::XPath(expression) => write!(f, "xpath `{expression}`"),
        }
    }
}

/// Opaque reference to an element in the remote page.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementHandle(pub String);

impl ElementHandle {
    pub fn id(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("no element matches: {0}")]
    NoSuchElement(String),
    #[error("click was intercepted: {0}")]
    ClickIntercepted(String),
    #[error("stale element reference: {0}")]
    StaleElement(String),
    #[error("timed out after {waited:?} waiting for {condition}")]
    Timeout { condition: String, waited: Duration },
    #[error("webdriver command failed ({code}): {message}")]
    Command { code: String, message: String },
    #[error("browser session lost: {0}")]
    SessionLost(String),
    #[error("webdriver transport failure: {0}")]
    Transport(String),
    #[error("unexpected webdriver response: {0}")]
    Protocol(String),
}

impl BrowserError {
    /// The session cannot continue after this error.
    pub fn is_fatal(&self) -> bool {
        matches!(self, BrowserError::SessionLost(_) | BrowserError::Transport(_))
    }

    fn is_transient_lookup(&self) -> bool {
        matches!(
            self,
            BrowserError::NoSuchElement(_) | BrowserError::StaleElement(_)
        )
    }
}

#[async_trait]
pub trait Browser: Send + Sync {
    async fn goto(&self, url: &str) -> Result<(), BrowserError>;
    async fn current_url(&self) -> Result<String, BrowserError>;
    async fn refresh(&self) -> Result<(), BrowserError>;
    async fn page_source(&self) -> Result<String, BrowserError>;
    async fn find_all(&self, locator: &Locator) -> Result<Vec<ElementHandle>, BrowserError>;
    async fn find_all_in(
        &self,
        parent: &ElementHandle,
        locator: &Locator,
    ) -> Result<Vec<ElementHandle>, BrowserError>;
    async fn click(&self, element: &ElementHandle) -> Result<(), BrowserError>;
    async fn clear(&self, element: &ElementHandle) -> Result<(), BrowserError>;
    async fn send_keys(&self, element: &ElementHandle, text: &str) -> Result<(), BrowserError>;
    async fn text(&self, element: &ElementHandle) -> Result<String, BrowserError>;
    async fn attribute(
        &self,
        element: &ElementHandle,
        name: &str,
    ) -> Result<Option<String>, BrowserError>;
    async fn is_displayed(&self, element: &ElementHandle) -> Result<bool, BrowserError>;
    async fn is_enabled(&self, element: &ElementHandle) -> Result<bool, BrowserError>;
    async fn execute(
        &self,
        script: &str,
        args: &[&ElementHandle],
    ) -> Result<Value, BrowserError>;
    async fn quit(&self) -> Result<(), BrowserError>;
}

pub async fn find_first<B>(browser: &B, locator: &Locator) -> Result<Option<ElementHandle>, BrowserError>
where
    B: Browser + ?Sized,
{
    Ok(browser.find_all(locator).await?.into_iter().next())
}

pub async fn find_first_in<B>(
    browser: &B,
    parent: &ElementHandle,
    locator: &Locator,
) -> Result<Option<ElementHandle>, BrowserError>
where
    B: Browser + ?Sized,
{
    Ok(browser.find_all_in(parent, locator).await?.into_iter().next())
}

/// Clicks natively, falling back to a script click when an overlay intercepts.
pub async fn click_or_script<B>(browser: &B, element: &ElementHandle) -> Result<(), BrowserError>
where
    B: Browser + ?Sized,
{
    match browser.click(element).await {
        Err(BrowserError::ClickIntercepted(reason)) => {
            tracing::debug!(%reason, "native click intercepted, clicking via script");
            browser
                .execute("arguments[0].click();", &[element])
                .await
                .map(|_| ())
        }
        other => other,
    }
}

/// Polls until at least one element matches.
pub async fn wait_for_element<B>(
    browser: &B,
    locator: &Locator,
    timeout: Duration,
    poll: Duration,
) -> Result<ElementHandle, BrowserError>
where
    B: Browser + ?Sized,
{
    let started = Instant::now();
    loop {
        match find_first(browser, locator).await {
            Ok(Some(element)) => return Ok(element),
            Ok(None) => {}
            Err(err) if err.is_transient_lookup() => {}
            Err(err) => return Err(err),
        }
        if started.elapsed() >= timeout {
            return Err(BrowserError::Timeout {
                condition: format!("presence of {locator}"),
                waited: timeout,
            });
        }
        sleep(poll).await;
    }
}

/// Polls until the current URL contains `fragment`, returning that URL.
pub async fn wait_for_url_contains<B>(
    browser: &B,
    fragment: &str,
    timeout: Duration,
    poll: Duration,
) -> Result<String, BrowserError>
where
    B: Browser + ?Sized,
{
    let started = Instant::now();
    loop {
        let url = browser.current_url().await?;
        if url.contains(fragment) {
            return Ok(url);
        }
        if started.elapsed() >= timeout {
            return Err(BrowserError::Timeout {
                condition: format!("url containing `{fragment}`"),
                waited: timeout,
            });
        }
        sleep(poll).await;
    }
}

/// Polls until the element is both displayed and enabled.
pub async fn wait_until_interactable<B>(
    browser: &B,
    element: &ElementHandle,
    timeout: Duration,
    poll: Duration,
) -> Result<(), BrowserError>
where
    B: Browser + ?Sized,
{
    let started = Instant::now();
    loop {
        if browser.is_displayed(element).await? && browser.is_enabled(element).await? {
            return Ok(());
        }
        if started.elapsed() >= timeout {
            return Err(BrowserError::Timeout {
                condition: format!("element {} to become interactable", element.id()),
                waited: timeout,
            });
        }
        sleep(poll).await;
    }
}

pub async fn scroll_height<B>(browser: &B) -> Result<u64, BrowserError>
where
    B: Browser + ?Sized,
{
    let value = browser
        .execute("return document.body.scrollHeight;", &[])
        .await?;
    value
        .as_u64()
        .or_else(|| value.as_f64().map(|height| height.max(0.0) as u64))
        .ok_or_else(|| BrowserError::Protocol(format!("scroll height was not a number: {value}")))
}

pub async fn scroll_to<B>(browser: &B, offset: u64) -> Result<(), BrowserError>
where
    B: Browser + ?Sized,
{
    browser
        .execute(&format!("window.scrollTo(0, {offset});"), &[])
        .await
        .map(|_| ())
}
