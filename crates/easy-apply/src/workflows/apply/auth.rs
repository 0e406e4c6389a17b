use std::sync::Arc;

use thiserror::Error;

use crate::browser::{
    click_or_script, find_first, wait_for_element, wait_for_url_contains, Browser, BrowserError,
    Locator,
};
use crate::config::{Credentials, PortalConfig, Secrets};

use super::operator::OperatorConsole;
use super::pacing::Timings;
use super::selectors::{CAPTCHA_CHALLENGE, SECURITY_CHALLENGE, SUBMIT_BUTTON, USERNAME_FIELD};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("no portal named '{0}' is configured")]
    UnknownPortal(String),
    #[error(transparent)]
    Browser(#[from] BrowserError),
}

/// Establishes a logged-in session on a configured portal.
pub struct Authenticator<B: ?Sized> {
    browser: Arc<B>,
    portals: Vec<PortalConfig>,
    secrets: Secrets,
    operator: Arc<dyn OperatorConsole>,
    timings: Timings,
}

impl<B> Authenticator<B>
where
    B: Browser + ?Sized,
{
    pub fn new(
        browser: Arc<B>,
        portals: Vec<PortalConfig>,
        secrets: Secrets,
        operator: Arc<dyn OperatorConsole>,
        timings: Timings,
    ) -> Self {
        Self {
            browser,
            portals,
            secrets,
            operator,
            timings,
        }
    }

    fn portal(&self, name: &str) -> Result<&PortalConfig, AuthError> {
        self.portals
            .iter()
            .find(|portal| portal.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| AuthError::UnknownPortal(name.to_string()))
    }

    /// Returns whether a logged-in session exists afterwards. Tries stored
    /// credentials first, then falls back to asking the operator.
    pub async fn start(&self, portal_name: &str) -> Result<bool, AuthError> {
        tracing::info!(portal = portal_name, "checking login state");
        if self.is_logged_in(portal_name).await? {
            tracing::info!(portal = portal_name, "already logged in");
            return Ok(true);
        }

        if self.handle_login(portal_name).await? && self.is_logged_in(portal_name).await? {
            return Ok(true);
        }

        tracing::warn!(portal = portal_name, "not logged in, waiting for manual login");
        self.operator
            .await_signal("Press Enter after you have logged in manually...", None)
            .await;
        if self.is_logged_in(portal_name).await? {
            tracing::info!(portal = portal_name, "login confirmed");
            Ok(true)
        } else {
            tracing::error!(portal = portal_name, "login failed");
            Ok(false)
        }
    }

    /// Feed page shows the feed element and the profile picture.
    pub async fn is_logged_in(&self, portal_name: &str) -> Result<bool, AuthError> {
        let portal = self.portal(portal_name)?;
        let browser = &*self.browser;
        browser.goto(&portal.feed_url).await?;

        match wait_for_element(
            browser,
            &Locator::class(&portal.feed_element),
            self.timings.login_check,
            self.timings.poll_interval,
        )
        .await
        {
            Ok(_) => {}
            Err(err) if err.is_fatal() => return Err(err.into()),
            Err(err) => {
                tracing::debug!(portal = portal_name, error = %err, "feed did not load");
                return Ok(false);
            }
        }

        let logged_in = !browser
            .find_all(&Locator::xpath(portal.profile_image_xpath.as_str()))
            .await?
            .is_empty();
        tracing::debug!(portal = portal_name, logged_in, "profile image check");
        Ok(logged_in)
    }

    /// Logs in with stored credentials. `false` when none exist or the feed never loads.
    pub async fn handle_login(&self, portal_name: &str) -> Result<bool, AuthError> {
        let portal = self.portal(portal_name)?;
        let browser = &*self.browser;
        tracing::info!(portal = portal_name, "opening login page");
        browser.goto(&portal.login_url).await?;
        if browser.current_url().await?.contains(&portal.feed_url) {
            return Ok(true);
        }

        if !self.enter_credentials(portal).await? {
            return Ok(false);
        }

        if self.challenge_present().await? {
            tracing::warn!(portal = portal_name, "captcha or security verification needs the operator");
            self.operator
                .await_signal(
                    "Solve the CAPTCHA or security verification, then press Enter to continue...",
                    None,
                )
                .await;
        }

        if browser
            .current_url()
            .await?
            .contains(&portal.security_check_url)
        {
            return self.handle_security_check(portal).await;
        }

        match wait_for_url_contains(
            browser,
            &portal.feed_url,
            self.timings.login_timeout,
            self.timings.poll_interval,
        )
        .await
        {
            Ok(_) => {
                tracing::info!(portal = portal_name, "logged in");
                Ok(true)
            }
            Err(err) if err.is_fatal() => Err(err.into()),
            Err(err) => {
                tracing::error!(portal = portal_name, error = %err, "login did not reach the feed");
                Ok(false)
            }
        }
    }

    async fn enter_credentials(&self, portal: &PortalConfig) -> Result<bool, AuthError> {
        let Some(credentials) = self.secrets.credentials_for(&portal.name) else {
            tracing::info!(portal = %portal.name, "no stored credentials");
            return Ok(false);
        };
        let result = self.submit_credentials(portal, &credentials).await;

        match result {
            Ok(submitted) => Ok(submitted),
            Err(err) if err.is_fatal() => Err(err.into()),
            Err(err) => {
                tracing::error!(portal = %portal.name, error = %err, "unable to enter credentials");
                Ok(false)
            }
        }
    }

    async fn submit_credentials(
        &self,
        portal: &PortalConfig,
        credentials: &Credentials,
    ) -> Result<bool, BrowserError> {
        let browser = &*self.browser;
        let username = wait_for_element(
            browser,
            &Locator::id(USERNAME_FIELD),
            self.timings.element_timeout,
            self.timings.poll_interval,
        )
        .await?;
        browser.send_keys(&username, &credentials.username).await?;

        let Some(password) = find_first(browser, &Locator::id(&portal.login_element)).await? else {
            tracing::error!(portal = %portal.name, "password field not found");
            return Ok(false);
        };
        browser.send_keys(&password, &credentials.password).await?;

        let Some(submit) = find_first(browser, &Locator::xpath(SUBMIT_BUTTON)).await? else {
            tracing::error!(portal = %portal.name, "login button not found");
            return Ok(false);
        };
        click_or_script(browser, &submit).await?;
        Ok(true)
    }

    async fn challenge_present(&self) -> Result<bool, AuthError> {
        for id in [CAPTCHA_CHALLENGE, SECURITY_CHALLENGE] {
            if find_first(&*self.browser, &Locator::id(id)).await?.is_some() {
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn handle_security_check(&self, portal: &PortalConfig) -> Result<bool, AuthError> {
        tracing::warn!(portal = %portal.name, "security checkpoint, complete the challenge in the browser");
        match wait_for_url_contains(
            &*self.browser,
            &portal.feed_url,
            self.timings.security_check,
            self.timings.poll_interval,
        )
        .await
        {
            Ok(_) => {
                tracing::info!(portal = %portal.name, "security check completed");
                Ok(true)
            }
            Err(err) if err.is_fatal() => Err(err.into()),
            Err(err) => {
                tracing::error!(portal = %portal.name, error = %err, "security check not completed");
                Ok(false)
            }
        }
    }
}
