//! Minimal W3C WebDriver client over HTTP.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::{json, Value};
use url::Url;

use super::{Browser, BrowserError, ElementHandle, Locator};

/// Key under which W3C drivers return element references.
pub const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";
const LEGACY_ELEMENT_KEY: &str = "ELEMENT";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// One browser session on a chromedriver/geckodriver/selenium endpoint.
#[derive(Debug, Clone)]
pub struct WebDriverClient {
    http: reqwest::Client,
    session: Url,
    session_id: String,
}

impl WebDriverClient {
    /// Opens a new session on `endpoint` with the given capabilities.
    pub async fn connect(endpoint: &str, capabilities: Value) -> Result<Self, BrowserError> {
        let base = base_url(endpoint)?;
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|err| BrowserError::Transport(err.to_string()))?;

        let new_session = join(&base, "session")?;
        tracing::debug!(endpoint = %new_session, "opening webdriver session");
        let value = send(
            &http,
            Method::POST,
            new_session,
            Some(json!({ "capabilities": capabilities })),
        )
        .await?;

        let session_id = value
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| BrowserError::Protocol(format!("new session response without id: {value}")))?
            .to_string();
        let session = join(&base, &format!("session/{session_id}/"))?;

        tracing::info!(%session_id, "webdriver session started");
        Ok(Self {
            http,
            session,
            session_id,
        })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Capabilities for a Chrome session with extra command-line switches.
    pub fn chrome_capabilities(args: &[String]) -> Value {
        json!({
            "alwaysMatch": {
                "browserName": "chrome",
                "goog:chromeOptions": { "args": args },
            }
        })
    }

    async fn command(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value, BrowserError> {
        let url = join(&self.session, path)?;
        send(&self.http, method, url, body).await
    }

    async fn element_command(
        &self,
        method: Method,
        element: &ElementHandle,
        suffix: &str,
        body: Option<Value>,
    ) -> Result<Value, BrowserError> {
        let path = format!("element/{}/{suffix}", element.id());
        self.command(method, &path, body).await
    }
}

#[async_trait]
impl Browser for WebDriverClient {
    async fn goto(&self, url: &str) -> Result<(), BrowserError> {
        self.command(Method::POST, "url", Some(json!({ "url": url })))
            .await
            .map(|_| ())
    }

    async fn current_url(&self) -> Result<String, BrowserError> {
        let value = self.command(Method::GET, "url", None).await?;
        as_string(value)
    }

    async fn refresh(&self) -> Result<(), BrowserError> {
        self.command(Method::POST, "refresh", Some(json!({})))
            .await
            .map(|_| ())
    }

    async fn page_source(&self) -> Result<String, BrowserError> {
        let value = self.command(Method::GET, "source", None).await?;
        as_string(value)
    }

    async fn find_all(&self, locator: &Locator) -> Result<Vec<ElementHandle>, BrowserError> {
        let value = self
            .command(Method::POST, "elements", Some(locator_body(locator)))
            .await?;
        parse_elements(value)
    }

    async fn find_all_in(
        &self,
        parent: &ElementHandle,
        locator: &Locator,
    ) -> Result<Vec<ElementHandle>, BrowserError> {
        let value = self
            .element_command(Method::POST, parent, "elements", Some(locator_body(locator)))
            .await?;
        parse_elements(value)
    }

    async fn click(&self, element: &ElementHandle) -> Result<(), BrowserError> {
        self.element_command(Method::POST, element, "click", Some(json!({})))
            .await
            .map(|_| ())
    }

    async fn clear(&self, element: &ElementHandle) -> Result<(), BrowserError> {
        self.element_command(Method::POST, element, "clear", Some(json!({})))
            .await
            .map(|_| ())
    }

    async fn send_keys(&self, element: &ElementHandle, text: &str) -> Result<(), BrowserError> {
        self.element_command(Method::POST, element, "value", Some(json!({ "text": text })))
            .await
            .map(|_| ())
    }

    async fn text(&self, element: &ElementHandle) -> Result<String, BrowserError> {
        let value = self.element_command(Method::GET, element, "text", None).await?;
        as_string(value)
    }

    async fn attribute(
        &self,
        element: &ElementHandle,
        name: &str,
    ) -> Result<Option<String>, BrowserError> {
        let value = self
            .element_command(Method::GET, element, &format!("attribute/{name}"), None)
            .await?;
        match value {
            Value::Null => Ok(None),
            Value::String(text) => Ok(Some(text)),
            other => Ok(Some(other.to_string())),
        }
    }

    async fn is_displayed(&self, element: &ElementHandle) -> Result<bool, BrowserError> {
        let value = self
            .element_command(Method::GET, element, "displayed", None)
            .await?;
        as_bool(value)
    }

    async fn is_enabled(&self, element: &ElementHandle) -> Result<bool, BrowserError> {
        let value = self
            .element_command(Method::GET, element, "enabled", None)
            .await?;
        as_bool(value)
    }

    async fn execute(&self, script: &str, args: &[&ElementHandle]) -> Result<Value, BrowserError> {
        let args: Vec<Value> = args
            .iter()
            .map(|element| json!({ ELEMENT_KEY: element.id() }))
            .collect();
        self.command(
            Method::POST,
            "execute/sync",
            Some(json!({ "script": script, "args": args })),
        )
        .await
    }

    async fn quit(&self) -> Result<(), BrowserError> {
        let response = self
            .http
            .delete(self.session.as_str().trim_end_matches('/'))
            .send()
            .await
            .map_err(|err| BrowserError::Transport(err.to_string()))?;
        tracing::info!(session_id = %self.session_id, status = %response.status(), "webdriver session closed");
        Ok(())
    }
}

async fn send(
    http: &reqwest::Client,
    method: Method,
    url: Url,
    body: Option<Value>,
) -> Result<Value, BrowserError> {
    let request = http.request(method, url);
    let request = match body {
        Some(body) => request.json(&body),
        None => request,
    };

    let response = request
        .send()
        .await
        .map_err(|err| BrowserError::Transport(err.to_string()))?;
    let status = response.status();
    let payload: Value = response
        .json()
        .await
        .map_err(|err| BrowserError::Protocol(format!("response body ({status}) was not JSON: {err}")))?;

    let value = payload.get("value").cloned().unwrap_or(Value::Null);
    match value.get("error").and_then(Value::as_str) {
        Some(code) => {
            let message = value
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            Err(classify_error(code, message))
        }
        None if !status.is_success() => Err(BrowserError::Protocol(format!(
            "status {status} without error payload"
        ))),
        None => Ok(value),
    }
}

/// Maps a W3C error code to the typed error the workflows branch on.
pub(crate) fn classify_error(code: &str, message: String) -> BrowserError {
    match code {
        "no such element" => BrowserError::NoSuchElement(message),
        "element click intercepted" => BrowserError::ClickIntercepted(message),
        "stale element reference" => BrowserError::StaleElement(message),
        "invalid session id" | "no such window" | "session not created" => {
            BrowserError::SessionLost(message)
        }
        "timeout" | "script timeout" => BrowserError::Timeout {
            condition: message,
            waited: REQUEST_TIMEOUT,
        },
        other => BrowserError::Command {
            code: other.to_string(),
            message,
        },
    }
}

fn base_url(endpoint: &str) -> Result<Url, BrowserError> {
    let normalized = if endpoint.ends_with('/') {
        endpoint.to_string()
    } else {
        format!("{endpoint}/")
    };
    Url::parse(&normalized)
        .map_err(|err| BrowserError::Protocol(format!("invalid webdriver endpoint `{endpoint}`: {err}")))
}

fn join(base: &Url, path: &str) -> Result<Url, BrowserError> {
    base.join(path)
        .map_err(|err| BrowserError::Protocol(format!("invalid command path `{path}`: {err}")))
}

fn locator_body(locator: &Locator) -> Value {
    let (using, value) = locator.strategy();
    json!({ "using": using, "value": value })
}

fn parse_element(value: &Value) -> Option<ElementHandle> {
    value
        .get(ELEMENT_KEY)
        .or_else(|| value.get(LEGACY_ELEMENT_KEY))
        .and_then(Value::as_str)
        .map(|id| ElementHandle(id.to_string()))
}

fn parse_elements(value: Value) -> Result<Vec<ElementHandle>, BrowserError> {
    let items = value
        .as_array()
        .ok_or_else(|| BrowserError::Protocol(format!("expected element list, got {value}")))?;
    items
        .iter()
        .map(|item| {
            parse_element(item)
                .ok_or_else(|| BrowserError::Protocol(format!("malformed element reference {item}")))
        })
        .collect()
}

fn as_string(value: Value) -> Result<String, BrowserError> {
    match value {
        Value::String(text) => Ok(text),
        other => Err(BrowserError::Protocol(format!("expected string, got {other}"))),
    }
}

fn as_bool(value: Value) -> Result<bool, BrowserError> {
    value
        .as_bool()
        .ok_or_else(|| BrowserError::Protocol(format!("expected boolean, got {value}")))
}
