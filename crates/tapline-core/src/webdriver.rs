//! W3C WebDriver backend.
//!
//! [`WebDriverSession`] attaches to a session that already exists on a
//! WebDriver endpoint (an Appium server, typically) and speaks the W3C HTTP
//! wire protocol for the handful of commands the gesture layer needs.
//! Creating sessions is left to whatever harness started the server.
//!
//! # Example
//!
//! ```no_run
//! use tapline_core::session::AutomationSession;
//! use tapline_core::webdriver::WebDriverSession;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let session = WebDriverSession::attach("http://127.0.0.1:4723", "3f1a9c")?;
//! let viewport = session.viewport_size().await?;
//! println!("{}x{}", viewport.width, viewport.height);
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, instrument, trace, warn};

use crate::geometry::{BoundingBox, Dimension};
use crate::gesture::GestureSequence;
use crate::session::{AutomationSession, ElementId, Lookup, SessionError};
use crate::target::Locator;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Timeout for establishing a TCP connection to the endpoint.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Timeout for a whole command round-trip. Gestures block until the
/// device finishes them, so this is generous.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Key under which W3C endpoints return element references.
const W3C_ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// Key used by pre-W3C (JSON Wire Protocol) endpoints.
const LEGACY_ELEMENT_KEY: &str = "ELEMENT";

// ---------------------------------------------------------------------------
// Wire helpers
// ---------------------------------------------------------------------------

/// An error reply from the endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireError {
    pub status: u16,
    /// W3C error code, e.g. `"no such element"`.
    pub error: String,
    pub message: String,
}

impl WireError {
    pub fn is_no_such_element(&self) -> bool {
        self.error == "no such element"
    }
}

impl From<WireError> for SessionError {
    fn from(e: WireError) -> Self {
        match e.error.as_str() {
            "stale element reference" => SessionError::StaleElement(e.message),
            "invalid session id" => SessionError::NotConnected,
            "timeout" | "script timeout" => SessionError::Timeout,
            _ if e.message.is_empty() => SessionError::CommandFailed(format!("{} ({})", e.error, e.status)),
            _ => SessionError::CommandFailed(format!("{}: {}", e.error, e.message)),
        }
    }
}

/// Splits a raw reply into its `value` or a [`WireError`].
///
/// Bodies that are not JSON are reported as `unknown error` carrying the
/// raw text, unless the status is a success.
pub fn decode_reply(status: u16, body: &str) -> Result<Value, WireError> {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let value = parsed
        .as_ref()
        .and_then(|v| v.get("value"))
        .cloned()
        .unwrap_or(Value::Null);

    if (200..300).contains(&status) {
        return Ok(value);
    }

    let field = |name: &str| {
        value
            .get(name)
            .and_then(Value::as_str)
            .map(str::to_string)
    };
    let error = field("error").unwrap_or_else(|| {
        if status == 404 && parsed.is_none() {
            "no such element".to_string()
        } else {
            "unknown error".to_string()
        }
    });
    let message = field("message").unwrap_or_else(|| {
        if parsed.is_none() {
            body.trim().to_string()
        } else {
            String::new()
        }
    });
    Err(WireError {
        status,
        error,
        message,
    })
}

/// Extracts the element reference from a find-element reply.
pub fn element_id(value: &Value) -> Option<ElementId> {
    value
        .get(W3C_ELEMENT_KEY)
        .or_else(|| value.get(LEGACY_ELEMENT_KEY))
        .and_then(Value::as_str)
        .map(|id| ElementId(id.to_string()))
}

#[derive(Debug, Deserialize)]
struct WireRect {
    #[serde(default)]
    x: f64,
    #[serde(default)]
    y: f64,
    width: f64,
    height: f64,
}

fn parse<T: serde::de::DeserializeOwned>(value: Value) -> Result<T, SessionError> {
    serde_json::from_value(value).map_err(|e| SessionError::JsonParse(e.to_string()))
}

/// Parses a rect reply, truncating fractional pixels.
pub fn rect_from_value(value: Value) -> Result<BoundingBox, SessionError> {
    let rect: WireRect = parse(value)?;
    Ok(BoundingBox::new(
        rect.x as i32,
        rect.y as i32,
        rect.width as i32,
        rect.height as i32,
    ))
}

fn map_transport(e: reqwest::Error) -> SessionError {
    if e.is_timeout() {
        SessionError::Timeout
    } else {
        SessionError::ConnectionLost(e.to_string())
    }
}

// ---------------------------------------------------------------------------
// WebDriverSession
// ---------------------------------------------------------------------------

/// An attached W3C WebDriver session.
#[derive(Debug, Clone)]
pub struct WebDriverSession {
    client: Client,
    base_url: String,
    session_id: String,
}

impl WebDriverSession {
    /// Attaches to `session_id` on the endpoint at `base_url`.
    ///
    /// No request is made until the first command.
    pub fn attach(
        base_url: impl Into<String>,
        session_id: impl Into<String>,
    ) -> Result<Self, SessionError> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| SessionError::ConnectionLost(e.to_string()))?;
        Ok(Self::with_client(client, base_url, session_id))
    }

    /// Like [`attach`](Self::attach) with a caller-configured HTTP client.
    pub fn with_client(
        client: Client,
        base_url: impl Into<String>,
        session_id: impl Into<String>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client,
            base_url,
            session_id: session_id.into(),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/session/{}{}", self.base_url, self.session_id, path)
    }

    /// Sends one command and returns the reply's `value`.
    async fn command(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Result<Value, WireError>, SessionError> {
        let url = self.url(path);
        trace!(%method, %url, "webdriver request");
        let mut request = self.client.request(method, &url);
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = request.send().await.map_err(map_transport)?;
        let status = response.status().as_u16();
        let text = response.text().await.map_err(map_transport)?;
        trace!(status, len = text.len(), "webdriver response");
        Ok(decode_reply(status, &text))
    }

    async fn get(&self, path: &str) -> Result<Value, SessionError> {
        Ok(self.command(Method::GET, path, None).await??)
    }

    async fn element_flag(&self, element: &ElementId, property: &str) -> Result<bool, SessionError> {
        let value = self
            .get(&format!("/element/{}/{property}", element.as_str()))
            .await?;
        value
            .as_bool()
            .ok_or_else(|| SessionError::JsonParse(format!("expected boolean for {property}, got {value}")))
    }
}

#[async_trait]
impl AutomationSession for WebDriverSession {
    #[instrument(skip(self, locator), level = "debug", fields(locator = %locator))]
    async fn find_element(&self, locator: &Locator) -> Result<Lookup, SessionError> {
        let body = json!({ "using": locator.strategy.as_str(), "value": locator.value });
        match self.command(Method::POST, "/element", Some(body)).await? {
            Ok(value) => element_id(&value)
                .map(Lookup::Found)
                .ok_or_else(|| SessionError::JsonParse(format!("no element reference in {value}"))),
            Err(e) if e.is_no_such_element() => {
                debug!("no element matched");
                Ok(Lookup::NotFound)
            }
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip(self), level = "debug")]
    async fn element_rect(&self, element: &ElementId) -> Result<BoundingBox, SessionError> {
        let value = self.get(&format!("/element/{}/rect", element.as_str())).await?;
        rect_from_value(value)
    }

    #[instrument(skip(self), level = "debug")]
    async fn is_displayed(&self, element: &ElementId) -> Result<bool, SessionError> {
        self.element_flag(element, "displayed").await
    }

    #[instrument(skip(self), level = "debug")]
    async fn is_enabled(&self, element: &ElementId) -> Result<bool, SessionError> {
        self.element_flag(element, "enabled").await
    }

    #[instrument(skip(self), level = "debug")]
    async fn is_selected(&self, element: &ElementId) -> Result<bool, SessionError> {
        self.element_flag(element, "selected").await
    }

    #[instrument(skip(self), level = "debug")]
    async fn element_text(&self, element: &ElementId) -> Result<String, SessionError> {
        let value = self.get(&format!("/element/{}/text", element.as_str())).await?;
        parse(value)
    }

    #[instrument(skip(self), level = "debug")]
    async fn viewport_size(&self) -> Result<Dimension, SessionError> {
        let rect = rect_from_value(self.get("/window/rect").await?)?;
        Ok(Dimension::new(rect.width, rect.height))
    }

    #[instrument(skip(self, gesture), level = "debug", fields(tracks = gesture.tracks().len(), duration_ms = gesture.duration().as_millis() as u64))]
    async fn perform(&self, gesture: &GestureSequence) -> Result<(), SessionError> {
        let body = serde_json::to_value(gesture).map_err(|e| SessionError::JsonParse(e.to_string()))?;
        self.command(Method::POST, "/actions", Some(body)).await??;
        // The gesture has run; a failed release only affects later gestures.
        match self.command(Method::DELETE, "/actions", None).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => {
                warn!(error = %e.error, message = %e.message, "releasing actions failed")
            }
            Err(e) => warn!(error = %e, "releasing actions failed"),
        }
        Ok(())
    }

    #[instrument(skip(self), level = "debug")]
    async fn close(&self) -> Result<(), SessionError> {
        self.command(Method::DELETE, "", None).await??;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_success_returns_value() {
        let value = decode_reply(200, r#"{"value": {"width": 1080, "height": 1920}}"#).unwrap();
        assert_eq!(value["width"], 1080);
    }

    #[test]
    fn decode_w3c_error() {
        let err = decode_reply(
            404,
            r#"{"value": {"error": "no such element", "message": "An element could not be located", "stacktrace": ""}}"#,
        )
        .unwrap_err();
        assert!(err.is_no_such_element());
        assert_eq!(err.status, 404);
    }

    #[test]
    fn bare_404_counts_as_missing_element() {
        let err = decode_reply(404, "Not Found").unwrap_err();
        assert!(err.is_no_such_element());
        assert_eq!(err.message, "Not Found");
    }

    #[test]
    fn stale_reference_maps_to_stale_element() {
        let err = decode_reply(
            404,
            r#"{"value": {"error": "stale element reference", "message": "gone"}}"#,
        )
        .unwrap_err();
        assert!(SessionError::from(err).is_stale());
    }

    #[test]
    fn other_errors_map_to_command_failed() {
        let err = decode_reply(500, r#"{"value": {"error": "unknown error", "message": "boom"}}"#)
            .unwrap_err();
        let session_err = SessionError::from(err);
        assert!(matches!(session_err, SessionError::CommandFailed(ref m) if m.contains("boom")));
    }

    #[test]
    fn element_id_reads_both_keys() {
        let w3c = json!({ "element-6066-11e4-a52e-4f735466cecf": "abc" });
        assert_eq!(element_id(&w3c), Some(ElementId("abc".to_string())));
        let legacy = json!({ "ELEMENT": "def" });
        assert_eq!(element_id(&legacy), Some(ElementId("def".to_string())));
        assert_eq!(element_id(&json!({})), None);
    }

    #[test]
    fn rect_truncates_fractional_pixels() {
        let rect = rect_from_value(json!({"x": 10.7, "y": 20.2, "width": 99.9, "height": 40.0})).unwrap();
        assert_eq!(rect, BoundingBox::new(10, 20, 99, 40));
        assert!(rect_from_value(json!({"x": 1})).is_err());
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let session = WebDriverSession::attach("http://127.0.0.1:4723/", "s1").unwrap();
        assert_eq!(session.url("/element"), "http://127.0.0.1:4723/session/s1/element");
    }
}
