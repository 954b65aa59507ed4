//! Automation session trait for backend-agnostic gesture dispatch.
//!
//! This module defines the [`AutomationSession`] trait, the one boundary the
//! gesture layer needs from an automation backend: element resolution, element
//! state queries, the viewport size, and a gesture-dispatch endpoint. The
//! WebDriver/Appium backend lives in [`crate::webdriver`]; an in-memory backend
//! for tests lives in [`crate::mock`].
//!
//! Element resolution returns a [`Lookup`] rather than an error when nothing
//! matches, so "the element is not there" is never confused with a broken
//! session.

use async_trait::async_trait;
use thiserror::Error;

use crate::geometry::{BoundingBox, Dimension};
use crate::gesture::GestureSequence;
use crate::target::Locator;

/// Errors reported by an automation backend.
///
/// This enum unifies errors from all backends behind a single type,
/// allowing the interaction layer to handle them uniformly.
#[derive(Error, Debug)]
pub enum SessionError {
    /// The backend rejected or failed a command.
    #[error("Command failed: {0}")]
    CommandFailed(String),

    /// The element handle no longer refers to a live element.
    #[error("Stale element reference: {0}")]
    StaleElement(String),

    /// The session has been closed or was never established.
    #[error("Not connected to automation backend")]
    NotConnected,

    /// The connection to the backend failed.
    #[error("Connection lost: {0}")]
    ConnectionLost(String),

    /// The backend did not answer in time.
    #[error("Operation timed out")]
    Timeout,

    /// The backend sent a response that could not be understood.
    #[error("JSON parse error: {0}")]
    JsonParse(String),
}

impl SessionError {
    /// Returns `true` if the error is a stale element reference.
    ///
    /// Pollers treat a stale element like a missing one and resolve again on
    /// the next tick.
    pub fn is_stale(&self) -> bool {
        matches!(self, SessionError::StaleElement(_))
    }
}

/// Opaque handle to a resolved element, valid only within the session that
/// returned it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementId(pub String);

impl ElementId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Outcome of resolving a locator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Found(ElementId),
    NotFound,
}

impl Lookup {
    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found(_))
    }

    pub fn into_element(self) -> Option<ElementId> {
        match self {
            Lookup::Found(id) => Some(id),
            Lookup::NotFound => None,
        }
    }
}

/// Trait for an active automation session.
///
/// Implementors provide element resolution and state queries plus a single
/// gesture-dispatch endpoint. All methods take `&self`; exclusive use is
/// enforced one level up by [`Actor`](crate::actor::Actor), which owns its
/// session and only performs one interaction at a time.
#[async_trait]
pub trait AutomationSession: Send + Sync {
    /// Resolve a locator to an element handle.
    ///
    /// Returns `Ok(Lookup::NotFound)` when no element matches; `Err` is
    /// reserved for backend faults.
    async fn find_element(&self, locator: &Locator) -> Result<Lookup, SessionError>;

    /// The element's frame in screen pixels.
    async fn element_rect(&self, element: &ElementId) -> Result<BoundingBox, SessionError>;

    /// Whether the element is displayed.
    async fn is_displayed(&self, element: &ElementId) -> Result<bool, SessionError>;

    /// Whether the element is enabled.
    async fn is_enabled(&self, element: &ElementId) -> Result<bool, SessionError>;

    /// Whether the element is selected (checkboxes, switches, tabs).
    async fn is_selected(&self, element: &ElementId) -> Result<bool, SessionError>;

    /// The element's visible text.
    async fn element_text(&self, element: &ElementId) -> Result<String, SessionError>;

    /// Size of the application viewport.
    async fn viewport_size(&self) -> Result<Dimension, SessionError>;

    /// Dispatch a gesture and wait until the backend reports completion.
    ///
    /// Either the whole sequence runs or the call fails; implementations do
    /// not retry.
    async fn perform(&self, gesture: &GestureSequence) -> Result<(), SessionError>;

    /// End the session.
    async fn close(&self) -> Result<(), SessionError>;
}

/// A session with no device behind it.
///
/// Every query and gesture fails with [`SessionError::NotConnected`]; only
/// interactions that never touch the device, such as fixed delays, succeed.
#[derive(Debug, Clone, Copy, Default)]
pub struct DetachedSession;

#[async_trait]
impl AutomationSession for DetachedSession {
    async fn find_element(&self, _locator: &Locator) -> Result<Lookup, SessionError> {
        Err(SessionError::NotConnected)
    }

    async fn element_rect(&self, _element: &ElementId) -> Result<BoundingBox, SessionError> {
        Err(SessionError::NotConnected)
    }

    async fn is_displayed(&self, _element: &ElementId) -> Result<bool, SessionError> {
        Err(SessionError::NotConnected)
    }

    async fn is_enabled(&self, _element: &ElementId) -> Result<bool, SessionError> {
        Err(SessionError::NotConnected)
    }

    async fn is_selected(&self, _element: &ElementId) -> Result<bool, SessionError> {
        Err(SessionError::NotConnected)
    }

    async fn element_text(&self, _element: &ElementId) -> Result<String, SessionError> {
        Err(SessionError::NotConnected)
    }

    async fn viewport_size(&self) -> Result<Dimension, SessionError> {
        Err(SessionError::NotConnected)
    }

    async fn perform(&self, _gesture: &GestureSequence) -> Result<(), SessionError> {
        Err(SessionError::NotConnected)
    }

    async fn close(&self) -> Result<(), SessionError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_error_display() {
        let err = SessionError::CommandFailed("gesture rejected".to_string());
        assert!(err.to_string().contains("gesture rejected"));

        let err = SessionError::NotConnected;
        assert!(err.to_string().contains("Not connected"));

        let err = SessionError::StaleElement("el-1".to_string());
        assert!(err.to_string().contains("el-1"));
        assert!(err.is_stale());

        let err = SessionError::Timeout;
        assert!(err.to_string().contains("timed out"));
        assert!(!err.is_stale());
    }

    #[tokio::test]
    async fn test_detached_session_refuses_device_work() {
        let session = DetachedSession;
        let err = session
            .find_element(&Locator::accessibility_id("login"))
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::NotConnected));
        assert!(matches!(
            session.viewport_size().await,
            Err(SessionError::NotConnected)
        ));
        assert!(session.close().await.is_ok());
    }

    #[test]
    fn test_lookup_into_element() {
        let found = Lookup::Found(ElementId("abc".to_string()));
        assert!(found.is_found());
        assert_eq!(found.into_element(), Some(ElementId("abc".to_string())));
        assert_eq!(Lookup::NotFound.into_element(), None);
    }
}
