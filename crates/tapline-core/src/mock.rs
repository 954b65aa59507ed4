//! In-memory [`AutomationSession`] for tests.
//!
//! [`MockSession`] holds a scripted set of elements keyed by locator and
//! records every gesture it is asked to perform. Element visibility can be
//! tied to the number of gestures performed so far, which is how scroll
//! loops are exercised without a device:
//!
//! ```
//! use tapline_core::geometry::{BoundingBox, Dimension};
//! use tapline_core::mock::{MockElement, MockSession};
//! use tapline_core::target::Locator;
//!
//! let session = MockSession::new(Dimension::new(1080, 1920)).with_element(
//!     Locator::accessibility_id("footer"),
//!     MockElement::at(BoundingBox::new(0, 1800, 1080, 120)).appears_after_gestures(3),
//! );
//! assert_eq!(session.gesture_count(), 0);
//! ```
//!
//! Clones share state, so a test can hand one clone to an
//! [`Actor`](crate::actor::Actor) and inspect another.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::geometry::{BoundingBox, Dimension};
use crate::gesture::GestureSequence;
use crate::session::{AutomationSession, ElementId, Lookup, SessionError};
use crate::target::Locator;

/// Scripted state of one element.
#[derive(Debug, Clone)]
pub struct MockElement {
    pub rect: BoundingBox,
    pub displayed: bool,
    pub enabled: bool,
    pub selected: bool,
    pub text: String,
    present_from: usize,
    displayed_from: usize,
    gone_from: Option<usize>,
}

impl MockElement {
    /// A displayed, enabled, unselected element with no text.
    pub fn at(rect: BoundingBox) -> Self {
        Self {
            rect,
            displayed: true,
            enabled: true,
            selected: false,
            text: String::new(),
            present_from: 0,
            displayed_from: 0,
            gone_from: None,
        }
    }

    pub fn hidden(mut self) -> Self {
        self.displayed = false;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn selected(mut self) -> Self {
        self.selected = true;
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// The element cannot be resolved until `n` gestures have been performed.
    pub fn appears_after_gestures(mut self, n: usize) -> Self {
        self.present_from = n;
        self
    }

    /// The element resolves immediately but reports not displayed until `n`
    /// gestures have been performed.
    pub fn displayed_after_gestures(mut self, n: usize) -> Self {
        self.displayed_from = n;
        self
    }

    /// The element stops resolving once `n` gestures have been performed.
    pub fn removed_after_gestures(mut self, n: usize) -> Self {
        self.gone_from = Some(n);
        self
    }

    fn is_present(&self, gestures: usize) -> bool {
        gestures >= self.present_from && self.gone_from.map_or(true, |n| gestures < n)
    }

    fn is_displayed(&self, gestures: usize) -> bool {
        self.displayed && gestures >= self.displayed_from
    }
}

#[derive(Debug)]
struct Entry {
    id: ElementId,
    element: MockElement,
}

#[derive(Debug)]
struct MockState {
    viewport: Dimension,
    elements: HashMap<Locator, Entry>,
    performed: Vec<GestureSequence>,
    failed_performs: usize,
    perform_failures: VecDeque<String>,
    lookup_fault: Option<String>,
    queries: usize,
    next_id: usize,
    closed: bool,
}

/// Scriptable in-memory session.
#[derive(Debug, Clone)]
pub struct MockSession {
    state: Arc<Mutex<MockState>>,
}

impl MockSession {
    /// Creates an empty session with the given viewport.
    pub fn new(viewport: Dimension) -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                viewport,
                elements: HashMap::new(),
                performed: Vec::new(),
                failed_performs: 0,
                perform_failures: VecDeque::new(),
                lookup_fault: None,
                queries: 0,
                next_id: 1,
                closed: false,
            })),
        }
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Builder form of [`set_element`](Self::set_element).
    pub fn with_element(self, locator: Locator, element: MockElement) -> Self {
        self.set_element(locator, element);
        self
    }

    /// Adds or replaces the element behind `locator`.
    ///
    /// Replacing keeps the existing handle so callers holding it stay valid.
    pub fn set_element(&self, locator: Locator, element: MockElement) {
        let mut state = self.state();
        if let Some(entry) = state.elements.get_mut(&locator) {
            entry.element = element;
            return;
        }
        let id = ElementId(format!("mock-{}", state.next_id));
        state.next_id += 1;
        state.elements.insert(locator, Entry { id, element });
    }

    /// Mutates the element behind `locator`, if any.
    pub fn update_element(&self, locator: &Locator, f: impl FnOnce(&mut MockElement)) {
        if let Some(entry) = self.state().elements.get_mut(locator) {
            f(&mut entry.element);
        }
    }

    /// Removes the element; outstanding handles become stale.
    pub fn remove_element(&self, locator: &Locator) {
        self.state().elements.remove(locator);
    }

    /// The next `n` calls to `perform` fail with `message`.
    pub fn fail_next_performs(&self, n: usize, message: &str) {
        let mut state = self.state();
        for _ in 0..n {
            state.perform_failures.push_back(message.to_string());
        }
    }

    /// Makes every lookup fail with a backend fault until cleared with `None`.
    pub fn fail_lookups(&self, message: Option<&str>) {
        self.state().lookup_fault = message.map(str::to_string);
    }

    pub fn set_viewport(&self, viewport: Dimension) {
        self.state().viewport = viewport;
    }

    /// Gestures performed successfully, in order.
    pub fn performed(&self) -> Vec<GestureSequence> {
        self.state().performed.clone()
    }

    pub fn gesture_count(&self) -> usize {
        self.state().performed.len()
    }

    /// Number of `perform` calls that were rejected.
    pub fn failed_perform_count(&self) -> usize {
        self.state().failed_performs
    }

    /// Number of lookup, state and viewport queries served.
    pub fn query_count(&self) -> usize {
        self.state().queries
    }

    pub fn is_closed(&self) -> bool {
        self.state().closed
    }

    /// Runs `f` on the live element behind `id`.
    fn inspect_element<T>(
        &self,
        id: &ElementId,
        f: impl FnOnce(&MockElement, usize) -> T,
    ) -> Result<T, SessionError> {
        let mut state = self.state();
        if state.closed {
            return Err(SessionError::NotConnected);
        }
        state.queries += 1;
        let gestures = state.performed.len();
        state
            .elements
            .values()
            .find(|entry| &entry.id == id && entry.element.is_present(gestures))
            .map(|entry| f(&entry.element, gestures))
            .ok_or_else(|| SessionError::StaleElement(id.0.clone()))
    }
}

#[async_trait]
impl AutomationSession for MockSession {
    async fn find_element(&self, locator: &Locator) -> Result<Lookup, SessionError> {
        let mut state = self.state();
        if state.closed {
            return Err(SessionError::NotConnected);
        }
        state.queries += 1;
        if let Some(fault) = &state.lookup_fault {
            return Err(SessionError::CommandFailed(fault.clone()));
        }
        let gestures = state.performed.len();
        Ok(match state.elements.get(locator) {
            Some(entry) if entry.element.is_present(gestures) => Lookup::Found(entry.id.clone()),
            _ => Lookup::NotFound,
        })
    }

    async fn element_rect(&self, element: &ElementId) -> Result<BoundingBox, SessionError> {
        self.inspect_element(element, |el, _| el.rect)
    }

    async fn is_displayed(&self, element: &ElementId) -> Result<bool, SessionError> {
        self.inspect_element(element, |el, gestures| el.is_displayed(gestures))
    }

    async fn is_enabled(&self, element: &ElementId) -> Result<bool, SessionError> {
        self.inspect_element(element, |el, _| el.enabled)
    }

    async fn is_selected(&self, element: &ElementId) -> Result<bool, SessionError> {
        self.inspect_element(element, |el, _| el.selected)
    }

    async fn element_text(&self, element: &ElementId) -> Result<String, SessionError> {
        self.inspect_element(element, |el, _| el.text.clone())
    }

    async fn viewport_size(&self) -> Result<Dimension, SessionError> {
        let mut state = self.state();
        if state.closed {
            return Err(SessionError::NotConnected);
        }
        state.queries += 1;
        Ok(state.viewport)
    }

    async fn perform(&self, gesture: &GestureSequence) -> Result<(), SessionError> {
        let mut state = self.state();
        if state.closed {
            return Err(SessionError::NotConnected);
        }
        if let Some(message) = state.perform_failures.pop_front() {
            state.failed_performs += 1;
            return Err(SessionError::CommandFailed(message));
        }
        state.performed.push(gesture.clone());
        Ok(())
    }

    async fn close(&self) -> Result<(), SessionError> {
        self.state().closed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;
    use crate::gesture::Gesture;

    fn tap() -> GestureSequence {
        Gesture::Tap { at: Point::new(1, 1) }.build()
    }

    #[tokio::test]
    async fn element_appears_after_gestures() {
        let locator = Locator::id("late");
        let session = MockSession::new(Dimension::new(100, 100)).with_element(
            locator.clone(),
            MockElement::at(BoundingBox::new(0, 0, 10, 10)).appears_after_gestures(2),
        );

        assert_eq!(session.find_element(&locator).await.unwrap(), Lookup::NotFound);
        session.perform(&tap()).await.unwrap();
        assert_eq!(session.find_element(&locator).await.unwrap(), Lookup::NotFound);
        session.perform(&tap()).await.unwrap();
        assert!(session.find_element(&locator).await.unwrap().is_found());
        assert_eq!(session.query_count(), 3);
    }

    #[tokio::test]
    async fn element_queries_read_scripted_state() {
        let locator = Locator::accessibility_id("status");
        let rect = BoundingBox::new(5, 6, 70, 80);
        let session = MockSession::new(Dimension::new(100, 100)).with_element(
            locator.clone(),
            MockElement::at(rect).disabled().selected().with_text("Ready"),
        );
        let id = session.find_element(&locator).await.unwrap().into_element().unwrap();

        assert_eq!(session.element_rect(&id).await.unwrap(), rect);
        assert!(session.is_displayed(&id).await.unwrap());
        assert!(!session.is_enabled(&id).await.unwrap());
        assert!(session.is_selected(&id).await.unwrap());
        assert_eq!(session.element_text(&id).await.unwrap(), "Ready");
        assert_eq!(session.query_count(), 6);
    }

    #[tokio::test]
    async fn removed_element_handle_goes_stale() {
        let locator = Locator::id("toast");
        let session = MockSession::new(Dimension::new(100, 100)).with_element(
            locator.clone(),
            MockElement::at(BoundingBox::new(0, 0, 10, 10)).removed_after_gestures(1),
        );
        let id = session.find_element(&locator).await.unwrap().into_element().unwrap();
        assert!(session.is_displayed(&id).await.unwrap());

        session.perform(&tap()).await.unwrap();
        let err = session.is_displayed(&id).await.unwrap_err();
        assert!(err.is_stale());
    }

    #[tokio::test]
    async fn injected_perform_failures_are_consumed_in_order() {
        let session = MockSession::new(Dimension::new(100, 100));
        session.fail_next_performs(1, "pointer busy");

        let err = session.perform(&tap()).await.unwrap_err();
        assert!(err.to_string().contains("pointer busy"));
        session.perform(&tap()).await.unwrap();
        assert_eq!(session.gesture_count(), 1);
        assert_eq!(session.failed_perform_count(), 1);
    }

    #[tokio::test]
    async fn closed_session_rejects_everything() {
        let session = MockSession::new(Dimension::new(100, 100));
        session.close().await.unwrap();
        assert!(session.is_closed());
        assert!(matches!(
            session.viewport_size().await,
            Err(SessionError::NotConnected)
        ));
        assert!(matches!(
            session.perform(&tap()).await,
            Err(SessionError::NotConnected)
        ));
    }
}
