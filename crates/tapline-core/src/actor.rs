//! The performer of interactions.
//!
//! An [`Actor`] owns exactly one [`AutomationSession`] and a
//! [`CancellationToken`]. Interactions borrow the actor mutably while they
//! run, so one session never has two interactions in flight. Independent
//! actors share nothing and may run concurrently.
//!
//! # Example
//!
//! ```
//! use tapline_core::actor::Actor;
//! use tapline_core::geometry::{BoundingBox, Dimension};
//! use tapline_core::mock::{MockElement, MockSession};
//! use tapline_core::target::{Locator, Target};
//! use tapline_core::touch::Tap;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let login = Target::the("login button").located_by(Locator::accessibility_id("login"));
//! let session = MockSession::new(Dimension::new(1080, 1920))
//!     .with_element(login.locator().clone(), MockElement::at(BoundingBox::new(100, 200, 50, 40)));
//!
//! let mut tester = Actor::named("tester", session.clone());
//! tester.attempts_to(&Tap::on(login)).await.unwrap();
//! assert_eq!(session.gesture_count(), 1);
//! # }
//! ```

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info_span, Instrument};

use crate::error::InteractionError;
use crate::interaction::Interaction;
use crate::record::{InteractionRecord, Outcome};
use crate::session::{AutomationSession, SessionError};

/// Owns a session and performs interactions against it one at a time.
pub struct Actor {
    name: String,
    session: Box<dyn AutomationSession>,
    cancel: CancellationToken,
    history: Vec<InteractionRecord>,
}

impl Actor {
    /// Creates an actor that exclusively owns `session`.
    pub fn named(name: impl Into<String>, session: impl AutomationSession + 'static) -> Self {
        Self::with_boxed_session(name, Box::new(session))
    }

    /// Like [`named`](Self::named) for an already boxed session.
    pub fn with_boxed_session(name: impl Into<String>, session: Box<dyn AutomationSession>) -> Self {
        Self {
            name: name.into(),
            session,
            cancel: CancellationToken::new(),
            history: Vec::new(),
        }
    }

    /// Replaces the actor's cancellation token.
    ///
    /// Cancelling the token aborts any wait or scroll loop the actor is
    /// currently blocked in, and every later one.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn session(&self) -> &dyn AutomationSession {
        self.session.as_ref()
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Performs `interaction` to completion and records the outcome.
    pub async fn attempts_to<I>(&mut self, interaction: &I) -> Result<(), InteractionError>
    where
        I: Interaction + ?Sized,
    {
        let name = interaction.name();
        let target = interaction.target_name().map(str::to_string);
        let span = info_span!(
            "interaction",
            actor = %self.name,
            interaction = name,
            target = target.as_deref().unwrap_or("")
        );
        let start = Instant::now();
        let result = interaction.perform_as(self).instrument(span.clone()).await;
        let elapsed = start.elapsed();

        let outcome = match &result {
            Ok(()) => Outcome::Success,
            Err(e) if e.is_cancelled() => Outcome::Cancelled,
            Err(e) => Outcome::Failure(e.to_string()),
        };
        span.in_scope(|| {
            debug!(
                elapsed_ms = elapsed.as_millis() as u64,
                success = outcome.is_success(),
                "interaction complete"
            )
        });

        self.history.push(
            InteractionRecord::new(name, target, outcome, elapsed.as_millis() as u64).by(&self.name),
        );
        result
    }

    /// Performs each interaction in order, stopping at the first failure.
    pub async fn attempts_to_all(
        &mut self,
        interactions: &[&dyn Interaction],
    ) -> Result<(), InteractionError> {
        for interaction in interactions {
            self.attempts_to(*interaction).await?;
        }
        Ok(())
    }

    /// Records of every interaction attempted so far, oldest first.
    pub fn history(&self) -> &[InteractionRecord] {
        &self.history
    }

    /// Drains the recorded history.
    pub fn take_history(&mut self) -> Vec<InteractionRecord> {
        std::mem::take(&mut self.history)
    }

    /// Sleeps for `duration` unless the actor is cancelled first.
    pub(crate) async fn pause(
        &self,
        interaction: &'static str,
        duration: Duration,
    ) -> Result<(), InteractionError> {
        tokio::select! {
            _ = self.cancel.cancelled() => Err(InteractionError::Cancelled { interaction }),
            _ = tokio::time::sleep(duration) => Ok(()),
        }
    }

    /// Ends the underlying session.
    pub async fn close(self) -> Result<(), SessionError> {
        self.session.close().await
    }
}

impl std::fmt::Debug for Actor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Actor")
            .field("name", &self.name)
            .field("cancelled", &self.cancel.is_cancelled())
            .field("history", &self.history.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Dimension;
    use crate::mock::MockSession;
    use async_trait::async_trait;

    struct Noop;

    #[async_trait]
    impl Interaction for Noop {
        fn name(&self) -> &'static str {
            "noop"
        }

        async fn perform_as(&self, _actor: &mut Actor) -> Result<(), InteractionError> {
            Ok(())
        }
    }

    struct Failing;

    #[async_trait]
    impl Interaction for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn target_name(&self) -> Option<&str> {
            Some("ghost")
        }

        async fn perform_as(&self, _actor: &mut Actor) -> Result<(), InteractionError> {
            Err(InteractionError::ElementNotFound {
                interaction: "failing",
                target: "ghost".to_string(),
            })
        }
    }

    fn actor() -> Actor {
        Actor::named("tester", MockSession::new(Dimension::new(100, 100)))
    }

    #[tokio::test]
    async fn records_success_and_failure() {
        let mut actor = actor();
        actor.attempts_to(&Noop).await.unwrap();
        assert!(actor.attempts_to(&Failing).await.is_err());

        let history = actor.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].interaction, "noop");
        assert!(history[0].outcome.is_success());
        assert_eq!(history[1].target.as_deref(), Some("ghost"));
        assert!(matches!(history[1].outcome, Outcome::Failure(_)));
        assert_eq!(history[1].actor.as_deref(), Some("tester"));
    }

    #[tokio::test]
    async fn attempts_to_all_stops_at_first_failure() {
        let mut actor = actor();
        let result = actor.attempts_to_all(&[&Noop, &Failing, &Noop]).await;
        assert!(result.is_err());
        assert_eq!(actor.take_history().len(), 2);
        assert!(actor.history().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn pause_returns_cancelled_when_token_fires() {
        let token = CancellationToken::new();
        let actor = actor().with_cancellation(token.clone());
        token.cancel();
        let err = actor.pause("wait", Duration::from_secs(60)).await.unwrap_err();
        assert!(err.is_cancelled());
    }

    #[tokio::test]
    async fn close_closes_the_session() {
        let session = MockSession::new(Dimension::new(100, 100));
        let actor = Actor::named("tester", session.clone());
        actor.close().await.unwrap();
        assert!(session.is_closed());
    }
}
