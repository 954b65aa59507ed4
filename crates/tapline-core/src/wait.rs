//! Condition polling with a deadline.
//!
//! [`Wait`] re-resolves its target on every poll and evaluates one
//! [`WaitCondition`] until it holds or the timeout passes. The last poll
//! happens at the deadline, so a wait never gives up before its full
//! timeout has elapsed. [`WaitCondition::FixedDelay`] just sleeps for the
//! timeout without touching the session.
//!
//! Every sleep races the actor's cancellation token.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use tapline_core::target::{Locator, Target};
//! use tapline_core::wait::{Wait, WaitCondition};
//!
//! let spinner = Target::the("spinner").located_by(Locator::id("progress"));
//! let wait = Wait::until_invisible_within(spinner, Duration::from_secs(30))
//!     .with_poll_interval(Duration::from_millis(250));
//! assert_eq!(wait.condition(), WaitCondition::Invisible);
//! assert_eq!(wait.timeout(), Duration::from_secs(30));
//! ```

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::debug;

use crate::actor::Actor;
use crate::error::InteractionError;
use crate::interaction::{lookup, Interaction};
use crate::session::{ElementId, Lookup, SessionError};
use crate::target::Target;

const NAME: &str = "wait";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// What a [`Wait`] waits for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WaitCondition {
    /// The target resolves and is displayed.
    Visible,
    /// The target resolves, is displayed and is enabled.
    Clickable,
    /// The target resolves, displayed or not.
    Present,
    /// The target does not resolve, or resolves but is not displayed.
    Invisible,
    /// The target resolves and is selected.
    Selected,
    /// The target's text contains the expected text.
    TextPresent,
    /// No condition; sleep for the whole timeout.
    FixedDelay,
}

impl WaitCondition {
    /// Returns `true` if the condition is evaluated against a target.
    pub fn needs_target(self) -> bool {
        !matches!(self, WaitCondition::FixedDelay)
    }
}

impl fmt::Display for WaitCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WaitCondition::Visible => "visible",
            WaitCondition::Clickable => "clickable",
            WaitCondition::Present => "present",
            WaitCondition::Invisible => "invisible",
            WaitCondition::Selected => "selected",
            WaitCondition::TextPresent => "text present",
            WaitCondition::FixedDelay => "fixed delay",
        })
    }
}

/// Blocks until a condition holds or its timeout passes.
#[derive(Debug, Clone)]
pub struct Wait {
    condition: WaitCondition,
    target: Option<Target>,
    expected_text: Option<String>,
    timeout: Duration,
    poll_interval: Duration,
}

impl Wait {
    pub fn new(condition: WaitCondition, target: Option<Target>, timeout: Duration) -> Self {
        Self {
            condition,
            target,
            expected_text: None,
            timeout,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    fn on(condition: WaitCondition, target: Target, timeout: Duration) -> Self {
        Self::new(condition, Some(target), timeout)
    }

    /// Sleeps for `timeout`.
    pub fn for_duration(timeout: Duration) -> Self {
        Self::new(WaitCondition::FixedDelay, None, timeout)
    }

    pub fn for_millis(millis: u64) -> Self {
        Self::for_duration(Duration::from_millis(millis))
    }

    pub fn for_seconds(seconds: u64) -> Self {
        Self::for_duration(Duration::from_secs(seconds))
    }

    pub fn for_minutes(minutes: u64) -> Self {
        Self::for_duration(Duration::from_secs(minutes.saturating_mul(60)))
    }

    pub fn until_visible(target: Target) -> Self {
        Self::until_visible_within(target, DEFAULT_TIMEOUT)
    }

    pub fn until_visible_within(target: Target, timeout: Duration) -> Self {
        Self::on(WaitCondition::Visible, target, timeout)
    }

    pub fn until_clickable(target: Target) -> Self {
        Self::until_clickable_within(target, DEFAULT_TIMEOUT)
    }

    pub fn until_clickable_within(target: Target, timeout: Duration) -> Self {
        Self::on(WaitCondition::Clickable, target, timeout)
    }

    pub fn until_present(target: Target) -> Self {
        Self::until_present_within(target, DEFAULT_TIMEOUT)
    }

    pub fn until_present_within(target: Target, timeout: Duration) -> Self {
        Self::on(WaitCondition::Present, target, timeout)
    }

    pub fn until_invisible(target: Target) -> Self {
        Self::until_invisible_within(target, DEFAULT_TIMEOUT)
    }

    pub fn until_invisible_within(target: Target, timeout: Duration) -> Self {
        Self::on(WaitCondition::Invisible, target, timeout)
    }

    pub fn until_selected(target: Target) -> Self {
        Self::until_selected_within(target, DEFAULT_TIMEOUT)
    }

    pub fn until_selected_within(target: Target, timeout: Duration) -> Self {
        Self::on(WaitCondition::Selected, target, timeout)
    }

    /// Waits until the target's text contains `text`.
    pub fn until_text_appears(target: Target, text: impl Into<String>) -> Self {
        Self::until_text_appears_within(target, text, DEFAULT_TIMEOUT)
    }

    pub fn until_text_appears_within(
        target: Target,
        text: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            expected_text: Some(text.into()),
            ..Self::on(WaitCondition::TextPresent, target, timeout)
        }
    }

    pub fn builder() -> WaitBuilder {
        WaitBuilder::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets how often the condition is re-evaluated.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn condition(&self) -> WaitCondition {
        self.condition
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Checks that the options the condition needs are present.
    fn validate(&self) -> Result<(), InteractionError> {
        let missing = |what: &str| InteractionError::InvalidConfiguration {
            interaction: NAME,
            reason: format!("{what} is required for the {} condition", self.condition),
        };
        if self.condition.needs_target() && self.target.is_none() {
            return Err(missing("a target"));
        }
        if self.condition == WaitCondition::TextPresent && self.expected_text.is_none() {
            return Err(missing("expected text"));
        }
        if self.condition != WaitCondition::FixedDelay && self.poll_interval.is_zero() {
            return Err(InteractionError::InvalidConfiguration {
                interaction: NAME,
                reason: "poll interval must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    /// Evaluates the condition once against a fresh resolution.
    async fn holds(&self, actor: &Actor, target: &Target) -> Result<bool, InteractionError> {
        let result = match lookup(actor, NAME, target).await? {
            Lookup::NotFound => return Ok(self.condition == WaitCondition::Invisible),
            Lookup::Found(id) => self.element_state(actor, &id).await,
        };
        match result {
            Ok(holds) => Ok(holds),
            Err(e) if e.is_stale() => Ok(self.condition == WaitCondition::Invisible),
            Err(source) => Err(InteractionError::Session {
                interaction: NAME,
                source,
            }),
        }
    }

    async fn element_state(&self, actor: &Actor, id: &ElementId) -> Result<bool, SessionError> {
        let session = actor.session();
        match self.condition {
            WaitCondition::Present => Ok(true),
            WaitCondition::Visible => session.is_displayed(id).await,
            WaitCondition::Clickable => {
                Ok(session.is_displayed(id).await? && session.is_enabled(id).await?)
            }
            WaitCondition::Invisible => Ok(!session.is_displayed(id).await?),
            WaitCondition::Selected => session.is_selected(id).await,
            WaitCondition::TextPresent => {
                let text = session.element_text(id).await?;
                Ok(self
                    .expected_text
                    .as_deref()
                    .is_some_and(|expected| text.contains(expected)))
            }
            WaitCondition::FixedDelay => Ok(true),
        }
    }
}

#[async_trait]
impl Interaction for Wait {
    fn name(&self) -> &'static str {
        NAME
    }

    fn target_name(&self) -> Option<&str> {
        self.target.as_ref().map(Target::name)
    }

    async fn perform_as(&self, actor: &mut Actor) -> Result<(), InteractionError> {
        self.validate()?;
        let target = match (&self.target, self.condition) {
            (_, WaitCondition::FixedDelay) | (None, _) => {
                return actor.pause(NAME, self.timeout).await;
            }
            (Some(target), _) => target,
        };

        let start = Instant::now();
        let deadline = start
            .checked_add(self.timeout)
            .ok_or_else(|| InteractionError::InvalidConfiguration {
                interaction: NAME,
                reason: format!("timeout {:?} is out of range", self.timeout),
            })?;
        let mut polls: u32 = 0;
        loop {
            polls += 1;
            if self.holds(actor, target).await? {
                debug!(polls, elapsed_ms = start.elapsed().as_millis() as u64, "wait condition met");
                return Ok(());
            }
            let now = Instant::now();
            if now >= deadline {
                return Err(InteractionError::WaitTimeoutExceeded {
                    interaction: NAME,
                    condition: self.condition,
                    target: Some(target.name().to_string()),
                    timeout: self.timeout,
                });
            }
            actor
                .pause(NAME, self.poll_interval.min(deadline - now))
                .await?;
        }
    }
}

/// Step-by-step construction of a [`Wait`]; defaults to a fixed 10 s delay.
#[derive(Debug, Clone)]
pub struct WaitBuilder {
    condition: WaitCondition,
    target: Option<Target>,
    expected_text: Option<String>,
    timeout: Duration,
    poll_interval: Duration,
}

impl Default for WaitBuilder {
    fn default() -> Self {
        Self {
            condition: WaitCondition::FixedDelay,
            target: None,
            expected_text: None,
            timeout: DEFAULT_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl WaitBuilder {
    pub fn condition(mut self, condition: WaitCondition) -> Self {
        self.condition = condition;
        self
    }

    pub fn target(mut self, target: Target) -> Self {
        self.target = Some(target);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout_seconds(self, seconds: u64) -> Self {
        self.timeout(Duration::from_secs(seconds))
    }

    pub fn timeout_millis(self, millis: u64) -> Self {
        self.timeout(Duration::from_millis(millis))
    }

    pub fn text(mut self, expected: impl Into<String>) -> Self {
        self.expected_text = Some(expected.into());
        self
    }

    pub fn poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Builds the wait, rejecting combinations that could never run.
    pub fn build(self) -> Result<Wait, InteractionError> {
        let wait = Wait {
            condition: self.condition,
            target: self.target,
            expected_text: self.expected_text,
            timeout: self.timeout,
            poll_interval: self.poll_interval,
        };
        wait.validate()?;
        Ok(wait)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::Locator;

    fn spinner() -> Target {
        Target::the("spinner").located_by(Locator::id("progress"))
    }

    #[test]
    fn factories_use_ten_second_default() {
        for wait in [
            Wait::until_visible(spinner()),
            Wait::until_clickable(spinner()),
            Wait::until_present(spinner()),
            Wait::until_invisible(spinner()),
            Wait::until_selected(spinner()),
            Wait::until_text_appears(spinner(), "Done"),
        ] {
            assert_eq!(wait.timeout(), DEFAULT_TIMEOUT);
            assert_eq!(wait.poll_interval(), DEFAULT_POLL_INTERVAL);
            assert!(wait.validate().is_ok(), "{}", wait.condition());
        }
    }

    #[test]
    fn fixed_delay_factories() {
        assert_eq!(Wait::for_millis(200).timeout(), Duration::from_millis(200));
        assert_eq!(Wait::for_seconds(3).timeout(), Duration::from_secs(3));
        assert_eq!(Wait::for_minutes(2).timeout(), Duration::from_secs(120));
        assert_eq!(Wait::for_seconds(1).condition(), WaitCondition::FixedDelay);
    }

    #[test]
    fn for_minutes_saturates() {
        assert_eq!(Wait::for_minutes(u64::MAX).timeout(), Duration::from_secs(u64::MAX));
    }

    #[test]
    fn builder_defaults_to_fixed_delay() {
        let wait = Wait::builder().build().unwrap();
        assert_eq!(wait.condition(), WaitCondition::FixedDelay);
        assert_eq!(wait.timeout(), DEFAULT_TIMEOUT);
    }

    #[test]
    fn builder_rejects_element_condition_without_target() {
        let err = Wait::builder()
            .condition(WaitCondition::Selected)
            .timeout_seconds(2)
            .build()
            .unwrap_err();
        assert!(matches!(err, InteractionError::InvalidConfiguration { .. }));
        assert!(err.to_string().contains("selected"));
    }

    #[test]
    fn text_condition_needs_expected_text() {
        let err = Wait::builder()
            .condition(WaitCondition::TextPresent)
            .target(spinner())
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("expected text"));

        let ok = Wait::builder()
            .condition(WaitCondition::TextPresent)
            .target(spinner())
            .text("Done")
            .timeout_millis(1500)
            .build()
            .unwrap();
        assert_eq!(ok.timeout(), Duration::from_millis(1500));
    }

    #[test]
    fn condition_display() {
        assert_eq!(WaitCondition::Visible.to_string(), "visible");
        assert_eq!(WaitCondition::TextPresent.to_string(), "text present");
    }
}
