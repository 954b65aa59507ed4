//! Scroll until a target reaches a condition.
//!
//! [`ScrollUntil`] alternates a condition check with one scroll gesture, at
//! most `max_attempts` times, then checks once more. The first satisfied
//! check ends the loop without further scrolling:
//!
//! ```text
//! attempt 0: check -> scroll -> pause
//! attempt 1: check -> scroll -> pause
//! ...
//! final:     check -> ConditionNotMet
//! ```
//!
//! A backend fault while checking or scrolling is logged and skipped unless
//! it happens on the last attempt, in which case it is returned. A missing
//! container and bad configuration fail at once.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use tapline_core::scroll_until::{ScrollUntil, StopCondition};
//! use tapline_core::target::{Locator, Target};
//!
//! let footer = Target::the("footer").located_by(Locator::accessibility_id("footer"));
//! let scroll = ScrollUntil::builder()
//!     .target(footer)
//!     .condition(StopCondition::Clickable)
//!     .max_attempts(5)
//!     .wait_between(Duration::from_millis(100))
//!     .build()
//!     .unwrap();
//! assert_eq!(scroll.policy().max_attempts, 5);
//! ```

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::actor::Actor;
use crate::error::InteractionError;
use crate::geometry::{validate_fraction, Direction};
use crate::interaction::{lookup, Interaction};
use crate::session::{ElementId, Lookup, SessionError};
use crate::swipe::LinearStroke;
use crate::target::Target;

const NAME: &str = "scroll_until";

pub const DEFAULT_FRACTION: f64 = 0.8;
pub const DEFAULT_SCROLL_DURATION: Duration = Duration::from_millis(200);
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;
pub const DEFAULT_WAIT_BETWEEN: Duration = Duration::from_millis(200);

/// Defaults of the container factories, tuned for shorter scroll areas.
pub const CONTAINER_FRACTION: f64 = 0.5;
pub const CONTAINER_SCROLL_DURATION: Duration = Duration::from_millis(600);
pub const CONTAINER_WAIT_BETWEEN: Duration = Duration::from_millis(500);

/// Pause between attempts when built through [`ScrollUntil::builder`].
pub const BUILDER_WAIT_BETWEEN: Duration = Duration::from_millis(80);

/// When to stop scrolling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StopCondition {
    /// The target resolves and is displayed.
    Visible,
    /// The target resolves, is displayed and is enabled.
    Clickable,
    /// The target no longer resolves.
    Disappears,
}

impl fmt::Display for StopCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StopCondition::Visible => "visible",
            StopCondition::Clickable => "clickable",
            StopCondition::Disappears => "gone",
        })
    }
}

/// How to scroll between checks. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrollPolicy {
    pub direction: Direction,
    /// Scroll inside this element instead of the viewport.
    pub container: Option<Target>,
    /// Fraction of the area's extent each scroll travels.
    pub fraction: f64,
    /// Duration of each scroll gesture.
    pub duration: Duration,
    pub max_attempts: u32,
    /// Pause after each scroll before the next check.
    pub wait_between: Duration,
}

impl ScrollPolicy {
    fn viewport(direction: Direction) -> Self {
        Self {
            direction,
            container: None,
            fraction: DEFAULT_FRACTION,
            duration: DEFAULT_SCROLL_DURATION,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            wait_between: DEFAULT_WAIT_BETWEEN,
        }
    }

    fn container(direction: Direction, container: Target) -> Self {
        Self {
            direction,
            container: Some(container),
            fraction: CONTAINER_FRACTION,
            duration: CONTAINER_SCROLL_DURATION,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            wait_between: CONTAINER_WAIT_BETWEEN,
        }
    }

    fn stroke(&self) -> LinearStroke {
        LinearStroke {
            direction: self.direction,
            container: self.container.clone(),
            fraction: self.fraction,
            duration: self.duration,
        }
    }
}

/// Bounded scroll loop that stops once `target` meets `condition`.
#[derive(Debug, Clone)]
pub struct ScrollUntil {
    target: Target,
    condition: StopCondition,
    policy: ScrollPolicy,
}

impl ScrollUntil {
    pub fn new(target: Target, condition: StopCondition, policy: ScrollPolicy) -> Self {
        Self {
            target,
            condition,
            policy,
        }
    }

    pub fn down_to_find(target: Target) -> Self {
        Self::new(target, StopCondition::Visible, ScrollPolicy::viewport(Direction::Down))
    }

    pub fn up_to_find(target: Target) -> Self {
        Self::new(target, StopCondition::Visible, ScrollPolicy::viewport(Direction::Up))
    }

    pub fn left_to_find(target: Target) -> Self {
        Self::new(target, StopCondition::Visible, ScrollPolicy::viewport(Direction::Left))
    }

    pub fn right_to_find(target: Target) -> Self {
        Self::new(target, StopCondition::Visible, ScrollPolicy::viewport(Direction::Right))
    }

    /// Scrolls down inside `container` until `target` is visible.
    pub fn down_to_find_in(target: Target, container: Target) -> Self {
        Self::new(
            target,
            StopCondition::Visible,
            ScrollPolicy::container(Direction::Down, container),
        )
    }

    pub fn up_to_find_in(target: Target, container: Target) -> Self {
        Self::new(
            target,
            StopCondition::Visible,
            ScrollPolicy::container(Direction::Up, container),
        )
    }

    pub fn down_until_clickable(target: Target) -> Self {
        Self::new(target, StopCondition::Clickable, ScrollPolicy::viewport(Direction::Down))
    }

    pub fn up_until_clickable(target: Target) -> Self {
        Self::new(target, StopCondition::Clickable, ScrollPolicy::viewport(Direction::Up))
    }

    pub fn down_until_disappears(target: Target) -> Self {
        Self::new(target, StopCondition::Disappears, ScrollPolicy::viewport(Direction::Down))
    }

    pub fn up_until_disappears(target: Target) -> Self {
        Self::new(target, StopCondition::Disappears, ScrollPolicy::viewport(Direction::Up))
    }

    pub fn builder() -> ScrollUntilBuilder {
        ScrollUntilBuilder::default()
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.policy.max_attempts = max_attempts;
        self
    }

    pub fn with_wait_between(mut self, wait_between: Duration) -> Self {
        self.policy.wait_between = wait_between;
        self
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn condition(&self) -> StopCondition {
        self.condition
    }

    pub fn policy(&self) -> &ScrollPolicy {
        &self.policy
    }

    /// Re-resolves the target and evaluates the stop condition.
    ///
    /// A stale handle counts as unsatisfied for Visible and Clickable; the
    /// next check resolves again.
    async fn is_satisfied(&self, actor: &Actor) -> Result<bool, InteractionError> {
        let id = match lookup(actor, NAME, &self.target).await? {
            Lookup::NotFound => return Ok(self.condition == StopCondition::Disappears),
            Lookup::Found(_) if self.condition == StopCondition::Disappears => return Ok(false),
            Lookup::Found(id) => id,
        };

        match displayed_state(actor, &id, self.condition).await {
            Ok(satisfied) => Ok(satisfied),
            Err(e) if e.is_stale() => Ok(false),
            Err(source) => Err(InteractionError::Session {
                interaction: NAME,
                source,
            }),
        }
    }

    /// One loop step: check, then scroll if unsatisfied.
    async fn attempt(&self, actor: &Actor, stroke: &LinearStroke) -> Result<bool, InteractionError> {
        if self.is_satisfied(actor).await? {
            return Ok(true);
        }
        stroke.perform(actor, NAME).await?;
        Ok(false)
    }
}

#[async_trait]
impl Interaction for ScrollUntil {
    fn name(&self) -> &'static str {
        NAME
    }

    fn target_name(&self) -> Option<&str> {
        Some(self.target.name())
    }

    async fn perform_as(&self, actor: &mut Actor) -> Result<(), InteractionError> {
        let stroke = self.policy.stroke();
        stroke.check_fraction(NAME)?;
        let max_attempts = self.policy.max_attempts;

        for attempt in 0..max_attempts {
            match self.attempt(actor, &stroke).await {
                Ok(true) => {
                    debug!(attempt, condition = %self.condition, "stop condition met");
                    return Ok(());
                }
                Ok(false) => {}
                Err(e) if e.is_transient() && attempt + 1 < max_attempts => {
                    warn!(attempt = attempt + 1, error = %e, "scroll attempt failed, continuing");
                }
                Err(e) => return Err(e),
            }
            actor.pause(NAME, self.policy.wait_between).await?;
        }

        if self.is_satisfied(actor).await? {
            debug!(attempts = max_attempts, condition = %self.condition, "stop condition met after final scroll");
            return Ok(());
        }
        Err(InteractionError::ConditionNotMet {
            interaction: NAME,
            target: self.target.name().to_string(),
            condition: self.condition,
            direction: self.policy.direction,
            attempts: max_attempts,
        })
    }
}

async fn displayed_state(
    actor: &Actor,
    id: &ElementId,
    condition: StopCondition,
) -> Result<bool, SessionError> {
    let session = actor.session();
    if !session.is_displayed(id).await? {
        return Ok(false);
    }
    match condition {
        StopCondition::Clickable => session.is_enabled(id).await,
        StopCondition::Visible | StopCondition::Disappears => Ok(true),
    }
}

/// Step-by-step construction of a [`ScrollUntil`].
#[derive(Debug, Clone)]
pub struct ScrollUntilBuilder {
    target: Option<Target>,
    condition: StopCondition,
    policy: ScrollPolicy,
}

impl Default for ScrollUntilBuilder {
    fn default() -> Self {
        Self {
            target: None,
            condition: StopCondition::Visible,
            policy: ScrollPolicy {
                wait_between: BUILDER_WAIT_BETWEEN,
                ..ScrollPolicy::viewport(Direction::Down)
            },
        }
    }
}

impl ScrollUntilBuilder {
    pub fn target(mut self, target: Target) -> Self {
        self.target = Some(target);
        self
    }

    pub fn direction(mut self, direction: Direction) -> Self {
        self.policy.direction = direction;
        self
    }

    pub fn condition(mut self, condition: StopCondition) -> Self {
        self.condition = condition;
        self
    }

    pub fn container(mut self, container: Target) -> Self {
        self.policy.container = Some(container);
        self
    }

    pub fn fraction(mut self, fraction: f64) -> Self {
        self.policy.fraction = fraction;
        self
    }

    pub fn duration(mut self, duration: Duration) -> Self {
        self.policy.duration = duration;
        self
    }

    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.policy.max_attempts = max_attempts;
        self
    }

    pub fn wait_between(mut self, wait_between: Duration) -> Self {
        self.policy.wait_between = wait_between;
        self
    }

    pub fn build(self) -> Result<ScrollUntil, InteractionError> {
        let target = self.target.ok_or_else(|| InteractionError::InvalidConfiguration {
            interaction: NAME,
            reason: "a target element is required".to_string(),
        })?;
        validate_fraction(self.policy.fraction).map_err(|e| InteractionError::InvalidConfiguration {
            interaction: NAME,
            reason: e.to_string(),
        })?;
        Ok(ScrollUntil::new(target, self.condition, self.policy))
    }
}
