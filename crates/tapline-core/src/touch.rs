//! Single-point touch interactions: tap, double tap and long press.
//!
//! All three resolve their target once, press at the center of its frame and
//! return after the session reports the gesture complete.

use std::time::Duration;

use async_trait::async_trait;

use crate::actor::Actor;
use crate::error::InteractionError;
use crate::geometry::Point;
use crate::gesture::Gesture;
use crate::interaction::{dispatch, resolve_rect, Interaction};
use crate::target::Target;

/// Default pause between the two presses of a double tap.
pub const DEFAULT_DOUBLE_TAP_GAP: Duration = Duration::from_millis(200);

/// Default hold time of a long press.
pub const DEFAULT_LONG_PRESS: Duration = Duration::from_millis(1000);

/// Resolves `target` and returns the center of its frame.
async fn center_of(
    actor: &Actor,
    interaction: &'static str,
    target: &Target,
) -> Result<Point, InteractionError> {
    let rect = resolve_rect(actor, interaction, target).await?;
    rect.validate()
        .map_err(|e| InteractionError::from_geometry(interaction, target.name(), e))?;
    Ok(rect.center())
}

/// Taps the center of an element.
#[derive(Debug, Clone)]
pub struct Tap {
    target: Target,
}

impl Tap {
    pub fn on(target: Target) -> Self {
        Self { target }
    }
}

#[async_trait]
impl Interaction for Tap {
    fn name(&self) -> &'static str {
        "tap"
    }

    fn target_name(&self) -> Option<&str> {
        Some(self.target.name())
    }

    async fn perform_as(&self, actor: &mut Actor) -> Result<(), InteractionError> {
        let at = center_of(actor, self.name(), &self.target).await?;
        dispatch(actor, self.name(), &Gesture::Tap { at }.build()).await
    }
}

/// Two quick taps on the center of an element.
#[derive(Debug, Clone)]
pub struct DoubleTap {
    target: Target,
    gap: Duration,
}

impl DoubleTap {
    pub fn on(target: Target) -> Self {
        Self {
            target,
            gap: DEFAULT_DOUBLE_TAP_GAP,
        }
    }

    /// Sets the pause between the release of the first press and the second.
    pub fn with_gap(mut self, gap: Duration) -> Self {
        self.gap = gap;
        self
    }
}

#[async_trait]
impl Interaction for DoubleTap {
    fn name(&self) -> &'static str {
        "double_tap"
    }

    fn target_name(&self) -> Option<&str> {
        Some(self.target.name())
    }

    async fn perform_as(&self, actor: &mut Actor) -> Result<(), InteractionError> {
        let at = center_of(actor, self.name(), &self.target).await?;
        let gesture = Gesture::DoubleTap { at, gap: self.gap }.build();
        dispatch(actor, self.name(), &gesture).await
    }
}

/// Presses and holds the center of an element.
#[derive(Debug, Clone)]
pub struct LongPress {
    target: Target,
    hold: Duration,
}

impl LongPress {
    pub fn on(target: Target) -> Self {
        Self {
            target,
            hold: DEFAULT_LONG_PRESS,
        }
    }

    pub fn for_duration(mut self, hold: Duration) -> Self {
        self.hold = hold;
        self
    }
}

#[async_trait]
impl Interaction for LongPress {
    fn name(&self) -> &'static str {
        "long_press"
    }

    fn target_name(&self) -> Option<&str> {
        Some(self.target.name())
    }

    async fn perform_as(&self, actor: &mut Actor) -> Result<(), InteractionError> {
        let at = center_of(actor, self.name(), &self.target).await?;
        let gesture = Gesture::LongPress { at, hold: self.hold }.build();
        dispatch(actor, self.name(), &gesture).await
    }
}
