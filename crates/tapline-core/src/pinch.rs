//! Two-finger pinch around the center of an element.

use std::time::Duration;

use async_trait::async_trait;

use crate::actor::Actor;
use crate::error::InteractionError;
use crate::geometry::{pinch_paths, GeometryError, PinchKind, PINCH_INNER_OFFSET};
use crate::gesture::Gesture;
use crate::interaction::{dispatch, resolve_rect, Interaction};
use crate::target::Target;

pub const DEFAULT_PINCH_DURATION: Duration = Duration::from_millis(1000);

/// Default distance from the center to each finger's outer position.
pub const DEFAULT_PINCH_DISTANCE: i32 = 100;

/// Pinch in (fingers converge) or out (fingers diverge) on an element.
#[derive(Debug, Clone)]
pub struct Pinch {
    target: Target,
    kind: PinchKind,
    distance: i32,
    duration: Duration,
}

impl Pinch {
    pub fn new(kind: PinchKind, target: Target) -> Self {
        Self {
            target,
            kind,
            distance: DEFAULT_PINCH_DISTANCE,
            duration: DEFAULT_PINCH_DURATION,
        }
    }

    /// Fingers move from the outer offset towards the center.
    pub fn in_on(target: Target) -> Self {
        Self::new(PinchKind::In, target)
    }

    /// Fingers move from near the center outwards.
    pub fn out_on(target: Target) -> Self {
        Self::new(PinchKind::Out, target)
    }

    pub fn with_distance(mut self, distance: i32) -> Self {
        self.distance = distance;
        self
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }
}

#[async_trait]
impl Interaction for Pinch {
    fn name(&self) -> &'static str {
        match self.kind {
            PinchKind::In => "pinch_in",
            PinchKind::Out => "pinch_out",
        }
    }

    fn target_name(&self) -> Option<&str> {
        Some(self.target.name())
    }

    async fn perform_as(&self, actor: &mut Actor) -> Result<(), InteractionError> {
        let name = self.name();
        if self.distance <= PINCH_INNER_OFFSET {
            return Err(InteractionError::InvalidConfiguration {
                interaction: name,
                reason: GeometryError::InvalidPinchDistance(self.distance).to_string(),
            });
        }
        let rect = resolve_rect(actor, name, &self.target).await?;
        let paths = pinch_paths(&rect, self.kind, self.distance)
            .map_err(|e| InteractionError::from_geometry(name, self.target.name(), e))?;

        let gesture = Gesture::Pinch {
            paths,
            duration: self.duration,
        }
        .build();
        dispatch(actor, name, &gesture).await
    }
}
