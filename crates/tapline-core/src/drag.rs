//! Drag one element onto another.

use std::time::Duration;

use async_trait::async_trait;

use crate::actor::Actor;
use crate::error::InteractionError;
use crate::gesture::Gesture;
use crate::interaction::{dispatch, resolve_rect, Interaction};
use crate::target::Target;

pub const DEFAULT_DRAG_DURATION: Duration = Duration::from_millis(1000);

/// Presses the center of `source`, moves to the center of `destination`
/// over `duration` and releases.
///
/// Both targets are resolved before anything is dispatched, so a missing
/// destination never leaves a half-finished drag on screen.
#[derive(Debug, Clone)]
pub struct Drag {
    source: Target,
    destination: Target,
    duration: Duration,
}

impl Drag {
    pub fn new(source: Target, destination: Target) -> Self {
        Self {
            source,
            destination,
            duration: DEFAULT_DRAG_DURATION,
        }
    }

    /// Starts a drag from `source`; finish with [`DragFrom::to`].
    pub fn the(source: Target) -> DragFrom {
        DragFrom(source)
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }
}

/// Half-built [`Drag`] returned by [`Drag::the`].
#[derive(Debug, Clone)]
pub struct DragFrom(Target);

impl DragFrom {
    pub fn to(self, destination: Target) -> Drag {
        Drag::new(self.0, destination)
    }
}

#[async_trait]
impl Interaction for Drag {
    fn name(&self) -> &'static str {
        "drag"
    }

    fn target_name(&self) -> Option<&str> {
        Some(self.source.name())
    }

    async fn perform_as(&self, actor: &mut Actor) -> Result<(), InteractionError> {
        let from = resolve_rect(actor, self.name(), &self.source).await?;
        let to = resolve_rect(actor, self.name(), &self.destination).await?;
        for (rect, target) in [(&from, &self.source), (&to, &self.destination)] {
            rect.validate()
                .map_err(|e| InteractionError::from_geometry(self.name(), target.name(), e))?;
        }

        let gesture = Gesture::Stroke {
            from: from.center(),
            to: to.center(),
            duration: self.duration,
        }
        .build();
        dispatch(actor, self.name(), &gesture).await
    }
}
