//! Linear one-finger gestures: swipes and directional scrolls.
//!
//! Both travel a fraction of an area's extent in a [`Direction`], starting
//! from the anchor [`linear_path`] picks for that direction. A swipe covers
//! the whole viewport by default; a scroll can be confined to a container
//! element.
//!
//! ```
//! use std::time::Duration;
//! use tapline_core::geometry::Direction;
//! use tapline_core::swipe::{Scroll, Swipe};
//!
//! let flick = Swipe::up().by(0.5).over(Duration::from_millis(300));
//! assert_eq!(flick.direction(), Direction::Up);
//!
//! let page = Scroll::down();
//! assert_eq!(page.fraction(), 0.7);
//! ```

use std::time::Duration;

use async_trait::async_trait;

use crate::actor::Actor;
use crate::error::InteractionError;
use crate::geometry::{linear_path, validate_fraction, BoundingBox, Direction};
use crate::gesture::Gesture;
use crate::interaction::{dispatch, resolve_rect, viewport, Interaction};
use crate::target::Target;

pub const DEFAULT_SWIPE_FRACTION: f64 = 0.8;
pub const DEFAULT_SWIPE_DURATION: Duration = Duration::from_millis(500);
pub const DEFAULT_SCROLL_FRACTION: f64 = 0.7;
pub const DEFAULT_SCROLL_DURATION: Duration = Duration::from_millis(800);

/// A single stroke over the viewport or a container.
///
/// Shared by [`Swipe`], [`Scroll`] and the scroll-until loop; the area is
/// resolved again on every call.
#[derive(Debug, Clone)]
pub(crate) struct LinearStroke {
    pub(crate) direction: Direction,
    pub(crate) container: Option<Target>,
    pub(crate) fraction: f64,
    pub(crate) duration: Duration,
}

impl LinearStroke {
    pub(crate) fn check_fraction(&self, interaction: &'static str) -> Result<(), InteractionError> {
        validate_fraction(self.fraction)
            .map_err(|e| InteractionError::from_geometry(interaction, "", e))
    }

    pub(crate) async fn perform(
        &self,
        actor: &Actor,
        interaction: &'static str,
    ) -> Result<(), InteractionError> {
        self.check_fraction(interaction)?;
        let (area, area_name) = match &self.container {
            Some(container) => (
                resolve_rect(actor, interaction, container).await?,
                container.name(),
            ),
            None => (BoundingBox::from(viewport(actor, interaction).await?), "viewport"),
        };
        let (from, to) = linear_path(&area, self.direction, self.fraction)
            .map_err(|e| InteractionError::from_geometry(interaction, area_name, e))?;

        let gesture = Gesture::Stroke {
            from,
            to,
            duration: self.duration,
        }
        .build();
        dispatch(actor, interaction, &gesture).await
    }
}

macro_rules! linear_interaction {
    ($(#[$meta:meta])* $ty:ident, $name:literal, $fraction:expr, $duration:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        pub struct $ty {
            stroke: LinearStroke,
        }

        impl $ty {
            pub fn towards(direction: Direction) -> Self {
                Self {
                    stroke: LinearStroke {
                        direction,
                        container: None,
                        fraction: $fraction,
                        duration: $duration,
                    },
                }
            }

            pub fn up() -> Self {
                Self::towards(Direction::Up)
            }

            pub fn down() -> Self {
                Self::towards(Direction::Down)
            }

            pub fn left() -> Self {
                Self::towards(Direction::Left)
            }

            pub fn right() -> Self {
                Self::towards(Direction::Right)
            }

            /// Confines the gesture to `container` instead of the viewport.
            pub fn within(mut self, container: Target) -> Self {
                self.stroke.container = Some(container);
                self
            }

            /// Fraction of the area's extent to travel, in `(0, 1]`.
            pub fn by(mut self, fraction: f64) -> Self {
                self.stroke.fraction = fraction;
                self
            }

            /// Time the finger takes to travel.
            pub fn over(mut self, duration: Duration) -> Self {
                self.stroke.duration = duration;
                self
            }

            pub fn direction(&self) -> Direction {
                self.stroke.direction
            }

            pub fn fraction(&self) -> f64 {
                self.stroke.fraction
            }

            pub fn duration(&self) -> Duration {
                self.stroke.duration
            }
        }

        #[async_trait]
        impl Interaction for $ty {
            fn name(&self) -> &'static str {
                $name
            }

            fn target_name(&self) -> Option<&str> {
                self.stroke.container.as_ref().map(Target::name)
            }

            async fn perform_as(&self, actor: &mut Actor) -> Result<(), InteractionError> {
                self.stroke.perform(actor, $name).await
            }
        }
    };
}

linear_interaction!(
    /// A quick stroke across the screen, by default 80% of the viewport in
    /// 500 ms.
    Swipe,
    "swipe",
    DEFAULT_SWIPE_FRACTION,
    DEFAULT_SWIPE_DURATION
);

linear_interaction!(
    /// A slower stroke that moves content, by default 70% of the area in
    /// 800 ms.
    Scroll,
    "scroll",
    DEFAULT_SCROLL_FRACTION,
    DEFAULT_SCROLL_DURATION
);

impl Scroll {
    pub fn up_in(container: Target) -> Self {
        Self::up().within(container)
    }

    pub fn down_in(container: Target) -> Self {
        Self::down().within(container)
    }

    pub fn left_in(container: Target) -> Self {
        Self::left().within(container)
    }

    pub fn right_in(container: Target) -> Self {
        Self::right().within(container)
    }
}
