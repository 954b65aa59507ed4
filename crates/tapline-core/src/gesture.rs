//! Timed pointer-event sequences.
//!
//! A [`GestureSequence`] is one or more independently identified
//! [`PointerTrack`]s, each an ordered list of [`PointerAction`]s. The whole
//! sequence is submitted to the session in a single call; the backend
//! interleaves the tracks of multi-finger gestures.
//!
//! The serde representation matches the W3C WebDriver "perform actions"
//! input-source format, so a sequence can be sent to any WebDriver/Appium
//! endpoint as-is.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use tapline_core::geometry::Point;
//! use tapline_core::gesture::Gesture;
//!
//! let sequence = Gesture::Tap { at: Point::new(125, 220) }.build();
//! assert_eq!(sequence.tracks().len(), 1);
//! assert_eq!(sequence.duration(), Duration::from_millis(100));
//! ```

use std::time::Duration;

use serde::{Serialize, Serializer};

use crate::geometry::{PinchPaths, Point};

/// How long a single tap holds the pointer down.
pub const TAP_HOLD: Duration = Duration::from_millis(100);

/// How long each press of a double tap holds the pointer down.
pub const DOUBLE_TAP_HOLD: Duration = Duration::from_millis(50);

/// Primary (left / touch contact) pointer button.
const PRIMARY_BUTTON: u8 = 0;

fn as_millis<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(duration.as_millis() as u64)
}

/// Coordinate space a pointer move is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    Viewport,
}

/// A single timed step of a pointer track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PointerAction {
    /// Move to `(x, y)` over `duration`; the backend interpolates the path.
    #[serde(rename = "pointerMove")]
    Move {
        #[serde(serialize_with = "as_millis")]
        duration: Duration,
        x: i32,
        y: i32,
        origin: Origin,
    },
    /// Press the pointer.
    #[serde(rename = "pointerDown")]
    Down { button: u8 },
    /// Release the pointer.
    #[serde(rename = "pointerUp")]
    Up { button: u8 },
    /// Hold the current pointer state.
    Pause {
        #[serde(serialize_with = "as_millis")]
        duration: Duration,
    },
}

impl PointerAction {
    /// Time this action occupies on its track.
    pub fn duration(&self) -> Duration {
        match self {
            PointerAction::Move { duration, .. } | PointerAction::Pause { duration } => *duration,
            PointerAction::Down { .. } | PointerAction::Up { .. } => Duration::ZERO,
        }
    }
}

/// Kind of pointer device a track drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerKind {
    Touch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
struct PointerParameters {
    #[serde(rename = "pointerType")]
    pointer_type: PointerKind,
}

/// One finger's timeline within a gesture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PointerTrack {
    #[serde(rename = "type")]
    source: &'static str,
    id: String,
    parameters: PointerParameters,
    actions: Vec<PointerAction>,
}

impl PointerTrack {
    /// Creates an empty touch track with the given pointer id.
    pub fn finger(id: impl Into<String>) -> Self {
        Self {
            source: "pointer",
            id: id.into(),
            parameters: PointerParameters {
                pointer_type: PointerKind::Touch,
            },
            actions: Vec::new(),
        }
    }

    /// Moves the pointer to `point`, taking `duration` to get there.
    pub fn move_to(mut self, point: Point, duration: Duration) -> Self {
        self.actions.push(PointerAction::Move {
            duration,
            x: point.x,
            y: point.y,
            origin: Origin::Viewport,
        });
        self
    }

    pub fn press(mut self) -> Self {
        self.actions.push(PointerAction::Down { button: PRIMARY_BUTTON });
        self
    }

    pub fn release(mut self) -> Self {
        self.actions.push(PointerAction::Up { button: PRIMARY_BUTTON });
        self
    }

    pub fn pause(mut self, duration: Duration) -> Self {
        self.actions.push(PointerAction::Pause { duration });
        self
    }

    /// Touch down at `from`, travel to `to` over `duration`, lift.
    pub fn stroke(self, from: Point, to: Point, duration: Duration) -> Self {
        self.move_to(from, Duration::ZERO)
            .press()
            .move_to(to, duration)
            .release()
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> PointerKind {
        self.parameters.pointer_type
    }

    pub fn actions(&self) -> &[PointerAction] {
        &self.actions
    }

    /// Sum of the durations of every action on the track.
    pub fn duration(&self) -> Duration {
        self.actions.iter().map(PointerAction::duration).sum()
    }
}

/// An assembled gesture ready for dispatch.
///
/// Built per invocation and consumed once by the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GestureSequence {
    #[serde(rename = "actions")]
    tracks: Vec<PointerTrack>,
}

impl GestureSequence {
    pub fn single(track: PointerTrack) -> Self {
        Self { tracks: vec![track] }
    }

    /// Combines independently timed tracks into one concurrent gesture.
    pub fn concurrent(tracks: Vec<PointerTrack>) -> Self {
        Self { tracks }
    }

    pub fn tracks(&self) -> &[PointerTrack] {
        &self.tracks
    }

    /// Wall-clock length of the gesture: the longest of its tracks.
    pub fn duration(&self) -> Duration {
        self.tracks
            .iter()
            .map(PointerTrack::duration)
            .max()
            .unwrap_or_default()
    }

    /// The final pointer position of the first track, if it moved at all.
    pub fn end_point(&self) -> Option<Point> {
        self.tracks.first()?.actions.iter().rev().find_map(|a| match a {
            PointerAction::Move { x, y, .. } => Some(Point::new(*x, *y)),
            _ => None,
        })
    }
}

/// The gesture kinds the interaction layer knows how to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    /// Short press and release.
    Tap { at: Point },
    /// Two short presses separated by `gap`.
    DoubleTap { at: Point, gap: Duration },
    /// Press and hold for `hold`.
    LongPress { at: Point, hold: Duration },
    /// Single-finger press, move and release (drag, swipe, scroll).
    Stroke {
        from: Point,
        to: Point,
        duration: Duration,
    },
    /// Two fingers moving concurrently.
    Pinch { paths: PinchPaths, duration: Duration },
}

impl Gesture {
    /// Returns a short, static name for this gesture kind suitable for
    /// tracing span metadata.
    pub fn name(&self) -> &'static str {
        match self {
            Gesture::Tap { .. } => "tap",
            Gesture::DoubleTap { .. } => "double_tap",
            Gesture::LongPress { .. } => "long_press",
            Gesture::Stroke { .. } => "stroke",
            Gesture::Pinch { .. } => "pinch",
        }
    }

    /// Assembles the pointer tracks for this gesture.
    pub fn build(&self) -> GestureSequence {
        match *self {
            Gesture::Tap { at } => GestureSequence::single(
                PointerTrack::finger("finger")
                    .move_to(at, Duration::ZERO)
                    .press()
                    .pause(TAP_HOLD)
                    .release(),
            ),
            Gesture::DoubleTap { at, gap } => GestureSequence::single(
                PointerTrack::finger("finger")
                    .move_to(at, Duration::ZERO)
                    .press()
                    .pause(DOUBLE_TAP_HOLD)
                    .release()
                    .pause(gap)
                    .press()
                    .pause(DOUBLE_TAP_HOLD)
                    .release(),
            ),
            Gesture::LongPress { at, hold } => GestureSequence::single(
                PointerTrack::finger("finger")
                    .move_to(at, Duration::ZERO)
                    .press()
                    .pause(hold)
                    .release(),
            ),
            Gesture::Stroke { from, to, duration } => {
                GestureSequence::single(PointerTrack::finger("finger").stroke(from, to, duration))
            }
            Gesture::Pinch { paths, duration } => GestureSequence::concurrent(vec![
                PointerTrack::finger("finger1").stroke(paths.first.0, paths.first.1, duration),
                PointerTrack::finger("finger2").stroke(paths.second.0, paths.second.1, duration),
            ]),
        }
    }
}
