//! Screen-space geometry for touch gestures.
//!
//! Every coordinate a gesture touches is derived here from the most recently
//! resolved [`BoundingBox`] (or the viewport [`Dimension`]) plus the caller's
//! configured fraction or offset. Nothing in this module keeps state between
//! calls.
//!
//! Coordinates are in screen pixels with the origin at the top-left corner.
//!
//! # Example
//!
//! ```
//! use tapline_core::geometry::{linear_path, BoundingBox, Dimension, Direction, Point};
//!
//! let screen = BoundingBox::from(Dimension::new(1080, 1920));
//! let (start, end) = linear_path(&screen, Direction::Up, 0.8).unwrap();
//! assert_eq!(start, Point::new(540, 1536));
//! assert_eq!(end, Point::new(540, 0));
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Anchor used as the start of a gesture that travels towards the origin
/// (Up / Left), as a fraction of the axis extent.
pub const FAR_ANCHOR: f64 = 0.8;

/// Anchor used as the start of a gesture that travels away from the origin
/// (Down / Right).
pub const NEAR_ANCHOR: f64 = 0.2;

/// Offset from the element center at which pinch fingers sit when "closed".
pub const PINCH_INNER_OFFSET: i32 = 10;

/// Errors raised while computing gesture coordinates.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// The area has a non-positive width or height.
    #[error("degenerate area {width}x{height}")]
    DegenerateArea { width: i32, height: i32 },

    /// A travel fraction outside `(0, 1]`.
    #[error("fraction {0} is outside (0, 1]")]
    InvalidFraction(f64),

    /// A pinch distance that does not reach past the inner offset.
    #[error("pinch distance {0} must be greater than {PINCH_INNER_OFFSET}")]
    InvalidPinchDistance(i32),

    /// An area whose far edge lies outside the coordinate range.
    #[error("area at ({x}, {y}) sized {width}x{height} exceeds the coordinate range")]
    AreaOutOfRange { x: i32, y: i32, width: i32, height: i32 },

    /// A gesture point shifted outside the coordinate range.
    #[error("offset ({dx}, {dy}) from {from} exceeds the coordinate range")]
    CoordinateOverflow { from: Point, dx: i32, dy: i32 },
}

/// An immutable point in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Returns this point shifted by `(dx, dy)`.
    pub fn offset(self, dx: i32, dy: i32) -> Result<Self, GeometryError> {
        match (self.x.checked_add(dx), self.y.checked_add(dy)) {
            (Some(x), Some(y)) => Ok(Self::new(x, y)),
            _ => Err(GeometryError::CoordinateOverflow { from: self, dx, dy }),
        }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Size of the viewport (or any rectangle without an origin).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimension {
    pub width: i32,
    pub height: i32,
}

impl Dimension {
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }
}

/// The frame of a resolved element.
///
/// Derived fresh on every resolution and never mutated; it is the single
/// source of truth for center and anchor computations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// The x-coordinate of the top-left corner.
    pub x: i32,
    /// The y-coordinate of the top-left corner.
    pub y: i32,
    /// Width in pixels.
    pub width: i32,
    /// Height in pixels.
    pub height: i32,
}

impl BoundingBox {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    /// Center of the box, truncating odd extents.
    ///
    /// Saturates at the coordinate range for boxes that fail [`validate`](Self::validate).
    pub const fn center(&self) -> Point {
        Point::new(
            self.x.saturating_add(self.width / 2),
            self.y.saturating_add(self.height / 2),
        )
    }

    /// Returns `true` if `point` lies inside the box (edges inclusive).
    pub const fn contains(&self, point: Point) -> bool {
        point.x >= self.x
            && point.x <= self.x.saturating_add(self.width)
            && point.y >= self.y
            && point.y <= self.y.saturating_add(self.height)
    }

    /// Rejects boxes with a non-positive width or height, or whose far edge
    /// does not fit in screen coordinates.
    pub fn validate(&self) -> Result<(), GeometryError> {
        if self.width <= 0 || self.height <= 0 {
            return Err(GeometryError::DegenerateArea {
                width: self.width,
                height: self.height,
            });
        }
        if self.x.checked_add(self.width).is_none() || self.y.checked_add(self.height).is_none() {
            return Err(GeometryError::AreaOutOfRange {
                x: self.x,
                y: self.y,
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }
}

impl From<Dimension> for BoundingBox {
    /// The viewport as a box anchored at the screen origin.
    fn from(size: Dimension) -> Self {
        Self::new(0, 0, size.width, size.height)
    }
}

/// Direction of travel for linear gestures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// All four directions, in declaration order.
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// Returns `true` for Up and Down.
    pub const fn is_vertical(self) -> bool {
        matches!(self, Direction::Up | Direction::Down)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "up" => Ok(Direction::Up),
            "down" => Ok(Direction::Down),
            "left" => Ok(Direction::Left),
            "right" => Ok(Direction::Right),
            other => Err(format!(
                "invalid direction '{other}'. Use: up, down, left, right"
            )),
        }
    }
}

/// Checks that a travel fraction lies in `(0, 1]`.
pub fn validate_fraction(fraction: f64) -> Result<(), GeometryError> {
    if fraction > 0.0 && fraction <= 1.0 {
        Ok(())
    } else {
        Err(GeometryError::InvalidFraction(fraction))
    }
}

/// Computes the start and end points of a linear gesture over `area`.
///
/// The gesture starts at 80% of the movement axis for Up/Left and at 20% for
/// Down/Right, with the other coordinate pinned to the area's center line.
/// It travels `trunc(extent * fraction)` pixels in `direction`.
pub fn linear_path(
    area: &BoundingBox,
    direction: Direction,
    fraction: f64,
) -> Result<(Point, Point), GeometryError> {
    area.validate()?;
    validate_fraction(fraction)?;

    let center = area.center();
    let anchor = |extent: i32, at: f64| (extent as f64 * at) as i32;

    let start = match direction {
        Direction::Up => Point::new(center.x, area.y + anchor(area.height, FAR_ANCHOR)),
        Direction::Down => Point::new(center.x, area.y + anchor(area.height, NEAR_ANCHOR)),
        Direction::Left => Point::new(area.x + anchor(area.width, FAR_ANCHOR), center.y),
        Direction::Right => Point::new(area.x + anchor(area.width, NEAR_ANCHOR), center.y),
    };

    let travel = if direction.is_vertical() {
        anchor(area.height, fraction)
    } else {
        anchor(area.width, fraction)
    };

    let end = match direction {
        Direction::Up => start.offset(0, -travel)?,
        Direction::Down => start.offset(0, travel)?,
        Direction::Left => start.offset(-travel, 0)?,
        Direction::Right => start.offset(travel, 0)?,
    };

    Ok((start, end))
}

/// Whether the fingers of a pinch converge or diverge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PinchKind {
    /// Fingers move towards each other (zoom out).
    In,
    /// Fingers move apart (zoom in).
    Out,
}

impl fmt::Display for PinchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PinchKind::In => f.write_str("in"),
            PinchKind::Out => f.write_str("out"),
        }
    }
}

/// Start and end points for both fingers of a pinch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinchPaths {
    /// Finger travelling on the upper-left diagonal.
    pub first: (Point, Point),
    /// Finger travelling on the lower-right diagonal.
    pub second: (Point, Point),
}

/// Computes the two finger paths of a pinch around the center of `area`.
pub fn pinch_paths(
    area: &BoundingBox,
    kind: PinchKind,
    distance: i32,
) -> Result<PinchPaths, GeometryError> {
    area.validate()?;
    if distance <= PINCH_INNER_OFFSET {
        return Err(GeometryError::InvalidPinchDistance(distance));
    }

    let c = area.center();
    let first_inner = c.offset(-PINCH_INNER_OFFSET, -PINCH_INNER_OFFSET)?;
    let first_outer = c.offset(-distance, -distance)?;
    let second_inner = c.offset(PINCH_INNER_OFFSET, PINCH_INNER_OFFSET)?;
    let second_outer = c.offset(distance, distance)?;

    Ok(match kind {
        PinchKind::Out => PinchPaths {
            first: (first_inner, first_outer),
            second: (second_inner, second_outer),
        },
        PinchKind::In => PinchPaths {
            first: (first_outer, first_inner),
            second: (second_outer, second_inner),
        },
    })
}
