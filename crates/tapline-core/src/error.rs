//! Errors surfaced by interactions.

use std::time::Duration;

use thiserror::Error;

use crate::geometry::{Direction, GeometryError};
use crate::scroll_until::StopCondition;
use crate::session::SessionError;
use crate::wait::WaitCondition;

/// Why an interaction failed.
///
/// Every variant carries the name of the interaction that raised it, and the
/// target name where one was involved, so a failed step in a test report can
/// be traced to the gesture without a backtrace.
#[derive(Error, Debug)]
pub enum InteractionError {
    /// The target resolved but its geometry cannot anchor a gesture.
    #[error("{interaction}: invalid target '{target}': {source}")]
    InvalidTarget {
        interaction: &'static str,
        target: String,
        #[source]
        source: GeometryError,
    },

    /// A required element could not be resolved; nothing was dispatched.
    #[error("{interaction}: element '{target}' not found")]
    ElementNotFound {
        interaction: &'static str,
        target: String,
    },

    /// The session rejected or failed to execute the gesture.
    #[error("{interaction}: gesture dispatch failed: {source}")]
    SessionDispatch {
        interaction: &'static str,
        #[source]
        source: SessionError,
    },

    /// A session query (lookup, state, geometry) failed.
    #[error("{interaction}: session query failed: {source}")]
    Session {
        interaction: &'static str,
        #[source]
        source: SessionError,
    },

    /// A scroll loop ran out of attempts.
    #[error(
        "{interaction}: '{target}' still not {condition} after {attempts} scroll attempts {direction}"
    )]
    ConditionNotMet {
        interaction: &'static str,
        target: String,
        condition: StopCondition,
        direction: Direction,
        attempts: u32,
    },

    /// A wait deadline passed before its condition held.
    #[error("{interaction}: timed out after {timeout:?} waiting for {condition}{}", target_suffix(.target))]
    WaitTimeoutExceeded {
        interaction: &'static str,
        condition: WaitCondition,
        target: Option<String>,
        timeout: Duration,
    },

    /// A mandatory option is missing or out of range.
    #[error("{interaction}: invalid configuration: {reason}")]
    InvalidConfiguration {
        interaction: &'static str,
        reason: String,
    },

    /// The caller cancelled the interaction while it was waiting.
    #[error("{interaction}: cancelled")]
    Cancelled { interaction: &'static str },
}

fn target_suffix(target: &Option<String>) -> String {
    match target {
        Some(name) => format!(" on '{name}'"),
        None => String::new(),
    }
}

impl InteractionError {
    /// The interaction that raised this error.
    pub fn interaction(&self) -> &'static str {
        match self {
            InteractionError::InvalidTarget { interaction, .. }
            | InteractionError::ElementNotFound { interaction, .. }
            | InteractionError::SessionDispatch { interaction, .. }
            | InteractionError::Session { interaction, .. }
            | InteractionError::ConditionNotMet { interaction, .. }
            | InteractionError::WaitTimeoutExceeded { interaction, .. }
            | InteractionError::InvalidConfiguration { interaction, .. }
            | InteractionError::Cancelled { interaction } => interaction,
        }
    }

    /// Returns `true` for backend faults a scroll loop may retry past.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            InteractionError::SessionDispatch { .. } | InteractionError::Session { .. }
        )
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, InteractionError::Cancelled { .. })
    }

    /// Maps a geometry failure to the matching precondition error.
    ///
    /// Bad areas are a property of the target; bad fractions and distances
    /// come from the caller's configuration.
    pub(crate) fn from_geometry(
        interaction: &'static str,
        target: &str,
        err: GeometryError,
    ) -> Self {
        match err {
            GeometryError::DegenerateArea { .. } | GeometryError::AreaOutOfRange { .. } => {
                InteractionError::InvalidTarget {
                    interaction,
                    target: target.to_string(),
                    source: err,
                }
            }
            GeometryError::InvalidFraction(_)
            | GeometryError::InvalidPinchDistance(_)
            | GeometryError::CoordinateOverflow { .. } => {
                InteractionError::InvalidConfiguration {
                    interaction,
                    reason: err.to_string(),
                }
            }
        }
    }
}
