//! Records of performed interactions.
//!
//! Every interaction an [`Actor`](crate::actor::Actor) attempts is logged as
//! an [`InteractionRecord`] with a unique identifier, timestamp, outcome and
//! duration. Records serialize to one JSON object per line, so a test run's
//! history can be appended to a file and replayed by other tools.
//!
//! # Example
//!
//! ```
//! use tapline_core::record::{InteractionRecord, Outcome};
//!
//! let record = InteractionRecord::new("tap", Some("login button".into()), Outcome::Success, 120);
//! let line = record.to_json_line().unwrap();
//! assert!(line.contains("\"interaction\":\"tap\""));
//! ```

use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How an interaction ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "message", rename_all = "snake_case")]
pub enum Outcome {
    /// The interaction completed.
    Success,

    /// The interaction failed with the given error message.
    Failure(String),

    /// The interaction was cancelled before completing.
    Cancelled,
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }
}

/// A logged interaction with metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionRecord {
    /// Unique identifier for this entry.
    pub id: Uuid,

    /// When the interaction started.
    pub timestamp: DateTime<Utc>,

    /// Name of the actor that performed it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor: Option<String>,

    /// Stable interaction name (`"tap"`, `"scroll_until"`, ...).
    pub interaction: String,

    /// Name of the primary target, if the interaction has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,

    pub outcome: Outcome,

    /// Wall-clock time the interaction took in milliseconds.
    pub duration_ms: u64,
}

impl InteractionRecord {
    /// Creates a new record stamped with a fresh UUID and the current time.
    pub fn new(
        interaction: impl Into<String>,
        target: Option<String>,
        outcome: Outcome,
        duration_ms: u64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            actor: None,
            interaction: interaction.into(),
            target,
            outcome,
            duration_ms,
        }
    }

    /// Attributes the record to a named actor.
    pub fn by(mut self, actor: impl Into<String>) -> Self {
        self.actor = Some(actor.into());
        self
    }

    /// Serializes the record as a single JSON line (without the trailing
    /// newline).
    pub fn to_json_line(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Appends `records` to `path` as JSON Lines, creating the file if needed.
pub fn append_json_lines(path: &Path, records: &[InteractionRecord]) -> std::io::Result<()> {
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    for record in records {
        let line = record.to_json_line().map_err(std::io::Error::other)?;
        writeln!(file, "{line}")?;
    }
    Ok(())
}
