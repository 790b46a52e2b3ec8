//! Structured identity of a scheduled job run.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A job's base name plus an optional slot for jobs that run several times a day.
///
/// Stored as two columns, so `("fact", Some("evening"))` can never collide with a base
/// named `"fact_evening"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobKey {
    pub base: String,
    pub slot: Option<String>,
}

impl JobKey {
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            slot: None,
        }
    }

    pub fn with_slot(base: impl Into<String>, slot: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            slot: Some(slot.into()),
        }
    }

    /// Column value for the slot; the empty string stands for "no slot".
    pub(crate) fn slot_column(&self) -> &str {
        self.slot.as_deref().unwrap_or("")
    }
}

impl fmt::Display for JobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.slot {
            Some(slot) => write!(f, "{}[{}]", self.base, slot),
            None => f.write_str(&self.base),
        }
    }
}
