//! Operation inputs and their validation rules.
//!
//! # Invariants
//! - Titles are trimmed before the emptiness check and before persistence.
//! - Counts must be finite and `>= 0`.

use crate::model::event::EventId;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Rejected operation input.
#[derive(Debug, Clone, PartialEq)]
pub enum InputError {
    EmptyTitle,
    InvalidCount(f64),
}

impl Display for InputError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "title is required"),
            Self::InvalidCount(value) => {
                write!(f, "count must be a non-negative number, got {value}")
            }
        }
    }
}

impl Error for InputError {}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateEventInput {
    pub title: String,
    pub count: f64,
}

impl CreateEventInput {
    pub fn new(title: impl Into<String>, count: f64) -> Self {
        Self {
            title: title.into(),
            count,
        }
    }

    /// Returns the trimmed title and checked count.
    pub fn validate(&self) -> Result<(&str, f64), InputError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(InputError::EmptyTitle);
        }
        Ok((title, validate_count(self.count)?))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompleteEventInput {
    pub event_id: EventId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateRecordInput {
    pub event_id: EventId,
    pub count: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompleteRecordInput {
    pub event_id: EventId,
    /// Opens a successor record right after completing the current one.
    pub create_next: bool,
    /// Successor count. Absent or non-finite values fall back to `0`.
    pub next_count: Option<f64>,
}

impl CompleteRecordInput {
    /// Resolves the successor count, or `None` when no successor is requested.
    pub fn successor_count(&self) -> Result<Option<f64>, InputError> {
        if !self.create_next {
            return Ok(None);
        }
        let count = self
            .next_count
            .filter(|value| value.is_finite())
            .unwrap_or(0.0);
        validate_count(count).map(Some)
    }
}

/// Checks that `count` is finite and non-negative.
pub fn validate_count(count: f64) -> Result<f64, InputError> {
    if !count.is_finite() || count < 0.0 {
        return Err(InputError::InvalidCount(count));
    }
    Ok(count)
}
