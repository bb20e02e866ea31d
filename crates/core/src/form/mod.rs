//! Draft state for the record forms.
//!
//! A form holds the editable shape of one record and returns a fresh draft on
//! every edit. It owns presence validation only: everything else, such as a
//! malformed date, is left to the store and surfaces as a store error.

mod chart;
mod player;

use std::fmt;

use thiserror::Error;

use crate::{models::ActorId, store::Record};

pub use chart::{ChartField, ChartForm};
pub use player::{PlayerField, PlayerForm};

/// A field that must be filled before a draft can be submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequiredField {
    /// Player name.
    Name,
    /// Chart session date.
    Date,
    /// Chart participation status.
    Status,
    /// Owning player of a new chart.
    Player,
}

impl RequiredField {
    /// Lowercase label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Date => "date",
            Self::Status => "status",
            Self::Player => "player",
        }
    }
}

impl fmt::Display for RequiredField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Submission blocked because required fields are empty.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("missing required {}: {}", noun(.missing), join(.missing))]
pub struct ValidationFailure {
    /// Every empty required field, in form order.
    pub missing: Vec<RequiredField>,
}

impl ValidationFailure {
    /// Failure naming `missing`.
    pub fn new(missing: Vec<RequiredField>) -> Self {
        Self { missing }
    }

    /// `Ok(())` when nothing is missing.
    pub(crate) fn check(missing: Vec<RequiredField>) -> Result<(), Self> {
        if missing.is_empty() {
            Ok(())
        } else {
            Err(Self::new(missing))
        }
    }
}

fn noun(missing: &[RequiredField]) -> &'static str {
    if missing.len() == 1 {
        "field"
    } else {
        "fields"
    }
}

fn join(missing: &[RequiredField]) -> String {
    missing
        .iter()
        .map(|field| field.label())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Trimmed text, or `None` when nothing but whitespace was entered.
pub(crate) fn normalize_text(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Draft of one record, convertible into store payloads.
pub trait RecordForm: Clone + Send + Sync {
    /// Record the form edits.
    type Record: Record;

    /// Draft seeded from an existing record.
    fn from_record(record: &Self::Record) -> Self;

    /// Required fields currently empty.
    fn missing_fields(&self) -> Vec<RequiredField>;

    /// Update payload replacing the record's editable fields.
    fn to_changes(&self) -> Result<<Self::Record as Record>::Update, ValidationFailure>;

    /// Insert payload written on behalf of `actor`.
    fn to_insert(
        &self,
        actor: ActorId,
    ) -> Result<<Self::Record as Record>::Insert, ValidationFailure>;
}
