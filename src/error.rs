// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Error types for validation, splitting, persistence and trip operations.

use serde::Serialize;
use thiserror::Error;

/// A user-correctable problem with one input field.
///
/// Validation never fails fast: every offending field gets its own entry.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Errors parsing catalog codes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("unsupported currency '{0}'")]
    UnknownCurrency(String),

    #[error("unknown expense category '{0}'")]
    UnknownCategory(String),

    #[error("unknown travel style '{0}'")]
    UnknownTravelStyle(String),
}

/// Errors splitting an expense into shares.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SplitError {
    /// The split has nobody to share the amount
    #[error("cannot split an expense between zero participants")]
    NoParticipants,

    /// Amount is zero or negative
    #[error("invalid amount (must be positive)")]
    InvalidAmount,
}

/// Failures reported by the persistence collaborator.
///
/// These are passed through unchanged; retry policy belongs to the store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("storage conflict: {0}")]
    Conflict(String),
}

/// Errors from trip-level operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TripError {
    /// Input failed validation
    #[error("validation failed: {}", first_message(.0))]
    Validation(Vec<ValidationError>),

    /// Trip does not exist or belongs to someone else
    #[error("trip not found")]
    TripNotFound,

    /// Referenced participant is not part of the trip
    #[error("participant not found in trip")]
    ParticipantNotFound,

    /// Expense payer is not part of the trip
    #[error("payer does not belong to this trip")]
    PayerNotInTrip,

    #[error(transparent)]
    Split(#[from] SplitError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

fn first_message(errors: &[ValidationError]) -> &str {
    errors.first().map_or("no details", |e| e.message.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        assert_eq!(
            ValidationError::new("name", "Trip name is required").to_string(),
            "name: Trip name is required"
        );
        assert_eq!(
            ParseError::UnknownCurrency("XYZ".into()).to_string(),
            "unsupported currency 'XYZ'"
        );
        assert_eq!(
            SplitError::NoParticipants.to_string(),
            "cannot split an expense between zero participants"
        );
        assert_eq!(TripError::TripNotFound.to_string(), "trip not found");
        assert_eq!(
            TripError::PayerNotInTrip.to_string(),
            "payer does not belong to this trip"
        );
        assert_eq!(
            TripError::Store(StoreError::Unavailable("db down".into())).to_string(),
            "storage unavailable: db down"
        );
    }

    #[test]
    fn validation_error_reports_first_message() {
        let err = TripError::Validation(vec![
            ValidationError::new("name", "Trip name is required"),
            ValidationError::new("adults", "At least 1 adult is required"),
        ]);
        assert_eq!(err.to_string(), "validation failed: Trip name is required");
        assert_eq!(
            TripError::Validation(Vec::new()).to_string(),
            "validation failed: no details"
        );
    }

    #[test]
    fn errors_are_cloneable() {
        let error = TripError::Split(SplitError::InvalidAmount);
        let cloned = error.clone();
        assert_eq!(error, cloned);
    }
}
