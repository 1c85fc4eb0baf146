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

//! Strict validation of user input.
//!
//! Validators collect every problem into a list of [`ValidationError`]s and
//! never fail fast, so a form can highlight all bad fields at once. Field
//! names follow the JSON payloads (`baseCurrency`, `tripStyleOther`, ...).

use crate::base::{ParticipantId, TripId};
use crate::currency::{Currency, is_valid_currency};
use crate::error::ValidationError;
use crate::expense::ExpenseCategory;
use crate::trip::{TravelStyle, Trip};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;

pub(crate) const MAX_TRIP_NAME: usize = 100;
const MAX_DESCRIPTION: usize = 200;

/// Raw trip creation input, as submitted by a form or API client.
///
/// Counts are kept as floating-point numbers so a non-integer count can be
/// reported as a field error instead of failing deserialization.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripDraft {
    pub name: Option<String>,
    pub base_currency: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub adults: Option<f64>,
    pub children: Option<f64>,
    pub travel_style: Option<String>,
    pub trip_style_other: Option<String>,
    pub description: Option<String>,
}

impl TripDraft {
    /// Validates the draft and builds a new [`Trip`] with a fresh id.
    ///
    /// A missing start date defaults to today.
    pub fn into_trip(self) -> Result<Trip, Vec<ValidationError>> {
        let errors = validate_trip_data(&self);
        let (Some(name), Some(base_currency), Some(adults), Some(children), Some(travel_style)) = (
            self.name.map(|n| n.trim().to_owned()),
            self.base_currency.and_then(|c| c.parse::<Currency>().ok()),
            self.adults.and_then(whole_count),
            self.children.and_then(whole_count),
            self.travel_style.and_then(|s| s.parse::<TravelStyle>().ok()),
        ) else {
            return Err(errors);
        };
        if !errors.is_empty() {
            return Err(errors);
        }

        let now = Utc::now();
        Ok(Trip {
            id: TripId::generate(),
            name,
            start_date: self.start_date.unwrap_or_else(|| now.date_naive()),
            end_date: self.end_date,
            base_currency,
            adults,
            children,
            travel_style,
            trip_style_other: non_blank(self.trip_style_other),
            description: non_blank(self.description),
            created_at: now,
        })
    }
}

/// The draft an existing trip would have been created from, used to
/// re-validate trips that were read back from a cache.
impl From<&Trip> for TripDraft {
    fn from(trip: &Trip) -> Self {
        Self {
            name: Some(trip.name.clone()),
            base_currency: Some(trip.base_currency.code().to_owned()),
            start_date: Some(trip.start_date),
            end_date: trip.end_date,
            adults: Some(f64::from(trip.adults)),
            children: Some(f64::from(trip.children)),
            travel_style: Some(trip.travel_style.as_str().to_owned()),
            trip_style_other: trip.trip_style_other.clone(),
            description: trip.description.clone(),
        }
    }
}

/// Raw expense creation input.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseRequest {
    pub trip_id: TripId,
    pub amount: Decimal,
    pub currency: String,
    pub category: String,
    pub description: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub country_code: Option<String>,
    #[serde(default)]
    pub is_planned: bool,
    /// Payer; when absent the caller's own participant pays.
    #[serde(default, rename = "paidById")]
    pub paid_by: Option<ParticipantId>,
}

/// Raw transfer creation input.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    pub trip_id: TripId,
    #[serde(rename = "fromParticipant")]
    pub from: ParticipantId,
    #[serde(rename = "toParticipant")]
    pub to: ParticipantId,
    pub amount: Decimal,
    pub currency: String,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub note: Option<String>,
}

/// Validates trip creation input.
///
/// Returns an empty list when the draft is valid.
pub fn validate_trip_data(data: &TripDraft) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    match data.name.as_deref().map(str::trim) {
        None | Some("") => errors.push(ValidationError::new("name", "Trip name is required")),
        Some(name) if name.chars().count() > MAX_TRIP_NAME => errors.push(ValidationError::new(
            "name",
            format!("Trip name must be at most {MAX_TRIP_NAME} characters"),
        )),
        Some(_) => {}
    }

    match data.base_currency.as_deref() {
        None | Some("") => errors.push(ValidationError::new(
            "baseCurrency",
            "Base currency is required",
        )),
        Some(code) if !is_valid_currency(code) => errors.push(ValidationError::new(
            "baseCurrency",
            format!("Invalid currency. Must be one of: {}", supported_codes()),
        )),
        Some(_) => {}
    }

    if !data.adults.is_some_and(|n| whole_count(n).is_some_and(|n| n >= 1)) {
        errors.push(ValidationError::new("adults", "At least 1 adult is required"));
    }

    if !data.children.is_some_and(|n| whole_count(n).is_some()) {
        errors.push(ValidationError::new(
            "children",
            "Children count must be 0 or more",
        ));
    }

    let style = data
        .travel_style
        .as_deref()
        .and_then(|s| s.parse::<TravelStyle>().ok());
    if style.is_none() {
        errors.push(ValidationError::new("travelStyle", "Invalid travel style"));
    }

    if style == Some(TravelStyle::Other)
        && data
            .trip_style_other
            .as_deref()
            .is_none_or(|s| s.trim().is_empty())
    {
        errors.push(ValidationError::new(
            "tripStyleOther",
            "Travel style description is required when 'other' is selected",
        ));
    }

    if let (Some(start), Some(end)) = (data.start_date, data.end_date) {
        if end < start {
            errors.push(ValidationError::new(
                "endDate",
                "End date cannot be before the start date",
            ));
        }
    }

    errors
}

/// Returns `true` when the draft has no validation errors.
pub fn is_valid_trip(data: &TripDraft) -> bool {
    validate_trip_data(data).is_empty()
}

/// First error message, if any.
pub fn first_error(errors: &[ValidationError]) -> Option<&str> {
    errors.first().map(|e| e.message.as_str())
}

/// Validates expense creation input.
pub fn validate_expense_request(request: &ExpenseRequest) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if request.amount <= Decimal::ZERO {
        errors.push(ValidationError::new("amount", "Amount must be positive"));
    }

    if !is_valid_currency(&request.currency) {
        errors.push(ValidationError::new(
            "currency",
            format!("Invalid currency. Must be one of: {}", supported_codes()),
        ));
    }

    if request.category.parse::<ExpenseCategory>().is_err() {
        errors.push(ValidationError::new("category", "Invalid expense category"));
    }

    let description_len = request.description.trim().chars().count();
    if description_len == 0 {
        errors.push(ValidationError::new("description", "Description is required"));
    } else if request.description.chars().count() > MAX_DESCRIPTION {
        errors.push(ValidationError::new(
            "description",
            format!("Description must be at most {MAX_DESCRIPTION} characters"),
        ));
    }

    errors
}

/// Validates transfer creation input.
pub fn validate_transfer_request(request: &TransferRequest) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if request.amount <= Decimal::ZERO {
        errors.push(ValidationError::new("amount", "Amount must be positive"));
    }

    if !is_valid_currency(&request.currency) {
        errors.push(ValidationError::new(
            "currency",
            format!("Invalid currency. Must be one of: {}", supported_codes()),
        ));
    }

    if request.from == request.to {
        errors.push(ValidationError::new(
            "toParticipant",
            "A transfer needs two different participants",
        ));
    }

    errors
}

/// Converts a count to `u32` when it is a non-negative whole number.
pub(crate) fn whole_count(value: f64) -> Option<u32> {
    (value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value <= f64::from(u32::MAX))
        .then_some(value as u32)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

fn supported_codes() -> String {
    Currency::ALL
        .iter()
        .map(|c| c.code())
        .collect::<Vec<_>>()
        .join(", ")
}
