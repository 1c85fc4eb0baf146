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

//! Lenient decoding of cached trip snapshots.
//!
//! Trips cached on a device may have been written by an older app version or
//! corrupted in place. Instead of rejecting them, each field is decoded in
//! isolation and replaced by a default when it is missing or invalid, so the
//! user is never locked out by stale local state. Every substitution is logged
//! and reported in [`Sanitized::repaired`], never raised as an error.
//!
//! | field | default |
//! |---|---|
//! | `id` | freshly generated |
//! | `name` | `"Untitled Trip"`; overlong names are truncated |
//! | `startDate` | today (UTC) |
//! | `endDate` | dropped |
//! | `baseCurrency` | [`DEFAULT_CURRENCY`] |
//! | `adults` | 2 |
//! | `children` | 0 |
//! | `travelStyle` | `other` |
//! | `tripStyleOther` | `"Unspecified"` when the style is `other` |
//! | `createdAt` | now |

use crate::base::TripId;
use crate::currency::{Currency, DEFAULT_CURRENCY};
use crate::trip::{TravelStyle, Trip};
use crate::validation::{MAX_TRIP_NAME, whole_count};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::warn;

const DEFAULT_NAME: &str = "Untitled Trip";
const DEFAULT_ADULTS: u32 = 2;
const DEFAULT_CHILDREN: u32 = 0;
const DEFAULT_STYLE_DESCRIPTION: &str = "Unspecified";

/// A field that had to be replaced while sanitizing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepairedField {
    pub field: &'static str,
    pub reason: &'static str,
}

/// A repaired trip together with the list of substitutions that were made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sanitized {
    pub trip: Trip,
    pub repaired: Vec<RepairedField>,
}

impl Sanitized {
    pub fn was_repaired(&self) -> bool {
        !self.repaired.is_empty()
    }
}

/// Outcome of decoding one field.
enum Decoded<T> {
    Valid(T),
    Defaulted { value: T, reason: &'static str },
}

/// Collects decoded fields and records every default that was applied.
struct Repairs {
    fields: Vec<RepairedField>,
}

impl Repairs {
    fn take<T>(&mut self, field: &'static str, decoded: Decoded<T>) -> T {
        match decoded {
            Decoded::Valid(value) => value,
            Decoded::Defaulted { value, reason } => {
                warn!(field, reason, "repaired cached trip field");
                self.fields.push(RepairedField { field, reason });
                value
            }
        }
    }
}

/// Repairs a cached trip record into a valid [`Trip`].
///
/// Returns `None` only when `data` is not a JSON object.
pub fn sanitize_trip_data(data: &Value) -> Option<Trip> {
    sanitize_trip_snapshot(data).map(|sanitized| sanitized.trip)
}

/// Like [`sanitize_trip_data`], also reporting which fields were repaired.
pub fn sanitize_trip_snapshot(data: &Value) -> Option<Sanitized> {
    let Value::Object(record) = data else {
        warn!("discarding cached trip that is not an object");
        return None;
    };

    let now = Utc::now();
    let mut repairs = Repairs { fields: Vec::new() };

    let id = repairs.take("id", decode_id(record));
    let name = repairs.take("name", decode_name(record));
    let start_date = repairs.take("startDate", decode_start_date(record, now));
    let end_date = repairs.take("endDate", decode_end_date(record, start_date));
    let base_currency = repairs.take("baseCurrency", decode_currency(record));
    let adults = repairs.take("adults", decode_count(record, "adults", 1, DEFAULT_ADULTS));
    let children = repairs.take(
        "children",
        decode_count(record, "children", 0, DEFAULT_CHILDREN),
    );
    let travel_style = repairs.take("travelStyle", decode_travel_style(record));
    let trip_style_other = repairs.take(
        "tripStyleOther",
        decode_style_description(record, travel_style),
    );
    let created_at = repairs.take("createdAt", decode_created_at(record, now));

    Some(Sanitized {
        trip: Trip {
            id,
            name,
            start_date,
            end_date,
            base_currency,
            adults,
            children,
            travel_style,
            trip_style_other,
            description: non_empty_str(record, "description").map(str::to_owned),
            created_at,
        },
        repaired: repairs.fields,
    })
}

/// Sanitizes a cached list of trips, dropping entries that are not objects.
pub fn sanitize_trip_list(data: &Value) -> Vec<Trip> {
    match data {
        Value::Array(items) => items.iter().filter_map(sanitize_trip_data).collect(),
        _ => {
            warn!("cached trip list is not an array; starting empty");
            Vec::new()
        }
    }
}

fn non_empty_str<'a>(record: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    record
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

fn decode_id(record: &Map<String, Value>) -> Decoded<TripId> {
    match non_empty_str(record, "id") {
        Some(id) => Decoded::Valid(TripId::from(id)),
        None => Decoded::Defaulted {
            value: TripId::generate(),
            reason: "missing id",
        },
    }
}

fn decode_name(record: &Map<String, Value>) -> Decoded<String> {
    match non_empty_str(record, "name") {
        Some(name) if name.trim().chars().count() > MAX_TRIP_NAME => {
            let truncated: String = name.trim().chars().take(MAX_TRIP_NAME).collect();
            Decoded::Defaulted {
                value: truncated.trim_end().to_owned(),
                reason: "name too long, truncated",
            }
        }
        Some(name) => Decoded::Valid(name.to_owned()),
        None => Decoded::Defaulted {
            value: DEFAULT_NAME.to_owned(),
            reason: "missing name",
        },
    }
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    value
        .parse::<NaiveDate>()
        .ok()
        .or_else(|| parse_timestamp(value).map(|ts| ts.date_naive()))
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}

fn decode_start_date(record: &Map<String, Value>, now: DateTime<Utc>) -> Decoded<NaiveDate> {
    match record.get("startDate").and_then(Value::as_str).and_then(parse_date) {
        Some(date) => Decoded::Valid(date),
        None => Decoded::Defaulted {
            value: now.date_naive(),
            reason: "missing or unparseable start date",
        },
    }
}

fn decode_end_date(record: &Map<String, Value>, start: NaiveDate) -> Decoded<Option<NaiveDate>> {
    match record.get("endDate") {
        None | Some(Value::Null) => Decoded::Valid(None),
        Some(value) => match value.as_str().and_then(parse_date) {
            Some(end) if end >= start => Decoded::Valid(Some(end)),
            Some(_) => Decoded::Defaulted {
                value: None,
                reason: "end date before start date",
            },
            None => Decoded::Defaulted {
                value: None,
                reason: "unparseable end date",
            },
        },
    }
}

fn decode_currency(record: &Map<String, Value>) -> Decoded<Currency> {
    match record
        .get("baseCurrency")
        .and_then(Value::as_str)
        .and_then(|code| code.parse::<Currency>().ok())
    {
        Some(currency) => Decoded::Valid(currency),
        None => Decoded::Defaulted {
            value: DEFAULT_CURRENCY,
            reason: "unsupported base currency",
        },
    }
}

fn decode_count(record: &Map<String, Value>, key: &str, min: u32, default: u32) -> Decoded<u32> {
    match record
        .get(key)
        .and_then(Value::as_f64)
        .and_then(whole_count)
        .filter(|n| *n >= min)
    {
        Some(n) => Decoded::Valid(n),
        None => Decoded::Defaulted {
            value: default,
            reason: "missing or invalid count",
        },
    }
}

fn decode_travel_style(record: &Map<String, Value>) -> Decoded<TravelStyle> {
    match record
        .get("travelStyle")
        .and_then(Value::as_str)
        .and_then(|s| s.parse::<TravelStyle>().ok())
    {
        Some(style) => Decoded::Valid(style),
        None => Decoded::Defaulted {
            value: TravelStyle::Other,
            reason: "missing or unknown travel style",
        },
    }
}

fn decode_style_description(
    record: &Map<String, Value>,
    style: TravelStyle,
) -> Decoded<Option<String>> {
    match (non_empty_str(record, "tripStyleOther"), style) {
        (Some(description), _) => Decoded::Valid(Some(description.to_owned())),
        (None, TravelStyle::Other) => Decoded::Defaulted {
            value: Some(DEFAULT_STYLE_DESCRIPTION.to_owned()),
            reason: "other travel style without description",
        },
        (None, _) => Decoded::Valid(None),
    }
}

fn decode_created_at(record: &Map<String, Value>, now: DateTime<Utc>) -> Decoded<DateTime<Utc>> {
    match record
        .get("createdAt")
        .and_then(Value::as_str)
        .and_then(parse_timestamp)
    {
        Some(ts) => Decoded::Valid(ts),
        None => Decoded::Defaulted {
            value: now,
            reason: "missing or unparseable creation time",
        },
    }
}
