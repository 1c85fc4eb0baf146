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

//! Trips, their owners and participants.
//!
//! A [`Trip`] serializes to the device-local snapshot format:
//!
//! ```json
//! {"id": "...", "name": "Bangkok", "startDate": "2025-03-01", "baseCurrency": "THB",
//!  "adults": 2, "children": 0, "travelStyle": "urban", "createdAt": "2025-02-01T10:00:00Z"}
//! ```
//!
//! Optional fields (`tripStyleOther`, `endDate`, `description`) are omitted
//! when absent. Reading that format back from an untrusted source should go
//! through [`crate::sanitize_trip_data`].

use crate::base::{ParticipantId, TripId, UserId};
use crate::currency::Currency;
use crate::error::ParseError;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of trip, chosen when the trip is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TravelStyle {
    Honeymoon,
    Family,
    PostArmy,
    Urban,
    /// Requires a free-text description in [`Trip::trip_style_other`].
    Other,
}

impl TravelStyle {
    pub const ALL: [TravelStyle; 5] = [
        TravelStyle::Honeymoon,
        TravelStyle::Family,
        TravelStyle::PostArmy,
        TravelStyle::Urban,
        TravelStyle::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TravelStyle::Honeymoon => "honeymoon",
            TravelStyle::Family => "family",
            TravelStyle::PostArmy => "post-army",
            TravelStyle::Urban => "urban",
            TravelStyle::Other => "other",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TravelStyle::Honeymoon => "Honeymoon",
            TravelStyle::Family => "Family trip",
            TravelStyle::PostArmy => "Post-army trip",
            TravelStyle::Urban => "City break",
            TravelStyle::Other => "Other",
        }
    }
}

impl fmt::Display for TravelStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TravelStyle {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TravelStyle::ALL
            .into_iter()
            .find(|style| style.as_str() == s)
            .ok_or_else(|| ParseError::UnknownTravelStyle(s.to_owned()))
    }
}

/// A trip owned by a single user.
///
/// Instances are built through [`crate::TripDraft::into_trip`] or
/// [`crate::sanitize_trip_data`], both of which guarantee the invariants:
/// `adults >= 1`, a supported base currency, and a description whenever the
/// travel style is [`TravelStyle::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trip {
    pub id: TripId,
    pub name: String,
    pub start_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    pub base_currency: Currency,
    pub adults: u32,
    pub children: u32,
    pub travel_style: TravelStyle,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trip_style_other: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Trip {
    pub fn travelers(&self) -> u32 {
        self.adults + self.children
    }

    /// Human-readable travel style, using the free-text description for `other`.
    pub fn travel_style_label(&self) -> &str {
        match (self.travel_style, self.trip_style_other.as_deref()) {
            (TravelStyle::Other, Some(other)) => other,
            (style, _) => style.label(),
        }
    }
}

/// The account that owns trips, identified by email at the auth boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub name: Option<String>,
}

/// Someone taking part in a trip's expenses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub id: ParticipantId,
    pub trip_id: TripId,
    pub name: String,
    pub email: Option<String>,
}

impl Participant {
    /// Name given to the participant created implicitly for the trip owner.
    pub const DEFAULT_NAME: &'static str = "Me";

    pub fn new(trip_id: TripId, name: impl Into<String>, email: Option<String>) -> Self {
        Self {
            id: ParticipantId::generate(),
            trip_id,
            name: name.into(),
            email,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_trip() -> Trip {
        Trip {
            id: TripId::from("trip_1"),
            name: "Bangkok".into(),
            start_date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            end_date: None,
            base_currency: Currency::THB,
            adults: 2,
            children: 1,
            travel_style: TravelStyle::Urban,
            trip_style_other: None,
            description: None,
            created_at: "2025-02-01T10:00:00Z".parse().unwrap(),
        }
    }

    #[test]
    fn travel_style_parses_kebab_case() {
        assert_eq!("post-army".parse::<TravelStyle>(), Ok(TravelStyle::PostArmy));
        assert_eq!(
            "PostArmy".parse::<TravelStyle>(),
            Err(ParseError::UnknownTravelStyle("PostArmy".into()))
        );
        assert_eq!(
            serde_json::to_string(&TravelStyle::PostArmy).unwrap(),
            "\"post-army\""
        );
    }

    #[test]
    fn trip_serializes_to_snapshot_format() {
        let json = serde_json::to_value(sample_trip()).unwrap();
        assert_eq!(json["startDate"], "2025-03-01");
        assert_eq!(json["baseCurrency"], "THB");
        assert_eq!(json["travelStyle"], "urban");
        assert_eq!(json["createdAt"], "2025-02-01T10:00:00Z");
        assert!(json.get("tripStyleOther").is_none());
        assert!(json.get("endDate").is_none());
    }

    #[test]
    fn travelers_counts_adults_and_children() {
        assert_eq!(sample_trip().travelers(), 3);
    }

    #[test]
    fn other_style_label_uses_description() {
        let mut trip = sample_trip();
        assert_eq!(trip.travel_style_label(), "City break");
        trip.travel_style = TravelStyle::Other;
        trip.trip_style_other = Some("Ski season".into());
        assert_eq!(trip.travel_style_label(), "Ski season");
    }
}
