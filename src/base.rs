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

//! Core identifier types for trips, participants, expenses, transfers and users.
//!
//! Identifiers are opaque strings. Freshly created entities get a random v4
//! UUID, while identifiers read back from storage (including older cached
//! snapshots such as `trip_1712345678`) are accepted as long as they are
//! non-empty.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Generates a new random identifier.
            pub fn generate() -> Self {
                Self(Uuid::new_v4().to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

define_id!(
    /// Unique identifier for a trip.
    TripId
);

define_id!(
    /// Unique identifier for a participant of a trip.
    ///
    /// Participants are scoped to a single trip; the same person joining two
    /// trips is two participants.
    ParticipantId
);

define_id!(
    /// Unique identifier for an expense.
    ExpenseId
);

define_id!(
    /// Unique identifier for a settlement transfer between participants.
    TransferId
);

define_id!(
    /// Unique identifier for a user account (the owner of trips).
    UserId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_unique() {
        let a = TripId::generate();
        let b = TripId::generate();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 36);
    }

    #[test]
    fn ids_serialize_transparently() {
        let id = ParticipantId::from("alice");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"alice\"");
        let back: ParticipantId = serde_json::from_str("\"alice\"").unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn display_is_the_raw_string() {
        assert_eq!(ExpenseId::from("trip_123").to_string(), "trip_123");
    }
}
