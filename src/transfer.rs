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

//! Settlement payments between participants of a trip.

use crate::base::{ParticipantId, TransferId, TripId};
use crate::currency::Currency;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Money handed from one participant to another to settle balances.
///
/// `from` and `to` are always different participants of the same trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transfer {
    pub id: TransferId,
    pub trip_id: TripId,
    #[serde(rename = "fromParticipant")]
    pub from: ParticipantId,
    #[serde(rename = "toParticipant")]
    pub to: ParticipantId,
    pub amount: Decimal,
    pub currency: Currency,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub note: Option<String>,
}

impl Transfer {
    /// Creates a transfer dated now.
    pub fn new(
        trip_id: TripId,
        from: ParticipantId,
        to: ParticipantId,
        amount: Decimal,
        currency: Currency,
    ) -> Self {
        Self {
            id: TransferId::generate(),
            trip_id,
            from,
            to,
            amount,
            currency,
            date: Utc::now(),
            note: None,
        }
    }

    pub fn with_date(mut self, date: DateTime<Utc>) -> Self {
        self.date = date;
        self
    }
}
