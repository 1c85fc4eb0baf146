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

//! Expenses and their per-participant shares.
//!
//! An [`Expense`] is paid by exactly one participant and split between one or
//! more participants. The only split method wired end to end is
//! [`SplitMethod::Equal`]; the enum exists so stored records can carry the
//! method without a schema change when more are added.

use crate::base::{ExpenseId, ParticipantId, TripId};
use crate::currency::Currency;
use crate::error::ParseError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Expense category tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpenseCategory {
    Flights,
    Accommodation,
    Food,
    Transportation,
    Attractions,
    Insurance,
    Shopping,
    Miscellaneous,
}

impl ExpenseCategory {
    pub const ALL: [ExpenseCategory; 8] = [
        ExpenseCategory::Flights,
        ExpenseCategory::Accommodation,
        ExpenseCategory::Food,
        ExpenseCategory::Transportation,
        ExpenseCategory::Attractions,
        ExpenseCategory::Insurance,
        ExpenseCategory::Shopping,
        ExpenseCategory::Miscellaneous,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ExpenseCategory::Flights => "flights",
            ExpenseCategory::Accommodation => "accommodation",
            ExpenseCategory::Food => "food",
            ExpenseCategory::Transportation => "transportation",
            ExpenseCategory::Attractions => "attractions",
            ExpenseCategory::Insurance => "insurance",
            ExpenseCategory::Shopping => "shopping",
            ExpenseCategory::Miscellaneous => "miscellaneous",
        }
    }
}

impl fmt::Display for ExpenseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExpenseCategory {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ExpenseCategory::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
            .ok_or_else(|| ParseError::UnknownCategory(s.to_owned()))
    }
}

/// How an expense is divided between its participants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitMethod {
    #[default]
    Equal,
}

/// One participant's portion of an expense.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseShare {
    pub expense_id: ExpenseId,
    pub participant_id: ParticipantId,
    pub share_amount: Decimal,
}

/// A single expense recorded against a trip.
///
/// # Invariants
///
/// - `amount` is positive and `currency` is supported (enforced by
///   [`crate::validate_expense_request`] before an expense is stored).
/// - `paid_by` belongs to the same trip.
/// - When `shares` is not empty their amounts sum exactly to `amount`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub id: ExpenseId,
    pub trip_id: TripId,
    pub amount: Decimal,
    pub currency: Currency,
    pub category: ExpenseCategory,
    #[serde(default)]
    pub country_code: Option<String>,
    pub description: String,
    #[serde(default)]
    pub notes: Option<String>,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub is_planned: bool,
    pub paid_by: ParticipantId,
    #[serde(default)]
    pub split_method: SplitMethod,
    #[serde(default)]
    pub shares: Vec<ExpenseShare>,
    pub created_at: DateTime<Utc>,
}

impl Expense {
    /// Creates an actual (not planned) expense dated now, without shares.
    pub fn new(
        trip_id: TripId,
        paid_by: ParticipantId,
        amount: Decimal,
        currency: Currency,
        category: ExpenseCategory,
        description: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: ExpenseId::generate(),
            trip_id,
            amount,
            currency,
            category,
            country_code: None,
            description: description.into(),
            notes: None,
            date: now,
            is_planned: false,
            paid_by,
            split_method: SplitMethod::Equal,
            shares: Vec::new(),
            created_at: now,
        }
    }

    pub fn with_country(mut self, code: impl Into<String>) -> Self {
        self.country_code = Some(code.into());
        self
    }

    pub fn with_date(mut self, date: DateTime<Utc>) -> Self {
        self.date = date;
        self
    }

    pub fn with_shares(mut self, shares: impl IntoIterator<Item = (ParticipantId, Decimal)>) -> Self {
        let expense_id = self.id.clone();
        self.shares = shares
            .into_iter()
            .map(|(participant_id, share_amount)| ExpenseShare {
                expense_id: expense_id.clone(),
                participant_id,
                share_amount,
            })
            .collect();
        self
    }

    pub fn planned(mut self) -> Self {
        self.is_planned = true;
        self
    }

    /// Participants sharing this expense, in share order.
    pub fn sharers(&self) -> impl Iterator<Item = &ParticipantId> {
        self.shares.iter().map(|share| &share.participant_id)
    }

    /// Sum of the recorded shares.
    pub fn shares_total(&self) -> Decimal {
        self.shares.iter().map(|share| share.share_amount).sum()
    }
}
