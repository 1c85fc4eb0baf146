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

//! # Trip Ledger
//!
//! A multi-currency travel expense tracker. Trips have participants who
//! record expenses in any of the supported currencies and settle up with
//! transfers. The library validates and repairs trip data, aggregates
//! spending without ever converting between currencies, and computes who
//! owes whom.
//!
//! ## Core Components
//!
//! - [`Currency`] and [`currency_meta`]: the closed catalog of supported
//!   currencies and their display metadata
//! - [`validate_trip_data`] / [`validate_expense_request`]: strict input checks
//! - [`sanitize_trip_data`]: lenient repair of cached trip snapshots
//! - [`summarize_by_currency`] and friends: per-currency aggregation
//! - [`settle`]: balances and suggested transfers
//! - [`TripService`]: trip operations over a [`TripStore`]
//!
//! ## Example
//!
//! ```
//! use trip_ledger::{MemoryStore, SettlementPolicy, TripDraft, TripService, ExpenseRequest};
//! use rust_decimal_macros::dec;
//!
//! let service = TripService::new(MemoryStore::new());
//! let draft = TripDraft {
//!     name: Some("Bangkok".into()),
//!     base_currency: Some("THB".into()),
//!     adults: Some(2.0),
//!     children: Some(0.0),
//!     travel_style: Some("urban".into()),
//!     ..TripDraft::default()
//! };
//! let trip = service.create_trip("me@example.com", draft).unwrap();
//!
//! let expense = service
//!     .record_expense(
//!         "me@example.com",
//!         ExpenseRequest {
//!             trip_id: trip.id.clone(),
//!             amount: dec!(150),
//!             currency: "THB".into(),
//!             category: "food".into(),
//!             description: "Pad thai".into(),
//!             notes: None,
//!             date: None,
//!             country_code: Some("TH".into()),
//!             is_planned: false,
//!             paid_by: None,
//!         },
//!     )
//!     .unwrap();
//! assert_eq!(expense.shares_total(), dec!(150));
//!
//! let overview = service
//!     .trip_overview("me@example.com", &trip.id, SettlementPolicy::PerCurrency)
//!     .unwrap();
//! assert_eq!(overview.summary.by_currency[0].total, dec!(150));
//! assert!(overview.settlement.is_settled());
//! ```
//!
//! ## Thread Safety
//!
//! All computations are pure functions over snapshots. The only shared
//! state is the store; [`MemoryStore`] accepts concurrent writers.

mod base;
pub mod country;
pub mod currency;
pub mod error;
mod expense;
pub mod sanitize;
mod service;
pub mod settings;
pub mod settlement;
mod store;
pub mod summary;
mod transfer;
mod trip;
pub mod validation;

pub use base::{ExpenseId, ParticipantId, TransferId, TripId, UserId};
pub use country::{CountryMeta, country_meta};
pub use currency::{
    Currency, CurrencyMeta, DEFAULT_CURRENCY, UNKNOWN_FLAG, currency_meta, format_amount,
    is_valid_currency, valid_currency_or_default,
};
pub use error::{ParseError, SplitError, StoreError, TripError, ValidationError};
pub use expense::{Expense, ExpenseCategory, ExpenseShare, SplitMethod};
pub use sanitize::{RepairedField, Sanitized, sanitize_trip_data, sanitize_trip_list, sanitize_trip_snapshot};
pub use service::{TripOverview, TripService};
pub use settings::Settings;
pub use settlement::{
    Balance, CurrencyLedger, SettlementPolicy, SettlementReport, SuggestedTransfer, settle,
    split_equally, suggest_transfers,
};
pub use store::{Identity, MemoryStore, StaticIdentity, TripStore};
pub use summary::{
    CategorySummary, CountrySummary, CurrencyTotal, ExpenseFilter, PayerSummary, Selection,
    TripSummary, summarize_by_category, summarize_by_country, summarize_by_currency,
    summarize_by_payer,
};
pub use transfer::Transfer;
pub use trip::{Participant, TravelStyle, Trip, User};
pub use validation::{
    ExpenseRequest, TransferRequest, TripDraft, first_error, is_valid_trip,
    validate_expense_request, validate_transfer_request, validate_trip_data,
};
