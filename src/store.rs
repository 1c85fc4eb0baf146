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

//! Persistence and identity boundaries.
//!
//! The tracker does not own a database. It talks to one through
//! [`TripStore`], whose calls are each assumed atomic and consistent; the
//! core never opens transactions, takes locks across calls or retries.
//! [`MemoryStore`] is the in-process implementation used by the CLI and the
//! tests.
//!
//! # Thread Safety
//!
//! [`MemoryStore`] keeps trips in a [`DashMap`], each trip's rows behind its
//! own [`RwLock`], so writers on different trips never contend and every
//! call observes a consistent snapshot of one trip.

use crate::base::{TripId, UserId};
use crate::error::StoreError;
use crate::expense::Expense;
use crate::transfer::Transfer;
use crate::trip::{Participant, Trip, User};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use parking_lot::RwLock;
use std::sync::Arc;

/// Storage operations the trip service depends on.
pub trait TripStore: Send + Sync {
    /// Returns the user with `email`, creating it on first use.
    fn find_or_create_user(&self, email: &str, name: Option<&str>) -> Result<User, StoreError>;

    fn create_trip(&self, owner: &UserId, trip: Trip) -> Result<Trip, StoreError>;

    /// Looks a trip up scoped to its owner.
    ///
    /// A trip owned by someone else is indistinguishable from a missing one.
    fn find_trip_by_id(&self, id: &TripId, owner: &UserId) -> Result<Option<Trip>, StoreError>;

    /// The owner's trips, newest first.
    fn list_trips(&self, owner: &UserId) -> Result<Vec<Trip>, StoreError>;

    /// Deletes a trip with its participants, expenses and transfers.
    ///
    /// Returns `false` when the owner has no such trip.
    fn delete_trip(&self, id: &TripId, owner: &UserId) -> Result<bool, StoreError>;

    fn create_participant(&self, participant: Participant) -> Result<Participant, StoreError>;

    /// Participants in creation order.
    fn list_participants(&self, trip: &TripId) -> Result<Vec<Participant>, StoreError>;

    fn create_expense(&self, expense: Expense) -> Result<Expense, StoreError>;

    /// Expenses, most recent date first.
    fn list_expenses(&self, trip: &TripId) -> Result<Vec<Expense>, StoreError>;

    fn create_transfer(&self, transfer: Transfer) -> Result<Transfer, StoreError>;

    /// Transfers, most recent date first.
    fn list_transfers(&self, trip: &TripId) -> Result<Vec<Transfer>, StoreError>;
}

/// Source of the caller's identity.
///
/// Returns `None` for anonymous callers; whether to fall back to a demo
/// identity is the caller's decision, not the core's.
pub trait Identity {
    fn current_user_email(&self) -> Option<String>;
}

/// An identity fixed at construction time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticIdentity(pub Option<String>);

impl Identity for StaticIdentity {
    fn current_user_email(&self) -> Option<String> {
        self.0.clone()
    }
}

#[derive(Debug, Default)]
struct TripRows {
    participants: Vec<Participant>,
    expenses: Vec<Expense>,
    transfers: Vec<Transfer>,
}

#[derive(Debug)]
struct TripRecord {
    owner: UserId,
    trip: Trip,
    rows: RwLock<TripRows>,
}

/// In-memory [`TripStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    /// Users indexed by email.
    users: DashMap<String, User>,
    trips: DashMap<TripId, Arc<TripRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, trip: &TripId) -> Result<Arc<TripRecord>, StoreError> {
        self.trips
            .get(trip)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| StoreError::Conflict(format!("trip {trip} does not exist")))
    }
}

fn sorted_by_date_desc<T: Clone>(rows: &[T], date: impl Fn(&T) -> chrono::DateTime<chrono::Utc>) -> Vec<T> {
    let mut rows = rows.to_vec();
    rows.sort_by(|a, b| date(b).cmp(&date(a)));
    rows
}

impl TripStore for MemoryStore {
    fn find_or_create_user(&self, email: &str, name: Option<&str>) -> Result<User, StoreError> {
        let user = self
            .users
            .entry(email.to_owned())
            .or_insert_with(|| User {
                id: UserId::generate(),
                email: email.to_owned(),
                name: name.map(str::to_owned),
            });
        Ok(user.value().clone())
    }

    fn create_trip(&self, owner: &UserId, trip: Trip) -> Result<Trip, StoreError> {
        match self.trips.entry(trip.id.clone()) {
            Entry::Occupied(_) => Err(StoreError::Conflict(format!(
                "trip {} already exists",
                trip.id
            ))),
            Entry::Vacant(entry) => {
                entry.insert(Arc::new(TripRecord {
                    owner: owner.clone(),
                    trip: trip.clone(),
                    rows: RwLock::new(TripRows::default()),
                }));
                Ok(trip)
            }
        }
    }

    fn find_trip_by_id(&self, id: &TripId, owner: &UserId) -> Result<Option<Trip>, StoreError> {
        Ok(self
            .trips
            .get(id)
            .filter(|record| &record.owner == owner)
            .map(|record| record.trip.clone()))
    }

    fn list_trips(&self, owner: &UserId) -> Result<Vec<Trip>, StoreError> {
        let mut trips: Vec<Trip> = self
            .trips
            .iter()
            .filter(|record| &record.owner == owner)
            .map(|record| record.trip.clone())
            .collect();
        trips.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(trips)
    }

    fn delete_trip(&self, id: &TripId, owner: &UserId) -> Result<bool, StoreError> {
        Ok(self
            .trips
            .remove_if(id, |_, record| &record.owner == owner)
            .is_some())
    }

    fn create_participant(&self, participant: Participant) -> Result<Participant, StoreError> {
        let record = self.record(&participant.trip_id)?;
        let mut rows = record.rows.write();
        if rows.participants.iter().any(|p| p.id == participant.id) {
            return Err(StoreError::Conflict(format!(
                "participant {} already exists",
                participant.id
            )));
        }
        rows.participants.push(participant.clone());
        Ok(participant)
    }

    fn list_participants(&self, trip: &TripId) -> Result<Vec<Participant>, StoreError> {
        Ok(self.record(trip)?.rows.read().participants.clone())
    }

    fn create_expense(&self, expense: Expense) -> Result<Expense, StoreError> {
        let record = self.record(&expense.trip_id)?;
        let mut rows = record.rows.write();
        if rows.expenses.iter().any(|e| e.id == expense.id) {
            return Err(StoreError::Conflict(format!(
                "expense {} already exists",
                expense.id
            )));
        }
        if !rows.participants.iter().any(|p| p.id == expense.paid_by) {
            return Err(StoreError::Conflict(format!(
                "payer {} is not a participant of trip {}",
                expense.paid_by, expense.trip_id
            )));
        }
        rows.expenses.push(expense.clone());
        Ok(expense)
    }

    fn list_expenses(&self, trip: &TripId) -> Result<Vec<Expense>, StoreError> {
        let record = self.record(trip)?;
        let rows = record.rows.read();
        Ok(sorted_by_date_desc(&rows.expenses, |e| e.date))
    }

    fn create_transfer(&self, transfer: Transfer) -> Result<Transfer, StoreError> {
        let record = self.record(&transfer.trip_id)?;
        let mut rows = record.rows.write();
        if rows.transfers.iter().any(|t| t.id == transfer.id) {
            return Err(StoreError::Conflict(format!(
                "transfer {} already exists",
                transfer.id
            )));
        }
        rows.transfers.push(transfer.clone());
        Ok(transfer)
    }

    fn list_transfers(&self, trip: &TripId) -> Result<Vec<Transfer>, StoreError> {
        let record = self.record(trip)?;
        let rows = record.rows.read();
        Ok(sorted_by_date_desc(&rows.transfers, |t| t.date))
    }
}
