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

//! Trip operations on top of a [`TripStore`].
//!
//! Every operation is scoped to the caller's email. Validation runs before
//! anything touches the store, and a trip owned by someone else is reported
//! exactly like a missing one.

use crate::base::{ParticipantId, TripId};
use crate::currency::Currency;
use crate::error::TripError;
use crate::expense::{Expense, ExpenseCategory};
use crate::settlement::{SettlementPolicy, SettlementReport, settle, split_equally};
use crate::store::TripStore;
use crate::summary::TripSummary;
use crate::transfer::Transfer;
use crate::trip::{Participant, Trip, User};
use crate::validation::{
    ExpenseRequest, TransferRequest, TripDraft, validate_expense_request,
    validate_transfer_request,
};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

/// Everything a trip page shows, computed from one read of the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TripOverview {
    pub trip: Trip,
    pub participants: Vec<Participant>,
    pub summary: TripSummary,
    pub settlement: SettlementReport,
}

pub struct TripService<S: TripStore> {
    store: Arc<S>,
}

impl<S: TripStore> Clone for TripService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: TripStore> TripService<S> {
    pub fn new(store: S) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    pub fn with_store(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn user(&self, email: &str) -> Result<User, TripError> {
        Ok(self.store.find_or_create_user(email, None)?)
    }

    fn owned_trip(&self, user: &User, trip_id: &TripId) -> Result<Trip, TripError> {
        self.store
            .find_trip_by_id(trip_id, &user.id)?
            .ok_or(TripError::TripNotFound)
    }

    /// Validates `draft` and stores it as a new trip owned by `email`.
    pub fn create_trip(&self, email: &str, draft: TripDraft) -> Result<Trip, TripError> {
        let trip = draft.into_trip().map_err(TripError::Validation)?;
        let user = self.user(email)?;
        let trip = self.store.create_trip(&user.id, trip)?;
        info!(trip_id = %trip.id, owner = %user.id, "trip created");
        Ok(trip)
    }

    pub fn list_trips(&self, email: &str) -> Result<Vec<Trip>, TripError> {
        let user = self.user(email)?;
        Ok(self.store.list_trips(&user.id)?)
    }

    /// Deletes a trip and everything recorded on it.
    pub fn delete_trip(&self, email: &str, trip_id: &TripId) -> Result<(), TripError> {
        let user = self.user(email)?;
        if !self.store.delete_trip(trip_id, &user.id)? {
            return Err(TripError::TripNotFound);
        }
        info!(%trip_id, "trip deleted");
        Ok(())
    }

    pub fn add_participant(
        &self,
        email: &str,
        trip_id: &TripId,
        name: &str,
        participant_email: Option<String>,
    ) -> Result<Participant, TripError> {
        let user = self.user(email)?;
        let trip = self.owned_trip(&user, trip_id)?;
        let participant = self
            .store
            .create_participant(Participant::new(trip.id, name.trim(), participant_email))?;
        debug!(participant_id = %participant.id, "participant added");
        Ok(participant)
    }

    /// The participant standing for the caller: the one with the caller's
    /// email, else the one named "Me", else a new one.
    fn caller_participant(
        &self,
        user: &User,
        trip: &Trip,
        participants: &mut Vec<Participant>,
    ) -> Result<ParticipantId, TripError> {
        let existing = participants
            .iter()
            .find(|p| p.email.as_deref() == Some(user.email.as_str()))
            .or_else(|| {
                participants
                    .iter()
                    .find(|p| p.name == Participant::DEFAULT_NAME)
            });
        if let Some(participant) = existing {
            return Ok(participant.id.clone());
        }

        let name = user
            .name
            .clone()
            .unwrap_or_else(|| Participant::DEFAULT_NAME.to_owned());
        let created = self.store.create_participant(Participant::new(
            trip.id.clone(),
            name,
            Some(user.email.clone()),
        ))?;
        debug!(participant_id = %created.id, trip_id = %trip.id, "caller participant created");
        let id = created.id.clone();
        participants.push(created);
        Ok(id)
    }

    /// Validates and stores an expense split equally between every
    /// participant of the trip.
    pub fn record_expense(&self, email: &str, request: ExpenseRequest) -> Result<Expense, TripError> {
        let errors = validate_expense_request(&request);
        if !errors.is_empty() {
            return Err(TripError::Validation(errors));
        }
        let (Ok(currency), Ok(category)) = (
            request.currency.parse::<Currency>(),
            request.category.parse::<ExpenseCategory>(),
        ) else {
            return Err(TripError::Validation(errors));
        };

        let user = self.user(email)?;
        let trip = self.owned_trip(&user, &request.trip_id)?;
        let mut participants = self.store.list_participants(&trip.id)?;

        let payer = match request.paid_by {
            Some(payer) if participants.iter().any(|p| p.id == payer) => payer,
            Some(_) => return Err(TripError::PayerNotInTrip),
            None => self.caller_participant(&user, &trip, &mut participants)?,
        };

        let sharers: Vec<ParticipantId> = participants.iter().map(|p| p.id.clone()).collect();
        let shares = split_equally(request.amount, currency, &sharers, &payer)?;

        let mut expense = Expense::new(
            trip.id,
            payer,
            request.amount,
            currency,
            category,
            request.description.trim(),
        )
        .with_shares(shares);
        expense.notes = request.notes;
        expense.country_code = request.country_code.filter(|c| !c.trim().is_empty());
        expense.is_planned = request.is_planned;
        if let Some(date) = request.date {
            expense.date = date;
        }

        let expense = self.store.create_expense(expense)?;
        info!(
            expense_id = %expense.id,
            amount = %expense.amount,
            currency = %expense.currency,
            "expense recorded"
        );
        Ok(expense)
    }

    /// Validates and stores a settlement payment between two participants.
    pub fn record_transfer(&self, email: &str, request: TransferRequest) -> Result<Transfer, TripError> {
        let errors = validate_transfer_request(&request);
        if !errors.is_empty() {
            return Err(TripError::Validation(errors));
        }
        let Ok(currency) = request.currency.parse::<Currency>() else {
            return Err(TripError::Validation(errors));
        };

        let user = self.user(email)?;
        let trip = self.owned_trip(&user, &request.trip_id)?;
        let participants = self.store.list_participants(&trip.id)?;
        let known = |id: &ParticipantId| participants.iter().any(|p| &p.id == id);
        if !known(&request.from) || !known(&request.to) {
            return Err(TripError::ParticipantNotFound);
        }

        let mut transfer = Transfer::new(trip.id, request.from, request.to, request.amount, currency);
        transfer.note = request.note;
        if let Some(date) = request.date {
            transfer.date = date;
        }

        let transfer = self.store.create_transfer(transfer)?;
        info!(transfer_id = %transfer.id, amount = %transfer.amount, "transfer recorded");
        Ok(transfer)
    }

    /// Summaries and settlement of one trip.
    pub fn trip_overview(
        &self,
        email: &str,
        trip_id: &TripId,
        policy: SettlementPolicy,
    ) -> Result<TripOverview, TripError> {
        let user = self.user(email)?;
        let trip = self.owned_trip(&user, trip_id)?;
        let participants = self.store.list_participants(&trip.id)?;
        let expenses = self.store.list_expenses(&trip.id)?;
        let transfers = self.store.list_transfers(&trip.id)?;

        let ids: Vec<ParticipantId> = participants.iter().map(|p| p.id.clone()).collect();
        let summary = TripSummary::compute(&expenses, Utc::now());
        let settlement = settle(&ids, &expenses, &transfers, policy);

        Ok(TripOverview {
            trip,
            participants,
            summary,
            settlement,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use rust_decimal_macros::dec;

    fn draft() -> TripDraft {
        TripDraft {
            name: Some("Lisbon".into()),
            base_currency: Some("EUR".into()),
            adults: Some(2.0),
            children: Some(0.0),
            travel_style: Some("urban".into()),
            ..TripDraft::default()
        }
    }

    fn request(trip_id: &TripId, amount: rust_decimal::Decimal) -> ExpenseRequest {
        ExpenseRequest {
            trip_id: trip_id.clone(),
            amount,
            currency: "EUR".into(),
            category: "food".into(),
            description: "Pastéis".into(),
            notes: None,
            date: None,
            country_code: Some("PT".into()),
            is_planned: false,
            paid_by: None,
        }
    }

    #[test]
    fn caller_participant_is_created_once() {
        let service = TripService::new(MemoryStore::new());
        let trip = service.create_trip("me@example.com", draft()).unwrap();

        let first = service
            .record_expense("me@example.com", request(&trip.id, dec!(9)))
            .unwrap();
        let second = service
            .record_expense("me@example.com", request(&trip.id, dec!(3)))
            .unwrap();

        assert_eq!(first.paid_by, second.paid_by);
        let participants = service.store().list_participants(&trip.id).unwrap();
        assert_eq!(participants.len(), 1);
        assert_eq!(participants[0].name, Participant::DEFAULT_NAME);
    }

    #[test]
    fn other_users_trips_are_not_found() {
        let service = TripService::new(MemoryStore::new());
        let trip = service.create_trip("owner@example.com", draft()).unwrap();

        let result = service.record_expense("intruder@example.com", request(&trip.id, dec!(1)));
        assert_eq!(result.unwrap_err(), TripError::TripNotFound);
        assert_eq!(
            service.delete_trip("intruder@example.com", &trip.id),
            Err(TripError::TripNotFound)
        );
    }

    #[test]
    fn invalid_expense_never_reaches_the_store() {
        let service = TripService::new(MemoryStore::new());
        let trip = service.create_trip("me@example.com", draft()).unwrap();
        let mut bad = request(&trip.id, dec!(0));
        bad.currency = "XYZ".into();

        match service.record_expense("me@example.com", bad) {
            Err(TripError::Validation(errors)) => assert_eq!(errors.len(), 2),
            other => panic!("expected validation failure, got {other:?}"),
        }
        assert!(service.store().list_expenses(&trip.id).unwrap().is_empty());
    }
}
