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

//! Concurrent access tests for the in-memory store.
//!
//! Writers on the same trip and on different trips run in parallel; every
//! write must land exactly once and reads must always see a consistent trip.

use rayon::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::thread;
use trip_ledger::{
    ExpenseRequest, MemoryStore, ParticipantId, SettlementPolicy, TripDraft, TripId, TripService,
    TripStore,
};

const OWNER: &str = "owner@example.com";

fn make_draft(name: String) -> TripDraft {
    TripDraft {
        name: Some(name),
        base_currency: Some("EUR".into()),
        adults: Some(1.0),
        children: Some(0.0),
        travel_style: Some("urban".into()),
        ..TripDraft::default()
    }
}

fn make_expense(trip_id: &TripId, payer: &ParticipantId, amount: Decimal) -> ExpenseRequest {
    ExpenseRequest {
        trip_id: trip_id.clone(),
        amount,
        currency: "EUR".into(),
        category: "food".into(),
        description: "Tapas".into(),
        notes: None,
        date: None,
        country_code: Some("ES".into()),
        is_planned: false,
        paid_by: Some(payer.clone()),
    }
}

#[test]
fn parallel_expenses_on_one_trip() {
    let service = TripService::new(MemoryStore::new());
    let trip = service.create_trip(OWNER, make_draft("Madrid".into())).unwrap();
    let payers: Vec<ParticipantId> = ["Ana", "Bea", "Carla", "Dani"]
        .into_iter()
        .map(|name| service.add_participant(OWNER, &trip.id, name, None).unwrap().id)
        .collect();

    (0..400).into_par_iter().for_each(|i| {
        let payer = &payers[i % payers.len()];
        service
            .record_expense(OWNER, make_expense(&trip.id, payer, dec!(2.50)))
            .unwrap();
    });

    let expenses = service.store().list_expenses(&trip.id).unwrap();
    assert_eq!(expenses.len(), 400);

    let overview = service
        .trip_overview(OWNER, &trip.id, SettlementPolicy::PerCurrency)
        .unwrap();
    assert_eq!(overview.summary.by_currency[0].total, dec!(1000));
    // Everyone paid the same, so nobody owes anything.
    assert!(overview.settlement.is_settled());
}

#[test]
fn parallel_trip_creation_per_user() {
    let service = TripService::new(MemoryStore::new());

    (0..64).into_par_iter().for_each(|i| {
        let email = format!("user{}@example.com", i % 8);
        service.create_trip(&email, make_draft(format!("Trip {i}"))).unwrap();
    });

    for user in 0..8 {
        let trips = service.list_trips(&format!("user{user}@example.com")).unwrap();
        assert_eq!(trips.len(), 8);
    }
}

#[test]
fn same_user_is_created_once_under_contention() {
    let store = Arc::new(MemoryStore::new());

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let store = Arc::clone(&store);
            thread::spawn(move || store.find_or_create_user(OWNER, None).unwrap().id)
        })
        .collect();

    let ids: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert!(ids.windows(2).all(|pair| pair[0] == pair[1]));
}

#[test]
fn readers_and_deleters_do_not_block_each_other() {
    let service = TripService::new(MemoryStore::new());
    let trips: Vec<TripId> = (0..32)
        .map(|i| service.create_trip(OWNER, make_draft(format!("Trip {i}"))).unwrap().id)
        .collect();

    trips.par_iter().enumerate().for_each(|(i, trip_id)| {
        if i % 2 == 0 {
            service.delete_trip(OWNER, trip_id).unwrap();
        } else {
            service
                .trip_overview(OWNER, trip_id, SettlementPolicy::PerCurrency)
                .unwrap();
        }
    });

    assert_eq!(service.list_trips(OWNER).unwrap().len(), 16);
}
