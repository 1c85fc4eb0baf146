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

//! Validation and sanitization integration tests.

use chrono::NaiveDate;
use rust_decimal_macros::dec;
use serde_json::json;
use trip_ledger::{
    Currency, ExpenseRequest, ParticipantId, TransferRequest, TravelStyle, TripDraft, TripId,
    currency_meta, first_error, is_valid_currency, is_valid_trip, sanitize_trip_data,
    sanitize_trip_list, sanitize_trip_snapshot, validate_expense_request,
    validate_transfer_request, validate_trip_data,
};

fn make_draft() -> TripDraft {
    TripDraft {
        name: Some("Tokyo".into()),
        base_currency: Some("JPY".into()),
        start_date: NaiveDate::from_ymd_opt(2025, 4, 1),
        end_date: NaiveDate::from_ymd_opt(2025, 4, 10),
        adults: Some(2.0),
        children: Some(1.0),
        travel_style: Some("urban".into()),
        trip_style_other: None,
        description: None,
    }
}

fn make_expense_request() -> ExpenseRequest {
    ExpenseRequest {
        trip_id: TripId::from("trip"),
        amount: dec!(1200),
        currency: "JPY".into(),
        category: "food".into(),
        description: "Ramen".into(),
        notes: None,
        date: None,
        country_code: Some("JP".into()),
        is_planned: false,
        paid_by: None,
    }
}

fn fields(errors: &[trip_ledger::ValidationError]) -> Vec<&'static str> {
    errors.iter().map(|e| e.field).collect()
}

// === Currency catalog ===

#[test]
fn currency_codes_are_case_sensitive() {
    assert!(is_valid_currency("USD"));
    assert!(!is_valid_currency("usd"));
    assert!(!is_valid_currency(" USD"));
    assert!(!is_valid_currency(""));
    assert!(!is_valid_currency("XYZ"));
}

#[test]
fn unknown_currency_meta_degrades() {
    let meta = currency_meta("XYZ");
    assert_eq!(meta.symbol, "XYZ");
    assert_eq!(meta.label, "XYZ");
    assert_eq!(meta.flag, trip_ledger::UNKNOWN_FLAG);
    assert_eq!(currency_meta("THB").symbol, Currency::THB.meta().symbol);
}

// === Trip validation ===

#[test]
fn valid_draft_has_no_errors() {
    assert!(validate_trip_data(&make_draft()).is_empty());
    assert!(is_valid_trip(&make_draft()));
}

#[test]
fn every_problem_is_reported() {
    let draft = TripDraft {
        name: Some("   ".into()),
        base_currency: Some("jpy".into()),
        adults: Some(0.0),
        children: Some(-1.0),
        travel_style: Some("luxury".into()),
        ..make_draft()
    };
    let errors = validate_trip_data(&draft);
    assert_eq!(
        fields(&errors),
        vec!["name", "baseCurrency", "adults", "children", "travelStyle"]
    );
    assert_eq!(first_error(&errors), Some("Trip name is required"));
}

#[test]
fn fractional_counts_are_rejected() {
    let draft = TripDraft {
        adults: Some(1.5),
        ..make_draft()
    };
    assert_eq!(fields(&validate_trip_data(&draft)), vec!["adults"]);
}

#[test]
fn other_style_needs_description() {
    let draft = TripDraft {
        travel_style: Some("other".into()),
        trip_style_other: Some("  ".into()),
        ..make_draft()
    };
    assert_eq!(fields(&validate_trip_data(&draft)), vec!["tripStyleOther"]);
}

#[test]
fn end_before_start_is_rejected() {
    let draft = TripDraft {
        end_date: NaiveDate::from_ymd_opt(2025, 3, 1),
        ..make_draft()
    };
    assert_eq!(fields(&validate_trip_data(&draft)), vec!["endDate"]);
}

#[test]
fn long_names_are_rejected() {
    let draft = TripDraft {
        name: Some("x".repeat(101)),
        ..make_draft()
    };
    assert_eq!(fields(&validate_trip_data(&draft)), vec!["name"]);
}

#[test]
fn draft_deserializes_from_camel_case() {
    let draft: TripDraft = serde_json::from_value(json!({
        "name": "Lisbon",
        "baseCurrency": "EUR",
        "adults": 1,
        "children": 0,
        "travelStyle": "family"
    }))
    .unwrap();
    let trip = draft.into_trip().unwrap();
    assert_eq!(trip.base_currency, Currency::EUR);
    assert_eq!(trip.travel_style, TravelStyle::Family);
}

// === Expense and transfer validation ===

#[test]
fn valid_expense_request() {
    assert!(validate_expense_request(&make_expense_request()).is_empty());
}

#[test]
fn expense_request_problems() {
    let request = ExpenseRequest {
        amount: dec!(0),
        currency: "jpy".into(),
        category: "souvenirs".into(),
        description: "".into(),
        ..make_expense_request()
    };
    assert_eq!(
        fields(&validate_expense_request(&request)),
        vec!["amount", "currency", "category", "description"]
    );
}

#[test]
fn transfer_to_self_is_rejected() {
    let request = TransferRequest {
        trip_id: TripId::from("trip"),
        from: ParticipantId::from("a"),
        to: ParticipantId::from("a"),
        amount: dec!(5),
        currency: "EUR".into(),
        date: None,
        note: None,
    };
    assert_eq!(
        fields(&validate_transfer_request(&request)),
        vec!["toParticipant"]
    );
}

// === Sanitization ===

#[test]
fn empty_object_sanitizes_to_a_valid_trip() {
    let trip = sanitize_trip_data(&json!({})).unwrap();

    assert_eq!(trip.name, "Untitled Trip");
    assert_eq!(trip.base_currency, Currency::USD);
    assert_eq!(trip.adults, 2);
    assert_eq!(trip.children, 0);
    assert_eq!(trip.travel_style, TravelStyle::Other);
    assert!(validate_trip_data(&TripDraft::from(&trip)).is_empty());
}

#[test]
fn non_objects_sanitize_to_none() {
    assert!(sanitize_trip_data(&serde_json::Value::Null).is_none());
    assert!(sanitize_trip_data(&json!("x")).is_none());
    assert!(sanitize_trip_data(&json!([1, 2])).is_none());
}

#[test]
fn legacy_snapshot_keeps_valid_fields() {
    let snapshot = json!({
        "id": "trip_1712345678",
        "name": "Bangkok",
        "startDate": "2024-04-05",
        "baseCurrency": "THB",
        "adults": 2,
        "children": "lots",
        "travelStyle": "urban",
        "createdAt": "2024-04-01T10:00:00Z"
    });

    let sanitized = sanitize_trip_snapshot(&snapshot).unwrap();

    assert_eq!(sanitized.trip.id, TripId::from("trip_1712345678"));
    assert_eq!(sanitized.trip.base_currency, Currency::THB);
    assert_eq!(sanitized.trip.children, 0);
    assert_eq!(sanitized.repaired.len(), 1);
    assert_eq!(sanitized.repaired[0].field, "children");
}

#[test]
fn sanitized_trip_round_trips_through_json() {
    let trip = sanitize_trip_data(&json!({ "name": "Oslo", "baseCurrency": "NOK" })).unwrap();
    let value = serde_json::to_value(&trip).unwrap();
    let again = sanitize_trip_snapshot(&value).unwrap();
    assert!(!again.was_repaired());
    assert_eq!(again.trip, trip);
}

#[test]
fn trip_list_drops_garbage_entries() {
    let trips = sanitize_trip_list(&json!([{ "name": "A" }, 42, null, { "name": "B" }]));
    let names: Vec<_> = trips.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["A", "B"]);
}
