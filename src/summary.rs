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

//! Expense aggregation.
//!
//! Every view here is a pure function of a list of expenses. Amounts are
//! grouped per currency and **never** converted or added across currencies:
//! a category with spending in two currencies yields two sub-totals.
//!
//! Ordering is deterministic. Groups appear in the order they are first
//! discovered in the input, and per-currency totals are sorted by amount
//! descending with a stable sort, so equal totals keep discovery order.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use trip_ledger::{Currency, Expense, ExpenseCategory, ParticipantId, TripId, summarize_by_currency};
//!
//! let trip = TripId::from("trip");
//! let alice = ParticipantId::from("alice");
//! let expenses = vec![
//!     Expense::new(trip.clone(), alice.clone(), dec!(150), Currency::THB, ExpenseCategory::Food, "Pad thai"),
//!     Expense::new(trip.clone(), alice.clone(), dec!(500), Currency::USD, ExpenseCategory::Flights, "BKK"),
//! ];
//!
//! let totals = summarize_by_currency(&expenses);
//! assert_eq!(totals[0].currency, Currency::USD);
//! assert_eq!(totals[1].total, dec!(150));
//! ```

use crate::base::ParticipantId;
use crate::country::country_meta;
use crate::currency::Currency;
use crate::expense::{Expense, ExpenseCategory};
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

/// Length of the "recent spending" window.
pub const RECENT_WINDOW_DAYS: i64 = 7;

/// Sum of expenses in a single currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurrencyTotal {
    pub currency: Currency,
    pub total: Decimal,
    pub count: usize,
}

/// Per-currency breakdown of one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategorySummary {
    pub category: ExpenseCategory,
    pub totals: Vec<CurrencyTotal>,
    pub count: usize,
}

/// Per-currency breakdown of one country, with resolved display data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountrySummary {
    pub code: String,
    pub name: String,
    pub flag: String,
    pub totals: Vec<CurrencyTotal>,
    pub count: usize,
}

/// What one participant paid, per currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PayerSummary {
    pub participant: ParticipantId,
    pub totals: Vec<CurrencyTotal>,
    pub count: usize,
}

/// Accumulates per-currency totals in discovery order.
#[derive(Debug, Default)]
struct CurrencyTotals {
    rows: Vec<CurrencyTotal>,
}

impl CurrencyTotals {
    fn add(&mut self, currency: Currency, amount: Decimal) {
        match self.rows.iter_mut().find(|row| row.currency == currency) {
            Some(row) => {
                row.total += amount;
                row.count += 1;
            }
            None => self.rows.push(CurrencyTotal {
                currency,
                total: amount,
                count: 1,
            }),
        }
    }

    /// Drops zero totals and sorts descending, keeping discovery order on ties.
    fn finish(mut self) -> Vec<CurrencyTotal> {
        self.rows.retain(|row| !row.total.is_zero());
        self.rows.sort_by(|a, b| b.total.cmp(&a.total));
        self.rows
    }
}

/// Groups expenses by a key, keeping keys in discovery order.
fn group_by<'a, K, I, F>(expenses: I, mut key: F) -> Vec<(K, CurrencyTotals, usize)>
where
    K: PartialEq,
    I: IntoIterator<Item = &'a Expense>,
    F: FnMut(&'a Expense) -> Option<K>,
{
    let mut groups: Vec<(K, CurrencyTotals, usize)> = Vec::new();
    for expense in expenses {
        let Some(k) = key(expense) else {
            continue;
        };
        let index = match groups.iter().position(|(existing, ..)| *existing == k) {
            Some(index) => index,
            None => {
                groups.push((k, CurrencyTotals::default(), 0));
                groups.len() - 1
            }
        };
        let (_, totals, count) = &mut groups[index];
        totals.add(expense.currency, expense.amount);
        *count += 1;
    }
    groups
}

/// Sums amounts per currency, largest first, omitting zero totals.
pub fn summarize_by_currency<'a>(expenses: impl IntoIterator<Item = &'a Expense>) -> Vec<CurrencyTotal> {
    let mut totals = CurrencyTotals::default();
    for expense in expenses {
        totals.add(expense.currency, expense.amount);
    }
    totals.finish()
}

/// One row per category that has at least one expense, in discovery order.
pub fn summarize_by_category<'a>(
    expenses: impl IntoIterator<Item = &'a Expense>,
) -> Vec<CategorySummary> {
    group_by(expenses, |expense| Some(expense.category))
        .into_iter()
        .map(|(category, totals, count)| CategorySummary {
            category,
            totals: totals.finish(),
            count,
        })
        .collect()
}

/// One row per recorded country code, in discovery order.
///
/// Expenses without a country code are not attributed to any row. Codes
/// missing from the catalog are shown with the raw code and a generic flag.
pub fn summarize_by_country<'a>(
    expenses: impl IntoIterator<Item = &'a Expense>,
) -> Vec<CountrySummary> {
    group_by(expenses, |expense| expense.country_code.as_deref())
        .into_iter()
        .map(|(code, totals, count)| {
            let meta = country_meta(code);
            CountrySummary {
                code: meta.code.to_owned(),
                name: meta.name.to_owned(),
                flag: meta.flag.to_owned(),
                totals: totals.finish(),
                count,
            }
        })
        .collect()
}

/// What each payer paid, per currency, in discovery order.
pub fn summarize_by_payer<'a>(expenses: impl IntoIterator<Item = &'a Expense>) -> Vec<PayerSummary> {
    group_by(expenses, |expense| Some(&expense.paid_by))
        .into_iter()
        .map(|(participant, totals, count)| PayerSummary {
            participant: participant.clone(),
            totals: totals.finish(),
            count,
        })
        .collect()
}

/// Per-currency totals of expenses dated at or after `since`.
pub fn spend_since<'a>(
    expenses: impl IntoIterator<Item = &'a Expense>,
    since: DateTime<Utc>,
) -> Vec<CurrencyTotal> {
    summarize_by_currency(expenses.into_iter().filter(|e| e.date >= since))
}

/// Start of the recent-spending window ending at `now`.
pub fn recent_window(now: DateTime<Utc>) -> DateTime<Utc> {
    now - Duration::days(RECENT_WINDOW_DAYS)
}

/// Either every value of a dimension, or exactly one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection<T> {
    All,
    Only(T),
}

impl<T> Default for Selection<T> {
    fn default() -> Self {
        Selection::All
    }
}

impl<T> Selection<T> {
    fn admits(&self, check: impl FnOnce(&T) -> bool) -> bool {
        match self {
            Selection::All => true,
            Selection::Only(selected) => check(selected),
        }
    }
}

impl<T> From<Option<T>> for Selection<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Selection::All, Selection::Only)
    }
}

/// Three independent filters combined with logical AND.
///
/// A dimension left at [`Selection::All`] does not restrict the result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpenseFilter {
    pub category: Selection<ExpenseCategory>,
    pub currency: Selection<Currency>,
    pub country: Selection<String>,
}

impl ExpenseFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn category(mut self, category: ExpenseCategory) -> Self {
        self.category = Selection::Only(category);
        self
    }

    pub fn currency(mut self, currency: Currency) -> Self {
        self.currency = Selection::Only(currency);
        self
    }

    pub fn country(mut self, code: impl Into<String>) -> Self {
        self.country = Selection::Only(code.into());
        self
    }

    pub fn matches(&self, expense: &Expense) -> bool {
        self.category.admits(|c| *c == expense.category)
            && self.currency.admits(|c| *c == expense.currency)
            && self
                .country
                .admits(|c| expense.country_code.as_deref() == Some(c.as_str()))
    }

    /// Expenses passing every selected dimension, in input order.
    pub fn apply<'a>(&self, expenses: impl IntoIterator<Item = &'a Expense>) -> Vec<&'a Expense> {
        expenses.into_iter().filter(|e| self.matches(e)).collect()
    }
}

/// Every aggregate view of a trip's expenses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TripSummary {
    pub expense_count: usize,
    pub by_currency: Vec<CurrencyTotal>,
    pub by_category: Vec<CategorySummary>,
    pub by_country: Vec<CountrySummary>,
    pub by_payer: Vec<PayerSummary>,
    /// Spending already made.
    pub actual: Vec<CurrencyTotal>,
    /// Budgeted spending not made yet.
    pub planned: Vec<CurrencyTotal>,
    pub recent: Vec<CurrencyTotal>,
}

impl TripSummary {
    pub fn compute(expenses: &[Expense], now: DateTime<Utc>) -> Self {
        Self {
            expense_count: expenses.len(),
            by_currency: summarize_by_currency(expenses),
            by_category: summarize_by_category(expenses),
            by_country: summarize_by_country(expenses),
            by_payer: summarize_by_payer(expenses),
            actual: summarize_by_currency(expenses.iter().filter(|e| !e.is_planned)),
            planned: summarize_by_currency(expenses.iter().filter(|e| e.is_planned)),
            recent: spend_since(expenses, recent_window(now)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::TripId;
    use rust_decimal_macros::dec;

    fn expense(amount: Decimal, currency: Currency, category: ExpenseCategory) -> Expense {
        Expense::new(
            TripId::from("t"),
            ParticipantId::from("a"),
            amount,
            currency,
            category,
            "x",
        )
    }

    #[test]
    fn ties_keep_discovery_order() {
        let expenses = vec![
            expense(dec!(10), Currency::EUR, ExpenseCategory::Food),
            expense(dec!(10), Currency::ILS, ExpenseCategory::Food),
            expense(dec!(10), Currency::GBP, ExpenseCategory::Food),
        ];
        let order: Vec<_> = summarize_by_currency(&expenses)
            .into_iter()
            .map(|t| t.currency)
            .collect();
        assert_eq!(order, vec![Currency::EUR, Currency::ILS, Currency::GBP]);
    }

    #[test]
    fn zero_totals_are_omitted() {
        let expenses = vec![
            expense(dec!(5), Currency::EUR, ExpenseCategory::Food),
            expense(dec!(-5), Currency::EUR, ExpenseCategory::Food),
            expense(dec!(1), Currency::USD, ExpenseCategory::Food),
        ];
        let totals = summarize_by_currency(&expenses);
        assert_eq!(totals.len(), 1);
        assert_eq!(totals[0].currency, Currency::USD);
    }

    #[test]
    fn empty_input_yields_empty_views() {
        let summary = TripSummary::compute(&[], Utc::now());
        assert_eq!(summary.expense_count, 0);
        assert!(summary.by_currency.is_empty());
        assert!(summary.by_category.is_empty());
        assert!(summary.by_country.is_empty());
    }

    #[test]
    fn selection_from_option() {
        assert_eq!(Selection::<u8>::from(None), Selection::All);
        assert_eq!(Selection::from(Some(3)), Selection::Only(3));
    }

    #[test]
    fn country_filter_excludes_expenses_without_country() {
        let expenses = vec![
            expense(dec!(1), Currency::EUR, ExpenseCategory::Food).with_country("FR"),
            expense(dec!(1), Currency::EUR, ExpenseCategory::Food),
        ];
        assert_eq!(ExpenseFilter::all().country("FR").apply(&expenses).len(), 1);
        assert_eq!(ExpenseFilter::all().apply(&expenses).len(), 2);
    }
}
