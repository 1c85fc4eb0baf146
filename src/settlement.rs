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

//! Balance netting and settlement suggestions.
//!
//! # Balances
//!
//! For every participant:
//!
//! ```text
//! net = paid - owed + transfers sent - transfers received
//! ```
//!
//! A positive balance means the participant is owed money; a negative one
//! means they owe. Sending a transfer pays debt off, so it raises the
//! sender's balance and lowers the receiver's. This is the reverse of the
//! `+ received - sent` wording for transfers, under which paying a suggested
//! transfer would push both parties further from zero.
//!
//! What a sharer owes is their recorded [`ExpenseShare`] amount. Expenses
//! without shares are totalled per payer and each total is split with
//! [`split_equally`] over the trip's participants, so the payer absorbs the
//! rounding remainder either way. Shares are already in minor units, so
//! balances are exact and every ledger sums to zero without further
//! rounding.
//!
//! [`ExpenseShare`]: crate::ExpenseShare
//!
//! # Currencies
//!
//! Amounts are never converted. [`SettlementPolicy`] decides whether each
//! currency is settled on its own ledger or all amounts are read nominally
//! in the trip's base currency.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use trip_ledger::{Currency, Expense, ExpenseCategory, ParticipantId, SettlementPolicy, TripId, settle};
//!
//! let trip = TripId::from("trip");
//! let people: Vec<ParticipantId> = ["a", "b", "c"].into_iter().map(ParticipantId::from).collect();
//! let expenses: Vec<Expense> = (0..3)
//!     .map(|_| Expense::new(trip.clone(), people[0].clone(), dec!(10), Currency::USD, ExpenseCategory::Food, "Meal"))
//!     .collect();
//!
//! let report = settle(&people, &expenses, &[], SettlementPolicy::PerCurrency);
//! let ledger = report.ledger(Currency::USD).unwrap();
//! assert_eq!(ledger.balance_of(&people[0]), Some(dec!(20)));
//! assert_eq!(ledger.suggested.len(), 2);
//! ```

use crate::base::ParticipantId;
use crate::currency::Currency;
use crate::error::SplitError;
use crate::expense::Expense;
use crate::transfer::Transfer;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use tracing::{debug, warn};

/// How expenses recorded in different currencies are netted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "policy", rename_all = "kebab-case")]
pub enum SettlementPolicy {
    /// One ledger per currency; each is settled independently.
    #[default]
    PerCurrency,
    /// A single ledger in `base`, reading every amount at face value
    /// regardless of its recorded currency.
    Nominal { base: Currency },
}

/// A participant's net balance on one ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Balance {
    pub participant: ParticipantId,
    pub net: Decimal,
}

/// A payment that moves a ledger towards zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuggestedTransfer {
    pub from: ParticipantId,
    pub to: ParticipantId,
    pub amount: Decimal,
}

/// Balances and suggested transfers for one currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurrencyLedger {
    pub currency: Currency,
    /// In participant order.
    pub balances: Vec<Balance>,
    pub suggested: Vec<SuggestedTransfer>,
}

impl CurrencyLedger {
    pub fn balance_of(&self, participant: &ParticipantId) -> Option<Decimal> {
        self.balances
            .iter()
            .find(|b| &b.participant == participant)
            .map(|b| b.net)
    }

    /// `true` when every balance is within one minor unit of zero.
    pub fn is_settled(&self) -> bool {
        let tolerance = self.currency.minor_unit();
        self.balances.iter().all(|b| b.net.abs() < tolerance)
    }
}

/// Result of settling a trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SettlementReport {
    pub policy: SettlementPolicy,
    /// In order of first appearance of each currency.
    pub ledgers: Vec<CurrencyLedger>,
}

impl SettlementReport {
    pub fn ledger(&self, currency: Currency) -> Option<&CurrencyLedger> {
        self.ledgers.iter().find(|l| l.currency == currency)
    }

    pub fn is_settled(&self) -> bool {
        self.ledgers.iter().all(CurrencyLedger::is_settled)
    }
}

/// Splits `amount` equally, truncating each share to minor units.
///
/// The remainder goes to `payer`, or to the last participant when the payer
/// is not among them, so the shares always sum to exactly `amount`.
/// Duplicate participants are counted once.
///
/// # Errors
///
/// - [`SplitError::InvalidAmount`] - `amount` is zero or negative.
/// - [`SplitError::NoParticipants`] - `participants` is empty.
pub fn split_equally(
    amount: Decimal,
    currency: Currency,
    participants: &[ParticipantId],
    payer: &ParticipantId,
) -> Result<Vec<(ParticipantId, Decimal)>, SplitError> {
    if amount <= Decimal::ZERO {
        return Err(SplitError::InvalidAmount);
    }

    let mut sharers: Vec<&ParticipantId> = Vec::with_capacity(participants.len());
    for participant in participants {
        if !sharers.contains(&participant) {
            sharers.push(participant);
        }
    }
    if sharers.is_empty() {
        return Err(SplitError::NoParticipants);
    }

    let count = Decimal::from(sharers.len());
    let base = (amount / count)
        .round_dp_with_strategy(currency.minor_units(), RoundingStrategy::ToZero);
    let remainder = amount - base * count;
    let remainder_to = sharers
        .iter()
        .position(|p| *p == payer)
        .unwrap_or(sharers.len() - 1);

    Ok(sharers
        .into_iter()
        .enumerate()
        .map(|(i, participant)| {
            let share = if i == remainder_to { base + remainder } else { base };
            (participant.clone(), share)
        })
        .collect())
}

/// Running balances for one ledger, in participant order.
struct LedgerBuilder {
    currency: Currency,
    participants: Vec<ParticipantId>,
    balances: Vec<(ParticipantId, Decimal)>,
    /// Amounts each payer spent on expenses without recorded shares.
    unshared: Vec<(ParticipantId, Decimal)>,
}

impl LedgerBuilder {
    fn new(currency: Currency, participants: &[ParticipantId]) -> Self {
        let mut builder = Self {
            currency,
            participants: participants.to_vec(),
            balances: Vec::with_capacity(participants.len()),
            unshared: Vec::new(),
        };
        for participant in participants {
            builder.entry(participant);
        }
        builder
    }

    fn entry(&mut self, participant: &ParticipantId) -> &mut Decimal {
        let index = match self.balances.iter().position(|(p, _)| p == participant) {
            Some(index) => index,
            None => {
                self.balances.push((participant.clone(), Decimal::ZERO));
                self.balances.len() - 1
            }
        };
        &mut self.balances[index].1
    }

    fn debit(&mut self, shares: impl IntoIterator<Item = (ParticipantId, Decimal)>) {
        for (sharer, share) in shares {
            *self.entry(&sharer) -= share;
        }
    }

    fn add_expense(&mut self, expense: &Expense) {
        *self.entry(&expense.paid_by) += expense.amount;

        if expense.shares.is_empty() {
            match self.unshared.iter().position(|(payer, _)| payer == &expense.paid_by) {
                Some(index) => self.unshared[index].1 += expense.amount,
                None => self.unshared.push((expense.paid_by.clone(), expense.amount)),
            }
            return;
        }

        if expense.shares_total() == expense.amount {
            self.debit(
                expense
                    .shares
                    .iter()
                    .map(|share| (share.participant_id.clone(), share.share_amount)),
            );
            return;
        }

        warn!(
            expense_id = %expense.id,
            shares_total = %expense.shares_total(),
            amount = %expense.amount,
            "shares do not add up to the amount; splitting equally"
        );
        let sharers: Vec<ParticipantId> = expense.sharers().cloned().collect();
        match split_equally(expense.amount, expense.currency, &sharers, &expense.paid_by) {
            Ok(shares) => self.debit(shares),
            Err(err) => {
                debug!(expense_id = %expense.id, %err, "expense not shared");
                *self.entry(&expense.paid_by) -= expense.amount;
            }
        }
    }

    /// Splits each payer's unshared total between all participants.
    ///
    /// Splitting the total rather than each expense keeps three equal meals
    /// of 10 among three people at exactly 10 each.
    fn split_unshared(&mut self) {
        for (payer, total) in std::mem::take(&mut self.unshared) {
            match split_equally(total, self.currency, &self.participants, &payer) {
                Ok(shares) => self.debit(shares),
                Err(err) => {
                    // Nobody to share with: the payer carries the whole amount.
                    debug!(%payer, %err, "unshared expenses not split");
                    *self.entry(&payer) -= total;
                }
            }
        }
    }

    fn add_transfer(&mut self, transfer: &Transfer) {
        *self.entry(&transfer.from) += transfer.amount;
        *self.entry(&transfer.to) -= transfer.amount;
    }

    fn finish(mut self) -> CurrencyLedger {
        self.split_unshared();
        let currency = self.currency;
        let balances: Vec<Balance> = self
            .balances
            .into_iter()
            .map(|(participant, net)| Balance { participant, net })
            .collect();

        let suggested = suggest_transfers(&balances, currency);
        CurrencyLedger {
            currency,
            balances,
            suggested,
        }
    }
}

/// Nets expenses and transfers into per-participant balances and suggests
/// the transfers that settle them.
///
/// `participants` are the trip's participants, in display order; they are
/// the sharers of any expense that has no recorded shares. Participants that
/// only appear on expenses or transfers are appended after them.
pub fn settle(
    participants: &[ParticipantId],
    expenses: &[Expense],
    transfers: &[Transfer],
    policy: SettlementPolicy,
) -> SettlementReport {
    let ledger_currency = |currency: Currency| match policy {
        SettlementPolicy::PerCurrency => currency,
        SettlementPolicy::Nominal { base } => base,
    };

    let mut ledgers: Vec<LedgerBuilder> = Vec::new();
    for expense in expenses {
        let index = ledger_index(&mut ledgers, ledger_currency(expense.currency), participants);
        ledgers[index].add_expense(expense);
    }
    for transfer in transfers {
        let index = ledger_index(&mut ledgers, ledger_currency(transfer.currency), participants);
        ledgers[index].add_transfer(transfer);
    }

    SettlementReport {
        policy,
        ledgers: ledgers.into_iter().map(LedgerBuilder::finish).collect(),
    }
}

fn ledger_index(
    ledgers: &mut Vec<LedgerBuilder>,
    currency: Currency,
    participants: &[ParticipantId],
) -> usize {
    match ledgers.iter().position(|l| l.currency == currency) {
        Some(index) => index,
        None => {
            ledgers.push(LedgerBuilder::new(currency, participants));
            ledgers.len() - 1
        }
    }
}

/// Greedy settlement: the largest debtor pays the largest creditor, repeated
/// until every balance is within one minor unit of zero.
///
/// Ties are broken by position in `balances`. Each round clears at least one
/// participant, so at most `n - 1` transfers are suggested. A sub-unit debt
/// is still paid while its creditor is owed a whole minor unit or more.
pub fn suggest_transfers(balances: &[Balance], currency: Currency) -> Vec<SuggestedTransfer> {
    let tolerance = currency.minor_unit();
    let mut remaining: Vec<(&ParticipantId, Decimal)> =
        balances.iter().map(|b| (&b.participant, b.net)).collect();
    let mut suggested = Vec::new();

    loop {
        let creditor = pick(&remaining, |net| net);
        let debtor = pick(&remaining, |net| -net);
        let (Some(creditor), Some(debtor)) = (creditor, debtor) else {
            break;
        };

        let credit = remaining[creditor].1;
        let debt = -remaining[debtor].1;
        if credit < tolerance && debt < tolerance {
            break;
        }

        let amount = credit.min(debt);
        remaining[creditor].1 -= amount;
        remaining[debtor].1 += amount;
        suggested.push(SuggestedTransfer {
            from: remaining[debtor].0.clone(),
            to: remaining[creditor].0.clone(),
            amount,
        });
    }

    suggested
}

/// Index of the first entry maximising `key(net)`, if that maximum is positive.
fn pick(entries: &[(&ParticipantId, Decimal)], key: impl Fn(Decimal) -> Decimal) -> Option<usize> {
    let mut best: Option<(usize, Decimal)> = None;
    for (index, (_, net)) in entries.iter().enumerate() {
        let value = key(*net);
        if value > Decimal::ZERO && best.is_none_or(|(_, current)| value > current) {
            best = Some((index, value));
        }
    }
    best.map(|(index, _)| index)
}
