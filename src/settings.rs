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

//! Runtime settings shared by the command-line tools.
//!
//! Each value can be given as a flag or through the environment, flags
//! winning over variables.

use crate::currency::{Currency, DEFAULT_CURRENCY};
use crate::settlement::SettlementPolicy;
use crate::store::Identity;
use clap::{Args, ValueEnum};

/// Caller used when no identity is available.
pub const DEMO_EMAIL: &str = "demo@trip-ledger.local";

/// How multi-currency expenses are settled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum PolicyArg {
    /// Settle each currency on its own ledger
    #[default]
    PerCurrency,
    /// Read every amount at face value in the base currency
    Nominal,
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Settlement policy (also read from `TRIP_LEDGER_POLICY`).
    #[arg(
        long,
        global = true,
        env = "TRIP_LEDGER_POLICY",
        value_enum,
        default_value_t = PolicyArg::PerCurrency
    )]
    pub policy: PolicyArg,

    /// Base currency of the trip (also read from `TRIP_LEDGER_BASE_CURRENCY`).
    #[arg(
        long,
        global = true,
        env = "TRIP_LEDGER_BASE_CURRENCY",
        default_value_t = DEFAULT_CURRENCY
    )]
    pub base_currency: Currency,

    /// Email acting as the caller when no identity is provided
    /// (also read from `TRIP_LEDGER_DEMO_EMAIL`).
    #[arg(long, global = true, env = "TRIP_LEDGER_DEMO_EMAIL", default_value = DEMO_EMAIL)]
    pub demo_email: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            policy: PolicyArg::default(),
            base_currency: DEFAULT_CURRENCY,
            demo_email: DEMO_EMAIL.to_owned(),
        }
    }
}

impl Settings {
    pub fn settlement_policy(&self) -> SettlementPolicy {
        match self.policy {
            PolicyArg::PerCurrency => SettlementPolicy::PerCurrency,
            PolicyArg::Nominal => SettlementPolicy::Nominal {
                base: self.base_currency,
            },
        }
    }

    /// The identity's email, or the configured demo email for anonymous
    /// callers. Blank emails count as anonymous.
    pub fn caller_email(&self, identity: &impl Identity) -> String {
        identity
            .current_user_email()
            .filter(|email| !email.trim().is_empty())
            .unwrap_or_else(|| self.demo_email.clone())
    }
}
