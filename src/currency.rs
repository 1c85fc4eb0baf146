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

//! Static currency catalog.
//!
//! The catalog is the only place that knows which currency codes the tracker
//! accepts. Every currency entering the model goes through
//! [`is_valid_currency`] (or [`Currency::from_str`], which shares the same
//! table), while display code uses [`currency_meta`], which never fails.
//!
//! # Example
//!
//! ```
//! use trip_ledger::{Currency, currency_meta, is_valid_currency};
//!
//! assert!(is_valid_currency("THB"));
//! assert!(!is_valid_currency("thb"));
//! assert_eq!(currency_meta("EUR").symbol, "€");
//! assert_eq!(currency_meta("XYZ").label, "XYZ");
//! assert_eq!(Currency::JPY.minor_units(), 0);
//! ```

use crate::error::ParseError;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Flag shown for currencies and countries missing from the catalogs.
pub const UNKNOWN_FLAG: &str = "🏳️";

/// Currency used when a stored value is missing or unsupported.
pub const DEFAULT_CURRENCY: Currency = Currency::USD;

/// Display metadata for a currency code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CurrencyMeta<'a> {
    pub symbol: &'a str,
    pub flag: &'a str,
    pub label: &'a str,
}

macro_rules! currency_catalog {
    ($($code:ident => $symbol:literal, $flag:literal, $label:literal, $minor:literal;)*) => {
        /// A supported ISO 4217 currency.
        ///
        /// Serializes as its upper-case code. Parsing is case-sensitive.
        #[allow(clippy::upper_case_acronyms)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum Currency {
            $($code,)*
        }

        impl Currency {
            /// Every supported currency, in catalog order.
            pub const ALL: &'static [Currency] = &[$(Currency::$code,)*];

            pub fn code(self) -> &'static str {
                match self {
                    $(Currency::$code => stringify!($code),)*
                }
            }

            pub fn meta(self) -> CurrencyMeta<'static> {
                match self {
                    $(Currency::$code => CurrencyMeta {
                        symbol: $symbol,
                        flag: $flag,
                        label: $label,
                    },)*
                }
            }

            /// Number of digits after the decimal point in the minor unit.
            pub fn minor_units(self) -> u32 {
                match self {
                    $(Currency::$code => $minor,)*
                }
            }

            fn lookup(code: &str) -> Option<Currency> {
                match code {
                    $(stringify!($code) => Some(Currency::$code),)*
                    _ => None,
                }
            }
        }
    };
}

currency_catalog! {
    ILS => "₪", "🇮🇱", "Israeli Shekel", 2;
    USD => "$", "🇺🇸", "US Dollar", 2;
    EUR => "€", "🇪🇺", "Euro", 2;
    GBP => "£", "🇬🇧", "British Pound", 2;
    JPY => "¥", "🇯🇵", "Japanese Yen", 0;
    CNY => "¥", "🇨🇳", "Chinese Yuan", 2;
    THB => "฿", "🇹🇭", "Thai Baht", 2;
    AUD => "A$", "🇦🇺", "Australian Dollar", 2;
    CAD => "C$", "🇨🇦", "Canadian Dollar", 2;
    CHF => "Fr", "🇨🇭", "Swiss Franc", 2;
    INR => "₹", "🇮🇳", "Indian Rupee", 2;
    AED => "د.إ", "🇦🇪", "UAE Dirham", 2;
    TRY => "₺", "🇹🇷", "Turkish Lira", 2;
    MXN => "$", "🇲🇽", "Mexican Peso", 2;
    BRL => "R$", "🇧🇷", "Brazilian Real", 2;
    ZAR => "R", "🇿🇦", "South African Rand", 2;
    SGD => "S$", "🇸🇬", "Singapore Dollar", 2;
    NZD => "NZ$", "🇳🇿", "New Zealand Dollar", 2;
    HKD => "HK$", "🇭🇰", "Hong Kong Dollar", 2;
    SEK => "kr", "🇸🇪", "Swedish Krona", 2;
    NOK => "kr", "🇳🇴", "Norwegian Krone", 2;
    DKK => "kr", "🇩🇰", "Danish Krone", 2;
    PLN => "zł", "🇵🇱", "Polish Zloty", 2;
    CZK => "Kč", "🇨🇿", "Czech Koruna", 2;
    HUF => "Ft", "🇭🇺", "Hungarian Forint", 2;
    RON => "lei", "🇷🇴", "Romanian Leu", 2;
    RUB => "₽", "🇷🇺", "Russian Ruble", 2;
    KRW => "₩", "🇰🇷", "South Korean Won", 0;
    IDR => "Rp", "🇮🇩", "Indonesian Rupiah", 2;
    MYR => "RM", "🇲🇾", "Malaysian Ringgit", 2;
    PHP => "₱", "🇵🇭", "Philippine Peso", 2;
    VND => "₫", "🇻🇳", "Vietnamese Dong", 0;
    EGP => "E£", "🇪🇬", "Egyptian Pound", 2;
    SAR => "﷼", "🇸🇦", "Saudi Riyal", 2;
    QAR => "﷼", "🇶🇦", "Qatari Riyal", 2;
    KWD => "د.ك", "🇰🇼", "Kuwaiti Dinar", 3;
    JOD => "د.ا", "🇯🇴", "Jordanian Dinar", 3;
    ARS => "$", "🇦🇷", "Argentine Peso", 2;
    CLP => "$", "🇨🇱", "Chilean Peso", 0;
    COP => "$", "🇨🇴", "Colombian Peso", 2;
    PEN => "S/", "🇵🇪", "Peruvian Sol", 2;
}

impl Currency {
    /// Smallest representable amount in this currency (one minor unit).
    pub fn minor_unit(self) -> Decimal {
        Decimal::new(1, self.minor_units())
    }

    /// Rounds `amount` to this currency's minor units, half away from zero.
    pub fn round(self, amount: Decimal) -> Decimal {
        amount.round_dp_with_strategy(self.minor_units(), RoundingStrategy::MidpointAwayFromZero)
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Currency::lookup(s).ok_or_else(|| ParseError::UnknownCurrency(s.to_owned()))
    }
}

/// Returns `true` when `value` is exactly one of the supported codes.
pub fn is_valid_currency(value: &str) -> bool {
    Currency::lookup(value).is_some()
}

/// Returns the parsed currency, or [`DEFAULT_CURRENCY`] when `value` is unsupported.
pub fn valid_currency_or_default(value: &str) -> Currency {
    Currency::lookup(value).unwrap_or(DEFAULT_CURRENCY)
}

/// Looks up display metadata for an arbitrary code.
///
/// Unknown codes get the code itself as symbol and label; an empty code gets
/// a generic placeholder. This never fails.
pub fn currency_meta(code: &str) -> CurrencyMeta<'_> {
    if code.is_empty() {
        return CurrencyMeta {
            symbol: "¤",
            flag: UNKNOWN_FLAG,
            label: "Unknown",
        };
    }

    match Currency::lookup(code) {
        Some(currency) => currency.meta(),
        None => CurrencyMeta {
            symbol: code,
            flag: UNKNOWN_FLAG,
            label: code,
        },
    }
}

/// Formats an amount with the currency symbol and a fixed number of minor digits.
pub fn format_amount(amount: Decimal, currency: Currency) -> String {
    let mut rounded = currency.round(amount);
    rounded.rescale(currency.minor_units());
    format!("{}{}", currency.meta().symbol, rounded)
}
