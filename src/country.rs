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

//! Static country catalog used to label per-country summaries.

use crate::currency::{Currency, UNKNOWN_FLAG};
use serde::Serialize;

/// Display metadata for a country code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CountryMeta<'a> {
    pub code: &'a str,
    pub name: &'a str,
    pub flag: &'a str,
    /// Local currency, when the country is in the catalog.
    pub currency: Option<Currency>,
}

const COUNTRIES: &[(&str, &str, &str, Currency)] = &[
    ("IL", "Israel", "🇮🇱", Currency::ILS),
    ("US", "United States", "🇺🇸", Currency::USD),
    ("GB", "United Kingdom", "🇬🇧", Currency::GBP),
    ("EU", "Europe", "🇪🇺", Currency::EUR),
    ("TH", "Thailand", "🇹🇭", Currency::THB),
    ("JP", "Japan", "🇯🇵", Currency::JPY),
    ("CN", "China", "🇨🇳", Currency::CNY),
    ("AU", "Australia", "🇦🇺", Currency::AUD),
    ("CA", "Canada", "🇨🇦", Currency::CAD),
    ("CH", "Switzerland", "🇨🇭", Currency::CHF),
    ("IN", "India", "🇮🇳", Currency::INR),
    ("AE", "United Arab Emirates", "🇦🇪", Currency::AED),
    ("TR", "Turkey", "🇹🇷", Currency::TRY),
    ("MX", "Mexico", "🇲🇽", Currency::MXN),
    ("BR", "Brazil", "🇧🇷", Currency::BRL),
    ("ZA", "South Africa", "🇿🇦", Currency::ZAR),
    ("SG", "Singapore", "🇸🇬", Currency::SGD),
    ("NZ", "New Zealand", "🇳🇿", Currency::NZD),
    ("HK", "Hong Kong", "🇭🇰", Currency::HKD),
    ("SE", "Sweden", "🇸🇪", Currency::SEK),
    ("NO", "Norway", "🇳🇴", Currency::NOK),
    ("DK", "Denmark", "🇩🇰", Currency::DKK),
    ("PL", "Poland", "🇵🇱", Currency::PLN),
    ("CZ", "Czechia", "🇨🇿", Currency::CZK),
    ("KR", "South Korea", "🇰🇷", Currency::KRW),
    ("ID", "Indonesia", "🇮🇩", Currency::IDR),
    ("MY", "Malaysia", "🇲🇾", Currency::MYR),
    ("PH", "Philippines", "🇵🇭", Currency::PHP),
    ("VN", "Vietnam", "🇻🇳", Currency::VND),
    ("EG", "Egypt", "🇪🇬", Currency::EGP),
    ("SA", "Saudi Arabia", "🇸🇦", Currency::SAR),
    ("AR", "Argentina", "🇦🇷", Currency::ARS),
    ("CL", "Chile", "🇨🇱", Currency::CLP),
];

/// Looks up a country by its code.
///
/// Unresolvable codes fall back to the raw code with a generic flag.
pub fn country_meta(code: &str) -> CountryMeta<'_> {
    COUNTRIES
        .iter()
        .find(|(known, ..)| *known == code)
        .map(|&(code, name, flag, currency)| CountryMeta {
            code,
            name,
            flag,
            currency: Some(currency),
        })
        .unwrap_or(CountryMeta {
            code,
            name: code,
            flag: UNKNOWN_FLAG,
            currency: None,
        })
}

/// Every country in the catalog, in catalog order.
pub fn countries() -> impl Iterator<Item = CountryMeta<'static>> {
    COUNTRIES
        .iter()
        .map(|&(code, name, flag, currency)| CountryMeta {
            code,
            name,
            flag,
            currency: Some(currency),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_country_resolves() {
        let meta = country_meta("TH");
        assert_eq!(meta.name, "Thailand");
        assert_eq!(meta.currency, Some(Currency::THB));
    }

    #[test]
    fn unknown_country_falls_back_to_code() {
        let meta = country_meta("ZZ");
        assert_eq!(meta.code, "ZZ");
        assert_eq!(meta.name, "ZZ");
        assert_eq!(meta.flag, UNKNOWN_FLAG);
        assert_eq!(meta.currency, None);
    }

    #[test]
    fn catalog_codes_are_unique() {
        let mut codes: Vec<_> = countries().map(|c| c.code).collect();
        let len = codes.len();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), len);
        assert_eq!(len, 33);
    }
}
