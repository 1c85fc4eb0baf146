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

use clap::{Args, Parser, Subcommand};
use csv::{ReaderBuilder, Trim, Writer};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::process;
use thiserror::Error;
use tracing::{debug, info};
use trip_ledger::{
    Currency, Expense, ExpenseCategory, ExpenseFilter, ExpenseRequest, MemoryStore,
    ParticipantId, Settings, SettlementReport, StaticIdentity, TransferRequest, Trip, TripDraft,
    TripError, TripService, sanitize_trip_snapshot, summarize_by_category, summarize_by_country,
    summarize_by_currency,
};

/// Trip Ledger - Multi-currency travel expenses
///
/// Reads expense and transfer CSV files, prints per-currency summaries or
/// settlement suggestions, and repairs cached trip snapshots.
#[derive(Parser, Debug)]
#[command(name = "trip-ledger")]
#[command(about = "Summarize and settle multi-currency trip expenses", long_about = None)]
struct Cli {
    #[command(flatten)]
    settings: Settings,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Per-currency totals by currency, category and country
    Summary(SummaryArgs),
    /// Balances and suggested transfers
    Settle(SettleArgs),
    /// Repair a cached trip snapshot and print it as JSON
    Sanitize(SanitizeArgs),
}

#[derive(Args, Debug)]
struct SummaryArgs {
    /// Expense CSV: date,payer,amount,currency,category,country,description
    #[arg(value_name = "FILE")]
    expenses: PathBuf,

    #[arg(long)]
    category: Option<ExpenseCategory>,

    #[arg(long)]
    currency: Option<Currency>,

    /// ISO 3166-1 alpha-2 country code
    #[arg(long)]
    country: Option<String>,
}

#[derive(Args, Debug)]
struct SettleArgs {
    /// Expense CSV: date,payer,amount,currency,category,country,description
    #[arg(value_name = "FILE")]
    expenses: PathBuf,

    /// Comma-separated participant names sharing every expense
    #[arg(long, value_delimiter = ',', required = true)]
    participants: Vec<String>,

    /// Transfer CSV: date,from,to,amount,currency
    #[arg(long, value_name = "FILE")]
    transfers: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct SanitizeArgs {
    /// Trip snapshot JSON
    #[arg(value_name = "FILE")]
    snapshot: PathBuf,
}

#[derive(Error, Debug)]
enum CliError {
    #[error("cannot open '{}': {source}", path.display())]
    Open { path: PathBuf, source: io::Error },

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Trip(#[from] TripError),

    #[error("'{}' does not contain a trip object", .0.display())]
    NotATrip(PathBuf),
}

fn init_logging() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(io::stderr);
    let filter_layer =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into());

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    if let Err(e) = run(cli, io::stdout()) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run<W: Write>(cli: Cli, out: W) -> Result<(), CliError> {
    let email = cli.settings.caller_email(&StaticIdentity::default());
    let service = TripService::new(MemoryStore::new());

    match cli.command {
        Command::Summary(args) => {
            let loaded = import_trip(
                &service,
                &email,
                &cli.settings,
                &args.expenses,
                &[],
                open(&args.expenses)?,
                None::<File>,
            )?;
            let filter = ExpenseFilter {
                category: args.category.into(),
                currency: args.currency.into(),
                country: args.country.into(),
            };
            write_summary(&filter.apply(&loaded.expenses), out)?;
        }
        Command::Settle(args) => {
            let transfers = args.transfers.as_deref().map(open).transpose()?;
            let loaded = import_trip(
                &service,
                &email,
                &cli.settings,
                &args.expenses,
                &args.participants,
                open(&args.expenses)?,
                transfers,
            )?;
            let overview =
                service.trip_overview(&email, &loaded.trip.id, cli.settings.settlement_policy())?;
            write_settlement(&overview.settlement, &loaded.names, out)?;
        }
        Command::Sanitize(args) => {
            let mut raw = String::new();
            open(&args.snapshot)?.read_to_string(&mut raw)?;
            let value: serde_json::Value = serde_json::from_str(&raw)?;
            let sanitized =
                sanitize_trip_snapshot(&value).ok_or(CliError::NotATrip(args.snapshot))?;
            info!(repaired = sanitized.repaired.len(), "snapshot sanitized");
            write_snapshot(&sanitized.trip, out)?;
        }
    }
    Ok(())
}

fn open(path: &Path) -> Result<File, CliError> {
    File::open(path).map_err(|source| CliError::Open {
        path: path.to_path_buf(),
        source,
    })
}

/// Raw expense row.
///
/// Fields: `date, payer, amount, currency, category, country, description`
#[derive(Debug, Deserialize)]
struct ExpenseRecord {
    date: chrono::NaiveDate,
    payer: String,
    amount: Decimal,
    currency: String,
    category: String,
    country: Option<String>,
    description: String,
}

/// Raw transfer row.
///
/// Fields: `date, from, to, amount, currency`
#[derive(Debug, Deserialize)]
struct TransferRecord {
    date: chrono::NaiveDate,
    from: String,
    to: String,
    amount: Decimal,
    currency: String,
}

fn midday(date: chrono::NaiveDate) -> chrono::DateTime<chrono::Utc> {
    date.and_hms_opt(12, 0, 0).unwrap_or_default().and_utc()
}

/// A trip rebuilt from CSV input.
struct ImportedTrip {
    trip: Trip,
    /// Display names by participant.
    names: HashMap<ParticipantId, String>,
    /// Accepted expenses, in file order.
    expenses: Vec<Expense>,
}

/// Maps participant names to ids, adding unknown names to the trip.
struct Roster<'a> {
    service: &'a TripService<MemoryStore>,
    email: &'a str,
    trip: &'a Trip,
    ids: HashMap<String, ParticipantId>,
}

impl Roster<'_> {
    fn resolve(&mut self, name: &str) -> Result<ParticipantId, TripError> {
        let name = name.trim();
        if let Some(id) = self.ids.get(name) {
            return Ok(id.clone());
        }
        let participant = self
            .service
            .add_participant(self.email, &self.trip.id, name, None)?;
        self.ids.insert(name.to_owned(), participant.id.clone());
        Ok(participant.id)
    }
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    ReaderBuilder::new()
        .trim(Trim::All)
        .has_headers(true)
        .from_reader(reader)
}

/// Creates a trip and records every valid expense and transfer row on it.
///
/// Named `participants` are added first and share every expense; payers
/// and transfer parties missing from the list join the trip when first
/// seen. Malformed or invalid rows are skipped.
fn import_trip<E: Read, T: Read>(
    service: &TripService<MemoryStore>,
    email: &str,
    settings: &Settings,
    source: &Path,
    participants: &[String],
    expenses: E,
    transfers: Option<T>,
) -> Result<ImportedTrip, CliError> {
    let name = source
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .filter(|stem| !stem.trim().is_empty())
        .unwrap_or_else(|| "Imported trip".to_owned());
    let draft = TripDraft {
        name: Some(name),
        base_currency: Some(settings.base_currency.code().to_owned()),
        adults: Some(participants.len().max(1) as f64),
        children: Some(0.0),
        travel_style: Some("other".to_owned()),
        trip_style_other: Some("Imported from CSV".to_owned()),
        ..TripDraft::default()
    };
    let trip = service.create_trip(email, draft)?;

    let mut roster = Roster {
        service,
        email,
        trip: &trip,
        ids: HashMap::new(),
    };
    for name in participants.iter().filter(|n| !n.trim().is_empty()) {
        roster.resolve(name)?;
    }

    let mut recorded = Vec::new();
    for result in csv_reader(BufReader::new(expenses)).deserialize::<ExpenseRecord>() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                debug!(error = %e, "skipping malformed expense row");
                continue;
            }
        };
        let payer = roster.resolve(&record.payer)?;
        let request = ExpenseRequest {
            trip_id: trip.id.clone(),
            amount: record.amount,
            currency: record.currency,
            category: record.category,
            description: record.description,
            notes: None,
            date: Some(midday(record.date)),
            country_code: record.country,
            is_planned: false,
            paid_by: Some(payer),
        };
        match service.record_expense(email, request) {
            Ok(expense) => recorded.push(expense),
            Err(TripError::Validation(errors)) => {
                debug!(?errors, "skipping invalid expense row");
            }
            Err(e) => return Err(e.into()),
        }
    }

    if let Some(transfers) = transfers {
        for result in csv_reader(BufReader::new(transfers)).deserialize::<TransferRecord>() {
            let record = match result {
                Ok(record) => record,
                Err(e) => {
                    debug!(error = %e, "skipping malformed transfer row");
                    continue;
                }
            };
            let request = TransferRequest {
                trip_id: trip.id.clone(),
                from: roster.resolve(&record.from)?,
                to: roster.resolve(&record.to)?,
                amount: record.amount,
                currency: record.currency,
                date: Some(midday(record.date)),
                note: None,
            };
            if let Err(e) = service.record_transfer(email, request) {
                match e {
                    TripError::Validation(errors) => {
                        debug!(?errors, "skipping invalid transfer row");
                    }
                    e => return Err(e.into()),
                }
            }
        }
    }

    let names = roster
        .ids
        .into_iter()
        .map(|(name, id)| (id, name))
        .collect();
    info!(expenses = recorded.len(), "trip imported");
    Ok(ImportedTrip {
        trip,
        names,
        expenses: recorded,
    })
}

/// One output row of the summary report.
#[derive(Debug, Serialize)]
struct SummaryRow<'a> {
    view: &'static str,
    key: &'a str,
    currency: Currency,
    total: Decimal,
    count: usize,
}

/// Write the by-currency, by-category and by-country views as CSV.
///
/// # CSV Format
///
/// Columns: `view, key, currency, total, count`
///
/// ```csv
/// view,key,currency,total,count
/// currency,USD,USD,500,1
/// category,food,THB,150,1
/// country,TH,THB,150,1
/// ```
fn write_summary<W: Write>(expenses: &[&Expense], writer: W) -> Result<(), csv::Error> {
    let mut wtr = Writer::from_writer(writer);
    let expenses = || expenses.iter().copied();

    for total in summarize_by_currency(expenses()) {
        wtr.serialize(SummaryRow {
            view: "currency",
            key: total.currency.code(),
            currency: total.currency,
            total: total.total,
            count: total.count,
        })?;
    }
    for summary in summarize_by_category(expenses()) {
        for total in &summary.totals {
            wtr.serialize(SummaryRow {
                view: "category",
                key: summary.category.as_str(),
                currency: total.currency,
                total: total.total,
                count: total.count,
            })?;
        }
    }
    for summary in summarize_by_country(expenses()) {
        for total in &summary.totals {
            wtr.serialize(SummaryRow {
                view: "country",
                key: &summary.code,
                currency: total.currency,
                total: total.total,
                count: total.count,
            })?;
        }
    }

    wtr.flush()?;
    Ok(())
}

/// One output row of the settlement report.
#[derive(Debug, Serialize)]
struct SettlementRow<'a> {
    kind: &'static str,
    currency: Currency,
    participant: &'a str,
    counterparty: &'a str,
    amount: Decimal,
}

/// Write balances and suggested transfers as CSV.
///
/// # CSV Format
///
/// Columns: `kind, currency, participant, counterparty, amount`. A
/// `transfer` row means `participant` should pay `counterparty`.
///
/// ```csv
/// kind,currency,participant,counterparty,amount
/// balance,USD,alice,,20.00
/// transfer,USD,bob,alice,10.00
/// ```
fn write_settlement<W: Write>(
    report: &SettlementReport,
    names: &HashMap<ParticipantId, String>,
    writer: W,
) -> Result<(), csv::Error> {
    let mut wtr = Writer::from_writer(writer);
    let name = |id: &ParticipantId| names.get(id).map_or(id.as_str(), String::as_str).to_owned();

    for ledger in &report.ledgers {
        for balance in &ledger.balances {
            let participant = name(&balance.participant);
            wtr.serialize(SettlementRow {
                kind: "balance",
                currency: ledger.currency,
                participant: &participant,
                counterparty: "",
                amount: balance.net,
            })?;
        }
        for transfer in &ledger.suggested {
            let (from, to) = (name(&transfer.from), name(&transfer.to));
            wtr.serialize(SettlementRow {
                kind: "transfer",
                currency: ledger.currency,
                participant: &from,
                counterparty: &to,
                amount: transfer.amount,
            })?;
        }
    }

    wtr.flush()?;
    Ok(())
}

fn write_snapshot<W: Write>(trip: &Trip, mut writer: W) -> Result<(), CliError> {
    serde_json::to_writer_pretty(&mut writer, trip)?;
    writeln!(writer)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::io::Cursor;

    const EXPENSES: &str = "date,payer,amount,currency,category,country,description\n\
                            2025-03-01,alice,150,THB,food,TH,Pad thai\n\
                            2025-03-02,alice,500,USD,flights,,BKK-TLV\n\
                            2025-03-03,bob,20,ILS,food,IL,Falafel\n";

    fn import(participants: &[&str], expenses: &str, transfers: Option<&str>) -> (TripService<MemoryStore>, ImportedTrip) {
        let service = TripService::new(MemoryStore::new());
        let participants: Vec<String> = participants.iter().map(|p| p.to_string()).collect();
        let loaded = import_trip(
            &service,
            "demo@example.com",
            &Settings::default(),
            Path::new("bangkok.csv"),
            &participants,
            Cursor::new(expenses.to_owned()),
            transfers.map(|t| Cursor::new(t.to_owned())),
        )
        .unwrap();
        (service, loaded)
    }

    fn settle_csv(participants: &[&str], expenses: &str, transfers: Option<&str>) -> String {
        let (service, loaded) = import(participants, expenses, transfers);
        let overview = service
            .trip_overview(
                "demo@example.com",
                &loaded.trip.id,
                trip_ledger::SettlementPolicy::PerCurrency,
            )
            .unwrap();
        let mut output = Vec::new();
        write_settlement(&overview.settlement, &loaded.names, &mut output).unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn import_names_trip_after_file() {
        let (_, loaded) = import(&[], EXPENSES, None);
        assert_eq!(loaded.trip.name, "bangkok");
        assert_eq!(loaded.expenses.len(), 3);
    }

    #[test]
    fn skip_malformed_rows() {
        let csv = "date,payer,amount,currency,category,country,description\n\
                   2025-03-01,alice,10,USD,food,,Lunch\n\
                   not-a-date,alice,10,USD,food,,Broken\n\
                   2025-03-01,alice,10,usd,food,,Lowercase currency\n\
                   2025-03-01,alice,-5,USD,food,,Negative\n\
                   2025-03-01,alice,10,USD,souvenirs,,Unknown category\n\
                   2025-03-02,bob,5,USD,food,,Coffee\n";
        let (_, loaded) = import(&[], csv, None);
        assert_eq!(loaded.expenses.len(), 2);
    }

    #[test]
    fn parse_with_whitespace() {
        let csv = "date,payer,amount,currency,category,country,description\n\
                   2025-03-01 , alice , 12.50 , EUR , food , FR , Croissant \n";
        let (_, loaded) = import(&[], csv, None);
        assert_eq!(loaded.expenses[0].amount, dec!(12.50));
        assert_eq!(loaded.expenses[0].country_code.as_deref(), Some("FR"));
    }

    #[test]
    fn write_summary_never_mixes_currencies() {
        let (_, loaded) = import(&[], EXPENSES, None);
        let all: Vec<&Expense> = loaded.expenses.iter().collect();
        let mut output = Vec::new();
        write_summary(&all, &mut output).unwrap();

        let output = String::from_utf8(output).unwrap();
        assert!(output.starts_with("view,key,currency,total,count"));
        assert!(output.contains("currency,USD,USD,500,1"));
        assert!(output.contains("category,food,THB,150,1"));
        assert!(output.contains("category,food,ILS,20,1"));
        assert!(output.contains("country,TH,THB,150,1"));
        assert!(!output.contains("country,,"));
    }

    #[test]
    fn write_settlement_uses_names() {
        let csv = "date,payer,amount,currency,category,country,description\n\
                   2025-03-01,alice,10,USD,food,,Breakfast\n\
                   2025-03-01,alice,10,USD,food,,Lunch\n\
                   2025-03-01,alice,10,USD,food,,Dinner\n";
        let output = settle_csv(&["alice", "bob", "carol"], csv, None);

        // Each meal is stored as 3.34 / 3.33 / 3.33, the payer taking the extra cent.
        assert!(output.contains("balance,USD,alice,,19.98"));
        assert!(output.contains("balance,USD,bob,,-9.99"));
        assert!(output.contains("transfer,USD,bob,alice,9.99"));
        assert!(output.contains("transfer,USD,carol,alice,9.99"));
    }

    #[test]
    fn transfers_settle_the_trip() {
        let csv = "date,payer,amount,currency,category,country,description\n\
                   2025-03-01,alice,30,EUR,accommodation,,Hostel\n";
        let transfers = "date,from,to,amount,currency\n\
                         2025-03-02,bob,alice,15,EUR\n\
                         2025-03-02,bob,bob,15,EUR\n";
        let output = settle_csv(&["alice", "bob"], csv, Some(transfers));

        assert!(output.contains("balance,EUR,alice,,0"));
        assert!(!output.contains("transfer,"));
    }

    #[test]
    fn write_snapshot_outputs_camel_case() {
        let value = serde_json::json!({ "name": "Cached", "baseCurrency": "nope" });
        let sanitized = sanitize_trip_snapshot(&value).unwrap();
        let mut output = Vec::new();
        write_snapshot(&sanitized.trip, &mut output).unwrap();

        let output = String::from_utf8(output).unwrap();
        assert!(output.contains("\"baseCurrency\": \"USD\""));
        assert!(output.contains("\"name\": \"Cached\""));
    }
}
