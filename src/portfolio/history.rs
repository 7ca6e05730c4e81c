//! Holdings reconstruction: replay trade events into a weekday-indexed
//! table of share counts per symbol

use chrono::{Datelike, NaiveDate, Weekday};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, BTreeSet};

use crate::ledger::TradeEvent;

#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("order history is empty; nothing to reconstruct")]
    EmptyLedger,

    #[error("no weekday dates between {start} and {end}")]
    NoWeekdays { start: NaiveDate, end: NaiveDate },
}

/// Share holdings per symbol on each weekday from the first trade to the
/// end date. Dates without trades carry the most recent snapshot forward;
/// every stored snapshot is an independent copy.
#[derive(Debug, Clone)]
pub struct HoldingsHistory {
    days: BTreeMap<NaiveDate, BTreeMap<String, Decimal>>,
    symbols: BTreeSet<String>,
    start: NaiveDate,
    end: NaiveDate,
}

impl HoldingsHistory {
    /// Replay trade events into per-date holdings.
    ///
    /// A date's snapshot reflects holdings after all of that date's trades.
    /// The calendar fill is weekday-only; holidays carry forward. Trades
    /// dated on a weekend surface in the following weekday's row.
    pub fn reconstruct(
        events: &[TradeEvent],
        end_date: NaiveDate,
    ) -> Result<Self, HistoryError> {
        if events.is_empty() {
            return Err(HistoryError::EmptyLedger);
        }

        let mut ordered: Vec<&TradeEvent> = events.iter().collect();
        ordered.sort_by_key(|e| e.executed_at);

        let mut symbols = BTreeSet::new();
        let mut trade_days: BTreeMap<NaiveDate, BTreeMap<String, Decimal>> = BTreeMap::new();
        let mut running: BTreeMap<String, Decimal> = BTreeMap::new();

        for event in &ordered {
            symbols.insert(event.symbol.clone());
            *running.entry(event.symbol.clone()).or_insert(Decimal::ZERO) +=
                event.signed_shares();
            // Re-inserting on every event leaves the date's final state in
            // place once its last trade is applied
            trade_days.insert(event.trade_date(), running.clone());
        }

        // events is non-empty, so ordered.first() exists
        let start = ordered
            .first()
            .map(|e| e.trade_date())
            .unwrap_or(end_date);

        let mut days = BTreeMap::new();
        for day in weekdays_between(start, end_date) {
            // Most recent snapshot at or before this day; weekend-dated
            // trades are picked up by the following Monday
            if let Some((_, snapshot)) = trade_days.range(..=day).next_back() {
                days.insert(day, snapshot.clone());
            }
        }

        if days.is_empty() {
            return Err(HistoryError::NoWeekdays {
                start,
                end: end_date,
            });
        }

        // days is non-empty here
        let first = days.keys().next().copied().unwrap_or(start);
        let last = days.keys().next_back().copied().unwrap_or(end_date);

        Ok(Self {
            days,
            symbols,
            start: first,
            end: last,
        })
    }

    pub fn symbols(&self) -> &BTreeSet<String> {
        &self.symbols
    }

    /// First tracked date
    pub fn start(&self) -> NaiveDate {
        self.start
    }

    /// Last tracked date
    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Share count for a symbol on a date; zero when absent
    pub fn shares(&self, date: NaiveDate, symbol: &str) -> Decimal {
        self.days
            .get(&date)
            .and_then(|snapshot| snapshot.get(symbol))
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    pub fn iter(
        &self,
    ) -> impl Iterator<Item = (&NaiveDate, &BTreeMap<String, Decimal>)> {
        self.days.iter()
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.days.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}

fn weekdays_between(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    start
        .iter_days()
        .take_while(move |d| *d <= end)
        .filter(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
}
