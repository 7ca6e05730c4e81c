//! Time-weighted return series
//!
//! Combines holdings snapshots, cached closes, transfer history, and the
//! cost-basis table into one cumulative return series. Each holding-period
//! return strips that day's external cash flow out of the denominator, so
//! deposits and withdrawals move the account value without moving the
//! performance figure.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tracing::warn;

use crate::broker::TransferEvent;
use crate::portfolio::{CostBasisTable, HoldingsHistory};

#[derive(Debug, thiserror::Error)]
pub enum ReturnsError {
    #[error("no dates with priced holdings to compute returns from")]
    NoTrackedDates,
}

/// One point of the cumulative series, in percent
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReturnPoint {
    pub date: NaiveDate,
    pub twr_pct: Decimal,
}

/// Compute the time-weighted return series over every date where the
/// holdings price out to a nonzero value.
///
/// Dates whose holdings value to exactly zero (market holidays, gaps in the
/// price cache) drop out of the series. Transfers roll forward into the
/// first valued date at or after them. A zero denominator ends the current
/// holding period without a point and restarts the chain from that date,
/// keeping the cumulative product accrued so far.
pub fn compute_returns(
    holdings: &HoldingsHistory,
    prices: &BTreeMap<NaiveDate, BTreeMap<String, Decimal>>,
    transfers: &[TransferEvent],
    costs: &CostBasisTable,
) -> Result<Vec<ReturnPoint>, ReturnsError> {
    let mut values: BTreeMap<NaiveDate, Decimal> = BTreeMap::new();
    for (date, snapshot) in holdings.iter() {
        let stock_value = market_value(snapshot, prices.get(date));
        if !stock_value.is_zero() {
            values.insert(*date, stock_value);
        }
    }
    if values.is_empty() {
        return Err(ReturnsError::NoTrackedDates);
    }

    let mut cash_flows: BTreeMap<NaiveDate, Decimal> =
        values.keys().map(|date| (*date, Decimal::ZERO)).collect();
    for transfer in transfers {
        match cash_flows.range_mut(transfer.date..).next() {
            Some((_, bucket)) => *bucket += transfer.signed_amount(),
            None => warn!(
                "Transfer of {} on {} falls after the last valued date, ignoring it",
                transfer.amount, transfer.date
            ),
        }
    }

    let mut points = Vec::new();
    let mut cum_product = Decimal::ONE;
    let mut cum_cash = Decimal::ZERO;
    let mut prev_value: Option<Decimal> = None;

    for (date, stock_value) in &values {
        let flow = cash_flows[date];
        cum_cash += flow;
        let value = *stock_value + cum_cash + costs.total_at(*date);

        // The first valued date only seeds the chain
        if let Some(base) = prev_value {
            let denom = base + flow;
            if denom.is_zero() {
                warn!(
                    "Portfolio base is zero entering {}, restarting the return chain there",
                    date
                );
            } else {
                let hpr = (value - denom) / denom;
                cum_product *= Decimal::ONE + hpr;
                points.push(ReturnPoint {
                    date: *date,
                    twr_pct: (cum_product - Decimal::ONE) * Decimal::ONE_HUNDRED,
                });
            }
        }
        prev_value = Some(value);
    }

    Ok(points)
}

fn market_value(
    snapshot: &BTreeMap<String, Decimal>,
    day_prices: Option<&BTreeMap<String, Decimal>>,
) -> Decimal {
    let Some(day_prices) = day_prices else {
        return Decimal::ZERO;
    };
    snapshot
        .iter()
        .filter_map(|(symbol, shares)| day_prices.get(symbol).map(|close| close * shares))
        .sum()
}
