//! Cumulative signed cost of trading per symbol per tracked date

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tracing::warn;

use crate::ledger::TradeEvent;
use crate::portfolio::history::HoldingsHistory;

/// Date -> symbol -> cumulative signed cost (buys negative, sells positive)
/// realized up to and including that date.
#[derive(Debug, Clone)]
pub struct CostBasisTable {
    days: BTreeMap<NaiveDate, BTreeMap<String, Decimal>>,
}

impl CostBasisTable {
    /// Bucket each trade's signed cost into the first tracked date at or
    /// after its trade date, then prefix-sum across dates. A trade dated
    /// past the final tracked date has nowhere to land and is skipped.
    pub fn compute(events: &[TradeEvent], holdings: &HoldingsHistory) -> Self {
        let zero_row: BTreeMap<String, Decimal> = holdings
            .symbols()
            .iter()
            .map(|s| (s.clone(), Decimal::ZERO))
            .collect();

        let mut daily: BTreeMap<NaiveDate, BTreeMap<String, Decimal>> = holdings
            .dates()
            .map(|d| (d, zero_row.clone()))
            .collect();

        for event in events {
            match daily.range_mut(event.trade_date()..).next() {
                Some((_, bucket)) => {
                    *bucket
                        .entry(event.symbol.clone())
                        .or_insert(Decimal::ZERO) += event.signed_cost();
                }
                None => {
                    warn!(
                        "Trade in {} on {} falls after the tracked range; skipping",
                        event.symbol,
                        event.trade_date()
                    );
                }
            }
        }

        let mut running = zero_row;
        let mut days = BTreeMap::new();
        for (date, bucket) in daily {
            for (symbol, cost) in bucket {
                *running.entry(symbol).or_insert(Decimal::ZERO) += cost;
            }
            days.insert(date, running.clone());
        }

        Self { days }
    }

    /// Cumulative cost for one symbol at a date; zero when untracked
    pub fn get(&self, date: NaiveDate, symbol: &str) -> Decimal {
        self.days
            .get(&date)
            .and_then(|row| row.get(symbol))
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    /// Sum of cumulative costs across all symbols at a date
    pub fn total_at(&self, date: NaiveDate) -> Decimal {
        self.days
            .get(&date)
            .map(|row| row.values().copied().sum())
            .unwrap_or(Decimal::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::TradeSide;
    use rust_decimal_macros::dec;

    fn trade(symbol: &str, side: TradeSide, shares: Decimal, price: Decimal, ts: &str) -> TradeEvent {
        TradeEvent {
            symbol: symbol.to_string(),
            side,
            shares,
            price,
            executed_at: ts.parse().unwrap(),
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_buys_accumulate_negative_cost() {
        let events = vec![
            trade("AAPL", TradeSide::Buy, dec!(10), dec!(10.00), "2021-01-04T15:00:00Z"),
            trade("AAPL", TradeSide::Buy, dec!(5), dec!(12.00), "2021-01-06T15:00:00Z"),
        ];
        let holdings = HoldingsHistory::reconstruct(&events, date(2021, 1, 8)).unwrap();
        let costs = CostBasisTable::compute(&events, &holdings);

        assert_eq!(costs.get(date(2021, 1, 4), "AAPL"), dec!(-100.00));
        assert_eq!(costs.get(date(2021, 1, 5), "AAPL"), dec!(-100.00));
        assert_eq!(costs.get(date(2021, 1, 6), "AAPL"), dec!(-160.00));
        assert_eq!(costs.get(date(2021, 1, 8), "AAPL"), dec!(-160.00));
    }

    #[test]
    fn test_sells_offset_buys() {
        let events = vec![
            trade("AAPL", TradeSide::Buy, dec!(10), dec!(10.00), "2021-01-04T15:00:00Z"),
            trade("AAPL", TradeSide::Sell, dec!(4), dec!(11.00), "2021-01-06T15:00:00Z"),
        ];
        let holdings = HoldingsHistory::reconstruct(&events, date(2021, 1, 6)).unwrap();
        let costs = CostBasisTable::compute(&events, &holdings);

        assert_eq!(costs.get(date(2021, 1, 6), "AAPL"), dec!(-56.00));
    }

    #[test]
    fn test_total_equals_negative_net_cash_invested() {
        let events = vec![
            trade("AAPL", TradeSide::Buy, dec!(10), dec!(10.00), "2021-01-04T15:00:00Z"),
            trade("MSFT", TradeSide::Buy, dec!(2), dec!(200.00), "2021-01-05T15:00:00Z"),
            trade("AAPL", TradeSide::Sell, dec!(5), dec!(12.00), "2021-01-06T15:00:00Z"),
        ];
        let holdings = HoldingsHistory::reconstruct(&events, date(2021, 1, 7)).unwrap();
        let costs = CostBasisTable::compute(&events, &holdings);

        // Net cash out: 100 + 400 - 60 = 440
        assert_eq!(costs.total_at(date(2021, 1, 7)), dec!(-440.00));
        assert_eq!(
            costs.total_at(date(2021, 1, 7)),
            costs.get(date(2021, 1, 7), "AAPL") + costs.get(date(2021, 1, 7), "MSFT")
        );
    }

    #[test]
    fn test_weekend_trade_rolls_into_next_tracked_date() {
        let events = vec![
            trade("AAPL", TradeSide::Buy, dec!(10), dec!(10.00), "2021-01-04T15:00:00Z"),
            // Saturday
            trade("AAPL", TradeSide::Buy, dec!(1), dec!(20.00), "2021-01-09T15:00:00Z"),
        ];
        let holdings = HoldingsHistory::reconstruct(&events, date(2021, 1, 12)).unwrap();
        let costs = CostBasisTable::compute(&events, &holdings);

        assert_eq!(costs.get(date(2021, 1, 8), "AAPL"), dec!(-100.00));
        // Lands on Monday the 11th
        assert_eq!(costs.get(date(2021, 1, 11), "AAPL"), dec!(-120.00));
    }

    #[test]
    fn test_trade_past_tracked_range_is_skipped() {
        let events = vec![
            trade("AAPL", TradeSide::Buy, dec!(10), dec!(10.00), "2021-01-04T15:00:00Z"),
        ];
        let holdings = HoldingsHistory::reconstruct(&events, date(2021, 1, 8)).unwrap();

        let mut with_late = events.clone();
        with_late.push(trade(
            "AAPL",
            TradeSide::Buy,
            dec!(1),
            dec!(30.00),
            "2021-02-01T15:00:00Z",
        ));
        let costs = CostBasisTable::compute(&with_late, &holdings);

        // The February trade has no bucket; totals stay at the January state
        assert_eq!(costs.total_at(date(2021, 1, 8)), dec!(-100.00));
    }
}
