//! Terminal rendering for the analytics tables

use anyhow::Result;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use owo_colors::OwoColorize;
use rust_decimal::Decimal;

use crate::broker::{TransferEvent, TransferKind};
use crate::ledger::{TradeEvent, TradeSide};
use crate::returns::ReturnPoint;

/// Render the cumulative return series, newest row last
pub fn print_returns_table(points: &[ReturnPoint]) -> Result<()> {
    println!("\n{}", "TIME-WEIGHTED RETURNS".bright_yellow());
    println!("{}", "─".repeat(50).bright_black());

    if points.is_empty() {
        println!("\n{}", "No return points to display".bright_black().italic());
        return Ok(());
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Date", "Cumulative Return"]);

    for point in points {
        table.add_row(vec![
            point.date.format("%Y-%m-%d").to_string(),
            colored_pct(point.twr_pct),
        ]);
    }

    println!("{}", table);

    if let Some(latest) = points.last() {
        println!(
            "📈 Return through {}: {}",
            latest.date,
            colored_pct(latest.twr_pct)
        );
    }

    Ok(())
}

/// Render the filled-order ledger, oldest row first
pub fn print_orders_table(events: &[TradeEvent]) -> Result<()> {
    println!("\n{}", "FILLED ORDERS".bright_yellow());
    println!("{}", "─".repeat(50).bright_black());

    if events.is_empty() {
        println!("\n{}", "No filled orders found".bright_black().italic());
        return Ok(());
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Date", "Symbol", "Side", "Shares", "Price", "Value"]);

    for event in events {
        let side_display = match event.side {
            TradeSide::Buy => event.side.to_string().bright_green().to_string(),
            TradeSide::Sell => event.side.to_string().bright_red().to_string(),
        };
        table.add_row(vec![
            event.trade_date().format("%Y-%m-%d").to_string(),
            event.symbol.clone(),
            side_display,
            format!("{}", event.shares),
            format!("${:.2}", event.price),
            format!("${:.2}", event.price * event.shares),
        ]);
    }

    println!("{}", table);

    let buys = events.iter().filter(|e| e.side == TradeSide::Buy).count();
    let sells = events.len() - buys;
    let net_invested: Decimal = events.iter().map(|e| -e.signed_cost()).sum();
    println!(
        "🧾 {} buys, {} sells | Net invested: ${:.2}",
        buys.to_string().bright_green(),
        sells.to_string().bright_red(),
        net_invested
    );

    Ok(())
}

/// Render the bank transfer history, oldest row first
pub fn print_transfers_table(transfers: &[TransferEvent]) -> Result<()> {
    println!("\n{}", "BANK TRANSFERS".bright_yellow());
    println!("{}", "─".repeat(50).bright_black());

    if transfers.is_empty() {
        println!("\n{}", "No transfers found".bright_black().italic());
        return Ok(());
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Date", "Direction", "Amount"]);

    for transfer in transfers {
        let direction = match transfer.kind {
            TransferKind::Deposit => "deposit".bright_green().to_string(),
            TransferKind::Withdrawal => "withdrawal".bright_red().to_string(),
        };
        table.add_row(vec![
            transfer.date.format("%Y-%m-%d").to_string(),
            direction,
            format!("${:.2}", transfer.amount),
        ]);
    }

    println!("{}", table);

    let net: Decimal = transfers.iter().map(|t| t.signed_amount()).sum();
    println!("💰 Net deposited: ${:.2}", net);

    Ok(())
}

fn colored_pct(pct: Decimal) -> String {
    let text = format!("{:.2}%", pct);
    if pct < Decimal::ZERO {
        text.bright_red().to_string()
    } else {
        text.bright_green().to_string()
    }
}
