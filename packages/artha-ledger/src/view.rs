//! Dashboard payload: the account state with the display strings the
//! paper-trading screen renders as-is.

use crate::types::{AccountState, Position, TradeRecord};
use serde::{Deserialize, Serialize};

/// Account state as the dashboard consumes it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    /// e.g. `₹1,00,000`
    pub virtual_capital: String,
    /// e.g. `₹1,04,500.00`
    pub current_balance: String,
    /// e.g. `+₹4,500.00`
    #[serde(rename = "totalPnL")]
    pub total_pnl: String,
    /// e.g. `64.0%`
    pub win_rate: String,
    pub profit_factor: f64,
    pub active_positions: Vec<PositionRow>,
    pub trade_history: Vec<HistoryRow>,
}

/// One row of the open positions table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PositionRow {
    pub id: String,
    pub instrument: String,
    pub qty: u64,
    pub avg_cost: f64,
    pub ltp: f64,
    pub cur_val: f64,
    pub pnl: f64,
    /// e.g. `+1.96%`
    pub net_chg: String,
}

/// One row of the trade history table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryRow {
    pub id: String,
    pub ticker: String,
    pub action: String,
    pub qty: u64,
    pub price: f64,
    #[serde(rename = "type")]
    pub order_type: String,
    pub message: String,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl DashboardView {
    pub fn from_state(state: &AccountState) -> Self {
        Self {
            virtual_capital: format_rupees(state.virtual_capital, 0),
            current_balance: format_rupees(state.current_balance, 2),
            total_pnl: format_signed_rupees(state.total_pnl),
            win_rate: format!("{:.1}%", state.win_rate),
            profit_factor: state.profit_factor,
            active_positions: state.active_positions.iter().map(PositionRow::from).collect(),
            trade_history: state.trade_history.iter().map(HistoryRow::from).collect(),
        }
    }
}

impl From<&AccountState> for DashboardView {
    fn from(state: &AccountState) -> Self {
        Self::from_state(state)
    }
}

impl From<&Position> for PositionRow {
    fn from(pos: &Position) -> Self {
        Self {
            id: pos.id.clone(),
            instrument: pos.instrument.clone(),
            qty: pos.quantity,
            avg_cost: round2(pos.average_cost),
            ltp: round2(pos.last_price),
            cur_val: round2(pos.current_value),
            pnl: round2(pos.unrealized_pnl),
            net_chg: format_signed_percent(pos.net_change_percent),
        }
    }
}

impl From<&TradeRecord> for HistoryRow {
    fn from(trade: &TradeRecord) -> Self {
        Self {
            id: trade.id.clone(),
            ticker: trade.instrument.clone(),
            action: trade.action.to_string(),
            qty: trade.quantity,
            price: trade.price,
            order_type: trade.order_type.to_string(),
            message: "COMPLETED".to_string(),
            timestamp: trade.timestamp.clone(),
            created_at: trade.created_at.map(|ts| ts.to_rfc3339()),
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Group the integer digits the Indian way: last three, then pairs.
fn group_indian(mut digits: &str) -> String {
    if digits.len() <= 3 {
        return digits.to_string();
    }
    let (head, tail) = digits.split_at(digits.len() - 3);
    digits = head;

    let mut groups = Vec::new();
    while digits.len() > 2 {
        let (rest, pair) = digits.split_at(digits.len() - 2);
        groups.push(pair);
        digits = rest;
    }
    groups.push(digits);
    groups.reverse();

    format!("{},{}", groups.join(","), tail)
}

/// `₹1,04,500.00`, with a leading `-` for negatives.
pub fn format_rupees(amount: f64, decimals: usize) -> String {
    let formatted = format!("{:.*}", decimals, amount.abs());
    let (int_part, frac_part) = match formatted.split_once('.') {
        Some((int_part, frac)) => (int_part, Some(frac)),
        None => (formatted.as_str(), None),
    };

    let sign = if amount < 0.0 && formatted.bytes().any(|b| b.is_ascii_digit() && b != b'0') {
        "-"
    } else {
        ""
    };
    match frac_part {
        Some(frac) => format!("{sign}₹{}.{frac}", group_indian(int_part)),
        None => format!("{sign}₹{}", group_indian(int_part)),
    }
}

/// `+₹4,500.00` / `-₹9,125.00`.
pub fn format_signed_rupees(amount: f64) -> String {
    let body = format_rupees(amount, 2);
    if body.starts_with('-') {
        body
    } else {
        format!("+{body}")
    }
}

/// `+1.96%` / `-2.85%`.
pub fn format_signed_percent(value: f64) -> String {
    let rounded = round2(value);
    if rounded < 0.0 {
        format!("{:.2}%", rounded)
    } else {
        format!("+{:.2}%", rounded.abs())
    }
}
