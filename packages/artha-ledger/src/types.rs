//! Core data types for the paper-trading ledger.

use crate::Error;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// An open holding in one instrument.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    /// Display id (`PT-...`)
    pub id: String,
    /// Ticker symbol (uppercase), unique among open positions
    pub instrument: String,
    /// Units held, always positive while the position exists
    pub quantity: u64,
    /// Quantity-weighted average fill price over all BUYs
    pub average_cost: f64,
    /// Most recent simulated market price
    pub last_price: f64,
    /// `last_price * quantity`
    pub current_value: f64,
    /// `current_value - average_cost * quantity`
    #[serde(rename = "unrealizedPnL")]
    pub unrealized_pnl: f64,
    /// Unrealized P&L as a percentage of cost basis
    pub net_change_percent: f64,
    /// When the position was opened
    pub opened_at: DateTime<Utc>,
}

impl Position {
    /// Open a new position at the fill price.
    pub fn new(
        id: String,
        instrument: &str,
        quantity: u64,
        price: f64,
        opened_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            instrument: instrument.to_string(),
            quantity,
            average_cost: price,
            last_price: price,
            current_value: 0.0,
            unrealized_pnl: 0.0,
            net_change_percent: 0.0,
            opened_at,
        }
        .with_price(price)
    }

    /// Total cost basis of the position.
    pub fn cost_basis(&self) -> f64 {
        self.average_cost * self.quantity as f64
    }

    /// Update the position with a market price and recompute the derived fields.
    pub fn with_price(&self, last_price: f64) -> Self {
        let current_value = last_price * self.quantity as f64;
        let cost_basis = self.cost_basis();
        let unrealized_pnl = current_value - cost_basis;
        let net_change_percent = if cost_basis > 0.0 {
            (unrealized_pnl / cost_basis) * 100.0
        } else {
            0.0
        };

        Self {
            last_price,
            current_value,
            unrealized_pnl,
            net_change_percent,
            ..self.clone()
        }
    }
}

/// Trade direction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeAction {
    Buy,
    Sell,
}

impl FromStr for TradeAction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "BUY" => Ok(TradeAction::Buy),
            "SELL" => Ok(TradeAction::Sell),
            _ => Err(Error::InvalidAction(s.to_string())),
        }
    }
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeAction::Buy => write!(f, "BUY"),
            TradeAction::Sell => write!(f, "SELL"),
        }
    }
}

/// Order type as chosen on the order ticket.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderType {
    #[default]
    Market,
    Limit,
}

impl FromStr for OrderType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "MARKET" => Ok(OrderType::Market),
            "LIMIT" => Ok(OrderType::Limit),
            _ => Err(Error::InvalidOrderType(s.to_string())),
        }
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderType::Market => write!(f, "MARKET"),
            OrderType::Limit => write!(f, "LIMIT"),
        }
    }
}

/// Execution status. Every paper fill completes in full.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeStatus {
    #[default]
    Completed,
}

/// Immutable log entry for one executed order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TradeRecord {
    /// Unique trade id (`TRD-...`)
    pub id: String,
    /// Ticker symbol
    pub instrument: String,
    /// Buy or Sell
    pub action: TradeAction,
    /// Units traded
    pub quantity: u64,
    /// Fill price per unit
    pub price: f64,
    /// Market or Limit
    pub order_type: OrderType,
    /// Always completed
    #[serde(default)]
    pub status: TradeStatus,
    /// Wall-clock time for display (`03:04:05 PM`)
    pub timestamp: String,
    /// Machine-comparable execution time. Missing or unparseable values load as `None`.
    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
}

impl TradeRecord {
    /// Build a completed trade record executed at `executed_at`.
    pub fn new(
        id: String,
        instrument: &str,
        action: TradeAction,
        quantity: u64,
        price: f64,
        order_type: OrderType,
        executed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            instrument: instrument.to_string(),
            action,
            quantity,
            price,
            order_type,
            status: TradeStatus::Completed,
            timestamp: executed_at.format("%I:%M:%S %p").to_string(),
            created_at: Some(executed_at),
        }
    }

    /// Total notional of the fill.
    pub fn value(&self) -> f64 {
        self.price * self.quantity as f64
    }
}

/// Accepts RFC 3339 or a naive ISO-8601 datetime (read as UTC). Anything else,
/// including non-string values, becomes `None` instead of failing the record.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw.as_ref().and_then(|v| v.as_str()).and_then(parse_timestamp))
}

pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Snapshot of the whole paper account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AccountState {
    /// Nominal starting capital (never debited by trades)
    pub virtual_capital: f64,
    /// `virtual_capital + total_pnl`
    pub current_balance: f64,
    /// Sum of unrealized P&L over open positions
    #[serde(rename = "totalPnL")]
    pub total_pnl: f64,
    /// Simulated win rate percentage
    pub win_rate: f64,
    /// Simulated profit factor
    pub profit_factor: f64,
    /// Open positions
    pub active_positions: Vec<Position>,
    /// Executed trades, most recent first
    pub trade_history: Vec<TradeRecord>,
}

impl AccountState {
    /// Get the number of open positions.
    pub fn position_count(&self) -> usize {
        self.active_positions.len()
    }

    /// Find an open position by instrument.
    pub fn position(&self, instrument: &str) -> Option<&Position> {
        let instrument = instrument.trim().to_uppercase();
        self.active_positions
            .iter()
            .find(|p| p.instrument == instrument)
    }
}

/// Trade payload as posted by the order ticket.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TradeRequest {
    pub ticker: String,
    pub action: String,
    pub qty: i64,
    pub price: f64,
    #[serde(rename = "type")]
    pub order_type: String,
}

/// Reply to an accepted trade.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TradeResponse {
    pub status: String,
    pub trade: TradeRecord,
}

impl TradeResponse {
    /// Wrap an executed trade.
    pub fn success(trade: TradeRecord) -> Self {
        Self {
            status: "SUCCESS".to_string(),
            trade,
        }
    }
}

/// API response wrapper for success cases.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Create a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    /// Create an error response.
    pub fn err(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(error.into()),
        }
    }
}
