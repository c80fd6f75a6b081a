//! ArthaDhan ledger - paper-trading state for the dashboard backend.
//!
//! This crate holds the only stateful piece of the dashboard API:
//!
//! - **Ledger engine**: virtual capital, open positions with cost averaging,
//!   most-recent-first trade history
//! - **Revaluation**: simulated price drift on every trade, P&L recomputed
//!   from the position set
//! - **Retention**: trade history trimmed to a trailing window on read
//! - **Dashboard view**: display strings the frontend renders verbatim
//!
//! # Example
//!
//! ```rust
//! use artha_ledger::{LedgerConfig, LedgerEngine, OrderType, TradeAction};
//!
//! let mut ledger = LedgerEngine::new(LedgerConfig::default());
//!
//! let trade = ledger
//!     .execute_trade("RELIANCE", TradeAction::Buy, 10, 2450.0, OrderType::Market)
//!     .unwrap();
//! println!("Executed {} at {}", trade.id, trade.price);
//!
//! let state = ledger.state();
//! assert_eq!(state.active_positions.len(), 1);
//! ```

pub mod config;
pub mod ledger;
pub mod types;
pub mod view;

// Re-export commonly used types
pub use config::LedgerConfig;
pub use ledger::{
    Clock, FixedNoise, LedgerEngine, LedgerHandle, ManualClock, NoiseSource, RandomNoise,
    ScriptedNoise, SystemClock,
};
pub use types::{
    AccountState, ApiResponse, OrderType, Position, TradeAction, TradeRecord, TradeRequest,
    TradeResponse, TradeStatus,
};
pub use view::DashboardView;

/// Error types for ledger operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid action: {0} (expected BUY or SELL)")]
    InvalidAction(String),

    #[error("Invalid quantity: {0} (must be positive)")]
    InvalidQuantity(i64),

    #[error("Invalid price: {0} (must be positive)")]
    InvalidPrice(f64),

    #[error("Invalid instrument: {0:?}")]
    InvalidInstrument(String),

    #[error("Invalid order type: {0} (expected MARKET or LIMIT)")]
    InvalidOrderType(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Ledger lock poisoned")]
    LockPoisoned,
}

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, Error>;
