//! Demo book the dashboard starts from.

use super::clock::Clock;
use super::engine::LedgerEngine;
use super::noise::NoiseSource;
use crate::config::LedgerConfig;
use crate::types::Position;

/// (id, instrument, quantity, average cost, last price)
const DEMO_POSITIONS: [(&str, &str, u64, f64, f64); 4] = [
    ("PT-101", "RELIANCE", 50, 2420.50, 2468.00),
    ("PT-102", "TATAMOTORS", 200, 1050.00, 1020.00),
    ("PT-103", "HDFCBANK", 150, 1520.00, 1540.00),
    ("PT-104", "INFY", 100, 1600.00, 1515.00),
];

const DEMO_WIN_RATE: f64 = 64.0;
const DEMO_PROFIT_FACTOR: f64 = 1.8;

impl LedgerEngine {
    /// Ledger preloaded with the demo positions and stats.
    pub fn demo(
        config: LedgerConfig,
        noise: impl NoiseSource + 'static,
        clock: impl Clock + 'static,
    ) -> Self {
        let opened_at = clock.now();
        let mut ledger = Self::with_sources(config, noise, clock);
        for (id, instrument, quantity, average_cost, last_price) in DEMO_POSITIONS {
            let position =
                Position::new(id.to_string(), instrument, quantity, average_cost, opened_at)
                    .with_price(last_price);
            ledger.restore_position(position);
        }
        ledger.set_stats(DEMO_WIN_RATE, DEMO_PROFIT_FACTOR);
        ledger
    }
}
