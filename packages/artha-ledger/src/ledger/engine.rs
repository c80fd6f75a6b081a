//! Paper-trading ledger engine.

use super::clock::{Clock, SystemClock};
use super::noise::{NoiseSource, RandomNoise};
use super::retention::retain_recent;
use crate::config::LedgerConfig;
use crate::types::{
    AccountState, OrderType, Position, TradeAction, TradeRecord, TradeRequest, TradeResponse,
};
use crate::{Error, Result};
use std::fmt;
use uuid::Uuid;

/// In-memory paper account: open positions, trade history and the
/// simulated performance stats.
///
/// Trades are valuation-only. Capital is never debited or credited; the
/// balance is always `virtual_capital` plus the unrealized P&L of whatever
/// is open.
pub struct LedgerEngine {
    config: LedgerConfig,
    positions: Vec<Position>,
    trades: Vec<TradeRecord>,
    win_rate: f64,
    profit_factor: f64,
    noise: Box<dyn NoiseSource>,
    clock: Box<dyn Clock>,
}

impl fmt::Debug for LedgerEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LedgerEngine")
            .field("config", &self.config)
            .field("positions", &self.positions)
            .field("trades", &self.trades.len())
            .field("win_rate", &self.win_rate)
            .field("profit_factor", &self.profit_factor)
            .finish_non_exhaustive()
    }
}

impl LedgerEngine {
    /// Create an empty ledger driven by random noise and the system clock.
    ///
    /// Uses `config.seed` for the noise source when set.
    pub fn new(config: LedgerConfig) -> Self {
        let noise = match config.seed {
            Some(seed) => RandomNoise::seeded(seed),
            None => RandomNoise::from_entropy(),
        };
        Self::with_sources(config, noise, SystemClock)
    }

    /// Create an empty ledger with explicit noise and time sources.
    pub fn with_sources(
        config: LedgerConfig,
        noise: impl NoiseSource + 'static,
        clock: impl Clock + 'static,
    ) -> Self {
        Self {
            win_rate: config.initial_win_rate,
            profit_factor: config.initial_profit_factor,
            config,
            positions: Vec::new(),
            trades: Vec::new(),
            noise: Box::new(noise),
            clock: Box::new(clock),
        }
    }

    /// Get the active configuration.
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Open positions, in opening order.
    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    /// Find an open position by instrument.
    pub fn position(&self, instrument: &str) -> Option<&Position> {
        let instrument = instrument.trim().to_uppercase();
        self.positions.iter().find(|p| p.instrument == instrument)
    }

    /// Trade history, most recent first. Not filtered for retention.
    pub fn trade_history(&self) -> &[TradeRecord] {
        &self.trades
    }

    pub fn win_rate(&self) -> f64 {
        self.win_rate
    }

    pub fn profit_factor(&self) -> f64 {
        self.profit_factor
    }

    /// Sum of unrealized P&L over open positions.
    pub fn total_pnl(&self) -> f64 {
        self.positions.iter().map(|p| p.unrealized_pnl).sum()
    }

    /// Virtual capital plus total unrealized P&L.
    pub fn current_balance(&self) -> f64 {
        self.config.virtual_capital + self.total_pnl()
    }

    /// Execute a paper trade.
    ///
    /// Inputs are validated before anything is touched. On success the trade
    /// is logged at the head of history, the position set is updated, every
    /// open position is revalued with fresh drift and the stats take one
    /// random step.
    ///
    /// A SELL with no open position is recorded but opens nothing; short
    /// positions are not modeled. Selling more than is held closes the
    /// position.
    pub fn execute_trade(
        &mut self,
        instrument: &str,
        action: TradeAction,
        quantity: i64,
        price: f64,
        order_type: OrderType,
    ) -> Result<TradeRecord> {
        let instrument = instrument.trim().to_uppercase();
        if instrument.is_empty() {
            return Err(Error::InvalidInstrument(instrument));
        }
        if quantity <= 0 {
            return Err(Error::InvalidQuantity(quantity));
        }
        if !price.is_finite() || price <= 0.0 {
            return Err(Error::InvalidPrice(price));
        }
        let held = self.find_index(&instrument);
        let quantity = quantity as u64;
        if let (Some(idx), TradeAction::Buy) = (held, action) {
            if self.positions[idx].quantity.checked_add(quantity).is_none() {
                return Err(Error::InvalidQuantity(quantity as i64));
            }
        }

        let now = self.clock.now();
        let trade = TradeRecord::new(
            format!("TRD-{}", Uuid::new_v4().simple()),
            &instrument,
            action,
            quantity,
            price,
            order_type,
            now,
        );
        self.trades.insert(0, trade.clone());

        tracing::debug!(
            "Executing {} {} x{} @ {:.2} ({})",
            action,
            instrument,
            quantity,
            price,
            order_type
        );

        match (held, action) {
            (None, TradeAction::Buy) => {
                let id = format!("PT-{}", &Uuid::new_v4().simple().to_string()[..8]).to_uppercase();
                self.positions
                    .push(Position::new(id, &instrument, quantity, price, now));
                tracing::info!("Opened position {} x{} @ {:.2}", instrument, quantity, price);
            }
            (None, TradeAction::Sell) => {
                tracing::debug!("No open position in {}, sell leaves book unchanged", instrument);
            }
            (Some(idx), TradeAction::Buy) => {
                // Average up/down
                let pos = &mut self.positions[idx];
                let total_quantity = pos.quantity.saturating_add(quantity);
                pos.average_cost = (pos.average_cost * pos.quantity as f64
                    + price * quantity as f64)
                    / total_quantity as f64;
                pos.quantity = total_quantity;
            }
            (Some(idx), TradeAction::Sell) => {
                if quantity >= self.positions[idx].quantity {
                    self.positions.remove(idx);
                    tracing::info!("Closed position {}", instrument);
                } else {
                    self.positions[idx].quantity -= quantity;
                }
            }
        }

        self.revalue();
        self.step_stats();

        Ok(trade)
    }

    /// Execute a trade from the order-ticket payload.
    pub fn execute_request(&mut self, request: &TradeRequest) -> Result<TradeResponse> {
        let action: TradeAction = request.action.parse()?;
        let order_type: OrderType = request.order_type.parse()?;
        let trade = self.execute_trade(
            &request.ticker,
            action,
            request.qty,
            request.price,
            order_type,
        )?;
        Ok(TradeResponse::success(trade))
    }

    /// Snapshot the account.
    ///
    /// Prunes trade history older than the retention window first, so the
    /// pruning is permanent, not just hidden from this snapshot.
    pub fn state(&mut self) -> AccountState {
        let dropped = retain_recent(
            &mut self.trades,
            self.clock.now(),
            self.config.retention_window(),
        );
        if dropped > 0 {
            tracing::debug!("Pruned {} trades past retention", dropped);
        }

        let total_pnl = self.total_pnl();
        AccountState {
            virtual_capital: self.config.virtual_capital,
            current_balance: self.config.virtual_capital + total_pnl,
            total_pnl,
            win_rate: self.win_rate,
            profit_factor: self.profit_factor,
            active_positions: self.positions.clone(),
            trade_history: self.trades.clone(),
        }
    }

    /// Append previously recorded trades after the current history.
    ///
    /// Retention applies to them on the next read like any other record.
    pub fn import_history(&mut self, records: impl IntoIterator<Item = TradeRecord>) {
        let before = self.trades.len();
        self.trades.extend(records);
        tracing::debug!("Imported {} trade records", self.trades.len() - before);
    }

    /// Place a position as-is, replacing any open one for the same instrument.
    pub(super) fn restore_position(&mut self, position: Position) {
        match self.find_index(&position.instrument) {
            Some(idx) => self.positions[idx] = position,
            None => self.positions.push(position),
        }
    }

    pub(super) fn set_stats(&mut self, win_rate: f64, profit_factor: f64) {
        self.win_rate = win_rate.clamp(self.config.win_rate_min, self.config.win_rate_max);
        self.profit_factor = profit_factor.clamp(
            self.config.profit_factor_min,
            self.config.profit_factor_max,
        );
    }

    fn find_index(&self, instrument: &str) -> Option<usize> {
        self.positions.iter().position(|p| p.instrument == instrument)
    }

    /// Drift every open position's price and recompute its P&L.
    fn revalue(&mut self) {
        let max_drift = self.config.drift_fraction();
        for idx in 0..self.positions.len() {
            let drift = self.draw(max_drift);
            let pos = &mut self.positions[idx];
            let price = round_to(pos.last_price * (1.0 + drift), 2);
            *pos = pos.with_price(price);
        }
    }

    /// One random-walk step for the cosmetic stats. Not derived from fills.
    fn step_stats(&mut self) {
        let win_step = self.draw(self.config.win_rate_step);
        let pf_step = self.draw(self.config.profit_factor_step);

        self.win_rate = round_to(self.win_rate + win_step, 1)
            .clamp(self.config.win_rate_min, self.config.win_rate_max);
        self.profit_factor = round_to(self.profit_factor + pf_step, 2)
            .clamp(self.config.profit_factor_min, self.config.profit_factor_max);
    }

    /// Sample from `[-max, max]`, clamped whatever the source returns.
    fn draw(&mut self, max: f64) -> f64 {
        if !max.is_finite() || max <= 0.0 {
            return 0.0;
        }
        let value = self.noise.sample(-max, max);
        if value.is_finite() {
            value.clamp(-max, max)
        } else {
            0.0
        }
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{FixedNoise, ManualClock, ScriptedNoise};
    use approx::assert_relative_eq;
    use chrono::{TimeZone, Utc};

    fn quiet_ledger() -> LedgerEngine {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2026, 10, 19, 9, 15, 0).unwrap());
        LedgerEngine::with_sources(LedgerConfig::default(), FixedNoise::neutral(), clock)
    }

    #[test]
    fn test_buy_opens_position() {
        let mut ledger = quiet_ledger();

        let trade = ledger
            .execute_trade("reliance", TradeAction::Buy, 10, 2450.0, OrderType::Market)
            .unwrap();

        assert_eq!(trade.instrument, "RELIANCE");
        assert!(trade.id.starts_with("TRD-"));
        assert_eq!(ledger.positions().len(), 1);
        let pos = ledger.position("RELIANCE").unwrap();
        assert_eq!(pos.quantity, 10);
        assert_eq!(pos.average_cost, 2450.0);
        assert_eq!(pos.last_price, 2450.0);
        assert_eq!(pos.unrealized_pnl, 0.0);
    }

    #[test]
    fn test_cost_averaging() {
        let mut ledger = quiet_ledger();

        ledger
            .execute_trade("X", TradeAction::Buy, 50, 100.0, OrderType::Market)
            .unwrap();
        ledger
            .execute_trade("X", TradeAction::Buy, 50, 120.0, OrderType::Market)
            .unwrap();

        let pos = ledger.position("X").unwrap();
        assert_eq!(pos.quantity, 100);
        assert_relative_eq!(pos.average_cost, 110.0);
    }

    #[test]
    fn test_partial_sell_keeps_cost_basis() {
        let mut ledger = quiet_ledger();

        ledger
            .execute_trade("X", TradeAction::Buy, 100, 100.0, OrderType::Market)
            .unwrap();
        ledger
            .execute_trade("X", TradeAction::Sell, 40, 130.0, OrderType::Limit)
            .unwrap();

        let pos = ledger.position("X").unwrap();
        assert_eq!(pos.quantity, 60);
        assert_eq!(pos.average_cost, 100.0);
    }

    #[test]
    fn test_sell_removes_position() {
        let mut ledger = quiet_ledger();

        ledger
            .execute_trade("X", TradeAction::Buy, 100, 100.0, OrderType::Market)
            .unwrap();
        ledger
            .execute_trade("X", TradeAction::Sell, 100, 90.0, OrderType::Market)
            .unwrap();

        assert!(ledger.position("X").is_none());
        assert!(ledger.positions().is_empty());
    }

    #[test]
    fn test_oversell_closes_without_short() {
        let mut ledger = quiet_ledger();

        ledger
            .execute_trade("X", TradeAction::Buy, 10, 100.0, OrderType::Market)
            .unwrap();
        ledger
            .execute_trade("X", TradeAction::Sell, 25, 100.0, OrderType::Market)
            .unwrap();

        assert!(ledger.positions().is_empty());
    }

    #[test]
    fn test_sell_without_position_is_recorded() {
        let mut ledger = quiet_ledger();

        let trade = ledger
            .execute_trade("TCS", TradeAction::Sell, 5, 3980.0, OrderType::Market)
            .unwrap();

        assert!(ledger.positions().is_empty());
        assert_eq!(ledger.trade_history().len(), 1);
        assert_eq!(ledger.trade_history()[0], trade);
    }

    #[test]
    fn test_history_is_most_recent_first() {
        let mut ledger = quiet_ledger();

        let first = ledger
            .execute_trade("A", TradeAction::Buy, 1, 10.0, OrderType::Market)
            .unwrap();
        let second = ledger
            .execute_trade("B", TradeAction::Buy, 1, 20.0, OrderType::Market)
            .unwrap();

        let ids: Vec<_> = ledger.trade_history().iter().map(|t| t.id.clone()).collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[test]
    fn test_rejects_invalid_input_without_mutation() {
        let mut ledger = quiet_ledger();

        assert!(matches!(
            ledger.execute_trade("X", TradeAction::Buy, 0, 100.0, OrderType::Market),
            Err(Error::InvalidQuantity(0))
        ));
        assert!(matches!(
            ledger.execute_trade("X", TradeAction::Buy, -3, 100.0, OrderType::Market),
            Err(Error::InvalidQuantity(-3))
        ));
        assert!(matches!(
            ledger.execute_trade("X", TradeAction::Buy, 1, 0.0, OrderType::Market),
            Err(Error::InvalidPrice(_))
        ));
        assert!(matches!(
            ledger.execute_trade("X", TradeAction::Buy, 1, f64::NAN, OrderType::Market),
            Err(Error::InvalidPrice(_))
        ));
        assert!(matches!(
            ledger.execute_trade("  ", TradeAction::Buy, 1, 10.0, OrderType::Market),
            Err(Error::InvalidInstrument(_))
        ));

        assert!(ledger.trade_history().is_empty());
        assert!(ledger.positions().is_empty());
        assert_eq!(ledger.win_rate(), 64.0);
    }

    #[test]
    fn test_buy_quantity_overflow_is_rejected() {
        let mut ledger = quiet_ledger();

        for _ in 0..2 {
            ledger
                .execute_trade("X", TradeAction::Buy, i64::MAX, 1.0, OrderType::Market)
                .unwrap();
        }
        let held = ledger.position("X").unwrap().clone();
        assert_eq!(held.quantity, 2 * i64::MAX as u64);
        let win_rate = ledger.win_rate();

        let result =
            ledger.execute_trade("X", TradeAction::Buy, i64::MAX, 1.0, OrderType::Market);

        assert!(matches!(result, Err(Error::InvalidQuantity(i64::MAX))));
        assert_eq!(ledger.trade_history().len(), 2);
        assert_eq!(ledger.position("X").unwrap(), &held);
        assert_eq!(ledger.win_rate(), win_rate);

        // The book near u64::MAX can still be sold down.
        ledger
            .execute_trade("X", TradeAction::Sell, i64::MAX, 1.0, OrderType::Market)
            .unwrap();
        assert_eq!(ledger.position("X").unwrap().quantity, i64::MAX as u64);
    }

    #[test]
    fn test_non_finite_steps_do_not_move_stats() {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2026, 10, 19, 9, 15, 0).unwrap());
        let config = LedgerConfig {
            win_rate_step: f64::INFINITY,
            profit_factor_step: f64::NAN,
            ..LedgerConfig::default()
        };
        let mut ledger = LedgerEngine::with_sources(config, RandomNoise::seeded(3), clock);

        ledger
            .execute_trade("X", TradeAction::Buy, 1, 10.0, OrderType::Market)
            .unwrap();

        assert_eq!(ledger.win_rate(), 64.0);
        assert_eq!(ledger.profit_factor(), 1.8);
    }

    #[test]
    fn test_execute_request_rejects_unknown_action() {
        let mut ledger = quiet_ledger();
        let request = TradeRequest {
            ticker: "ITC".to_string(),
            action: "HOLD".to_string(),
            qty: 10,
            price: 420.0,
            order_type: "MARKET".to_string(),
        };

        assert!(matches!(
            ledger.execute_request(&request),
            Err(Error::InvalidAction(_))
        ));
        assert!(ledger.trade_history().is_empty());
    }

    #[test]
    fn test_execute_request_success() {
        let mut ledger = quiet_ledger();
        let request = TradeRequest {
            ticker: "ITC".to_string(),
            action: "BUY".to_string(),
            qty: 10,
            price: 420.0,
            order_type: "LIMIT".to_string(),
        };

        let response = ledger.execute_request(&request).unwrap();
        assert_eq!(response.status, "SUCCESS");
        assert_eq!(response.trade.order_type, OrderType::Limit);
        assert_eq!(ledger.positions().len(), 1);
    }

    #[test]
    fn test_revaluation_applies_drift_to_every_position() {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2026, 10, 19, 9, 15, 0).unwrap());
        // trade 1: A drift, win step, pf step
        // trade 2: A drift, B drift, win step, pf step
        let noise = ScriptedNoise::new([0.0, 0.0, 0.0, 0.01, -0.01, 1.0, 0.05]);
        let mut ledger = LedgerEngine::with_sources(LedgerConfig::default(), noise, clock);

        ledger
            .execute_trade("A", TradeAction::Buy, 10, 100.0, OrderType::Market)
            .unwrap();
        ledger
            .execute_trade("B", TradeAction::Buy, 4, 50.0, OrderType::Market)
            .unwrap();

        let a = ledger.position("A").unwrap();
        assert_eq!(a.last_price, 101.0);
        assert_relative_eq!(a.current_value, 1010.0);
        assert_relative_eq!(a.unrealized_pnl, 10.0);
        assert_relative_eq!(a.net_change_percent, 1.0);

        let b = ledger.position("B").unwrap();
        assert_eq!(b.last_price, 49.5);
        assert_relative_eq!(b.unrealized_pnl, -2.0);

        assert_relative_eq!(ledger.total_pnl(), 8.0);
        assert_relative_eq!(ledger.current_balance(), 100_008.0);
        assert_relative_eq!(ledger.win_rate(), 65.0);
        assert_relative_eq!(ledger.profit_factor(), 1.85);
    }

    #[test]
    fn test_stats_stay_clamped() {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2026, 10, 19, 9, 15, 0).unwrap());
        let mut ledger =
            LedgerEngine::with_sources(LedgerConfig::default(), FixedNoise::max(), clock);

        for _ in 0..100 {
            ledger
                .execute_trade("X", TradeAction::Sell, 1, 10.0, OrderType::Market)
                .unwrap();
        }
        assert_eq!(ledger.win_rate(), 90.0);
        assert_eq!(ledger.profit_factor(), 5.0);
    }

    #[test]
    fn test_state_reports_aggregates() {
        let mut ledger = quiet_ledger();
        ledger
            .execute_trade("X", TradeAction::Buy, 10, 100.0, OrderType::Market)
            .unwrap();

        let state = ledger.state();
        assert_eq!(state.virtual_capital, 100_000.0);
        assert_eq!(state.total_pnl, 0.0);
        assert_eq!(state.current_balance, 100_000.0);
        assert_eq!(state.position_count(), 1);
        assert_eq!(state.trade_history.len(), 1);
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(2468.004, 2), 2468.0);
        assert_eq!(round_to(64.26, 1), 64.3);
    }
}
