//! Shared, lock-serialized access to one ledger.

use super::engine::LedgerEngine;
use crate::types::{
    AccountState, OrderType, TradeAction, TradeRecord, TradeRequest, TradeResponse,
};
use crate::{Error, Result};
use std::sync::{Arc, Mutex, MutexGuard};

/// Cloneable handle for request handlers.
///
/// A trade is a read-modify-write over the whole position set, so every
/// operation runs under one mutex; two trades on the same instrument can
/// never interleave.
#[derive(Debug, Clone)]
pub struct LedgerHandle {
    inner: Arc<Mutex<LedgerEngine>>,
}

impl LedgerHandle {
    pub fn new(engine: LedgerEngine) -> Self {
        Self {
            inner: Arc::new(Mutex::new(engine)),
        }
    }

    pub fn execute_trade(
        &self,
        instrument: &str,
        action: TradeAction,
        quantity: i64,
        price: f64,
        order_type: OrderType,
    ) -> Result<TradeRecord> {
        self.lock()?
            .execute_trade(instrument, action, quantity, price, order_type)
    }

    pub fn execute_request(&self, request: &TradeRequest) -> Result<TradeResponse> {
        self.lock()?.execute_request(request)
    }

    pub fn state(&self) -> Result<AccountState> {
        Ok(self.lock()?.state())
    }

    /// Run `f` with exclusive access to the engine.
    pub fn with_engine<T>(&self, f: impl FnOnce(&mut LedgerEngine) -> T) -> Result<T> {
        Ok(f(&mut *self.lock()?))
    }

    fn lock(&self) -> Result<MutexGuard<'_, LedgerEngine>> {
        self.inner.lock().map_err(|_| Error::LockPoisoned)
    }
}

impl From<LedgerEngine> for LedgerHandle {
    fn from(engine: LedgerEngine) -> Self {
        Self::new(engine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{FixedNoise, SystemClock};
    use crate::LedgerConfig;
    use std::thread;

    #[test]
    fn test_concurrent_buys_are_serialized() {
        let handle = LedgerHandle::new(LedgerEngine::with_sources(
            LedgerConfig::default(),
            FixedNoise::neutral(),
            SystemClock,
        ));

        let workers: Vec<_> = (0..8)
            .map(|_| {
                let handle = handle.clone();
                thread::spawn(move || {
                    for _ in 0..25 {
                        handle
                            .execute_trade("SBIN", TradeAction::Buy, 2, 750.0, OrderType::Market)
                            .unwrap();
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        let state = handle.state().unwrap();
        assert_eq!(state.trade_history.len(), 200);
        assert_eq!(state.position("SBIN").unwrap().quantity, 400);
    }

    #[test]
    fn test_with_engine() {
        let handle: LedgerHandle = LedgerEngine::new(LedgerConfig::default()).into();
        let count = handle.with_engine(|engine| engine.positions().len()).unwrap();
        assert_eq!(count, 0);
    }
}
