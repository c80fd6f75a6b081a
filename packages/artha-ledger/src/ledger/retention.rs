//! Trailing-window filter for trade history.

use crate::types::TradeRecord;
use chrono::{DateTime, Duration, Utc};

/// Drop records executed before `now - window`, keeping order.
///
/// Records without an execution time are kept, as is everything when the
/// window reaches past the earliest representable instant. Returns how many
/// were dropped.
pub fn retain_recent(
    history: &mut Vec<TradeRecord>,
    now: DateTime<Utc>,
    window: Duration,
) -> usize {
    let Some(cutoff) = now.checked_sub_signed(window) else {
        return 0;
    };
    let before = history.len();
    history.retain(|trade| match trade.created_at {
        Some(executed_at) => executed_at >= cutoff,
        None => true,
    });
    before - history.len()
}
