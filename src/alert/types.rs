//! Alert types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::bars::Timeframe;
use crate::detector::{Fvg, GapDirection, Ifvg};

/// Kind of detected signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalKind {
    /// Fair Value Gap
    Fvg,
    /// Inversion Fair Value Gap
    Ifvg,
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalKind::Fvg => f.write_str("FVG"),
            SignalKind::Ifvg => f.write_str("iFVG"),
        }
    }
}

/// A newly detected signal forwarded to the notifier
///
/// Built by the aggregator for signals that did not exist in the previous
/// scan cycle; the notifier receives each one at most once per cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSignalEvent {
    /// Unique event identifier
    pub id: Uuid,
    pub symbol: String,
    pub timeframe: Timeframe,
    pub kind: SignalKind,
    pub direction: GapDirection,
    /// Gap percentage for FVGs, fill percentage for iFVGs
    pub magnitude: Decimal,
    /// Detection price for FVGs, fill price for iFVGs
    pub price: Decimal,
    /// Timestamp of the underlying pattern bar
    pub timestamp: DateTime<Utc>,
}

impl NewSignalEvent {
    /// Build an event from a newly appeared gap
    pub fn from_fvg(symbol: &str, timeframe: Timeframe, fvg: &Fvg) -> Self {
        Self {
            id: Uuid::new_v4(),
            symbol: symbol.to_string(),
            timeframe,
            kind: SignalKind::Fvg,
            direction: fvg.direction,
            magnitude: fvg.gap_percentage,
            price: fvg.price_at_detection,
            timestamp: fvg.timestamp,
        }
    }

    /// Build an event from a newly appeared inversion
    pub fn from_ifvg(symbol: &str, timeframe: Timeframe, ifvg: &Ifvg) -> Self {
        Self {
            id: Uuid::new_v4(),
            symbol: symbol.to_string(),
            timeframe,
            kind: SignalKind::Ifvg,
            direction: ifvg.direction,
            magnitude: ifvg.fill_percentage,
            price: ifvg.fill_price,
            timestamp: ifvg.timestamp,
        }
    }
}
