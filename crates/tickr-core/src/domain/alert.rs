use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::{Symbol, UtcDateTime};

/// Which threshold a price crossed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    High,
    Low,
}

impl AlertKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Low => "low",
        }
    }
}

impl Display for AlertKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A threshold crossing. Emitted once, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertEvent {
    pub symbol: Symbol,
    pub triggered_price: f64,
    pub threshold_value: f64,
    pub kind: AlertKind,
    pub triggered_at: UtcDateTime,
}

impl AlertEvent {
    pub fn new(symbol: Symbol, kind: AlertKind, triggered_price: f64, threshold_value: f64) -> Self {
        Self {
            symbol,
            triggered_price,
            threshold_value,
            kind,
            triggered_at: UtcDateTime::now(),
        }
    }
}

impl Display for AlertEvent {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} just reached ${:.2} and triggered your price target of ${}",
            self.symbol, self.triggered_price, self.threshold_value
        )
    }
}
