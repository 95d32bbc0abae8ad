use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::order::OrderSide;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionSide {
    Flat,
    Long,
    Short,
}

impl PositionSide {
    /// Order side that opens exposure in this direction.
    pub fn entry_order(self) -> Option<OrderSide> {
        match self {
            PositionSide::Long => Some(OrderSide::Buy),
            PositionSide::Short => Some(OrderSide::Sell),
            PositionSide::Flat => None,
        }
    }

    /// Order side that liquidates exposure in this direction.
    pub fn exit_order(self) -> Option<OrderSide> {
        match self {
            PositionSide::Long => Some(OrderSide::Sell),
            PositionSide::Short => Some(OrderSide::Buy),
            PositionSide::Flat => None,
        }
    }

    /// Gauge encoding: -1 short, 0 flat, 1 long.
    pub fn as_gauge(self) -> f64 {
        match self {
            PositionSide::Flat => 0.0,
            PositionSide::Long => 1.0,
            PositionSide::Short => -1.0,
        }
    }
}

impl fmt::Display for PositionSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PositionSide::Flat => "flat",
            PositionSide::Long => "long",
            PositionSide::Short => "short",
        })
    }
}

/// The single position tracked for a symbol. `entry_price` and `quantity`
/// are zero while flat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    pub side: PositionSide,
    pub entry_price: f64,
    pub quantity: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opened_at: Option<DateTime<Utc>>,
}

impl Position {
    pub fn flat(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            side: PositionSide::Flat,
            entry_price: 0.0,
            quantity: 0.0,
            opened_at: None,
        }
    }

    pub fn open(
        symbol: impl Into<String>,
        side: PositionSide,
        entry_price: f64,
        quantity: f64,
        opened_at: DateTime<Utc>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            entry_price,
            quantity,
            opened_at: Some(opened_at),
        }
    }

    pub fn is_flat(&self) -> bool {
        self.side == PositionSide::Flat
    }

    /// Percentage move in the position's favour. `None` while flat.
    pub fn price_diff_pct(&self, current_price: f64) -> Option<f64> {
        if self.is_flat() || self.entry_price <= 0.0 {
            return None;
        }
        let raw = (current_price - self.entry_price) * 100.0 / self.entry_price;
        match self.side {
            PositionSide::Long => Some(raw),
            PositionSide::Short => Some(-raw),
            PositionSide::Flat => None,
        }
    }

    pub fn clear(&mut self) {
        self.side = PositionSide::Flat;
        self.entry_price = 0.0;
        self.quantity = 0.0;
        self.opened_at = None;
    }
}
