//! OHLC bar representation.

use chrono::NaiveDate;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq)]
pub struct OhlcBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

/// Which field of a bar a price-based insight reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PricePoint {
    Open,
    High,
    Low,
    Close,
}

impl OhlcBar {
    pub fn price(&self, point: PricePoint) -> f64 {
        match point {
            PricePoint::Open => self.open,
            PricePoint::High => self.high,
            PricePoint::Low => self.low,
            PricePoint::Close => self.close,
        }
    }

    /// (high + low + close) / 3
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }
}

impl FromStr for PricePoint {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "open" => Ok(PricePoint::Open),
            "high" => Ok(PricePoint::High),
            "low" => Ok(PricePoint::Low),
            "close" => Ok(PricePoint::Close),
            other => Err(format!("unknown price point `{other}`")),
        }
    }
}

impl fmt::Display for PricePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PricePoint::Open => write!(f, "Open"),
            PricePoint::High => write!(f, "High"),
            PricePoint::Low => write!(f, "Low"),
            PricePoint::Close => write!(f, "Close"),
        }
    }
}
