//! Core domain types and logic.

pub mod error;
pub mod ohlcv;
pub mod series;
pub mod returns;
pub mod instrument;
pub mod options;
pub mod rolling;
pub mod metrics;
pub mod classification;
pub mod insight;
pub mod generator;
pub mod generators;
pub mod registry;
pub mod manager;
pub mod pipeline;
