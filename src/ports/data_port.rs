//! Price and return history access port trait.

use crate::domain::error::InsightError;
use crate::domain::instrument::PriceHistory;

pub trait DataPort {
    /// Bars and session returns of one instrument, sorted by date.
    fn load(&self, name: &str) -> Result<PriceHistory, InsightError>;

    /// Every instrument the source can load, sorted by name.
    fn list_instruments(&self) -> Result<Vec<String>, InsightError>;
}
