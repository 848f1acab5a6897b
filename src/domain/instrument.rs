//! Instruments: leaf assets, composite derivatives and the shared environment.
//!
//! Generators read instruments through [`DerivativeView`]. `Instrument` is the
//! tagged union stored in the [`AssetStore`] and used for baselines.

use crate::domain::error::InsightError;
use crate::domain::ohlcv::OhlcBar;
use crate::domain::returns::ReturnsTable;
use crate::domain::series::TimeSeries;
use std::collections::BTreeMap;
use std::sync::Arc;

pub type Weights = BTreeMap<String, TimeSeries>;

static NO_WEIGHTS: Weights = BTreeMap::new();

/// Read-only capability set consumed by insight generators.
pub trait DerivativeView {
    fn name(&self) -> &str;
    fn values(&self) -> &[OhlcBar];
    fn returns(&self) -> &ReturnsTable;
    /// Underlyings in declaration order. Empty for a leaf asset.
    fn assets(&self) -> &[Arc<Instrument>];
    /// Underlying name to weight series. Empty for a leaf asset.
    fn weights(&self) -> &Weights;
    fn env(&self) -> Option<&Environment>;
}

/// Price and return history as loaded from a data source.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PriceHistory {
    pub values: Vec<OhlcBar>,
    pub returns: ReturnsTable,
}

#[derive(Debug, Clone)]
pub struct Asset {
    pub name: String,
    pub values: Vec<OhlcBar>,
    pub returns: ReturnsTable,
}

impl Asset {
    pub fn new(name: impl Into<String>, history: PriceHistory) -> Self {
        Self {
            name: name.into(),
            values: history.values,
            returns: history.returns,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Derivative {
    pub name: String,
    pub values: Vec<OhlcBar>,
    pub returns: ReturnsTable,
    pub assets: Vec<Arc<Instrument>>,
    pub weights: Weights,
    pub env: Arc<Environment>,
}

impl Derivative {
    pub fn new(name: impl Into<String>, history: PriceHistory, env: Arc<Environment>) -> Self {
        Self {
            name: name.into(),
            values: history.values,
            returns: history.returns,
            assets: Vec::new(),
            weights: Weights::new(),
            env,
        }
    }

    /// Adds an underlying found in the environment with its weight series.
    pub fn with_underlying(
        mut self,
        name: &str,
        weights: TimeSeries,
    ) -> Result<Self, InsightError> {
        weights.ensure_sorted()?;
        let asset = self.env.find_asset(name)?;
        self.assets.push(asset);
        self.weights.insert(name.to_string(), weights.renamed(name));
        Ok(self)
    }
}

#[derive(Debug, Clone)]
pub enum Instrument {
    Asset(Asset),
    Derivative(Derivative),
}

impl From<Asset> for Instrument {
    fn from(asset: Asset) -> Self {
        Instrument::Asset(asset)
    }
}

impl From<Derivative> for Instrument {
    fn from(derivative: Derivative) -> Self {
        Instrument::Derivative(derivative)
    }
}

impl DerivativeView for Asset {
    fn name(&self) -> &str {
        &self.name
    }
    fn values(&self) -> &[OhlcBar] {
        &self.values
    }
    fn returns(&self) -> &ReturnsTable {
        &self.returns
    }
    fn assets(&self) -> &[Arc<Instrument>] {
        &[]
    }
    fn weights(&self) -> &Weights {
        &NO_WEIGHTS
    }
    fn env(&self) -> Option<&Environment> {
        None
    }
}

impl DerivativeView for Derivative {
    fn name(&self) -> &str {
        &self.name
    }
    fn values(&self) -> &[OhlcBar] {
        &self.values
    }
    fn returns(&self) -> &ReturnsTable {
        &self.returns
    }
    fn assets(&self) -> &[Arc<Instrument>] {
        &self.assets
    }
    fn weights(&self) -> &Weights {
        &self.weights
    }
    fn env(&self) -> Option<&Environment> {
        Some(&self.env)
    }
}

impl Instrument {
    fn view(&self) -> &dyn DerivativeView {
        match self {
            Instrument::Asset(a) => a as &dyn DerivativeView,
            Instrument::Derivative(d) => d as &dyn DerivativeView,
        }
    }
}

impl DerivativeView for Instrument {
    fn name(&self) -> &str {
        self.view().name()
    }
    fn values(&self) -> &[OhlcBar] {
        self.view().values()
    }
    fn returns(&self) -> &ReturnsTable {
        self.view().returns()
    }
    fn assets(&self) -> &[Arc<Instrument>] {
        self.view().assets()
    }
    fn weights(&self) -> &Weights {
        self.view().weights()
    }
    fn env(&self) -> Option<&Environment> {
        self.view().env()
    }
}

#[derive(Debug, Clone, Default)]
pub struct AssetStore {
    assets: BTreeMap<String, Arc<Instrument>>,
}

impl AssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, instrument: impl Into<Arc<Instrument>>) {
        let instrument = instrument.into();
        self.assets.insert(instrument.name().to_string(), instrument);
    }

    pub fn get(&self, name: &str) -> Option<&Arc<Instrument>> {
        self.assets.get(name)
    }

    /// Instruments in name order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Instrument>> {
        self.assets.values()
    }

    pub fn names(&self) -> Vec<&str> {
        self.assets.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Environment {
    store: AssetStore,
}

impl Environment {
    pub fn new(store: AssetStore) -> Self {
        Self { store }
    }

    pub fn find_asset(&self, name: &str) -> Result<Arc<Instrument>, InsightError> {
        self.store
            .get(name)
            .cloned()
            .ok_or_else(|| InsightError::UnknownAsset {
                name: name.to_string(),
            })
    }

    pub fn asset_store(&self) -> &AssetStore {
        &self.store
    }
}
