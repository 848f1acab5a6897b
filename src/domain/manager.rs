//! Runs an ordered set of insight generators against one derivative.

use crate::domain::error::InsightError;
use crate::domain::generator::InsightGenerator;
use crate::domain::insight::InsightMap;
use crate::domain::instrument::Instrument;
use std::sync::Arc;
use std::time::Instant;

pub struct InsightManager {
    derivative: Arc<Instrument>,
    generators: Vec<Box<dyn InsightGenerator>>,
}

impl InsightManager {
    pub fn new(derivative: impl Into<Arc<Instrument>>) -> Self {
        Self {
            derivative: derivative.into(),
            generators: Vec::new(),
        }
    }

    /// Appends a generator. Names need not be unique.
    pub fn add(&mut self, generator: Box<dyn InsightGenerator>) -> &mut Self {
        self.generators.push(generator);
        self
    }

    /// Produces every insight in insertion order.
    ///
    /// A later generator with the same name replaces the earlier artifact.
    /// The first failure stops the run.
    pub fn run(&self, display: bool) -> Result<InsightMap, InsightError> {
        let mut results = InsightMap::new();
        for generator in &self.generators {
            let started = Instant::now();
            let insight = generator
                .produce(self.derivative.as_ref(), display)
                .map_err(|source| {
                    tracing::error!(insight = generator.name(), error = %source, "insight failed");
                    InsightError::Generator {
                        name: generator.name().to_string(),
                        source: Box::new(source),
                    }
                })?;
            tracing::info!(
                insight = generator.name(),
                kind = generator.kind(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "insight produced"
            );
            if results.insert(generator.name().to_string(), insight).is_some() {
                tracing::warn!(insight = generator.name(), "duplicate insight name, keeping latest");
            }
        }
        Ok(results)
    }

    pub fn len(&self) -> usize {
        self.generators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.generators.is_empty()
    }

    pub fn generator_names(&self) -> Vec<&str> {
        self.generators.iter().map(|g| g.name()).collect()
    }

    pub fn derivative(&self) -> &Instrument {
        &self.derivative
    }
}
