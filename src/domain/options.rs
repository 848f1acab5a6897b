//! Generator options: values, default resolution and typed access.
//!
//! Every generator kind declares a fresh default map. Caller overrides are
//! merged over it with [`resolve_options`], which returns a new map and
//! rejects keys the kind does not declare. Generators then read the merged
//! map through an [`OptionReader`] once, at construction.

use crate::domain::error::InsightError;
use crate::domain::instrument::{DerivativeView, Instrument};
use crate::domain::series::TimeSeries;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

pub type Options = BTreeMap<String, OptionValue>;

#[derive(Debug, Clone)]
pub enum OptionValue {
    /// Declared but unset.
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<String>),
    Series(TimeSeries),
    Instrument(Arc<Instrument>),
    Map(Options),
}

impl PartialEq for OptionValue {
    fn eq(&self, other: &Self) -> bool {
        use OptionValue::*;
        match (self, other) {
            (Null, Null) => true,
            (Bool(a), Bool(b)) => a == b,
            (Int(a), Int(b)) => a == b,
            (Float(a), Float(b)) => a == b,
            (Text(a), Text(b)) => a == b,
            (List(a), List(b)) => a == b,
            (Series(a), Series(b)) => a == b,
            (Instrument(a), Instrument(b)) => Arc::ptr_eq(a, b),
            (Map(a), Map(b)) => a == b,
            _ => false,
        }
    }
}

impl OptionValue {
    fn type_name(&self) -> &'static str {
        match self {
            OptionValue::Null => "null",
            OptionValue::Bool(_) => "bool",
            OptionValue::Int(_) => "integer",
            OptionValue::Float(_) => "number",
            OptionValue::Text(_) => "text",
            OptionValue::List(_) => "list",
            OptionValue::Series(_) => "series",
            OptionValue::Instrument(_) => "instrument",
            OptionValue::Map(_) => "map",
        }
    }

    /// Parses raw config text using `template` (the declared default) for the type.
    pub fn parse_like(template: &OptionValue, raw: &str) -> Result<OptionValue, String> {
        let raw = raw.trim();
        match template {
            OptionValue::Bool(_) => parse_bool(raw)
                .map(OptionValue::Bool)
                .ok_or_else(|| format!("expected true/false, got `{raw}`")),
            OptionValue::Int(_) => raw
                .parse::<i64>()
                .map(OptionValue::Int)
                .map_err(|_| format!("expected an integer, got `{raw}`")),
            OptionValue::Float(_) => raw
                .parse::<f64>()
                .map(OptionValue::Float)
                .map_err(|_| format!("expected a number, got `{raw}`")),
            OptionValue::List(_) => Ok(OptionValue::List(
                raw.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            )),
            OptionValue::Null | OptionValue::Text(_) => Ok(OptionValue::Text(raw.to_string())),
            OptionValue::Series(_) | OptionValue::Instrument(_) | OptionValue::Map(_) => Err(
                format!("a {} option cannot be set from text", template.type_name()),
            ),
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "true" | "yes" | "1" => Some(true),
        "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Null => write!(f, "none"),
            OptionValue::Bool(b) => write!(f, "{b}"),
            OptionValue::Int(i) => write!(f, "{i}"),
            OptionValue::Float(x) => write!(f, "{x}"),
            OptionValue::Text(s) => write!(f, "{s}"),
            OptionValue::List(items) => write!(f, "[{}]", items.join(", ")),
            OptionValue::Series(s) => write!(f, "<series {} ({} periods)>", s.name, s.len()),
            OptionValue::Instrument(i) => write!(f, "<instrument {}>", i.name()),
            OptionValue::Map(m) => {
                let parts: Vec<String> = m.iter().map(|(k, v)| format!("{k}={v}")).collect();
                write!(f, "{{{}}}", parts.join(", "))
            }
        }
    }
}

/// Merges `overrides` over `defaults` and returns the merged map.
///
/// Nested maps merge key by key. Keys absent from `defaults` are rejected.
pub fn resolve_options(
    generator: &str,
    defaults: Options,
    overrides: &Options,
) -> Result<Options, InsightError> {
    merge(generator, "", defaults, overrides)
}

fn merge(
    generator: &str,
    prefix: &str,
    mut merged: Options,
    overrides: &Options,
) -> Result<Options, InsightError> {
    for (key, value) in overrides {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        let resolved = match (merged.remove(key), value) {
            (None, _) => {
                return Err(InsightError::configuration(
                    generator,
                    path,
                    "is not a recognised option",
                ));
            }
            (Some(OptionValue::Map(nested)), OptionValue::Map(nested_overrides)) => {
                OptionValue::Map(merge(generator, &path, nested, nested_overrides)?)
            }
            (Some(OptionValue::Map(_)), other) => {
                return Err(InsightError::configuration(
                    generator,
                    path,
                    format!("expects a map, got {}", other.type_name()),
                ));
            }
            (Some(_), other) => other.clone(),
        };
        merged.insert(key.clone(), resolved);
    }
    Ok(merged)
}

/// Typed, error-reporting access to a resolved option map.
pub struct OptionReader<'a> {
    generator: &'a str,
    prefix: String,
    options: &'a Options,
}

impl<'a> OptionReader<'a> {
    pub fn new(generator: &'a str, options: &'a Options) -> Self {
        Self {
            generator,
            prefix: String::new(),
            options,
        }
    }

    fn path(&self, key: &str) -> String {
        if self.prefix.is_empty() {
            key.to_string()
        } else {
            format!("{}.{}", self.prefix, key)
        }
    }

    fn err(&self, key: &str, reason: impl Into<String>) -> InsightError {
        InsightError::configuration(self.generator, self.path(key), reason)
    }

    fn get(&self, key: &str) -> Result<&'a OptionValue, InsightError> {
        self.options
            .get(key)
            .ok_or_else(|| self.err(key, "has no declared default"))
    }

    fn mismatch(&self, key: &str, expected: &str, got: &OptionValue) -> InsightError {
        self.err(key, format!("expects {expected}, got {}", got.type_name()))
    }

    pub fn is_set(&self, key: &str) -> bool {
        !matches!(self.options.get(key), None | Some(OptionValue::Null))
    }

    pub fn bool(&self, key: &str) -> Result<bool, InsightError> {
        match self.get(key)? {
            OptionValue::Bool(b) => Ok(*b),
            other => Err(self.mismatch(key, "a bool", other)),
        }
    }

    pub fn float(&self, key: &str) -> Result<f64, InsightError> {
        match self.get(key)? {
            OptionValue::Float(x) => Ok(*x),
            OptionValue::Int(i) => Ok(*i as f64),
            other => Err(self.mismatch(key, "a number", other)),
        }
    }

    /// A positive count, such as a window length.
    pub fn count(&self, key: &str) -> Result<usize, InsightError> {
        match self.opt_count(key)? {
            Some(n) => Ok(n),
            None => Err(self.err(key, "is required")),
        }
    }

    /// Like [`count`](Self::count) but `Null` reads as `None`.
    pub fn opt_count(&self, key: &str) -> Result<Option<usize>, InsightError> {
        match self.get(key)? {
            OptionValue::Null => Ok(None),
            OptionValue::Int(i) if *i > 0 => Ok(Some(*i as usize)),
            OptionValue::Int(i) => Err(self.err(key, format!("must be positive, got {i}"))),
            other => Err(self.mismatch(key, "an integer", other)),
        }
    }

    /// A non-negative integer; `Null` reads as `None`.
    pub fn opt_offset(&self, key: &str) -> Result<Option<usize>, InsightError> {
        match self.get(key)? {
            OptionValue::Null => Ok(None),
            OptionValue::Int(i) if *i >= 0 => Ok(Some(*i as usize)),
            OptionValue::Int(i) => Err(self.err(key, format!("must not be negative, got {i}"))),
            other => Err(self.mismatch(key, "an integer", other)),
        }
    }

    pub fn text(&self, key: &str) -> Result<Option<&'a str>, InsightError> {
        match self.get(key)? {
            OptionValue::Null => Ok(None),
            OptionValue::Text(s) => Ok(Some(s.as_str())),
            other => Err(self.mismatch(key, "text", other)),
        }
    }

    pub fn list(&self, key: &str) -> Result<Vec<String>, InsightError> {
        match self.get(key)? {
            OptionValue::Null => Ok(Vec::new()),
            OptionValue::List(items) => Ok(items.clone()),
            OptionValue::Text(s) => Ok(vec![s.clone()]),
            other => Err(self.mismatch(key, "a list", other)),
        }
    }

    pub fn series(&self, key: &str) -> Result<Option<&'a TimeSeries>, InsightError> {
        match self.get(key)? {
            OptionValue::Null => Ok(None),
            OptionValue::Series(s) => {
                s.ensure_sorted().map_err(|e| self.err(key, e.to_string()))?;
                Ok(Some(s))
            }
            other => Err(self.mismatch(key, "a series", other)),
        }
    }

    pub fn instrument(&self, key: &str) -> Result<Option<Arc<Instrument>>, InsightError> {
        match self.get(key)? {
            OptionValue::Null => Ok(None),
            OptionValue::Instrument(i) => Ok(Some(Arc::clone(i))),
            other => Err(self.mismatch(key, "an instrument", other)),
        }
    }

    pub fn nested(&self, key: &str) -> Result<OptionReader<'a>, InsightError> {
        match self.get(key)? {
            OptionValue::Map(options) => Ok(OptionReader {
                generator: self.generator,
                prefix: self.path(key),
                options,
            }),
            other => Err(self.mismatch(key, "a map", other)),
        }
    }

    /// A value declared as either a keyword or a caller-supplied series.
    pub fn text_or_series(&self, key: &str) -> Result<TextOrSeries<'a>, InsightError> {
        match self.get(key)? {
            OptionValue::Text(s) => Ok(TextOrSeries::Text(s)),
            OptionValue::Series(s) => Ok(TextOrSeries::Series(s)),
            other => Err(self.mismatch(key, "text or a series", other)),
        }
    }
}

pub enum TextOrSeries<'a> {
    Text(&'a str),
    Series(&'a TimeSeries),
}

/// Builds an `Options` map from `(key, value)` pairs.
pub fn option_map<const N: usize>(pairs: [(&str, OptionValue); N]) -> Options {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}
