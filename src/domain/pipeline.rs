//! Pipeline configuration: validation, parsing and manager assembly.
//!
//! ```ini
//! [data]
//! path = ./data
//!
//! [derivative]
//! name = STRAT
//! assets = SPY, TLT
//! weights = 0.6, 0.4
//!
//! [pipeline]
//! insights = perf, cm
//!
//! [insight.cm]
//! kind = ConfusionMatrix
//! baseline = SPY
//! ```

use crate::domain::error::InsightError;
use crate::domain::instrument::{Asset, AssetStore, Derivative, Environment, Instrument};
use crate::domain::manager::InsightManager;
use crate::domain::options::{OptionValue, Options, resolve_options};
use crate::domain::registry::Registry;
use crate::domain::series::TimeSeries;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use std::path::PathBuf;
use std::sync::Arc;

const INSIGHT_SECTION_PREFIX: &str = "insight.";
const RESERVED_KEYS: [&str; 3] = ["kind", "namespace", "name"];
/// Option naming an instrument in the data store rather than a literal.
const INSTRUMENT_OPTION: &str = "baseline";

#[derive(Debug, Clone, PartialEq)]
pub struct InsightSpec {
    /// Section suffix, `cm` for `[insight.cm]`.
    pub key: String,
    pub kind: String,
    pub namespace: Option<String>,
    /// Result name; defaults to the section key.
    pub name: String,
    /// Raw `key = value` option pairs in key order.
    pub options: Vec<(String, String)>,
}

impl InsightSpec {
    fn section(&self) -> String {
        format!("{INSIGHT_SECTION_PREFIX}{}", self.key)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSpec {
    pub data_path: PathBuf,
    pub derivative: String,
    pub assets: Vec<String>,
    /// Constant weight per asset; equal weights when not configured.
    pub weights: Vec<f64>,
    pub insights: Vec<InsightSpec>,
}

fn missing(section: &str, key: &str) -> InsightError {
    InsightError::ConfigMissing {
        section: section.to_string(),
        key: key.to_string(),
    }
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> InsightError {
    InsightError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn required(config: &dyn ConfigPort, section: &str, key: &str) -> Result<String, InsightError> {
    match config.get_string(section, key) {
        Some(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        _ => Err(missing(section, key)),
    }
}

pub fn validate_pipeline_config(config: &dyn ConfigPort) -> Result<(), InsightError> {
    required(config, "data", "path")?;
    required(config, "derivative", "name")?;
    validate_weights(config)?;
    validate_insights(config)?;
    Ok(())
}

fn validate_weights(config: &dyn ConfigPort) -> Result<(), InsightError> {
    let assets = split_list(&config.get_string("derivative", "assets").unwrap_or_default());
    let Some(raw) = config.get_string("derivative", "weights") else {
        return Ok(());
    };
    let weights = split_list(&raw);
    if weights.len() != assets.len() {
        return Err(invalid(
            "derivative",
            "weights",
            format!("{} weights for {} assets", weights.len(), assets.len()),
        ));
    }
    for w in &weights {
        w.parse::<f64>()
            .map_err(|_| invalid("derivative", "weights", format!("`{w}` is not a number")))?;
    }
    Ok(())
}

fn validate_insights(config: &dyn ConfigPort) -> Result<(), InsightError> {
    let keys = split_list(&required(config, "pipeline", "insights")?);
    for key in &keys {
        let section = format!("{INSIGHT_SECTION_PREFIX}{key}");
        required(config, &section, "kind")?;
    }
    Ok(())
}

/// Validates `config` and reads it into a [`PipelineSpec`].
pub fn parse_pipeline(config: &dyn ConfigPort) -> Result<PipelineSpec, InsightError> {
    validate_pipeline_config(config)?;

    let assets = split_list(&config.get_string("derivative", "assets").unwrap_or_default());
    let weights = match config.get_string("derivative", "weights") {
        Some(raw) => split_list(&raw)
            .iter()
            .map(|w| w.parse::<f64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| invalid("derivative", "weights", e.to_string()))?,
        None => vec![1.0 / assets.len().max(1) as f64; assets.len()],
    };

    let insights = split_list(&required(config, "pipeline", "insights")?)
        .into_iter()
        .map(|key| {
            let section = format!("{INSIGHT_SECTION_PREFIX}{key}");
            let options = config
                .section_keys(&section)
                .into_iter()
                .filter(|k| !RESERVED_KEYS.contains(&k.as_str()))
                .filter_map(|k| config.get_string(&section, &k).map(|v| (k, v)))
                .collect();
            Ok(InsightSpec {
                kind: required(config, &section, "kind")?,
                namespace: config.get_string(&section, "namespace"),
                name: config.get_string(&section, "name").unwrap_or_else(|| key.clone()),
                key,
                options,
            })
        })
        .collect::<Result<Vec<_>, InsightError>>()?;

    Ok(PipelineSpec {
        data_path: PathBuf::from(required(config, "data", "path")?),
        derivative: required(config, "derivative", "name")?,
        assets,
        weights,
        insights,
    })
}

/// Checks every configured kind exists and every option parses against its default.
pub fn check_insights(spec: &PipelineSpec, registry: &Registry) -> Result<(), InsightError> {
    for insight in &spec.insights {
        let defaults = registry.describe(&insight.kind, insight.namespace.as_deref())?;
        let mut overrides = Options::new();
        for (key, raw) in &insight.options {
            if key == INSTRUMENT_OPTION {
                continue;
            }
            let path: Vec<&str> = key.split('.').collect();
            insert_at(&mut overrides, &path, parse_option(insight, &defaults, key, raw)?);
        }
        resolve_options(&insight.name, defaults, &overrides)?;
    }
    Ok(())
}

/// Every instrument the data source lists except `exclude`.
pub fn load_environment(
    data: &dyn DataPort,
    exclude: &str,
) -> Result<Arc<Environment>, InsightError> {
    let mut store = AssetStore::new();
    for name in data.list_instruments()? {
        if name == exclude {
            continue;
        }
        let history = data.load(&name)?;
        store.insert(Instrument::from(Asset::new(name, history)));
    }
    tracing::info!(instruments = store.len(), "environment loaded");
    Ok(Arc::new(Environment::new(store)))
}

pub fn build_derivative(
    spec: &PipelineSpec,
    data: &dyn DataPort,
    env: Arc<Environment>,
) -> Result<Derivative, InsightError> {
    let history = data.load(&spec.derivative)?;
    let dates: Vec<_> = history.values.iter().map(|b| b.date).collect();
    let mut derivative = Derivative::new(spec.derivative.clone(), history, env);
    for (asset, weight) in spec.assets.iter().zip(&spec.weights) {
        let series = TimeSeries::from_pairs(asset.as_str(), dates.iter().map(|d| (*d, *weight)));
        derivative = derivative.with_underlying(asset, series)?;
    }
    Ok(derivative)
}

fn template_at<'a>(defaults: &'a Options, path: &[&str]) -> Option<&'a OptionValue> {
    let (first, rest) = path.split_first()?;
    match (defaults.get(*first)?, rest.is_empty()) {
        (value, true) => Some(value),
        (OptionValue::Map(nested), false) => template_at(nested, rest),
        _ => None,
    }
}

fn insert_at(options: &mut Options, path: &[&str], value: OptionValue) {
    match path {
        [] => {}
        [last] => {
            options.insert(last.to_string(), value);
        }
        [first, rest @ ..] => {
            let entry = options
                .entry(first.to_string())
                .or_insert_with(|| OptionValue::Map(Options::new()));
            if !matches!(entry, OptionValue::Map(_)) {
                *entry = OptionValue::Map(Options::new());
            }
            if let OptionValue::Map(nested) = entry {
                insert_at(nested, rest, value);
            }
        }
    }
}

fn parse_option(
    insight: &InsightSpec,
    defaults: &Options,
    key: &str,
    raw: &str,
) -> Result<OptionValue, InsightError> {
    let path: Vec<&str> = key.split('.').collect();
    match template_at(defaults, &path) {
        Some(template) => OptionValue::parse_like(template, raw)
            .map_err(|reason| invalid(&insight.section(), key, reason)),
        // Unknown keys pass through as text and are rejected by the generator.
        None => Ok(OptionValue::Text(raw.trim().to_string())),
    }
}

/// Typed overrides for one configured insight.
pub fn build_options(
    insight: &InsightSpec,
    registry: &Registry,
    env: &Environment,
) -> Result<Options, InsightError> {
    let defaults = registry.describe(&insight.kind, insight.namespace.as_deref())?;
    let mut overrides = Options::new();
    for (key, raw) in &insight.options {
        let value = if key == INSTRUMENT_OPTION {
            OptionValue::Instrument(env.find_asset(raw.trim())?)
        } else {
            parse_option(insight, &defaults, key, raw)?
        };
        let path: Vec<&str> = key.split('.').collect();
        insert_at(&mut overrides, &path, value);
    }
    Ok(overrides)
}

/// Loads the data, builds the derivative and adds every configured insight in order.
pub fn build_manager(
    spec: &PipelineSpec,
    data: &dyn DataPort,
    registry: &Registry,
) -> Result<InsightManager, InsightError> {
    let env = load_environment(data, &spec.derivative)?;
    let derivative = build_derivative(spec, data, Arc::clone(&env))?;
    let mut manager = InsightManager::new(Instrument::from(derivative));
    for insight in &spec.insights {
        let options = build_options(insight, registry, &env)?;
        let generator = registry.create(
            &insight.kind,
            Some(&insight.name),
            insight.namespace.as_deref(),
            Some(options),
        )?;
        manager.add(generator);
    }
    Ok(manager)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    const CONFIG: &str = r#"
[data]
path = ./data

[derivative]
name = STRAT
assets = SPY, TLT
weights = 0.6, 0.4

[pipeline]
insights = perf, rolling

[insight.perf]
kind = PerfSummary
risk_free_rate = 0.02

[insight.rolling]
kind = RollingReturns
name = Rolling
std.window = 20
"#;

    fn config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    #[test]
    fn parse_reads_pipeline_in_order() {
        let spec = parse_pipeline(&config(CONFIG)).unwrap();
        assert_eq!(spec.derivative, "STRAT");
        assert_eq!(spec.assets, vec!["SPY", "TLT"]);
        assert_eq!(spec.weights, vec![0.6, 0.4]);
        let keys: Vec<&str> = spec.insights.iter().map(|i| i.key.as_str()).collect();
        assert_eq!(keys, vec!["perf", "rolling"]);
        assert_eq!(spec.insights[0].name, "perf");
        assert_eq!(spec.insights[1].name, "Rolling");
        assert_eq!(
            spec.insights[1].options,
            vec![("std.window".to_string(), "20".to_string())]
        );
    }

    #[test]
    fn weights_default_to_equal() {
        let spec = parse_pipeline(&config(&CONFIG.replace("weights = 0.6, 0.4\n", ""))).unwrap();
        assert_eq!(spec.weights, vec![0.5, 0.5]);
    }

    #[test]
    fn missing_data_path_is_reported() {
        let err = validate_pipeline_config(&config(&CONFIG.replace("path = ./data\n", "")))
            .unwrap_err();
        assert!(matches!(err, InsightError::ConfigMissing { ref key, .. } if key == "path"));
    }

    #[test]
    fn weight_count_must_match_assets() {
        let err = validate_pipeline_config(&config(
            &CONFIG.replace("weights = 0.6, 0.4", "weights = 1.0"),
        ))
        .unwrap_err();
        assert!(matches!(err, InsightError::ConfigInvalid { .. }));
    }

    #[test]
    fn listed_insight_needs_a_kind() {
        let err = validate_pipeline_config(&config(
            &CONFIG.replace("insights = perf, rolling", "insights = perf, rolling, cm"),
        ))
        .unwrap_err();
        assert!(matches!(err, InsightError::ConfigMissing { ref section, .. } if section == "insight.cm"));
    }

    #[test]
    fn check_insights_parses_option_types() {
        let registry = Registry::with_builtins();
        let spec = parse_pipeline(&config(CONFIG)).unwrap();
        assert!(check_insights(&spec, &registry).is_ok());

        let bad = parse_pipeline(&config(&CONFIG.replace("std.window = 20", "std.window = wide")))
            .unwrap();
        assert!(matches!(
            check_insights(&bad, &registry),
            Err(InsightError::ConfigInvalid { .. })
        ));
    }

    #[test]
    fn check_insights_rejects_unknown_option() {
        let registry = Registry::with_builtins();
        let spec = parse_pipeline(&config(&CONFIG.replace("std.window = 20", "std.span = 20")))
            .unwrap();
        assert!(matches!(
            check_insights(&spec, &registry),
            Err(InsightError::Configuration { .. })
        ));
    }

    #[test]
    fn check_insights_reports_unknown_kind() {
        let registry = Registry::with_builtins();
        let spec = parse_pipeline(&config(&CONFIG.replace("kind = PerfSummary", "kind = Sharpe")))
            .unwrap();
        assert!(matches!(
            check_insights(&spec, &registry),
            Err(InsightError::Lookup { .. })
        ));
    }

    #[test]
    fn build_options_nests_dotted_keys() {
        let registry = Registry::with_builtins();
        let spec = parse_pipeline(&config(CONFIG)).unwrap();
        let options = build_options(&spec.insights[1], &registry, &Environment::default()).unwrap();
        match &options["std"] {
            OptionValue::Map(std) => assert_eq!(std["window"], OptionValue::Int(20)),
            other => panic!("expected map, got {other:?}"),
        }
    }

    #[test]
    fn build_options_resolves_baseline() {
        let registry = Registry::with_builtins();
        let insight = InsightSpec {
            key: "cm".into(),
            kind: "ConfusionMatrix".into(),
            namespace: None,
            name: "cm".into(),
            options: vec![("baseline".into(), "SPY".into())],
        };
        let err = build_options(&insight, &registry, &Environment::default()).unwrap_err();
        assert!(matches!(err, InsightError::UnknownAsset { .. }));
    }
}
