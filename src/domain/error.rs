//! Domain error types.

use chrono::NaiveDate;

/// Top-level error type for tradeinsight.
#[derive(Debug, thiserror::Error)]
pub enum InsightError {
    /// A generator option is missing, unknown or has the wrong type.
    #[error("generator {generator}: option `{option}` {reason}")]
    Configuration {
        generator: String,
        option: String,
        reason: String,
    },

    #[error("no insight generator `{kind}` in namespace `{namespace}`")]
    Lookup { namespace: String, kind: String },

    #[error("unknown generator namespace `{namespace}`")]
    UnknownNamespace { namespace: String },

    #[error("unknown asset `{name}`")]
    UnknownAsset { name: String },

    #[error("computation error: {reason}")]
    Computation { reason: String },

    /// A return series holds a NaN or infinite value.
    #[error("non-numeric value {value} at {date}")]
    NonNumeric { date: NaiveDate, value: f64 },

    #[error("insight `{name}` failed: {source}")]
    Generator {
        name: String,
        source: Box<InsightError>,
    },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl InsightError {
    pub fn configuration(
        generator: impl Into<String>,
        option: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        InsightError::Configuration {
            generator: generator.into(),
            option: option.into(),
            reason: reason.into(),
        }
    }

    pub fn computation(reason: impl Into<String>) -> Self {
        InsightError::Computation {
            reason: reason.into(),
        }
    }

    /// The innermost error, looking through `Generator` wrappers.
    pub fn root(&self) -> &InsightError {
        match self {
            InsightError::Generator { source, .. } => source.root(),
            other => other,
        }
    }
}

impl From<&InsightError> for std::process::ExitCode {
    fn from(err: &InsightError) -> Self {
        let code: u8 = match err.root() {
            InsightError::Io(_) => 1,
            InsightError::ConfigParse { .. }
            | InsightError::ConfigMissing { .. }
            | InsightError::ConfigInvalid { .. }
            | InsightError::Configuration { .. } => 2,
            InsightError::Lookup { .. }
            | InsightError::UnknownNamespace { .. }
            | InsightError::UnknownAsset { .. } => 3,
            InsightError::Computation { .. } | InsightError::NonNumeric { .. } => 4,
            InsightError::Data { .. } => 5,
            InsightError::Generator { .. } => 1,
        };
        std::process::ExitCode::from(code)
    }
}
