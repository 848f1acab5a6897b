//! The contract every insight generator implements.

use crate::domain::error::InsightError;
use crate::domain::insight::Insight;
use crate::domain::instrument::DerivativeView;
use crate::domain::options::Options;

/// An analysis component bound to a name and a resolved option set.
///
/// Options are validated and parsed when the generator is constructed, so
/// `generate` only reads `self` and can be called any number of times.
pub trait InsightGenerator: Send + Sync {
    /// Result key in the manager's output. Not required to be unique.
    fn name(&self) -> &str;

    /// Registered kind, e.g. `ConfusionMatrix`.
    fn kind(&self) -> &str;

    /// Declared defaults merged with the caller's overrides.
    fn options(&self) -> &Options;

    fn generate(&self, derivative: &dyn DerivativeView) -> Result<Insight, InsightError>;

    /// Generates the artifact and, when `display` is set, prints it to stdout.
    fn produce(
        &self,
        derivative: &dyn DerivativeView,
        display: bool,
    ) -> Result<Insight, InsightError> {
        let insight = self.generate(derivative)?;
        if display {
            println!("{}", present(self.name(), &insight));
        }
        Ok(insight)
    }
}

/// Rendered artifact under a banner naming the insight.
pub fn present(name: &str, insight: &Insight) -> String {
    let rule = "=".repeat(49);
    format!("{rule}\n{name}\n{rule}\n\n{insight}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn present_puts_name_in_banner() {
        let text = present("perf", &Insight::Scalars(vec![("Sharpe".into(), 1.0)]));
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[1], "perf");
        assert!(lines[0].chars().all(|c| c == '='));
        assert!(text.contains("Sharpe : 1.000000"));
    }
}
