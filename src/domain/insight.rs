//! Generated insight artifacts and their plain-text rendering.

use crate::domain::classification::ClassificationReport;
use crate::domain::series::Frame;
use std::collections::BTreeMap;
use std::fmt;

/// Square matrix with the same labels on both axes.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledMatrix {
    pub labels: Vec<String>,
    pub values: Vec<Vec<Option<f64>>>,
}

impl LabeledMatrix {
    pub fn get(&self, row: &str, col: &str) -> Option<f64> {
        let r = self.labels.iter().position(|l| l == row)?;
        let c = self.labels.iter().position(|l| l == col)?;
        self.values[r][c]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Insight {
    Frame(Frame),
    /// Named values in presentation order.
    Scalars(Vec<(String, f64)>),
    Matrix(LabeledMatrix),
    /// One value per lag, starting at lag 0.
    Correlogram(Vec<f64>),
    Classification(ClassificationReport),
}

/// Insight name to artifact, iterated in name order.
///
/// Run order is the manager's insertion order, see
/// [`InsightManager::generator_names`](crate::domain::manager::InsightManager::generator_names).
pub type InsightMap = BTreeMap<String, Insight>;

impl Insight {
    pub fn as_frame(&self) -> Option<&Frame> {
        match self {
            Insight::Frame(f) => Some(f),
            _ => None,
        }
    }

    pub fn scalar(&self, name: &str) -> Option<f64> {
        match self {
            Insight::Scalars(values) => values.iter().find(|(n, _)| n == name).map(|(_, v)| *v),
            _ => None,
        }
    }

    pub fn as_matrix(&self) -> Option<&LabeledMatrix> {
        match self {
            Insight::Matrix(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_correlogram(&self) -> Option<&[f64]> {
        match self {
            Insight::Correlogram(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_classification(&self) -> Option<&ClassificationReport> {
        match self {
            Insight::Classification(r) => Some(r),
            _ => None,
        }
    }
}

fn cell(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.6}"),
        None => "-".to_string(),
    }
}

fn pct(value: f64) -> String {
    format!("{:.2}%", value * 100.0)
}

fn write_row(f: &mut fmt::Formatter<'_>, cells: &[String], width: usize) -> fmt::Result {
    let line: Vec<String> = cells.iter().map(|c| format!("{c:>width$}")).collect();
    writeln!(f, "{}", line.join(" ").trim_end())
}

impl fmt::Display for LabeledMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self.labels.iter().map(String::len).max().unwrap_or(0).max(10);
        let mut header = vec![String::new()];
        header.extend(self.labels.iter().cloned());
        write_row(f, &header, width)?;
        for (label, row) in self.labels.iter().zip(&self.values) {
            let mut cells = vec![label.clone()];
            cells.extend(row.iter().map(|v| cell(*v)));
            write_row(f, &cells, width)?;
        }
        Ok(())
    }
}

fn fmt_frame(f: &mut fmt::Formatter<'_>, frame: &Frame) -> fmt::Result {
    let width = frame
        .columns
        .iter()
        .map(|c| c.name.len())
        .max()
        .unwrap_or(0)
        .max(10);
    let mut header = vec!["date".to_string()];
    header.extend(frame.columns.iter().map(|c| c.name.clone()));
    write_row(f, &header, width)?;
    for (i, date) in frame.dates.iter().enumerate() {
        let mut cells = vec![date.to_string()];
        cells.extend(frame.columns.iter().map(|c| cell(c.values[i])));
        write_row(f, &cells, width)?;
    }
    Ok(())
}

fn fmt_classification(f: &mut fmt::Formatter<'_>, report: &ClassificationReport) -> fmt::Result {
    writeln!(f, "Won : {}", report.wins)?;
    writeln!(f, "Lost : {}", report.losses)?;
    writeln!(f, "Total : {}", report.total)?;
    writeln!(f, "Diff : {}", report.diff())?;
    writeln!(f)?;
    writeln!(f, "Accuracy : {}", pct(report.accuracy))?;
    writeln!(
        f,
        "Information Coefficient (Edge): {}",
        pct(report.information_coefficient)
    )?;
    writeln!(f, "Expected Value (Annualised): {}", pct(report.expected_value))?;
    writeln!(f)?;
    for score in &report.scores {
        writeln!(
            f,
            "{:<5} precision {:>8} recall {:>8} f1 {:>8} support {}",
            score.signal.to_string(),
            pct(score.precision),
            pct(score.recall),
            pct(score.f1),
            score.support
        )?;
    }
    writeln!(f)?;

    let matrix = LabeledMatrix {
        labels: report.matrix.labels.iter().map(|s| s.to_string()).collect(),
        values: report
            .matrix_values()
            .into_iter()
            .map(|row| row.into_iter().map(Some).collect())
            .collect(),
    };
    match report.normalize {
        Some(mode) => writeln!(f, "Confusion matrix (actual x predicted, normalize={mode})")?,
        None => writeln!(f, "Confusion matrix (actual x predicted)")?,
    }
    write!(f, "{matrix}")
}

impl fmt::Display for Insight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Insight::Frame(frame) => fmt_frame(f, frame),
            Insight::Scalars(values) => {
                let width = values.iter().map(|(n, _)| n.len()).max().unwrap_or(0);
                for (name, value) in values {
                    writeln!(f, "{name:<width$} : {}", cell(Some(*value)))?;
                }
                Ok(())
            }
            Insight::Matrix(matrix) => write!(f, "{matrix}"),
            Insight::Correlogram(values) => {
                writeln!(f, "{:>4} {:>10}", "lag", "acf")?;
                for (lag, v) in values.iter().enumerate() {
                    writeln!(f, "{lag:>4} {:>10}", cell(Some(*v)))?;
                }
                Ok(())
            }
            Insight::Classification(report) => fmt_classification(f, report),
        }
    }
}
