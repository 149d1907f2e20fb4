//! Evaluation metrics for classifiers

use serde::Serialize;
use std::fmt;

/// Precision, recall and F1 for a single class
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Averaged precision/recall/F1 over all classes
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AverageMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

/// Held-out evaluation of a classifier
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationReport {
    pub class_names: Vec<String>,
    pub accuracy: f64,
    /// `confusion[true][predicted]`
    pub confusion: Vec<Vec<usize>>,
    pub per_class: Vec<ClassMetrics>,
    pub macro_avg: AverageMetrics,
    pub weighted_avg: AverageMetrics,
    pub total: usize,
}

/// Fraction of predictions equal to the label; 0 for empty input
pub fn accuracy(y_true: &[usize], y_pred: &[usize]) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let correct = y_true
        .iter()
        .zip(y_pred)
        .filter(|(truth, pred)| truth == pred)
        .count();
    correct as f64 / y_true.len() as f64
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

impl ClassificationReport {
    /// Build a report from labels and predictions.
    ///
    /// Class ids outside `class_names` are ignored in the per-class table
    /// but still count against accuracy. Undefined ratios are reported as 0.
    pub fn compute(y_true: &[usize], y_pred: &[usize], class_names: &[String]) -> Self {
        let n_classes = class_names.len();
        let mut confusion = vec![vec![0usize; n_classes]; n_classes];
        for (&truth, &pred) in y_true.iter().zip(y_pred) {
            if truth < n_classes && pred < n_classes {
                confusion[truth][pred] += 1;
            }
        }

        let per_class: Vec<ClassMetrics> = (0..n_classes)
            .map(|class| {
                let true_positive = confusion[class][class];
                let predicted: usize = confusion.iter().map(|row| row[class]).sum();
                let support: usize = confusion[class].iter().sum();

                let precision = ratio(true_positive, predicted);
                let recall = ratio(true_positive, support);
                let f1 = if precision + recall > 0.0 {
                    2.0 * precision * recall / (precision + recall)
                } else {
                    0.0
                };

                ClassMetrics {
                    precision,
                    recall,
                    f1,
                    support,
                }
            })
            .collect();

        let macro_avg = average(&per_class, |_| 1.0);
        let total_support: usize = per_class.iter().map(|m| m.support).sum();
        let weighted_avg = if total_support == 0 {
            AverageMetrics {
                precision: 0.0,
                recall: 0.0,
                f1: 0.0,
            }
        } else {
            average(&per_class, |m| m.support as f64)
        };

        Self {
            class_names: class_names.to_vec(),
            accuracy: accuracy(y_true, y_pred),
            confusion,
            per_class,
            macro_avg,
            weighted_avg,
            total: y_true.len(),
        }
    }
}

fn average(per_class: &[ClassMetrics], weight: impl Fn(&ClassMetrics) -> f64) -> AverageMetrics {
    let total_weight: f64 = per_class.iter().map(&weight).sum();
    if total_weight == 0.0 {
        return AverageMetrics {
            precision: 0.0,
            recall: 0.0,
            f1: 0.0,
        };
    }

    let weighted = |field: fn(&ClassMetrics) -> f64| {
        per_class.iter().map(|m| weight(m) * field(m)).sum::<f64>() / total_weight
    };

    AverageMetrics {
        precision: weighted(|m| m.precision),
        recall: weighted(|m| m.recall),
        f1: weighted(|m| m.f1),
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .class_names
            .iter()
            .map(String::len)
            .chain(std::iter::once("weighted avg".len()))
            .max()
            .unwrap_or(0);

        writeln!(
            f,
            "{:>width$} {:>9} {:>9} {:>9} {:>9}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        writeln!(f)?;

        for (name, m) in self.class_names.iter().zip(&self.per_class) {
            writeln!(
                f,
                "{:>width$} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                name, m.precision, m.recall, m.f1, m.support
            )?;
        }
        writeln!(f)?;

        writeln!(
            f,
            "{:>width$} {:>9} {:>9} {:>9.2} {:>9}",
            "accuracy", "", "", self.accuracy, self.total
        )?;
        for (label, avg) in [("macro avg", &self.macro_avg), ("weighted avg", &self.weighted_avg)] {
            writeln!(
                f,
                "{:>width$} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                label, avg.precision, avg.recall, avg.f1, self.total
            )?;
        }

        writeln!(f)?;
        writeln!(f, "Confusion matrix (rows: true, columns: predicted)")?;
        for (name, row) in self.class_names.iter().zip(&self.confusion) {
            write!(f, "{:>width$}", name)?;
            for count in row {
                write!(f, " {:>5}", count)?;
            }
            writeln!(f)?;
        }

        Ok(())
    }
}
