//! Dataset loading and splitting
//!
//! Ships the Wine dataset (178 samples, 13 features, 3 classes) inside the
//! binary, reads other CSV files in the same layout and provides a
//! deterministic stratified train/test split.

use anyhow::{Context, Result};
use std::path::Path;

use crate::deterministic::{mix_seed, LcgRng};

/// Bundled Wine dataset, last column is the class id
const WINE_CSV: &str = include_str!("../data/wine.csv");

/// Labeled training data
#[derive(Clone, Debug, PartialEq)]
pub struct Dataset {
    pub features: Vec<Vec<f64>>,
    pub targets: Vec<usize>,
    pub feature_count: usize,
    pub feature_names: Vec<String>,
}

impl Dataset {
    /// The bundled Wine dataset
    pub fn wine() -> Result<Self> {
        Self::from_csv_str(WINE_CSV).context("bundled Wine dataset is malformed")
    }

    /// Load dataset from CSV file
    /// Expected format: feature1,feature2,...,target
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read CSV file {}", path.as_ref().display()))?;
        Self::from_csv_str(&content)
    }

    /// Parse CSV text. An optional header row supplies feature names;
    /// blank lines and `#` comments are skipped.
    pub fn from_csv_str(content: &str) -> Result<Self> {
        let mut features = Vec::new();
        let mut targets = Vec::new();
        let mut feature_count = 0;
        let mut header: Option<Vec<String>> = None;

        for (line_idx, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let parts: Vec<&str> = line.split(',').map(|s| s.trim()).collect();
            if parts.len() < 2 {
                anyhow::bail!("Line {}: expected at least 2 columns", line_idx + 1);
            }

            if features.is_empty() && header.is_none() && parts[0].parse::<f64>().is_err() {
                header = Some(parts.iter().map(|s| s.to_string()).collect());
                feature_count = parts.len() - 1;
                continue;
            }

            if feature_count == 0 {
                feature_count = parts.len() - 1;
            } else if parts.len() - 1 != feature_count {
                anyhow::bail!(
                    "Line {}: expected {} features, got {}",
                    line_idx + 1,
                    feature_count,
                    parts.len() - 1
                );
            }

            let mut row_features = Vec::with_capacity(feature_count);
            for (i, part) in parts.iter().take(feature_count).enumerate() {
                let val = part
                    .parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .with_context(|| format!("Line {}, column {}: invalid number", line_idx + 1, i + 1))?;
                row_features.push(val);
            }

            let target = parts[feature_count]
                .parse::<usize>()
                .with_context(|| format!("Line {}: invalid target", line_idx + 1))?;

            features.push(row_features);
            targets.push(target);
        }

        if features.is_empty() {
            anyhow::bail!("Dataset is empty");
        }

        let feature_names = match header {
            Some(names) => names.into_iter().take(feature_count).collect(),
            None => (0..feature_count).map(|i| format!("feature_{i}")).collect(),
        };

        Ok(Self {
            features,
            targets,
            feature_count,
            feature_names,
        })
    }

    /// Get number of samples
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Check if dataset is empty
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Number of classes (largest class id + 1)
    pub fn n_classes(&self) -> usize {
        self.targets.iter().max().map_or(0, |max| max + 1)
    }

    /// Class names `class_0 .. class_{n-1}`
    pub fn class_names(&self) -> Vec<String> {
        (0..self.n_classes()).map(|i| format!("class_{i}")).collect()
    }

    /// Samples per class id
    pub fn class_counts(&self) -> Vec<usize> {
        let mut counts = vec![0usize; self.n_classes()];
        for &target in &self.targets {
            counts[target] += 1;
        }
        counts
    }

    /// Rows at `indices`, in the given order
    pub fn subset(&self, indices: &[usize]) -> Self {
        Self {
            features: indices.iter().map(|&i| self.features[i].clone()).collect(),
            targets: indices.iter().map(|&i| self.targets[i]).collect(),
            feature_count: self.feature_count,
            feature_names: self.feature_names.clone(),
        }
    }

    /// Get feature statistics for validation
    pub fn feature_stats(&self) -> Vec<(f64, f64)> {
        let mut stats = vec![(f64::INFINITY, f64::NEG_INFINITY); self.feature_count];

        for row in &self.features {
            for (i, &val) in row.iter().enumerate() {
                stats[i].0 = stats[i].0.min(val);
                stats[i].1 = stats[i].1.max(val);
            }
        }

        stats
    }

    /// Deterministic stratified split into `(train, test)`
    ///
    /// The test set holds `ceil(len * test_size)` rows. Each class gets
    /// `count * test_size` of them, with leftover rows going to the classes
    /// with the largest fractional remainders. Both halves keep the original
    /// row order.
    pub fn stratified_split(&self, test_size: f64, seed: i64) -> Result<(Self, Self)> {
        if !(test_size > 0.0 && test_size < 1.0) {
            anyhow::bail!("test_size must be in (0, 1), got {test_size}");
        }

        let n_test = (self.len() as f64 * test_size).ceil() as usize;
        if n_test == 0 || n_test >= self.len() {
            anyhow::bail!(
                "test_size {test_size} leaves an empty split for {} samples",
                self.len()
            );
        }

        let counts = self.class_counts();
        let quotas = allocate_quotas(&counts, test_size, n_test);

        let mut test_mask = vec![false; self.len()];
        for (class, &quota) in quotas.iter().enumerate() {
            let mut members: Vec<usize> = (0..self.len())
                .filter(|&i| self.targets[i] == class)
                .collect();

            let mut rng = LcgRng::new(mix_seed(seed, class as u64));
            rng.shuffle(&mut members);

            for &i in members.iter().take(quota) {
                test_mask[i] = true;
            }
        }

        let (test_idx, train_idx): (Vec<usize>, Vec<usize>) =
            (0..self.len()).partition(|&i| test_mask[i]);

        Ok((self.subset(&train_idx), self.subset(&test_idx)))
    }
}

/// Largest-remainder allocation of `n_test` rows across classes
fn allocate_quotas(counts: &[usize], test_size: f64, n_test: usize) -> Vec<usize> {
    let exact: Vec<f64> = counts.iter().map(|&c| c as f64 * test_size).collect();
    let mut quotas: Vec<usize> = exact.iter().map(|e| e.floor() as usize).collect();

    let mut by_remainder: Vec<usize> = (0..counts.len()).collect();
    by_remainder.sort_by(|&a, &b| {
        let ra = exact[a] - exact[a].floor();
        let rb = exact[b] - exact[b].floor();
        rb.total_cmp(&ra).then(a.cmp(&b))
    });

    let mut assigned: usize = quotas.iter().sum();
    for &class in by_remainder.iter().cycle().take(counts.len() * 2) {
        if assigned >= n_test {
            break;
        }
        if quotas[class] < counts[class] {
            quotas[class] += 1;
            assigned += 1;
        }
    }

    quotas
}
