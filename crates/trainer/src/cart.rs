//! CART (Classification and Regression Tree) builder
//!
//! Grows one classification tree by exact-greedy search over Gini impurity.
//! Feature subsampling and every ordering decision are driven by a caller
//! supplied [`LcgRng`], so a tree is fully determined by its seed.

use wine_forest::{Node, Tree};

use crate::deterministic::{LcgRng, SplitTieBreaker};

/// Training parameters for a single tree
#[derive(Clone, Debug)]
pub struct TreeConfig {
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub max_features: usize,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: usize::MAX,
        }
    }
}

/// Split candidate with impurity and tie-breaker
#[derive(Debug, Clone)]
struct SplitCandidate {
    feature_idx: usize,
    threshold: f64,
    impurity: f64,
    tie_breaker: SplitTieBreaker,
}

impl SplitCandidate {
    fn better_than(&self, other: &SplitCandidate) -> bool {
        self.impurity < other.impurity
            || (self.impurity == other.impurity && self.tie_breaker < other.tie_breaker)
    }
}

/// Build a classification tree using the exact-greedy CART algorithm
pub struct CartBuilder<'a> {
    config: TreeConfig,
    features: &'a [Vec<f64>],
    targets: &'a [usize],
    n_classes: usize,
    feature_count: usize,
}

impl<'a> CartBuilder<'a> {
    /// `features` and `targets` must have the same length
    pub fn new(
        features: &'a [Vec<f64>],
        targets: &'a [usize],
        n_classes: usize,
        config: TreeConfig,
    ) -> Self {
        debug_assert_eq!(features.len(), targets.len());

        let feature_count = features.first().map_or(0, Vec::len);

        Self {
            config,
            features,
            targets,
            n_classes,
            feature_count,
        }
    }

    /// Build a tree over the rows at `sample_indices` (duplicates allowed)
    pub fn build(&self, sample_indices: &[usize], rng: &mut LcgRng) -> Tree {
        let mut nodes = Vec::new();
        self.build_node(sample_indices, 0, &mut nodes, rng);
        Tree::new(nodes)
    }

    /// Recursively build tree nodes, returning the index of the new node
    fn build_node(
        &self,
        indices: &[usize],
        depth: usize,
        nodes: &mut Vec<Node>,
        rng: &mut LcgRng,
    ) -> i32 {
        let current_idx = nodes.len() as i32;
        let counts = self.class_counts(indices);

        let at_max_depth = self.config.max_depth.is_some_and(|max| depth >= max);
        let is_pure = counts.iter().filter(|&&c| c > 0).count() <= 1;

        if at_max_depth || is_pure || indices.len() < self.config.min_samples_split {
            nodes.push(self.make_leaf(current_idx, &counts, indices.len()));
            return current_idx;
        }

        let split = match self.find_best_split(indices, rng) {
            Some(s) => s,
            None => {
                // No valid split, create leaf
                nodes.push(self.make_leaf(current_idx, &counts, indices.len()));
                return current_idx;
            }
        };

        let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .copied()
            .partition(|&i| self.features[i][split.feature_idx] <= split.threshold);

        // Reserve space for current node
        nodes.push(Node::internal(
            current_idx,
            split.feature_idx as i32,
            split.threshold,
            -1,
            -1,
        ));

        let left_idx = self.build_node(&left_indices, depth + 1, nodes, rng);
        let right_idx = self.build_node(&right_indices, depth + 1, nodes, rng);

        let node = &mut nodes[current_idx as usize];
        node.left = left_idx;
        node.right = right_idx;

        current_idx
    }

    /// Search features in a random order until `max_features` non-constant
    /// features have been evaluated
    fn find_best_split(&self, indices: &[usize], rng: &mut LcgRng) -> Option<SplitCandidate> {
        let mut order: Vec<usize> = (0..self.feature_count).collect();
        rng.shuffle(&mut order);

        let mut best_split: Option<SplitCandidate> = None;
        let mut visited = 0usize;

        for feature_idx in order {
            if visited >= self.config.max_features {
                break;
            }

            let mut column: Vec<(f64, usize)> = indices
                .iter()
                .map(|&i| (self.features[i][feature_idx], self.targets[i]))
                .collect();
            column.sort_by(|a, b| a.0.total_cmp(&b.0));

            let (first, last) = match (column.first(), column.last()) {
                (Some(first), Some(last)) => (first.0, last.0),
                _ => continue,
            };
            if first == last {
                // Constant features don't count towards max_features
                continue;
            }
            visited += 1;

            if let Some(candidate) = self.best_split_for_feature(feature_idx, &column) {
                best_split = match best_split {
                    Some(current) if !candidate.better_than(&current) => Some(current),
                    _ => Some(candidate),
                };
            }
        }

        best_split
    }

    /// Scan the sorted column once, keeping running class counts
    fn best_split_for_feature(
        &self,
        feature_idx: usize,
        column: &[(f64, usize)],
    ) -> Option<SplitCandidate> {
        let n = column.len();
        let min_leaf = self.config.min_samples_leaf.max(1);

        let mut right_counts = vec![0usize; self.n_classes];
        for &(_, class) in column {
            right_counts[class] += 1;
        }
        let mut left_counts = vec![0usize; self.n_classes];

        let mut best: Option<SplitCandidate> = None;

        for pos in 0..n - 1 {
            let class = column[pos].1;
            left_counts[class] += 1;
            right_counts[class] -= 1;

            let n_left = pos + 1;
            let n_right = n - n_left;
            let (value, next_value) = (column[pos].0, column[pos + 1].0);

            if value == next_value || n_left < min_leaf || n_right < min_leaf {
                continue;
            }

            let impurity = (n_left as f64 * gini(&left_counts, n_left)
                + n_right as f64 * gini(&right_counts, n_right))
                / n as f64;

            let mut threshold = value + (next_value - value) / 2.0;
            if threshold >= next_value || !threshold.is_finite() {
                threshold = value;
            }

            let candidate = SplitCandidate {
                feature_idx,
                threshold,
                impurity,
                tie_breaker: SplitTieBreaker::new(feature_idx, pos),
            };

            if best.as_ref().map_or(true, |current| candidate.better_than(current)) {
                best = Some(candidate);
            }
        }

        best
    }

    fn class_counts(&self, indices: &[usize]) -> Vec<usize> {
        let mut counts = vec![0usize; self.n_classes];
        for &i in indices {
            counts[self.targets[i]] += 1;
        }
        counts
    }

    fn make_leaf(&self, id: i32, counts: &[usize], total: usize) -> Node {
        let distribution = if total == 0 {
            vec![1.0 / self.n_classes as f64; self.n_classes]
        } else {
            counts.iter().map(|&c| c as f64 / total as f64).collect()
        };
        Node::leaf(id, distribution)
    }
}

/// Gini impurity: 1 - sum(p_k^2)
pub fn gini(counts: &[usize], total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let total = total as f64;
    1.0 - counts
        .iter()
        .map(|&c| {
            let p = c as f64 / total;
            p * p
        })
        .sum::<f64>()
}
