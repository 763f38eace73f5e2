//! Isolation Forest - unsupervised boundary over presumed-normal samples
//!
//! Trees isolate points by random axis-aligned cuts; points that are easy to
//! isolate (short paths) are anomalous. Fitting is fully determined by the
//! seed, so the same data and parameters always yield the same forest.
//!
//! Conventions:
//! - `score(x) = -2^(-E[h(x)] / c(ψ))`, more negative = more anomalous
//! - `offset` = contamination percentile of the training scores
//! - `raw = score - offset`, larger = more normal, `outlier = raw < 0`

use rand::rngs::StdRng;
use rand::seq::index;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::{RiskError, RiskResult};
use crate::features::{FeatureVector, FEATURE_COUNT};

const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

/// Hyperparameters fixed at fit time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForestParams {
    pub n_estimators: usize,
    pub max_samples: usize,
    pub contamination: f64,
    pub seed: u64,
}

/// Result of evaluating one vector against a model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub outlier: bool,
    /// Normality margin: larger means more normal
    pub raw: f64,
}

/// Contamination must lie in (0, 0.5]
pub fn validate_contamination(contamination: f64) -> RiskResult<()> {
    if contamination.is_finite() && contamination > 0.0 && contamination <= 0.5 {
        Ok(())
    } else {
        Err(RiskError::InvalidContamination(contamination))
    }
}

// ============================================================================
// TREE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum Node {
    Split {
        feature: usize,
        threshold: f64,
        /// Training range of `feature` at this node
        low: f64,
        high: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        size: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct IsolationTree {
    nodes: Vec<Node>,
}

impl IsolationTree {
    fn grow(data: &[FeatureVector], rows: Vec<usize>, depth_limit: usize, rng: &mut StdRng) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        tree.build(data, rows, 0, depth_limit, rng);
        tree
    }

    fn build(
        &mut self,
        data: &[FeatureVector],
        rows: Vec<usize>,
        depth: usize,
        depth_limit: usize,
        rng: &mut StdRng,
    ) -> usize {
        let id = self.nodes.len();
        self.nodes.push(Node::Leaf { size: rows.len() });

        if depth >= depth_limit || rows.len() <= 1 {
            return id;
        }

        // Only features that still vary inside this node can split it
        let candidates: Vec<(usize, f64, f64)> = (0..FEATURE_COUNT)
            .filter_map(|feature| {
                let (low, high) = rows.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &r| {
                    let v = data[r].as_slice()[feature];
                    (lo.min(v), hi.max(v))
                });
                (high > low).then_some((feature, low, high))
            })
            .collect();

        if candidates.is_empty() {
            return id;
        }

        let (feature, low, high) = candidates[rng.gen_range(0..candidates.len())];
        let threshold = rng.gen_range(low..high);

        // threshold ∈ [low, high) keeps both sides non-empty
        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
            .into_iter()
            .partition(|&r| data[r].as_slice()[feature] <= threshold);

        let left = self.build(data, left_rows, depth + 1, depth_limit, rng);
        let right = self.build(data, right_rows, depth + 1, depth_limit, rng);

        self.nodes[id] = Node::Split { feature, threshold, low, high, left, right };
        id
    }

    fn path_length(&self, x: &FeatureVector) -> f64 {
        let values = x.as_slice();
        let mut node = 0;
        let mut depth = 0.0;

        loop {
            match &self.nodes[node] {
                Node::Leaf { size } => return depth + average_path_length(*size),
                Node::Split { feature, threshold, low, high, left, right } => {
                    let v = values[*feature];
                    // Outside the node's training range: one cut separates it
                    if v < *low || v > *high {
                        return depth + 1.0;
                    }
                    node = if v <= *threshold { *left } else { *right };
                    depth += 1.0;
                }
            }
        }
    }
}

// ============================================================================
// FOREST
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IsolationForest {
    trees: Vec<IsolationTree>,
    sample_size: usize,
    offset: f64,
}

impl IsolationForest {
    pub fn fit(data: &[FeatureVector], params: &ForestParams) -> RiskResult<Self> {
        if data.is_empty() {
            return Err(RiskError::EmptyTrainingSet);
        }
        validate_contamination(params.contamination)?;

        let sample_size = params.max_samples.clamp(1, data.len());
        let depth_limit = (sample_size as f64).log2().ceil() as usize;
        let mut rng = StdRng::seed_from_u64(params.seed);

        let trees = (0..params.n_estimators.max(1))
            .map(|_| {
                let rows = index::sample(&mut rng, data.len(), sample_size).into_vec();
                IsolationTree::grow(data, rows, depth_limit, &mut rng)
            })
            .collect();

        let mut forest = Self { trees, sample_size, offset: 0.0 };
        let training_scores: Vec<f64> = data.iter().map(|x| forest.score(x)).collect();
        forest.offset = percentile(&training_scores, params.contamination * 100.0);

        Ok(forest)
    }

    /// Raw isolation score in [-1, 0); more negative = more anomalous
    pub fn score(&self, x: &FeatureVector) -> f64 {
        let mean_path = self.trees.iter().map(|t| t.path_length(x)).sum::<f64>() / self.trees.len() as f64;
        let norm = average_path_length(self.sample_size);
        let norm = if norm > 0.0 { norm } else { 1.0 };
        -(2f64.powf(-mean_path / norm))
    }

    pub fn decide(&self, x: &FeatureVector) -> Decision {
        let raw = self.score(x) - self.offset;
        Decision { outlier: raw < 0.0, raw }
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

/// Expected path length of an unsuccessful BST search over `n` points
fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

/// Percentile with linear interpolation between closest ranks
fn percentile(values: &[f64], pct: f64) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let rank = (pct / 100.0).clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64)
}
