//! Isolation forest over encoded feature vectors.
//!
//! An ensemble of randomized binary partition trees; samples that isolate at
//! shallow depth sit in sparse regions and score close to 1. The decision
//! threshold is calibrated once at fit time so that roughly `contamination`
//! of the training batch lands on the anomalous side, then frozen for the
//! lifetime of the model.

use crate::error::DetectorError;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::cmp::Ordering;

const EULER_GAMMA: f64 = 0.577_215_664_9;

#[derive(Debug)]
enum Tree {
    Leaf {
        size: usize,
    },
    Split {
        feature: usize,
        value: f64,
        left: Box<Tree>,
        right: Box<Tree>,
    },
}

impl Tree {
    fn grow(rows: &[&[f64]], depth: usize, limit: usize, rng: &mut StdRng) -> Tree {
        if rows.len() <= 1 || depth >= limit {
            return Tree::Leaf { size: rows.len() };
        }

        let feature = rng.gen_range(0..rows[0].len());
        let mut lo = rows[0][feature];
        let mut hi = lo;
        for row in rows {
            lo = lo.min(row[feature]);
            hi = hi.max(row[feature]);
        }

        // Constant on the chosen feature: nothing left to cut.
        if hi - lo < 1e-12 {
            return Tree::Leaf { size: rows.len() };
        }

        let value = lo + rng.gen::<f64>() * (hi - lo);
        let (left, right): (Vec<&[f64]>, Vec<&[f64]>) =
            rows.iter().copied().partition(|row| row[feature] < value);

        if left.is_empty() || right.is_empty() {
            return Tree::Leaf { size: rows.len() };
        }

        Tree::Split {
            feature,
            value,
            left: Box::new(Tree::grow(&left, depth + 1, limit, rng)),
            right: Box::new(Tree::grow(&right, depth + 1, limit, rng)),
        }
    }

    fn path_length(&self, x: &[f64]) -> f64 {
        let mut node = self;
        let mut depth = 0.0;
        loop {
            match node {
                Tree::Leaf { size } => return depth + average_path_length(*size),
                Tree::Split {
                    feature,
                    value,
                    left,
                    right,
                } => {
                    depth += 1.0;
                    node = if x[*feature] < *value { left } else { right };
                }
            }
        }
    }
}

/// Expected path length of an unsuccessful BST search over `n` samples.
fn average_path_length(n: usize) -> f64 {
    if n <= 1 {
        return 0.0;
    }
    let n = n as f64;
    2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
}

/// Tunable forest parameters.
#[derive(Debug, Clone)]
pub struct ForestParams {
    /// Number of trees in the ensemble
    pub n_estimators: usize,
    /// Subsample size per tree (capped at the batch size)
    pub max_samples: usize,
    /// Seed for the partitioning RNG; fits with the same seed and data are
    /// reproducible across process restarts
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_samples: 256,
            seed: 42,
        }
    }
}

/// A fitted isolation forest.
///
/// Owns the tree ensemble, the calibrated decision threshold, and the seed
/// it was grown from. Never mutated after [`IsolationForest::fit`].
#[derive(Debug)]
pub struct IsolationForest {
    trees: Vec<Tree>,
    subsample: usize,
    threshold: f64,
    contamination: f64,
    seed: u64,
}

impl IsolationForest {
    /// Train an ensemble against a feature matrix and calibrate the decision
    /// threshold from the training scores.
    pub fn fit(
        data: &[Vec<f64>],
        contamination: f64,
        params: &ForestParams,
    ) -> Result<Self, DetectorError> {
        if data.is_empty() {
            return Err(DetectorError::EmptyInput);
        }
        if !(contamination > 0.0 && contamination <= 0.5) {
            return Err(DetectorError::InvalidContamination(contamination));
        }

        let subsample = params.max_samples.min(data.len()).max(1);
        let height_limit = (subsample as f64).log2().ceil().max(1.0) as usize;
        let mut rng = StdRng::seed_from_u64(params.seed);

        let mut trees = Vec::with_capacity(params.n_estimators);
        for _ in 0..params.n_estimators {
            let sample: Vec<&[f64]> = (0..subsample)
                .map(|_| data[rng.gen_range(0..data.len())].as_slice())
                .collect();
            trees.push(Tree::grow(&sample, 0, height_limit, &mut rng));
        }

        let mut forest = Self {
            trees,
            subsample,
            threshold: f64::INFINITY,
            contamination,
            seed: params.seed,
        };
        forest.threshold = forest.calibrate_threshold(data);
        Ok(forest)
    }

    /// Threshold = the k-th highest training score, k = round(contamination * n).
    fn calibrate_threshold(&self, data: &[Vec<f64>]) -> f64 {
        let mut scores: Vec<f64> = data.iter().map(|x| self.score(x)).collect();
        scores.sort_by(|a, b| b.partial_cmp(a).unwrap_or(Ordering::Equal));

        let k = (self.contamination * scores.len() as f64).round() as usize;
        let k = k.clamp(1, scores.len());
        scores[k - 1]
    }

    /// Anomaly score in (0, 1]; higher isolates faster.
    pub fn score(&self, x: &[f64]) -> f64 {
        let expected = average_path_length(self.subsample);
        if self.trees.is_empty() || expected <= 0.0 {
            return 1.0;
        }

        let total: f64 = self.trees.iter().map(|tree| tree.path_length(x)).sum();
        let mean = total / self.trees.len() as f64;
        2.0_f64.powf(-mean / expected)
    }

    /// Thresholded decision: does this sample score as an outlier?
    pub fn is_outlier(&self, x: &[f64]) -> bool {
        self.score(x) >= self.threshold
    }

    /// The frozen decision threshold.
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Configured contamination rate.
    pub fn contamination(&self) -> f64 {
        self.contamination
    }

    /// Seed the ensemble was grown from.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Number of trees in the ensemble.
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}
