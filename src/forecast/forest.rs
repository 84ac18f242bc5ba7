/// Bagged regression trees.
///
/// Every tree is a CART regressor (squared-error criterion, midpoint
/// thresholds, all features considered at each split) trained on a bootstrap
/// resample of the training set. The ensemble predicts the mean of its trees.
///
/// Tree `k` draws its bootstrap with `ChaCha8Rng::seed_from_u64(seed + k)`,
/// and trees are stored by index, so a fit is reproducible bit for bit no
/// matter how the worker threads are scheduled.

use crate::forecast::windows::Samples;
use crate::model::ForecastError;
use ndarray::{Array1, ArrayView1, ArrayView2};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::sync::{Arc, mpsc};
use threadpool::ThreadPool;

/// Impurity below which a node is treated as pure.
const PURE_NODE_VARIANCE: f64 = f64::EPSILON;

#[derive(Debug, Clone)]
pub struct ForestParams {
    pub trees: usize,
    pub seed: u64,
    pub max_depth: Option<usize>,
    pub min_samples_leaf: usize,
    pub workers: usize,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            trees: 30,
            seed: 42,
            max_depth: None,
            min_samples_leaf: 1,
            workers: 4,
        }
    }
}

// ---------------------------------------------------------------------------
// Single tree
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegressionTree {
    nodes: Vec<Node>,
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    score: f64,
}

impl RegressionTree {
    /// Grows a tree over the rows of `features` listed in `indices`
    /// (repeats allowed).
    pub fn fit(
        features: ArrayView2<f64>,
        labels: ArrayView1<f64>,
        indices: Vec<usize>,
        max_depth: Option<usize>,
        min_samples_leaf: usize,
    ) -> Self {
        let min_leaf = min_samples_leaf.max(1);
        let mut nodes = vec![Node::Leaf { value: 0.0 }];
        let mut pending = vec![(0usize, indices, 0usize)];
        let mut buffer: Vec<(f64, f64)> = Vec::new();

        while let Some((slot, idx, depth)) = pending.pop() {
            let n = idx.len();
            let sum: f64 = idx.iter().map(|&i| labels[i]).sum();
            let sum_sq: f64 = idx.iter().map(|&i| labels[i].powi(2)).sum();
            let mean = if n > 0 { sum / n as f64 } else { 0.0 };
            let variance = if n > 0 { sum_sq / n as f64 - mean * mean } else { 0.0 };

            let depth_reached = max_depth.is_some_and(|d| depth >= d);
            if depth_reached || n < 2 || n < 2 * min_leaf || variance <= PURE_NODE_VARIANCE {
                nodes[slot] = Node::Leaf { value: mean };
                continue;
            }

            let Some(best) = best_split(features, labels, &idx, sum, min_leaf, &mut buffer) else {
                nodes[slot] = Node::Leaf { value: mean };
                continue;
            };

            let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = idx
                .into_iter()
                .partition(|&i| features[[i, best.feature]] <= best.threshold);

            let left = nodes.len();
            nodes.push(Node::Leaf { value: 0.0 });
            let right = nodes.len();
            nodes.push(Node::Leaf { value: 0.0 });

            nodes[slot] = Node::Split {
                feature: best.feature,
                threshold: best.threshold,
                left,
                right,
            };
            pending.push((right, right_idx, depth + 1));
            pending.push((left, left_idx, depth + 1));
        }

        Self { nodes }
    }

    pub fn predict(&self, x: ArrayView1<f64>) -> f64 {
        let mut at = 0;
        loop {
            match &self.nodes[at] {
                Node::Leaf { value } => return *value,
                Node::Split { feature, threshold, left, right } => {
                    at = if x[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

/// Exhaustive search for the split minimizing the summed squared error of
/// the two children. Ties keep the earliest feature and threshold.
fn best_split(
    features: ArrayView2<f64>,
    labels: ArrayView1<f64>,
    idx: &[usize],
    total: f64,
    min_leaf: usize,
    buffer: &mut Vec<(f64, f64)>,
) -> Option<BestSplit> {
    let n = idx.len();
    let mut best: Option<BestSplit> = None;

    for (feature, column) in features.columns().into_iter().enumerate() {
        buffer.clear();
        buffer.extend(idx.iter().map(|&i| (column[i], labels[i])));
        buffer.sort_by(|a, b| a.0.total_cmp(&b.0));

        if buffer[0].0 == buffer[n - 1].0 {
            continue;
        }

        let mut left_sum = 0.0;
        for k in 0..n - 1 {
            left_sum += buffer[k].1;
            let left_n = k + 1;
            let right_n = n - left_n;

            if buffer[k].0 == buffer[k + 1].0 || left_n < min_leaf || right_n < min_leaf {
                continue;
            }

            // Maximizing this is equivalent to minimizing child SSE
            let right_sum = total - left_sum;
            let score = left_sum * left_sum / left_n as f64 + right_sum * right_sum / right_n as f64;

            if best.as_ref().is_none_or(|b| score > b.score) {
                let (lo, hi) = (buffer[k].0, buffer[k + 1].0);
                let mut threshold = lo / 2.0 + hi / 2.0;
                if threshold == hi || !threshold.is_finite() {
                    threshold = lo;
                }
                best = Some(BestSplit { feature, threshold, score });
            }
        }
    }

    best
}

// ---------------------------------------------------------------------------
// Ensemble
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct RandomForest {
    trees: Vec<RegressionTree>,
}

impl RandomForest {
    /// Trains `params.trees` trees on bootstrap resamples of `samples`.
    ///
    /// # Errors
    /// `ForecastError::Modeling` when there are no samples or a training job
    /// died before reporting its tree.
    pub fn fit(samples: Arc<Samples>, params: &ForestParams) -> Result<Self, ForecastError> {
        if samples.is_empty() {
            return Err(ForecastError::Modeling("No training samples".to_string()));
        }

        let tree_count = params.trees.max(1);
        let pool = ThreadPool::new(params.workers.clamp(1, tree_count));
        let (tx, rx) = mpsc::channel();

        for k in 0..tree_count {
            let tx = tx.clone();
            let samples = Arc::clone(&samples);
            let seed = params.seed.wrapping_add(k as u64);
            let max_depth = params.max_depth;
            let min_leaf = params.min_samples_leaf;

            pool.execute(move || {
                let indices = bootstrap(samples.len(), seed);
                let tree = RegressionTree::fit(
                    samples.features(),
                    samples.labels(),
                    indices,
                    max_depth,
                    min_leaf,
                );
                let _ = tx.send((k, tree));
            });
        }
        drop(tx);

        let mut slots: Vec<Option<RegressionTree>> = vec![None; tree_count];
        for (k, tree) in rx.iter() {
            slots[k] = Some(tree);
        }

        let trees: Option<Vec<RegressionTree>> = slots.into_iter().collect();
        let trees = trees.ok_or_else(|| {
            ForecastError::Modeling("A tree training job ended without a result".to_string())
        })?;

        Ok(Self { trees })
    }

    pub fn predict(&self, x: ArrayView1<f64>) -> f64 {
        let total: f64 = self.trees.iter().map(|t| t.predict(x)).sum();
        total / self.trees.len() as f64
    }

    /// One prediction per row of `features`.
    pub fn predict_all(&self, features: ArrayView2<f64>) -> Array1<f64> {
        features.outer_iter().map(|row| self.predict(row)).collect()
    }

    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }
}

/// Draws `n` indices uniformly from `[0, n)` with replacement.
fn bootstrap(n: usize, seed: u64) -> Vec<usize> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..n).map(|_| rng.gen_range(0..n)).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
