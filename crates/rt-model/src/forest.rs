//! Bagged CART regression trees.
//!
//! Each tree is grown on a bootstrap resample of the training rows.  At every
//! node all features are scanned and the split minimizing the summed squared
//! error of the two children is taken; that is the split maximizing
//! `S_l² / n_l + S_r² / n_r`, where `S` is a child's label sum.  Leaves
//! predict the mean label of their rows and the forest averages its trees.
//!
//! Trees are stored flat: node `0` is the root and children always have a
//! larger index than their parent.

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use rt_core::SimRng;

use crate::features::{FEATURE_COUNT, Row};
use crate::{ModelError, ModelResult};

/// Relative gain a split must exceed over its parent.
const MIN_RELATIVE_GAIN: f64 = 1e-12;

// ── Parameters ────────────────────────────────────────────────────────────────

/// Forest hyper-parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestParams {
    pub n_trees: usize,
    /// `None` grows every tree until its leaves are pure or too small.
    pub max_depth: Option<usize>,
    /// Smallest node that may still be split.
    pub min_samples_split: usize,
    /// Smallest number of rows either child of a split may hold.
    pub min_samples_leaf: usize,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees:           200,
            max_depth:         None,
            min_samples_split: 2,
            min_samples_leaf:  1,
        }
    }
}

impl ForestParams {
    pub fn validate(&self) -> ModelResult<()> {
        if self.n_trees == 0 {
            return Err(ModelError::InvalidParams("n_trees must be positive".into()));
        }
        if self.min_samples_split < 2 {
            return Err(ModelError::InvalidParams("min_samples_split must be at least 2".into()));
        }
        if self.min_samples_leaf == 0 {
            return Err(ModelError::InvalidParams("min_samples_leaf must be positive".into()));
        }
        Ok(())
    }
}

// ── RegressionTree ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum TreeNode {
    Leaf {
        value: f64,
    },
    /// Rows with `row[feature] <= threshold` go left.
    Split {
        feature:   usize,
        threshold: f64,
        left:      u32,
        right:     u32,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<TreeNode>,
}

struct SplitChoice {
    feature:   usize,
    threshold: f64,
    score:     f64,
}

impl RegressionTree {
    /// Grow a tree over the rows listed in `sample` (indices may repeat).
    /// `sample` is reordered in place.
    pub fn fit(rows: &[Row], labels: &[f64], sample: &mut [usize], params: &ForestParams) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        if !sample.is_empty() {
            tree.grow(rows, labels, sample, 0, params);
        }
        tree
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes.iter().filter(|n| matches!(n, TreeNode::Leaf { .. })).count()
    }

    /// Descend from the root.  `NaN` for an empty tree.
    pub fn predict(&self, row: &Row) -> f64 {
        let mut at = 0usize;
        loop {
            match self.nodes.get(at) {
                Some(TreeNode::Leaf { value }) => return *value,
                Some(TreeNode::Split { feature, threshold, left, right }) => {
                    let x = row.get(*feature).copied().unwrap_or(f64::NAN);
                    at = if x <= *threshold { *left } else { *right } as usize;
                }
                None => return f64::NAN,
            }
        }
    }

    /// Non-empty, every child index points forward and in range, every
    /// split feature exists.  Guarantees [`predict`](Self::predict) halts.
    pub fn is_well_formed(&self) -> bool {
        !self.nodes.is_empty()
            && self.nodes.iter().enumerate().all(|(i, node)| match node {
                TreeNode::Leaf { value } => value.is_finite(),
                TreeNode::Split { feature, threshold, left, right } => {
                    let ok = |c: u32| (c as usize) > i && (c as usize) < self.nodes.len();
                    *feature < FEATURE_COUNT && !threshold.is_nan() && ok(*left) && ok(*right)
                }
            })
    }

    fn grow(
        &mut self,
        rows: &[Row],
        labels: &[f64],
        sample: &mut [usize],
        depth: usize,
        params: &ForestParams,
    ) -> u32 {
        let id = self.nodes.len() as u32;
        let sum: f64 = sample.iter().map(|&i| labels[i]).sum();
        self.nodes.push(TreeNode::Leaf { value: sum / sample.len() as f64 });

        let may_split = params.max_depth.is_none_or(|d| depth < d)
            && sample.len() >= params.min_samples_split;
        if !may_split {
            return id;
        }
        let Some(split) = best_split(rows, labels, sample, params.min_samples_leaf) else {
            return id;
        };

        let mid = partition(rows, sample, split.feature, split.threshold);
        let (l, r) = sample.split_at_mut(mid);
        let left = self.grow(rows, labels, l, depth + 1, params);
        let right = self.grow(rows, labels, r, depth + 1, params);
        self.nodes[id as usize] = TreeNode::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        id
    }
}

/// Best variance-reducing split of `sample`, or `None` if no split improves
/// on the parent.  Ties keep the first feature and the lowest threshold.
fn best_split(rows: &[Row], labels: &[f64], sample: &mut [usize], min_leaf: usize) -> Option<SplitChoice> {
    let n = sample.len();
    if n < 2 * min_leaf {
        return None;
    }
    let total: f64 = sample.iter().map(|&i| labels[i]).sum();
    let parent = total * total / n as f64;

    let mut best: Option<SplitChoice> = None;
    for feature in 0..FEATURE_COUNT {
        sample.sort_unstable_by(|&a, &b| rows[a][feature].total_cmp(&rows[b][feature]));

        let mut left_sum = 0.0;
        for k in 0..n - 1 {
            left_sum += labels[sample[k]];
            let n_left = k + 1;
            let n_right = n - n_left;
            if n_right < min_leaf {
                break;
            }
            if n_left < min_leaf {
                continue;
            }
            let lo = rows[sample[k]][feature];
            let hi = rows[sample[k + 1]][feature];
            if lo >= hi {
                continue;
            }

            let right_sum = total - left_sum;
            let score = left_sum * left_sum / n_left as f64 + right_sum * right_sum / n_right as f64;
            if best.as_ref().is_none_or(|b| score > b.score) {
                let mut threshold = lo + (hi - lo) / 2.0;
                if threshold >= hi {
                    threshold = lo;
                }
                best = Some(SplitChoice { feature, threshold, score });
            }
        }
    }

    best.filter(|b| b.score - parent > MIN_RELATIVE_GAIN * parent.abs().max(1.0))
}

/// Move rows going left to the front; returns how many there are.
fn partition(rows: &[Row], sample: &mut [usize], feature: usize, threshold: f64) -> usize {
    let mut mid = 0;
    for k in 0..sample.len() {
        if rows[sample[k]][feature] <= threshold {
            sample.swap(k, mid);
            mid += 1;
        }
    }
    mid
}

// ── RandomForest ──────────────────────────────────────────────────────────────

/// Average of bootstrap-trained [`RegressionTree`]s.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    params: ForestParams,
    trees:  Vec<RegressionTree>,
}

impl RandomForest {
    /// Train on `rows`/`labels`.  Tree `t` draws its bootstrap sample from
    /// `rng.child(t)`, so a seed fixes the whole forest.
    pub fn fit(rows: &[Row], labels: &[f64], params: ForestParams, rng: &mut SimRng) -> ModelResult<Self> {
        params.validate()?;
        if rows.is_empty() {
            return Err(ModelError::EmptyTrainingSet);
        }
        if rows.len() != labels.len() {
            return Err(ModelError::InvalidParams(format!(
                "{} rows but {} labels",
                rows.len(),
                labels.len()
            )));
        }

        let tree_rngs: Vec<SimRng> = (0..params.n_trees).map(|t| rng.child(t as u64)).collect();
        let grow = |mut tree_rng: SimRng| {
            let mut sample = tree_rng.bootstrap_indices(rows.len(), rows.len());
            RegressionTree::fit(rows, labels, &mut sample, &params)
        };

        #[cfg(feature = "parallel")]
        let trees = tree_rngs.into_par_iter().map(grow).collect();
        #[cfg(not(feature = "parallel"))]
        let trees = tree_rngs.into_iter().map(grow).collect();

        Ok(Self { params, trees })
    }

    pub fn params(&self) -> &ForestParams {
        &self.params
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn trees(&self) -> &[RegressionTree] {
        &self.trees
    }

    /// Mean of the tree predictions.  `NaN` for a forest without trees.
    pub fn predict(&self, row: &Row) -> f64 {
        if self.trees.is_empty() {
            return f64::NAN;
        }
        self.trees.iter().map(|t| t.predict(row)).sum::<f64>() / self.trees.len() as f64
    }

    pub fn is_well_formed(&self) -> bool {
        !self.trees.is_empty() && self.trees.iter().all(RegressionTree::is_well_formed)
    }
}
