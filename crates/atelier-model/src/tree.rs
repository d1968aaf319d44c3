//! Least-squares regression tree
//!
//! Splits are chosen greedily to maximise the L2-regularised gain
//!
//! gain = G_L² / (n_L + λ) + G_R² / (n_R + λ) − G² / (n + λ)
//!
//! where G is the sum of residuals in a node. Leaves predict G / (n + λ).
//!
//! Numeric features are split by threshold. Categorical features are split
//! by a category set: categories are ordered by mean residual and the best
//! prefix of that order goes left. Categories absent from the left set,
//! including unknown ones at inference, go right.

use crate::dataset::ColumnKind;
use ndarray::{Array2, ArrayView1};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const MIN_GAIN: f64 = 1e-12;

/// Tree growth parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TreeParams {
    /// Maximum depth (root at depth 0)
    pub max_depth: usize,
    /// Minimum rows per leaf
    pub min_samples_leaf: usize,
    /// L2 penalty on leaf values
    pub l2_regularization: f64,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: 4,
            min_samples_leaf: 10,
            l2_regularization: 1.0,
        }
    }
}

/// A tree node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    /// Terminal node
    Leaf {
        /// Predicted value
        value: f64,
    },
    /// Numeric split: `x[feature] <= threshold` goes left
    Numeric {
        /// Feature index
        feature: usize,
        /// Split threshold
        threshold: f64,
        /// Left child index
        left: usize,
        /// Right child index
        right: usize,
    },
    /// Categorical split: codes in `categories` go left
    Categorical {
        /// Feature index
        feature: usize,
        /// Sorted category codes sent left
        categories: Vec<u32>,
        /// Left child index
        left: usize,
        /// Right child index
        right: usize,
    },
}

/// A fitted regression tree. Node 0 is the root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<Node>,
}

#[derive(Debug)]
struct Split {
    gain: f64,
    rule: Rule,
    left: Vec<usize>,
    right: Vec<usize>,
}

#[derive(Debug)]
enum Rule {
    Threshold(usize, f64),
    Categories(usize, Vec<u32>),
}

struct Grower<'a> {
    x: &'a Array2<f64>,
    residuals: &'a [f64],
    kinds: &'a [ColumnKind],
    params: TreeParams,
    nodes: Vec<Node>,
}

fn leaf_value(sum: f64, count: usize, lambda: f64) -> f64 {
    sum / (count as f64 + lambda)
}

fn score(sum: f64, count: usize, lambda: f64) -> f64 {
    sum * sum / (count as f64 + lambda)
}

/// Category code stored in a matrix cell.
fn code(value: f64) -> u32 {
    if value.is_finite() && value >= 0.0 {
        value as u32
    } else {
        0
    }
}

impl Grower<'_> {
    fn sum(&self, rows: &[usize]) -> f64 {
        rows.iter().map(|&i| self.residuals[i]).sum()
    }

    fn grow(&mut self, rows: Vec<usize>, depth: usize) -> usize {
        let index = self.nodes.len();
        let lambda = self.params.l2_regularization;
        let total = self.sum(&rows);
        self.nodes.push(Node::Leaf {
            value: leaf_value(total, rows.len(), lambda),
        });

        if depth >= self.params.max_depth || rows.len() < 2 * self.params.min_samples_leaf {
            return index;
        }
        let Some(split) = self.best_split(&rows, total) else {
            return index;
        };

        let left = self.grow(split.left, depth + 1);
        let right = self.grow(split.right, depth + 1);
        self.nodes[index] = match split.rule {
            Rule::Threshold(feature, threshold) => Node::Numeric {
                feature,
                threshold,
                left,
                right,
            },
            Rule::Categories(feature, categories) => Node::Categorical {
                feature,
                categories,
                left,
                right,
            },
        };
        index
    }

    fn best_split(&self, rows: &[usize], total: f64) -> Option<Split> {
        let parent = score(total, rows.len(), self.params.l2_regularization);
        let mut best: Option<Split> = None;

        for (feature, kind) in self.kinds.iter().enumerate() {
            let candidate = match kind {
                ColumnKind::Numeric => self.numeric_split(rows, feature, total, parent),
                ColumnKind::Categorical => self.categorical_split(rows, feature, total, parent),
            };
            if let Some(candidate) = candidate {
                if best.as_ref().is_none_or(|b| candidate.gain > b.gain) {
                    best = Some(candidate);
                }
            }
        }
        best
    }

    fn numeric_split(&self, rows: &[usize], feature: usize, total: f64, parent: f64) -> Option<Split> {
        let column = self.x.column(feature);
        let mut sorted = rows.to_vec();
        sorted.sort_by(|&a, &b| column[a].total_cmp(&column[b]).then(a.cmp(&b)));

        let lambda = self.params.l2_regularization;
        let min_leaf = self.params.min_samples_leaf;
        let n = sorted.len();
        let mut left_sum = 0.0;
        let mut best: Option<(f64, usize)> = None;

        for k in 1..n {
            left_sum += self.residuals[sorted[k - 1]];
            if k < min_leaf || n - k < min_leaf || column[sorted[k - 1]] == column[sorted[k]] {
                continue;
            }
            let gain = score(left_sum, k, lambda) + score(total - left_sum, n - k, lambda) - parent;
            if gain > MIN_GAIN && best.is_none_or(|(g, _)| gain > g) {
                best = Some((gain, k));
            }
        }

        let (gain, k) = best?;
        let threshold = midpoint(column, sorted[k - 1], sorted[k]);
        let right = sorted.split_off(k);
        Some(Split {
            gain,
            rule: Rule::Threshold(feature, threshold),
            left: sorted,
            right,
        })
    }

    fn categorical_split(
        &self,
        rows: &[usize],
        feature: usize,
        total: f64,
        parent: f64,
    ) -> Option<Split> {
        let column = self.x.column(feature);
        let mut groups: BTreeMap<u32, (f64, usize)> = BTreeMap::new();
        for &i in rows {
            let entry = groups.entry(code(column[i])).or_insert((0.0, 0));
            entry.0 += self.residuals[i];
            entry.1 += 1;
        }
        if groups.len() < 2 {
            return None;
        }

        let mut ordered: Vec<(u32, f64, usize)> =
            groups.into_iter().map(|(c, (s, n))| (c, s, n)).collect();
        ordered.sort_by(|a, b| {
            (a.1 / a.2 as f64)
                .total_cmp(&(b.1 / b.2 as f64))
                .then(a.0.cmp(&b.0))
        });

        let lambda = self.params.l2_regularization;
        let min_leaf = self.params.min_samples_leaf;
        let n = rows.len();
        let (mut left_sum, mut left_count) = (0.0, 0usize);
        let mut best: Option<(f64, usize)> = None;

        for (k, &(_, sum, count)) in ordered.iter().enumerate().take(ordered.len() - 1) {
            left_sum += sum;
            left_count += count;
            if left_count < min_leaf || n - left_count < min_leaf {
                continue;
            }
            let gain = score(left_sum, left_count, lambda)
                + score(total - left_sum, n - left_count, lambda)
                - parent;
            if gain > MIN_GAIN && best.is_none_or(|(g, _)| gain > g) {
                best = Some((gain, k + 1));
            }
        }

        let (gain, prefix) = best?;
        let mut categories: Vec<u32> = ordered[..prefix].iter().map(|(c, _, _)| *c).collect();
        categories.sort_unstable();
        let (left, right): (Vec<usize>, Vec<usize>) = rows
            .iter()
            .copied()
            .partition(|&i| categories.binary_search(&code(column[i])).is_ok());

        Some(Split {
            gain,
            rule: Rule::Categories(feature, categories),
            left,
            right,
        })
    }
}

fn midpoint(column: ArrayView1<'_, f64>, a: usize, b: usize) -> f64 {
    column[a] + (column[b] - column[a]) / 2.0
}

impl RegressionTree {
    /// Fit a tree to `residuals` over the given `rows` of `x`.
    pub fn fit(
        x: &Array2<f64>,
        residuals: &[f64],
        rows: Vec<usize>,
        kinds: &[ColumnKind],
        params: TreeParams,
    ) -> Self {
        let mut grower = Grower {
            x,
            residuals,
            kinds,
            params,
            nodes: Vec::new(),
        };
        grower.grow(rows, 0);
        Self {
            nodes: grower.nodes,
        }
    }

    /// Predict one row.
    pub fn predict_row(&self, row: ArrayView1<'_, f64>) -> f64 {
        let mut index = 0;
        loop {
            match self.nodes.get(index) {
                Some(Node::Leaf { value }) => return *value,
                Some(Node::Numeric {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    index = if row[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
                Some(Node::Categorical {
                    feature,
                    categories,
                    left,
                    right,
                }) => {
                    index = if categories.binary_search(&code(row[*feature])).is_ok() {
                        *left
                    } else {
                        *right
                    };
                }
                None => return 0.0,
            }
        }
    }

    /// Nodes, root first.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Number of leaves.
    pub fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf { .. }))
            .count()
    }
}
