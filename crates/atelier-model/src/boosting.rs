//! Gradient-boosted regression trees
//!
//! Squared-error boosting: start from the mean target, then fit each tree to
//! the current residuals and add it with shrinkage `learning_rate`.
//! Row subsampling draws from a `StdRng` seeded by `seed`, so a given dataset
//! and parameter set always produce the same model.

use crate::dataset::{ColumnKind, Dataset};
use crate::error::{ModelError, Result};
use crate::tree::{RegressionTree, TreeParams};
use ndarray::Array2;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::index::sample;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A regression model that can be fitted and applied.
pub trait Regressor {
    /// Fit the model to a dataset.
    fn fit(&mut self, data: &Dataset) -> Result<()>;

    /// Predict every row of an encoded feature matrix.
    fn predict(&self, features: &Array2<f64>) -> Result<Vec<f64>>;

    /// Model family name.
    fn name(&self) -> &str;
}

/// Boosting parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoosterParams {
    /// Number of trees
    pub n_estimators: usize,
    /// Shrinkage per tree
    pub learning_rate: f64,
    /// Per-tree growth limits
    pub tree: TreeParams,
    /// Share of rows drawn per tree, in (0, 1]
    pub subsample: f64,
    /// Seed of the subsampling generator
    pub seed: u64,
}

impl Default for BoosterParams {
    fn default() -> Self {
        Self {
            n_estimators: 200,
            learning_rate: 0.05,
            tree: TreeParams::default(),
            subsample: 0.8,
            seed: 42,
        }
    }
}

impl BoosterParams {
    /// Check parameter ranges.
    pub fn validate(&self) -> Result<()> {
        if self.n_estimators == 0 {
            return Err(ModelError::InvalidParameter(
                "n_estimators must be positive".to_string(),
            ));
        }
        if !(self.learning_rate > 0.0 && self.learning_rate <= 1.0) {
            return Err(ModelError::InvalidParameter(format!(
                "learning_rate must be in (0, 1], got {}",
                self.learning_rate
            )));
        }
        if !(self.subsample > 0.0 && self.subsample <= 1.0) {
            return Err(ModelError::InvalidParameter(format!(
                "subsample must be in (0, 1], got {}",
                self.subsample
            )));
        }
        if self.tree.min_samples_leaf == 0 || self.tree.l2_regularization < 0.0 {
            return Err(ModelError::InvalidParameter(
                "min_samples_leaf must be positive and l2_regularization non-negative"
                    .to_string(),
            ));
        }
        Ok(())
    }
}

/// Boosted tree ensemble.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoostedTrees {
    params: BoosterParams,
    base_score: f64,
    trees: Vec<RegressionTree>,
    n_features: usize,
}

impl GradientBoostedTrees {
    /// Create an unfitted model.
    pub const fn new(params: BoosterParams) -> Self {
        Self {
            params,
            base_score: 0.0,
            trees: Vec::new(),
            n_features: 0,
        }
    }

    /// Parameters in use.
    pub const fn params(&self) -> &BoosterParams {
        &self.params
    }

    /// Fitted trees.
    pub fn trees(&self) -> &[RegressionTree] {
        &self.trees
    }

    /// Whether the model has been fitted.
    pub fn is_fitted(&self) -> bool {
        !self.trees.is_empty()
    }

    fn predict_row(&self, row: ndarray::ArrayView1<'_, f64>) -> f64 {
        let lr = self.params.learning_rate;
        self.base_score + self.trees.iter().map(|t| lr * t.predict_row(row)).sum::<f64>()
    }
}

impl Regressor for GradientBoostedTrees {
    fn fit(&mut self, data: &Dataset) -> Result<()> {
        self.params.validate()?;
        if data.is_empty() {
            return Err(ModelError::InvalidParameter(
                "cannot fit on an empty dataset".to_string(),
            ));
        }

        let n = data.len();
        let x = &data.features;
        let kinds: &[ColumnKind] = &data.kinds;
        let lr = self.params.learning_rate;
        let draw = ((n as f64 * self.params.subsample).round() as usize).clamp(1, n);
        let mut rng = StdRng::seed_from_u64(self.params.seed);

        self.base_score = data.targets.iter().sum::<f64>() / n as f64;
        self.n_features = x.ncols();
        self.trees.clear();

        let mut fitted = vec![self.base_score; n];
        let mut residuals = vec![0.0; n];

        for round in 0..self.params.n_estimators {
            for ((r, y), f) in residuals.iter_mut().zip(&data.targets).zip(&fitted) {
                *r = y - f;
            }

            let rows = if draw == n {
                (0..n).collect()
            } else {
                let mut rows = sample(&mut rng, n, draw).into_vec();
                rows.sort_unstable();
                rows
            };

            let tree = RegressionTree::fit(x, &residuals, rows, kinds, self.params.tree);
            for (i, f) in fitted.iter_mut().enumerate() {
                *f += lr * tree.predict_row(x.row(i));
            }
            if round == 0 {
                debug!(leaves = tree.n_leaves(), rows = draw, "Fitted first tree");
            }
            self.trees.push(tree);
        }

        Ok(())
    }

    fn predict(&self, features: &Array2<f64>) -> Result<Vec<f64>> {
        if !self.is_fitted() {
            return Err(ModelError::NotFitted);
        }
        if features.ncols() != self.n_features {
            return Err(ModelError::InvalidParameter(format!(
                "expected {} feature columns, got {}",
                self.n_features,
                features.ncols()
            )));
        }
        Ok(features.rows().into_iter().map(|r| self.predict_row(r)).collect())
    }

    fn name(&self) -> &str {
        "gradient_boosted_trees"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::r2_score;
    use rand::Rng;

    fn synthetic(n: usize, seed: u64) -> Dataset {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut x = Array2::<f64>::zeros((n, 2));
        let mut y = Vec::with_capacity(n);
        for i in 0..n {
            let a: f64 = rng.gen_range(0.0..10.0);
            let store = (i % 3) as f64 + 1.0;
            x[[i, 0]] = a;
            x[[i, 1]] = store;
            let effect = if store == 2.0 { 20.0 } else { 0.0 };
            y.push(3.0 * a + effect);
        }
        Dataset::new(
            x,
            y,
            vec![0; n],
            vec![ColumnKind::Numeric, ColumnKind::Categorical],
        )
        .unwrap()
    }

    fn params() -> BoosterParams {
        BoosterParams {
            n_estimators: 60,
            learning_rate: 0.2,
            tree: TreeParams {
                max_depth: 3,
                min_samples_leaf: 3,
                l2_regularization: 1.0,
            },
            subsample: 0.8,
            seed: 7,
        }
    }

    #[test]
    fn test_fits_numeric_and_categorical_signal() {
        let data = synthetic(150, 1);
        let mut model = GradientBoostedTrees::new(params());
        model.fit(&data).unwrap();

        let pred = model.predict(&data.features).unwrap();
        assert!(r2_score(&data.targets, &pred) > 0.95);
        assert_eq!(model.trees().len(), 60);
    }

    #[test]
    fn test_same_seed_same_model() {
        let data = synthetic(80, 2);
        let mut a = GradientBoostedTrees::new(params());
        let mut b = GradientBoostedTrees::new(params());
        a.fit(&data).unwrap();
        b.fit(&data).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_unfitted_and_shape_errors() {
        let model = GradientBoostedTrees::new(params());
        assert!(matches!(
            model.predict(&Array2::zeros((1, 2))),
            Err(ModelError::NotFitted)
        ));

        let mut model = GradientBoostedTrees::new(params());
        model.fit(&synthetic(30, 3)).unwrap();
        assert!(model.predict(&Array2::zeros((1, 3))).is_err());
    }

    #[test]
    fn test_invalid_params() {
        let bad = BoosterParams {
            learning_rate: 0.0,
            ..params()
        };
        assert!(bad.validate().is_err());
        let bad = BoosterParams {
            subsample: 1.5,
            ..params()
        };
        assert!(bad.validate().is_err());
    }
}
