//! Feature schema, categorical encoding and the training dataset.
//!
//! Categorical columns are mapped to integer codes learnt at fit time.
//! Code 0 is reserved for values never seen during training (and for nulls
//! or an absent column), so a model trained on one store list can score a
//! table with new stores.

use crate::error::{ModelError, Result};
use ndarray::Array2;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Code of an unseen or missing category.
pub const UNKNOWN_CATEGORY: u32 = 0;

/// How a column is read by the trees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnKind {
    /// Ordered value split by threshold
    Numeric,
    /// Unordered value split by category set
    Categorical,
}

/// Ordered feature names and their kinds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSchema {
    names: Vec<String>,
    kinds: Vec<ColumnKind>,
}

impl FeatureSchema {
    /// Build a schema; names listed in `categorical` become categorical.
    pub fn new<S: AsRef<str>>(features: &[S], categorical: &[S]) -> Result<Self> {
        let categorical: BTreeSet<&str> = categorical.iter().map(AsRef::as_ref).collect();
        let names: Vec<String> = features.iter().map(|f| f.as_ref().to_string()).collect();

        let unique: BTreeSet<&str> = names.iter().map(String::as_str).collect();
        if unique.len() != names.len() {
            return Err(ModelError::InvalidParameter(
                "feature names must be unique".to_string(),
            ));
        }
        if let Some(stray) = categorical.iter().find(|c| !unique.contains(*c)) {
            return Err(ModelError::InvalidParameter(format!(
                "categorical feature {stray} is not in the feature list"
            )));
        }

        let kinds = names
            .iter()
            .map(|n| {
                if categorical.contains(n.as_str()) {
                    ColumnKind::Categorical
                } else {
                    ColumnKind::Numeric
                }
            })
            .collect();
        Ok(Self { names, kinds })
    }

    /// Feature names in model order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Column kinds aligned with [`FeatureSchema::names`].
    pub fn kinds(&self) -> &[ColumnKind] {
        &self.kinds
    }

    /// Names of the categorical features.
    pub fn categorical(&self) -> Vec<String> {
        self.names
            .iter()
            .zip(&self.kinds)
            .filter(|(_, k)| **k == ColumnKind::Categorical)
            .map(|(n, _)| n.clone())
            .collect()
    }

    /// Number of features.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the schema has no features.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Learnt categorical vocabularies plus the schema they belong to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureEncoder {
    schema: FeatureSchema,
    /// Per feature: value -> code for categoricals, `None` for numerics
    vocabularies: Vec<Option<BTreeMap<String, u32>>>,
}

impl FeatureEncoder {
    /// Learn vocabularies from `df`. Every schema column must be present.
    pub fn fit(schema: FeatureSchema, df: &DataFrame) -> Result<Self> {
        let mut vocabularies = Vec::with_capacity(schema.len());
        for (name, kind) in schema.names().iter().zip(schema.kinds()) {
            let column = df
                .column(name)
                .map_err(|_| ModelError::MissingColumn(name.clone()))?;
            let vocabulary = match kind {
                ColumnKind::Numeric => None,
                ColumnKind::Categorical => {
                    let values = column.cast(&DataType::String)?;
                    let distinct: BTreeSet<&str> = values.str()?.into_iter().flatten().collect();
                    Some(
                        distinct
                            .into_iter()
                            .zip(1u32..)
                            .map(|(v, code)| (v.to_string(), code))
                            .collect(),
                    )
                }
            };
            vocabularies.push(vocabulary);
        }
        Ok(Self {
            schema,
            vocabularies,
        })
    }

    /// Schema the encoder was fitted on.
    pub const fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    /// Number of known categories per feature (0 for numerics).
    pub fn cardinalities(&self) -> Vec<usize> {
        self.vocabularies
            .iter()
            .map(|v| v.as_ref().map_or(0, BTreeMap::len))
            .collect()
    }

    /// Encode `df` into a dense row-major matrix.
    ///
    /// Numeric columns must exist; their nulls read as 0. Categorical
    /// columns may be absent; absent, null and unseen values read as
    /// [`UNKNOWN_CATEGORY`].
    pub fn transform(&self, df: &DataFrame) -> Result<Array2<f64>> {
        let height = df.height();
        let mut matrix = Array2::<f64>::zeros((height, self.schema.len()));

        for (j, (name, vocabulary)) in self
            .schema
            .names()
            .iter()
            .zip(&self.vocabularies)
            .enumerate()
        {
            match vocabulary {
                None => {
                    let column = df
                        .column(name)
                        .map_err(|_| ModelError::MissingColumn(name.clone()))?;
                    let values = column.cast(&DataType::Float64)?;
                    for (i, v) in values.f64()?.into_iter().enumerate() {
                        matrix[[i, j]] = v.filter(|x| x.is_finite()).unwrap_or(0.0);
                    }
                }
                Some(vocabulary) => {
                    let Ok(column) = df.column(name) else {
                        continue;
                    };
                    let values = column.cast(&DataType::String)?;
                    for (i, v) in values.str()?.into_iter().enumerate() {
                        let code = v
                            .and_then(|s| vocabulary.get(s).copied())
                            .unwrap_or(UNKNOWN_CATEGORY);
                        matrix[[i, j]] = f64::from(code);
                    }
                }
            }
        }

        Ok(matrix)
    }
}

/// Encoded features, targets and the calendar period of every row.
#[derive(Debug, Clone)]
pub struct Dataset {
    /// Row-major feature matrix
    pub features: Array2<f64>,
    /// Target per row
    pub targets: Vec<f64>,
    /// Period index per row (`year * 12 + month - 1`)
    pub periods: Vec<i32>,
    /// Column kinds aligned with the matrix columns
    pub kinds: Vec<ColumnKind>,
}

impl Dataset {
    /// Assemble a dataset, checking that every part has one entry per row.
    pub fn new(
        features: Array2<f64>,
        targets: Vec<f64>,
        periods: Vec<i32>,
        kinds: Vec<ColumnKind>,
    ) -> Result<Self> {
        let rows = features.nrows();
        if targets.len() != rows || periods.len() != rows {
            return Err(ModelError::LengthMismatch {
                rows,
                targets: targets.len(),
            });
        }
        if kinds.len() != features.ncols() {
            return Err(ModelError::InvalidParameter(format!(
                "{} column kinds for {} feature columns",
                kinds.len(),
                features.ncols()
            )));
        }
        Ok(Self {
            features,
            targets,
            periods,
            kinds,
        })
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// Whether the dataset has no rows.
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Subset of rows, in the given order.
    pub fn select(&self, rows: &[usize]) -> Self {
        Self {
            features: self.features.select(ndarray::Axis(0), rows),
            targets: rows.iter().map(|&i| self.targets[i]).collect(),
            periods: rows.iter().map(|&i| self.periods[i]).collect(),
            kinds: self.kinds.clone(),
        }
    }

    /// Distinct periods in ascending order.
    pub fn distinct_periods(&self) -> Vec<i32> {
        let set: BTreeSet<i32> = self.periods.iter().copied().collect();
        set.into_iter().collect()
    }
}
