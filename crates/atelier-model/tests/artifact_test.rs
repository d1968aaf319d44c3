//! Train, persist, reload and score a model.

use atelier_model::{
    ArtifactStore, CandidateConfig, ModelError, TrainerConfig, predict_with_ceiling,
    predict_with_constraints, train_robust_model,
};
use polars::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::PathBuf;

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("atelier-model-{name}-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

fn config() -> TrainerConfig {
    let mut fast = CandidateConfig::shallow();
    fast.params.n_estimators = 40;
    fast.params.tree.min_samples_leaf = 5;
    let mut slow = CandidateConfig::conservative();
    slow.params.n_estimators = 10;
    TrainerConfig {
        candidates: vec![slow, fast],
        ..TrainerConfig::default()
    }
}

/// Three stores over 24 months; T02 sells twice as much, demand peaks in summer.
fn history() -> (DataFrame, Vec<Option<f64>>) {
    let mut rng = StdRng::seed_from_u64(11);
    let (mut years, mut months, mut stores, mut margins, mut y) =
        (Vec::new(), Vec::new(), Vec::new(), Vec::new(), Vec::new());
    for i in 0..24 {
        for store in ["T01", "T02", "T03"] {
            let month = i % 12 + 1;
            let base = if (3..=8).contains(&month) { 40.0 } else { 15.0 };
            let scale = if store == "T02" { 2.0 } else { 1.0 };
            years.push(2023 + i / 12);
            months.push(month);
            stores.push(store);
            margins.push(rng.gen_range(10.0..20.0));
            y.push(Some(base * scale + rng.gen_range(-2.0..2.0)));
        }
    }
    let df = DataFrame::new(vec![
        Column::new("year".into(), years),
        Column::new("month".into(), months),
        Column::new("store".into(), stores),
        Column::new("unit_margin".into(), margins),
        Column::new("qty_net".into(), y.clone()),
    ])
    .unwrap();
    (df, y)
}

fn features() -> Vec<String> {
    ["month", "unit_margin", "store"].map(String::from).to_vec()
}

#[test]
fn test_train_save_load_predict() {
    let (df, y) = history();
    let model = train_robust_model(
        &df,
        &features(),
        &y,
        &["store".to_string()],
        "IN SEASON",
        "qty_in_season",
        &config(),
    )
    .unwrap()
    .expect("enough data to train");

    assert!(model.descriptor.validation.r2 > 0.5);
    assert!(model.descriptor.validation.cv_r2.is_finite());
    assert_eq!(model.descriptor.validation.cv_fold_r2.len(), 3);

    let store = ArtifactStore::new(scratch_dir("roundtrip"));
    store.save(&model).unwrap();
    assert_eq!(store.list().unwrap(), vec!["qty_in_season"]);

    let descriptor = store.load_descriptor("qty_in_season").unwrap();
    assert_eq!(descriptor, model.descriptor);

    let loaded = store.load("qty_in_season").unwrap();
    let before = predict_with_constraints(&model, &df).unwrap();
    let after = predict_with_constraints(&loaded, &df).unwrap();
    assert_eq!(before, after);
    assert!(before.iter().all(|p| *p >= 0.0));

    let _ = std::fs::remove_dir_all(store.dir());
}

#[test]
fn test_scoring_table_with_unknown_store_and_nulls() {
    let (df, y) = history();
    let model = train_robust_model(
        &df,
        &features(),
        &y,
        &["store".to_string()],
        "IN SEASON",
        "qty_in_season",
        &config(),
    )
    .unwrap()
    .unwrap();

    let scoring = DataFrame::new(vec![
        Column::new("month".into(), vec![Some(7i32), None]),
        Column::new("unit_margin".into(), vec![None, Some(12.0)]),
        Column::new("store".into(), vec!["T99", "T01"]),
    ])
    .unwrap();
    let predictions = predict_with_constraints(&model, &scoring).unwrap();
    assert_eq!(predictions.len(), 2);
    assert!(predictions.iter().all(|p| p.is_finite() && *p >= 0.0));

    // no categorical column at all
    let no_store = scoring.drop("store").unwrap();
    assert_eq!(predict_with_constraints(&model, &no_store).unwrap().len(), 2);

    // numeric columns are required
    let no_margin = scoring.drop("unit_margin").unwrap();
    assert!(matches!(
        predict_with_constraints(&model, &no_margin),
        Err(ModelError::MissingColumn(c)) if c == "unit_margin"
    ));
}

#[test]
fn test_ceiling_bounds_predictions() {
    let (df, y) = history();
    let model = train_robust_model(
        &df,
        &features(),
        &y,
        &["store".to_string()],
        "IN SEASON",
        "qty_in_season",
        &config(),
    )
    .unwrap()
    .unwrap();

    let ceiling = predict_with_ceiling(&model, &df, 2.0).unwrap();
    assert!(ceiling.iter().all(|p| *p <= 6.0 + 1e-12));
}

#[test]
fn test_zero_targets_can_be_kept() {
    let (df, _) = history();
    let zeros = vec![Some(0.0); df.height()];

    let dropped = train_robust_model(
        &df,
        &features(),
        &zeros,
        &["store".to_string()],
        "OUT OF SEASON",
        "qty_out_of_season",
        &config(),
    )
    .unwrap();
    assert!(dropped.is_none());

    let kept = train_robust_model(
        &df,
        &features(),
        &zeros,
        &["store".to_string()],
        "OUT OF SEASON",
        "qty_out_of_season",
        &TrainerConfig {
            drop_zero_targets: false,
            ..config()
        },
    )
    .unwrap()
    .unwrap();
    assert_eq!(kept.descriptor.validation.n_samples, df.height());
    assert!((kept.descriptor.validation.r2 - 1.0).abs() < 1e-12);
}
