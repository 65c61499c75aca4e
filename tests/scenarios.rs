use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use microgbt::{Gbt, GbtError, Matrix};

fn params(pairs: &[(&str, f64)]) -> HashMap<String, f64> {
    pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

/// S1: a synthetic regression problem (a linear target plus noise
/// across a handful of features) should fit well enough that the
/// trained booster beats a constant-mean baseline on held-out rows.
#[test]
fn s1_synthetic_regression_beats_the_mean_baseline() {
    let mut rng = StdRng::seed_from_u64(1);
    let rows = 400;
    let cols = 4;
    let mut data = Vec::with_capacity(rows * cols);
    let mut y = Vec::with_capacity(rows);
    for _ in 0..rows {
        let mut features = Vec::with_capacity(cols);
        for _ in 0..cols {
            features.push(rng.gen_range(-5.0..5.0));
        }
        let target: f64 = 3.0 * features[0] - 2.0 * features[1] + features[2]
            + rng.gen_range(-0.25..0.25);
        data.extend_from_slice(&features);
        y.push(target);
    }

    let split = rows * 3 / 4;
    let x_train = Matrix::new(&data[..split * cols], split, cols);
    let y_train = &y[..split];
    let x_valid = Matrix::new(&data[split * cols..], rows - split, cols);
    let y_valid = &y[split..];

    let mut gbt = Gbt::construct(&params(&[
        ("num_boosting_rounds", 60.0),
        ("max_depth", 4.0),
        ("learning_rate", 0.2),
        ("metric", 1.0),
    ]))
    .unwrap();
    gbt.train(&x_train, y_train, &x_valid, y_valid, 60, 10).unwrap();

    let mean: f64 = y_train.iter().sum::<f64>() / y_train.len() as f64;
    let baseline_sse: f64 = y_valid.iter().map(|&v| (v - mean).powi(2)).sum();

    let k = gbt.best_iteration();
    let model_sse: f64 = (0..x_valid.rows)
        .map(|i| {
            let pred = gbt.predict(x_valid.row(i), k).unwrap();
            (y_valid[i] - pred).powi(2)
        })
        .sum();

    assert!(
        model_sse < baseline_sse,
        "model sse {model_sse} should beat baseline sse {baseline_sse}"
    );
}

/// S2: a synthetic binary classification problem (standing in for a
/// small tabular dataset such as Titanic survival) should separate the
/// two classes well enough to beat random-guess log-loss.
#[test]
fn s2_synthetic_binary_classification_separates_classes() {
    let mut rng = StdRng::seed_from_u64(2);
    let rows = 300;
    let cols = 3;
    let mut data = Vec::with_capacity(rows * cols);
    let mut y = Vec::with_capacity(rows);
    for _ in 0..rows {
        let label = if rng.gen_bool(0.5) { 1.0 } else { 0.0 };
        let center = if label > 0.5 { 3.0 } else { -3.0 };
        let mut features = Vec::with_capacity(cols);
        for _ in 0..cols {
            features.push(center + rng.gen_range(-1.5..1.5));
        }
        data.extend_from_slice(&features);
        y.push(label);
    }

    let split = rows * 3 / 4;
    let x_train = Matrix::new(&data[..split * cols], split, cols);
    let y_train = &y[..split];
    let x_valid = Matrix::new(&data[split * cols..], rows - split, cols);
    let y_valid = &y[split..];

    let mut gbt = Gbt::construct(&params(&[
        ("metric", 0.0),
        ("num_boosting_rounds", 40.0),
        ("max_depth", 3.0),
        ("learning_rate", 0.3),
    ]))
    .unwrap();
    gbt.train(&x_train, y_train, &x_valid, y_valid, 40, 8).unwrap();

    let k = gbt.best_iteration();
    let mut correct = 0;
    for i in 0..x_valid.rows {
        let p = gbt.predict(x_valid.row(i), k).unwrap();
        let predicted = if p >= 0.5 { 1.0 } else { 0.0 };
        if predicted == y_valid[i] {
            correct += 1;
        }
    }
    let accuracy = correct as f64 / x_valid.rows as f64;
    assert!(accuracy > 0.8, "accuracy {accuracy} should exceed 0.8");
}

/// S3: a constant target should fit to that constant almost exactly,
/// since every tree's leaf weight collapses to a tiny residual.
#[test]
fn s3_constant_target_is_learned_as_a_constant() {
    let x_data: Vec<f64> = (0..50).map(|i| (i % 7) as f64).collect();
    let y = vec![4.2; 50];
    let x = Matrix::new(&x_data, 50, 1);
    let empty_x = Matrix::new(&[], 0, 1);

    let mut gbt = Gbt::construct(&params(&[
        ("num_boosting_rounds", 15.0),
        ("metric", 1.0),
    ]))
    .unwrap();
    gbt.train(&x, &y, &empty_x, &[], 15, 0).unwrap();

    let k = gbt.best_iteration();
    for i in 0..50 {
        let pred = gbt.predict(&[x_data[i]], k).unwrap();
        assert!((pred - 4.2).abs() < 0.05, "prediction {pred} should be near 4.2");
    }
}

/// S4: a single feature with two well-separated clusters should be
/// split cleanly by the first tree, regardless of how many rounds
/// follow.
#[test]
fn s4_single_feature_two_clusters_separates_on_the_first_split() {
    let x_data: Vec<f64> = (0..40)
        .map(|i| if i < 20 { i as f64 } else { i as f64 + 1000.0 })
        .collect();
    let y: Vec<f64> = (0..40).map(|i| if i < 20 { -10.0 } else { 10.0 }).collect();
    let x = Matrix::new(&x_data, 40, 1);
    let empty_x = Matrix::new(&[], 0, 1);

    let mut gbt = Gbt::construct(&params(&[
        ("num_boosting_rounds", 5.0),
        ("max_depth", 1.0),
        ("metric", 1.0),
    ]))
    .unwrap();
    gbt.train(&x, &y, &empty_x, &[], 5, 0).unwrap();

    let k = gbt.best_iteration();
    for i in 0..40 {
        let pred = gbt.predict(&[x_data[i]], k).unwrap();
        if i < 20 {
            assert!(pred < 0.0);
        } else {
            assert!(pred > 0.0);
        }
    }
}

/// S5: mismatched feature/label shapes must raise `ShapeMismatch`
/// rather than panicking.
#[test]
fn s5_mismatched_shapes_raise_shape_mismatch() {
    let x = Matrix::new(&[1.0, 2.0, 3.0, 4.0], 4, 1);
    let y = vec![1.0, 2.0, 3.0]; // one short
    let empty_x = Matrix::new(&[], 0, 1);

    let mut gbt = Gbt::construct(&HashMap::new()).unwrap();
    let err = gbt.train(&x, &y, &empty_x, &[], 5, 0).unwrap_err();
    assert!(matches!(err, GbtError::ShapeMismatch(_)));
}

/// S6: predicting with more trees than were ever built raises
/// `IndexOutOfRange`; predicting with exactly `best_iteration()`
/// always succeeds.
#[test]
fn s6_predict_beyond_trained_rounds_is_out_of_range() {
    let x_data: Vec<f64> = (0..30).map(|i| i as f64).collect();
    let y: Vec<f64> = x_data.iter().map(|&v| v * 0.5).collect();
    let x = Matrix::new(&x_data, 30, 1);
    let empty_x = Matrix::new(&[], 0, 1);

    let mut gbt = Gbt::construct(&params(&[
        ("num_boosting_rounds", 6.0),
        ("metric", 1.0),
    ]))
    .unwrap();
    gbt.train(&x, &y, &empty_x, &[], 6, 0).unwrap();

    let ok_k = gbt.best_iteration();
    assert!(gbt.predict(&[1.0], ok_k).is_ok());

    let err = gbt.predict(&[1.0], ok_k + 100).unwrap_err();
    assert!(matches!(err, GbtError::IndexOutOfRange { .. }));
}
