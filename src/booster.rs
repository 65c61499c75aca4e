use std::collections::HashMap;

use serde_json::json;

use crate::config::{Config, Metric};
use crate::data::{Dataset, Matrix};
use crate::error::GbtError;
use crate::growth;
use crate::objective::{LogLoss, Objective, SquaredLoss};
use crate::tree::Tree;

/// A gradient boosting decision tree ensemble.
///
/// Holds the validated training configuration, the objective it was
/// constructed for, and, once trained, the quantized training dataset
/// (needed to re-bin inference rows against the same cut points) and
/// the sequence of trees built one per boosting round.
pub struct Gbt {
    config: Config,
    objective: Box<dyn Objective>,
    dataset: Option<Dataset>,
    trees: Vec<Tree>,
    init_prediction: f64,
    best_iteration: usize,
}

impl Gbt {
    /// Build an untrained booster from a loosely-typed parameter map,
    /// mirroring the host embedding's `GBT(params)` constructor.
    pub fn construct(params: &HashMap<String, f64>) -> Result<Self, GbtError> {
        let config = Config::from_map(params)?;
        let objective: Box<dyn Objective> = match config.metric {
            Metric::Regression => Box::new(SquaredLoss),
            Metric::Binary => Box::new(LogLoss),
        };
        Ok(Gbt {
            config,
            objective,
            dataset: None,
            trees: Vec::new(),
            init_prediction: 0.0,
            best_iteration: 0,
        })
    }

    /// Fit the ensemble by gradient boosting, growing one tree per
    /// round against a running training-set residual and tracking loss
    /// on a held-out validation set for early stopping.
    ///
    /// `early_stopping_rounds` of `0` disables early stopping; training
    /// then always runs the full `num_iters` rounds (capped at
    /// `num_boosting_rounds`) and `best_iteration` tracks the final
    /// round.
    pub fn train(
        &mut self,
        x_train: &Matrix,
        y_train: &[f64],
        x_valid: &Matrix,
        y_valid: &[f64],
        num_iters: usize,
        early_stopping_rounds: usize,
    ) -> Result<(), GbtError> {
        if x_train.rows == 0 {
            return Err(GbtError::EmptyDataset(
                "training matrix has zero rows".to_string(),
            ));
        }
        if x_train.rows != y_train.len() {
            return Err(GbtError::ShapeMismatch(format!(
                "x_train has {} rows but y_train has {} labels",
                x_train.rows,
                y_train.len()
            )));
        }
        if x_valid.rows != y_valid.len() {
            return Err(GbtError::ShapeMismatch(format!(
                "x_valid has {} rows but y_valid has {} labels",
                x_valid.rows,
                y_valid.len()
            )));
        }
        if x_valid.rows > 0 && x_valid.cols != x_train.cols {
            return Err(GbtError::ShapeMismatch(format!(
                "x_train has {} columns but x_valid has {}",
                x_train.cols, x_valid.cols
            )));
        }

        self.objective.validate_labels(y_train)?;
        if !y_valid.is_empty() {
            self.objective.validate_labels(y_valid)?;
        }

        let dataset = Dataset::new(x_train, self.config.max_bin)?;
        self.init_prediction = self.objective.init_prediction(y_train);

        let mut train_f = vec![self.init_prediction; x_train.rows];
        let mut valid_f = vec![self.init_prediction; x_valid.rows];

        let rounds = num_iters.min(self.config.num_boosting_rounds);
        let has_valid = x_valid.rows > 0;
        let mut best_loss = f64::INFINITY;
        let mut rounds_since_best = 0usize;
        self.trees = Vec::with_capacity(rounds);
        self.best_iteration = 0;

        for round in 0..rounds {
            let (grad, hess) = self.objective.gradients_hessians(&train_f, y_train);
            let tree = growth::grow_tree(&dataset, &grad, &hess, &self.config);

            for i in 0..x_train.rows {
                train_f[i] += self.config.learning_rate * tree.predict_binned(&dataset, i);
            }
            for i in 0..x_valid.rows {
                valid_f[i] += self.config.learning_rate * tree.predict_row(&dataset, x_valid.row(i));
            }

            self.trees.push(tree);
            self.best_iteration = round;

            if has_valid {
                let y_hat = self.objective.transform_all(&valid_f);
                let loss = self.objective.loss(y_valid, &y_hat);
                log::info!("round {round}: valid loss = {loss:.6}");

                if loss < best_loss {
                    best_loss = loss;
                    self.best_iteration = round;
                    rounds_since_best = 0;
                } else {
                    rounds_since_best += 1;
                    if early_stopping_rounds > 0 && rounds_since_best >= early_stopping_rounds {
                        log::info!(
                            "stopping early at round {round}, best was round {}",
                            self.best_iteration
                        );
                        break;
                    }
                }
            } else {
                log::info!("round {round}: trained (no validation set)");
            }
        }

        self.dataset = Some(dataset);
        Ok(())
    }

    /// Predict one row using trees `[0, k]` inclusive (the first `k + 1`
    /// trees built). `k` is a tree index, not a count: `predict(x,
    /// best_iteration())` always succeeds, and `predict(x, k)` with `k`
    /// at or beyond the number of trees grown is `IndexOutOfRange`.
    pub fn predict(&self, row: &[f64], k: usize) -> Result<f64, GbtError> {
        if k >= self.trees.len() {
            return Err(GbtError::IndexOutOfRange {
                index: k,
                available: self.trees.len(),
            });
        }
        let dataset = self.dataset.as_ref().ok_or_else(|| {
            GbtError::EmptyDataset("booster has not been trained yet".to_string())
        })?;
        if row.len() != dataset.n_features {
            return Err(GbtError::ShapeMismatch(format!(
                "row has {} features but the booster was trained on {}",
                row.len(),
                dataset.n_features
            )));
        }

        let mut f = self.init_prediction;
        for tree in &self.trees[..=k] {
            f += self.config.learning_rate * tree.predict_row(dataset, row);
        }
        Ok(self.objective.transform(f))
    }

    pub fn best_iteration(&self) -> usize {
        self.best_iteration
    }

    pub fn max_depth(&self) -> f64 {
        self.config.max_depth as f64
    }

    pub fn min_split_gain(&self) -> f64 {
        self.config.min_split_gain
    }

    pub fn learning_rate(&self) -> f64 {
        self.config.learning_rate
    }

    pub fn gamma(&self) -> f64 {
        self.config.gamma
    }

    pub fn get_lambda(&self) -> f64 {
        self.config.lambda
    }

    /// A human-readable summary of the trained booster's shape and
    /// configuration, backed by `serde_json` (introspection only, not a
    /// persistence format).
    pub fn describe(&self) -> String {
        let summary = json!({
            "config": self.config,
            "num_trees": self.trees.len(),
            "best_iteration": self.best_iteration,
            "init_prediction": self.init_prediction,
        });
        summary.to_string()
    }
}
