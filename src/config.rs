use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::GbtError;

/// Which objective the booster optimizes.
///
/// The on-the-wire encoding matches the host embedding's `metric`
/// parameter: `0` is binary classification, `1` is regression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Metric {
    Binary,
    Regression,
}

impl TryFrom<f64> for Metric {
    type Error = GbtError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        match value as i64 {
            0 => Ok(Metric::Binary),
            1 => Ok(Metric::Regression),
            _ => Err(GbtError::InvalidParam {
                name: "metric".to_string(),
                reason: format!("must be 0 (binary) or 1 (regression), got {value}"),
            }),
        }
    }
}

impl Metric {
    fn as_code(self) -> f64 {
        match self {
            Metric::Binary => 0.0,
            Metric::Regression => 1.0,
        }
    }
}

/// Validated, immutable configuration for a single training run.
///
/// Built from a loosely-typed string-keyed numeric mapping via
/// [`Config::from_map`], mirroring the host embedding's untyped
/// parameter dictionary. Unknown keys are ignored; recognized keys
/// outside their domain raise [`GbtError::InvalidParam`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub gamma: f64,
    pub lambda: f64,
    pub max_depth: usize,
    /// Reserved: accepted and validated, but not wired into the
    /// boosting math.
    pub shrinkage_rate: f64,
    pub learning_rate: f64,
    pub min_split_gain: f64,
    pub min_tree_size: usize,
    pub num_boosting_rounds: usize,
    pub max_bin: u16,
    pub metric: Metric,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            gamma: 0.0,
            lambda: 1.0,
            max_depth: 3,
            shrinkage_rate: 1.0,
            learning_rate: 0.1,
            min_split_gain: 0.0,
            min_tree_size: 1,
            num_boosting_rounds: 100,
            max_bin: 255,
            metric: Metric::Regression,
        }
    }
}

impl Config {
    /// Parse a validated `Config` out of a string-keyed numeric mapping.
    ///
    /// Unknown keys are silently ignored. A recognized key present but
    /// out of its domain returns [`GbtError::InvalidParam`]. A
    /// recognized key absent from `params` takes the default in
    /// [`Config::default`].
    pub fn from_map(params: &HashMap<String, f64>) -> Result<Self, GbtError> {
        let mut cfg = Config::default();

        if let Some(&v) = params.get("gamma") {
            require(v >= 0.0, "gamma", "must be >= 0")?;
            cfg.gamma = v;
        }
        if let Some(&v) = params.get("lambda") {
            require(v >= 0.0, "lambda", "must be >= 0")?;
            cfg.lambda = v;
        }
        if let Some(&v) = params.get("max_depth") {
            require(v >= 1.0, "max_depth", "must be >= 1")?;
            cfg.max_depth = v as usize;
        }
        if let Some(&v) = params.get("shrinkage_rate") {
            require(
                v > 0.0 && v <= 1.0,
                "shrinkage_rate",
                "must be in (0, 1]",
            )?;
            cfg.shrinkage_rate = v;
        }
        if let Some(&v) = params.get("learning_rate") {
            require(v > 0.0 && v <= 1.0, "learning_rate", "must be in (0, 1]")?;
            cfg.learning_rate = v;
        }
        if let Some(&v) = params.get("min_split_gain") {
            require(v >= 0.0, "min_split_gain", "must be >= 0")?;
            cfg.min_split_gain = v;
        }
        if let Some(&v) = params.get("min_tree_size") {
            require(v >= 1.0, "min_tree_size", "must be >= 1")?;
            cfg.min_tree_size = v as usize;
        }
        if let Some(&v) = params.get("num_boosting_rounds") {
            require(v >= 1.0, "num_boosting_rounds", "must be >= 1")?;
            cfg.num_boosting_rounds = v as usize;
        }
        if let Some(&v) = params.get("max_bin") {
            require(v >= 2.0, "max_bin", "must be >= 2")?;
            cfg.max_bin = v as u16;
        }
        if let Some(&v) = params.get("metric") {
            cfg.metric = Metric::try_from(v)?;
        }

        Ok(cfg)
    }

    /// The effective minimum accepted gain: `max(min_split_gain, 0)`,
    /// checked against the gain value *after* `gamma` has already been
    /// subtracted from it.
    pub fn effective_min_gain(&self) -> f64 {
        self.min_split_gain.max(0.0)
    }

    pub(crate) fn get(&self, key: &str) -> Option<f64> {
        match key {
            "gamma" => Some(self.gamma),
            "lambda" => Some(self.lambda),
            "max_depth" => Some(self.max_depth as f64),
            "shrinkage_rate" => Some(self.shrinkage_rate),
            "learning_rate" => Some(self.learning_rate),
            "min_split_gain" => Some(self.min_split_gain),
            "min_tree_size" => Some(self.min_tree_size as f64),
            "num_boosting_rounds" => Some(self.num_boosting_rounds as f64),
            "max_bin" => Some(self.max_bin as f64),
            "metric" => Some(self.metric.as_code()),
            _ => None,
        }
    }
}

fn require(cond: bool, name: &str, reason: &str) -> Result<(), GbtError> {
    if cond {
        Ok(())
    } else {
        Err(GbtError::InvalidParam {
            name: name.to_string(),
            reason: reason.to_string(),
        })
    }
}
