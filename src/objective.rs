use crate::error::GbtError;

/// Clamp applied to the logit used as the binary objective's initial
/// prediction, so `logit(mean(y))` never produces `+-inf` for a
/// degenerate all-0/all-1 label vector.
const LOGIT_CLIP: f64 = 15.0;

#[inline]
fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

#[inline]
fn logit(p: f64) -> f64 {
    (p / (1.0 - p)).ln().clamp(-LOGIT_CLIP, LOGIT_CLIP)
}

/// The pluggable per-row loss supplying gradients, Hessians, and a
/// scalar loss used both to drive boosting and to evaluate early
/// stopping.
pub trait Objective: Send + Sync {
    /// The constant initial prediction `F_0`, in the objective's
    /// internal (pre-transform) space.
    fn init_prediction(&self, y: &[f64]) -> f64;

    /// Per-row (gradient, Hessian) given the current internal
    /// predictions `f` and the true labels `y`.
    fn gradients_hessians(&self, f: &[f64], y: &[f64]) -> (Vec<f64>, Vec<f64>);

    /// Map an internal prediction to the value reported to the caller.
    fn transform(&self, f: f64) -> f64;

    fn transform_all(&self, f: &[f64]) -> Vec<f64> {
        f.iter().map(|&v| self.transform(v)).collect()
    }

    /// Scalar loss between true labels and already-transformed
    /// predictions.
    fn loss(&self, y: &[f64], y_hat: &[f64]) -> f64;

    /// Validate that `y` is in this objective's domain.
    fn validate_labels(&self, y: &[f64]) -> Result<(), GbtError>;
}

/// Regression objective: squared error, identity link.
#[derive(Debug, Default, Clone, Copy)]
pub struct SquaredLoss;

impl Objective for SquaredLoss {
    fn init_prediction(&self, y: &[f64]) -> f64 {
        if y.is_empty() {
            0.0
        } else {
            y.iter().sum::<f64>() / y.len() as f64
        }
    }

    fn gradients_hessians(&self, f: &[f64], y: &[f64]) -> (Vec<f64>, Vec<f64>) {
        let grad = f.iter().zip(y).map(|(&fi, &yi)| fi - yi).collect();
        let hess = vec![1.0; f.len()];
        (grad, hess)
    }

    fn transform(&self, f: f64) -> f64 {
        f
    }

    fn loss(&self, y: &[f64], y_hat: &[f64]) -> f64 {
        if y.is_empty() {
            return 0.0;
        }
        let sse: f64 = y
            .iter()
            .zip(y_hat)
            .map(|(&yi, &pi)| (yi - pi).powi(2))
            .sum();
        sse / y.len() as f64
    }

    fn validate_labels(&self, y: &[f64]) -> Result<(), GbtError> {
        if y.iter().all(|v| v.is_finite()) {
            Ok(())
        } else {
            Err(GbtError::InvalidLabels(
                "regression labels must all be finite".to_string(),
            ))
        }
    }
}

/// Binary classification objective: logistic link, log-loss.
///
/// Internal predictions are raw logits; [`Objective::transform`] maps
/// them to a probability in `[0, 1]` via the sigmoid.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogLoss;

impl Objective for LogLoss {
    fn init_prediction(&self, y: &[f64]) -> f64 {
        if y.is_empty() {
            return 0.0;
        }
        let mean = y.iter().sum::<f64>() / y.len() as f64;
        let mean = mean.clamp(1e-6, 1.0 - 1e-6);
        logit(mean)
    }

    fn gradients_hessians(&self, f: &[f64], y: &[f64]) -> (Vec<f64>, Vec<f64>) {
        let mut grad = Vec::with_capacity(f.len());
        let mut hess = Vec::with_capacity(f.len());
        for (&fi, &yi) in f.iter().zip(y) {
            let p = sigmoid(fi);
            grad.push(p - yi);
            hess.push((p * (1.0 - p)).max(1e-16));
        }
        (grad, hess)
    }

    fn transform(&self, f: f64) -> f64 {
        sigmoid(f)
    }

    fn loss(&self, y: &[f64], y_hat: &[f64]) -> f64 {
        if y.is_empty() {
            return 0.0;
        }
        const EPS: f64 = 1e-15;
        let sum: f64 = y
            .iter()
            .zip(y_hat)
            .map(|(&yi, &pi)| {
                let p = pi.clamp(EPS, 1.0 - EPS);
                -(yi * p.ln() + (1.0 - yi) * (1.0 - p).ln())
            })
            .sum();
        sum / y.len() as f64
    }

    fn validate_labels(&self, y: &[f64]) -> Result<(), GbtError> {
        if y.iter().all(|&v| v.is_finite() && (0.0..=1.0).contains(&v)) {
            Ok(())
        } else {
            Err(GbtError::InvalidLabels(
                "binary labels must be finite and within [0, 1]".to_string(),
            ))
        }
    }
}
