use rayon::prelude::*;

use crate::data::Dataset;

/// Per-(feature, bin) aggregates of gradient sum, Hessian sum, and row
/// count, over some subset of training rows.
///
/// Stored flat, row-major by feature: `grad[f * max_bin + b]`.
#[derive(Debug, Clone)]
pub struct Histogram {
    pub grad: Vec<f64>,
    pub hess: Vec<f64>,
    pub count: Vec<u32>,
    pub n_features: usize,
    pub max_bin: usize,
}

impl Histogram {
    fn empty(n_features: usize, max_bin: usize) -> Self {
        Histogram {
            grad: vec![0.0; n_features * max_bin],
            hess: vec![0.0; n_features * max_bin],
            count: vec![0; n_features * max_bin],
            n_features,
            max_bin,
        }
    }

    /// Aggregate (grad, hess, count) per (feature, bin) for the rows in
    /// `rows`, reading labels' gradients/Hessians from `grad`/`hess`
    /// (indexed by *original* row id, not position within `rows`).
    ///
    /// Each feature column is accumulated independently, so the
    /// per-feature folds run in parallel via rayon; within one feature,
    /// rows are folded in the order they appear in `rows`, which keeps
    /// the result bit-identical across thread counts as long as `rows`
    /// itself is built in a deterministic order (see `growth.rs`).
    pub fn build(dataset: &Dataset, rows: &[usize], grad: &[f64], hess: &[f64]) -> Self {
        let n_features = dataset.n_features;
        let max_bin = dataset.binned.bin_edges.iter().map(|e| e.len() + 1).max().unwrap_or(1);

        let columns: Vec<(Vec<f64>, Vec<f64>, Vec<u32>)> = (0..n_features)
            .into_par_iter()
            .map(|f| {
                let mut g = vec![0.0; max_bin];
                let mut h = vec![0.0; max_bin];
                let mut c = vec![0u32; max_bin];
                for &i in rows {
                    let b = dataset.bin_at(i, f) as usize;
                    g[b] += grad[i];
                    h[b] += hess[i];
                    c[b] += 1;
                }
                (g, h, c)
            })
            .collect();

        let mut hist = Histogram::empty(n_features, max_bin);
        for (f, (g, h, c)) in columns.into_iter().enumerate() {
            let start = f * max_bin;
            hist.grad[start..start + max_bin].copy_from_slice(&g);
            hist.hess[start..start + max_bin].copy_from_slice(&h);
            hist.count[start..start + max_bin].copy_from_slice(&c);
        }
        hist
    }

    #[inline]
    pub fn grad_at(&self, feature: usize, bin: usize) -> f64 {
        self.grad[feature * self.max_bin + bin]
    }

    #[inline]
    pub fn hess_at(&self, feature: usize, bin: usize) -> f64 {
        self.hess[feature * self.max_bin + bin]
    }

    #[inline]
    pub fn count_at(&self, feature: usize, bin: usize) -> u32 {
        self.count[feature * self.max_bin + bin]
    }

    /// Derive the complement histogram: `self - child`, used for the
    /// "smaller child" optimization (build the smaller side directly,
    /// subtract it from the retained parent histogram to get the
    /// larger side for free).
    pub fn subtract(&self, child: &Histogram) -> Histogram {
        debug_assert_eq!(self.n_features, child.n_features);
        debug_assert_eq!(self.max_bin, child.max_bin);
        let grad = self.grad.iter().zip(&child.grad).map(|(a, b)| a - b).collect();
        let hess = self.hess.iter().zip(&child.hess).map(|(a, b)| a - b).collect();
        let count = self
            .count
            .iter()
            .zip(&child.count)
            .map(|(a, b)| a - b)
            .collect();
        Histogram {
            grad,
            hess,
            count,
            n_features: self.n_features,
            max_bin: self.max_bin,
        }
    }
}
