use crate::config::Config;
use crate::histogram::Histogram;

/// The chosen split for one node: which feature, which bin threshold,
/// and the gain it realizes.
#[derive(Debug, Clone, Copy)]
pub struct SplitInfo {
    pub feature: usize,
    /// Rows with `bin <= bin_threshold` go left; the rest go right.
    pub bin_threshold: u16,
    pub gain: f64,
    pub left_grad: f64,
    pub left_hess: f64,
    pub left_count: u32,
    pub right_grad: f64,
    pub right_hess: f64,
    pub right_count: u32,
}

/// Finds the best (feature, bin-threshold) split for a node given its
/// gradient/Hessian histogram and parent statistics.
pub struct SplitFinder<'a> {
    config: &'a Config,
}

impl<'a> SplitFinder<'a> {
    pub fn new(config: &'a Config) -> Self {
        SplitFinder { config }
    }

    /// `gain(L, R) = 1/2 * (GL^2/(HL+lambda) + GR^2/(HR+lambda) - GP^2/(HP+lambda)) - gamma`
    fn gain(&self, g_l: f64, h_l: f64, g_r: f64, h_r: f64, g_p: f64, h_p: f64) -> f64 {
        let lambda = self.config.lambda;
        0.5 * (g_l * g_l / (h_l + lambda) + g_r * g_r / (h_r + lambda) - g_p * g_p / (h_p + lambda))
            - self.config.gamma
    }

    /// Best split across every feature, scanning bins ascending within
    /// each feature so ties resolve to the lowest feature index, then
    /// the lowest bin index (the first candidate found is only ever
    /// replaced by a strictly greater gain).
    pub fn best_split(&self, hist: &Histogram, g_p: f64, h_p: f64, n_p: u32) -> Option<SplitInfo> {
        let mut best: Option<SplitInfo> = None;
        for feature in 0..hist.n_features {
            if let Some(candidate) = self.best_split_for_feature(hist, feature, g_p, h_p, n_p) {
                let better = match &best {
                    None => true,
                    Some(incumbent) => candidate.gain > incumbent.gain,
                };
                if better {
                    best = Some(candidate);
                }
            }
        }
        best
    }

    fn best_split_for_feature(
        &self,
        hist: &Histogram,
        feature: usize,
        g_p: f64,
        h_p: f64,
        n_p: u32,
    ) -> Option<SplitInfo> {
        let min_gain = self.config.effective_min_gain();
        let min_tree_size = self.config.min_tree_size as u32;

        let mut cum_g = 0.0;
        let mut cum_h = 0.0;
        let mut cum_n: u32 = 0;

        let mut best: Option<SplitInfo> = None;

        for bin in 0..hist.max_bin.saturating_sub(1) {
            cum_g += hist.grad_at(feature, bin);
            cum_h += hist.hess_at(feature, bin);
            cum_n += hist.count_at(feature, bin);

            let g_l = cum_g;
            let h_l = cum_h;
            let n_l = cum_n;
            let g_r = g_p - cum_g;
            let h_r = h_p - cum_h;
            let n_r = n_p.saturating_sub(cum_n);

            if n_l < min_tree_size || n_r < min_tree_size {
                continue;
            }
            if !(h_l > 0.0) || !(h_r > 0.0) {
                continue;
            }

            let gain = self.gain(g_l, h_l, g_r, h_r, g_p, h_p);
            if !gain.is_finite() || gain <= min_gain {
                continue;
            }

            let replace = match &best {
                None => true,
                Some(incumbent) => gain > incumbent.gain,
            };
            if replace {
                best = Some(SplitInfo {
                    feature,
                    bin_threshold: bin as u16,
                    gain,
                    left_grad: g_l,
                    left_hess: h_l,
                    left_count: n_l,
                    right_grad: g_r,
                    right_hess: h_r,
                    right_count: n_r,
                });
            }
        }

        best
    }
}

/// The optimal constant leaf weight for aggregated gradient/Hessian
/// sums: `w = -G / (H + lambda)`.
#[inline]
pub fn leaf_weight(g: f64, h: f64, lambda: f64) -> f64 {
    -g / (h + lambda)
}
