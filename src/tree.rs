use serde::{Deserialize, Serialize};

use crate::data::Dataset;

/// One node of the arena: either a leaf with a constant weight, or a
/// split pointing at two child slots by index.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum TreeNode {
    Leaf {
        weight: f64,
    },
    Split {
        feature: usize,
        bin_threshold: u16,
        left: u32,
        right: u32,
    },
}

/// A single regression tree, represented as a flat arena: nodes
/// reference children by index into the same `Vec`, rather than via
/// `Box`/pointers, and the tree owns the arena outright.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tree {
    nodes: Vec<TreeNode>,
}

impl Tree {
    pub(crate) fn new(nodes: Vec<TreeNode>) -> Self {
        debug_assert!(!nodes.is_empty());
        Tree { nodes }
    }

    /// A tree that always predicts `weight` (used when a node never
    /// finds a valid split: a legal, degenerate single-leaf tree).
    pub fn constant(weight: f64) -> Self {
        Tree {
            nodes: vec![TreeNode::Leaf { weight }],
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Predict using a training row's already-computed bin indices
    /// (fast path, used while boosting).
    pub fn predict_binned(&self, dataset: &Dataset, row: usize) -> f64 {
        let mut idx = 0u32;
        loop {
            match self.nodes[idx as usize] {
                TreeNode::Leaf { weight } => return weight,
                TreeNode::Split {
                    feature,
                    bin_threshold,
                    left,
                    right,
                } => {
                    idx = if dataset.bin_at(row, feature) <= bin_threshold {
                        left
                    } else {
                        right
                    };
                }
            }
        }
    }

    /// Predict a raw feature row, binning each compared feature on the
    /// fly against the dataset's stored cut points (used for
    /// validation rows and inference, where the row was never part of
    /// the training bin matrix).
    pub fn predict_row(&self, dataset: &Dataset, row: &[f64]) -> f64 {
        let mut idx = 0u32;
        loop {
            match self.nodes[idx as usize] {
                TreeNode::Leaf { weight } => return weight,
                TreeNode::Split {
                    feature,
                    bin_threshold,
                    left,
                    right,
                } => {
                    let bin = dataset.bin_value(feature, row[feature]);
                    idx = if bin <= bin_threshold { left } else { right };
                }
            }
        }
    }

    /// Maximum depth of any leaf, root = depth 0. Used only by tests
    /// and `describe()`.
    pub fn depth(&self) -> usize {
        fn visit(nodes: &[TreeNode], idx: u32) -> usize {
            match nodes[idx as usize] {
                TreeNode::Leaf { .. } => 0,
                TreeNode::Split { left, right, .. } => {
                    1 + visit(nodes, left).max(visit(nodes, right))
                }
            }
        }
        visit(&self.nodes, 0)
    }
}
