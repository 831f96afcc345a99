//! CART decision tree classifier with Gini impurity.

use crate::{validate_training_set, Error, Result};

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        label: i32,
    },
    Split {
        feature: usize,
        threshold: f32,
        left: Box<Node>,
        right: Box<Node>,
    },
}

pub struct DecisionTree {
    pub max_depth: usize,
    pub min_samples_split: usize,
    root: Option<Node>,
    dim: usize,
}

impl Default for DecisionTree {
    fn default() -> Self {
        Self {
            max_depth: 10,
            min_samples_split: 2,
            root: None,
            dim: 0,
        }
    }
}

fn gini(labels: &[i32]) -> f64 {
    let n = labels.len() as f64;
    if n == 0.0 {
        return 0.0;
    }
    let mut counts: Vec<(i32, usize)> = Vec::new();
    for &l in labels {
        match counts.iter_mut().find(|(v, _)| *v == l) {
            Some((_, c)) => *c += 1,
            None => counts.push((l, 1)),
        }
    }
    1.0 - counts
        .iter()
        .map(|(_, c)| {
            let p = *c as f64 / n;
            p * p
        })
        .sum::<f64>()
}

fn majority_label(labels: &[i32]) -> i32 {
    let mut counts: Vec<(i32, usize)> = Vec::new();
    for &l in labels {
        match counts.iter_mut().find(|(v, _)| *v == l) {
            Some((_, c)) => *c += 1,
            None => counts.push((l, 1)),
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    counts[0].0
}

impl DecisionTree {
    pub fn new(max_depth: usize, min_samples_split: usize) -> Self {
        Self {
            max_depth,
            min_samples_split: min_samples_split.max(2),
            root: None,
            dim: 0,
        }
    }

    pub fn train(&mut self, samples: &[Vec<f32>], labels: &[i32]) -> Result<()> {
        self.dim = validate_training_set(samples, labels)?;
        let indices: Vec<usize> = (0..samples.len()).collect();
        self.root = Some(self.build(samples, labels, &indices, 0));
        Ok(())
    }

    fn build(&self, samples: &[Vec<f32>], labels: &[i32], indices: &[usize], depth: usize) -> Node {
        let subset: Vec<i32> = indices.iter().map(|&i| labels[i]).collect();
        let impurity = gini(&subset);

        if depth >= self.max_depth
            || indices.len() < self.min_samples_split
            || impurity == 0.0
        {
            return Node::Leaf {
                label: majority_label(&subset),
            };
        }

        // Best axis-aligned split: scan candidate thresholds between
        // consecutive sorted feature values.
        let mut best: Option<(usize, f32, f64)> = None;
        for feature in 0..self.dim {
            let mut values: Vec<(f32, i32)> = indices
                .iter()
                .map(|&i| (samples[i][feature], labels[i]))
                .collect();
            values.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

            for w in 1..values.len() {
                if values[w].0 <= values[w - 1].0 {
                    continue;
                }
                let threshold = (values[w].0 + values[w - 1].0) / 2.0;
                let left: Vec<i32> = values[..w].iter().map(|(_, l)| *l).collect();
                let right: Vec<i32> = values[w..].iter().map(|(_, l)| *l).collect();
                let weighted = (left.len() as f64 * gini(&left)
                    + right.len() as f64 * gini(&right))
                    / values.len() as f64;
                if best.map(|(_, _, g)| weighted < g).unwrap_or(true) {
                    best = Some((feature, threshold, weighted));
                }
            }
        }

        let Some((feature, threshold, weighted)) = best else {
            return Node::Leaf {
                label: majority_label(&subset),
            };
        };
        if weighted >= impurity {
            return Node::Leaf {
                label: majority_label(&subset),
            };
        }

        let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| samples[i][feature] < threshold);

        Node::Split {
            feature,
            threshold,
            left: Box::new(self.build(samples, labels, &left_idx, depth + 1)),
            right: Box::new(self.build(samples, labels, &right_idx, depth + 1)),
        }
    }

    pub fn predict(&self, sample: &[f32]) -> Result<i32> {
        let Some(root) = &self.root else {
            return Err(Error::InvalidInput("tree is not trained".into()));
        };
        if sample.len() != self.dim {
            return Err(Error::DimensionMismatch(format!(
                "sample dimension {} (expected {})",
                sample.len(),
                self.dim
            )));
        }

        let mut node = root;
        loop {
            match node {
                Node::Leaf { label } => return Ok(*label),
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if sample[*feature] < *threshold {
                        left
                    } else {
                        right
                    };
                }
            }
        }
    }

    pub fn depth(&self) -> usize {
        fn walk(node: &Node) -> usize {
            match node {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(left).max(walk(right)),
            }
        }
        self.root.as_ref().map(|r| walk(r)).unwrap_or(0)
    }
}
