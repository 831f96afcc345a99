use crate::{squared_distance, validate_training_set, Error, Result};

/// k-nearest-neighbour classifier with majority voting.
#[derive(Debug, Clone)]
pub struct KNearest {
    pub k: usize,
    samples: Vec<Vec<f32>>,
    labels: Vec<i32>,
    dim: usize,
}

impl KNearest {
    pub fn new(k: usize) -> Self {
        Self {
            k: k.max(1),
            samples: Vec::new(),
            labels: Vec::new(),
            dim: 0,
        }
    }

    pub fn train(&mut self, samples: &[Vec<f32>], labels: &[i32]) -> Result<()> {
        self.dim = validate_training_set(samples, labels)?;
        self.samples = samples.to_vec();
        self.labels = labels.to_vec();
        Ok(())
    }

    pub fn is_trained(&self) -> bool {
        !self.samples.is_empty()
    }

    /// The k nearest training samples as (label, distance), closest first.
    pub fn find_nearest(&self, sample: &[f32]) -> Result<Vec<(i32, f32)>> {
        if !self.is_trained() {
            return Err(Error::InvalidInput("classifier is not trained".into()));
        }
        if sample.len() != self.dim {
            return Err(Error::DimensionMismatch(format!(
                "sample dimension {} (expected {})",
                sample.len(),
                self.dim
            )));
        }

        let mut dists: Vec<(i32, f32)> = self
            .samples
            .iter()
            .zip(&self.labels)
            .map(|(s, &l)| (l, squared_distance(s, sample)))
            .collect();
        dists.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
        dists.truncate(self.k);
        for d in &mut dists {
            d.1 = d.1.sqrt();
        }
        Ok(dists)
    }

    /// Majority vote over the k nearest neighbors; ties pick the smaller
    /// label.
    pub fn predict(&self, sample: &[f32]) -> Result<i32> {
        let nearest = self.find_nearest(sample)?;
        let mut counts: Vec<(i32, usize)> = Vec::new();
        for (label, _) in &nearest {
            match counts.iter_mut().find(|(l, _)| l == label) {
                Some((_, c)) => *c += 1,
                None => counts.push((*label, 1)),
            }
        }
        counts.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        Ok(counts[0].0)
    }
}
