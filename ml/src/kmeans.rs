use crate::{squared_distance, Error, Result, TermCriteria};
use rand::seq::SliceRandom;
use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KMeansInit {
    /// Uniformly random distinct samples as initial centers.
    Random,
    /// k-means++ seeding: subsequent centers drawn proportional to the
    /// squared distance from existing ones.
    PlusPlus,
}

#[derive(Debug, Clone)]
pub struct KMeansResult {
    /// Sum of squared distances of samples to their assigned centers.
    pub compactness: f64,
    pub labels: Vec<usize>,
    pub centers: Vec<Vec<f32>>,
}

fn seed_centers<R: Rng>(
    samples: &[Vec<f32>],
    k: usize,
    init: KMeansInit,
    rng: &mut R,
) -> Vec<Vec<f32>> {
    match init {
        KMeansInit::Random => {
            let mut idx: Vec<usize> = (0..samples.len()).collect();
            idx.shuffle(rng);
            idx.truncate(k);
            idx.into_iter().map(|i| samples[i].clone()).collect()
        }
        KMeansInit::PlusPlus => {
            let mut centers = Vec::with_capacity(k);
            centers.push(samples[rng.gen_range(0..samples.len())].clone());

            while centers.len() < k {
                let dists: Vec<f32> = samples
                    .iter()
                    .map(|s| {
                        centers
                            .iter()
                            .map(|c| squared_distance(s, c))
                            .fold(f32::INFINITY, f32::min)
                    })
                    .collect();
                let total: f32 = dists.iter().sum();
                if total <= 0.0 {
                    // All samples already coincide with a center.
                    centers.push(samples[rng.gen_range(0..samples.len())].clone());
                    continue;
                }
                let mut target = rng.gen_range(0.0..total);
                let mut chosen = samples.len() - 1;
                for (i, &d) in dists.iter().enumerate() {
                    if target < d {
                        chosen = i;
                        break;
                    }
                    target -= d;
                }
                centers.push(samples[chosen].clone());
            }
            centers
        }
    }
}

fn lloyd_iterations(
    samples: &[Vec<f32>],
    mut centers: Vec<Vec<f32>>,
    criteria: TermCriteria,
) -> KMeansResult {
    let k = centers.len();
    let dim = samples[0].len();
    let mut labels = vec![0usize; samples.len()];

    for _ in 0..criteria.max_iterations.max(1) {
        // Assignment
        for (i, s) in samples.iter().enumerate() {
            let mut best = 0usize;
            let mut best_d = f32::INFINITY;
            for (j, c) in centers.iter().enumerate() {
                let d = squared_distance(s, c);
                if d < best_d {
                    best_d = d;
                    best = j;
                }
            }
            labels[i] = best;
        }

        // Update
        let mut sums = vec![vec![0.0f64; dim]; k];
        let mut counts = vec![0usize; k];
        for (s, &l) in samples.iter().zip(&labels) {
            counts[l] += 1;
            for (acc, &v) in sums[l].iter_mut().zip(s) {
                *acc += v as f64;
            }
        }

        let mut max_shift = 0.0f64;
        for j in 0..k {
            if counts[j] == 0 {
                continue; // empty cluster keeps its center
            }
            let mut shift = 0.0f64;
            for d in 0..dim {
                let new = (sums[j][d] / counts[j] as f64) as f32;
                let diff = (new - centers[j][d]) as f64;
                shift += diff * diff;
                centers[j][d] = new;
            }
            max_shift = max_shift.max(shift.sqrt());
        }

        if max_shift < criteria.epsilon {
            break;
        }
    }

    let compactness: f64 = samples
        .iter()
        .zip(&labels)
        .map(|(s, &l)| squared_distance(s, &centers[l]) as f64)
        .sum();

    KMeansResult {
        compactness,
        labels,
        centers,
    }
}

/// Cluster `samples` into `k` groups, keeping the best of `attempts` runs
/// by compactness.
pub fn kmeans(
    samples: &[Vec<f32>],
    k: usize,
    criteria: TermCriteria,
    attempts: usize,
    init: KMeansInit,
) -> Result<KMeansResult> {
    if samples.is_empty() {
        return Err(Error::InvalidInput("empty sample set".into()));
    }
    if k == 0 || k > samples.len() {
        return Err(Error::InvalidInput(format!(
            "k = {k} invalid for {} samples",
            samples.len()
        )));
    }
    let dim = samples[0].len();
    if samples.iter().any(|s| s.len() != dim) {
        return Err(Error::DimensionMismatch(
            "samples have mixed dimensions".into(),
        ));
    }

    let mut rng = rand::thread_rng();
    let mut best: Option<KMeansResult> = None;
    for _ in 0..attempts.max(1) {
        let centers = seed_centers(samples, k, init, &mut rng);
        let run = lloyd_iterations(samples, centers, criteria);
        if best
            .as_ref()
            .map(|b| run.compactness < b.compactness)
            .unwrap_or(true)
        {
            best = Some(run);
        }
    }

    Ok(best.expect("at least one attempt"))
}
