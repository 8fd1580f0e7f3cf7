//! Centroid clustering: k-means with uniform or k-means++ seeding
//!
//! One clusterer serves every metric. Points must already be projected into
//! the metric's [`ColorSpace`]; centroids are kept in that same space and, in
//! RGB, rounded to integer channels after every update.

use rand::seq::index;
use rand::Rng;
use tracing::{debug, warn};

use crate::color::{ColorSpace, Point};
use crate::error::{GroupingError, Result};
use crate::metric::DistanceMetric;
use crate::report::Cluster;

/// Coordinate tolerance when comparing centroid sets between iterations
pub const CONVERGENCE_EPSILON: f64 = 1e-9;

/// How the initial centroids are picked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Seeding {
    /// k distinct input points chosen uniformly at random
    Uniform,
    /// k-means++: each next seed sampled proportionally to its distance from
    /// the nearest seed already chosen
    PlusPlus,
}

/// Result of a centroid clustering run
#[derive(Debug, Clone, PartialEq)]
pub struct CentroidClustering {
    /// Final centroids, in `space`
    pub centroids: Vec<Point>,
    /// Cluster index of every input point
    pub assignments: Vec<usize>,
    /// Assign/update cycles performed
    pub iterations: usize,
    /// Whether the centroid set stopped moving before the iteration cap
    pub converged: bool,
    pub space: ColorSpace,
}

impl CentroidClustering {
    /// Number of clusters
    pub fn k(&self) -> usize {
        self.centroids.len()
    }

    /// Member indices of every cluster, in input order
    pub fn members(&self) -> Vec<Vec<usize>> {
        let mut members = vec![Vec::new(); self.k()];
        for (point, &cluster) in self.assignments.iter().enumerate() {
            members[cluster].push(point);
        }
        members
    }

    /// Get cluster sizes
    pub fn cluster_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.k()];
        for &cluster in &self.assignments {
            sizes[cluster] += 1;
        }
        sizes
    }

    /// Clusters with their centroids, empty ones included
    pub fn clusters(&self) -> Vec<Cluster> {
        self.members()
            .into_iter()
            .zip(self.centroids.iter())
            .map(|(members, &centroid)| Cluster::new(members, centroid))
            .collect()
    }

    /// Sum of squared member-to-centroid distances under `metric`
    pub fn inertia<M: DistanceMetric + ?Sized>(&self, points: &[Point], metric: &M) -> f64 {
        points
            .iter()
            .zip(&self.assignments)
            .map(|(point, &cluster)| metric.distance(point, &self.centroids[cluster]).powi(2))
            .sum()
    }

    /// Mean silhouette coefficient over the first `sample_size` points
    pub fn silhouette_sample<M: DistanceMetric + ?Sized>(
        &self,
        points: &[Point],
        metric: &M,
        sample_size: usize,
    ) -> f64 {
        let n_samples = points.len().min(sample_size);
        if n_samples < 2 {
            return 0.0;
        }

        let mut silhouette_sum = 0.0;
        for i in 0..n_samples {
            let label = self.assignments[i];
            let mut same = (0.0, 0usize);
            let mut other = vec![(0.0, 0usize); self.k()];

            for j in (0..n_samples).filter(|&j| j != i) {
                let distance = metric.distance(&points[i], &points[j]);
                let bucket = if self.assignments[j] == label {
                    &mut same
                } else {
                    &mut other[self.assignments[j]]
                };
                bucket.0 += distance;
                bucket.1 += 1;
            }

            let a_i = if same.1 == 0 { 0.0 } else { same.0 / same.1 as f64 };
            let b_i = other
                .iter()
                .filter(|(_, count)| *count > 0)
                .map(|(sum, count)| sum / *count as f64)
                .fold(f64::INFINITY, f64::min);

            if b_i.is_finite() && a_i.max(b_i) > 0.0 {
                silhouette_sum += (b_i - a_i) / a_i.max(b_i);
            }
        }

        silhouette_sum / n_samples as f64
    }
}

/// k-means clusterer parameterized by a distance metric
#[derive(Debug, Clone)]
pub struct KMeans<M> {
    metric: M,
    k: usize,
    max_iterations: usize,
    seeding: Seeding,
}

impl<M: DistanceMetric> KMeans<M> {
    /// k-means++ clusterer capped at the metric's default iteration count
    pub fn new(metric: M, k: usize) -> Self {
        let max_iterations = metric.default_max_iterations();
        Self {
            metric,
            k,
            max_iterations,
            seeding: Seeding::PlusPlus,
        }
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_seeding(mut self, seeding: Seeding) -> Self {
        self.seeding = seeding;
        self
    }

    pub fn metric(&self) -> &M {
        &self.metric
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    /// Run Seeding -> (Assigning -> Updating)* until the centroids stop moving
    /// or the iteration cap is hit.
    ///
    /// Hitting the cap is not an error; the result carries `converged: false`.
    ///
    /// # Errors
    ///
    /// * `EmptyInput` for no points
    /// * `InvalidConfig` for `k == 0` or a zero iteration cap
    /// * `InsufficientDistinctColors` when fewer than k distinct seeds exist
    pub fn fit<R: Rng + ?Sized>(&self, points: &[Point], rng: &mut R) -> Result<CentroidClustering> {
        if self.max_iterations == 0 {
            return Err(GroupingError::invalid_config(
                "maxIterations",
                "must be a positive integer",
            ));
        }

        let mut centroids = self.seed(points, rng)?;
        debug!(
            k = self.k,
            n = points.len(),
            max_iterations = self.max_iterations,
            seeding = ?self.seeding,
            "seeded k-means"
        );

        let mut assignments = vec![0; points.len()];
        let mut iterations = 0;
        let mut converged = false;

        while iterations < self.max_iterations {
            assignments = self.assign(points, &centroids);
            let next = self.update(points, &assignments, &centroids);
            iterations += 1;

            let stable = same_centroids(&centroids, &next);
            centroids = next;
            if stable {
                converged = true;
                break;
            }
        }

        if converged {
            debug!(iterations, "k-means converged");
        } else {
            warn!(
                iterations,
                "k-means reached the iteration cap before the centroids stabilized"
            );
        }

        Ok(CentroidClustering {
            centroids,
            assignments,
            iterations,
            converged,
            space: self.metric.space(),
        })
    }

    /// Pick k distinct initial centroids
    pub fn seed<R: Rng + ?Sized>(&self, points: &[Point], rng: &mut R) -> Result<Vec<Point>> {
        if points.is_empty() {
            return Err(GroupingError::EmptyInput);
        }
        if self.k == 0 {
            return Err(GroupingError::invalid_config(
                "groupCount",
                "must be a positive integer",
            ));
        }
        if self.k > points.len() {
            return Err(GroupingError::InsufficientDistinctColors {
                requested: self.k,
                available: points.len(),
            });
        }

        let chosen = match self.seeding {
            Seeding::Uniform => index::sample(rng, points.len(), self.k).into_vec(),
            Seeding::PlusPlus => self.plus_plus_indices(points, rng),
        };

        let mut seeds: Vec<Point> = Vec::with_capacity(self.k);
        for point in chosen.into_iter().map(|i| points[i]) {
            if !seeds.iter().any(|seed| same_point(seed, &point)) {
                seeds.push(point);
            }
        }

        if seeds.len() < self.k {
            return Err(GroupingError::InsufficientDistinctColors {
                requested: self.k,
                available: seeds.len(),
            });
        }
        Ok(seeds)
    }

    fn plus_plus_indices<R: Rng + ?Sized>(&self, points: &[Point], rng: &mut R) -> Vec<usize> {
        let first = rng.gen_range(0..points.len());
        let mut chosen = vec![first];
        let mut taken = vec![false; points.len()];
        taken[first] = true;
        let mut nearest: Vec<f64> = points
            .iter()
            .map(|p| self.metric.distance(p, &points[first]))
            .collect();

        while chosen.len() < self.k {
            let weights: Vec<f64> = nearest
                .iter()
                .zip(&taken)
                .map(|(&d, &t)| if t || !d.is_finite() || d <= 0.0 { 0.0 } else { d })
                .collect();
            let total: f64 = weights.iter().sum();
            if !total.is_finite() || total <= 0.0 {
                // every remaining point coincides with a seed
                break;
            }

            let next = roulette(&weights, rng.gen::<f64>() * total);
            chosen.push(next);
            taken[next] = true;
            for (d, p) in nearest.iter_mut().zip(points) {
                *d = d.min(self.metric.distance(p, &points[next]));
            }
        }

        chosen
    }

    /// Index of the nearest centroid for every point; ties go to the lowest index
    pub fn assign(&self, points: &[Point], centroids: &[Point]) -> Vec<usize> {
        points
            .iter()
            .map(|point| nearest_centroid(&self.metric, point, centroids).map_or(0, |(i, _)| i))
            .collect()
    }

    /// Component-wise mean of each cluster's members.
    ///
    /// A cluster without members keeps its previous centroid.
    pub fn update(&self, points: &[Point], assignments: &[usize], previous: &[Point]) -> Vec<Point> {
        let space = self.metric.space();
        let mut sums = vec![[0.0f64; 3]; previous.len()];
        let mut counts = vec![0usize; previous.len()];

        for (point, &cluster) in points.iter().zip(assignments) {
            counts[cluster] += 1;
            for (sum, value) in sums[cluster].iter_mut().zip(point) {
                *sum += value;
            }
        }

        sums.into_iter()
            .zip(counts)
            .zip(previous)
            .map(|((sum, count), &old)| {
                if count == 0 {
                    old
                } else {
                    finish_mean(sum, count, space)
                }
            })
            .collect()
    }
}

/// Mean of the selected points in `space`, or `None` for an empty selection
pub fn mean_point(points: &[Point], members: &[usize], space: ColorSpace) -> Option<Point> {
    if members.is_empty() {
        return None;
    }
    let mut sum = [0.0f64; 3];
    for &i in members {
        for (total, value) in sum.iter_mut().zip(&points[i]) {
            *total += value;
        }
    }
    Some(finish_mean(sum, members.len(), space))
}

/// Nearest centroid and its distance; ties go to the lowest index
pub fn nearest_centroid<M: DistanceMetric + ?Sized>(
    metric: &M,
    point: &Point,
    centroids: &[Point],
) -> Option<(usize, f64)> {
    let mut best: Option<(usize, f64)> = None;
    for (i, centroid) in centroids.iter().enumerate() {
        let distance = metric.distance(point, centroid);
        if best.map_or(true, |(_, d)| distance < d) {
            best = Some((i, distance));
        }
    }
    best
}

fn finish_mean(sum: [f64; 3], count: usize, space: ColorSpace) -> Point {
    let mean = sum.map(|total| total / count as f64);
    match space {
        ColorSpace::Rgb => mean.map(f64::round),
        ColorSpace::Lab => mean,
    }
}

fn roulette(weights: &[f64], target: f64) -> usize {
    let mut cumulative = 0.0;
    let mut last_positive = 0;
    for (i, &weight) in weights.iter().enumerate() {
        if weight <= 0.0 {
            continue;
        }
        cumulative += weight;
        last_positive = i;
        if target < cumulative {
            return i;
        }
    }
    last_positive
}

fn same_point(a: &Point, b: &Point) -> bool {
    a.iter()
        .zip(b)
        .all(|(x, y)| (x - y).abs() <= CONVERGENCE_EPSILON)
}

fn same_centroids(a: &[Point], b: &[Point]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| same_point(x, y))
}
