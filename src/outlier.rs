//! Outlier reconciliation of a centroid clustering

use tracing::{debug, warn};

use crate::color::Point;
use crate::error::{GroupingError, Result};
use crate::kmeans::CentroidClustering;
use crate::metric::DistanceMetric;
use crate::report::Cluster;

/// Refined clusters plus what happened to the outliers
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    /// Non-empty clusters; members sorted by input index
    pub clusters: Vec<Cluster>,
    /// Points moved into another existing cluster
    pub reassigned: Vec<usize>,
    /// Points that became singleton clusters
    pub isolated: Vec<usize>,
}

/// Move every member farther than `threshold` from its own centroid.
///
/// An outlier joins the nearest *other* original centroid if it lies within
/// `threshold` of it; otherwise it becomes a singleton cluster centered on
/// itself. Only the input centroids are consulted, so the result does not
/// depend on processing order.
pub fn reconcile<M: DistanceMetric + ?Sized>(
    clustering: &CentroidClustering,
    points: &[Point],
    metric: &M,
    threshold: f64,
) -> Result<Reconciliation> {
    if !threshold.is_finite() || threshold < 0.0 {
        return Err(GroupingError::invalid_config(
            "outlierThreshold",
            format!("must be a non-negative number, got {}", threshold),
        ));
    }

    let centroids = &clustering.centroids;
    let mut members: Vec<Vec<usize>> = vec![Vec::new(); centroids.len()];
    let mut singletons = Vec::new();
    let mut reassigned = Vec::new();

    for (index, (point, &own)) in points.iter().zip(&clustering.assignments).enumerate() {
        if metric.distance(point, &centroids[own]) <= threshold {
            members[own].push(index);
            continue;
        }

        let nearest_other = centroids
            .iter()
            .enumerate()
            .filter(|&(cluster, _)| cluster != own)
            .map(|(cluster, centroid)| (cluster, metric.distance(point, centroid)))
            .fold(None, |best: Option<(usize, f64)>, (cluster, distance)| match best {
                Some((_, d)) if d <= distance => best,
                _ => Some((cluster, distance)),
            });

        match nearest_other {
            Some((cluster, distance)) if distance <= threshold => {
                members[cluster].push(index);
                reassigned.push(index);
            }
            _ => singletons.push(index),
        }
    }

    if !singletons.is_empty() {
        warn!(
            isolated = singletons.len(),
            threshold,
            "colors farther than the threshold from every centroid became singleton groups"
        );
    }
    debug!(
        reassigned = reassigned.len(),
        isolated = singletons.len(),
        "outlier pass finished"
    );

    let mut clusters: Vec<Cluster> = members
        .into_iter()
        .zip(centroids.iter())
        .filter(|(members, _)| !members.is_empty())
        .map(|(mut members, &centroid)| {
            members.sort_unstable();
            Cluster::new(members, centroid)
        })
        .collect();
    clusters.extend(
        singletons
            .iter()
            .map(|&index| Cluster::new(vec![index], points[index])),
    );

    Ok(Reconciliation {
        clusters,
        reassigned,
        isolated: singletons,
    })
}
