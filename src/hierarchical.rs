//! Agglomerative average-linkage clustering
//!
//! [`Hierarchical::fit`] merges all the way down to a single cluster and
//! records every merge; [`Dendrogram::flatten`] then cuts the tree at any
//! group count without re-running the distance computations.

use ndarray::Array2;
use tracing::debug;

use crate::color::Point;
use crate::error::{GroupingError, Result};
use crate::metric::DistanceMetric;

/// One agglomeration step.
///
/// Node ids `0..n` are the leaves; the merge at step `s` creates node `n + s`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Merge {
    pub left: usize,
    pub right: usize,
    /// Average linkage distance between the two merged clusters
    pub distance: f64,
    /// Number of leaves below the new node
    pub size: usize,
}

/// The full merge history of `leaves` points
#[derive(Debug, Clone, PartialEq)]
pub struct Dendrogram {
    leaves: usize,
    merges: Vec<Merge>,
}

impl Dendrogram {
    pub fn leaves(&self) -> usize {
        self.leaves
    }

    /// Merges in the order they were performed (`leaves - 1` of them)
    pub fn merges(&self) -> &[Merge] {
        &self.merges
    }

    /// Cut into `k` groups by replaying the first `leaves - k` merges.
    ///
    /// Groups hold leaf indices in ascending order and are sorted by their
    /// lowest member.
    pub fn flatten(&self, k: usize) -> Result<Vec<Vec<usize>>> {
        if k == 0 {
            return Err(GroupingError::invalid_config(
                "groupCount",
                "must be at least 1",
            ));
        }
        if k > self.leaves {
            return Err(GroupingError::InsufficientDistinctColors {
                requested: k,
                available: self.leaves,
            });
        }

        let mut nodes: Vec<Option<Vec<usize>>> = (0..self.leaves).map(|i| Some(vec![i])).collect();
        for merge in &self.merges[..self.leaves - k] {
            let mut members = nodes[merge.left].take().unwrap_or_default();
            members.extend(nodes[merge.right].take().unwrap_or_default());
            nodes.push(Some(members));
        }

        let mut groups: Vec<Vec<usize>> = nodes
            .into_iter()
            .flatten()
            .map(|mut members| {
                members.sort_unstable();
                members
            })
            .collect();
        groups.sort_by_key(|members| members[0]);
        Ok(groups)
    }
}

/// Average-linkage agglomerative clusterer
#[derive(Debug, Clone)]
pub struct Hierarchical<M> {
    metric: M,
}

impl<M: DistanceMetric> Hierarchical<M> {
    pub fn new(metric: M) -> Self {
        Self { metric }
    }

    pub fn metric(&self) -> &M {
        &self.metric
    }

    /// Build the dendrogram of `points`, which must be in the metric's space
    pub fn fit(&self, points: &[Point]) -> Result<Dendrogram> {
        let n = points.len();
        if n == 0 {
            return Err(GroupingError::EmptyInput);
        }

        let mut distances = Array2::<f64>::zeros((n, n));
        for i in 0..n {
            for j in (i + 1)..n {
                let d = self.metric.distance(&points[i], &points[j]);
                distances[[i, j]] = d;
                distances[[j, i]] = d;
            }
        }

        // slots stay in ascending order: a merge keeps the lower slot
        let mut active: Vec<usize> = (0..n).collect();
        let mut node_of: Vec<usize> = (0..n).collect();
        let mut sizes = vec![1usize; n];
        let mut merges = Vec::with_capacity(n.saturating_sub(1));

        while active.len() > 1 {
            let mut best = (0, 1, f64::INFINITY);
            for p in 0..active.len() {
                for q in (p + 1)..active.len() {
                    let d = distances[[active[p], active[q]]];
                    if d < best.2 {
                        best = (p, q, d);
                    }
                }
            }
            let (p, q, distance) = best;
            let (keep, gone) = (active[p], active[q]);
            let (size_keep, size_gone) = (sizes[keep], sizes[gone]);
            let size = size_keep + size_gone;

            for &other in &active {
                if other == keep || other == gone {
                    continue;
                }
                let updated = (size_keep as f64 * distances[[keep, other]]
                    + size_gone as f64 * distances[[gone, other]])
                    / size as f64;
                distances[[keep, other]] = updated;
                distances[[other, keep]] = updated;
            }

            merges.push(Merge {
                left: node_of[keep],
                right: node_of[gone],
                distance,
                size,
            });
            node_of[keep] = n + merges.len() - 1;
            sizes[keep] = size;
            active.remove(q);
        }

        debug!(
            leaves = n,
            final_distance = merges.last().map_or(0.0, |m| m.distance),
            "built dendrogram"
        );

        Ok(Dendrogram { leaves: n, merges })
    }
}
