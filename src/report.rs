//! Final grouping output
//!
//! Every strategy hands its raw clusters (member indices plus a centroid) to
//! [`ReportBuilder`], which resolves representatives and produces an
//! immutable [`ClusterReport`].

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

use crate::color::{Color, ColorSpace, Point};
use crate::error::GroupingError;
use crate::kmeans::{mean_point, nearest_centroid};
use crate::metric::DistanceMetric;

/// Member indices (into the unique color list) and the cluster's centroid
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    pub members: Vec<usize>,
    pub centroid: Point,
}

impl Cluster {
    pub fn new(members: Vec<usize>, centroid: Point) -> Self {
        Self { members, centroid }
    }

    /// A cluster whose centroid is the mean of its members in `space`
    pub fn from_members(members: Vec<usize>, points: &[Point], space: ColorSpace) -> Self {
        let centroid = mean_point(points, &members, space).unwrap_or([0.0; 3]);
        Self { members, centroid }
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// How a group's representative color is chosen
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RepresentativePolicy {
    /// The centroid mapped back to the nearest displayable RGB color
    #[default]
    Centroid,
    /// The member closest to the centroid under the active metric
    NearestMember,
    /// A uniformly random member
    RandomMember,
}

impl RepresentativePolicy {
    pub fn name(self) -> &'static str {
        match self {
            RepresentativePolicy::Centroid => "centroid",
            RepresentativePolicy::NearestMember => "nearest-member",
            RepresentativePolicy::RandomMember => "random-member",
        }
    }
}

impl fmt::Display for RepresentativePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for RepresentativePolicy {
    type Err = GroupingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            RepresentativePolicy::Centroid,
            RepresentativePolicy::NearestMember,
            RepresentativePolicy::RandomMember,
        ]
        .into_iter()
        .find(|policy| policy.name().eq_ignore_ascii_case(s.trim()))
        .ok_or_else(|| {
            GroupingError::invalid_config(
                "representative",
                format!(
                    "unknown policy '{}', expected centroid, nearest-member or random-member",
                    s
                ),
            )
        })
    }
}

/// One output group
#[derive(Debug, Clone, PartialEq)]
pub struct ColorGroup {
    pub representative: Color,
    pub members: Vec<Color>,
}

/// Convergence metadata of centroid-based runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvergenceInfo {
    pub did_converge: bool,
    pub iterations: usize,
}

/// The final partition of the unique input colors
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterReport {
    groups: Vec<ColorGroup>,
    convergence: Option<ConvergenceInfo>,
}

impl ClusterReport {
    pub fn groups(&self) -> &[ColorGroup] {
        &self.groups
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// `None` for strategies that do not iterate
    pub fn convergence(&self) -> Option<ConvergenceInfo> {
        self.convergence
    }

    /// Total number of member colors across all groups
    pub fn member_count(&self) -> usize {
        self.groups.iter().map(|g| g.members.len()).sum()
    }

    /// Index of the group containing `color`
    pub fn group_of(&self, color: &Color) -> Option<usize> {
        self.groups
            .iter()
            .position(|group| group.members.contains(color))
    }

    /// Every lowercased member spelling -> representative hex, for replacing
    /// colors in documents
    pub fn replacement_map(&self) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        for group in &self.groups {
            let hex = group.representative.hex();
            for token in group.members.iter().flat_map(|member| member.tokens()) {
                map.insert(token.to_ascii_lowercase(), hex.clone());
            }
        }
        map
    }
}

#[derive(Serialize)]
struct GroupView<'a> {
    representative: String,
    members: Vec<&'a str>,
}

#[derive(Serialize)]
struct ReportView<'a> {
    groups: usize,
    list: Vec<GroupView<'a>>,
    #[serde(flatten)]
    convergence: Option<ConvergenceInfo>,
}

impl Serialize for ClusterReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        ReportView {
            groups: self.groups.len(),
            list: self
                .groups
                .iter()
                .map(|group| GroupView {
                    representative: group.representative.hex(),
                    members: group.members.iter().map(Color::token).collect(),
                })
                .collect(),
            convergence: self.convergence,
        }
        .serialize(serializer)
    }
}

/// Assembles a [`ClusterReport`] from raw clusters of any strategy
pub struct ReportBuilder<'a> {
    colors: &'a [Color],
    points: &'a [Point],
    space: ColorSpace,
    policy: RepresentativePolicy,
}

impl<'a> ReportBuilder<'a> {
    /// `points` are the projections of `colors` into `space`
    pub fn new(colors: &'a [Color], points: &'a [Point], space: ColorSpace) -> Self {
        Self {
            colors,
            points,
            space,
            policy: RepresentativePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: RepresentativePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Build groups from centroid clusters, dropping empty ones
    pub fn build<M, R>(
        &self,
        clusters: &[Cluster],
        metric: &M,
        rng: &mut R,
        convergence: Option<ConvergenceInfo>,
    ) -> ClusterReport
    where
        M: DistanceMetric + ?Sized,
        R: Rng + ?Sized,
    {
        let groups = clusters
            .iter()
            .filter(|cluster| !cluster.is_empty())
            .map(|cluster| ColorGroup {
                representative: self.representative(cluster, metric, rng),
                members: self.members(&cluster.members),
            })
            .collect();

        ClusterReport {
            groups,
            convergence,
        }
    }

    /// Build groups whose representative is already decided (`(representative, members)`)
    pub fn build_with_representatives(&self, groups: &[(usize, Vec<usize>)]) -> ClusterReport {
        let groups = groups
            .iter()
            .filter(|(_, members)| !members.is_empty())
            .map(|(representative, members)| ColorGroup {
                representative: self.colors[*representative].clone(),
                members: self.members(members),
            })
            .collect();

        ClusterReport {
            groups,
            convergence: None,
        }
    }

    fn members(&self, indices: &[usize]) -> Vec<Color> {
        indices.iter().map(|&i| self.colors[i].clone()).collect()
    }

    fn representative<M, R>(&self, cluster: &Cluster, metric: &M, rng: &mut R) -> Color
    where
        M: DistanceMetric + ?Sized,
        R: Rng + ?Sized,
    {
        match self.policy {
            RepresentativePolicy::Centroid => Color::from_rgb(self.space.to_rgb(cluster.centroid)),
            RepresentativePolicy::NearestMember => {
                let candidates: Vec<Point> = cluster.members.iter().map(|&i| self.points[i]).collect();
                let (best, _) = nearest_centroid(metric, &cluster.centroid, &candidates).unwrap_or((0, 0.0));
                self.colors[cluster.members[best]].clone()
            }
            RepresentativePolicy::RandomMember => {
                let pick = rng.gen_range(0..cluster.members.len());
                self.colors[cluster.members[pick]].clone()
            }
        }
    }
}
