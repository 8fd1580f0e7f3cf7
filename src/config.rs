//! Grouping configuration
//!
//! A [`GroupingConfig`] selects the algorithm and its parameters. It can be
//! built in code or loaded from JSON:
//!
//! ```no_run
//! use colorforge::{Algorithm, GroupingConfig, Metric};
//!
//! let config = GroupingConfig::new(Algorithm::KMeansPlusPlus)
//!     .with_metric(Metric::Ciede2000)
//!     .with_group_count(10)
//!     .with_random_seed(7);
//!
//! let from_file = GroupingConfig::from_json_file(std::path::Path::new("grouping.json"))?;
//! # Ok::<(), anyhow::Error>(())
//! ```

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::error::{GroupingError, Result};
use crate::metric::{DistanceMetric, Metric};
use crate::report::RepresentativePolicy;

/// Iteration cap for CIEDE2000 runs, whose distance is the most expensive
pub const CIEDE2000_MAX_ITERATIONS: usize = 100;
/// Iteration cap for inverse-readability runs
pub const READABILITY_MAX_ITERATIONS: usize = 1_000;
/// Iteration cap for the Euclidean metrics
pub const DEFAULT_MAX_ITERATIONS: usize = 10_000;

/// Grouping strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Algorithm {
    /// k-means with uniformly random seeds
    #[serde(rename = "kmeans")]
    KMeans,
    /// k-means with k-means++ seeding
    #[serde(rename = "kmeans++", alias = "kmeanspp")]
    KMeansPlusPlus,
    /// Agglomerative average-linkage clustering cut at `groupCount`
    #[serde(rename = "hierarchical")]
    Hierarchical,
    /// Greedy single-pass grouping by contrast ratio
    #[serde(rename = "readability-proximity")]
    ReadabilityProximity,
}

impl Algorithm {
    pub const ALL: [Algorithm; 4] = [
        Algorithm::KMeans,
        Algorithm::KMeansPlusPlus,
        Algorithm::Hierarchical,
        Algorithm::ReadabilityProximity,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Algorithm::KMeans => "kmeans",
            Algorithm::KMeansPlusPlus => "kmeans++",
            Algorithm::Hierarchical => "hierarchical",
            Algorithm::ReadabilityProximity => "readability-proximity",
        }
    }

    /// Centroid-based strategies report convergence and accept an outlier threshold
    pub fn is_centroid_based(self) -> bool {
        matches!(self, Algorithm::KMeans | Algorithm::KMeansPlusPlus)
    }

    pub fn requires_group_count(self) -> bool {
        !matches!(self, Algorithm::ReadabilityProximity)
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Algorithm {
    type Err = GroupingError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase();
        if wanted == "kmeanspp" {
            return Ok(Algorithm::KMeansPlusPlus);
        }
        Algorithm::ALL
            .into_iter()
            .find(|algorithm| algorithm.name() == wanted)
            .ok_or_else(|| {
                GroupingError::invalid_config(
                    "algorithm",
                    format!(
                        "unknown algorithm '{}', expected one of kmeans, kmeans++, hierarchical, readability-proximity",
                        s
                    ),
                )
            })
    }
}

/// Options recognized by the grouping engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupingConfig {
    pub algorithm: Algorithm,

    /// Distance metric; defaults to Euclidean-RGB when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric: Option<Metric>,

    /// Number of groups (k); required by the centroid and hierarchical strategies
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_count: Option<usize>,

    /// Iteration cap for centroid strategies; defaults depend on the metric
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_iterations: Option<usize>,

    /// Distance above which a member is moved out of its centroid cluster
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outlier_threshold: Option<f64>,

    /// Minimum contrast ratio for readability-proximity grouping
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proximity: Option<f64>,

    /// Seed for every stochastic choice; entropy-seeded when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub random_seed: Option<u64>,

    #[serde(default)]
    pub representative: RepresentativePolicy,
}

impl GroupingConfig {
    pub fn new(algorithm: Algorithm) -> Self {
        Self {
            algorithm,
            metric: None,
            group_count: None,
            max_iterations: None,
            outlier_threshold: None,
            proximity: None,
            random_seed: None,
            representative: RepresentativePolicy::default(),
        }
    }

    pub fn with_metric(mut self, metric: Metric) -> Self {
        self.metric = Some(metric);
        self
    }

    pub fn with_group_count(mut self, group_count: usize) -> Self {
        self.group_count = Some(group_count);
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = Some(max_iterations);
        self
    }

    pub fn with_outlier_threshold(mut self, threshold: f64) -> Self {
        self.outlier_threshold = Some(threshold);
        self
    }

    pub fn with_proximity(mut self, proximity: f64) -> Self {
        self.proximity = Some(proximity);
        self
    }

    pub fn with_random_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }

    pub fn with_representative(mut self, policy: RepresentativePolicy) -> Self {
        self.representative = policy;
        self
    }

    /// The metric the strategy will run with
    pub fn effective_metric(&self) -> Metric {
        self.metric.unwrap_or(Metric::EuclideanRgb)
    }

    /// The iteration cap, falling back to the per-metric default
    pub fn effective_max_iterations(&self) -> usize {
        self.max_iterations
            .unwrap_or_else(|| self.effective_metric().default_max_iterations())
    }

    /// Check that every option the selected algorithm needs is present and in range
    pub fn validate(&self) -> Result<()> {
        if self.algorithm.requires_group_count() {
            match self.group_count {
                None => {
                    return Err(GroupingError::invalid_config(
                        "groupCount",
                        format!("required by the {} algorithm", self.algorithm),
                    ))
                }
                Some(0) => {
                    return Err(GroupingError::invalid_config(
                        "groupCount",
                        "must be a positive integer",
                    ))
                }
                Some(_) => {}
            }
        }

        if self.max_iterations == Some(0) {
            return Err(GroupingError::invalid_config(
                "maxIterations",
                "must be a positive integer",
            ));
        }

        if let Some(threshold) = self.outlier_threshold {
            if !threshold.is_finite() || threshold < 0.0 {
                return Err(GroupingError::invalid_config(
                    "outlierThreshold",
                    format!("must be a non-negative number, got {}", threshold),
                ));
            }
        }

        if self.algorithm == Algorithm::ReadabilityProximity {
            match self.proximity {
                None => {
                    return Err(GroupingError::invalid_config(
                        "proximity",
                        "required by the readability-proximity algorithm",
                    ))
                }
                Some(p) if !p.is_finite() || p <= 0.0 => {
                    return Err(GroupingError::invalid_config(
                        "proximity",
                        format!("must be a positive number, got {}", p),
                    ))
                }
                Some(_) => {}
            }
        }

        Ok(())
    }

    /// Parse and validate a JSON configuration
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| GroupingError::invalid_config("config", e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON file
    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_json_str(&content)
            .with_context(|| format!("invalid config file {}", path.display()))
    }

    /// Save configuration to a JSON file
    pub fn to_json_file(&self, path: &Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write config file {}", path.display()))?;
        Ok(())
    }
}
