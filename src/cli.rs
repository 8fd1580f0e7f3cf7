//! Command-line interface definitions and argument parsing

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use crate::config::{Algorithm, GroupingConfig};
use crate::metric::Metric;
use crate::report::RepresentativePolicy;

/// Group count used when neither the flags nor the config file give one
pub const DEFAULT_GROUP_COUNT: usize = 10;
/// Contrast ratio used by readability-proximity when none is given
pub const DEFAULT_PROXIMITY: f64 = 1.5;

/// Reduce a list of colors to a few representative groups
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the color file (one token per line, or JSON)
    #[arg(short, long, default_value = "colors.txt")]
    pub input: PathBuf,

    /// Grouping algorithm: kmeans, kmeans++, hierarchical, readability-proximity
    #[arg(short, long)]
    pub algorithm: Option<Algorithm>,

    /// Distance metric: euclidean-rgb, euclidean-lab, ciede2000, inverse-readability
    #[arg(short, long)]
    pub metric: Option<Metric>,

    /// Number of groups
    #[arg(short = 'k', long)]
    pub groups: Option<usize>,

    /// Maximum iterations for the centroid algorithms
    #[arg(long)]
    pub max_iters: Option<usize>,

    /// Move members farther than this from their centroid
    #[arg(long)]
    pub outlier_threshold: Option<f64>,

    /// Minimum contrast ratio for readability-proximity grouping
    #[arg(long)]
    pub proximity: Option<f64>,

    /// Random seed for reproducible runs
    #[arg(long)]
    pub seed: Option<u64>,

    /// Representative policy: centroid, nearest-member, random-member
    #[arg(long)]
    pub representative: Option<RepresentativePolicy>,

    /// JSON grouping config; flags override its values
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output path for the JSON report
    #[arg(short, long, default_value = "grouped_colors.json")]
    pub output: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Merge the config file (if any) with the flags into a validated configuration
    pub fn to_config(&self) -> anyhow::Result<GroupingConfig> {
        let mut config = match &self.config {
            Some(path) => GroupingConfig::from_json_file(path)?,
            None => GroupingConfig::new(Algorithm::KMeansPlusPlus),
        };

        if let Some(algorithm) = self.algorithm {
            config.algorithm = algorithm;
        }
        if let Some(metric) = self.metric {
            config.metric = Some(metric);
        }
        if self.groups == Some(0) {
            anyhow::bail!("Number of groups must be at least 1");
        }
        if let Some(groups) = self.groups {
            config.group_count = Some(groups);
        }
        if let Some(max_iters) = self.max_iters {
            config.max_iterations = Some(max_iters);
        }
        if let Some(threshold) = self.outlier_threshold {
            config.outlier_threshold = Some(threshold);
        }
        if let Some(proximity) = self.proximity {
            config.proximity = Some(proximity);
        }
        if let Some(seed) = self.seed {
            config.random_seed = Some(seed);
        }
        if let Some(policy) = self.representative {
            config.representative = policy;
        }

        if config.algorithm.requires_group_count() && config.group_count.is_none() {
            config.group_count = Some(DEFAULT_GROUP_COUNT);
        }
        if config.algorithm == Algorithm::ReadabilityProximity && config.proximity.is_none() {
            config.proximity = Some(DEFAULT_PROXIMITY);
        }

        config.validate().context("Invalid grouping options")?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_flags() {
        let args = Args::try_parse_from([
            "colorforge",
            "--input",
            "palette.txt",
            "-a",
            "kmeans",
            "-m",
            "ciede2000",
            "-k",
            "6",
            "--seed",
            "7",
            "--representative",
            "nearest-member",
        ])
        .unwrap();

        let config = args.to_config().unwrap();
        assert_eq!(config.algorithm, Algorithm::KMeans);
        assert_eq!(config.metric, Some(Metric::Ciede2000));
        assert_eq!(config.group_count, Some(6));
        assert_eq!(config.random_seed, Some(7));
        assert_eq!(config.representative, RepresentativePolicy::NearestMember);
        assert_eq!(config.effective_max_iterations(), 100);
    }

    #[test]
    fn test_defaults_fill_required_options() {
        let args = Args::try_parse_from(["colorforge"]).unwrap();
        let config = args.to_config().unwrap();
        assert_eq!(config.algorithm, Algorithm::KMeansPlusPlus);
        assert_eq!(config.group_count, Some(DEFAULT_GROUP_COUNT));

        let args = Args::try_parse_from(["colorforge", "-a", "readability-proximity"]).unwrap();
        assert_eq!(args.to_config().unwrap().proximity, Some(DEFAULT_PROXIMITY));
    }

    #[test]
    fn test_flags_override_config_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"algorithm": "hierarchical", "groupCount": 4, "metric": "euclidean-lab"}}"#
        )
        .unwrap();

        let path = file.path().to_str().unwrap();
        let args = Args::try_parse_from(["colorforge", "--config", path, "-k", "8"]).unwrap();
        let config = args.to_config().unwrap();
        assert_eq!(config.algorithm, Algorithm::Hierarchical);
        assert_eq!(config.metric, Some(Metric::EuclideanLab));
        assert_eq!(config.group_count, Some(8));
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(Args::try_parse_from(["colorforge", "-a", "dbscan"]).is_err());
        assert!(Args::try_parse_from(["colorforge", "-m", "manhattan"]).is_err());

        let args = Args::try_parse_from(["colorforge", "-k", "0"]).unwrap();
        assert!(args.to_config().is_err());

        let args = Args::try_parse_from(["colorforge", "--outlier-threshold=-2"]).unwrap();
        assert!(args.to_config().is_err());
    }
}
