//! The grouping entry point
//!
//! [`group_colors`] parses and deduplicates the tokens, builds the run's RNG,
//! dispatches to the configured strategy and assembles the report.

use std::collections::HashMap;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};

use crate::color::{Color, ColorSpace, Point};
use crate::config::{Algorithm, GroupingConfig};
use crate::error::{GroupingError, Result};
use crate::hierarchical::Hierarchical;
use crate::kmeans::{mean_point, CentroidClustering, KMeans, Seeding};
use crate::metric::{DistanceMetric, Metric};
use crate::outlier;
use crate::readability;
use crate::report::{Cluster, ClusterReport, ConvergenceInfo, ReportBuilder, RepresentativePolicy};

/// Parse every token, failing on the first bad one, and keep the first
/// occurrence of each distinct RGB color.
///
/// Later spellings of an already seen color are recorded as its aliases.
pub fn parse_unique<S: AsRef<str>>(tokens: &[S]) -> Result<Vec<Color>> {
    let mut index_of: HashMap<[u8; 3], usize> = HashMap::new();
    let mut unique: Vec<Color> = Vec::new();
    for token in tokens {
        let color = Color::parse(token.as_ref())?;
        match index_of.get(&color.rgb()) {
            Some(&index) => unique[index].add_alias(color.token()),
            None => {
                index_of.insert(color.rgb(), unique.len());
                unique.push(color);
            }
        }
    }
    Ok(unique)
}

/// The RNG of one invocation: seeded when `random_seed` is set, from OS entropy otherwise
pub fn rng_for(config: &GroupingConfig) -> ChaCha8Rng {
    match config.random_seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    }
}

/// Group color tokens according to `config`
pub fn group_colors<S: AsRef<str>>(tokens: &[S], config: &GroupingConfig) -> Result<ClusterReport> {
    config.validate()?;
    let colors = parse_unique(tokens)?;
    debug!(
        tokens = tokens.len(),
        unique = colors.len(),
        "parsed color tokens"
    );
    let mut rng = rng_for(config);
    group_parsed(&colors, config, &mut rng)
}

/// Group already parsed, deduplicated colors using the caller's RNG
pub fn group_parsed<R: Rng + ?Sized>(
    colors: &[Color],
    config: &GroupingConfig,
    rng: &mut R,
) -> Result<ClusterReport> {
    config.validate()?;
    if colors.is_empty() {
        return Err(GroupingError::EmptyInput);
    }

    let metric = config.effective_metric();
    if config.outlier_threshold.is_some() && !config.algorithm.is_centroid_based() {
        warn!(
            algorithm = %config.algorithm,
            "outlier threshold only applies to centroid strategies and is ignored"
        );
    }

    let report = match config.algorithm {
        Algorithm::KMeans | Algorithm::KMeansPlusPlus => {
            run_centroid(colors, config, metric, rng)?
        }
        Algorithm::Hierarchical => run_hierarchical(colors, config, rng)?,
        Algorithm::ReadabilityProximity => run_readability(colors, config)?,
    };

    info!(
        algorithm = %config.algorithm,
        colors = colors.len(),
        groups = report.len(),
        "grouping finished"
    );
    Ok(report)
}

fn run_centroid<R: Rng + ?Sized>(
    colors: &[Color],
    config: &GroupingConfig,
    metric: Metric,
    rng: &mut R,
) -> Result<ClusterReport> {
    let k = required_group_count(config)?;
    let seeding = match config.algorithm {
        Algorithm::KMeans => Seeding::Uniform,
        _ => Seeding::PlusPlus,
    };
    let space = metric.space();
    let points = project(colors, space);

    let clustering = KMeans::new(metric, k)
        .with_max_iterations(config.effective_max_iterations())
        .with_seeding(seeding)
        .fit(&points, rng)?;

    let clusters = match config.outlier_threshold {
        Some(threshold) => outlier::reconcile(&clustering, &points, &metric, threshold)?.clusters,
        None => clustering.clusters(),
    };

    let convergence = ConvergenceInfo {
        did_converge: clustering.converged,
        iterations: clustering.iterations,
    };
    Ok(ReportBuilder::new(colors, &points, space)
        .with_policy(config.representative)
        .build(&clusters, &metric, rng, Some(convergence)))
}

fn run_hierarchical<R: Rng + ?Sized>(
    colors: &[Color],
    config: &GroupingConfig,
    rng: &mut R,
) -> Result<ClusterReport> {
    let k = required_group_count(config)?;
    if let Some(configured) = config.metric {
        debug!(metric = %configured, "hierarchical clustering uses euclidean-rgb; metric ignored");
    }
    let metric = Metric::EuclideanRgb;
    let space = metric.space();
    let points = project(colors, space);

    let groups = Hierarchical::new(metric).fit(&points)?.flatten(k)?;
    let clusters: Vec<Cluster> = groups
        .into_iter()
        .map(|members| Cluster::from_members(members, &points, space))
        .collect();

    Ok(ReportBuilder::new(colors, &points, space)
        .with_policy(config.representative)
        .build(&clusters, &metric, rng, None))
}

fn run_readability(colors: &[Color], config: &GroupingConfig) -> Result<ClusterReport> {
    let proximity = config.proximity.ok_or_else(|| {
        GroupingError::invalid_config("proximity", "required by the readability-proximity algorithm")
    })?;
    if config.metric.is_some() {
        debug!("readability proximity always compares contrast ratios; metric ignored");
    }
    if config.representative != RepresentativePolicy::default() {
        debug!(
            representative = %config.representative,
            "readability proximity represents each group by its base color; policy ignored"
        );
    }

    let points = project(colors, ColorSpace::Rgb);
    let groups: Vec<(usize, Vec<usize>)> = readability::group_by_proximity(&points, proximity)?
        .into_iter()
        .map(|group| (group.base, group.members))
        .collect();

    Ok(ReportBuilder::new(colors, &points, ColorSpace::Rgb).build_with_representatives(&groups))
}

fn required_group_count(config: &GroupingConfig) -> Result<usize> {
    config.group_count.ok_or_else(|| {
        GroupingError::invalid_config(
            "groupCount",
            format!("required by the {} algorithm", config.algorithm),
        )
    })
}

fn project(colors: &[Color], space: ColorSpace) -> Vec<Point> {
    colors.iter().map(|color| space.project(color)).collect()
}

/// Cluster quality of a finished report under `metric`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quality {
    /// Sum of squared member-to-mean distances
    pub inertia: f64,
    /// Mean silhouette coefficient over the first `sample_size` colors
    pub silhouette: f64,
}

/// Score `report` in the space of `metric`, using each group's member mean as its centroid
pub fn assess(report: &ClusterReport, metric: Metric, sample_size: usize) -> Quality {
    let space = metric.space();
    let mut points = Vec::with_capacity(report.member_count());
    let mut assignments = Vec::with_capacity(report.member_count());
    let mut centroids = Vec::with_capacity(report.len());

    for (index, group) in report.groups().iter().enumerate() {
        let start = points.len();
        points.extend(group.members.iter().map(|color| space.project(color)));
        assignments.extend(std::iter::repeat(index).take(group.members.len()));
        let members: Vec<usize> = (start..points.len()).collect();
        centroids.push(mean_point(&points, &members, space).unwrap_or([0.0; 3]));
    }

    let clustering = CentroidClustering {
        centroids,
        assignments,
        iterations: 0,
        converged: true,
        space,
    };
    Quality {
        inertia: clustering.inertia(&points, &metric),
        silhouette: clustering.silhouette_sample(&points, &metric, sample_size),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED_BLUE: [&str; 6] = ["#ff0000", "#fe0101", "#fd0202", "#0000ff", "#0101fe", "#0202fd"];

    #[test]
    fn test_parse_unique_keeps_first_occurrence() {
        let colors = parse_unique(&["#fff", "white", "#000000", "rgb(255, 255, 255)", "black"]).unwrap();
        assert_eq!(colors.len(), 2);
        assert_eq!(colors[0].token(), "#fff");
        assert_eq!(colors[1].token(), "#000000");
        assert_eq!(colors[0].aliases(), ["white", "rgb(255, 255, 255)"]);
        assert_eq!(colors[1].aliases(), ["black"]);
    }

    #[test]
    fn test_parse_unique_fails_fast() {
        let err = parse_unique(&["#fff", "url(#grad)", "nonsense"]).unwrap_err();
        assert!(matches!(err, GroupingError::Parse { ref token, .. } if token == "url(#grad)"));
    }

    #[test]
    fn test_kmeans_plus_plus_separates_red_and_blue() {
        let config = GroupingConfig::new(Algorithm::KMeansPlusPlus)
            .with_group_count(2)
            .with_random_seed(11);
        let report = group_colors(&RED_BLUE, &config).unwrap();

        assert_eq!(report.len(), 2);
        let red = report.group_of(&Color::parse("#ff0000").unwrap()).unwrap();
        let blue = report.group_of(&Color::parse("#0000ff").unwrap()).unwrap();
        assert_ne!(red, blue);
        assert_eq!(report.groups()[red].members.len(), 3);
        assert!(report.convergence().unwrap().did_converge);
    }

    #[test]
    fn test_seed_makes_runs_reproducible() {
        let tokens: Vec<String> = (0..40).map(|i| format!("#{:02x}{:02x}80", i * 6, 255 - i * 6)).collect();
        let config = GroupingConfig::new(Algorithm::KMeans)
            .with_group_count(4)
            .with_random_seed(99)
            .with_representative(RepresentativePolicy::RandomMember);

        let first = group_colors(&tokens, &config).unwrap();
        let second = group_colors(&tokens, &config).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_hierarchical_groups_by_hue() {
        let config = GroupingConfig::new(Algorithm::Hierarchical).with_group_count(2);
        let report = group_colors(&RED_BLUE, &config).unwrap();

        assert_eq!(report.len(), 2);
        assert!(report.convergence().is_none());
        assert_eq!(report.groups()[0].representative.hex(), "#fe0101");
        assert_eq!(report.groups()[1].representative.hex(), "#0101fe");
    }

    #[test]
    fn test_hierarchical_ignores_configured_metric() {
        let tokens: Vec<String> = (0..24)
            .map(|i| format!("#{:02x}{:02x}{:02x}", (i * 53) % 256, (i * 29 + 60) % 256, (i * 97) % 256))
            .collect();
        let config = GroupingConfig::new(Algorithm::Hierarchical).with_group_count(4);
        let baseline = group_colors(&tokens, &config).unwrap();

        for metric in Metric::ALL {
            let configured = config.clone().with_metric(metric);
            assert_eq!(group_colors(&tokens, &configured).unwrap(), baseline, "{}", metric);
        }
    }

    #[test]
    fn test_readability_uses_base_as_representative() {
        let config = GroupingConfig::new(Algorithm::ReadabilityProximity).with_proximity(15.0);
        let report = group_colors(&["black", "white", "#0a0a0a", "gray"], &config).unwrap();

        assert_eq!(report.len(), 3);
        assert_eq!(report.groups()[0].representative.token(), "black");
        assert_eq!(report.groups()[0].members.len(), 2);

        let nearest = config.with_representative(RepresentativePolicy::NearestMember);
        let again = group_colors(&["black", "white", "#0a0a0a", "gray"], &nearest).unwrap();
        assert_eq!(again, report);
        assert_eq!(again.groups()[0].representative.token(), "black");
    }

    #[test]
    fn test_outlier_threshold_isolates_far_color() {
        let config = GroupingConfig::new(Algorithm::KMeansPlusPlus)
            .with_group_count(2)
            .with_outlier_threshold(30.0)
            .with_random_seed(1);
        let tokens = ["#000000", "#020202", "#fafafa", "#fcfcfc", "#282828"];
        let report = group_colors(&tokens, &config).unwrap();

        assert_eq!(report.len(), 3);
        assert_eq!(report.member_count(), 5);
        let isolated = report.group_of(&Color::parse("#282828").unwrap()).unwrap();
        assert_eq!(report.groups()[isolated].members.len(), 1);
        assert_eq!(report.groups()[isolated].representative.hex(), "#282828");
    }

    #[test]
    fn test_errors_surface() {
        let config = GroupingConfig::new(Algorithm::KMeansPlusPlus).with_group_count(3);
        assert_eq!(
            group_colors(&["#fff", "white"], &config).unwrap_err(),
            GroupingError::InsufficientDistinctColors {
                requested: 3,
                available: 1
            }
        );
        assert_eq!(
            group_colors::<&str>(&[], &config).unwrap_err(),
            GroupingError::EmptyInput
        );

        let missing = GroupingConfig::new(Algorithm::Hierarchical);
        assert!(matches!(
            group_colors(&RED_BLUE, &missing),
            Err(GroupingError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_assess_scores_separated_groups() {
        let config = GroupingConfig::new(Algorithm::KMeansPlusPlus)
            .with_group_count(2)
            .with_random_seed(3);
        let report = group_colors(&RED_BLUE, &config).unwrap();
        let quality = assess(&report, Metric::EuclideanRgb, 100);
        assert!(quality.silhouette > 0.9);
        assert!(quality.inertia < 20.0);
    }
}
