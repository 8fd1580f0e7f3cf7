//! colorforge: reduce a large set of colors to a few representative groups
//!
//! Colors are parsed from CSS-style tokens, projected into RGB or CIELAB and
//! grouped with k-means, k-means++, average-linkage hierarchical clustering or
//! a greedy contrast-ratio pass. The resulting [`ClusterReport`] maps every
//! input color to the representative of its group.
//!
//! ```no_run
//! use colorforge::{group_colors, Algorithm, GroupingConfig, Metric};
//!
//! let config = GroupingConfig::new(Algorithm::KMeansPlusPlus)
//!     .with_metric(Metric::Ciede2000)
//!     .with_group_count(2)
//!     .with_random_seed(42);
//! let report = group_colors(&["#ff0000", "#fe0101", "#0000ff", "navy"], &config)?;
//! for group in report.groups() {
//!     println!("{} <- {} colors", group.representative, group.members.len());
//! }
//! # Ok::<(), colorforge::GroupingError>(())
//! ```

pub mod cli;
pub mod color;
pub mod config;
pub mod data;
pub mod engine;
pub mod error;
pub mod hierarchical;
pub mod kmeans;
pub mod metric;
pub mod outlier;
pub mod readability;
pub mod report;

// Re-export public items for easier access
pub use cli::Args;
pub use color::{Color, ColorSpace, Point};
pub use config::{Algorithm, GroupingConfig};
pub use data::{load_color_tokens, write_report};
pub use engine::{assess, group_colors, group_parsed, parse_unique, Quality};
pub use error::{GroupingError, Result};
pub use hierarchical::{Dendrogram, Hierarchical, Merge};
pub use kmeans::{CentroidClustering, KMeans, Seeding};
pub use metric::{DistanceMetric, Metric};
pub use outlier::{reconcile, Reconciliation};
pub use readability::{group_by_proximity, ProximityGroup};
pub use report::{
    Cluster, ClusterReport, ColorGroup, ConvergenceInfo, ReportBuilder, RepresentativePolicy,
};
