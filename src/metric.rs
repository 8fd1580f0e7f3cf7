//! Distance metrics between colors
//!
//! A metric works on [`Point`]s of one [`ColorSpace`]; callers project their
//! colors (and keep their centroids) in the space the metric reports.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::color::{contrast_ratio, ColorSpace, Point};
use crate::config::{CIEDE2000_MAX_ITERATIONS, DEFAULT_MAX_ITERATIONS, READABILITY_MAX_ITERATIONS};
use crate::error::GroupingError;

/// 25^7, used by the chroma compensation terms of CIEDE2000
const POW25_7: f64 = 6_103_515_625.0;

/// A scalar dissimilarity between two points of one color space.
///
/// Implementations must be symmetric. True metrics also return 0 for
/// identical points; [`Metric::InverseReadability`] does not.
pub trait DistanceMetric {
    /// The space the points passed to [`DistanceMetric::distance`] live in
    fn space(&self) -> ColorSpace;

    fn distance(&self, a: &Point, b: &Point) -> f64;

    /// Iteration cap used by iterative clusterers when none is given
    fn default_max_iterations(&self) -> usize {
        DEFAULT_MAX_ITERATIONS
    }
}

/// The available distance metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Metric {
    /// Straight-line distance between RGB triples
    EuclideanRgb,
    /// Straight-line distance between CIELAB coordinates (CIE76)
    EuclideanLab,
    /// CIE 2000 perceptual color difference
    Ciede2000,
    /// `1 / contrast_ratio(a, b)`; not a true metric
    InverseReadability,
}

impl Metric {
    pub const ALL: [Metric; 4] = [
        Metric::EuclideanRgb,
        Metric::EuclideanLab,
        Metric::Ciede2000,
        Metric::InverseReadability,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Metric::EuclideanRgb => "euclidean-rgb",
            Metric::EuclideanLab => "euclidean-lab",
            Metric::Ciede2000 => "ciede2000",
            Metric::InverseReadability => "inverse-readability",
        }
    }

    /// Whether `d(a, a) == 0` and the triangle inequality hold
    pub fn is_true_metric(self) -> bool {
        !matches!(self, Metric::InverseReadability)
    }
}

impl DistanceMetric for Metric {
    fn space(&self) -> ColorSpace {
        match self {
            Metric::EuclideanRgb | Metric::InverseReadability => ColorSpace::Rgb,
            Metric::EuclideanLab | Metric::Ciede2000 => ColorSpace::Lab,
        }
    }

    fn distance(&self, a: &Point, b: &Point) -> f64 {
        match self {
            Metric::EuclideanRgb | Metric::EuclideanLab => euclidean(a, b),
            Metric::Ciede2000 => ciede2000(a, b),
            Metric::InverseReadability => inverse_readability(a, b),
        }
    }

    fn default_max_iterations(&self) -> usize {
        match self {
            Metric::Ciede2000 => CIEDE2000_MAX_ITERATIONS,
            Metric::InverseReadability => READABILITY_MAX_ITERATIONS,
            Metric::EuclideanRgb | Metric::EuclideanLab => DEFAULT_MAX_ITERATIONS,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Metric {
    type Err = GroupingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Metric::ALL
            .into_iter()
            .find(|metric| metric.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                GroupingError::invalid_config(
                    "metric",
                    format!(
                        "unknown metric '{}', expected one of euclidean-rgb, euclidean-lab, ciede2000, inverse-readability",
                        s
                    ),
                )
            })
    }
}

/// Euclidean distance between two points
pub fn euclidean(a: &Point, b: &Point) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}

/// Inverse WCAG contrast ratio between two RGB points, in `[1/21, 1]`
pub fn inverse_readability(a: &Point, b: &Point) -> f64 {
    1.0 / contrast_ratio(*a, *b)
}

/// CIEDE2000 color difference between two CIELAB points (kL = kC = kH = 1)
pub fn ciede2000(lab1: &Point, lab2: &Point) -> f64 {
    let [l1, a1, b1] = *lab1;
    let [l2, a2, b2] = *lab2;

    let c_mean = (a1.hypot(b1) + a2.hypot(b2)) / 2.0;
    let c_mean7 = c_mean.powi(7);
    let g = 0.5 * (1.0 - (c_mean7 / (c_mean7 + POW25_7)).sqrt());

    let a1_prime = a1 * (1.0 + g);
    let a2_prime = a2 * (1.0 + g);
    let c1_prime = a1_prime.hypot(b1);
    let c2_prime = a2_prime.hypot(b2);
    let h1_prime = hue_degrees(b1, a1_prime);
    let h2_prime = hue_degrees(b2, a2_prime);
    let chroma_product = c1_prime * c2_prime;

    let delta_l = l2 - l1;
    let delta_c = c2_prime - c1_prime;
    let delta_h = if chroma_product == 0.0 {
        0.0
    } else {
        let dh = h2_prime - h1_prime;
        if dh > 180.0 {
            dh - 360.0
        } else if dh < -180.0 {
            dh + 360.0
        } else {
            dh
        }
    };
    let delta_big_h = 2.0 * chroma_product.sqrt() * (delta_h / 2.0).to_radians().sin();

    let l_mean = (l1 + l2) / 2.0;
    let c_prime_mean = (c1_prime + c2_prime) / 2.0;
    let h_sum = h1_prime + h2_prime;
    let h_mean = if chroma_product == 0.0 {
        h_sum
    } else if (h1_prime - h2_prime).abs() <= 180.0 {
        h_sum / 2.0
    } else if h_sum < 360.0 {
        (h_sum + 360.0) / 2.0
    } else {
        (h_sum - 360.0) / 2.0
    };

    let t = 1.0 - 0.17 * (h_mean - 30.0).to_radians().cos()
        + 0.24 * (2.0 * h_mean).to_radians().cos()
        + 0.32 * (3.0 * h_mean + 6.0).to_radians().cos()
        - 0.20 * (4.0 * h_mean - 63.0).to_radians().cos();

    let delta_theta = 30.0 * (-((h_mean - 275.0) / 25.0).powi(2)).exp();
    let c_prime_mean7 = c_prime_mean.powi(7);
    let r_c = 2.0 * (c_prime_mean7 / (c_prime_mean7 + POW25_7)).sqrt();
    let l_offset = (l_mean - 50.0).powi(2);
    let s_l = 1.0 + 0.015 * l_offset / (20.0 + l_offset).sqrt();
    let s_c = 1.0 + 0.045 * c_prime_mean;
    let s_h = 1.0 + 0.015 * c_prime_mean * t;
    let r_t = -(2.0 * delta_theta).to_radians().sin() * r_c;

    let lightness = delta_l / s_l;
    let chroma = delta_c / s_c;
    let hue = delta_big_h / s_h;

    (lightness.powi(2) + chroma.powi(2) + hue.powi(2) + r_t * chroma * hue)
        .max(0.0)
        .sqrt()
}

/// Hue angle in degrees within `[0, 360)`
fn hue_degrees(b: f64, a_prime: f64) -> f64 {
    if b == 0.0 && a_prime == 0.0 {
        return 0.0;
    }
    let hue = b.atan2(a_prime).to_degrees();
    if hue < 0.0 {
        hue + 360.0
    } else {
        hue
    }
}
