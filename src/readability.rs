//! Greedy grouping by WCAG contrast ratio
//!
//! A single pass in input order: each not yet visited color becomes the base
//! of a new group and absorbs every other unvisited color whose contrast ratio
//! with it is at least `proximity`.

use tracing::debug;

use crate::color::{contrast_ratio, Point};
use crate::error::{GroupingError, Result};

/// A group produced by [`group_by_proximity`]; indices refer to the input points
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProximityGroup {
    pub base: usize,
    /// Includes `base` as the first entry, then absorbed colors in input order
    pub members: Vec<usize>,
}

/// Absorb the unvisited points around `base`, marking them visited
pub fn proximity_pass(base: usize, points: &[Point], proximity: f64, visited: &mut [bool]) -> Vec<usize> {
    visited[base] = true;
    let mut members = vec![base];
    for (index, point) in points.iter().enumerate() {
        if visited[index] {
            continue;
        }
        if contrast_ratio(points[base], *point) >= proximity {
            visited[index] = true;
            members.push(index);
        }
    }
    members
}

/// Partition RGB `points` by contrast-ratio proximity to each group's base
pub fn group_by_proximity(points: &[Point], proximity: f64) -> Result<Vec<ProximityGroup>> {
    if !proximity.is_finite() || proximity <= 0.0 {
        return Err(GroupingError::invalid_config(
            "proximity",
            format!("must be a positive number, got {}", proximity),
        ));
    }

    let mut visited = vec![false; points.len()];
    let mut groups = Vec::new();
    for base in 0..points.len() {
        if visited[base] {
            continue;
        }
        let members = proximity_pass(base, points, proximity, &mut visited);
        groups.push(ProximityGroup { base, members });
    }

    debug!(
        proximity,
        colors = points.len(),
        groups = groups.len(),
        "readability proximity pass finished"
    );
    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLACK: Point = [0.0, 0.0, 0.0];
    const WHITE: Point = [255.0, 255.0, 255.0];
    const GRAY: Point = [128.0, 128.0, 128.0];
    const NEAR_BLACK: Point = [10.0, 10.0, 10.0];

    #[test]
    fn test_high_contrast_colors_join_the_base() {
        let points = vec![BLACK, NEAR_BLACK, WHITE, GRAY];
        let groups = group_by_proximity(&points, 15.0).unwrap();

        assert_eq!(groups.len(), 3);
        assert_eq!(groups[0], ProximityGroup { base: 0, members: vec![0, 2] });
        assert_eq!(groups[1].members, vec![1]);
        assert_eq!(groups[2].members, vec![3]);
    }

    #[test]
    fn test_proximity_at_most_one_collapses_everything() {
        let points = vec![BLACK, NEAR_BLACK, WHITE, GRAY];
        let groups = group_by_proximity(&points, 1.0).unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].members, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_every_color_lands_in_exactly_one_group() {
        let points: Vec<Point> = (0..20).map(|i| [i as f64 * 12.0, 40.0, 255.0 - i as f64 * 12.0]).collect();
        let groups = group_by_proximity(&points, 1.5).unwrap();
        let mut seen: Vec<usize> = groups.iter().flat_map(|g| g.members.clone()).collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..20).collect::<Vec<_>>());
        assert!(groups.iter().all(|g| g.members[0] == g.base));
    }

    #[test]
    fn test_pass_respects_caller_visited_set() {
        let points = vec![BLACK, WHITE, WHITE];
        let mut visited = vec![false, true, false];
        let members = proximity_pass(0, &points, 2.0, &mut visited);
        assert_eq!(members, vec![0, 2]);
        assert!(visited.iter().all(|&v| v));
    }

    #[test]
    fn test_rejects_non_positive_proximity() {
        assert!(group_by_proximity(&[BLACK], 0.0).is_err());
        assert!(group_by_proximity(&[BLACK], f64::NAN).is_err());
    }
}
