use serde::{Deserialize, Serialize};

use crate::config::RoutingConfig;
use crate::geometry::Rect;

/// Safe lanes derived from one category's rectangles.
///
/// `columns` are x-coordinates for vertical travel, `rows` are y-coordinates
/// for horizontal travel. Both are strictly ascending and no two values are
/// within the dedup epsilon of each other.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GapPoints {
    pub columns: Vec<f32>,
    pub rows: Vec<f32>,
}

impl GapPoints {
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() && self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.columns.len() + self.rows.len()
    }
}

pub fn compute_gap_points(rects: &[Rect], config: &RoutingConfig) -> GapPoints {
    if rects.is_empty() {
        return GapPoints::default();
    }
    let margin = config.clearance_margin.max(0.0);
    let mut columns = Vec::with_capacity(rects.len() * 2);
    let mut rows = Vec::with_capacity(rects.len() * 2);
    for rect in rects.iter().filter(|r| r.is_finite()) {
        columns.push(rect.x - margin);
        columns.push(rect.right() + margin);
        rows.push(rect.y - margin);
        rows.push(rect.bottom() + margin);
    }
    GapPoints {
        columns: sorted_lanes(columns, config.gap_epsilon),
        rows: sorted_lanes(rows, config.gap_epsilon),
    }
}

fn sorted_lanes(mut values: Vec<f32>, epsilon: f32) -> Vec<f32> {
    values.retain(|v| v.is_finite());
    values.sort_by(f32::total_cmp);
    let epsilon = epsilon.max(0.0);
    let mut out: Vec<f32> = Vec::with_capacity(values.len());
    for value in values {
        match out.last() {
            Some(&last) if value - last <= epsilon => {}
            _ => out.push(value),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(margin: f32, epsilon: f32) -> RoutingConfig {
        RoutingConfig {
            clearance_margin: margin,
            gap_epsilon: epsilon,
            ..RoutingConfig::default()
        }
    }

    #[test]
    fn empty_input_has_no_lanes() {
        let gaps = compute_gap_points(&[], &RoutingConfig::default());
        assert!(gaps.is_empty());
        assert_eq!(gaps.len(), 0);
    }

    #[test]
    fn lanes_sit_outside_rect_edges() {
        let gaps = compute_gap_points(&[Rect::new(100.0, 50.0, 40.0, 20.0)], &config(10.0, 1.0));
        assert_eq!(gaps.columns, vec![90.0, 150.0]);
        assert_eq!(gaps.rows, vec![40.0, 80.0]);
    }

    #[test]
    fn near_duplicate_lanes_collapse() {
        let rects = [
            Rect::new(0.0, 0.0, 10.0, 10.0),
            Rect::new(0.4, 30.0, 10.0, 10.0),
            Rect::new(50.0, 0.2, 10.0, 10.0),
        ];
        let gaps = compute_gap_points(&rects, &config(5.0, 1.0));
        assert_eq!(gaps.columns, vec![-5.0, 15.0, 45.0, 65.0]);
        assert_eq!(gaps.rows, vec![-5.0, 15.0, 25.0, 45.0]);
    }

    #[test]
    fn non_finite_rects_are_skipped() {
        let rects = [
            Rect::new(f32::NAN, 0.0, 10.0, 10.0),
            Rect::new(0.0, 0.0, 10.0, 10.0),
        ];
        let gaps = compute_gap_points(&rects, &config(0.0, 0.5));
        assert_eq!(gaps.columns, vec![0.0, 10.0]);
    }

    #[test]
    fn order_of_input_does_not_matter() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(40.0, 60.0, 10.0, 30.0);
        let cfg = RoutingConfig::default();
        assert_eq!(compute_gap_points(&[a, b], &cfg), compute_gap_points(&[b, a], &cfg));
    }
}
