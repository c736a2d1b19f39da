use std::cmp::Ordering;
use std::collections::BTreeSet;

use tracing::{debug, trace};

use crate::config::RoutingConfig;
use crate::geometry::{
    Axis, COORD_EPS, Point, Rect, Side, bend_count, compress_path, manhattan_length,
    path_obstacle_hits, segment_crosses_rect,
};

use super::gaps::GapPoints;
use super::path::points_to_path;

/// Children kept per expansion; the stack pops the best one first, so deeper
/// alternatives rarely matter and only cost memory.
const BRANCHING: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteRequest {
    pub source: Point,
    pub target: Point,
    pub source_side: Side,
    pub target_side: Side,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoutedPath {
    /// SVG `d` string (moveto/lineto only).
    pub path: String,
    /// Ordered corner points, endpoints included.
    pub waypoints: Vec<Point>,
    /// Obstacle crossings left in the path; non-zero only for best-effort routes.
    pub hits: usize,
}

impl RoutedPath {
    pub(super) fn new(waypoints: Vec<Point>, hits: usize) -> Self {
        Self {
            path: points_to_path(&waypoints),
            waypoints,
            hits,
        }
    }

    pub fn is_clear(&self) -> bool {
        self.hits == 0
    }
}

/// Straight-then-turn elbow between the two stubs, ignoring obstacles.
pub fn direct_elbow(request: &RouteRequest, config: &RoutingConfig) -> RoutedPath {
    RoutedPath::new(elbow_points(request, config.stub_length), 0)
}

pub(super) fn elbow_points(request: &RouteRequest, stub: f32) -> Vec<Point> {
    let stub = stub.max(0.0);
    let s = request.source;
    let t = request.target;
    let s1 = request.source_side.offset(s, stub);
    let t1 = request.target_side.offset(t, stub);
    let mut points = vec![s, s1];
    match (request.source_side.axis(), request.target_side.axis()) {
        (Axis::Horizontal, Axis::Horizontal) => {
            let mid_x = (s1.x + t1.x) / 2.0;
            points.push(Point::new(mid_x, s1.y));
            points.push(Point::new(mid_x, t1.y));
        }
        (Axis::Vertical, Axis::Vertical) => {
            let mid_y = (s1.y + t1.y) / 2.0;
            points.push(Point::new(s1.x, mid_y));
            points.push(Point::new(t1.x, mid_y));
        }
        (Axis::Horizontal, Axis::Vertical) => points.push(Point::new(t1.x, s1.y)),
        (Axis::Vertical, Axis::Horizontal) => points.push(Point::new(s1.x, t1.y)),
    }
    points.push(t1);
    points.push(t);
    compress_path(&points)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Lane {
    Row(usize),
    Column(usize),
}

#[derive(Debug, Clone)]
struct State {
    prefix: Vec<Point>,
    heading: (f32, f32),
    visited: BTreeSet<Lane>,
}

#[derive(Debug, Clone)]
struct Candidate {
    points: Vec<Point>,
    hits: usize,
    length: f32,
    bends: usize,
    lane_distance: f32,
    lane_value: f32,
}

impl Candidate {
    fn new(points: Vec<Point>, obstacles: &[Rect], lane_distance: f32, lane_value: f32) -> Self {
        let points = compress_path(&points);
        Self {
            hits: path_obstacle_hits(&points, obstacles),
            length: manhattan_length(&points),
            bends: bend_count(&points),
            points,
            lane_distance,
            lane_value,
        }
    }

    /// Ordering among routes that clear every obstacle.
    fn clear_order(&self, other: &Self) -> Ordering {
        self.length
            .total_cmp(&other.length)
            .then_with(|| self.bends.cmp(&other.bends))
            .then_with(|| self.lane_distance.total_cmp(&other.lane_distance))
            .then_with(|| self.lane_value.total_cmp(&other.lane_value))
    }

    /// Ordering for best-effort and blocked candidates.
    fn partial_order(&self, other: &Self) -> Ordering {
        self.hits
            .cmp(&other.hits)
            .then_with(|| self.clear_order(other))
    }
}

/// Route from `source` to `target` around `obstacles` using `gaps` as lanes.
///
/// Tries the direct elbow first. When it crosses an obstacle, an explicit
/// stack of partial routes is explored: each step moves the fixed prefix onto
/// one unvisited lane and completes with an L-shaped elbow to the target stub.
/// Every pop consumes one retry and retries never exceed the lane count, so
/// the search is bounded by `O(obstacles * lanes * retries)`. When nothing
/// clears, the route with the fewest crossings is returned.
pub fn find_path(
    request: &RouteRequest,
    obstacles: &[Rect],
    gaps: &GapPoints,
    config: &RoutingConfig,
) -> RoutedPath {
    let direct = elbow_points(request, config.stub_length);
    if obstacles.is_empty() {
        return RoutedPath::new(direct, 0);
    }
    let mut best = Candidate::new(direct, obstacles, 0.0, 0.0);
    if best.hits == 0 {
        return RoutedPath::new(best.points, 0);
    }

    let stub = config.stub_length.max(0.0);
    let target_stub = request.target_side.offset(request.target, stub);
    let source_stub = request.source_side.offset(request.source, stub);
    let max_retries = config
        .max_retries
        .map_or(gaps.len(), |limit| limit.min(gaps.len()));

    let mut stack = vec![State {
        prefix: vec![request.source, source_stub],
        heading: request.source_side.outward(),
        visited: BTreeSet::new(),
    }];
    let mut retries = 0usize;

    while let Some(state) = stack.pop() {
        if retries >= max_retries {
            break;
        }
        retries += 1;
        let Some(&current) = state.prefix.last() else {
            continue;
        };

        let mut clear: Vec<Candidate> = Vec::new();
        let mut blocked: Vec<(Candidate, Lane, Point, (f32, f32))> = Vec::new();

        for lane in lanes(gaps) {
            if state.visited.contains(&lane) {
                continue;
            }
            let (step, lane_value) = match lane {
                Lane::Row(idx) => (Point::new(current.x, gaps.rows[idx]), gaps.rows[idx]),
                Lane::Column(idx) => (Point::new(gaps.columns[idx], current.y), gaps.columns[idx]),
            };
            let lane_distance = current.manhattan(step);
            if lane_distance <= COORD_EPS {
                continue;
            }
            let step_heading = heading(current, step);
            if reverses(state.heading, step_heading) {
                continue;
            }
            if obstacles
                .iter()
                .any(|rect| segment_crosses_rect(current, step, rect))
            {
                continue;
            }

            let mut lane_best: Option<Candidate> = None;
            for completion in completions(step, target_stub) {
                let mut points = state.prefix.clone();
                points.push(step);
                points.extend(completion);
                points.push(request.target);
                let candidate = Candidate::new(points, obstacles, lane_distance, lane_value);
                if candidate.partial_order(&best) == Ordering::Less {
                    best = candidate.clone();
                }
                if candidate.hits == 0 {
                    clear.push(candidate);
                } else if lane_best
                    .as_ref()
                    .is_none_or(|b| candidate.partial_order(b) == Ordering::Less)
                {
                    lane_best = Some(candidate);
                }
            }
            if let Some(candidate) = lane_best {
                blocked.push((candidate, lane, step, step_heading));
            }
        }

        if let Some(found) = clear.into_iter().min_by(Candidate::clear_order) {
            trace!(retries, length = found.length, "routed around obstacles");
            return RoutedPath::new(found.points, 0);
        }

        blocked.sort_by(|a, b| a.0.partial_order(&b.0).then_with(|| a.1.cmp(&b.1)));
        blocked.truncate(BRANCHING);
        for (_, lane, step, heading) in blocked.into_iter().rev() {
            let mut prefix = state.prefix.clone();
            prefix.push(step);
            let mut visited = state.visited.clone();
            visited.insert(lane);
            stack.push(State {
                prefix,
                heading,
                visited,
            });
        }
    }

    debug!(
        hits = best.hits,
        retries,
        lanes = gaps.len(),
        "no lane clears every obstacle; using best-effort route"
    );
    RoutedPath::new(best.points, best.hits)
}

fn lanes(gaps: &GapPoints) -> impl Iterator<Item = Lane> {
    (0..gaps.rows.len())
        .map(Lane::Row)
        .chain((0..gaps.columns.len()).map(Lane::Column))
}

fn heading(from: Point, to: Point) -> (f32, f32) {
    let sign = |d: f32| {
        if d > COORD_EPS {
            1.0
        } else if d < -COORD_EPS {
            -1.0
        } else {
            0.0
        }
    };
    (sign(to.x - from.x), sign(to.y - from.y))
}

fn reverses(previous: (f32, f32), next: (f32, f32)) -> bool {
    previous.0 * next.0 < 0.0 || previous.1 * next.1 < 0.0
}

/// Horizontal-first and vertical-first L elbows from `from` to `to`.
fn completions(from: Point, to: Point) -> [[Point; 2]; 2] {
    [
        [Point::new(to.x, from.y), to],
        [Point::new(from.x, to.y), to],
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::gaps::compute_gap_points;

    fn request(source: (f32, f32), source_side: Side, target: (f32, f32), target_side: Side) -> RouteRequest {
        RouteRequest {
            source: Point::new(source.0, source.1),
            target: Point::new(target.0, target.1),
            source_side,
            target_side,
        }
    }

    fn three_in_a_row() -> Vec<Rect> {
        vec![
            Rect::new(60.0, 70.0, 60.0, 60.0),
            Rect::new(170.0, 70.0, 60.0, 60.0),
            Rect::new(280.0, 70.0, 60.0, 60.0),
        ]
    }

    #[test]
    fn direct_elbow_between_facing_sides_is_straight() {
        let req = request((0.0, 100.0), Side::Right, (400.0, 100.0), Side::Left);
        let routed = direct_elbow(&req, &RoutingConfig::default());
        assert_eq!(routed.waypoints, vec![Point::new(0.0, 100.0), Point::new(400.0, 100.0)]);
        assert_eq!(routed.path, "M 0.00 100.00 L 400.00 100.00");
    }

    #[test]
    fn direct_elbow_bends_through_midpoint() {
        let req = request((0.0, 0.0), Side::Right, (200.0, 100.0), Side::Left);
        let routed = direct_elbow(&req, &RoutingConfig::default());
        assert_eq!(
            routed.waypoints,
            vec![
                Point::new(0.0, 0.0),
                Point::new(100.0, 0.0),
                Point::new(100.0, 100.0),
                Point::new(200.0, 100.0),
            ]
        );
    }

    #[test]
    fn mixed_sides_use_two_segment_elbow() {
        let req = request((0.0, 0.0), Side::Right, (200.0, 200.0), Side::Top);
        let routed = direct_elbow(&req, &RoutingConfig::default());
        assert_eq!(
            routed.waypoints,
            vec![Point::new(0.0, 0.0), Point::new(200.0, 0.0), Point::new(200.0, 200.0)]
        );
    }

    #[test]
    fn empty_obstacles_return_direct_elbow() {
        let config = RoutingConfig::default();
        let req = request((10.0, 10.0), Side::Bottom, (300.0, 90.0), Side::Left);
        assert_eq!(
            find_path(&req, &[], &GapPoints::default(), &config),
            direct_elbow(&req, &config)
        );
    }

    #[test]
    fn routes_over_a_row_of_obstacles() {
        let config = RoutingConfig::default();
        let obstacles = three_in_a_row();
        let gaps = compute_gap_points(&obstacles, &config);
        let req = request((0.0, 100.0), Side::Right, (400.0, 100.0), Side::Left);
        let routed = find_path(&req, &obstacles, &gaps, &config);

        assert!(routed.is_clear());
        assert_eq!(path_obstacle_hits(&routed.waypoints, &obstacles), 0);
        let (a, b) = longest_segment(&routed.waypoints);
        assert!((a.y - b.y).abs() < COORD_EPS, "middle segment is horizontal");
        assert!((a.y - 100.0).abs() >= config.clearance_margin);
        // Equal-length detours above and below tie; the lower coordinate wins.
        assert_eq!(a.y, 58.0);
    }

    #[test]
    fn is_deterministic() {
        let config = RoutingConfig::default();
        let obstacles = three_in_a_row();
        let gaps = compute_gap_points(&obstacles, &config);
        let req = request((0.0, 100.0), Side::Right, (400.0, 100.0), Side::Left);
        let first = find_path(&req, &obstacles, &gaps, &config);
        for _ in 0..5 {
            assert_eq!(find_path(&req, &obstacles, &gaps, &config).path, first.path);
        }
    }

    #[test]
    fn returns_best_effort_when_no_lane_helps() {
        let config = RoutingConfig::default();
        // Target sits inside an obstacle; nothing can clear it.
        let obstacles = vec![Rect::new(300.0, 0.0, 200.0, 200.0)];
        let req = request((0.0, 100.0), Side::Right, (400.0, 100.0), Side::Left);
        let gaps = compute_gap_points(&obstacles, &config);
        let routed = find_path(&req, &obstacles, &gaps, &config);
        assert!(!routed.is_clear());
        assert_eq!(routed.waypoints.first(), Some(&req.source));
        assert_eq!(routed.waypoints.last(), Some(&req.target));
        assert!(!routed.path.is_empty());
    }

    #[test]
    fn without_lanes_falls_back_to_direct_elbow() {
        let config = RoutingConfig::default();
        let obstacles = three_in_a_row();
        let req = request((0.0, 100.0), Side::Right, (400.0, 100.0), Side::Left);
        let routed = find_path(&req, &obstacles, &GapPoints::default(), &config);
        assert_eq!(routed.waypoints, direct_elbow(&req, &config).waypoints);
        assert_eq!(routed.hits, 3);
    }

    #[test]
    fn retry_limit_is_respected() {
        let config = RoutingConfig {
            max_retries: Some(0),
            ..RoutingConfig::default()
        };
        let obstacles = three_in_a_row();
        let gaps = compute_gap_points(&obstacles, &config);
        let req = request((0.0, 100.0), Side::Right, (400.0, 100.0), Side::Left);
        let routed = find_path(&req, &obstacles, &gaps, &config);
        assert_eq!(routed.hits, 3);
    }

    #[test]
    fn detours_around_obstacle_between_stacked_nodes() {
        let config = RoutingConfig::default();
        let obstacles = vec![Rect::new(50.0, 80.0, 100.0, 40.0)];
        let gaps = compute_gap_points(&obstacles, &config);
        let req = request((100.0, 0.0), Side::Bottom, (100.0, 200.0), Side::Top);
        let routed = find_path(&req, &obstacles, &gaps, &config);
        assert!(routed.is_clear());
        let xs: Vec<f32> = routed.waypoints.iter().map(|p| p.x).collect();
        assert!(xs.contains(&38.0) || xs.contains(&162.0));
    }

    fn longest_segment(points: &[Point]) -> (Point, Point) {
        let mut best = (points[0], points[1]);
        for pair in points.windows(2) {
            if pair[0].manhattan(pair[1]) > best.0.manhattan(best.1) {
                best = (pair[0], pair[1]);
            }
        }
        best
    }
}
