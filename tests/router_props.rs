use proptest::prelude::*;

use topology_router::config::RoutingConfig;
use topology_router::geometry::{
    COORD_EPS, Point, Rect, Side, compress_path, path_obstacle_hits, segment_crosses_rect,
};
use topology_router::routing::{GapPoints, RouteRequest, compute_gap_points, direct_elbow, find_path};

fn side() -> impl Strategy<Value = Side> {
    prop_oneof![
        Just(Side::Top),
        Just(Side::Right),
        Just(Side::Bottom),
        Just(Side::Left),
    ]
}

fn point() -> impl Strategy<Value = Point> {
    (0i32..600, 0i32..600).prop_map(|(x, y)| Point::new(x as f32, y as f32))
}

fn rect() -> impl Strategy<Value = Rect> {
    (0i32..500, 0i32..500, 10i32..120, 10i32..120)
        .prop_map(|(x, y, w, h)| Rect::new(x as f32, y as f32, w as f32, h as f32))
}

fn request() -> impl Strategy<Value = RouteRequest> {
    (point(), side(), point(), side()).prop_map(|(source, source_side, target, target_side)| {
        RouteRequest {
            source,
            target,
            source_side,
            target_side,
        }
    })
}

fn sign(d: f32) -> f32 {
    if d > COORD_EPS {
        1.0
    } else if d < -COORD_EPS {
        -1.0
    } else {
        0.0
    }
}

/// Whether some stub -> lane -> L-elbow -> target stub route clears every rect.
fn single_lane_detour_exists(
    req: &RouteRequest,
    rects: &[Rect],
    gaps: &GapPoints,
    config: &RoutingConfig,
) -> bool {
    let stub = config.stub_length.max(0.0);
    let source_stub = req.source_side.offset(req.source, stub);
    let target_stub = req.target_side.offset(req.target, stub);
    let (out_x, out_y) = req.source_side.outward();
    let steps = gaps
        .rows
        .iter()
        .map(|&row| Point::new(source_stub.x, row))
        .chain(gaps.columns.iter().map(|&col| Point::new(col, source_stub.y)));
    for step in steps {
        if source_stub.manhattan(step) <= COORD_EPS {
            continue;
        }
        let (dx, dy) = (sign(step.x - source_stub.x), sign(step.y - source_stub.y));
        if out_x * dx < 0.0 || out_y * dy < 0.0 {
            continue;
        }
        if rects.iter().any(|r| segment_crosses_rect(source_stub, step, r)) {
            continue;
        }
        for corner in [Point::new(target_stub.x, step.y), Point::new(step.x, target_stub.y)] {
            let points = compress_path(&[
                req.source,
                source_stub,
                step,
                corner,
                target_stub,
                req.target,
            ]);
            if path_obstacle_hits(&points, rects) == 0 {
                return true;
            }
        }
    }
    false
}

proptest! {
    #[test]
    fn single_lane_detour_is_found(req in request(), rects in prop::collection::vec(rect(), 1..6)) {
        let config = RoutingConfig::default();
        let gaps = compute_gap_points(&rects, &config);
        let direct = direct_elbow(&req, &config);
        let direct_clear = path_obstacle_hits(&direct.waypoints, &rects) == 0;
        if direct_clear || single_lane_detour_exists(&req, &rects, &gaps, &config) {
            prop_assert!(find_path(&req, &rects, &gaps, &config).is_clear());
        }
    }

    #[test]
    fn routing_is_deterministic(req in request(), rects in prop::collection::vec(rect(), 0..8)) {
        let config = RoutingConfig::default();
        let gaps = compute_gap_points(&rects, &config);
        let first = find_path(&req, &rects, &gaps, &config);
        let second = find_path(&req, &rects, &gaps, &config);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn reported_hits_match_the_path(req in request(), rects in prop::collection::vec(rect(), 0..8)) {
        let config = RoutingConfig::default();
        let gaps = compute_gap_points(&rects, &config);
        let routed = find_path(&req, &rects, &gaps, &config);
        prop_assert_eq!(path_obstacle_hits(&routed.waypoints, &rects), routed.hits);
        prop_assert_eq!(routed.waypoints.first().copied(), Some(req.source));
        prop_assert_eq!(routed.waypoints.last().copied(), Some(req.target));
    }

    #[test]
    fn gap_points_are_sorted_and_spaced(
        rects in prop::collection::vec(rect(), 0..16),
        margin in 0i32..30,
        epsilon in 0i32..6,
    ) {
        let config = RoutingConfig {
            clearance_margin: margin as f32,
            gap_epsilon: epsilon as f32,
            ..RoutingConfig::default()
        };
        let gaps = compute_gap_points(&rects, &config);
        for lanes in [&gaps.columns, &gaps.rows] {
            for pair in lanes.windows(2) {
                prop_assert!(pair[1] - pair[0] > config.gap_epsilon);
            }
        }
        for rect in &rects {
            let left = rect.x - config.clearance_margin;
            prop_assert!(gaps.columns.iter().any(|c| left - *c >= 0.0 && left - *c <= config.gap_epsilon));
            let top = rect.y - config.clearance_margin;
            prop_assert!(gaps.rows.iter().any(|r| top - *r >= 0.0 && top - *r <= config.gap_epsilon));
        }
    }

    #[test]
    fn no_obstacles_falls_back_to_direct_elbow(source in point(), target in point()) {
        let config = RoutingConfig::default();
        for source_side in Side::ALL {
            for target_side in Side::ALL {
                let req = RouteRequest { source, target, source_side, target_side };
                let routed = find_path(&req, &[], &GapPoints::default(), &config);
                prop_assert_eq!(&routed, &direct_elbow(&req, &config));
                prop_assert!(routed.is_clear());
            }
        }
    }
}
