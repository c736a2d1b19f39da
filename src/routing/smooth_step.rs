use super::orthogonal::{RouteRequest, RoutedPath, elbow_points};
use super::path::points_to_rounded_path;

/// Fixed-geometry step connector with rounded corners.
///
/// Obstacles are not consulted; `offset` is the straight run before the
/// first corner and `radius` the corner radius.
pub fn smooth_step_path(request: &RouteRequest, radius: f32, offset: f32) -> RoutedPath {
    let waypoints = elbow_points(request, offset);
    RoutedPath {
        path: points_to_rounded_path(&waypoints, radius),
        waypoints,
        hits: 0,
    }
}
