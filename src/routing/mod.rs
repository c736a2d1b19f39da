mod gaps;
mod orthogonal;
mod path;
mod smooth_step;

pub use gaps::{GapPoints, compute_gap_points};
pub use orthogonal::{RouteRequest, RoutedPath, direct_elbow, find_path};
pub use path::{points_to_path, points_to_rounded_path};
pub use smooth_step::smooth_step_path;
