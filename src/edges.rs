use std::collections::HashMap;

use tracing::debug;

use crate::config::{EdgeConfig, RoutingConfig};
use crate::geometry::{Point, Rect, Side, label_anchor};
use crate::ir::{EdgeRouterKind, VisualizationEdge, VisualizationNode};
use crate::routing::{RouteRequest, RoutedPath, find_path, smooth_step_path};
use crate::store::GeometryStore;

/// Aspect-ratio threshold for preferring horizontal vs vertical sides.
const DIRECTION_PREF_RATIO: f32 = 1.0;

/// Pick connection sides from node centres along the dominant axis.
pub fn infer_sides(from: Point, to: Point) -> (Side, Side) {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    if dx.abs() >= dy.abs() * DIRECTION_PREF_RATIO {
        if dx >= 0.0 {
            (Side::Right, Side::Left)
        } else {
            (Side::Left, Side::Right)
        }
    } else if dy >= 0.0 {
        (Side::Bottom, Side::Top)
    } else {
        (Side::Top, Side::Bottom)
    }
}

/// Connection point on `side` of the node; the layout position when the node
/// has not been measured yet.
pub fn anchor_point(bounds: Option<Rect>, position: Point, side: Side) -> Point {
    match bounds {
        Some(rect) => rect.side_midpoint(side),
        None => position,
    }
}

fn node_center(bounds: Option<Rect>, position: Point) -> Point {
    bounds.map(|r| r.center()).unwrap_or(position)
}

/// Resolves per-edge strategy and writes computed paths onto edges.
#[derive(Debug, Clone)]
pub struct EdgeRenderer {
    routing: RoutingConfig,
    edges: EdgeConfig,
}

impl EdgeRenderer {
    pub fn new(routing: RoutingConfig, edges: EdgeConfig) -> Self {
        Self { routing, edges }
    }

    pub fn router_for(&self, edge: &VisualizationEdge) -> EdgeRouterKind {
        edge.data
            .router
            .or_else(|| self.edges.router_by_type.get(&edge.data.source_type).copied())
            .unwrap_or(self.edges.default_router)
    }

    /// Route every edge. Edges whose endpoints are missing from `nodes` keep
    /// no path and are skipped by readers.
    pub fn render_all(
        &self,
        edges: &mut [VisualizationEdge],
        nodes: &[VisualizationNode],
        store: &GeometryStore,
    ) -> usize {
        let index: HashMap<&str, &VisualizationNode> =
            nodes.iter().map(|n| (n.id.as_str(), n)).collect();
        let mut routed = 0usize;
        for edge in edges.iter_mut() {
            if self.render_edge(edge, &index, store) {
                routed += 1;
            }
        }
        routed
    }

    /// Route only the edges at `indices`, used after a viewport patch.
    pub fn render_indices(
        &self,
        edges: &mut [VisualizationEdge],
        indices: &[usize],
        nodes: &[VisualizationNode],
        store: &GeometryStore,
    ) -> usize {
        let index: HashMap<&str, &VisualizationNode> =
            nodes.iter().map(|n| (n.id.as_str(), n)).collect();
        let mut routed = 0usize;
        for &idx in indices {
            if let Some(edge) = edges.get_mut(idx)
                && self.render_edge(edge, &index, store)
            {
                routed += 1;
            }
        }
        routed
    }

    fn render_edge(
        &self,
        edge: &mut VisualizationEdge,
        index: &HashMap<&str, &VisualizationNode>,
        store: &GeometryStore,
    ) -> bool {
        let (Some(source), Some(target)) = (
            index.get(edge.source.as_str()),
            index.get(edge.target.as_str()),
        ) else {
            debug!(edge = %edge.id, "edge references a node outside the current list");
            edge.path = None;
            edge.waypoints.clear();
            edge.label_anchor = None;
            return false;
        };
        let routed = self.route(edge, source, target, store);
        edge.label_anchor = label_anchor(&routed.waypoints);
        edge.path = Some(routed.path);
        edge.waypoints = routed.waypoints;
        true
    }

    pub fn route(
        &self,
        edge: &VisualizationEdge,
        source: &VisualizationNode,
        target: &VisualizationNode,
        store: &GeometryStore,
    ) -> RoutedPath {
        let source_bounds = store.bounds_of(&source.id).or(source.bounds);
        let target_bounds = store.bounds_of(&target.id).or(target.bounds);
        let (inferred_source, inferred_target) = infer_sides(
            node_center(source_bounds, source.position),
            node_center(target_bounds, target.position),
        );
        let source_side = edge.source_position.unwrap_or(inferred_source);
        let target_side = edge.target_position.unwrap_or(inferred_target);
        let request = RouteRequest {
            source: anchor_point(source_bounds, source.position, source_side),
            target: anchor_point(target_bounds, target.position, target_side),
            source_side,
            target_side,
        };

        match self.router_for(edge) {
            EdgeRouterKind::SmoothStep => smooth_step_path(
                &request,
                self.edges.smooth_step_radius,
                self.edges.smooth_step_offset,
            ),
            EdgeRouterKind::Pathfinding => {
                let bound_type = edge.data.source_type;
                let obstacles = store.bounds(bound_type);
                let gaps = store.gap_points(bound_type);
                let routed = find_path(&request, &obstacles, gaps, &self.routing);
                if !routed.is_clear() {
                    debug!(edge = %edge.id, hits = routed.hits, "edge drawn through obstacles");
                }
                routed
            }
        }
    }
}
