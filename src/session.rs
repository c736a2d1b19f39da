use std::collections::HashSet;
use std::time::Duration;

use tracing::debug;

use crate::config::Config;
use crate::edges::EdgeRenderer;
use crate::geometry::Rect;
use crate::ir::{DetailLevel, EdgeRouterKind, VisualizationEdge, VisualizationNode};
use crate::selection::{PointerEvent, SelectionController};
use crate::store::GeometryStore;
use crate::viewport::{
    DetailHandler, SettleDetector, SettleOutcome, SettledViewport, Viewport, ViewportAdapter,
};

/// Everything one mounted diagram owns.
///
/// Mutation happens through `&mut self` on a single thread: node-list
/// replacement, measurement and viewport settles each form one update. Every
/// replacement advances the generation, so settles recorded against an older
/// node list are discarded instead of patching the new edges.
#[derive(Debug)]
pub struct DiagramSession {
    config: Config,
    generation: u64,
    nodes: Vec<VisualizationNode>,
    edges: Vec<VisualizationEdge>,
    store: GeometryStore,
    selection: SelectionController,
    detector: SettleDetector,
    adapter: ViewportAdapter,
    renderer: EdgeRenderer,
}

impl DiagramSession {
    pub fn create(config: Config) -> Self {
        Self {
            generation: 0,
            nodes: Vec::new(),
            edges: Vec::new(),
            store: GeometryStore::new(config.routing.clone()),
            selection: SelectionController::new(),
            detector: SettleDetector::new(config.viewport.settle_delay()),
            adapter: ViewportAdapter::new(config.viewport.clone()),
            renderer: EdgeRenderer::new(config.routing.clone(), config.edges.clone()),
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn nodes(&self) -> &[VisualizationNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[VisualizationEdge] {
        &self.edges
    }

    /// Edges that currently have a path; stale ones are filtered out.
    pub fn routed_edges(&self) -> impl Iterator<Item = &VisualizationEdge> {
        self.edges.iter().filter(|e| e.path.is_some())
    }

    pub fn store(&self) -> &GeometryStore {
        &self.store
    }

    pub fn selection(&self) -> &SelectionController {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut SelectionController {
        &mut self.selection
    }

    pub fn viewport(&self) -> Viewport {
        self.adapter.viewport()
    }

    /// Swap in a new node/edge generation.
    ///
    /// Geometry and selection are pruned to the new ids, pending viewport
    /// settles are cancelled, and nodes already carrying bounds are measured.
    /// New nodes take the detail level of the current zoom and edge visibility
    /// is recomputed to match.
    pub fn replace_nodes(&mut self, nodes: Vec<VisualizationNode>, edges: Vec<VisualizationEdge>) {
        self.generation += 1;
        self.detector.cancel();
        self.adapter.invalidate(self.generation);

        let live: HashSet<String> = nodes.iter().map(|n| n.id.clone()).collect();
        let pruned = self.store.prune(&live);
        self.selection.prune(&live);
        debug!(
            generation = self.generation,
            nodes = nodes.len(),
            edges = edges.len(),
            pruned,
            "node list replaced"
        );

        self.nodes = nodes;
        self.edges = edges;
        let level = self.adapter.detail_for_zoom(self.adapter.viewport().zoom);
        for node in &mut self.nodes {
            node.detail = level;
            match node.bounds {
                Some(rect) => self.store.set_bounds(node.kind, &node.id, rect),
                None => {
                    if self
                        .store
                        .bound_type_of(&node.id)
                        .is_some_and(|owner| owner != node.kind)
                    {
                        self.store.remove(&node.id);
                    }
                }
            }
        }
        let flipped = self.adapter.sync_edge_visibility(&self.nodes, &mut self.edges);
        if !flipped.is_empty() {
            debug!(edges = flipped.len(), "edge visibility synced to current detail");
        }
    }

    /// Record a measured rectangle for a rendered node.
    pub fn measure(&mut self, node_id: &str, rect: Rect) -> bool {
        let Some(node) = self.nodes.iter_mut().find(|n| n.id == node_id) else {
            debug!(node_id, "measurement for a node outside the current list");
            return false;
        };
        node.bounds = Some(rect);
        self.store.set_bounds(node.kind, node_id, rect);
        true
    }

    /// Re-measure every `Icon` node to the square it is drawn as.
    ///
    /// Hosts that render icons re-measure them through `measure`; this does
    /// the same for output that draws straight from the session.
    pub fn fit_icons(&mut self) -> usize {
        let size = self.config.nodes.icon_size;
        let icons: Vec<(String, Rect)> = self
            .nodes
            .iter()
            .filter(|n| n.detail == DetailLevel::Icon)
            .filter_map(|n| {
                let rect = n.bounds?;
                let square = rect.centered_square(size);
                (square != rect).then(|| (n.id.clone(), square))
            })
            .collect();
        for (id, square) in &icons {
            self.measure(id, *square);
        }
        icons.len()
    }

    pub fn router_for(&self, edge: &VisualizationEdge) -> EdgeRouterKind {
        self.renderer.router_for(edge)
    }

    /// Route every edge against the current geometry.
    pub fn render_edges(&mut self) -> usize {
        self.renderer
            .render_all(&mut self.edges, &self.nodes, &self.store)
    }

    pub fn viewport_changed(&mut self, viewport: Viewport, now: Duration) {
        self.detector
            .viewport_changed(viewport, now, self.generation);
    }

    /// Apply a pending settle once the debounce delay has passed.
    pub fn poll_settle(&mut self, now: Duration, handler: &mut dyn DetailHandler) -> Option<SettleOutcome> {
        let settled = self.detector.poll(now)?;
        Some(self.apply_settle(settled, handler))
    }

    pub fn gesture_ended(&mut self, viewport: Viewport, handler: &mut dyn DetailHandler) -> SettleOutcome {
        let settled = self.detector.gesture_ended(viewport, self.generation);
        self.apply_settle(settled, handler)
    }

    /// Apply a settle computed elsewhere, e.g. one captured before a replacement.
    pub fn apply_settle(
        &mut self,
        settled: SettledViewport,
        handler: &mut dyn DetailHandler,
    ) -> SettleOutcome {
        let outcome = self
            .adapter
            .settle(settled, &mut self.nodes, &mut self.edges, handler);
        if let SettleOutcome::Applied(report) = &outcome
            && !report.patched_edges.is_empty()
        {
            self.renderer.render_indices(
                &mut self.edges,
                &report.patched_edges,
                &self.nodes,
                &self.store,
            );
        }
        outcome
    }

    /// Flip selection of a selectable node in the current list.
    ///
    /// Returns `None` for unknown or non-selectable ids.
    pub fn toggle_selection(&mut self, node_id: &str) -> Option<bool> {
        if !self.is_selectable(node_id) {
            debug!(node_id, "ignoring selection toggle for an unselectable id");
            return None;
        }
        Some(self.selection.toggle(node_id))
    }

    pub fn on_node_click(&mut self, node_id: &str, event: &mut PointerEvent) -> Option<bool> {
        if !self.is_selectable(node_id) {
            return None;
        }
        self.selection.on_node_click(node_id, event)
    }

    fn is_selectable(&self, node_id: &str) -> bool {
        self.nodes.iter().any(|n| n.id == node_id && n.selectable)
    }

    /// Selected ids that still exist in the node list.
    pub fn selected_nodes(&self) -> Vec<&VisualizationNode> {
        self.nodes
            .iter()
            .filter(|n| self.selection.contains(&n.id))
            .collect()
    }

    /// Unmount: clear geometry, selection, pending timers and lists.
    pub fn dispose(&mut self) {
        self.detector.cancel();
        self.store.clear();
        self.selection.reset();
        self.nodes.clear();
        self.edges.clear();
        self.generation += 1;
        self.adapter.invalidate(self.generation);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Point, Side};
    use crate::ir::BoundType;
    use crate::viewport::NoopHandler;

    fn pods() -> (Vec<VisualizationNode>, Vec<VisualizationEdge>) {
        let nodes = vec![
            VisualizationNode::new("a", BoundType::Pod).with_bounds(Rect::new(0.0, 80.0, 40.0, 40.0)),
            VisualizationNode::new("b", BoundType::Pod).with_bounds(Rect::new(300.0, 80.0, 40.0, 40.0)),
        ];
        let edges = vec![
            VisualizationEdge::new("a-b", "a", "b", BoundType::Pod).with_sides(Side::Right, Side::Left),
        ];
        (nodes, edges)
    }

    #[test]
    fn replacement_discards_pending_settle() {
        let mut session = DiagramSession::create(Config::default());
        let (nodes, edges) = pods();
        session.replace_nodes(nodes.clone(), edges.clone());
        session.viewport_changed(
            Viewport {
                zoom: 0.2,
                ..Viewport::default()
            },
            Duration::from_millis(0),
        );
        let captured = SettledViewport {
            viewport: Viewport {
                zoom: 0.2,
                ..Viewport::default()
            },
            generation: session.generation(),
        };

        session.replace_nodes(nodes, edges);
        assert!(session.poll_settle(Duration::from_secs(5), &mut NoopHandler).is_none());

        let outcome = session.apply_settle(captured, &mut NoopHandler);
        assert!(matches!(outcome, SettleOutcome::Stale { .. }));
        assert_eq!(session.edges()[0].revision, 0);
        assert!(session.nodes().iter().all(|n| n.detail == DetailLevel::Detailed));
    }

    #[test]
    fn settle_patches_and_reroutes_edges() {
        let mut session = DiagramSession::create(Config::default());
        let (nodes, edges) = pods();
        session.replace_nodes(nodes, edges);
        session.render_edges();
        session.viewport_changed(
            Viewport {
                zoom: 0.3,
                ..Viewport::default()
            },
            Duration::from_millis(10),
        );
        assert!(session.poll_settle(Duration::from_millis(20), &mut NoopHandler).is_none());
        let outcome = session
            .poll_settle(Duration::from_millis(500), &mut NoopHandler)
            .unwrap();
        assert!(matches!(outcome, SettleOutcome::Applied(_)));
        let edge = &session.edges()[0];
        assert!(edge.data.hidden);
        assert!(edge.path.is_some());
        assert_eq!(edge.revision, 1);
    }

    #[test]
    fn replacement_prunes_geometry_and_selection() {
        let mut session = DiagramSession::create(Config::default());
        let (nodes, edges) = pods();
        session.replace_nodes(nodes, edges);
        session.toggle_selection("a");
        session.toggle_selection("b");

        let keep = vec![VisualizationNode::new("b", BoundType::Pod)];
        session.replace_nodes(keep, Vec::new());
        assert!(session.store().bounds_of("a").is_none());
        assert!(session.store().bounds_of("b").is_some());
        assert!(!session.selection().contains("a"));
        assert_eq!(session.selection().count(), 1);
    }

    #[test]
    fn remeasuring_replaces_bounds() {
        let mut session = DiagramSession::create(Config::default());
        let (nodes, edges) = pods();
        session.replace_nodes(nodes, edges);
        assert!(session.measure("a", Rect::new(10.0, 10.0, 50.0, 50.0)));
        assert!(session.measure("a", Rect::new(20.0, 20.0, 60.0, 30.0)));
        assert_eq!(session.store().bounds_of("a"), Some(Rect::new(20.0, 20.0, 60.0, 30.0)));
        assert_eq!(session.store().bounds(BoundType::Pod).len(), 2);
        assert!(!session.measure("missing", Rect::new(0.0, 0.0, 1.0, 1.0)));
    }

    #[test]
    fn dispose_clears_everything() {
        let mut session = DiagramSession::create(Config::default());
        let (nodes, edges) = pods();
        session.replace_nodes(nodes, edges);
        session.toggle_selection("a");
        session.viewport_changed(Viewport::default(), Duration::ZERO);
        session.dispose();
        assert!(session.store().is_empty());
        assert_eq!(session.selection().count(), 0);
        assert!(session.nodes().is_empty());
        assert!(session.edges().is_empty());
        assert!(session.poll_settle(Duration::from_secs(1), &mut NoopHandler).is_none());
    }

    #[test]
    fn plain_click_leaves_selection_alone() {
        let mut session = DiagramSession::create(Config::default());
        let (nodes, edges) = pods();
        session.replace_nodes(nodes, edges);
        let mut event = PointerEvent::default();
        assert_eq!(session.on_node_click("a", &mut event), None);
        assert_eq!(session.selected_nodes().len(), 0);
    }

    #[test]
    fn replacement_while_zoomed_out_hides_icon_edges() {
        let mut session = DiagramSession::create(Config::default());
        let (nodes, edges) = pods();
        session.replace_nodes(nodes.clone(), edges.clone());
        let zoomed_out = Viewport {
            zoom: 0.2,
            ..Viewport::default()
        };
        session.gesture_ended(zoomed_out, &mut NoopHandler);
        assert!(session.edges()[0].data.hidden);

        session.replace_nodes(nodes, edges);
        session.render_edges();
        assert!(session.nodes().iter().all(|n| n.detail == DetailLevel::Icon));
        assert!(session.edges()[0].data.hidden);

        session.gesture_ended(zoomed_out, &mut NoopHandler);
        assert!(session.edges()[0].data.hidden);
    }

    #[test]
    fn toggling_unknown_or_unselectable_ids_is_refused() {
        let mut session = DiagramSession::create(Config::default());
        let (mut nodes, edges) = pods();
        nodes[1].selectable = false;
        session.replace_nodes(nodes, edges);
        assert_eq!(session.toggle_selection("ghost"), None);
        assert_eq!(session.toggle_selection("b"), None);
        assert_eq!(session.selection().count(), 0);
        assert_eq!(session.toggle_selection("a"), Some(true));
        assert_eq!(session.toggle_selection("a"), Some(false));
    }

    #[test]
    fn kind_change_without_bounds_drops_old_obstacle() {
        let mut session = DiagramSession::create(Config::default());
        let (nodes, edges) = pods();
        session.replace_nodes(nodes, edges);
        assert_eq!(session.store().bounds(BoundType::Pod).len(), 2);

        let changed = vec![
            VisualizationNode::new("a", BoundType::Node),
            VisualizationNode::new("b", BoundType::Pod),
        ];
        session.replace_nodes(changed, Vec::new());
        assert_eq!(session.store().bounds(BoundType::Pod), vec![Rect::new(300.0, 80.0, 40.0, 40.0)]);
        assert!(session.store().bounds(BoundType::Node).is_empty());
        assert!(session.store().bounds_of("a").is_none());
    }

    #[test]
    fn fitted_icons_anchor_edges_to_the_drawn_square() {
        let mut session = DiagramSession::create(Config::default());
        let (nodes, edges) = pods();
        session.replace_nodes(nodes, edges);
        session.gesture_ended(
            Viewport {
                zoom: 0.2,
                ..Viewport::default()
            },
            &mut NoopHandler,
        );
        assert_eq!(session.fit_icons(), 2);
        assert_eq!(session.fit_icons(), 0);
        session.render_edges();
        assert_eq!(session.store().bounds_of("a"), Some(Rect::new(6.0, 86.0, 28.0, 28.0)));
        let edge = &session.edges()[0];
        assert_eq!(edge.waypoints.first(), Some(&Point::new(34.0, 100.0)));
        assert_eq!(edge.waypoints.last(), Some(&Point::new(306.0, 100.0)));
    }
}
