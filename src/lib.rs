#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod edges;
pub mod geometry;
pub mod ir;
pub mod render;
pub mod route_dump;
pub mod routing;
pub mod scene;
pub mod selection;
pub mod session;
pub mod store;
pub mod theme;
pub mod viewport;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{Config, load_config};
pub use geometry::{Point, Rect, Side};
pub use ir::{BoundType, DetailLevel, EdgeRouterKind, VisualizationEdge, VisualizationNode};
pub use render::render_svg;
pub use scene::{Scene, SceneError, flatten_nodes};
pub use session::DiagramSession;
pub use store::GeometryStore;
pub use viewport::{DetailHandler, HandlerError, NoopHandler, SettleOutcome, Viewport};

/// Load a scene, settle it at `zoom` (or the scene's own viewport) and route
/// every edge. Nodes collapsed to icons are re-measured to their drawn square
/// first, so edges meet the icon rather than the full card.
pub fn load_session(config: Config, input: &str, zoom: Option<f32>) -> anyhow::Result<DiagramSession> {
    let scene = Scene::parse(input)?;
    let nodes = flatten_nodes(&scene.nodes, &config.nodes);
    let mut viewport = scene.viewport.unwrap_or_default();
    if let Some(zoom) = zoom {
        viewport.zoom = zoom;
    }
    if !viewport.zoom.is_finite() || viewport.zoom <= 0.0 {
        anyhow::bail!("zoom must be a positive number, got {}", viewport.zoom);
    }

    let mut session = DiagramSession::create(config);
    session.replace_nodes(nodes, scene.edges);
    if let SettleOutcome::Applied(report) = session.gesture_ended(viewport, &mut NoopHandler) {
        tracing::debug!(
            zoom = viewport.zoom,
            changed = report.changed_nodes.len(),
            "scene settled"
        );
    }
    let fitted = session.fit_icons();
    let routed = session.render_edges();
    tracing::debug!(fitted, routed, total = session.edges().len(), "edges routed");
    Ok(session)
}

/// Render a scene straight to SVG.
pub fn render_scene(input: &str, config: Config) -> anyhow::Result<String> {
    let session = load_session(config, input, None)?;
    Ok(render_svg(&session))
}
