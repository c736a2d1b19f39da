use std::time::Duration;

use serde::Deserialize;
use topology_router::config::parse_config;
use topology_router::route_dump::RouteDump;
use topology_router::selection::{Modifiers, PointerEvent};
use topology_router::{
    Config, DiagramSession, NoopHandler, Rect, SettleOutcome, Viewport, VisualizationEdge,
    VisualizationNode, flatten_nodes, render_svg,
};
use wasm_bindgen::prelude::*;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NodeList {
    #[serde(default)]
    nodes: Vec<VisualizationNode>,
    #[serde(default)]
    edges: Vec<VisualizationEdge>,
}

fn build_config(config_json: Option<&str>) -> Result<Config, String> {
    match config_json {
        Some(raw) => parse_config(raw).map_err(|error| error.to_string()),
        None => Ok(Config::default()),
    }
}

fn to_js(error: String) -> JsValue {
    JsValue::from_str(&error)
}

fn millis(now_ms: f64) -> Duration {
    if !now_ms.is_finite() || now_ms <= 0.0 {
        return Duration::ZERO;
    }
    Duration::from_secs_f64(now_ms / 1000.0)
}

/// One mounted diagram, driven by the host's render loop.
#[wasm_bindgen]
pub struct TopologySession {
    inner: DiagramSession,
}

impl TopologySession {
    fn create(config_json: Option<&str>) -> Result<Self, String> {
        Ok(Self {
            inner: DiagramSession::create(build_config(config_json)?),
        })
    }

    fn replace(&mut self, list_json: &str) -> Result<(), String> {
        let list: NodeList = serde_json::from_str(list_json).map_err(|error| error.to_string())?;
        let nodes = flatten_nodes(&list.nodes, &self.inner.config().nodes);
        self.inner.replace_nodes(nodes, list.edges);
        Ok(())
    }

    fn dump(&self) -> Result<String, String> {
        serde_json::to_string(&RouteDump::from_session(&self.inner)).map_err(|error| error.to_string())
    }
}

#[wasm_bindgen]
impl TopologySession {
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Result<TopologySession, JsValue> {
        Self::create(config_json.as_deref()).map_err(to_js)
    }

    /// Replace the node list with `{ nodes, edges }` JSON.
    #[wasm_bindgen(js_name = setNodes)]
    pub fn set_nodes(&mut self, list_json: &str) -> Result<(), JsValue> {
        self.replace(list_json).map_err(to_js)
    }

    pub fn measure(&mut self, node_id: &str, x: f32, y: f32, width: f32, height: f32) -> bool {
        self.inner.measure(node_id, Rect::new(x, y, width, height))
    }

    /// Route every edge and return the routed edges as JSON.
    #[wasm_bindgen(js_name = renderEdges)]
    pub fn render_edges(&mut self) -> Result<String, JsValue> {
        self.inner.render_edges();
        self.dump().map_err(to_js)
    }

    #[wasm_bindgen(js_name = viewportChanged)]
    pub fn viewport_changed(&mut self, x: f32, y: f32, zoom: f32, now_ms: f64) {
        self.inner.viewport_changed(Viewport { x, y, zoom }, millis(now_ms));
    }

    /// Returns true when a settle was applied to the current node list.
    #[wasm_bindgen(js_name = pollSettle)]
    pub fn poll_settle(&mut self, now_ms: f64) -> bool {
        matches!(
            self.inner.poll_settle(millis(now_ms), &mut NoopHandler),
            Some(SettleOutcome::Applied(_))
        )
    }

    #[wasm_bindgen(js_name = gestureEnded)]
    pub fn gesture_ended(&mut self, x: f32, y: f32, zoom: f32) -> bool {
        matches!(
            self.inner.gesture_ended(Viewport { x, y, zoom }, &mut NoopHandler),
            SettleOutcome::Applied(_)
        )
    }

    /// Modifier-click on a node. `undefined` when the click was not consumed.
    #[wasm_bindgen(js_name = nodeClick)]
    pub fn node_click(&mut self, node_id: &str, shift: bool, ctrl: bool, meta: bool) -> Option<bool> {
        let mut event = PointerEvent::new(Modifiers { shift, ctrl, meta });
        self.inner.on_node_click(node_id, &mut event)
    }

    /// Flip selection of a node. `undefined` for unknown or unselectable ids.
    pub fn toggle(&mut self, node_id: &str) -> Option<bool> {
        self.inner.toggle_selection(node_id)
    }

    #[wasm_bindgen(js_name = resetSelection)]
    pub fn reset_selection(&mut self) {
        self.inner.selection_mut().reset();
    }

    #[wasm_bindgen(js_name = selectionCount)]
    pub fn selection_count(&self) -> u32 {
        self.inner.selection().count() as u32
    }

    #[wasm_bindgen(js_name = renderSvg)]
    pub fn render_svg(&self) -> String {
        render_svg(&self.inner)
    }

    pub fn dispose(&mut self) {
        self.inner.dispose();
    }
}

#[wasm_bindgen]
pub fn render_topology_svg(scene: &str, config_json: Option<String>) -> Result<String, JsValue> {
    let config = build_config(config_json.as_deref()).map_err(to_js)?;
    topology_router::render_scene(scene, config).map_err(|error| JsValue::from_str(&error.to_string()))
}

#[cfg(test)]
mod tests {
    use crate::TopologySession;

    const LIST: &str = r#"{
        "nodes": [
            { "id": "a", "type": "pod" },
            { "id": "b", "type": "pod" }
        ],
        "edges": [
            { "id": "a-b", "source": "a", "target": "b", "data": { "sourceType": "pod" } }
        ]
    }"#;

    #[test]
    fn routes_after_measurement_and_settles_on_gesture_end() {
        let mut session = TopologySession::create(None).expect("default config");
        session.replace(LIST).expect("node list should parse");
        assert!(session.measure("a", 0.0, 80.0, 40.0, 40.0));
        assert!(session.measure("b", 300.0, 80.0, 40.0, 40.0));
        session.inner.render_edges();
        let dump = session.dump().expect("dump should serialize");
        assert!(dump.contains("\"path\":\"M 40.00 100.00"));

        assert!(session.gesture_ended(0.0, 0.0, 0.2));
        assert!(session.inner.edges()[0].data.hidden);
        assert_eq!(session.toggle("ghost"), None);
        assert_eq!(session.toggle("a"), Some(true));

        session.dispose();
        assert_eq!(session.selection_count(), 0);
    }
}
