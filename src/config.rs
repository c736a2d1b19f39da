use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ir::{BoundType, EdgeRouterKind};
use crate::theme::Theme;

/// Tunables for gap lanes and the orthogonal router.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// Distance a lane keeps from the rectangle it was derived from.
    pub clearance_margin: f32,
    /// Lanes closer than this collapse into one.
    pub gap_epsilon: f32,
    /// Length of the straight segment leaving/entering a node side.
    pub stub_length: f32,
    /// Upper bound on retries; `None` uses the lane count.
    pub max_retries: Option<usize>,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            clearance_margin: 12.0,
            gap_epsilon: 1.0,
            stub_length: 20.0,
            max_retries: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewportConfig {
    /// Below this zoom nodes collapse to an icon.
    pub icon_zoom: f32,
    /// Below this zoom nodes drop their secondary details.
    pub compact_zoom: f32,
    pub settle_delay_ms: u64,
    /// Fade edges whose endpoint is collapsed to an icon.
    pub hide_edges_to_icons: bool,
}

impl ViewportConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            icon_zoom: 0.45,
            compact_zoom: 0.8,
            settle_delay_ms: 150,
            hide_edges_to_icons: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeConfig {
    pub default_router: EdgeRouterKind,
    /// Per-category override, consulted when the edge carries no router of its own.
    pub router_by_type: BTreeMap<BoundType, EdgeRouterKind>,
    pub smooth_step_radius: f32,
    pub smooth_step_offset: f32,
}

impl Default for EdgeConfig {
    fn default() -> Self {
        Self {
            default_router: EdgeRouterKind::Pathfinding,
            router_by_type: BTreeMap::new(),
            smooth_step_radius: 8.0,
            smooth_step_offset: 20.0,
        }
    }
}

/// Flags applied to every node when a tree is flattened.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeDefaults {
    pub draggable: bool,
    pub connectable: bool,
    pub selectable: bool,
    pub corner_radius: f32,
    pub icon_size: f32,
}

impl Default for NodeDefaults {
    fn default() -> Self {
        Self {
            draggable: false,
            connectable: false,
            selectable: true,
            corner_radius: 6.0,
            icon_size: 28.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    pub width: f32,
    pub height: f32,
    pub padding: f32,
    pub background: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 1200.0,
            height: 800.0,
            padding: 24.0,
            background: "#FFFFFF".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub theme: Theme,
    pub routing: RoutingConfig,
    pub viewport: ViewportConfig,
    pub edges: EdgeConfig,
    pub nodes: NodeDefaults,
    pub render: RenderConfig,
}

impl Default for Config {
    fn default() -> Self {
        let theme = Theme::default_theme();
        let render = RenderConfig {
            background: theme.background.clone(),
            ..Default::default()
        };
        Self {
            theme,
            routing: RoutingConfig::default(),
            viewport: ViewportConfig::default(),
            edges: EdgeConfig::default(),
            nodes: NodeDefaults::default(),
            render,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ThemeVariables {
    font_family: Option<String>,
    font_size: Option<f32>,
    primary_text_color: Option<String>,
    line_color: Option<String>,
    edge_label_background: Option<String>,
    selection_color: Option<String>,
    hidden_edge_opacity: Option<f32>,
    background: Option<String>,
    border_color: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct RoutingConfigFile {
    clearance_margin: Option<f32>,
    gap_epsilon: Option<f32>,
    stub_length: Option<f32>,
    max_retries: Option<usize>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ViewportConfigFile {
    icon_zoom: Option<f32>,
    compact_zoom: Option<f32>,
    settle_delay_ms: Option<u64>,
    hide_edges_to_icons: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct EdgeConfigFile {
    default_router: Option<EdgeRouterKind>,
    router_by_type: Option<BTreeMap<BoundType, EdgeRouterKind>>,
    smooth_step_radius: Option<f32>,
    smooth_step_offset: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct NodeDefaultsFile {
    draggable: Option<bool>,
    connectable: Option<bool>,
    selectable: Option<bool>,
    corner_radius: Option<f32>,
    icon_size: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    theme: Option<String>,
    theme_variables: Option<ThemeVariables>,
    routing: Option<RoutingConfigFile>,
    viewport: Option<ViewportConfigFile>,
    edges: Option<EdgeConfigFile>,
    nodes: Option<NodeDefaultsFile>,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents)
}

pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let mut config = Config::default();
    let parsed: ConfigFile = serde_json::from_str(contents)?;

    if let Some(theme_name) = parsed.theme.as_deref() {
        if theme_name == "modern" {
            config.theme = Theme::modern();
        } else if theme_name == "base" || theme_name == "default" {
            config.theme = Theme::default_theme();
        }
        config.render.background = config.theme.background.clone();
    }

    if let Some(vars) = parsed.theme_variables {
        if let Some(v) = vars.font_family {
            config.theme.font_family = v;
        }
        if let Some(v) = vars.font_size {
            config.theme.font_size = v;
        }
        if let Some(v) = vars.primary_text_color {
            config.theme.primary_text_color = v;
        }
        if let Some(v) = vars.line_color {
            config.theme.line_color = v;
        }
        if let Some(v) = vars.edge_label_background {
            config.theme.edge_label_background = v;
        }
        if let Some(v) = vars.selection_color {
            config.theme.selection_color = v;
        }
        if let Some(v) = vars.hidden_edge_opacity {
            config.theme.hidden_edge_opacity = v.clamp(0.0, 1.0);
        }
        if let Some(v) = vars.background {
            config.render.background = v.clone();
            config.theme.background = v;
        }
        if let Some(v) = vars.border_color {
            config.theme.border_color = v;
        }
    }

    if let Some(routing) = parsed.routing {
        if let Some(v) = routing.clearance_margin {
            config.routing.clearance_margin = v.max(0.0);
        }
        if let Some(v) = routing.gap_epsilon {
            config.routing.gap_epsilon = v.max(0.0);
        }
        if let Some(v) = routing.stub_length {
            config.routing.stub_length = v.max(0.0);
        }
        if routing.max_retries.is_some() {
            config.routing.max_retries = routing.max_retries;
        }
    }

    if let Some(viewport) = parsed.viewport {
        if let Some(v) = viewport.icon_zoom {
            config.viewport.icon_zoom = v;
        }
        if let Some(v) = viewport.compact_zoom {
            config.viewport.compact_zoom = v;
        }
        if let Some(v) = viewport.settle_delay_ms {
            config.viewport.settle_delay_ms = v;
        }
        if let Some(v) = viewport.hide_edges_to_icons {
            config.viewport.hide_edges_to_icons = v;
        }
        if config.viewport.compact_zoom < config.viewport.icon_zoom {
            anyhow::bail!(
                "viewport.compactZoom ({}) must not be below viewport.iconZoom ({})",
                config.viewport.compact_zoom,
                config.viewport.icon_zoom
            );
        }
    }

    if let Some(edges) = parsed.edges {
        if let Some(v) = edges.default_router {
            config.edges.default_router = v;
        }
        if let Some(v) = edges.router_by_type {
            config.edges.router_by_type = v;
        }
        if let Some(v) = edges.smooth_step_radius {
            config.edges.smooth_step_radius = v.max(0.0);
        }
        if let Some(v) = edges.smooth_step_offset {
            config.edges.smooth_step_offset = v.max(0.0);
        }
    }

    if let Some(nodes) = parsed.nodes {
        if let Some(v) = nodes.draggable {
            config.nodes.draggable = v;
        }
        if let Some(v) = nodes.connectable {
            config.nodes.connectable = v;
        }
        if let Some(v) = nodes.selectable {
            config.nodes.selectable = v;
        }
        if let Some(v) = nodes.corner_radius {
            config.nodes.corner_radius = v.max(0.0);
        }
        if let Some(v) = nodes.icon_size {
            config.nodes.icon_size = v.max(1.0);
        }
    }

    Ok(config)
}
