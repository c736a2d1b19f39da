use serde::{Deserialize, Serialize};

use crate::geometry::{Point, Rect, Side};

/// Category partition for obstacles. Routing between two points only consults
/// rectangles of one category, since containers of different categories are
/// nested on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundType {
    Cluster,
    Namespace,
    Node,
    Pod,
    Container,
}

impl BoundType {
    pub const ALL: [BoundType; 5] = [
        BoundType::Cluster,
        BoundType::Namespace,
        BoundType::Node,
        BoundType::Pod,
        BoundType::Container,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            BoundType::Cluster => "cluster",
            BoundType::Namespace => "namespace",
            BoundType::Node => "node",
            BoundType::Pod => "pod",
            BoundType::Container => "container",
        }
    }
}

/// Zoom-dependent representation of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetailLevel {
    Icon,
    Compact,
    #[default]
    Detailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EdgeRouterKind {
    /// Fixed corner geometry, ignores obstacles.
    SmoothStep,
    /// Obstacle-aware orthogonal routing through gap lanes.
    #[default]
    Pathfinding,
}

impl EdgeRouterKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EdgeRouterKind::SmoothStep => "smooth-step",
            EdgeRouterKind::Pathfinding => "pathfinding",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NodeData {
    pub label: String,
    pub status: Option<String>,
    pub icon: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualizationNode {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: BoundType,
    /// Layout position; used as the connection point until the node is measured.
    #[serde(default)]
    pub position: Point,
    #[serde(default)]
    pub bounds: Option<Rect>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<VisualizationNode>,
    #[serde(default)]
    pub data: NodeData,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub draggable: bool,
    #[serde(default)]
    pub connectable: bool,
    #[serde(default = "default_true")]
    pub selectable: bool,
    #[serde(default)]
    pub corner_radius: f32,
    #[serde(default)]
    pub detail: DetailLevel,
}

fn default_true() -> bool {
    true
}

impl VisualizationNode {
    pub fn new(id: impl Into<String>, kind: BoundType) -> Self {
        let id = id.into();
        Self {
            data: NodeData {
                label: id.clone(),
                ..NodeData::default()
            },
            id,
            kind,
            position: Point::default(),
            bounds: None,
            children: Vec::new(),
            parent_id: None,
            draggable: false,
            connectable: false,
            selectable: true,
            corner_radius: 0.0,
            detail: DetailLevel::Detailed,
        }
    }

    pub fn with_bounds(mut self, rect: Rect) -> Self {
        self.position = Point::new(rect.x, rect.y);
        self.bounds = Some(rect);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeData {
    pub source_type: BoundType,
    /// Rendering-only fade; the path is still computed.
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub router: Option<EdgeRouterKind>,
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualizationEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub source_position: Option<Side>,
    #[serde(default)]
    pub target_position: Option<Side>,
    pub data: EdgeData,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub waypoints: Vec<Point>,
    #[serde(default)]
    pub label_anchor: Option<Point>,
    /// Bumped whenever the edge is patched so hosts can skip unchanged edges.
    #[serde(default)]
    pub revision: u64,
}

impl VisualizationEdge {
    pub fn new(
        id: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
        source_type: BoundType,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            source_position: None,
            target_position: None,
            data: EdgeData {
                source_type,
                hidden: false,
                router: None,
                label: None,
            },
            path: None,
            waypoints: Vec::new(),
            label_anchor: None,
            revision: 0,
        }
    }

    pub fn with_sides(mut self, source: Side, target: Side) -> Self {
        self.source_position = Some(source);
        self.target_position = Some(target);
        self
    }
}
