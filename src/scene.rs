use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::NodeDefaults;
use crate::ir::{VisualizationEdge, VisualizationNode};
use crate::viewport::Viewport;

#[derive(Debug, Error)]
pub enum SceneError {
    #[error("failed to parse scene: {0}")]
    Parse(#[from] json5::Error),
    #[error("duplicate node id `{0}`")]
    DuplicateNode(String),
    #[error("duplicate edge id `{0}`")]
    DuplicateEdge(String),
    #[error("edge `{edge}` references unknown node `{node}`")]
    UnknownEndpoint { edge: String, node: String },
}

/// A diagram snapshot: a node tree, the edges between them and an optional
/// viewport.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    #[serde(default)]
    pub nodes: Vec<VisualizationNode>,
    #[serde(default)]
    pub edges: Vec<VisualizationEdge>,
    #[serde(default)]
    pub viewport: Option<Viewport>,
}

impl Scene {
    /// Parse a JSON or JSON5 scene and check its references.
    pub fn parse(input: &str) -> Result<Self, SceneError> {
        let scene: Scene = json5::from_str(input)?;
        scene.validate()?;
        Ok(scene)
    }

    pub fn validate(&self) -> Result<(), SceneError> {
        let mut ids = HashSet::new();
        let mut stack: Vec<&VisualizationNode> = self.nodes.iter().collect();
        while let Some(node) = stack.pop() {
            if !ids.insert(node.id.as_str()) {
                return Err(SceneError::DuplicateNode(node.id.clone()));
            }
            stack.extend(node.children.iter());
        }
        let mut edge_ids = HashSet::new();
        for edge in &self.edges {
            if !edge_ids.insert(edge.id.as_str()) {
                return Err(SceneError::DuplicateEdge(edge.id.clone()));
            }
            for endpoint in [&edge.source, &edge.target] {
                if !ids.contains(endpoint.as_str()) {
                    return Err(SceneError::UnknownEndpoint {
                        edge: edge.id.clone(),
                        node: endpoint.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Pre-order flattening of a node tree. Children are stripped, `parent_id`
/// is filled in and the default interaction flags are applied.
pub fn flatten_nodes(roots: &[VisualizationNode], defaults: &NodeDefaults) -> Vec<VisualizationNode> {
    let mut out = Vec::new();
    let mut stack: Vec<(&VisualizationNode, Option<&str>)> =
        roots.iter().rev().map(|n| (n, None)).collect();
    while let Some((node, parent)) = stack.pop() {
        let mut flat = node.clone();
        flat.children = Vec::new();
        if parent.is_some() {
            flat.parent_id = parent.map(str::to_string);
        }
        flat.draggable = defaults.draggable;
        flat.connectable = defaults.connectable;
        flat.selectable = flat.selectable && defaults.selectable;
        if flat.corner_radius <= 0.0 {
            flat.corner_radius = defaults.corner_radius;
        }
        out.push(flat);
        for child in node.children.iter().rev() {
            stack.push((child, Some(node.id.as_str())));
        }
    }
    out
}
