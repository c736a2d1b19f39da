use serde::{Deserialize, Serialize};

use crate::ir::BoundType;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub font_family: String,
    pub font_size: f32,
    pub primary_text_color: String,
    pub line_color: String,
    pub edge_label_background: String,
    pub selection_color: String,
    pub hidden_edge_opacity: f32,
    pub background: String,
    pub cluster_fill: String,
    pub namespace_fill: String,
    pub node_fill: String,
    pub pod_fill: String,
    pub container_fill: String,
    pub border_color: String,
}

impl Theme {
    pub fn default_theme() -> Self {
        Self {
            font_family: "\"trebuchet ms\", verdana, arial, sans-serif".to_string(),
            font_size: 14.0,
            primary_text_color: "#333333".to_string(),
            line_color: "#333333".to_string(),
            edge_label_background: "#E8E8E8".to_string(),
            selection_color: "#FF8C00".to_string(),
            hidden_edge_opacity: 0.15,
            background: "#FFFFFF".to_string(),
            cluster_fill: "#F4F4FF".to_string(),
            namespace_fill: "#FFFFDE".to_string(),
            node_fill: "#ECECFF".to_string(),
            pod_fill: "#E6F4EA".to_string(),
            container_fill: "#FFFFFF".to_string(),
            border_color: "#9370DB".to_string(),
        }
    }

    pub fn modern() -> Self {
        Self {
            font_family: "Inter, Segoe UI, system-ui, -apple-system, sans-serif".to_string(),
            font_size: 13.0,
            primary_text_color: "#1C2430".to_string(),
            line_color: "#7A8AA6".to_string(),
            edge_label_background: "#FFFFFF".to_string(),
            selection_color: "#2F6FEB".to_string(),
            hidden_edge_opacity: 0.12,
            background: "#FFFFFF".to_string(),
            cluster_fill: "#F7FAFF".to_string(),
            namespace_fill: "#EEF2F8".to_string(),
            node_fill: "#F8FAFF".to_string(),
            pod_fill: "#EFF8F2".to_string(),
            container_fill: "#FFFFFF".to_string(),
            border_color: "#C7D2E5".to_string(),
        }
    }

    pub fn fill_for(&self, kind: BoundType) -> &str {
        match kind {
            BoundType::Cluster => &self.cluster_fill,
            BoundType::Namespace => &self.namespace_fill,
            BoundType::Node => &self.node_fill,
            BoundType::Pod => &self.pod_fill,
            BoundType::Container => &self.container_fill,
        }
    }
}
