use crate::ir::{BoundType, DetailLevel, EdgeRouterKind};
use crate::session::DiagramSession;
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteDump {
    pub generation: u64,
    pub zoom: f32,
    pub nodes: Vec<NodeDump>,
    pub edges: Vec<EdgeDump>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDump {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: BoundType,
    pub detail: DetailLevel,
    pub parent_id: Option<String>,
    /// `[x, y, width, height]` of the measured bounds.
    pub bounds: Option<[f32; 4]>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeDump {
    pub id: String,
    pub source: String,
    pub target: String,
    pub hidden: bool,
    pub router: EdgeRouterKind,
    pub revision: u64,
    pub points: Vec<[f32; 2]>,
    pub path: Option<String>,
}

impl RouteDump {
    pub fn from_session(session: &DiagramSession) -> Self {
        let nodes = session
            .nodes()
            .iter()
            .map(|node| NodeDump {
                id: node.id.clone(),
                kind: node.kind,
                detail: node.detail,
                parent_id: node.parent_id.clone(),
                bounds: session
                    .store()
                    .bounds_of(&node.id)
                    .map(|r| [r.x, r.y, r.width, r.height]),
            })
            .collect();

        let edges = session
            .edges()
            .iter()
            .map(|edge| EdgeDump {
                id: edge.id.clone(),
                source: edge.source.clone(),
                target: edge.target.clone(),
                hidden: edge.data.hidden,
                router: session.router_for(edge),
                revision: edge.revision,
                points: edge.waypoints.iter().map(|p| [p.x, p.y]).collect(),
                path: edge.path.clone(),
            })
            .collect();

        RouteDump {
            generation: session.generation(),
            zoom: session.viewport().zoom,
            nodes,
            edges,
        }
    }
}

/// Write the dump as pretty JSON to `path`, or stdout when absent.
pub fn write_route_dump(path: Option<&Path>, session: &DiagramSession) -> anyhow::Result<()> {
    let dump = RouteDump::from_session(session);
    match path {
        Some(path) => {
            let writer = BufWriter::new(File::create(path)?);
            serde_json::to_writer_pretty(writer, &dump)?;
        }
        None => {
            let mut stdout = io::stdout().lock();
            serde_json::to_writer_pretty(&mut stdout, &dump)?;
            writeln!(stdout)?;
        }
    }
    Ok(())
}
