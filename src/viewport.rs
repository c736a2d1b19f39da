use std::collections::{BTreeSet, HashMap};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::ViewportConfig;
use crate::ir::{DetailLevel, VisualizationEdge, VisualizationNode};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub zoom: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            zoom: 1.0,
        }
    }
}

/// Error returned by a host [`DetailHandler`].
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("node `{0}` is no longer rendered")]
    NodeGone(String),
    #[error("{0}")]
    Host(String),
}

/// Host hook invoked for every node whose representation changes.
pub trait DetailHandler {
    fn on_detail_change(
        &mut self,
        node: &VisualizationNode,
        level: DetailLevel,
    ) -> Result<(), HandlerError>;
}

/// Accepts every change.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHandler;

impl DetailHandler for NoopHandler {
    fn on_detail_change(&mut self, _: &VisualizationNode, _: DetailLevel) -> Result<(), HandlerError> {
        Ok(())
    }
}

/// Debounces pan/zoom updates into one settle event.
///
/// Timestamps are durations since an arbitrary host epoch so the detector
/// works without a platform clock.
#[derive(Debug, Clone)]
pub struct SettleDetector {
    delay: Duration,
    pending: Option<Pending>,
}

#[derive(Debug, Clone, Copy)]
struct Pending {
    viewport: Viewport,
    last_change: Duration,
    generation: u64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SettledViewport {
    pub viewport: Viewport,
    pub generation: u64,
}

impl SettleDetector {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    /// Record an intermediate pan/zoom frame.
    pub fn viewport_changed(&mut self, viewport: Viewport, now: Duration, generation: u64) {
        self.pending = Some(Pending {
            viewport,
            last_change: now,
            generation,
        });
    }

    /// Settled viewport once no change arrived for the configured delay.
    pub fn poll(&mut self, now: Duration) -> Option<SettledViewport> {
        let pending = self.pending?;
        if now.saturating_sub(pending.last_change) < self.delay {
            return None;
        }
        self.pending = None;
        Some(SettledViewport {
            viewport: pending.viewport,
            generation: pending.generation,
        })
    }

    /// The gesture finished explicitly; settle without waiting.
    pub fn gesture_ended(&mut self, viewport: Viewport, generation: u64) -> SettledViewport {
        self.pending = None;
        SettledViewport {
            viewport,
            generation,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct SettleReport {
    pub changed_nodes: Vec<String>,
    /// Indices into the edge slice that were patched.
    pub patched_edges: Vec<usize>,
    pub failed_nodes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SettleOutcome {
    Applied(SettleReport),
    /// The settle belonged to a node list that has since been replaced.
    Stale { settled: u64, current: u64 },
}

/// Applies zoom-dependent representation changes after a viewport settles.
#[derive(Debug, Clone)]
pub struct ViewportAdapter {
    config: ViewportConfig,
    generation: u64,
    viewport: Viewport,
}

impl ViewportAdapter {
    pub fn new(config: ViewportConfig) -> Self {
        Self {
            config,
            generation: 0,
            viewport: Viewport::default(),
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// A new node list replaced the old one; settles tagged earlier are dropped.
    pub fn invalidate(&mut self, generation: u64) {
        self.generation = generation;
    }

    pub fn detail_for_zoom(&self, zoom: f32) -> DetailLevel {
        if zoom < self.config.icon_zoom {
            DetailLevel::Icon
        } else if zoom < self.config.compact_zoom {
            DetailLevel::Compact
        } else {
            DetailLevel::Detailed
        }
    }

    /// Patch node detail flags and the data of edges touching changed nodes.
    ///
    /// Edges are patched in place; untouched edges keep their revision. A
    /// handler failure skips that node and the batch continues.
    pub fn settle(
        &mut self,
        settled: SettledViewport,
        nodes: &mut [VisualizationNode],
        edges: &mut [VisualizationEdge],
        handler: &mut dyn DetailHandler,
    ) -> SettleOutcome {
        if settled.generation != self.generation {
            debug!(
                settled = settled.generation,
                current = self.generation,
                "dropping viewport settle from a replaced node list"
            );
            return SettleOutcome::Stale {
                settled: settled.generation,
                current: self.generation,
            };
        }
        self.viewport = settled.viewport;
        let level = self.detail_for_zoom(settled.viewport.zoom);

        let mut report = SettleReport::default();
        for node in nodes.iter_mut() {
            if node.detail == level {
                continue;
            }
            match handler.on_detail_change(node, level) {
                Ok(()) => {
                    node.detail = level;
                    report.changed_nodes.push(node.id.clone());
                }
                Err(err) => {
                    warn!(node = %node.id, error = %err, "detail update failed; continuing batch");
                    report.failed_nodes.push(node.id.clone());
                }
            }
        }
        if report.changed_nodes.is_empty() {
            return SettleOutcome::Applied(report);
        }

        let changed: BTreeSet<&str> = report.changed_nodes.iter().map(String::as_str).collect();
        let details = detail_index(nodes);
        for (idx, edge) in edges.iter_mut().enumerate() {
            if !changed.contains(edge.source.as_str()) && !changed.contains(edge.target.as_str()) {
                continue;
            }
            edge.data.hidden = self.edge_hidden(edge, &details);
            edge.revision += 1;
            report.patched_edges.push(idx);
        }
        SettleOutcome::Applied(report)
    }

    /// Recompute `hidden` on every edge from the current node detail.
    ///
    /// Returns the indices whose flag flipped; those edges get a new revision.
    pub fn sync_edge_visibility(
        &self,
        nodes: &[VisualizationNode],
        edges: &mut [VisualizationEdge],
    ) -> Vec<usize> {
        let details = detail_index(nodes);
        let mut flipped = Vec::new();
        for (idx, edge) in edges.iter_mut().enumerate() {
            let hidden = self.edge_hidden(edge, &details);
            if edge.data.hidden != hidden {
                edge.data.hidden = hidden;
                edge.revision += 1;
                flipped.push(idx);
            }
        }
        flipped
    }

    fn edge_hidden(&self, edge: &VisualizationEdge, details: &HashMap<&str, DetailLevel>) -> bool {
        let is_icon = |id: &str| details.get(id) == Some(&DetailLevel::Icon);
        self.config.hide_edges_to_icons && (is_icon(&edge.source) || is_icon(&edge.target))
    }
}

fn detail_index(nodes: &[VisualizationNode]) -> HashMap<&str, DetailLevel> {
    nodes.iter().map(|n| (n.id.as_str(), n.detail)).collect()
}
