use std::cell::OnceCell;
use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::trace;

use crate::config::RoutingConfig;
use crate::geometry::Rect;
use crate::ir::BoundType;
use crate::routing::{GapPoints, compute_gap_points};

#[derive(Debug, Default)]
struct CategoryGeometry {
    rects: BTreeMap<String, Rect>,
    version: u64,
    gaps: OnceCell<GapPoints>,
}

impl CategoryGeometry {
    fn touch(&mut self) {
        self.version += 1;
        self.gaps = OnceCell::new();
    }
}

/// Measured rectangles per category plus memoized gap lanes.
///
/// Holds at most one rectangle per `(BoundType, node id)`. Each category has
/// a version counter that advances on every change; gap lanes are recomputed
/// lazily the first time they are read after the counter moves.
#[derive(Debug)]
pub struct GeometryStore {
    config: RoutingConfig,
    categories: BTreeMap<BoundType, CategoryGeometry>,
    owners: HashMap<String, BoundType>,
}

impl GeometryStore {
    pub fn new(config: RoutingConfig) -> Self {
        Self {
            config,
            categories: BTreeMap::new(),
            owners: HashMap::new(),
        }
    }

    pub fn config(&self) -> &RoutingConfig {
        &self.config
    }

    /// Record the measured rectangle for `node_id`, replacing any earlier one.
    pub fn set_bounds(&mut self, bound_type: BoundType, node_id: &str, rect: Rect) {
        if !rect.is_finite() {
            trace!(node_id, "ignoring non-finite bounds");
            return;
        }
        if let Some(previous) = self.owners.get(node_id).copied()
            && previous != bound_type
        {
            self.remove_from(previous, node_id);
        }
        let category = self.categories.entry(bound_type).or_default();
        if category.rects.get(node_id) == Some(&rect) {
            return;
        }
        category.rects.insert(node_id.to_string(), rect);
        category.touch();
        self.owners.insert(node_id.to_string(), bound_type);
    }

    /// Rectangles of one category, ordered by node id.
    pub fn bounds(&self, bound_type: BoundType) -> Vec<Rect> {
        self.categories
            .get(&bound_type)
            .map(|c| c.rects.values().copied().collect())
            .unwrap_or_default()
    }

    pub fn bounds_of(&self, node_id: &str) -> Option<Rect> {
        let bound_type = self.owners.get(node_id)?;
        self.categories.get(bound_type)?.rects.get(node_id).copied()
    }

    /// Category currently holding the rectangle of `node_id`.
    pub fn bound_type_of(&self, node_id: &str) -> Option<BoundType> {
        self.owners.get(node_id).copied()
    }

    pub fn gap_points(&self, bound_type: BoundType) -> &GapPoints {
        static EMPTY: GapPoints = GapPoints {
            columns: Vec::new(),
            rows: Vec::new(),
        };
        let Some(category) = self.categories.get(&bound_type) else {
            return &EMPTY;
        };
        category.gaps.get_or_init(|| {
            let rects: Vec<Rect> = category.rects.values().copied().collect();
            trace!(
                bound_type = bound_type.as_str(),
                version = category.version,
                rects = rects.len(),
                "recomputing gap points"
            );
            compute_gap_points(&rects, &self.config)
        })
    }

    pub fn version(&self, bound_type: BoundType) -> u64 {
        self.categories
            .get(&bound_type)
            .map(|c| c.version)
            .unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    pub fn remove(&mut self, node_id: &str) -> bool {
        match self.owners.get(node_id).copied() {
            Some(bound_type) => {
                self.remove_from(bound_type, node_id);
                true
            }
            None => false,
        }
    }

    /// Drop every rectangle whose node is not in `live`.
    pub fn prune(&mut self, live: &HashSet<String>) -> usize {
        let stale: Vec<String> = self
            .owners
            .keys()
            .filter(|id| !live.contains(*id))
            .cloned()
            .collect();
        for id in &stale {
            self.remove(id);
        }
        stale.len()
    }

    pub fn clear(&mut self) {
        for category in self.categories.values_mut() {
            if !category.rects.is_empty() {
                category.rects.clear();
                category.touch();
            }
        }
        self.owners.clear();
    }

    fn remove_from(&mut self, bound_type: BoundType, node_id: &str) {
        if let Some(category) = self.categories.get_mut(&bound_type)
            && category.rects.remove(node_id).is_some()
        {
            category.touch();
        }
        self.owners.remove(node_id);
    }
}

impl Default for GeometryStore {
    fn default() -> Self {
        Self::new(RoutingConfig::default())
    }
}
