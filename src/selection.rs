use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Modifier state of a pointer event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub meta: bool,
}

impl Modifiers {
    pub fn multi_select(&self) -> bool {
        self.shift || self.ctrl || self.meta
    }
}

/// Pointer event delivered to a node; the canvas beneath only sees it when
/// propagation was not stopped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PointerEvent {
    pub modifiers: Modifiers,
    propagation_stopped: bool,
}

impl PointerEvent {
    pub fn new(modifiers: Modifiers) -> Self {
        Self {
            modifiers,
            propagation_stopped: false,
        }
    }

    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    pub fn propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionEvent {
    Added(String),
    Removed(String),
    /// The set went from non-empty to empty.
    Emptied,
}

/// Set of selected node ids. Iteration order is unspecified.
#[derive(Debug, Default, Clone)]
pub struct SelectionController {
    selected: HashSet<String>,
    events: Vec<SelectionEvent>,
}

impl SelectionController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip membership of one id; returns whether it is now selected.
    pub fn toggle(&mut self, node_id: &str) -> bool {
        if self.selected.remove(node_id) {
            self.events.push(SelectionEvent::Removed(node_id.to_string()));
            if self.selected.is_empty() {
                self.events.push(SelectionEvent::Emptied);
            }
            false
        } else {
            self.selected.insert(node_id.to_string());
            self.events.push(SelectionEvent::Added(node_id.to_string()));
            true
        }
    }

    /// Modifier-click toggles and keeps the click away from pan/drag handling.
    pub fn on_node_click(&mut self, node_id: &str, event: &mut PointerEvent) -> Option<bool> {
        if !event.modifiers.multi_select() {
            return None;
        }
        event.stop_propagation();
        Some(self.toggle(node_id))
    }

    /// Clear in one transition.
    pub fn reset(&mut self) {
        if self.selected.is_empty() {
            return;
        }
        self.selected.clear();
        self.events.push(SelectionEvent::Emptied);
    }

    pub fn count(&self) -> usize {
        self.selected.len()
    }

    pub fn contains(&self, node_id: &str) -> bool {
        self.selected.contains(node_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.selected.iter().map(String::as_str)
    }

    /// Drop ids that no longer exist in the node list.
    pub fn prune(&mut self, live: &HashSet<String>) {
        let had_any = !self.selected.is_empty();
        self.selected.retain(|id| live.contains(id));
        if had_any && self.selected.is_empty() {
            self.events.push(SelectionEvent::Emptied);
        }
    }

    pub fn take_events(&mut self) -> Vec<SelectionEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctrl_click() -> PointerEvent {
        PointerEvent::new(Modifiers {
            ctrl: true,
            ..Modifiers::default()
        })
    }

    #[test]
    fn toggle_twice_restores_state() {
        let mut selection = SelectionController::new();
        selection.toggle("a");
        let before: HashSet<String> = selection.iter().map(str::to_string).collect();
        selection.toggle("b");
        selection.toggle("b");
        let after: HashSet<String> = selection.iter().map(str::to_string).collect();
        assert_eq!(before, after);
        assert_eq!(selection.count(), 1);
    }

    #[test]
    fn reset_emits_a_single_emptied_event() {
        let mut selection = SelectionController::new();
        for id in ["a", "b", "c"] {
            selection.toggle(id);
        }
        selection.take_events();
        selection.reset();
        assert_eq!(selection.count(), 0);
        assert_eq!(selection.take_events(), vec![SelectionEvent::Emptied]);
        selection.reset();
        assert!(selection.take_events().is_empty());
    }

    #[test]
    fn modifier_click_toggles_and_stops_propagation() {
        let mut selection = SelectionController::new();
        let mut event = ctrl_click();
        assert_eq!(selection.on_node_click("a", &mut event), Some(true));
        assert!(event.propagation_stopped());

        let mut plain = PointerEvent::default();
        assert_eq!(selection.on_node_click("b", &mut plain), None);
        assert!(!plain.propagation_stopped());
        assert!(!selection.contains("b"));
    }

    #[test]
    fn prune_keeps_only_live_ids() {
        let mut selection = SelectionController::new();
        selection.toggle("a");
        selection.toggle("b");
        let live: HashSet<String> = ["b".to_string()].into_iter().collect();
        selection.prune(&live);
        assert!(!selection.contains("a"));
        assert!(selection.contains("b"));
    }
}
