//! Selection state machine driven by player clicks.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::PlayerId;

/// How clicks on player cards are interpreted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SelectionMode {
    /// One operand, held in the source slot.
    #[default]
    Single,
    /// Any number of operands, held in the target set.
    Multi,
    /// First click picks the source, later clicks toggle targets.
    Transfer,
}

impl SelectionMode {
    /// Short label for status lines.
    pub fn label(self) -> &'static str {
        match self {
            SelectionMode::Single => "single",
            SelectionMode::Multi => "multi-select",
            SelectionMode::Transfer => "transfer",
        }
    }
}

/// Transient source/target picks for the pending transaction.
///
/// Targets keep click order so descriptions list names the way they
/// were picked. In transfer mode the source never appears among the
/// targets; in single mode the target set stays empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    mode: SelectionMode,
    source: Option<PlayerId>,
    targets: Vec<PlayerId>,
}

impl Selection {
    /// Empty selection in `mode`.
    pub fn new(mode: SelectionMode) -> Self {
        Self {
            mode,
            source: None,
            targets: Vec::new(),
        }
    }

    /// Active mode.
    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    /// Selected source player, if any.
    pub fn source(&self) -> Option<PlayerId> {
        self.source
    }

    /// Selected target players in click order.
    pub fn targets(&self) -> &[PlayerId] {
        &self.targets
    }

    /// Whether `id` is currently a target.
    pub fn is_target(&self, id: PlayerId) -> bool {
        self.targets.contains(&id)
    }

    /// Whether nothing is selected.
    pub fn is_empty(&self) -> bool {
        self.source.is_none() && self.targets.is_empty()
    }

    /// Ids a non-transfer transaction applies to.
    ///
    /// Multi mode uses the target set, every other mode the source slot.
    pub fn operands(&self) -> Vec<PlayerId> {
        match self.mode {
            SelectionMode::Multi => self.targets.clone(),
            SelectionMode::Single | SelectionMode::Transfer => {
                self.source.into_iter().collect()
            }
        }
    }

    /// Switch to `mode`, always dropping the current picks.
    pub fn with_mode(&self, mode: SelectionMode) -> Self {
        debug!(from = self.mode.label(), to = mode.label(), "selection mode changed");
        Self::new(mode)
    }

    /// Whether every picked id satisfies `known`.
    pub fn references_only(&self, known: impl Fn(PlayerId) -> bool) -> bool {
        self.source.map_or(true, &known) && self.targets.iter().all(|id| known(*id))
    }

    /// Drop the current picks but stay in the same mode.
    pub fn cleared(&self) -> Self {
        Self::new(self.mode)
    }

    /// Apply a click on `clicked` and return the resulting selection.
    pub fn on_player_click(&self, clicked: PlayerId) -> Self {
        let mut next = self.clone();
        match self.mode {
            SelectionMode::Transfer => match self.source {
                None => next.source = Some(clicked),
                Some(source) if source == clicked => {
                    debug!(player_id = clicked, "ignoring click on transfer source");
                }
                Some(_) => next.toggle_target(clicked),
            },
            SelectionMode::Multi => next.toggle_target(clicked),
            SelectionMode::Single => {
                next.source = Some(clicked);
                next.targets.clear();
            }
        }
        next
    }

    fn toggle_target(&mut self, id: PlayerId) {
        if let Some(position) = self.targets.iter().position(|target| *target == id) {
            self.targets.remove(position);
        } else {
            self.targets.push(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn click_all(selection: Selection, ids: &[PlayerId]) -> Selection {
        ids.iter()
            .fold(selection, |acc, id| acc.on_player_click(*id))
    }

    #[test]
    fn single_mode_replaces_source() {
        let selection = click_all(Selection::new(SelectionMode::Single), &[1, 2]);
        assert_eq!(selection.source(), Some(2));
        assert!(selection.targets().is_empty());
        assert_eq!(selection.operands(), vec![2]);
    }

    #[test]
    fn multi_mode_toggles_targets() {
        let selection = click_all(Selection::new(SelectionMode::Multi), &[1, 2, 3, 2]);
        assert_eq!(selection.source(), None);
        assert_eq!(selection.targets(), &[1, 3]);
        assert_eq!(selection.operands(), vec![1, 3]);
    }

    #[test]
    fn transfer_first_click_sets_source_then_toggles_targets() {
        let selection = click_all(Selection::new(SelectionMode::Transfer), &[1, 2, 3, 3]);
        assert_eq!(selection.source(), Some(1));
        assert_eq!(selection.targets(), &[2]);
    }

    #[test]
    fn transfer_ignores_clicks_on_source() {
        let selection = click_all(Selection::new(SelectionMode::Transfer), &[1, 1, 2, 1]);
        assert_eq!(selection.source(), Some(1));
        assert_eq!(selection.targets(), &[2]);
        assert!(!selection.is_target(1));
    }

    #[test]
    fn mode_switch_always_clears() {
        let transfer = click_all(Selection::new(SelectionMode::Transfer), &[1, 2, 3]);
        for mode in [
            SelectionMode::Single,
            SelectionMode::Multi,
            SelectionMode::Transfer,
        ] {
            let next = transfer.with_mode(mode);
            assert_eq!(next.mode(), mode);
            assert!(next.is_empty());
        }

        let multi = click_all(Selection::new(SelectionMode::Multi), &[4, 5]);
        assert!(multi.with_mode(SelectionMode::Multi).is_empty());
    }
}
