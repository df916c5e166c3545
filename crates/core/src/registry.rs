//! Player registry with functional updates.
//!
//! Every mutating operation returns a fresh [`Registry`] and leaves the
//! receiver untouched, so callers can keep the previous value around as a
//! history snapshot.

use std::collections::HashSet;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::{random_color, Player, PlayerId, UNKNOWN_PLAYER};

/// Colors given to the first two players of a new table.
pub const OPENING_COLORS: [&str; 2] = ["#FF0000", "#0000FF"];

/// Ordered set of players; insertion order is creation order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registry {
    players: Vec<Player>,
}

impl Registry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Opening table with `count` players at `balance` each.
    ///
    /// The first players get the fixed opening colors, the rest are random.
    pub fn opening<R: Rng + ?Sized>(count: usize, balance: i64, rng: &mut R) -> Self {
        let mut registry = Self::new();
        for index in 0..count {
            let color = OPENING_COLORS
                .get(index)
                .map(|color| color.to_string())
                .unwrap_or_else(|| random_color(rng));
            let (next, _) = registry.add_player_with(balance, color);
            registry = next;
        }
        registry
    }

    /// Players in creation order.
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    /// Number of players.
    pub fn len(&self) -> usize {
        self.players.len()
    }

    /// Whether no players exist yet.
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Player with `id`, if present.
    pub fn get(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|player| player.id == id)
    }

    /// Whether `id` names a player.
    pub fn contains(&self, id: PlayerId) -> bool {
        self.get(id).is_some()
    }

    /// Name for `id`, or a placeholder when the id is unknown.
    pub fn name_of(&self, id: PlayerId) -> &str {
        self.get(id)
            .map(|player| player.name.as_str())
            .unwrap_or(UNKNOWN_PLAYER)
    }

    /// Comma separated names for `ids`, in the order given.
    pub fn names_of<'a>(&self, ids: impl IntoIterator<Item = &'a PlayerId>) -> String {
        ids.into_iter()
            .map(|id| self.name_of(*id))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Sum of all balances.
    pub fn total_balance(&self) -> i64 {
        self.players
            .iter()
            .fold(0_i64, |acc, player| acc.saturating_add(player.balance))
    }

    /// Append a player with a random color.
    pub fn add_player<R: Rng + ?Sized>(&self, balance: i64, rng: &mut R) -> (Self, Player) {
        self.add_player_with(balance, random_color(rng))
    }

    /// Append a player with an explicit color.
    ///
    /// The new id is `len() + 1`; players are never removed so this stays unique.
    pub fn add_player_with(&self, balance: i64, color: impl Into<String>) -> (Self, Player) {
        let id = self.players.len() as PlayerId + 1;
        let player = Player::new(id, balance, color);
        let mut players = self.players.clone();
        players.push(player.clone());
        (Self { players }, player)
    }

    /// Replace the name of `id`. Unknown ids leave the registry unchanged.
    pub fn rename_player(&self, id: PlayerId, name: impl Into<String>) -> Self {
        let name = name.into();
        self.map_player(id, |player| Player {
            name: name.clone(),
            ..player.clone()
        })
    }

    /// Replace the color of `id`. Unknown ids leave the registry unchanged.
    pub fn recolor_player(&self, id: PlayerId, color: impl Into<String>) -> Self {
        let color = color.into();
        self.map_player(id, |player| Player {
            color: color.clone(),
            ..player.clone()
        })
    }

    /// Add `delta` to every player in `ids`. Balances may go negative.
    pub fn adjust_balance(&self, ids: &HashSet<PlayerId>, delta: i64) -> Self {
        let players = self
            .players
            .iter()
            .map(|player| {
                if ids.contains(&player.id) {
                    Player {
                        balance: player.balance.saturating_add(delta),
                        ..player.clone()
                    }
                } else {
                    player.clone()
                }
            })
            .collect();
        Self { players }
    }

    fn map_player(&self, id: PlayerId, update: impl Fn(&Player) -> Player) -> Self {
        if !self.contains(id) {
            debug!(player_id = id, "player lookup missed; registry unchanged");
            return self.clone();
        }
        let players = self
            .players
            .iter()
            .map(|player| {
                if player.id == id {
                    update(player)
                } else {
                    player.clone()
                }
            })
            .collect();
        Self { players }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DEFAULT_STARTING_BALANCE;
    use rand::{rngs::StdRng, SeedableRng};

    fn two_players() -> Registry {
        let mut rng = StdRng::seed_from_u64(1);
        Registry::opening(2, DEFAULT_STARTING_BALANCE, &mut rng)
    }

    #[test]
    fn opening_table_uses_fixed_colors() {
        let registry = two_players();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.players()[0].color, "#FF0000");
        assert_eq!(registry.players()[1].color, "#0000FF");
        assert_eq!(registry.players()[1].name, "Player 2");
    }

    #[test]
    fn add_player_assigns_next_id_and_defaults() {
        let mut rng = StdRng::seed_from_u64(2);
        let registry = two_players();
        let (next, player) = registry.add_player(DEFAULT_STARTING_BALANCE, &mut rng);

        assert_eq!(player.id, 3);
        assert_eq!(player.name, "Player 3");
        assert_eq!(player.balance, 1500);
        assert_eq!(next.len(), 3);
        assert_eq!(registry.len(), 2, "source registry stays untouched");
    }

    #[test]
    fn rename_and_recolor_replace_single_field() {
        let registry = two_players();
        let renamed = registry.rename_player(1, "Banker");
        assert_eq!(renamed.name_of(1), "Banker");
        assert_eq!(renamed.get(1).map(|p| p.balance), Some(1500));
        assert_eq!(renamed.get(2), registry.get(2));

        let recolored = renamed.recolor_player(2, "#123456");
        assert_eq!(recolored.get(2).map(|p| p.color.as_str()), Some("#123456"));
        assert_eq!(recolored.name_of(1), "Banker");
    }

    #[test]
    fn lookup_miss_is_a_no_op() {
        let registry = two_players();
        assert_eq!(registry.rename_player(9, "Ghost"), registry);
        assert_eq!(registry.recolor_player(9, "#000000"), registry);
        assert_eq!(registry.name_of(9), UNKNOWN_PLAYER);
    }

    #[test]
    fn adjust_balance_only_touches_listed_ids() {
        let mut rng = StdRng::seed_from_u64(3);
        let registry = Registry::opening(3, DEFAULT_STARTING_BALANCE, &mut rng);
        let ids = HashSet::from([1, 3]);

        let next = registry.adjust_balance(&ids, -2000);
        assert_eq!(next.get(1).map(|p| p.balance), Some(-500));
        assert_eq!(next.get(2).map(|p| p.balance), Some(1500));
        assert_eq!(next.get(3).map(|p| p.balance), Some(-500));
        assert_eq!(next.total_balance(), registry.total_balance() - 4000);
    }

    #[test]
    fn names_follow_given_order() {
        let mut rng = StdRng::seed_from_u64(4);
        let registry = Registry::opening(3, DEFAULT_STARTING_BALANCE, &mut rng);
        assert_eq!(registry.names_of(&[3, 1, 7]), "Player 3, Player 1, Unknown player");
    }
}
