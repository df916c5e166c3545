//! Shared domain models.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Stable player identifier, assigned in creation order starting at 1.
pub type PlayerId = u32;

/// Balance every new player starts with unless configured otherwise.
pub const DEFAULT_STARTING_BALANCE: i64 = 1500;

/// Placeholder rendered when a description refers to an unknown id.
pub const UNKNOWN_PLAYER: &str = "Unknown player";

/// A seat at the table and the money it currently holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Unique identifier within the registry.
    pub id: PlayerId,
    /// Display name, defaults to `Player {id}`.
    pub name: String,
    /// Current balance. There is no floor, so this may be negative.
    pub balance: i64,
    /// Hex color (`#rrggbb`) used to tint the player's card.
    pub color: String,
}

impl Player {
    /// Build a player with the default name for `id`.
    pub fn new(id: PlayerId, balance: i64, color: impl Into<String>) -> Self {
        Self {
            id,
            name: default_name(id),
            balance,
            color: color.into(),
        }
    }
}

/// Default display name for a freshly created player.
pub fn default_name(id: PlayerId) -> String {
    format!("Player {id}")
}

/// Pick a pseudo-random `#rrggbb` color.
pub fn random_color<R: Rng + ?Sized>(rng: &mut R) -> String {
    let value: u32 = rng.gen_range(0..0xFF_FFFF);
    format!("#{value:06x}")
}
