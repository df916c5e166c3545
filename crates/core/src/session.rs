//! Interactive bank session.
//!
//! [`Session`] owns the live registry, the selection, the amount field and
//! the history, and is the only thing a frontend talks to. Every user
//! gesture becomes one [`Action`] passed to [`Session::dispatch`].

use rand::{rngs::StdRng, Rng, SeedableRng};
use tracing::{debug, info};

use crate::{
    config::AppConfig,
    error::TransactionError,
    history::History,
    models::PlayerId,
    registry::Registry,
    selection::{Selection, SelectionMode},
    transaction::{
        parse_amount, per_target_amount, timestamp_now, TransactionKind, TransactionRequest,
    },
};

/// Discrete user actions accepted by the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Seat a new player with the configured starting balance.
    AddPlayer,
    /// Change a player's display name.
    RenamePlayer {
        /// Player to rename.
        id: PlayerId,
        /// New display name.
        name: String,
    },
    /// Change a player's card color.
    RecolorPlayer {
        /// Player to recolor.
        id: PlayerId,
        /// New `#rrggbb` color.
        color: String,
    },
    /// Switch selection mode, clearing the picks.
    SetMode {
        /// Mode to enter.
        mode: SelectionMode,
    },
    /// Switch transaction kind, clearing the picks.
    SetKind {
        /// Kind to use for the next submit.
        kind: TransactionKind,
    },
    /// Flip between single and multi select.
    ToggleMulti,
    /// A player card was clicked.
    PlayerClicked {
        /// Clicked player.
        id: PlayerId,
    },
    /// Replace the amount field.
    SetAmount {
        /// Raw field contents.
        value: String,
    },
    /// Apply the pending transaction.
    Submit,
    /// Restore the registry from the latest history record.
    Undo,
}

/// What a dispatched action did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// State changed without a history entry.
    Updated,
    /// A history entry was pushed.
    Recorded {
        /// Description of the new entry.
        description: String,
    },
    /// The latest history entry was undone.
    Undone {
        /// Description of the undone entry.
        description: String,
    },
    /// Submit was inert because the request is incomplete.
    NotReady(TransactionError),
    /// Nothing changed.
    NoOp,
}

/// Live ledger state for one table.
#[derive(Debug)]
pub struct Session<R = StdRng> {
    registry: Registry,
    selection: Selection,
    kind: TransactionKind,
    amount: String,
    history: History,
    starting_balance: i64,
    rng: R,
}

impl Session<StdRng> {
    /// Open a table as described by `config`, with an entropy-seeded color picker.
    pub fn new(config: &AppConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }
}

impl<R: Rng> Session<R> {
    /// Open a table using `rng` for player colors.
    pub fn with_rng(config: &AppConfig, mut rng: R) -> Self {
        let registry =
            Registry::opening(config.initial_players, config.starting_balance, &mut rng);
        info!(players = registry.len(), "Bank opened");
        Self {
            registry,
            selection: Selection::default(),
            kind: TransactionKind::default(),
            amount: String::new(),
            history: History::new(),
            starting_balance: config.starting_balance,
            rng,
        }
    }

    /// Live registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Current picks.
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Kind used by the next submit.
    pub fn kind(&self) -> TransactionKind {
        self.kind
    }

    /// Raw amount field.
    pub fn amount(&self) -> &str {
        &self.amount
    }

    /// Undo log, newest first.
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Whether multi-select is active.
    pub fn is_multi(&self) -> bool {
        self.selection.mode() == SelectionMode::Multi
    }

    /// Apply one user action.
    pub fn dispatch(&mut self, action: Action) -> Outcome {
        match action {
            Action::AddPlayer => self.add_player(),
            Action::RenamePlayer { id, name } => self.rename_player(id, name),
            Action::RecolorPlayer { id, color } => self.recolor_player(id, color),
            Action::SetMode { mode } => self.set_mode(mode),
            Action::SetKind { kind } => self.set_kind(kind),
            Action::ToggleMulti => self.toggle_multi(),
            Action::PlayerClicked { id } => self.click_player(id),
            Action::SetAmount { value } => self.set_amount(value),
            Action::Submit => self.submit(),
            Action::Undo => self.undo(),
        }
    }

    /// Whether a submit would currently succeed.
    pub fn can_submit(&self) -> bool {
        self.request().validate().is_ok()
    }

    /// Guidance line for transfer mode, `None` for other kinds.
    pub fn transfer_hint(&self) -> Option<String> {
        if self.kind != TransactionKind::Transfer {
            return None;
        }
        let Some(source) = self.selection.source() else {
            return Some("Select source player".to_string());
        };
        let targets = self.selection.targets();
        if targets.is_empty() {
            return Some("Select target player(s)".to_string());
        }
        let shown_amount = if self.amount.is_empty() { "0" } else { &self.amount };
        let mut hint = format!(
            "Transfer ${shown_amount} from {} to {}",
            self.registry.name_of(source),
            self.registry.names_of(targets)
        );
        if let Ok(total) = parse_amount(&self.amount) {
            hint.push_str(&format!(
                " (${} each)",
                per_target_amount(total, targets.len())
            ));
        }
        Some(hint)
    }

    fn request(&self) -> TransactionRequest<'_> {
        TransactionRequest {
            registry: &self.registry,
            selection: &self.selection,
            amount: &self.amount,
            kind: self.kind,
        }
    }

    fn commit(&mut self, next: Registry, description: String) -> Outcome {
        let previous = std::mem::replace(&mut self.registry, next);
        self.history
            .record(previous, description.clone(), timestamp_now());
        Outcome::Recorded { description }
    }

    fn add_player(&mut self) -> Outcome {
        let (next, player) = self
            .registry
            .add_player(self.starting_balance, &mut self.rng);
        info!(player_id = player.id, color = %player.color, "Player added");
        self.commit(next, format!("Added new player: {}", player.name))
    }

    fn rename_player(&mut self, id: PlayerId, name: String) -> Outcome {
        if !self.registry.contains(id) {
            debug!(player_id = id, "rename ignored for unknown player");
            return Outcome::NoOp;
        }
        let description = format!("Renamed {} to {}", self.registry.name_of(id), name);
        let next = self.registry.rename_player(id, name);
        self.commit(next, description)
    }

    fn recolor_player(&mut self, id: PlayerId, color: String) -> Outcome {
        if !self.registry.contains(id) {
            debug!(player_id = id, "recolor ignored for unknown player");
            return Outcome::NoOp;
        }
        let description = format!("Changed color for {}", self.registry.name_of(id));
        let next = self.registry.recolor_player(id, color);
        self.commit(next, description)
    }

    fn set_mode(&mut self, mode: SelectionMode) -> Outcome {
        match mode {
            SelectionMode::Transfer => self.kind = TransactionKind::Transfer,
            SelectionMode::Single | SelectionMode::Multi => {
                if self.kind == TransactionKind::Transfer {
                    self.kind = TransactionKind::Add;
                }
            }
        }
        self.selection = self.selection.with_mode(mode);
        Outcome::Updated
    }

    fn set_kind(&mut self, kind: TransactionKind) -> Outcome {
        self.kind = kind;
        let mode = match kind {
            TransactionKind::Transfer => SelectionMode::Transfer,
            TransactionKind::Add | TransactionKind::Subtract => SelectionMode::Single,
        };
        self.selection = self.selection.with_mode(mode);
        Outcome::Updated
    }

    fn toggle_multi(&mut self) -> Outcome {
        let mode = match self.selection.mode() {
            SelectionMode::Transfer => {
                debug!("multi-select unavailable while transferring");
                return Outcome::NoOp;
            }
            SelectionMode::Single => SelectionMode::Multi,
            SelectionMode::Multi => SelectionMode::Single,
        };
        self.selection = self.selection.with_mode(mode);
        Outcome::Updated
    }

    fn click_player(&mut self, id: PlayerId) -> Outcome {
        if !self.registry.contains(id) {
            debug!(player_id = id, "click ignored for unknown player");
            return Outcome::NoOp;
        }
        let next = self.selection.on_player_click(id);
        if next == self.selection {
            return Outcome::NoOp;
        }
        self.selection = next;
        Outcome::Updated
    }

    fn set_amount(&mut self, value: String) -> Outcome {
        if value == self.amount {
            return Outcome::NoOp;
        }
        self.amount = value;
        Outcome::Updated
    }

    fn submit(&mut self) -> Outcome {
        let applied = match self.request().apply() {
            Ok(applied) => applied,
            Err(reason) => {
                debug!(%reason, "submit ignored");
                return Outcome::NotReady(reason);
            }
        };
        let previous = std::mem::replace(&mut self.registry, applied.registry);
        self.history
            .record(previous, applied.description.clone(), applied.timestamp);
        self.amount.clear();
        if !self.is_multi() {
            self.selection = self.selection.cleared();
        }
        info!(kind = ?self.kind, description = %applied.description, "Transaction applied");
        Outcome::Recorded {
            description: applied.description,
        }
    }

    fn undo(&mut self) -> Outcome {
        let Some(record) = self.history.undo() else {
            debug!("undo requested with empty history");
            return Outcome::NoOp;
        };
        let description = record.description().to_string();
        self.registry = record.into_snapshot();
        let registry = &self.registry;
        if !self.selection.references_only(|id| registry.contains(id)) {
            self.selection = self.selection.cleared();
        }
        info!(%description, remaining = self.history.len(), "Undo applied");
        Outcome::Undone { description }
    }
}
