//! Transaction engine: validates a pending request and computes the
//! resulting registry.
//!
//! The engine is pure. It never touches history or selection; the
//! [`Session`](crate::session::Session) records the returned snapshot and
//! decides what to clear.

use std::collections::HashSet;

use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::{error::TransactionError, registry::Registry, selection::Selection};

/// Kind of money movement requested by the user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionKind {
    /// Credit every operand.
    #[default]
    Add,
    /// Debit every operand.
    Subtract,
    /// Move money from the source to the targets.
    Transfer,
}

impl TransactionKind {
    /// Kinds in selector order.
    pub const ALL: [TransactionKind; 3] = [
        TransactionKind::Add,
        TransactionKind::Subtract,
        TransactionKind::Transfer,
    ];

    /// Label shown in the kind selector.
    pub fn label(self) -> &'static str {
        match self {
            TransactionKind::Add => "Add Money",
            TransactionKind::Subtract => "Subtract Money",
            TransactionKind::Transfer => "Transfer Money",
        }
    }

    /// Next kind in selector order, wrapping around.
    pub fn next(self) -> Self {
        match self {
            TransactionKind::Add => TransactionKind::Subtract,
            TransactionKind::Subtract => TransactionKind::Transfer,
            TransactionKind::Transfer => TransactionKind::Add,
        }
    }
}

/// Everything the engine needs to evaluate one submit.
#[derive(Debug, Clone, Copy)]
pub struct TransactionRequest<'a> {
    /// Registry before the transaction.
    pub registry: &'a Registry,
    /// Current source/target picks.
    pub selection: &'a Selection,
    /// Raw contents of the amount field.
    pub amount: &'a str,
    /// Requested kind.
    pub kind: TransactionKind,
}

/// Result of a successful submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedTransaction {
    /// Registry after the transaction.
    pub registry: Registry,
    /// Human readable summary, names taken from the pre-transaction registry.
    pub description: String,
    /// Local wall-clock time of the submit.
    pub timestamp: String,
}

/// Parse the raw amount field into a whole number.
pub fn parse_amount(raw: &str) -> Result<i64, TransactionError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(TransactionError::EmptyAmount);
    }
    trimmed
        .parse::<i64>()
        .map_err(|_| TransactionError::InvalidAmount(trimmed.to_string()))
}

/// Per-target credit for a transfer of `total` split across `targets`.
///
/// Floor division: whatever does not divide evenly is debited from the
/// source but credited to nobody.
pub fn per_target_amount(total: i64, targets: usize) -> i64 {
    if targets == 0 {
        return 0;
    }
    total.div_euclid(targets as i64)
}

/// Local time stamp in the `HH:MM:SS` form used by history entries.
pub fn timestamp_now() -> String {
    Local::now().format("%H:%M:%S").to_string()
}

impl<'a> TransactionRequest<'a> {
    /// Check that the request can be applied without computing it.
    pub fn validate(&self) -> Result<i64, TransactionError> {
        let amount = parse_amount(self.amount)?;
        match self.kind {
            TransactionKind::Transfer => {
                if self.selection.source().is_none() {
                    return Err(TransactionError::MissingSource);
                }
                if self.selection.targets().is_empty() {
                    return Err(TransactionError::MissingTargets);
                }
            }
            TransactionKind::Add | TransactionKind::Subtract => {
                if self.selection.operands().is_empty() {
                    return Err(TransactionError::MissingOperand);
                }
            }
        }
        Ok(amount)
    }

    /// Validate and apply, stamping the current local time.
    pub fn apply(&self) -> Result<AppliedTransaction, TransactionError> {
        self.apply_at(timestamp_now())
    }

    /// Validate and apply with an explicit timestamp.
    pub fn apply_at(
        &self,
        timestamp: impl Into<String>,
    ) -> Result<AppliedTransaction, TransactionError> {
        let amount = self.validate()?;
        let (registry, description) = match self.kind {
            TransactionKind::Transfer => self.transfer(amount),
            TransactionKind::Add | TransactionKind::Subtract => self.adjust(amount),
        };
        Ok(AppliedTransaction {
            registry,
            description,
            timestamp: timestamp.into(),
        })
    }

    fn transfer(&self, total: i64) -> (Registry, String) {
        let targets = self.selection.targets();
        let per_target = per_target_amount(total, targets.len());
        // validate() guarantees a source here
        let source: HashSet<_> = self.selection.source().into_iter().collect();
        let target_set: HashSet<_> = targets.iter().copied().collect();

        let registry = self
            .registry
            .adjust_balance(&source, total.saturating_neg())
            .adjust_balance(&target_set, per_target);

        let source_name = self
            .selection
            .source()
            .map(|id| self.registry.name_of(id))
            .unwrap_or_default();
        let description = format!(
            "Transfer ${total} from {source_name} to {} (${per_target} each)",
            self.registry.names_of(targets)
        );
        (registry, description)
    }

    fn adjust(&self, amount: i64) -> (Registry, String) {
        let operands = self.selection.operands();
        let ids: HashSet<_> = operands.iter().copied().collect();
        let names = self.registry.names_of(&operands);
        match self.kind {
            TransactionKind::Subtract => (
                self.registry.adjust_balance(&ids, amount.saturating_neg()),
                format!("Subtracted ${amount} from {names}"),
            ),
            _ => (
                self.registry.adjust_balance(&ids, amount),
                format!("Added ${amount} to {names}"),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{PlayerId, DEFAULT_STARTING_BALANCE},
        selection::SelectionMode,
    };
    use rand::{rngs::StdRng, SeedableRng};

    fn table(count: usize) -> Registry {
        let mut rng = StdRng::seed_from_u64(11);
        Registry::opening(count, DEFAULT_STARTING_BALANCE, &mut rng)
    }

    fn pick(mode: SelectionMode, clicks: &[PlayerId]) -> Selection {
        clicks
            .iter()
            .fold(Selection::new(mode), |acc, id| acc.on_player_click(*id))
    }

    fn balance(registry: &Registry, id: PlayerId) -> i64 {
        registry.get(id).map(|player| player.balance).unwrap_or_default()
    }

    fn request<'a>(
        registry: &'a Registry,
        selection: &'a Selection,
        amount: &'a str,
        kind: TransactionKind,
    ) -> TransactionRequest<'a> {
        TransactionRequest {
            registry,
            selection,
            amount,
            kind,
        }
    }

    #[test]
    fn add_credits_single_source() -> Result<(), TransactionError> {
        let registry = table(2);
        let selection = pick(SelectionMode::Single, &[1]);
        let applied =
            request(&registry, &selection, "500", TransactionKind::Add).apply_at("12:00:00")?;

        assert_eq!(balance(&applied.registry, 1), 2000);
        assert_eq!(balance(&applied.registry, 2), 1500);
        assert_eq!(applied.description, "Added $500 to Player 1");
        assert_eq!(applied.timestamp, "12:00:00");
        Ok(())
    }

    #[test]
    fn subtract_debits_every_multi_target() -> Result<(), TransactionError> {
        let registry = table(3);
        let selection = pick(SelectionMode::Multi, &[2, 1]);
        let applied =
            request(&registry, &selection, "200", TransactionKind::Subtract).apply_at("t")?;

        assert_eq!(balance(&applied.registry, 1), 1300);
        assert_eq!(balance(&applied.registry, 2), 1300);
        assert_eq!(balance(&applied.registry, 3), 1500);
        assert_eq!(applied.description, "Subtracted $200 from Player 2, Player 1");
        Ok(())
    }

    #[test]
    fn even_transfer_moves_whole_amount() -> Result<(), TransactionError> {
        let registry = table(3);
        let selection = pick(SelectionMode::Transfer, &[1, 2, 3]);
        let applied =
            request(&registry, &selection, "100", TransactionKind::Transfer).apply_at("t")?;

        assert_eq!(balance(&applied.registry, 1), 1400);
        assert_eq!(balance(&applied.registry, 2), 1550);
        assert_eq!(balance(&applied.registry, 3), 1550);
        assert_eq!(applied.registry.total_balance(), registry.total_balance());
        assert_eq!(
            applied.description,
            "Transfer $100 from Player 1 to Player 2, Player 3 ($50 each)"
        );
        Ok(())
    }

    #[test]
    fn uneven_transfer_loses_the_remainder() -> Result<(), TransactionError> {
        let registry = table(4);
        let selection = pick(SelectionMode::Transfer, &[1, 2, 3, 4]);
        let applied =
            request(&registry, &selection, "100", TransactionKind::Transfer).apply_at("t")?;

        assert_eq!(balance(&applied.registry, 1), 1400);
        for id in 2..=4 {
            assert_eq!(balance(&applied.registry, id), 1533);
        }
        assert_eq!(applied.registry.total_balance(), registry.total_balance() - 1);
        Ok(())
    }

    #[test]
    fn per_target_uses_floor_division() {
        assert_eq!(per_target_amount(100, 3), 33);
        assert_eq!(per_target_amount(7, 7), 1);
        assert_eq!(per_target_amount(5, 10), 0);
        assert_eq!(per_target_amount(-100, 3), -34);
        assert_eq!(per_target_amount(100, 0), 0);
    }

    #[test]
    fn amount_parsing() {
        assert_eq!(parse_amount(" 42 "), Ok(42));
        assert_eq!(parse_amount("-5"), Ok(-5));
        assert_eq!(parse_amount(""), Err(TransactionError::EmptyAmount));
        assert_eq!(parse_amount("   "), Err(TransactionError::EmptyAmount));
        assert_eq!(
            parse_amount("12abc"),
            Err(TransactionError::InvalidAmount("12abc".to_string()))
        );
    }

    #[test]
    fn validation_failures_are_reported() {
        let registry = table(3);

        let empty = Selection::new(SelectionMode::Single);
        assert_eq!(
            request(&registry, &empty, "10", TransactionKind::Add).apply(),
            Err(TransactionError::MissingOperand)
        );

        let empty_multi = Selection::new(SelectionMode::Multi);
        assert_eq!(
            request(&registry, &empty_multi, "10", TransactionKind::Subtract).validate(),
            Err(TransactionError::MissingOperand)
        );

        let no_source = Selection::new(SelectionMode::Transfer);
        assert_eq!(
            request(&registry, &no_source, "10", TransactionKind::Transfer).validate(),
            Err(TransactionError::MissingSource)
        );

        let no_targets = pick(SelectionMode::Transfer, &[1]);
        assert_eq!(
            request(&registry, &no_targets, "10", TransactionKind::Transfer).validate(),
            Err(TransactionError::MissingTargets)
        );

        let ready = pick(SelectionMode::Single, &[2]);
        assert_eq!(
            request(&registry, &ready, "", TransactionKind::Add).validate(),
            Err(TransactionError::EmptyAmount)
        );
        assert!(matches!(
            request(&registry, &ready, "ten", TransactionKind::Add).validate(),
            Err(TransactionError::InvalidAmount(_))
        ));
    }

    #[test]
    fn add_and_subtract_leave_other_players_alone() -> Result<(), TransactionError> {
        let registry = table(5);
        let selection = pick(SelectionMode::Multi, &[2, 4]);
        let mut current = registry.clone();
        for (kind, amount) in [
            (TransactionKind::Add, "75"),
            (TransactionKind::Subtract, "300"),
            (TransactionKind::Add, "1"),
        ] {
            let before: i64 = [2, 4].iter().map(|id| balance(&current, *id)).sum();
            let applied = request(&current, &selection, amount, kind).apply_at("t")?;
            let after: i64 = [2, 4].iter().map(|id| balance(&applied.registry, *id)).sum();
            let step = parse_amount(amount)? * 2;
            match kind {
                TransactionKind::Subtract => assert_eq!(after, before - step),
                _ => assert_eq!(after, before + step),
            }
            for id in [1, 3, 5] {
                assert_eq!(applied.registry.get(id), registry.get(id));
            }
            current = applied.registry;
        }
        Ok(())
    }
}
