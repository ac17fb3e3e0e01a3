use thiserror::Error;
use crate::action::ActionKind;
use crate::character::CardId;
use crate::config::ConfigError;
use crate::sink::SinkError;

#[derive(Debug, Error)]
pub enum CoupError {
    #[error("player {player_idx} can't afford {action} ({cost} coins, has {coins})")]
    InsufficientFunds {
        player_idx: usize,
        action: ActionKind,
        cost: u8,
        coins: u8,
    },

    #[error("there is no valid target for {0}")]
    NoValidTarget(ActionKind),

    #[error("player {0} is not a valid target")]
    InvalidTarget(usize),

    // not a failure as such: the player is the last one standing
    #[error("player {0} has no opponents remaining")]
    NoOpponentsRemaining(usize),

    #[error("expected {expected} cards to be selected, got {got}")]
    InvalidSelectionCount { expected: usize, got: usize },

    #[error("card {0:?} can't be selected")]
    InvalidCardSelection(CardId),

    #[error("deck underflow: {requested} cards requested, {available} available")]
    DeckUnderflow { requested: usize, available: usize },

    #[error("player {player_idx} does not hold card {card:?}")]
    CardNotHeld { player_idx: usize, card: CardId },

    #[error("eliminated player {0} attempted to act")]
    EliminatedPlayerActed(usize),

    #[error("card count mismatch: {counted} cards accounted for, expected {expected}")]
    CardCountMismatch { counted: usize, expected: usize },

    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("state sink failed: {0}")]
    Sink(#[from] SinkError),
}

impl CoupError {
    /// Errors the engine answers by asking the same player again instead of aborting.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            CoupError::InsufficientFunds { .. }
                | CoupError::NoValidTarget(_)
                | CoupError::InvalidTarget(_)
                | CoupError::InvalidSelectionCount { .. }
                | CoupError::InvalidCardSelection(_)
        )
    }
}
