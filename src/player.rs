use serde::{Deserialize, Serialize};
use crate::action::{ActionKind, FORCED_COUP_COINS};
use crate::character::{Card, CardId, CardSet, Character};
use crate::error::CoupError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlayerState {
    pub(crate) id: usize,
    pub(crate) name: String,
    pub(crate) coins: u8,
    // face down cards only; revealed cards go straight back to the deck
    pub(crate) influence: Vec<CardId>,
}

impl PlayerState {
    pub fn new(id: usize, name: impl Into<String>, coins: u8, influence: Vec<CardId>) -> Self {
        Self {
            id,
            name: name.into(),
            coins,
            influence,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn coins(&self) -> u8 {
        self.coins
    }

    pub fn influence(&self) -> &[CardId] {
        &self.influence
    }

    pub fn influence_count(&self) -> usize {
        self.influence.len()
    }

    pub fn is_eliminated(&self) -> bool {
        self.influence.is_empty()
    }

    pub fn holds(&self, card: CardId) -> bool {
        self.influence.contains(&card)
    }

    pub fn can_afford(&self, cost: u8) -> bool {
        self.coins >= cost
    }

    pub fn must_coup(&self) -> bool {
        self.coins >= FORCED_COUP_COINS
    }

    /// First held card whose character is one of `qualifying`.
    pub fn find_character(&self, cards: &CardSet, qualifying: &[Character]) -> Option<CardId> {
        self.influence
            .iter()
            .copied()
            .find(|&id| qualifying.contains(&cards.character(id)))
    }

    pub(crate) fn gain(&mut self, amount: u8) {
        self.coins = self.coins.saturating_add(amount);
    }

    pub(crate) fn pay(&mut self, action: ActionKind, cost: u8) -> Result<(), CoupError> {
        self.coins = self.coins.checked_sub(cost).ok_or(CoupError::InsufficientFunds {
            player_idx: self.id,
            action,
            cost,
            coins: self.coins,
        })?;
        Ok(())
    }

    /// Removes and returns up to `amount` coins.
    pub(crate) fn surrender(&mut self, amount: u8) -> u8 {
        let taken = self.coins.min(amount);
        self.coins -= taken;
        taken
    }

    pub(crate) fn remove_card(&mut self, card: CardId) -> Option<usize> {
        let slot = self.influence.iter().position(|&c| c == card)?;
        self.influence.remove(slot);
        Some(slot)
    }

    pub(crate) fn snapshot(&self, cards: &CardSet) -> PlayerSnapshot {
        PlayerSnapshot {
            id: self.id,
            name: self.name.clone(),
            coins: self.coins,
            hand: cards.resolve(&self.influence),
        }
    }
}

/// Serializable view of one seat, hand resolved to full cards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub id: usize,
    pub name: String,
    pub coins: u8,
    pub hand: Vec<Card>,
}
