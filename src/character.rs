use std::fmt::{Display, Formatter};
use serde::{Deserialize, Serialize};
use crate::Character::{Ambassador, Assassin, Captain, Contessa, Duke};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Character {
    Duke,
    Assassin,
    Captain,
    Ambassador,
    Contessa,
}

pub static CHARACTER_VARIANTS: [Character; 5] = [
    Duke,
    Assassin,
    Captain,
    Ambassador,
    Contessa,
];

pub const COPIES_PER_CHARACTER: usize = 3;

impl Display for Character {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}

/// Stable handle of one physical card. Deck and hands only ever hold these.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CardId(pub u8);

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub character: Character,
}

/// The arena of every card in play. Built once at setup, never mutated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CardSet {
    cards: Vec<Card>,
}

impl CardSet {
    /// 15 cards, three of each character, ids assigned in character order.
    pub fn standard() -> Self {
        let cards = CHARACTER_VARIANTS.iter()
            .flat_map(|&character| std::iter::repeat(character).take(COPIES_PER_CHARACTER))
            .enumerate()
            .map(|(idx, character)| Card { id: CardId(idx as u8), character })
            .collect();

        Self { cards }
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item=CardId> + '_ {
        self.cards.iter().map(|card| card.id)
    }

    pub fn get(&self, id: CardId) -> Option<Card> {
        self.cards.get(id.0 as usize).copied()
    }

    /// Resolves a handle that is known to come from this arena.
    pub fn card(&self, id: CardId) -> Card {
        self.cards[id.0 as usize]
    }

    pub fn character(&self, id: CardId) -> Character {
        self.card(id).character
    }

    pub fn resolve(&self, ids: &[CardId]) -> Vec<Card> {
        ids.iter().map(|&id| self.card(id)).collect()
    }
}
