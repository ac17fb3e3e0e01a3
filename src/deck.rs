use std::collections::VecDeque;
use rand::Rng;
use rand::seq::SliceRandom;
use crate::character::CardId;
use crate::error::CoupError;

/// Court deck. Draws come off the front, returned cards go on the back.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Deck {
    cards: VecDeque<CardId>,
}

impl Deck {
    pub fn new(cards: impl IntoIterator<Item=CardId>) -> Self {
        Self {
            cards: cards.into_iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item=&CardId> {
        self.cards.iter()
    }

    pub fn contains(&self, card: CardId) -> bool {
        self.cards.contains(&card)
    }

    pub fn draw(&mut self, n: usize) -> Result<Vec<CardId>, CoupError> {
        if n > self.cards.len() {
            return Err(CoupError::DeckUnderflow {
                requested: n,
                available: self.cards.len(),
            });
        }

        Ok(self.cards.drain(..n).collect())
    }

    pub fn draw_one(&mut self) -> Result<CardId, CoupError> {
        self.cards.pop_front().ok_or(CoupError::DeckUnderflow {
            requested: 1,
            available: 0,
        })
    }

    pub fn return_card(&mut self, card: CardId) {
        self.cards.push_back(card);
    }

    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.cards.make_contiguous().shuffle(rng);
    }
}
