use rand::Rng;
use tracing::{debug, info, warn};
use crate::action::EXCHANGE_DRAW;
use crate::character::CardId;
use crate::decision::DecisionProvider;
use crate::error::CoupError;
use crate::sink::StateSink;
use crate::Coup;

impl Coup {
    /// The player reveals one card and it goes to the back of the deck, face down.
    pub(crate) fn lose_influence<D, S>(&mut self, player_idx: usize, decider: &mut D, sink: &mut S) -> Result<CardId, CoupError>
    where
        D: DecisionProvider + ?Sized,
        S: StateSink + ?Sized,
    {
        let player = self.roster.player(player_idx);
        let held = player.influence();
        let first = *held.first().ok_or(CoupError::EliminatedPlayerActed(player_idx))?;

        // nothing to choose between when every card is the same character
        let no_choice = held.iter().all(|&id| self.cards.character(id) == self.cards.character(first));

        let card = if no_choice {
            first
        } else {
            let held_cards = self.cards.resolve(held);
            let mut rejection = None;
            loop {
                let choice = decider.choose_card_to_reveal(player_idx, &held_cards, rejection.as_ref());
                if player.holds(choice) {
                    break choice;
                }
                warn!(player_idx, ?choice, "card not held, asking again");
                rejection = Some(CoupError::InvalidCardSelection(choice));
            }
        };

        self.roster.player_mut(player_idx).remove_card(card);
        self.deck.return_card(card);
        info!(player_idx, character = %self.cards.character(card), "loses influence");

        if self.roster.is_player_dead(player_idx) {
            info!(player_idx, name = self.roster.player(player_idx).name(), "eliminated");
        }

        self.publish(sink)?;
        Ok(card)
    }

    /// A card proven in a challenge is shuffled back and replaced in the same slot.
    pub(crate) fn replace_revealed_card<S, R>(&mut self, player_idx: usize, card: CardId, sink: &mut S, rng: &mut R) -> Result<(), CoupError>
    where
        S: StateSink + ?Sized,
        R: Rng + ?Sized,
    {
        let slot = self.roster
            .player_mut(player_idx)
            .remove_card(card)
            .ok_or(CoupError::CardNotHeld { player_idx, card })?;

        self.deck.return_card(card);
        self.deck.shuffle(rng);
        let replacement = self.deck.draw_one()?;
        self.roster.player_mut(player_idx).influence.insert(slot, replacement);

        debug!(player_idx, slot, "revealed card replaced");
        self.publish(sink)
    }

    pub(crate) fn exchange_influence<D, S, R>(&mut self, player_idx: usize, decider: &mut D, sink: &mut S, rng: &mut R) -> Result<(), CoupError>
    where
        D: DecisionProvider + ?Sized,
        S: StateSink + ?Sized,
        R: Rng + ?Sized,
    {
        // with seven players the deck only holds a single card
        let drawn = self.deck.draw(EXCHANGE_DRAW.min(self.deck.len()))?;
        self.roster.player_mut(player_idx).influence.extend(drawn.iter().copied());
        self.publish(sink)?;

        let pool_ids = self.roster.player(player_idx).influence().to_vec();
        let pool = self.cards.resolve(&pool_ids);
        let count_required = drawn.len();

        let mut rejection = None;
        let returned = loop {
            let selection = decider.choose_cards_to_return(player_idx, &pool, count_required, rejection.as_ref());
            match validate_selection(&selection, &pool_ids, count_required) {
                Ok(()) => break selection,
                Err(err) => {
                    warn!(player_idx, %err, "selection rejected, asking again");
                    rejection = Some(err);
                }
            }
        };

        let player = self.roster.player_mut(player_idx);
        for &card in &returned {
            player.remove_card(card);
            self.deck.return_card(card);
        }
        self.deck.shuffle(rng);

        let swapped = returned.iter().filter(|card| !drawn.contains(card)).count();
        info!(player_idx, swapped, "exchanged with the deck");

        self.publish(sink)
    }
}

fn validate_selection(selection: &[CardId], pool: &[CardId], count_required: usize) -> Result<(), CoupError> {
    if selection.len() != count_required {
        return Err(CoupError::InvalidSelectionCount {
            expected: count_required,
            got: selection.len(),
        });
    }

    for (idx, card) in selection.iter().enumerate() {
        if !pool.contains(card) || selection[..idx].contains(card) {
            return Err(CoupError::InvalidCardSelection(*card));
        }
    }

    Ok(())
}
