pub mod action;
pub mod character;
pub mod config;
pub mod decision;
pub mod deck;
pub mod error;
mod influence;
pub mod player;
pub mod roster;
pub mod sink;

pub use action::{ActionKind, Claim, PendingAction};
pub use character::{Card, CardId, CardSet, Character};
pub use config::GameConfig;
pub use decision::{DecisionProvider, RandomDecider};
pub use deck::Deck;
pub use error::CoupError;
pub use player::{PlayerSnapshot, PlayerState};
pub use roster::Roster;
pub use sink::{CsvJournal, MemorySink, NullSink, StateSink};

use std::collections::HashSet;
use std::fmt::{Debug, Formatter};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use crate::action::ACTION_VARIANTS;
use crate::config::{MAX_PLAYERS, MIN_PLAYERS};

/// Cards dealt to every player at setup.
pub const STARTING_HAND: usize = 2;

const STEAL_AMOUNT: u8 = 2;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum State {
    AwaitingLegality,
    AwaitingBlock,
    AwaitingChallengeOfAction,
    // blocker
    AwaitingChallengeOfBlock(usize),
    Applying,
    Done,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TurnOutcome {
    // whose turn it is next
    Continue(usize),
    // the last player standing
    Won(usize),
}

/// Everything needed to persist a game and pick it up again.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub turn: usize,
    pub current_player_idx: usize,
    pub players: Vec<PlayerSnapshot>,
    pub deck: Vec<Card>,
}

#[derive(Clone, PartialEq, Eq)]
pub struct Coup {
    turn: usize,
    current_player_idx: usize,
    cards: CardSet,
    deck: Deck,
    roster: Roster,
}

impl Debug for Coup {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(format!("T {} | P {} | D {}\n", self.turn, self.current_player_idx, self.deck.len()).as_str())?;
        for (player_idx, player) in self.roster.players().iter().enumerate() {
            let hand: Vec<Character> = player.influence().iter().map(|&id| self.cards.character(id)).collect();
            f.write_str(format!("\tP {player_idx}: ${} | {:?}\n", player.coins(), hand).as_str())?;
        }
        Ok(())
    }
}

impl Coup {
    pub fn new<R: Rng + ?Sized>(num_players: u8, rng: &mut R) -> Result<Self, CoupError> {
        Self::with_config(&GameConfig::with_players(num_players as usize), rng)
    }

    pub fn with_config<R: Rng + ?Sized>(config: &GameConfig, rng: &mut R) -> Result<Self, CoupError> {
        config.validate()?;

        let cards = CardSet::standard();
        let mut deck = Deck::new(cards.ids());
        deck.shuffle(rng);

        let mut players = Vec::with_capacity(config.player_names.len());
        for (idx, name) in config.player_names.iter().enumerate() {
            players.push(PlayerState::new(idx, name.clone(), config.starting_coins, deck.draw(STARTING_HAND)?));
        }

        info!(players = players.len(), "new game");

        Ok(Self {
            turn: 0,
            current_player_idx: 0,
            cards,
            deck,
            roster: Roster::new(players),
        })
    }

    pub fn turn(&self) -> usize {
        self.turn
    }

    pub fn current_player_idx(&self) -> usize {
        self.current_player_idx
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn player(&self, player_idx: usize) -> &PlayerState {
        self.roster.player(player_idx)
    }

    pub fn deck(&self) -> &Deck {
        &self.deck
    }

    pub fn cards(&self) -> &CardSet {
        &self.cards
    }

    pub fn winner(&self) -> Option<usize> {
        let mut living = self.roster.living_players();
        match (living.next(), living.next()) {
            (Some(winner), None) => Some(winner),
            _ => None,
        }
    }

    /// Plays turns until someone wins.
    pub fn play<D, S, R>(&mut self, decider: &mut D, sink: &mut S, rng: &mut R) -> Result<usize, CoupError>
    where
        D: DecisionProvider + ?Sized,
        S: StateSink + ?Sized,
        R: Rng + ?Sized,
    {
        loop {
            if let TurnOutcome::Won(winner) = self.play_turn(decider, sink, rng)? {
                return Ok(winner);
            }
        }
    }

    /// Resolves exactly one action for the current player and passes the turn on.
    pub fn play_turn<D, S, R>(&mut self, decider: &mut D, sink: &mut S, rng: &mut R) -> Result<TurnOutcome, CoupError>
    where
        D: DecisionProvider + ?Sized,
        S: StateSink + ?Sized,
        R: Rng + ?Sized,
    {
        if let Some(winner) = self.winner() {
            return Ok(TurnOutcome::Won(winner));
        }

        let actor = self.current_player_idx;
        if self.roster.is_player_dead(actor) {
            return Err(CoupError::EliminatedPlayerActed(actor));
        }

        let mut pending = match self.declare_action(actor, decider) {
            Ok(pending) => pending,
            Err(CoupError::NoOpponentsRemaining(player_idx)) => return Ok(TurnOutcome::Won(player_idx)),
            Err(err) => return Err(err),
        };
        info!(turn = self.turn, "{:?}", pending);
        sink.on_action_announced(actor, pending.kind)?;

        self.resolve(&mut pending, decider, sink, rng)?;
        self.check_conservation()?;
        self.go_next_turn();

        match self.winner() {
            Some(winner) => {
                info!(winner, name = self.roster.player(winner).name(), "game over");
                Ok(TurnOutcome::Won(winner))
            }
            None => Ok(TurnOutcome::Continue(self.current_player_idx)),
        }
    }

    pub fn check_conservation(&self) -> Result<(), CoupError> {
        let counted = self.deck.len() + self.roster.total_influence();
        if counted != self.cards.len() {
            return Err(CoupError::CardCountMismatch {
                counted,
                expected: self.cards.len(),
            });
        }
        Ok(())
    }

    fn declare_action<D: DecisionProvider + ?Sized>(&self, actor: usize, decider: &mut D) -> Result<PendingAction, CoupError> {
        let mut rejection: Option<CoupError> = None;

        loop {
            let forced = self.roster.player(actor).must_coup();
            let kind = if forced {
                debug!(actor, coins = self.roster.player(actor).coins(), "forced coup");
                ActionKind::Coup
            } else {
                decider.choose_action(actor, &ACTION_VARIANTS, rejection.as_ref())
            };

            let mut pending = PendingAction::new(actor, kind);
            match self.check_legality(&mut pending, decider) {
                Ok(()) => return Ok(pending),
                Err(err) if err.is_recoverable() && !forced => {
                    warn!(actor, %err, "action rejected, choosing again");
                    rejection = Some(err);
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn check_legality<D: DecisionProvider + ?Sized>(&self, pending: &mut PendingAction, decider: &mut D) -> Result<(), CoupError> {
        let actor = self.roster.player(pending.actor);
        let rule = pending.kind.rule();

        if !actor.can_afford(rule.cost) {
            return Err(CoupError::InsufficientFunds {
                player_idx: pending.actor,
                action: pending.kind,
                cost: rule.cost,
                coins: actor.coins(),
            });
        }

        if rule.requires_target {
            if self.roster.opponents_of(pending.actor).is_empty() {
                return Err(CoupError::NoOpponentsRemaining(pending.actor));
            }

            let candidates = self.target_candidates(pending.actor, pending.kind);
            if candidates.is_empty() {
                return Err(CoupError::NoValidTarget(pending.kind));
            }
            pending.target = Some(self.choose_target(pending.actor, &candidates, decider));
        }

        Ok(())
    }

    fn target_candidates(&self, actor: usize, kind: ActionKind) -> Vec<usize> {
        let opponents = self.roster.opponents_of(actor);
        match kind {
            // nothing to steal from a broke player
            ActionKind::Steal => opponents
                .into_iter()
                .filter(|&idx| self.roster.player(idx).coins() > 0)
                .collect(),
            _ => opponents,
        }
    }

    fn choose_target<D: DecisionProvider + ?Sized>(&self, actor: usize, candidates: &[usize], decider: &mut D) -> usize {
        let mut rejection = None;
        loop {
            let target = decider.choose_target(actor, candidates, rejection.as_ref());
            if candidates.contains(&target) {
                return target;
            }
            warn!(actor, target, "invalid target, asking again");
            rejection = Some(CoupError::InvalidTarget(target));
        }
    }

    fn resolve<D, S, R>(&mut self, pending: &mut PendingAction, decider: &mut D, sink: &mut S, rng: &mut R) -> Result<(), CoupError>
    where
        D: DecisionProvider + ?Sized,
        S: StateSink + ?Sized,
        R: Rng + ?Sized,
    {
        let cost = pending.kind.cost();
        if cost > 0 {
            // paid on declaration, not refunded if the action is cancelled
            self.roster.player_mut(pending.actor).pay(pending.kind, cost)?;
            self.publish(sink)?;
        }

        pending.state = if pending.kind.is_blockable() {
            State::AwaitingBlock
        } else {
            Self::after_block_phase(pending.kind)
        };

        loop {
            debug!("{:?}", pending);
            pending.state = match pending.state {
                State::AwaitingLegality => unreachable!("legality is checked before resolution"),
                State::AwaitingBlock => self.block_phase(pending, decider),
                State::AwaitingChallengeOfBlock(blocker) => {
                    let challengers = self.block_challengers(pending.actor, blocker);
                    if self.challenge_phase(blocker, Claim::Block(pending.kind), &challengers, decider, sink, rng)? {
                        info!(blocker, "block stands, {} is cancelled", pending.kind);
                        State::Done
                    } else {
                        Self::after_block_phase(pending.kind)
                    }
                }
                State::AwaitingChallengeOfAction => {
                    let challengers = self.roster.opponents_of(pending.actor);
                    if self.challenge_phase(pending.actor, Claim::Action(pending.kind), &challengers, decider, sink, rng)? {
                        State::Applying
                    } else {
                        info!(actor = pending.actor, "{} is cancelled", pending.kind);
                        State::Done
                    }
                }
                State::Applying => {
                    self.apply(pending, decider, sink, rng)?;
                    State::Done
                }
                State::Done => return Ok(()),
            };
        }
    }

    fn after_block_phase(kind: ActionKind) -> State {
        if kind.is_challengeable() {
            State::AwaitingChallengeOfAction
        } else {
            State::Applying
        }
    }

    fn block_phase<D: DecisionProvider + ?Sized>(&self, pending: &PendingAction, decider: &mut D) -> State {
        // a targeted action can only be blocked by its target
        let blockers = match pending.target {
            Some(target_player_idx) => vec![target_player_idx],
            None => self.roster.opponents_of(pending.actor),
        };

        let blocker = blockers
            .into_iter()
            .find(|&player_idx| decider.confirm_block(player_idx, pending.actor, pending.kind));

        match blocker {
            Some(blocker) => {
                info!(blocker, actor = pending.actor, "blocks {}", pending.kind);
                State::AwaitingChallengeOfBlock(blocker)
            }
            None => Self::after_block_phase(pending.kind),
        }
    }

    /// Everyone but the blocker, starting after the actor, so the actor decides last.
    fn block_challengers(&self, actor: usize, blocker: usize) -> Vec<usize> {
        let mut challengers: Vec<usize> = self.roster
            .opponents_of(actor)
            .into_iter()
            .filter(|&player_idx| player_idx != blocker)
            .collect();
        challengers.push(actor);
        challengers
    }

    /// Returns true if the claim stands.
    fn challenge_phase<D, S, R>(&mut self, claimant: usize, claim: Claim, challengers: &[usize], decider: &mut D, sink: &mut S, rng: &mut R) -> Result<bool, CoupError>
    where
        D: DecisionProvider + ?Sized,
        S: StateSink + ?Sized,
        R: Rng + ?Sized,
    {
        let Some(challenger) = challengers
            .iter()
            .copied()
            .find(|&player_idx| decider.confirm_challenge(player_idx, claimant, claim)) else {
            return Ok(true);
        };

        info!(challenger, claimant, "challenges {:?}", claim);

        match self.roster.player(claimant).find_character(&self.cards, claim.qualifying_characters()) {
            Some(card) => {
                info!(claimant, character = %self.cards.character(card), "claim proven");
                self.lose_influence(challenger, decider, sink)?;
                self.replace_revealed_card(claimant, card, sink, rng)?;
                Ok(true)
            }
            None => {
                info!(claimant, "claim was a bluff");
                self.lose_influence(claimant, decider, sink)?;
                Ok(false)
            }
        }
    }

    fn apply<D, S, R>(&mut self, pending: &PendingAction, decider: &mut D, sink: &mut S, rng: &mut R) -> Result<(), CoupError>
    where
        D: DecisionProvider + ?Sized,
        S: StateSink + ?Sized,
        R: Rng + ?Sized,
    {
        let actor = pending.actor;
        if self.roster.is_player_dead(actor) {
            return Err(CoupError::EliminatedPlayerActed(actor));
        }

        // the target may have lost their last card in a challenge along the way
        if let Some(target_player_idx) = pending.target {
            if self.roster.is_player_dead(target_player_idx) {
                debug!(target_player_idx, "target already eliminated, {} fizzles", pending.kind);
                return Ok(());
            }
        }

        match (pending.kind, pending.target) {
            (ActionKind::Income, _) => self.roster.player_mut(actor).gain(1),
            (ActionKind::ForeignAid, _) => self.roster.player_mut(actor).gain(2),
            (ActionKind::Tax, _) => self.roster.player_mut(actor).gain(3),
            (ActionKind::Exchange, _) => self.exchange_influence(actor, decider, sink, rng)?,
            (ActionKind::Coup | ActionKind::Assassinate, Some(target_player_idx)) => {
                self.lose_influence(target_player_idx, decider, sink)?;
            }
            (ActionKind::Steal, Some(target_player_idx)) => {
                let taken = self.roster.player_mut(target_player_idx).surrender(STEAL_AMOUNT);
                self.roster.player_mut(actor).gain(taken);
                debug!(actor, target_player_idx, taken, "stolen");
            }
            (kind, None) => unreachable!("{kind} requires a target"),
        }

        self.publish(sink)
    }

    fn go_next_turn(&mut self) {
        self.turn += 1;

        if let Some(next_player_idx) = self.roster.next_living_after(self.current_player_idx) {
            self.current_player_idx = next_player_idx;
        }
    }

    fn publish<S: StateSink + ?Sized>(&self, sink: &mut S) -> Result<(), CoupError> {
        sink.on_players_changed(&self.roster.snapshot(&self.cards))?;
        sink.on_deck_changed(self.deck.len())?;
        Ok(())
    }

    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            turn: self.turn,
            current_player_idx: self.current_player_idx,
            players: self.roster.snapshot(&self.cards),
            deck: self.deck.iter().map(|&id| self.cards.card(id)).collect(),
        }
    }

    /// Rebuilds a game from a snapshot, checking that every card is accounted for exactly once.
    pub fn restore(snapshot: GameSnapshot) -> Result<Self, CoupError> {
        let cards = CardSet::standard();
        let num_players = snapshot.players.len();
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&num_players) {
            return Err(CoupError::InvalidSnapshot(format!("{num_players} players")));
        }

        let mut seen = HashSet::with_capacity(cards.len());
        let mut check_card = |card: &Card| -> Result<CardId, CoupError> {
            if cards.get(card.id) != Some(*card) {
                return Err(CoupError::InvalidSnapshot(format!("unknown card {:?}", card)));
            }
            if !seen.insert(card.id) {
                return Err(CoupError::InvalidSnapshot(format!("{:?} appears more than once", card.id)));
            }
            Ok(card.id)
        };

        let mut players = Vec::with_capacity(num_players);
        for (idx, player) in snapshot.players.iter().enumerate() {
            if player.id != idx {
                return Err(CoupError::InvalidSnapshot(format!("player {} sits in seat {idx}", player.id)));
            }
            if player.hand.len() > STARTING_HAND {
                return Err(CoupError::InvalidSnapshot(format!("player {idx} holds {} cards", player.hand.len())));
            }

            let hand = player.hand.iter().map(&mut check_card).collect::<Result<Vec<_>, _>>()?;
            players.push(PlayerState::new(idx, player.name.clone(), player.coins, hand));
        }

        let deck = snapshot.deck.iter().map(&mut check_card).collect::<Result<Vec<_>, _>>()?;

        let game = Self {
            turn: snapshot.turn,
            current_player_idx: snapshot.current_player_idx,
            cards,
            deck: Deck::new(deck),
            roster: Roster::new(players),
        };

        game.check_conservation()?;

        if game.current_player_idx >= num_players || game.roster.is_player_dead(game.current_player_idx) {
            return Err(CoupError::InvalidSnapshot(format!("player {} can't take the turn", game.current_player_idx)));
        }

        Ok(game)
    }
}

#[cfg(test)]
impl Coup {
    /// A game with exactly these hands. Cards are taken lowest id first and the rest of the
    /// deck stays in id order.
    pub(crate) fn rigged(hands: &[&[Character]]) -> Coup {
        let cards = CardSet::standard();
        let mut free: Vec<CardId> = cards.ids().collect();

        let mut players = Vec::new();
        for (idx, hand) in hands.iter().enumerate() {
            let mut influence = Vec::new();
            for &character in hand.iter() {
                let position = free
                    .iter()
                    .position(|&id| cards.character(id) == character)
                    .expect("no copies of that character left");
                influence.push(free.remove(position));
            }
            players.push(PlayerState::new(idx, format!("Player {idx}"), config::STARTING_COINS, influence));
        }

        Coup {
            turn: 0,
            current_player_idx: 0,
            cards,
            deck: Deck::new(free),
            roster: Roster::new(players),
        }
    }

    pub(crate) fn set_coins(&mut self, player_idx: usize, coins: u8) {
        self.roster.player_mut(player_idx).coins = coins;
    }

    pub(crate) fn hand(&self, player_idx: usize) -> Vec<Character> {
        self.player(player_idx).influence().iter().map(|&id| self.cards.character(id)).collect()
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_pcg::Pcg64;
    use crate::action::ActionKind::{Assassinate, Coup as CoupAction, Exchange, ForeignAid, Income, Steal, Tax};
    use crate::action::{ActionKind, Claim};
    use crate::Character::{Ambassador, Assassin, Captain, Contessa, Duke};
    use crate::decision::{RandomDecider, ScriptedDecider};
    use crate::error::CoupError;
    use crate::sink::{MemorySink, NullSink};
    use crate::{Coup, GameConfig, GameSnapshot, TurnOutcome};

    fn rng() -> Pcg64 {
        Pcg64::seed_from_u64(0xC0FFEE)
    }

    fn play(game: &mut Coup, decider: &mut ScriptedDecider) -> TurnOutcome {
        match game.play_turn(decider, &mut NullSink, &mut rng()) {
            Ok(outcome) => outcome,
            Err(err) => panic!("failed to play turn: {:?}", err),
        }
    }

    #[test]
    fn complete_game() {
        let mut rng = rng();
        let mut decider = RandomDecider::new(Pcg64::seed_from_u64(11));
        let mut coup = Coup::new(4, &mut rng).unwrap();

        let mut winner = None;
        for _ in 0..10_000 {
            if let TurnOutcome::Won(player_idx) = coup.play_turn(&mut decider, &mut NullSink, &mut rng).unwrap() {
                winner = Some(player_idx);
                break;
            }
            coup.check_conservation().unwrap();
        }

        let winner = winner.expect("game should finish");
        assert_eq!(coup.winner(), Some(winner));
        assert_eq!(coup.roster().living_count(), 1);
    }

    #[test]
    fn setup() {
        let game = Coup::with_config(&GameConfig::with_players(6), &mut rng()).unwrap();
        assert_eq!(game.deck().len(), 3);
        for player in game.roster().players() {
            assert_eq!(player.coins(), 2);
            assert_eq!(player.influence_count(), 2);
        }
        game.check_conservation().unwrap();

        assert!(matches!(Coup::new(1, &mut rng()), Err(CoupError::Config(_))));
    }

    #[test]
    fn income() {
        let mut coup = Coup::rigged(&[&[Duke, Captain], &[Assassin, Contessa], &[Ambassador, Duke]]);
        let mut decider = ScriptedDecider::new().actions(&[Income, Income]);

        assert_eq!(play(&mut coup, &mut decider), TurnOutcome::Continue(1));
        assert_eq!(play(&mut coup, &mut decider), TurnOutcome::Continue(2));

        assert_eq!(coup.player(0).coins(), 3);
        assert_eq!(coup.player(1).coins(), 3);
        assert_eq!(coup.turn(), 2);

        // income can't be blocked or challenged, so nobody was asked anything
        assert!(decider.asked.iter().all(|q| q.starts_with("action")));
    }

    #[test]
    fn foreign_aid() {
        let mut coup = Coup::rigged(&[&[Captain, Captain], &[Assassin, Contessa], &[Ambassador, Duke]]);
        let mut decider = ScriptedDecider::new().actions(&[ForeignAid]);

        play(&mut coup, &mut decider);

        assert_eq!(coup.player(0).coins(), 4);
        // both opponents are offered the block in seat order, nobody is asked to challenge
        assert_eq!(decider.asked, vec!["action 0", "block 1", "block 2"]);
    }

    #[test]
    fn foreign_aid_blocked() {
        let mut coup = Coup::rigged(&[&[Captain, Captain], &[Assassin, Contessa], &[Ambassador, Duke]]);
        let mut decider = ScriptedDecider::new().actions(&[ForeignAid]).blockers(&[2]);

        play(&mut coup, &mut decider);

        assert_eq!(coup.player(0).coins(), 2);
        assert_eq!(decider.asked, vec!["action 0", "block 1", "block 2", "challenge 1", "challenge 0"]);
    }

    #[test]
    fn foreign_aid_block_was_a_bluff() {
        let mut coup = Coup::rigged(&[&[Captain, Captain], &[Assassin, Contessa], &[Ambassador, Duke]]);
        let mut decider = ScriptedDecider::new().actions(&[ForeignAid]).blockers(&[1]).challengers(&[0]);

        play(&mut coup, &mut decider);

        // p1 had no duke so they lose a card and the aid goes through
        assert_eq!(coup.player(0).coins(), 4);
        assert_eq!(coup.player(1).influence_count(), 1);
        assert_eq!(coup.player(0).influence_count(), 2);
        // p2 gets to challenge before the actor does
        assert_eq!(decider.asked, vec!["action 0", "block 1", "challenge 2", "challenge 0", "reveal 1"]);
    }

    #[test]
    fn tax_bluff_challenged() {
        let mut coup = Coup::rigged(&[&[Captain, Contessa], &[Assassin, Contessa], &[Ambassador, Duke]]);
        let mut decider = ScriptedDecider::new().actions(&[Tax]).challengers(&[1]);

        play(&mut coup, &mut decider);

        assert_eq!(coup.player(0).coins(), 2);
        assert_eq!(coup.player(0).influence_count(), 1);
        assert_eq!(coup.player(1).influence_count(), 2);
        coup.check_conservation().unwrap();
    }

    #[test]
    fn tax_with_duke_challenged() {
        let mut coup = Coup::rigged(&[&[Duke, Captain], &[Assassin, Contessa], &[Ambassador, Ambassador]]);
        let duke = coup.player(0).influence()[0];
        let deck_size = coup.deck().len();
        let mut decider = ScriptedDecider::new().actions(&[Tax]).challengers(&[1]);
        let mut sink = MemorySink::new();

        coup.play_turn(&mut decider, &mut sink, &mut rng()).unwrap();

        // challenger pays for being wrong
        assert_eq!(coup.player(1).influence_count(), 1);
        assert_eq!(coup.player(0).coins(), 5);

        // the duke went back into the deck and a replacement took its slot
        assert_eq!(coup.player(0).influence_count(), 2);
        assert_eq!(coup.hand(0)[1], Captain);
        assert!(coup.deck().contains(duke) || coup.player(0).influence()[0] == duke);

        // one card lost by the challenger, the replacement swap is net zero
        assert_eq!(coup.deck().len(), deck_size + 1);
        assert_eq!(sink.latest_deck_size(), Some(deck_size + 1));
        assert_eq!(sink.announced(), vec![(0, Tax)]);
        coup.check_conservation().unwrap();
    }

    #[test]
    fn normal_assassinate() {
        let mut coup = Coup::rigged(&[&[Assassin, Duke], &[Duke, Captain], &[Ambassador, Contessa]]);
        coup.set_coins(0, 3);
        let mut decider = ScriptedDecider::new().actions(&[Assassinate]).targets(&[1]);

        assert_eq!(play(&mut coup, &mut decider), TurnOutcome::Continue(1));

        assert_eq!(coup.player(0).coins(), 0);
        // p1 holds two different cards so they get to choose, the script picks the first
        assert_eq!(coup.hand(1), vec![Captain]);
        assert_eq!(decider.asked, vec!["action 0", "target 0", "block 1", "challenge 1", "challenge 2", "reveal 1"]);
    }

    #[test]
    fn double_assassinate() {
        let mut coup = Coup::rigged(&[&[Assassin, Captain], &[Duke, Duke], &[Ambassador, Contessa]]);
        coup.set_coins(0, 3);
        let mut decider = ScriptedDecider::new().actions(&[Assassinate]).targets(&[1]).challengers(&[1]);

        assert_eq!(play(&mut coup, &mut decider), TurnOutcome::Continue(2));

        // lost the challenge, then the assassination. p1 never had a choice of card
        assert!(coup.player(1).is_eliminated());
        assert!(!decider.asked.iter().any(|q| q.starts_with("reveal")));
        assert_eq!(coup.player(0).coins(), 0);
        assert_eq!(coup.roster().opponents_of(0), vec![2]);
        coup.check_conservation().unwrap();
    }

    #[test]
    fn assassinate_blocked_by_contessa() {
        let mut coup = Coup::rigged(&[&[Assassin, Captain], &[Contessa, Duke], &[Ambassador, Duke]]);
        coup.set_coins(0, 5);
        let mut decider = ScriptedDecider::new().actions(&[Assassinate]).targets(&[1]).blockers(&[1]);

        play(&mut coup, &mut decider);

        assert_eq!(coup.player(1).influence_count(), 2);
        // the fee is gone either way
        assert_eq!(coup.player(0).coins(), 2);
    }

    #[test]
    fn assassinate_bluff_still_costs() {
        let mut coup = Coup::rigged(&[&[Captain, Duke], &[Contessa, Duke], &[Ambassador, Duke]]);
        coup.set_coins(0, 3);
        let mut decider = ScriptedDecider::new().actions(&[Assassinate]).targets(&[2]).challengers(&[1]);

        play(&mut coup, &mut decider);

        assert_eq!(coup.player(0).coins(), 0);
        assert_eq!(coup.player(0).influence_count(), 1);
        assert_eq!(coup.player(2).influence_count(), 2);
    }

    #[test]
    fn assassinate_fizzles_on_eliminated_target() {
        let mut coup = Coup::rigged(&[&[Assassin, Duke], &[Captain], &[Ambassador, Duke]]);
        coup.set_coins(0, 3);
        // p1 bluffs a contessa with their last card and gets caught
        let mut decider = ScriptedDecider::new().actions(&[Assassinate]).targets(&[1]).blockers(&[1]).challengers(&[0]);

        assert_eq!(play(&mut coup, &mut decider), TurnOutcome::Continue(2));
        assert!(coup.player(1).is_eliminated());
        coup.check_conservation().unwrap();
    }

    #[test]
    fn steal() {
        let mut coup = Coup::rigged(&[&[Captain, Duke], &[Assassin, Contessa], &[Ambassador, Duke]]);
        let mut decider = ScriptedDecider::new().actions(&[Steal]).targets(&[2]);

        play(&mut coup, &mut decider);

        assert_eq!(coup.player(0).coins(), 4);
        assert_eq!(coup.player(2).coins(), 0);
        // p1 isn't the target so they are only asked about the challenge
        assert_eq!(decider.asked, vec!["action 0", "target 0", "block 2", "challenge 1", "challenge 2"]);
    }

    #[test]
    fn steal_takes_what_there_is() {
        let mut coup = Coup::rigged(&[&[Captain, Duke], &[Assassin, Contessa]]);
        coup.set_coins(1, 1);
        let mut decider = ScriptedDecider::new().actions(&[Steal]);

        play(&mut coup, &mut decider);

        assert_eq!(coup.player(0).coins(), 3);
        assert_eq!(coup.player(1).coins(), 0);
    }

    #[test]
    fn steal_needs_someone_with_coins() {
        let mut coup = Coup::rigged(&[&[Captain, Duke], &[Assassin, Contessa], &[Ambassador, Duke]]);
        coup.set_coins(1, 0);
        coup.set_coins(2, 0);
        let mut decider = ScriptedDecider::new().actions(&[Steal, Income]);

        assert_eq!(play(&mut coup, &mut decider), TurnOutcome::Continue(1));

        assert_eq!(coup.player(0).coins(), 3);
        assert_eq!(decider.rejections, vec!["there is no valid target for Steal"]);
    }

    #[test]
    fn steal_block_challenged() {
        let mut coup = Coup::rigged(&[&[Captain, Duke], &[Assassin, Contessa], &[Ambassador, Duke], &[Assassin, Contessa]]);
        let mut decider = ScriptedDecider::new().actions(&[Steal]).targets(&[2]).blockers(&[2]).challengers(&[0]);

        play(&mut coup, &mut decider);

        // p2 really had the ambassador, so p0 loses a card and nothing is stolen
        assert_eq!(coup.player(0).influence_count(), 1);
        assert_eq!(coup.player(2).influence_count(), 2);
        assert_eq!(coup.player(0).coins(), 2);
        assert_eq!(coup.player(2).coins(), 2);

        // everyone else may challenge the block before the proposer has to decide
        assert_eq!(
            decider.asked,
            vec!["action 0", "target 0", "block 2", "challenge 1", "challenge 3", "challenge 0", "reveal 0"]
        );
    }

    #[test]
    fn steal_block_bluff_then_action_challenged() {
        let mut coup = Coup::rigged(&[&[Captain, Duke], &[Duke, Contessa], &[Assassin, Contessa]]);
        // p2 challenges twice: first the block, then the steal itself
        let mut decider = ScriptedDecider::new()
            .actions(&[Steal])
            .targets(&[1])
            .blockers(&[1])
            .challengers(&[2, 2]);

        play(&mut coup, &mut decider);

        // p1's block was a bluff, p2's challenge of the captain was wrong
        assert_eq!(coup.hand(1), vec![Contessa]);
        assert_eq!(coup.hand(2), vec![Contessa]);
        assert_eq!(coup.player(0).influence_count(), 2);
        assert_eq!(coup.player(0).coins(), 4);
        assert_eq!(coup.player(1).coins(), 0);
        assert_eq!(decider.claims, vec![Claim::Block(Steal), Claim::Action(Steal), Claim::Action(Steal)]);
        coup.check_conservation().unwrap();
    }

    #[test]
    fn insufficient_funds_reopens_selection() {
        let mut coup = Coup::rigged(&[&[Captain, Duke], &[Assassin, Contessa]]);
        let mut decider = ScriptedDecider::new().actions(&[CoupAction, Assassinate, Income]);

        assert_eq!(play(&mut coup, &mut decider), TurnOutcome::Continue(1));

        assert_eq!(coup.player(0).coins(), 3);
        assert_eq!(coup.turn(), 1);
        assert_eq!(decider.rejections, vec![
            "player 0 can't afford Coup (7 coins, has 2)",
            "player 0 can't afford Assassinate (3 coins, has 2)",
        ]);
    }

    #[test]
    fn invalid_target_is_asked_again() {
        let mut coup = Coup::rigged(&[&[Captain, Duke], &[Assassin, Contessa], &[]]);
        coup.set_coins(0, 7);
        // p0 can't target themselves or the eliminated p2
        let mut decider = ScriptedDecider::new().actions(&[CoupAction]).targets(&[0, 2, 1]);

        play(&mut coup, &mut decider);

        assert_eq!(decider.rejections, vec!["player 0 is not a valid target", "player 2 is not a valid target"]);
        assert_eq!(coup.player(1).influence_count(), 1);
    }

    #[test]
    fn forced_coup() {
        let mut coup = Coup::rigged(&[&[Captain, Duke], &[Assassin, Contessa], &[Ambassador, Duke]]);
        coup.set_coins(0, 10);
        // no scripted actions: the menu must not be offered
        let mut decider = ScriptedDecider::new().targets(&[2]);
        let mut sink = MemorySink::new();

        coup.play_turn(&mut decider, &mut sink, &mut rng()).unwrap();

        assert_eq!(sink.announced(), vec![(0, ActionKind::Coup)]);
        assert_eq!(coup.player(0).coins(), 3);
        assert_eq!(coup.player(2).influence_count(), 1);
        assert!(!decider.asked.iter().any(|q| q.starts_with("action")));
    }

    #[test]
    fn exchange_round_trip() {
        let mut coup = Coup::rigged(&[&[Ambassador, Duke], &[Assassin, Contessa], &[Captain, Duke]]);
        let original = coup.player(0).influence().to_vec();
        let top: Vec<_> = coup.deck().iter().take(2).copied().collect();
        let deck_size = coup.deck().len();

        let mut decider = ScriptedDecider::new().actions(&[Exchange]).returns(&[original.clone()]);
        play(&mut coup, &mut decider);

        assert_eq!(coup.player(0).influence(), top.as_slice());
        assert_eq!(coup.deck().len(), deck_size);
        for card in original {
            assert!(coup.deck().contains(card));
        }
        coup.check_conservation().unwrap();
    }

    #[test]
    fn exchange_with_wrong_count_is_asked_again() {
        let mut coup = Coup::rigged(&[&[Ambassador, Duke], &[Assassin, Contessa]]);
        let keep = coup.player(0).influence()[0];
        let drop = coup.player(0).influence()[1];
        let top: Vec<_> = coup.deck().iter().take(2).copied().collect();

        let mut decider = ScriptedDecider::new()
            .actions(&[Exchange])
            .returns(&[vec![drop], vec![drop, drop], vec![drop, top[0]]]);
        play(&mut coup, &mut decider);

        assert_eq!(decider.rejections, vec![
            "expected 2 cards to be selected, got 1".to_string(),
            format!("card {:?} can't be selected", drop),
        ]);
        assert_eq!(coup.player(0).influence(), &[keep, top[1]]);
    }

    #[test]
    fn exchange_with_one_card() {
        let mut coup = Coup::rigged(&[&[Ambassador], &[Assassin, Contessa]]);
        let deck_size = coup.deck().len();
        let mut decider = ScriptedDecider::new().actions(&[Exchange]);

        play(&mut coup, &mut decider);

        assert_eq!(coup.player(0).influence_count(), 1);
        assert_eq!(coup.deck().len(), deck_size);
    }

    #[test]
    fn challenged_exchange_bluff() {
        let mut coup = Coup::rigged(&[&[Duke], &[Assassin, Contessa], &[Captain, Duke]]);
        let mut decider = ScriptedDecider::new().actions(&[Exchange]).challengers(&[2]);

        assert_eq!(play(&mut coup, &mut decider), TurnOutcome::Continue(1));

        assert!(coup.player(0).is_eliminated());
        assert_eq!(coup.roster().opponents_of(1), vec![2]);
        assert!(!decider.asked.iter().any(|q| q.starts_with("return")));
    }

    #[test]
    fn turns_skip_eliminated_players() {
        let mut coup = Coup::rigged(&[&[Duke, Duke], &[], &[Captain, Captain], &[Contessa]]);
        let mut decider = ScriptedDecider::new().actions(&[Income, Income, Income]);

        assert_eq!(play(&mut coup, &mut decider), TurnOutcome::Continue(2));
        assert_eq!(play(&mut coup, &mut decider), TurnOutcome::Continue(3));
        assert_eq!(play(&mut coup, &mut decider), TurnOutcome::Continue(0));
    }

    #[test]
    fn win_condition() {
        let mut coup = Coup::rigged(&[&[Duke, Captain], &[Assassin], &[]]);
        coup.set_coins(0, 7);
        let mut decider = ScriptedDecider::new().actions(&[CoupAction]);

        assert_eq!(play(&mut coup, &mut decider), TurnOutcome::Won(0));
        assert_eq!(coup.winner(), Some(0));
        coup.check_conservation().unwrap();

        // nothing more is asked once the game is over
        let asked = decider.asked.len();
        assert_eq!(play(&mut coup, &mut decider), TurnOutcome::Won(0));
        assert_eq!(decider.asked.len(), asked);
    }

    #[test]
    fn eliminated_player_acting_is_fatal() {
        let mut coup = Coup::rigged(&[&[Duke], &[], &[Captain]]);
        coup.current_player_idx = 1;
        let mut decider = ScriptedDecider::new();

        let result = coup.play_turn(&mut decider, &mut NullSink, &mut rng());
        assert!(matches!(result, Err(CoupError::EliminatedPlayerActed(1))));
    }

    #[test]
    fn conservation_mismatch_is_detected() {
        let mut coup = Coup::rigged(&[&[Duke, Duke], &[Captain, Captain]]);
        coup.deck.draw_one().unwrap();

        assert!(matches!(coup.check_conservation(), Err(CoupError::CardCountMismatch { counted: 14, expected: 15 })));
    }

    #[test]
    fn snapshot_round_trip() {
        let mut rng = rng();
        let mut coup = Coup::new(5, &mut rng).unwrap();
        let mut decider = RandomDecider::new(Pcg64::seed_from_u64(5));
        for _ in 0..5 {
            coup.play_turn(&mut decider, &mut NullSink, &mut rng).unwrap();
        }

        let json = serde_json::to_string(&coup.snapshot()).unwrap();
        let snapshot: GameSnapshot = serde_json::from_str(&json).unwrap();
        let restored = Coup::restore(snapshot).unwrap();

        assert_eq!(restored, coup);
    }

    #[test]
    fn restore_rejects_duplicated_cards() {
        let coup = Coup::rigged(&[&[Duke, Captain], &[Assassin, Contessa]]);
        let mut snapshot = coup.snapshot();
        snapshot.players[1].hand[0] = snapshot.players[0].hand[0];

        assert!(matches!(Coup::restore(snapshot), Err(CoupError::InvalidSnapshot(_))));

        let mut snapshot = coup.snapshot();
        snapshot.deck.pop();
        assert!(matches!(Coup::restore(snapshot), Err(CoupError::CardCountMismatch { .. })));
    }

    #[test]
    fn challenge_claims_are_reported() {
        let mut coup = Coup::rigged(&[&[Captain, Duke], &[Assassin, Contessa]]);
        coup.set_coins(0, 3);
        let mut decider = ScriptedDecider::new().actions(&[Assassinate]).blockers(&[1]).challengers(&[0]);

        play(&mut coup, &mut decider);

        // p1 really holds a contessa
        assert_eq!(decider.claims, vec![Claim::Block(Assassinate)]);
        assert_eq!(coup.player(0).influence_count(), 1);
        assert_eq!(coup.player(1).influence_count(), 2);
    }
}
