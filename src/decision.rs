use rand::Rng;
use rand::seq::SliceRandom;
use crate::action::{ActionKind, Claim};
use crate::character::{Card, CardId};
use crate::config::BotConfig;
use crate::error::CoupError;

/// Every choice a player makes during a game. The engine blocks on each call until it
/// gets an answer.
///
/// When an answer is rejected the same question is asked again with `rejection` set to
/// the reason, so a provider can explain it to whoever is answering.
pub trait DecisionProvider {
    fn choose_action(&mut self, player_idx: usize, legal_actions: &[ActionKind], rejection: Option<&CoupError>) -> ActionKind;

    fn choose_target(&mut self, player_idx: usize, candidates: &[usize], rejection: Option<&CoupError>) -> usize;

    /// `claimant` is the acting player whose `action` may be blocked.
    fn confirm_block(&mut self, player_idx: usize, claimant: usize, action: ActionKind) -> bool;

    fn confirm_challenge(&mut self, player_idx: usize, claimant: usize, claim: Claim) -> bool;

    fn choose_card_to_reveal(&mut self, player_idx: usize, held: &[Card], rejection: Option<&CoupError>) -> CardId;

    fn choose_cards_to_return(&mut self, player_idx: usize, pool: &[Card], count_required: usize, rejection: Option<&CoupError>) -> Vec<CardId>;
}

/// Answers everything at random. Drives simulations and the CLI runner.
pub struct RandomDecider<R: Rng> {
    rng: R,
    block_chance: f64,
    challenge_chance: f64,
}

impl<R: Rng> RandomDecider<R> {
    pub fn new(rng: R) -> Self {
        Self::with_config(rng, &BotConfig::default())
    }

    pub fn with_config(rng: R, config: &BotConfig) -> Self {
        Self {
            rng,
            block_chance: config.block_chance.clamp(0.0, 1.0),
            challenge_chance: config.challenge_chance.clamp(0.0, 1.0),
        }
    }
}

impl<R: Rng> DecisionProvider for RandomDecider<R> {
    fn choose_action(&mut self, _player_idx: usize, legal_actions: &[ActionKind], _rejection: Option<&CoupError>) -> ActionKind {
        legal_actions.choose(&mut self.rng).copied().unwrap_or(ActionKind::Income)
    }

    fn choose_target(&mut self, _player_idx: usize, candidates: &[usize], _rejection: Option<&CoupError>) -> usize {
        candidates.choose(&mut self.rng).copied().unwrap_or_default()
    }

    fn confirm_block(&mut self, _player_idx: usize, _claimant: usize, _action: ActionKind) -> bool {
        self.rng.gen_bool(self.block_chance)
    }

    fn confirm_challenge(&mut self, _player_idx: usize, _claimant: usize, _claim: Claim) -> bool {
        self.rng.gen_bool(self.challenge_chance)
    }

    fn choose_card_to_reveal(&mut self, _player_idx: usize, held: &[Card], _rejection: Option<&CoupError>) -> CardId {
        held.choose(&mut self.rng).map(|card| card.id).unwrap_or_default()
    }

    fn choose_cards_to_return(&mut self, _player_idx: usize, pool: &[Card], count_required: usize, _rejection: Option<&CoupError>) -> Vec<CardId> {
        pool.choose_multiple(&mut self.rng, count_required).map(|card| card.id).collect()
    }
}

/// Plays back canned answers and records every question it was asked.
///
/// Blockers and challengers answer yes once per entry, the first time they are asked.
/// Anything left unscripted falls back to the first candidate, or for exchanges, returning
/// the freshly drawn cards.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct ScriptedDecider {
    pub actions: std::collections::VecDeque<ActionKind>,
    pub targets: std::collections::VecDeque<usize>,
    pub blockers: Vec<usize>,
    pub challengers: Vec<usize>,
    pub reveals: std::collections::VecDeque<CardId>,
    pub returns: std::collections::VecDeque<Vec<CardId>>,
    pub asked: Vec<String>,
    pub claims: Vec<Claim>,
    pub rejections: Vec<String>,
}

#[cfg(test)]
impl ScriptedDecider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn actions(mut self, actions: &[ActionKind]) -> Self {
        self.actions.extend(actions);
        self
    }

    pub fn targets(mut self, targets: &[usize]) -> Self {
        self.targets.extend(targets);
        self
    }

    pub fn blockers(mut self, blockers: &[usize]) -> Self {
        self.blockers.extend(blockers);
        self
    }

    pub fn challengers(mut self, challengers: &[usize]) -> Self {
        self.challengers.extend(challengers);
        self
    }

    pub fn reveals(mut self, reveals: &[CardId]) -> Self {
        self.reveals.extend(reveals);
        self
    }

    pub fn returns(mut self, returns: &[Vec<CardId>]) -> Self {
        self.returns.extend(returns.iter().cloned());
        self
    }

    fn note(&mut self, question: &str, player_idx: usize, rejection: Option<&CoupError>) {
        self.asked.push(format!("{question} {player_idx}"));
        if let Some(err) = rejection {
            self.rejections.push(err.to_string());
        }
    }

    fn answer_once(scripted: &mut Vec<usize>, player_idx: usize) -> bool {
        match scripted.iter().position(|&idx| idx == player_idx) {
            Some(position) => {
                scripted.remove(position);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
impl DecisionProvider for ScriptedDecider {
    fn choose_action(&mut self, player_idx: usize, _legal_actions: &[ActionKind], rejection: Option<&CoupError>) -> ActionKind {
        self.note("action", player_idx, rejection);
        self.actions.pop_front().expect("ran out of scripted actions")
    }

    fn choose_target(&mut self, player_idx: usize, candidates: &[usize], rejection: Option<&CoupError>) -> usize {
        self.note("target", player_idx, rejection);
        self.targets.pop_front().unwrap_or(candidates[0])
    }

    fn confirm_block(&mut self, player_idx: usize, _claimant: usize, _action: ActionKind) -> bool {
        self.note("block", player_idx, None);
        Self::answer_once(&mut self.blockers, player_idx)
    }

    fn confirm_challenge(&mut self, player_idx: usize, _claimant: usize, claim: Claim) -> bool {
        self.note("challenge", player_idx, None);
        self.claims.push(claim);
        Self::answer_once(&mut self.challengers, player_idx)
    }

    fn choose_card_to_reveal(&mut self, player_idx: usize, held: &[Card], rejection: Option<&CoupError>) -> CardId {
        self.note("reveal", player_idx, rejection);
        self.reveals.pop_front().unwrap_or(held[0].id)
    }

    fn choose_cards_to_return(&mut self, player_idx: usize, pool: &[Card], count_required: usize, rejection: Option<&CoupError>) -> Vec<CardId> {
        self.note("return", player_idx, rejection);
        self.returns
            .pop_front()
            .unwrap_or_else(|| pool[pool.len() - count_required..].iter().map(|card| card.id).collect())
    }
}
