use std::fmt::{Debug, Display, Formatter};
use serde::{Deserialize, Serialize};
use crate::{Character, State};
use crate::Character::{Ambassador, Assassin, Captain, Contessa, Duke};

/// Coins at which a player loses the menu and must coup.
pub const FORCED_COUP_COINS: u8 = 10;

/// Cards an exchange draws from the deck.
pub const EXCHANGE_DRAW: usize = 2;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    Income,
    ForeignAid,
    Coup,
    Tax,
    Assassinate,
    Exchange,
    Steal,
}

pub static ACTION_VARIANTS: [ActionKind; 7] = [
    ActionKind::Income,
    ActionKind::ForeignAid,
    ActionKind::Coup,
    ActionKind::Tax,
    ActionKind::Assassinate,
    ActionKind::Exchange,
    ActionKind::Steal,
];

/// One row of the rules table.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ActionRule {
    pub cost: u8,
    pub requires_target: bool,
    /// character the actor claims to hold, open to challenge
    pub claim: Option<Character>,
    /// characters that may be claimed to block the action
    pub blocked_by: &'static [Character],
}

impl ActionKind {
    pub const fn rule(self) -> ActionRule {
        match self {
            ActionKind::Income => ActionRule { cost: 0, requires_target: false, claim: None, blocked_by: &[] },
            ActionKind::ForeignAid => ActionRule { cost: 0, requires_target: false, claim: None, blocked_by: &[Duke] },
            ActionKind::Coup => ActionRule { cost: 7, requires_target: true, claim: None, blocked_by: &[] },
            ActionKind::Tax => ActionRule { cost: 0, requires_target: false, claim: Some(Duke), blocked_by: &[] },
            ActionKind::Assassinate => ActionRule { cost: 3, requires_target: true, claim: Some(Assassin), blocked_by: &[Contessa] },
            ActionKind::Exchange => ActionRule { cost: 0, requires_target: false, claim: Some(Ambassador), blocked_by: &[] },
            ActionKind::Steal => ActionRule { cost: 0, requires_target: true, claim: Some(Captain), blocked_by: &[Captain, Ambassador] },
        }
    }

    pub fn cost(self) -> u8 {
        self.rule().cost
    }

    pub fn requires_target(self) -> bool {
        self.rule().requires_target
    }

    pub fn is_blockable(self) -> bool {
        !self.rule().blocked_by.is_empty()
    }

    pub fn is_challengeable(self) -> bool {
        self.rule().claim.is_some()
    }
}

impl Display for ActionKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Debug::fmt(self, f)
    }
}

/// What a challenged player has to prove they hold.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Claim {
    // claim backing the action itself
    Action(ActionKind),
    // claim backing a block of the action
    Block(ActionKind),
}

impl Claim {
    pub fn qualifying_characters(&self) -> &'static [Character] {
        match self {
            Claim::Action(kind) => match kind {
                ActionKind::Tax => &[Duke],
                ActionKind::Assassinate => &[Assassin],
                ActionKind::Exchange => &[Ambassador],
                ActionKind::Steal => &[Captain],
                _ => &[],
            },
            Claim::Block(kind) => kind.rule().blocked_by,
        }
    }
}

/// The action currently being resolved.
#[derive(Clone, PartialEq, Eq)]
pub struct PendingAction {
    pub actor: usize,
    pub kind: ActionKind,
    pub target: Option<usize>,
    pub state: State,
}

impl PendingAction {
    pub fn new(actor: usize, kind: ActionKind) -> Self {
        Self {
            actor,
            kind,
            target: None,
            state: State::AwaitingLegality,
        }
    }

    pub fn claimed_character(&self) -> Option<Character> {
        self.kind.rule().claim
    }
}

impl Debug for PendingAction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let player_idx = self.actor;
        match (self.kind, self.target) {
            (ActionKind::Income, _) => {
                f.write_fmt(format_args!("Player {player_idx} takes Income"))?
            }
            (ActionKind::ForeignAid, _) => {
                f.write_fmt(format_args!("Player {player_idx} gets foreign aid"))?
            }
            (ActionKind::Tax, _) => {
                f.write_fmt(format_args!("Player {player_idx} gets Taxes"))?
            }
            (ActionKind::Exchange, _) => {
                f.write_fmt(format_args!("Player {player_idx} exchanges with the deck"))?
            }
            (ActionKind::Coup, Some(target_player_idx)) => {
                f.write_fmt(format_args!("Player {player_idx} coups {target_player_idx}"))?
            }
            (ActionKind::Assassinate, Some(target_player_idx)) => {
                f.write_fmt(format_args!("Player {player_idx} assassinates {target_player_idx}"))?
            }
            (ActionKind::Steal, Some(target_player_idx)) => {
                f.write_fmt(format_args!("Player {player_idx} steals from {target_player_idx}"))?
            }
            (kind, None) => {
                f.write_fmt(format_args!("Player {player_idx} declares {:?}", kind))?
            }
        }
        f.write_fmt(format_args!(" [{:?}]", self.state))
    }
}
