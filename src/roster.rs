use crate::character::CardSet;
use crate::player::{PlayerSnapshot, PlayerState};

/// Every seat at the table, in turn order. The only owner of player state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Roster {
    players: Vec<PlayerState>,
}

impl Roster {
    pub fn new(players: Vec<PlayerState>) -> Self {
        Self { players }
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn players(&self) -> &[PlayerState] {
        &self.players
    }

    pub fn player(&self, player_idx: usize) -> &PlayerState {
        &self.players[player_idx]
    }

    pub(crate) fn player_mut(&mut self, player_idx: usize) -> &mut PlayerState {
        &mut self.players[player_idx]
    }

    pub fn is_player_dead(&self, player_idx: usize) -> bool {
        self.players[player_idx].is_eliminated()
    }

    /// Living players other than `player_idx`, in seat order starting after them.
    pub fn opponents_of(&self, player_idx: usize) -> Vec<usize> {
        (1..self.players.len())
            .map(|n| (player_idx + n) % self.players.len())
            .filter(|&idx| !self.is_player_dead(idx))
            .collect()
    }

    pub fn living_players(&self) -> impl Iterator<Item=usize> + '_ {
        self.players
            .iter()
            .enumerate()
            .filter(|(_, player)| !player.is_eliminated())
            .map(|(idx, _)| idx)
    }

    pub fn living_count(&self) -> usize {
        self.living_players().count()
    }

    /// Next living seat after `player_idx`, wrapping around. None when nobody is left.
    pub fn next_living_after(&self, player_idx: usize) -> Option<usize> {
        (1..=self.players.len())
            .map(|n| (player_idx + n) % self.players.len())
            .find(|&idx| !self.is_player_dead(idx))
    }

    pub fn total_influence(&self) -> usize {
        self.players.iter().map(PlayerState::influence_count).sum()
    }

    pub fn snapshot(&self, cards: &CardSet) -> Vec<PlayerSnapshot> {
        self.players.iter().map(|player| player.snapshot(cards)).collect()
    }
}
