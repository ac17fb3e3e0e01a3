use std::fs::File;
use std::io::Write;
use std::path::Path;
use serde::Serialize;
use thiserror::Error;
use crate::action::ActionKind;
use crate::player::PlayerSnapshot;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Notified by the engine after every committed mutation. A sink only observes; it has no
/// way to write back into the game.
pub trait StateSink {
    fn on_players_changed(&mut self, players: &[PlayerSnapshot]) -> Result<(), SinkError>;

    fn on_deck_changed(&mut self, size: usize) -> Result<(), SinkError>;

    fn on_action_announced(&mut self, actor: usize, action: ActionKind) -> Result<(), SinkError>;
}

impl<S: StateSink + ?Sized> StateSink for Box<S> {
    fn on_players_changed(&mut self, players: &[PlayerSnapshot]) -> Result<(), SinkError> {
        (**self).on_players_changed(players)
    }

    fn on_deck_changed(&mut self, size: usize) -> Result<(), SinkError> {
        (**self).on_deck_changed(size)
    }

    fn on_action_announced(&mut self, actor: usize, action: ActionKind) -> Result<(), SinkError> {
        (**self).on_action_announced(actor, action)
    }
}

#[derive(Copy, Clone, Debug, Default)]
pub struct NullSink;

impl StateSink for NullSink {
    fn on_players_changed(&mut self, _players: &[PlayerSnapshot]) -> Result<(), SinkError> {
        Ok(())
    }

    fn on_deck_changed(&mut self, _size: usize) -> Result<(), SinkError> {
        Ok(())
    }

    fn on_action_announced(&mut self, _actor: usize, _action: ActionKind) -> Result<(), SinkError> {
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SinkEvent {
    PlayersChanged(Vec<PlayerSnapshot>),
    DeckChanged(usize),
    ActionAnnounced(usize, ActionKind),
}

/// Keeps every event in order. Handy for hosts that broadcast in batches, and for tests.
#[derive(Clone, Debug, Default)]
pub struct MemorySink {
    pub events: Vec<SinkEvent>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn latest_players(&self) -> Option<&[PlayerSnapshot]> {
        self.events.iter().rev().find_map(|event| match event {
            SinkEvent::PlayersChanged(players) => Some(players.as_slice()),
            _ => None,
        })
    }

    pub fn latest_deck_size(&self) -> Option<usize> {
        self.events.iter().rev().find_map(|event| match event {
            SinkEvent::DeckChanged(size) => Some(*size),
            _ => None,
        })
    }

    pub fn announced(&self) -> Vec<(usize, ActionKind)> {
        self.events.iter().filter_map(|event| match event {
            SinkEvent::ActionAnnounced(actor, action) => Some((*actor, *action)),
            _ => None,
        }).collect()
    }
}

impl StateSink for MemorySink {
    fn on_players_changed(&mut self, players: &[PlayerSnapshot]) -> Result<(), SinkError> {
        self.events.push(SinkEvent::PlayersChanged(players.to_vec()));
        Ok(())
    }

    fn on_deck_changed(&mut self, size: usize) -> Result<(), SinkError> {
        self.events.push(SinkEvent::DeckChanged(size));
        Ok(())
    }

    fn on_action_announced(&mut self, actor: usize, action: ActionKind) -> Result<(), SinkError> {
        self.events.push(SinkEvent::ActionAnnounced(actor, action));
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct JournalRecord<'a> {
    seq: u64,
    event: &'a str,
    actor: Option<usize>,
    action: Option<ActionKind>,
    deck_size: Option<usize>,
    // json encoded player list
    players: Option<String>,
}

/// Appends one CSV row per event.
pub struct CsvJournal<W: Write> {
    writer: csv::Writer<W>,
    seq: u64,
}

impl CsvJournal<File> {
    pub fn create(path: impl AsRef<Path>) -> Result<Self, SinkError> {
        Ok(Self::new(File::create(path)?))
    }
}

impl<W: Write> CsvJournal<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(writer),
            seq: 0,
        }
    }

    pub fn into_inner(self) -> Result<W, SinkError> {
        self.writer
            .into_inner()
            .map_err(|err| SinkError::Io(std::io::Error::new(err.error().kind(), err.error().to_string())))
    }

    fn record(&mut self, record: JournalRecord) -> Result<(), SinkError> {
        self.writer.serialize(JournalRecord { seq: self.seq, ..record })?;
        self.writer.flush()?;
        self.seq += 1;
        Ok(())
    }
}

impl<W: Write> StateSink for CsvJournal<W> {
    fn on_players_changed(&mut self, players: &[PlayerSnapshot]) -> Result<(), SinkError> {
        let players = serde_json::to_string(players)?;
        self.record(JournalRecord {
            seq: 0,
            event: "players",
            actor: None,
            action: None,
            deck_size: None,
            players: Some(players),
        })
    }

    fn on_deck_changed(&mut self, size: usize) -> Result<(), SinkError> {
        self.record(JournalRecord {
            seq: 0,
            event: "deck",
            actor: None,
            action: None,
            deck_size: Some(size),
            players: None,
        })
    }

    fn on_action_announced(&mut self, actor: usize, action: ActionKind) -> Result<(), SinkError> {
        self.record(JournalRecord {
            seq: 0,
            event: "action",
            actor: Some(actor),
            action: Some(action),
            deck_size: None,
            players: None,
        })
    }
}
