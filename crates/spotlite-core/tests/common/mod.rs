#![allow(dead_code)]

use spotlite_core::{
    EngineEvent, EngineEventKind, Generation, MediaEngine, PlayOutcome, PlayTicket,
    PlaybackController, Song, SongId,
};

/// Every call the controller made on the engine, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    Load(String),
    Play(PlayTicket),
    Pause,
    SetPosition(f64),
    Subscribe(Generation),
    Unsubscribe(Generation),
}

/// Engine that only records.  Tests settle plays and push events by hand.
#[derive(Debug, Default)]
pub struct FakeEngine {
    pub calls: Vec<EngineCall>,
}

impl FakeEngine {
    pub fn plays(&self) -> Vec<PlayTicket> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                EngineCall::Play(t) => Some(*t),
                _ => None,
            })
            .collect()
    }

    pub fn last_play(&self) -> Option<PlayTicket> {
        self.plays().last().copied()
    }

    pub fn loads(&self) -> Vec<String> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                EngineCall::Load(url) => Some(url.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn positions(&self) -> Vec<f64> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                EngineCall::SetPosition(p) => Some(*p),
                _ => None,
            })
            .collect()
    }
}

impl MediaEngine for FakeEngine {
    fn load(&mut self, url: &str) {
        self.calls.push(EngineCall::Load(url.to_string()));
    }

    fn play(&mut self, ticket: PlayTicket) {
        self.calls.push(EngineCall::Play(ticket));
    }

    fn pause(&mut self) {
        self.calls.push(EngineCall::Pause);
    }

    fn set_position(&mut self, position_secs: f64) {
        self.calls.push(EngineCall::SetPosition(position_secs));
    }

    fn subscribe(&mut self, generation: Generation) {
        self.calls.push(EngineCall::Subscribe(generation));
    }

    fn unsubscribe(&mut self, generation: Generation) {
        self.calls.push(EngineCall::Unsubscribe(generation));
    }
}

pub fn song(id: u64, name: &str, accent: &str) -> Song {
    Song {
        id: SongId(id),
        name: name.to_string(),
        artist: format!("Artist {}", id),
        cover: format!("cover-{}", id),
        url: format!("https://media.example/{}.mp3", id),
        accent: accent.to_string(),
    }
}

/// Songs A, B, C with ids 1, 2, 3 and distinct accents.
pub fn abc() -> Vec<Song> {
    vec![
        song(1, "A", "#111111"),
        song(2, "B", "222222"),
        song(3, "C", "#333333"),
    ]
}

pub fn controller_with(songs: Vec<Song>) -> PlaybackController<FakeEngine> {
    let mut controller = PlaybackController::new(FakeEngine::default());
    controller.load_catalog(songs);
    controller
}

pub fn settled(ticket: PlayTicket, outcome: PlayOutcome) -> EngineEvent {
    EngineEvent::new(
        ticket.generation,
        EngineEventKind::PlaySettled { ticket, outcome },
    )
}

pub fn position(generation: Generation, position_secs: f64, duration_secs: f64) -> EngineEvent {
    EngineEvent::new(
        generation,
        EngineEventKind::PositionChanged {
            position_secs,
            duration_secs: Some(duration_secs),
        },
    )
}
