//! Media engine seam.
//!
//! The controller never waits on the engine.  Commands go out through
//! [`MediaEngine`]; everything the engine has to say comes back later as an
//! [`EngineEvent`] that the owner of the controller feeds into
//! `PlaybackController::handle_engine_event`.
//!
//! ```text
//!  controller ── load / play(ticket) / pause / set_position ──▶ engine
//!      ▲                                                          │
//!      └──── EngineEvent { generation, kind } ◀───────────────────┘
//! ```
//!
//! Two tags keep late events from leaking into a newer selection:
//! - `Generation` is bumped on every selection; position/metadata/ended/
//!   load-failure events carry the generation that was subscribed when they were produced.
//! - `PlayTicket` identifies one `play()` request; its settlement is only
//!   applied while it is still the latest outstanding request.

use serde::{Deserialize, Serialize};

/// Subscription epoch.  One per selected song.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Generation(pub u64);

impl Generation {
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

/// Identity of one asynchronous `play()` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayTicket {
    /// Monotonic request counter, unique per controller.
    pub request: u64,
    /// Selection generation the request was issued under.
    pub generation: Generation,
    /// Index into the full list the request was issued for.
    pub index: usize,
}

/// How a `play()` request ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlayOutcome {
    Started,
    /// Engine refused.  `engine_paused` is the engine's actual state once the
    /// refusal settled, used to reconcile `is_playing`.
    Rejected { reason: String, engine_paused: bool },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EngineEventKind {
    /// Periodic play-head report at the engine's native cadence.
    PositionChanged {
        position_secs: f64,
        duration_secs: Option<f64>,
    },
    MetadataLoaded { duration_secs: f64 },
    /// Current track reached its end.
    Ended,
    /// The engine could not open or decode the current source.  Playback
    /// has stopped regardless of any outstanding `play()`.
    LoadFailed { reason: String },
    PlaySettled {
        ticket: PlayTicket,
        outcome: PlayOutcome,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineEvent {
    pub generation: Generation,
    pub kind: EngineEventKind,
}

impl EngineEvent {
    pub fn new(generation: Generation, kind: EngineEventKind) -> Self {
        Self { generation, kind }
    }
}

/// Capability set the controller relies on.  Implementations must not block:
/// anything slow is queued and reported back as an [`EngineEvent`].
pub trait MediaEngine {
    /// Replace the current source.  The engine stays paused until `play`.
    fn load(&mut self, url: &str);

    /// Start or resume playback; settles later as `PlaySettled { ticket, .. }`.
    fn play(&mut self, ticket: PlayTicket);

    fn pause(&mut self);

    fn set_position(&mut self, position_secs: f64);

    /// Start tagging position/metadata/ended events with `generation`.
    fn subscribe(&mut self, generation: Generation);

    /// Stop delivering events for `generation`.
    fn unsubscribe(&mut self, generation: Generation);
}

impl<E: MediaEngine + ?Sized> MediaEngine for Box<E> {
    fn load(&mut self, url: &str) {
        (**self).load(url)
    }

    fn play(&mut self, ticket: PlayTicket) {
        (**self).play(ticket)
    }

    fn pause(&mut self) {
        (**self).pause()
    }

    fn set_position(&mut self, position_secs: f64) {
        (**self).set_position(position_secs)
    }

    fn subscribe(&mut self, generation: Generation) {
        (**self).subscribe(generation)
    }

    fn unsubscribe(&mut self, generation: Generation) {
        (**self).unsubscribe(generation)
    }
}
