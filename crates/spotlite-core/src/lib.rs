//! Player core: catalog, search, category, progress, accent and the
//! playback state machine that ties them to a media engine.
//!
//! Nothing in here performs I/O beyond the config file and local catalog files.
//! The daemon owns a [`PlaybackController`] on one task, feeds it
//! [`Command`]s and [`EngineEvent`]s, and publishes [`PlayerSnapshot`]s.

pub mod accent;
pub mod catalog;
pub mod config;
pub mod controller;
pub mod engine;
pub mod error;
pub mod platform;
pub mod progress;
pub mod protocol;
pub mod search;

pub use accent::{color_for, Gradient};
pub use catalog::{Catalog, CatalogStatus, Song, SongId};
pub use config::Config;
pub use controller::{PlaybackController, PlayerStatus};
pub use engine::{EngineEvent, EngineEventKind, Generation, MediaEngine, PlayOutcome, PlayTicket};
pub use error::{PlayerError, Result};
pub use progress::{format_time, ProgressTracker};
pub use protocol::{Command, PlayerSnapshot, SongView};
pub use search::{Category, SearchState};
