//! Error types for the player core

use thiserror::Error;

use crate::catalog::SongId;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlayerError {
    /// Catalog fetch failed or returned malformed data.
    #[error("Catalog unavailable: {0}")]
    CatalogUnavailable(String),

    /// Engine refused to start or resume playback.
    #[error("Playback rejected: {0}")]
    PlaybackRejected(String),

    /// Identity does not resolve within the full list.
    #[error("Invalid selection: song {0} is not in the catalog")]
    InvalidSelection(SongId),

    /// Transport command issued before a non-empty catalog arrived.
    #[error("Catalog is empty")]
    CatalogEmpty,

    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    /// Driver-level failure (engine process missing, IPC closed).
    #[error("Engine error: {0}")]
    Engine(String),
}

pub type Result<T> = std::result::Result<T, PlayerError>;
