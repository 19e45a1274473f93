use serde::{Deserialize, Serialize};

use crate::catalog::{CatalogStatus, Song, SongId};
use crate::controller::{PlaybackController, PlayerStatus};
use crate::engine::MediaEngine;
use crate::search::Category;

/// Messages sent from a UI client to the player core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd")]
pub enum Command {
    SelectSong { id: SongId },
    TogglePause,
    Next,
    Prev,
    Seek { percent: f64 },
    SetQuery { query: String },
    SetCategory { category: Category },
}

/// One row of the displayed list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SongView {
    pub id: SongId,
    pub name: String,
    pub artist: String,
    pub cover_url: String,
    pub url: String,
    /// Whether this row is the song currently selected for playback.
    pub is_current: bool,
}

impl SongView {
    pub fn from_song(song: &Song, asset_base: &str, current: Option<SongId>) -> Self {
        Self {
            id: song.id,
            name: song.name.clone(),
            artist: song.artist.clone(),
            cover_url: song.cover_url(asset_base),
            url: song.url.clone(),
            is_current: current == Some(song.id),
        }
    }
}

/// Read model published after every state change.  `rev` is a monotonically
/// increasing counter; clients can compare it to skip redundant redraws.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    #[serde(default)]
    pub rev: u64,
    pub status: PlayerStatus,
    pub catalog_status: CatalogStatus,
    pub current: Option<SongView>,
    pub current_index: usize,
    pub is_playing: bool,
    pub current_time_secs: f64,
    pub duration_secs: f64,
    pub progress_percent: f64,
    pub elapsed_label: String,
    pub duration_label: String,
    /// CSS background for the accent-scoped element, if one was ever derived.
    pub accent: Option<String>,
    pub query: String,
    pub category: Category,
    pub displayed: Vec<SongView>,
}

impl Default for PlayerSnapshot {
    fn default() -> Self {
        Self {
            rev: 0,
            status: PlayerStatus::Idle,
            catalog_status: CatalogStatus::Pending,
            current: None,
            current_index: 0,
            is_playing: false,
            current_time_secs: 0.0,
            duration_secs: 0.0,
            progress_percent: 0.0,
            elapsed_label: "0:00".to_string(),
            duration_label: "0:00".to_string(),
            accent: None,
            query: String::new(),
            category: Category::default(),
            displayed: Vec::new(),
        }
    }
}

impl PlayerSnapshot {
    pub fn capture<E: MediaEngine>(controller: &PlaybackController<E>, asset_base: &str) -> Self {
        let current_id = controller.current_song().map(|s| s.id);
        let progress = controller.progress();
        Self {
            rev: 0,
            status: controller.status(),
            catalog_status: controller.catalog_status().clone(),
            current: controller
                .current_song()
                .map(|s| SongView::from_song(s, asset_base, current_id)),
            current_index: controller.current_index(),
            is_playing: controller.is_playing(),
            current_time_secs: progress.current_time_secs(),
            duration_secs: progress.duration_secs(),
            progress_percent: progress.progress_percent(),
            elapsed_label: progress.elapsed_label(),
            duration_label: progress.duration_label(),
            accent: controller.accent().map(|g| g.css()),
            query: controller.search().query().to_string(),
            category: controller.category(),
            displayed: controller
                .displayed()
                .iter()
                .map(|s| SongView::from_song(s, asset_base, current_id))
                .collect(),
        }
    }
}
