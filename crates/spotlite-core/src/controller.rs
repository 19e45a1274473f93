//! PlaybackController: sole owner of the selection, the play state, the
//! play-head and the displayed list.
//!
//! All mutation goes through `&mut self` on one task; the engine is commanded
//! but never awaited.  Late engine results are filtered by generation and by
//! play ticket (see [`crate::engine`]) so the most recent selection always
//! wins.
//!
//! # States
//! ```text
//!  Idle     no songs yet; transport is unavailable
//!  Paused   catalog non-empty, not playing
//!  Playing  catalog non-empty, playing (or a play request is in flight)
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::accent::{color_for, Gradient};
use crate::catalog::{Catalog, CatalogStatus, Song, SongId};
use crate::engine::{EngineEvent, EngineEventKind, Generation, MediaEngine, PlayOutcome, PlayTicket};
use crate::error::{PlayerError, Result};
use crate::progress::ProgressTracker;
use crate::search::{displayed_list, Category, SearchState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerStatus {
    Idle,
    Paused,
    Playing,
}

pub struct PlaybackController<E: MediaEngine> {
    engine: E,
    catalog: Catalog,
    catalog_status: CatalogStatus,
    search: SearchState,
    category: Category,
    current_index: usize,
    is_playing: bool,
    progress: ProgressTracker,
    accent: Option<Gradient>,
    /// Generation of the current selection.
    generation: Generation,
    /// Generation the engine is currently subscribed with.
    subscribed: Option<Generation>,
    next_request: u64,
    /// Latest outstanding `play()` request, cleared by pause or settlement.
    pending_play: Option<PlayTicket>,
}

impl<E: MediaEngine> PlaybackController<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            catalog: Catalog::default(),
            catalog_status: CatalogStatus::Pending,
            search: SearchState::default(),
            category: Category::default(),
            current_index: 0,
            is_playing: false,
            progress: ProgressTracker::default(),
            accent: None,
            generation: Generation::default(),
            subscribed: None,
            next_request: 0,
            pending_play: None,
        }
    }

    // ── read side ────────────────────────────────────────────────────────────

    pub fn status(&self) -> PlayerStatus {
        if self.catalog.is_empty() {
            PlayerStatus::Idle
        } else if self.is_playing {
            PlayerStatus::Playing
        } else {
            PlayerStatus::Paused
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn catalog_status(&self) -> &CatalogStatus {
        &self.catalog_status
    }

    pub fn search(&self) -> &SearchState {
        &self.search
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn displayed(&self) -> &[Song] {
        displayed_list(&self.catalog, &self.search, self.category)
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_song(&self) -> Option<&Song> {
        self.catalog.get(self.current_index)
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn progress(&self) -> &ProgressTracker {
        &self.progress
    }

    pub fn accent(&self) -> Option<&Gradient> {
        self.accent.as_ref()
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn pending_play(&self) -> Option<PlayTicket> {
        self.pending_play
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    // ── catalog ──────────────────────────────────────────────────────────────

    /// Install a freshly fetched catalog, replacing any previous one wholesale.
    ///
    /// The first non-empty catalog moves the controller out of `Idle`: song 0
    /// is loaded paused so its duration becomes known.
    pub fn load_catalog(&mut self, songs: Vec<Song>) {
        let previous_id = self.current_song().map(|s| s.id);
        let was_idle = self.catalog.is_empty();

        self.catalog = Catalog::new(songs);
        self.catalog_status = CatalogStatus::Loaded {
            songs: self.catalog.len(),
        };
        self.search.recompute(&self.catalog);
        info!("Catalog loaded with {} songs", self.catalog.len());

        if self.catalog.is_empty() {
            self.drop_subscription();
            self.current_index = 0;
            self.is_playing = false;
            self.pending_play = None;
            self.progress.reset();
            return;
        }

        match previous_id.and_then(|id| self.catalog.position_of(id)) {
            Some(index) if !was_idle => {
                // Same song survives the swap; only its position may move.
                self.current_index = index;
            }
            _ => {
                if self.is_playing {
                    self.engine.pause();
                }
                self.is_playing = false;
                self.begin_selection(0);
            }
        }
        self.refresh_accent();
    }

    /// Record a failed fetch.  The catalog stays empty; transport stays
    /// unavailable.
    pub fn catalog_unavailable(&mut self, reason: impl Into<String>) {
        let reason = reason.into();
        warn!("{}", PlayerError::CatalogUnavailable(reason.clone()));
        self.catalog_status = CatalogStatus::Unavailable { reason };
    }

    // ── transport ────────────────────────────────────────────────────────────

    /// Select a song by identity.  Always lands in `Playing`.
    pub fn select_song(&mut self, id: SongId) -> Result<()> {
        self.require_catalog()?;
        let index = self
            .catalog
            .position_of(id)
            .ok_or(PlayerError::InvalidSelection(id))?;
        info!("Selecting song {} at index {}", id, index);
        self.start(index);
        Ok(())
    }

    pub fn toggle_play_pause(&mut self) -> Result<()> {
        self.require_catalog()?;
        self.is_playing = !self.is_playing;
        if self.is_playing {
            self.issue_play();
        } else {
            self.pending_play = None;
            self.engine.pause();
        }
        debug!("Toggled playback, is_playing={}", self.is_playing);
        self.refresh_accent();
        Ok(())
    }

    pub fn next(&mut self) -> Result<()> {
        self.require_catalog()?;
        let index = (self.current_index + 1) % self.catalog.len();
        self.start(index);
        Ok(())
    }

    pub fn previous(&mut self) -> Result<()> {
        self.require_catalog()?;
        let len = self.catalog.len();
        let index = (self.current_index + len - 1) % len;
        self.start(index);
        Ok(())
    }

    /// Seek to `percent` of the current track.  Play state is untouched.
    pub fn seek(&mut self, percent: f64) -> Result<()> {
        self.require_catalog()?;
        match self.progress.seek_target(percent) {
            Some(position) => {
                debug!("Seeking to {:.2}s ({:.1}%)", position, percent);
                self.engine.set_position(position);
            }
            None => debug!("Seek to {:.1}% ignored: duration not known yet", percent),
        }
        Ok(())
    }

    // ── display ──────────────────────────────────────────────────────────────

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.search.set_query(query, &self.catalog);
    }

    pub fn set_category(&mut self, category: Category) {
        self.category = category;
    }

    // ── engine events ────────────────────────────────────────────────────────

    /// Apply one engine report.  Returns `true` if state changed.
    pub fn handle_engine_event(&mut self, event: EngineEvent) -> bool {
        if let EngineEventKind::PlaySettled { ticket, outcome } = event.kind {
            return self.settle_play(ticket, outcome);
        }

        if self.subscribed != Some(event.generation) || event.generation != self.generation {
            debug!(
                "Dropping engine event from generation {:?} (current {:?})",
                event.generation, self.generation
            );
            return false;
        }

        match event.kind {
            EngineEventKind::PositionChanged {
                position_secs,
                duration_secs,
            } => {
                self.progress.on_position(position_secs, duration_secs);
                true
            }
            EngineEventKind::MetadataLoaded { duration_secs } => {
                self.progress.on_metadata_loaded(duration_secs);
                true
            }
            EngineEventKind::Ended => {
                info!("Track at index {} ended, advancing", self.current_index);
                self.next().is_ok()
            }
            EngineEventKind::LoadFailed { reason } => {
                warn!("{}", PlayerError::PlaybackRejected(reason));
                self.pending_play = None;
                let was_playing = self.is_playing;
                self.is_playing = false;
                self.refresh_accent();
                was_playing
            }
            EngineEventKind::PlaySettled { .. } => false,
        }
    }

    fn settle_play(&mut self, ticket: PlayTicket, outcome: PlayOutcome) -> bool {
        let current = self.pending_play == Some(ticket)
            && ticket.generation == self.generation
            && ticket.index == self.current_index;
        if !current {
            debug!("Discarding stale play settlement {:?}", ticket);
            return false;
        }
        self.pending_play = None;

        match outcome {
            PlayOutcome::Started => {
                debug!("Play request {} started", ticket.request);
                false
            }
            PlayOutcome::Rejected {
                reason,
                engine_paused,
            } => {
                warn!("{}", PlayerError::PlaybackRejected(reason));
                let was_playing = self.is_playing;
                self.is_playing = !engine_paused;
                self.refresh_accent();
                was_playing != self.is_playing
            }
        }
    }

    // ── internals ────────────────────────────────────────────────────────────

    fn require_catalog(&self) -> Result<()> {
        if self.catalog.is_empty() {
            Err(PlayerError::CatalogEmpty)
        } else {
            Ok(())
        }
    }

    fn start(&mut self, index: usize) {
        self.is_playing = true;
        self.begin_selection(index);
        self.issue_play();
        self.refresh_accent();
    }

    /// Point the controller and engine at `index`.  The old subscription is
    /// torn down before the new one is installed.
    fn begin_selection(&mut self, index: usize) {
        self.current_index = index;
        self.drop_subscription();
        self.generation = self.generation.next();
        self.engine.subscribe(self.generation);
        self.subscribed = Some(self.generation);
        self.pending_play = None;
        self.progress.reset();

        let url = self
            .catalog
            .get(index)
            .map(|s| s.url.clone())
            .unwrap_or_default();
        self.engine.load(&url);
    }

    fn drop_subscription(&mut self) {
        if let Some(generation) = self.subscribed.take() {
            self.engine.unsubscribe(generation);
        }
    }

    fn issue_play(&mut self) {
        self.next_request += 1;
        let ticket = PlayTicket {
            request: self.next_request,
            generation: self.generation,
            index: self.current_index,
        };
        self.pending_play = Some(ticket);
        self.engine.play(ticket);
    }

    /// Re-derive the accent.  Runs on every index or play-state change; a
    /// song without an accent keeps the previous gradient.
    fn refresh_accent(&mut self) {
        if let Some(gradient) = self.current_song().and_then(color_for) {
            self.accent = Some(gradient);
        }
    }
}
