/// PlayerCore: single-owner event loop for all mutable player state.
///
/// Every task that wants to change playback sends a `CoreEvent` here: HTTP
/// handlers send client commands, the engine driver sends tagged engine
/// events, the catalog fetch sends its one result.  PlayerCore owns the
/// `PlaybackController` exclusively; after each event that may have changed
/// something it publishes a fresh `PlayerSnapshot` to the `StateManager`.
use std::sync::Arc;

use spotlite_core::{
    Command, EngineEvent, MediaEngine, PlaybackController, PlayerError, PlayerSnapshot, Song,
};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::state::StateManager;

pub type CommandReply = oneshot::Sender<Result<(), PlayerError>>;

/// All inputs into the PlayerCore loop.
#[derive(Debug)]
pub enum CoreEvent {
    /// A command from the HTTP API.  `reply` receives the outcome once the
    /// resulting snapshot has been published.
    Client {
        command: Command,
        reply: Option<CommandReply>,
    },
    Engine(EngineEvent),
    CatalogLoaded(Vec<Song>),
    CatalogFailed(String),
    Shutdown,
}

impl CoreEvent {
    #[cfg(test)]
    pub fn command(command: Command) -> Self {
        Self::Client {
            command,
            reply: None,
        }
    }
}

pub struct PlayerCore<E: MediaEngine> {
    controller: PlaybackController<E>,
    state_manager: Arc<StateManager>,
    asset_base: String,
}

impl<E: MediaEngine> PlayerCore<E> {
    pub fn new(engine: E, state_manager: Arc<StateManager>, asset_base: String) -> Self {
        Self {
            controller: PlaybackController::new(engine),
            state_manager,
            asset_base,
        }
    }

    #[cfg(test)]
    pub fn controller(&self) -> &PlaybackController<E> {
        &self.controller
    }

    /// Run until `Shutdown` arrives or every sender is dropped.
    pub async fn run(mut self, mut event_rx: mpsc::Receiver<CoreEvent>) -> anyhow::Result<()> {
        info!("PlayerCore: starting event loop");
        self.publish().await;

        while let Some(event) = event_rx.recv().await {
            if !self.handle_event(event).await {
                info!("PlayerCore: shutdown requested");
                return Ok(());
            }
        }
        info!("PlayerCore: event channel closed, shutting down");
        Ok(())
    }

    /// Apply one event.  Returns `false` when the loop should stop.
    pub async fn handle_event(&mut self, event: CoreEvent) -> bool {
        match event {
            CoreEvent::Shutdown => return false,

            CoreEvent::Client { command, reply } => {
                info!("PlayerCore: command {:?}", command);
                let result = self.handle_command(command);
                if let Err(ref e) = result {
                    warn!("PlayerCore: command rejected: {}", e);
                }
                self.publish().await;
                if let Some(reply) = reply {
                    let _ = reply.send(result);
                }
            }

            CoreEvent::Engine(event) => {
                if self.controller.handle_engine_event(event) {
                    self.publish().await;
                }
            }

            CoreEvent::CatalogLoaded(songs) => {
                self.controller.load_catalog(songs);
                self.publish().await;
            }

            CoreEvent::CatalogFailed(reason) => {
                self.controller.catalog_unavailable(reason);
                self.publish().await;
            }
        }
        true
    }

    fn handle_command(&mut self, command: Command) -> Result<(), PlayerError> {
        match command {
            Command::SelectSong { id } => self.controller.select_song(id),
            Command::TogglePause => self.controller.toggle_play_pause(),
            Command::Next => self.controller.next(),
            Command::Prev => self.controller.previous(),
            Command::Seek { percent } => self.controller.seek(percent),
            Command::SetQuery { query } => {
                self.controller.set_query(query);
                Ok(())
            }
            Command::SetCategory { category } => {
                self.controller.set_category(category);
                Ok(())
            }
        }
    }

    async fn publish(&self) {
        let snapshot = PlayerSnapshot::capture(&self.controller, &self.asset_base);
        let rev = self.state_manager.publish(snapshot).await;
        debug!("PlayerCore: published rev {}", rev);
    }
}
