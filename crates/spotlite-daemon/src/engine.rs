/// mpv-backed `MediaEngine`.
///
/// `MpvEngine` is what the controller holds: every trait call becomes an
/// `EngineOp` on an unbounded channel and returns immediately.  The driver
/// task owns the `MpvDriver`/`MpvHandle`, applies ops in order, and turns
/// mpv's unsolicited events into generation-tagged `EngineEvent`s.
///
/// ```text
///  controller ──EngineOp──▶ run_driver ──json ipc──▶ mpv
///                               │  ◀──property-change / end-file──┘
///                               └──CoreEvent::Engine──▶ PlayerCore
/// ```
use std::path::PathBuf;

use spotlite_core::{
    EngineEvent, EngineEventKind, Generation, MediaEngine, PlayOutcome, PlayTicket, PlayerError,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::core::CoreEvent;
use crate::mpv::{MpvDriver, MpvEvent, MpvHandle, OBS_DURATION, OBS_PAUSE, OBS_TIME_POS};

#[derive(Debug, Clone, PartialEq)]
pub enum EngineOp {
    Load(String),
    Play(PlayTicket),
    Pause,
    Seek(f64),
    Subscribe(Generation),
    Unsubscribe(Generation),
}

pub struct MpvEngine {
    op_tx: mpsc::UnboundedSender<EngineOp>,
}

impl MpvEngine {
    pub fn new(op_tx: mpsc::UnboundedSender<EngineOp>) -> Self {
        Self { op_tx }
    }

    fn submit(&self, op: EngineOp) {
        if self.op_tx.send(op).is_err() {
            warn!("{}", PlayerError::Engine("driver task is gone".into()));
        }
    }
}

impl MediaEngine for MpvEngine {
    fn load(&mut self, url: &str) {
        self.submit(EngineOp::Load(url.to_string()));
    }

    fn play(&mut self, ticket: PlayTicket) {
        self.submit(EngineOp::Play(ticket));
    }

    fn pause(&mut self) {
        self.submit(EngineOp::Pause);
    }

    fn set_position(&mut self, position_secs: f64) {
        self.submit(EngineOp::Seek(position_secs));
    }

    fn subscribe(&mut self, generation: Generation) {
        self.submit(EngineOp::Subscribe(generation));
    }

    fn unsubscribe(&mut self, generation: Generation) {
        self.submit(EngineOp::Unsubscribe(generation));
    }
}

/// Where the subscribed selection's media is, as far as mpv has told us.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
enum Track {
    /// Subscribed, but this selection's `loadfile` has not gone out yet.
    #[default]
    Waiting,
    /// `loadfile` sent; the entry id when mpv returned one.
    Loading(Option<u64>),
    Loaded(Option<u64>),
    /// Nothing playable: the load was skipped, refused or errored.
    Failed,
}

/// Maps raw mpv events onto the current subscription.
///
/// Position and duration reports only pass once mpv confirms this
/// selection's file with `file-loaded`; anything earlier still belongs to
/// the previous track.  A fresh subscription starts over, so reports queued
/// before its `loadfile` can never carry its generation.
#[derive(Debug, Default)]
pub struct EventMapper {
    subscribed: Option<Generation>,
    track: Track,
    duration: Option<f64>,
}

impl EventMapper {
    pub fn subscribe(&mut self, generation: Generation) {
        self.subscribed = Some(generation);
        self.track = Track::Waiting;
        self.duration = None;
    }

    pub fn unsubscribe(&mut self, generation: Generation) {
        if self.subscribed == Some(generation) {
            self.subscribed = None;
        }
    }

    /// `loadfile` was accepted, as playlist entry `entry` if known.
    pub fn on_load(&mut self, entry: Option<u64>) {
        self.track = Track::Loading(entry);
        self.duration = None;
    }

    /// The load never reached mpv or mpv refused it.
    pub fn on_load_failed(&mut self, reason: String) -> Option<EngineEvent> {
        self.track = Track::Failed;
        self.duration = None;
        self.tag(EngineEventKind::LoadFailed { reason })
    }

    pub fn is_playable(&self) -> bool {
        self.track != Track::Failed
    }

    pub fn map(&mut self, event: &MpvEvent) -> Option<EngineEvent> {
        if let Some((id, data)) = event.as_property_change() {
            if !matches!(self.track, Track::Loaded(_)) {
                return None;
            }
            let kind = match id {
                OBS_DURATION => {
                    let duration = data.as_f64()?;
                    self.duration = Some(duration);
                    EngineEventKind::MetadataLoaded {
                        duration_secs: duration,
                    }
                }
                OBS_TIME_POS => EngineEventKind::PositionChanged {
                    position_secs: data.as_f64()?,
                    duration_secs: self.duration,
                },
                OBS_PAUSE => {
                    debug!("mpv pause -> {}", data);
                    return None;
                }
                _ => return None,
            };
            return self.tag(kind);
        }

        let entry = match self.track {
            Track::Loading(entry) | Track::Loaded(entry) => entry,
            Track::Waiting | Track::Failed => return None,
        };
        // Events for older playlist entries are leftovers of a replaced file.
        if let (Some(expected), Some(got)) = (entry, event.playlist_entry_id()) {
            if expected != got {
                return None;
            }
        }

        match event.event_name()? {
            "file-loaded" => {
                self.track = Track::Loaded(entry);
                None
            }
            "end-file" if event.is_natural_end() => {
                if !matches!(self.track, Track::Loaded(_)) {
                    return None;
                }
                self.track = Track::Waiting;
                self.tag(EngineEventKind::Ended)
            }
            "end-file" => {
                let reason = event.load_error()?;
                self.on_load_failed(reason)
            }
            _ => None,
        }
    }

    fn tag(&self, kind: EngineEventKind) -> Option<EngineEvent> {
        self.subscribed.map(|generation| EngineEvent::new(generation, kind))
    }
}

pub struct DriverConfig {
    pub socket_name: String,
    pub binary: Option<PathBuf>,
}

/// Owns mpv.  Spawns it lazily on the first op and again after it dies.
pub async fn run_driver(
    config: DriverConfig,
    op_rx: mpsc::UnboundedReceiver<EngineOp>,
    core_tx: mpsc::Sender<CoreEvent>,
) {
    let (mpv_tx, mpv_rx) = mpsc::channel::<MpvEvent>(256);
    let driver = Driver {
        mpv: MpvDriver::new(config.socket_name, config.binary),
        handle: None,
        mapper: EventMapper::default(),
        mpv_tx,
        core_tx,
    };
    driver.run(op_rx, mpv_rx).await;
}

struct Driver {
    mpv: MpvDriver,
    handle: Option<MpvHandle>,
    mapper: EventMapper,
    mpv_tx: mpsc::Sender<MpvEvent>,
    core_tx: mpsc::Sender<CoreEvent>,
}

impl Driver {
    async fn run(
        mut self,
        mut op_rx: mpsc::UnboundedReceiver<EngineOp>,
        mut mpv_rx: mpsc::Receiver<MpvEvent>,
    ) {
        let period = tokio::time::Duration::from_secs(10);
        let mut heartbeat = tokio::time::interval_at(tokio::time::Instant::now() + period, period);

        info!("engine driver: started");
        loop {
            tokio::select! {
                op = op_rx.recv() => {
                    let Some(op) = op else { break };
                    self.apply(op).await;
                }
                Some(evt) = mpv_rx.recv() => {
                    if let Some(event) = self.mapper.map(&evt) {
                        if !self.emit(event).await {
                            break;
                        }
                    }
                }
                _ = heartbeat.tick() => {
                    if self.handle.is_some() && !self.mpv.process_alive() {
                        warn!("engine driver: mpv process died");
                        self.handle = None;
                    }
                }
            }
        }
        self.mpv.kill().await;
        info!("engine driver: stopped");
    }

    async fn emit(&self, event: EngineEvent) -> bool {
        self.core_tx.send(CoreEvent::Engine(event)).await.is_ok()
    }

    async fn apply(&mut self, op: EngineOp) {
        match op {
            EngineOp::Subscribe(generation) => self.mapper.subscribe(generation),
            EngineOp::Unsubscribe(generation) => self.mapper.unsubscribe(generation),

            EngineOp::Load(url) => {
                let failure = if url.is_empty() {
                    Some("song has no media url".to_string())
                } else {
                    match self.load(&url).await {
                        Ok(entry) => {
                            self.mapper.on_load(entry);
                            None
                        }
                        Err(e) => Some(e.to_string()),
                    }
                };
                if let Some(reason) = failure {
                    warn!("engine driver: nothing loaded: {}", reason);
                    if let Some(event) = self.mapper.on_load_failed(reason) {
                        self.emit(event).await;
                    }
                }
            }

            EngineOp::Play(ticket) => {
                let outcome = self.play().await;
                let event = EngineEvent::new(
                    ticket.generation,
                    EngineEventKind::PlaySettled { ticket, outcome },
                );
                self.emit(event).await;
            }

            EngineOp::Pause => {
                if let Some(h) = self.handle.as_ref() {
                    if let Err(e) = h.set_pause(true).await {
                        warn!("engine driver: pause failed: {}", e);
                    }
                }
            }

            EngineOp::Seek(secs) => {
                if let Some(h) = self.handle.as_ref() {
                    if let Err(e) = h.seek_to(secs).await {
                        warn!("engine driver: seek to {:.2}s failed: {}", secs, e);
                    }
                }
            }
        }
    }

    async fn load(&mut self, url: &str) -> anyhow::Result<Option<u64>> {
        let h = self.ensure_handle().await?;
        if let Err(e) = h.set_pause(true).await {
            warn!("engine driver: pause before loadfile failed: {}", e);
        }
        h.load_file(url).await
    }

    async fn play(&mut self) -> PlayOutcome {
        if !self.mapper.is_playable() {
            return PlayOutcome::Rejected {
                reason: "no playable media loaded".into(),
                engine_paused: true,
            };
        }
        match self.ensure_handle().await {
            Ok(h) => match h.set_pause(false).await {
                Ok(()) => PlayOutcome::Started,
                Err(e) => PlayOutcome::Rejected {
                    reason: e.to_string(),
                    engine_paused: h.get_pause().await.unwrap_or(true),
                },
            },
            Err(e) => PlayOutcome::Rejected {
                reason: PlayerError::Engine(e.to_string()).to_string(),
                engine_paused: true,
            },
        }
    }

    async fn ensure_handle(&mut self) -> anyhow::Result<MpvHandle> {
        if let Some(h) = self.handle.as_ref() {
            return Ok(h.clone());
        }
        let h = self.mpv.spawn_and_connect(self.mpv_tx.clone()).await?;
        h.observe_all_properties().await;
        self.handle = Some(h.clone());
        Ok(h)
    }
}
