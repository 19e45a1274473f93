mod catalog;
mod core;
mod engine;
mod http;
mod mpv;
mod state;

use std::sync::Arc;

use spotlite_core::Config;
use tokio::sync::{broadcast, mpsc};
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::core::{CoreEvent, PlayerCore};
use crate::engine::{DriverConfig, MpvEngine};
use crate::state::StateManager;

/// Tracing layer that forwards WARN/ERROR lines to a broadcast channel.
struct BroadcastLayer {
    sender: broadcast::Sender<String>,
}

impl BroadcastLayer {
    fn new(sender: broadcast::Sender<String>) -> Self {
        Self { sender }
    }
}

impl<S> tracing_subscriber::Layer<S> for BroadcastLayer
where
    S: tracing::Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
        let level = event.metadata().level();
        if !matches!(*level, tracing::Level::WARN | tracing::Level::ERROR) {
            return;
        }

        let mut message = format!("{} [{}] ", chrono::Local::now().format("%H:%M:%S"), level);
        let mut visitor = MessageVisitor(&mut message);
        event.record(&mut visitor);

        // No receivers is fine.
        let _ = self.sender.send(message);
    }
}

struct MessageVisitor<'a>(&'a mut String);

impl<'a> tracing::field::Visit for MessageVisitor<'a> {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.0.push_str(&format!("{:?}", value));
        } else {
            self.0.push_str(&format!(" {}={:?}", field.name(), value));
        }
    }
}

/// Drain broadcast log lines into the state manager's ring.
fn spawn_log_collector(
    mut log_rx: broadcast::Receiver<String>,
    state_manager: Arc<StateManager>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match log_rx.recv().await {
                Ok(line) => state_manager.push_log(line).await,
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let config = Config::load()?;

    let (log_tx, log_rx) = broadcast::channel::<String>(100);

    let log_path = config.daemon.log_file.clone();
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(log_file)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(BroadcastLayer::new(log_tx))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,spotlite_daemon=debug")),
        )
        .init();

    info!("Log file: {:?}", log_path);
    info!("Config loaded from: {:?}", Config::config_path());

    let state_manager = Arc::new(StateManager::new());
    let _log_handle = spawn_log_collector(log_rx, state_manager.clone());

    // All external inputs funnel into PlayerCore.
    let (event_tx, event_rx) = mpsc::channel::<CoreEvent>(256);

    let (op_tx, op_rx) = mpsc::unbounded_channel();
    let _engine_handle = tokio::spawn(engine::run_driver(
        DriverConfig {
            socket_name: config.mpv.socket_name.clone(),
            binary: config.mpv.binary.clone(),
        },
        op_rx,
        event_tx.clone(),
    ));

    let player_core = PlayerCore::new(
        MpvEngine::new(op_tx),
        state_manager.clone(),
        config.catalog.asset_base.clone(),
    );

    let _catalog_handle = catalog::spawn_fetch(config.catalog.clone(), event_tx.clone());

    if config.http.enabled {
        let _http_handle = http::start_server(
            config.http.bind_address.clone(),
            config.http.port,
            state_manager.clone(),
            event_tx.clone(),
        );
    }

    let shutdown_tx = event_tx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received");
            let _ = shutdown_tx.send(CoreEvent::Shutdown).await;
        }
    });
    drop(event_tx);

    info!("Player initialised, running event loop");
    player_core.run(event_rx).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn broadcast_layer_forwards_only_warnings_and_errors() {
        let (tx, mut rx) = broadcast::channel(8);
        let subscriber = tracing_subscriber::registry().with(BroadcastLayer::new(tx));

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!("catalog loaded");
            tracing::warn!(songs = 0, "catalog empty");
            tracing::error!("mpv died");
        });

        let first = rx.try_recv().unwrap();
        assert!(first.contains("[WARN]"), "{}", first);
        assert!(first.contains("catalog empty"));
        assert!(first.contains("songs=0"));
        let second = rx.try_recv().unwrap();
        assert!(second.contains("[ERROR] mpv died"));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn log_collector_fills_state_ring() {
        let (tx, rx) = broadcast::channel(8);
        let sm = Arc::new(StateManager::new());
        let handle = spawn_log_collector(rx, sm.clone());

        tx.send("12:00:00 [WARN] first".to_string()).unwrap();
        drop(tx);
        handle.await.unwrap();

        assert_eq!(sm.recent_logs().await, vec!["12:00:00 [WARN] first".to_string()]);
    }
}
