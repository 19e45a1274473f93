use std::collections::VecDeque;

use spotlite_core::PlayerSnapshot;
use tokio::sync::RwLock;

/// How many WARN/ERROR lines `GET /api/logs` can return.
pub const LOG_CAPACITY: usize = 200;

/// Latest snapshot published by the core plus a ring of recent log lines.
/// Written only by the core task and the log collector; read by HTTP handlers.
pub struct StateManager {
    state: RwLock<PlayerSnapshot>,
    logs: RwLock<VecDeque<String>>,
}

impl StateManager {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(PlayerSnapshot::default()),
            logs: RwLock::new(VecDeque::with_capacity(LOG_CAPACITY)),
        }
    }

    pub async fn get_state(&self) -> PlayerSnapshot {
        self.state.read().await.clone()
    }

    /// Replace the snapshot, bumping `rev`.  Returns the new revision.
    pub async fn publish(&self, mut snapshot: PlayerSnapshot) -> u64 {
        let mut state = self.state.write().await;
        snapshot.rev = state.rev + 1;
        *state = snapshot;
        state.rev
    }

    pub async fn push_log(&self, line: String) {
        let mut logs = self.logs.write().await;
        if logs.len() == LOG_CAPACITY {
            logs.pop_front();
        }
        logs.push_back(line);
    }

    pub async fn recent_logs(&self) -> Vec<String> {
        self.logs.read().await.iter().cloned().collect()
    }
}

impl Default for StateManager {
    fn default() -> Self {
        Self::new()
    }
}
