//! Application state shared across routes

use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

use crate::config::Config;
use crate::game::ArenaHandle;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub arena: ArenaHandle,
    /// Open WebSocket sessions
    pub sessions: Arc<AtomicUsize>,
}

impl AppState {
    pub fn new(config: Config, arena: ArenaHandle) -> Self {
        Self {
            config: Arc::new(config),
            arena,
            sessions: Arc::new(AtomicUsize::new(0)),
        }
    }
}
