use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use makershub_agent::{Agent, LlmMessage};
use makershub_flow::{DialogFlow, FlowEngine};
use makershub_store::FileStorage;

/// Which conversation core handles `/api/chat` turns.
pub enum ChatBackend {
    Flow(FlowEngine),
    Agent(Agent),
}

/// Oldest agent exchanges are dropped past this many messages.
const MAX_HISTORY_MESSAGES: usize = 40;

/// Per-session conversation memory. A session holds at most one active
/// flow; the agent backend keeps its visible transcript instead.
#[derive(Default)]
pub struct Session {
    pub flow: Option<DialogFlow>,
    pub history: Vec<LlmMessage>,
}

impl Session {
    /// Record one visible exchange, keeping the transcript bounded.
    pub fn push_exchange(&mut self, user: LlmMessage, assistant: LlmMessage) {
        self.history.push(user);
        self.history.push(assistant);
        if self.history.len() > MAX_HISTORY_MESSAGES {
            let excess = self.history.len() - MAX_HISTORY_MESSAGES;
            self.history.drain(..excess);
        }
    }

    /// True when there is nothing left worth keeping in the map.
    pub fn is_idle(&self) -> bool {
        self.flow.is_none() && self.history.is_empty()
    }
}

/// Shared application state accessible from all route handlers.
///
/// Each session entry carries its own lock; a turn holds it for the whole
/// advance so two requests on one session key cannot interleave. The outer
/// map lock is only held long enough to fetch or insert an entry.
#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<ChatBackend>,
    pub storage: Arc<dyn FileStorage>,
    pub sessions: Arc<Mutex<HashMap<String, Arc<Mutex<Session>>>>>,
}

impl AppState {
    pub fn new(backend: ChatBackend, storage: Arc<dyn FileStorage>) -> Self {
        Self {
            backend: Arc::new(backend),
            storage,
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Fetch or create the session entry for `key`.
    pub async fn session(&self, key: &str) -> Arc<Mutex<Session>> {
        let mut sessions = self.sessions.lock().await;
        sessions.entry(key.to_string()).or_default().clone()
    }

    /// Drop the entry for `key` if its session has gone idle.
    pub async fn evict_if_idle(&self, key: &str) {
        let mut sessions = self.sessions.lock().await;
        let idle = match sessions.get(key) {
            Some(entry) => match entry.try_lock() {
                Ok(session) => session.is_idle(),
                // Another turn is mid-flight; leave the entry alone.
                Err(_) => false,
            },
            None => return,
        };
        if idle {
            sessions.remove(key);
        }
    }
}
