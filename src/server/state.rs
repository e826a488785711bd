//! Server state and configuration.

use tokio::sync::RwLock;

use crate::config::PrintConfig;
use crate::session::PrintSession;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on (e.g., "0.0.0.0:8080")
    pub listen_addr: String,
}

/// Application state shared across handlers.
pub struct AppState {
    /// The one session every request edits and prints through.
    pub session: RwLock<PrintSession>,
    /// Where print jobs go.
    pub print: PrintConfig,
}

impl AppState {
    pub fn new(session: PrintSession) -> Self {
        let print = session.config().print.clone();
        Self {
            session: RwLock::new(session),
            print,
        }
    }
}
