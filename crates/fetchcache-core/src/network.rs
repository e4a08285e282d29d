//! Network status seam used to gate real-time refresh

use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Reports connectivity to the orchestrator
pub trait NetworkMonitor: Send + Sync {
    fn is_online(&self) -> bool;

    fn connection_type(&self) -> String;
}

/// Shared, settable network status
///
/// Clones observe the same state, so the platform glue can update it while
/// the orchestrator reads it.
#[derive(Debug, Clone)]
pub struct NetworkStatus {
    online: Arc<AtomicBool>,
    connection_type: Arc<RwLock<String>>,
}

impl NetworkStatus {
    pub fn new(online: bool, connection_type: impl Into<String>) -> Self {
        Self {
            online: Arc::new(AtomicBool::new(online)),
            connection_type: Arc::new(RwLock::new(connection_type.into())),
        }
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    pub fn set_connection_type(&self, connection_type: impl Into<String>) {
        *self.connection_type.write() = connection_type.into();
    }
}

impl Default for NetworkStatus {
    fn default() -> Self {
        Self::new(true, "unknown")
    }
}

impl NetworkMonitor for NetworkStatus {
    fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    fn connection_type(&self) -> String {
        self.connection_type.read().clone()
    }
}
