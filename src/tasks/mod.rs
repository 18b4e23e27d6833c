//! Background Tasks Module
//!
//! Contains background tasks that run alongside the HTTP server.
//!
//! # Tasks
//! - Refresh worker: recomputes stale entries queued by cache hits
//! - Expiry sweep: drops expired negative results and overly stale entries

mod cleanup;
mod refresh;

pub use cleanup::spawn_cleanup_task;
pub use refresh::spawn_refresh_worker;
