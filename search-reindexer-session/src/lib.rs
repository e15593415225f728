//! # Search Reindexer Session
//!
//! In-memory streaming ingest sessions. A session owns one staging index for
//! an alias and absorbs batches until completed, cancelled, or expired by the
//! background sweep. Sessions are not persisted: a control-plane restart
//! forgets them (their indices remain for manual promotion or cleanup).

pub mod errors;
pub mod manager;
pub mod types;

pub use errors::SessionError;
pub use manager::{spawn_expiry_sweeper, SessionManager};
pub use types::{
    BatchProcessResult, IngestSession, SessionConfig, SessionErrorEntry, SessionStatus,
};
