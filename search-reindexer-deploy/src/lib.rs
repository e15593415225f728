//! # Search Reindexer Deploy
//!
//! Blue/green deployment control plane: alias registry, index lifecycle,
//! health probing, and the per-alias deployment coordinator. The hard
//! invariant enforced here is that an alias is only ever rebound through one
//! atomic alias update, so consumers observe exactly one active index.

pub mod aliases;
pub mod bulk;
pub mod color;
pub mod coordinator;
pub mod errors;
pub mod health;
pub mod lifecycle;
pub mod state;

pub use aliases::AliasRegistry;
pub use bulk::{bulk_index_chunked, extract_doc_id, BulkDocFailure, ChunkedBulkReport};
pub use color::DeployColor;
pub use coordinator::DeploymentCoordinator;
pub use errors::DeployError;
pub use health::{HealthProbe, IndexHealthReport, WaitReadyOptions};
pub use lifecycle::IndexLifecycle;
pub use state::{DeploymentState, DeploymentStatus, DeploymentStrategy};
