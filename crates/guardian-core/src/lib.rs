//! guardian-core - State synchronization core for Supply Guardian
//!
//! Reconciles three asynchronous sources into one consistent dashboard state:
//!
//! - **refresh**: periodic snapshot fetch, normalize and sequence-guarded apply
//! - **session**: create-once agent session lifecycle
//! - **conversation**: turn handling, directive extraction and camera updates
//!
//! Supporting modules:
//!
//! - **client**: backend traits and their HTTP implementations
//! - **normalize**: raw backend records to canonical entities
//! - **snapshot**: the latest-snapshot store and id lookup
//! - **directive**: the `[VIEW: {...}]` reply marker grammar
//! - **view**: directive to camera resolution
//! - **summary**: headline stat figures

pub mod client;
pub mod conversation;
pub mod directive;
pub mod error;
pub mod normalize;
pub mod refresh;
pub mod session;
pub mod snapshot;
pub mod summary;
pub mod types;
pub mod view;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use conversation::{ControllerOptions, ConversationController, TurnOutcome};
pub use error::{Error, Result};
pub use refresh::Refresher;
pub use snapshot::{SnapshotStore, ZoomDefaults};
pub use types::{AgentMessage, CameraState, Snapshot, ViewDirective};
