//! Agent session lifecycle.
//!
//! ## Lifecycle
//!
//! ```text
//! App Start
//!   │
//!   ├─► create_session(user_id)      (concurrent with first snapshot fetch)
//!   │     │
//!   │     ├─► success: session id held for the process lifetime
//!   │     │
//!   │     └─► SessionError: messaging disabled until the user retries
//!   │
//! Conversation
//!   │
//!   └─► every turn reuses the same session id
//!
//! Process End
//!   │
//!   └─► session dropped (never persisted)
//! ```

mod manager;

pub use manager::*;
