//! # MeshKey Core
//!
//! Shared error type and the collaborator contracts the key manager is
//! written against: the change-notification bus and the router/child peer
//! tables.
//!
//! ## Module Structure
//!
//! - `error`: Unified error type
//! - `notifier`: Change-event bus contract (`Notifier`, `ChangedFlags`)
//! - `peer`: Router/child table contract (`PeerTable`, `PeerRecord`)

pub mod error;
pub mod notifier;
pub mod peer;

pub use error::{Error, Result};
pub use notifier::{ChangedFlags, InMemoryNotifier, Notifier};
pub use peer::{ChildState, InMemoryPeerTable, PeerRecord, PeerTable};
