//! # MeshKey Crypto
//!
//! Thread-style mesh key derivation, rotation, frame-counter management,
//! and AEAD nonce construction (`spec.md`).
//!
//! The crate's single stateful type is [`KeyManager`]; everything else is
//! either a pure function ([`nonce::generate_nonce`],
//! [`key_derivation::compute_key`]) or a collaborator trait the manager is
//! generic over ([`timer::RotationTimer`], [`persistence::PersistenceStore`]),
//! with `Notifier` and `PeerTable` supplied by `meshkey-core`.
//!
//! ## Module Structure
//!
//! - `key_management`: byte-array newtypes (`MasterKey`, `Pskc`, `Kek`)
//! - `key_derivation`: HMAC-SHA-256 key derivation (`spec.md` §4.1)
//! - `nonce`: IEEE 802.15.4 AEAD nonce construction (`spec.md` §4.7)
//! - `timer`: rotation-timer collaborator contract (`spec.md` §4.8)
//! - `persistence`: frame-counter persistence collaborator contract
//! - `telemetry`: structured logging hook for security-relevant events
//! - `manager`: the `KeyManager` itself, tying the above together

pub mod key_derivation;
pub mod key_management;
pub mod manager;
pub mod nonce;
pub mod persistence;
pub mod telemetry;
pub mod timer;

pub use key_derivation::{compute_key, MAC_KEY_OFFSET};
pub use key_management::{Kek, MasterKey, Pskc, KEK_LEN, MASTER_KEY_LEN};
pub use manager::{
    KeyManager, DEFAULT_KEY_ROTATION_HOURS, DEFAULT_KEY_SWITCH_GUARD_HOURS,
    DEFAULT_SECURITY_POLICY_FLAGS, MIN_KEY_ROTATION_HOURS, ONE_HOUR_MS,
};
pub use nonce::{generate_nonce, EXT_ADDR_LEN, NONCE_LEN};
pub use persistence::{CountingPersistenceStore, PersistedKeyState, PersistenceStore};
pub use telemetry::{KeyManagerTelemetry, TracingTelemetry};
pub use timer::{ManualRotationTimer, RotationTimer};
