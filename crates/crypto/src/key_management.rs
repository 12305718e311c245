//! Byte-array newtypes for the key material the manager owns directly.
//!
//! `spec.md` §3: `MasterKey` and `PSKc` are 16 raw bytes apiece. Both are
//! zeroized on drop since they are long-lived symmetric secrets; the
//! derived/temporary keys and frame counters are not newtyped because they
//! live entirely inside `KeyManager` and are never handed out by value.

use zeroize::{Zeroize, ZeroizeOnDrop};

/// Length in bytes of the master key and PSKc (`spec.md` §3).
pub const MASTER_KEY_LEN: usize = 16;

/// Length in bytes of the KEK (`spec.md` §3); numerically the same as
/// [`MASTER_KEY_LEN`] but named separately, matching the original's
/// distinct `kMaxKeyLength`/KEK-sized buffer naming.
pub const KEK_LEN: usize = MASTER_KEY_LEN;

/// The Thread Master Key: the root secret key derivation is performed over.
#[derive(Clone, Zeroize, ZeroizeOnDrop, PartialEq, Eq)]
pub struct MasterKey(pub [u8; MASTER_KEY_LEN]);

impl MasterKey {
    /// Well-known placeholder used before a node is provisioned
    /// (`spec.md` §9) — `00 11 22 … FF`. Production deployments must
    /// replace this via `SetMasterKey`.
    pub const DEFAULT: MasterKey = MasterKey([
        0x00, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88, 0x99, 0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff,
    ]);
}

impl Default for MasterKey {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl std::fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("MasterKey(..)")
    }
}

/// Pre-Shared Key for the Commissioner. Zero-initialized until
/// `SetPSKc` is called at least once.
#[derive(Clone, Zeroize, ZeroizeOnDrop, PartialEq, Eq)]
pub struct Pskc(pub [u8; MASTER_KEY_LEN]);

impl Default for Pskc {
    fn default() -> Self {
        Self([0u8; MASTER_KEY_LEN])
    }
}

impl std::fmt::Debug for Pskc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Pskc(..)")
    }
}

/// Key Encryption Key, used to wrap other keys in transit (`spec.md`,
/// Glossary).
#[derive(Clone, Zeroize, ZeroizeOnDrop, PartialEq, Eq)]
pub struct Kek(pub [u8; KEK_LEN]);

impl Default for Kek {
    fn default() -> Self {
        Self([0u8; KEK_LEN])
    }
}

impl std::fmt::Debug for Kek {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Kek(..)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_master_key_is_the_well_known_placeholder() {
        assert_eq!(
            MasterKey::default().0,
            [0x00, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88, 0x99, 0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff]
        );
    }

    #[test]
    fn default_pskc_and_kek_are_zeroed() {
        assert_eq!(Pskc::default().0, [0u8; MASTER_KEY_LEN]);
        assert_eq!(Kek::default().0, [0u8; MASTER_KEY_LEN]);
    }
}
