//! IEEE 802.15.4 AEAD nonce construction (`spec.md` §4.7).
//!
//! Pure function, no manager state: bytes `[0..8)` are the extended
//! address, `[8..12)` the big-endian frame counter, byte `[12]` the
//! security level.

/// Size in bytes of an IEEE 802.15.4 extended address.
pub const EXT_ADDR_LEN: usize = 8;
/// Size in bytes of the generated nonce.
pub const NONCE_LEN: usize = 13;

/// Build the 13-byte AEAD nonce for a frame.
pub fn generate_nonce(ext_addr: &[u8; EXT_ADDR_LEN], frame_counter: u32, security_level: u8) -> [u8; NONCE_LEN] {
    let mut nonce = [0u8; NONCE_LEN];
    nonce[..EXT_ADDR_LEN].copy_from_slice(ext_addr);
    nonce[EXT_ADDR_LEN..EXT_ADDR_LEN + 4].copy_from_slice(&frame_counter.to_be_bytes());
    nonce[12] = security_level;
    nonce
}
