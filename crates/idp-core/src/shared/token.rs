//! Random opaque tokens (client secrets, authorization codes).

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::RngCore;

pub const DEFAULT_TOKEN_BYTES: usize = 32;

/// `num_bytes` of OS-seeded randomness, URL-safe base64 without padding.
pub fn generate_token(num_bytes: usize) -> String {
    let mut bytes = vec![0u8; num_bytes];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(&bytes)
}
