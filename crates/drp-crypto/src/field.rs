//! Per-field envelope encryption (§4.2). Authenticated encryption with a
//! fresh random nonce per call, embedded in the returned ciphertext blob.

use base64::Engine as _;
use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use drp_core::{DrpError, DrpResult};
use rand::RngCore;

const NONCE_LEN: usize = 12;

/// Encrypts `plaintext` under `key`, returning `base64(nonce || ciphertext)`.
pub fn encrypt_field(key: &[u8; 32], plaintext: &[u8]) -> DrpResult<String> {
    let cipher = ChaCha20Poly1305::new(Key::from_slice(key));
    let mut nonce_bytes = [0u8; NONCE_LEN];
    rand::rngs::OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);
    let ciphertext = cipher
        .encrypt(nonce, plaintext)
        .map_err(|e| DrpError::CryptoFailure(format!("field encryption failed: {e}")))?;
    let mut blob = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    blob.extend_from_slice(&nonce_bytes);
    blob.extend_from_slice(&ciphertext);
    Ok(base64::engine::general_purpose::STANDARD.encode(blob))
}

/// Decrypts a blob produced by [`encrypt_field`]. Returns `DecryptionFailed`
/// on MAC mismatch — including, by construction, when `key` is derived for
/// the wrong user (§8, invariant 3).
pub fn decrypt_field(key: &[u8; 32], blob: &str) -> DrpResult<Vec<u8>> {
    let raw = base64::engine::general_purpose::STANDARD
        .decode(blob)
        .map_err(|_| DrpError::DecryptionFailed)?;
    if raw.len() < NONCE_LEN {
        return Err(DrpError::DecryptionFailed);
    }
    let (nonce_bytes, ciphertext) = raw.split_at(NONCE_LEN);
    let cipher = ChaCha20Poly1305::new(Key::from_slice(key));
    let nonce = Nonce::from_slice(nonce_bytes);
    cipher
        .decrypt(nonce, ciphertext)
        .map_err(|_| DrpError::DecryptionFailed)
}
