//! Passphrase sealing for the local record vault.
//!
//! Layout: `MAGIC (4) || version (1) || m_cost, t_cost, p_cost (3 x u32 LE)
//! || salt (32) || nonce (12) || ciphertext`. The whole header is bound as
//! AES-GCM associated data, so altering the KDF costs breaks decryption.

use aes_gcm::{
    aead::{Aead, KeyInit, Payload},
    Aes256Gcm, Nonce,
};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

const MAGIC: &[u8; 4] = b"CYFV";
const FORMAT_VERSION: u8 = 1;
const SALT_LEN: usize = 32;
const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;
const COSTS_LEN: usize = 12;
const HEADER_LEN: usize = MAGIC.len() + 1 + COSTS_LEN + SALT_LEN + NONCE_LEN;
/// Refuse to derive with more than 1 GiB, whatever a file header claims.
const MAX_MEMORY_KIB: u32 = 1 << 20;

#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("key derivation failed")]
    KeyDerivation,
    #[error("encryption failed")]
    Encryption,
    #[error("decryption failed: wrong passphrase or corrupted vault")]
    Decryption,
    #[error("not a vault file or unsupported version")]
    InvalidFormat,
}

/// Argon2id cost parameters, stored in each sealed blob's header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            memory_kib: 65536,
            iterations: 3,
            parallelism: 1,
        }
    }
}

impl KdfParams {
    fn to_bytes(self) -> [u8; COSTS_LEN] {
        let mut out = [0u8; COSTS_LEN];
        out[..4].copy_from_slice(&self.memory_kib.to_le_bytes());
        out[4..8].copy_from_slice(&self.iterations.to_le_bytes());
        out[8..].copy_from_slice(&self.parallelism.to_le_bytes());
        out
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let word = |i: usize| -> Result<u32, CryptoError> {
            let chunk: [u8; 4] = bytes
                .get(i * 4..i * 4 + 4)
                .and_then(|b| b.try_into().ok())
                .ok_or(CryptoError::InvalidFormat)?;
            Ok(u32::from_le_bytes(chunk))
        };
        let params = Self {
            memory_kib: word(0)?,
            iterations: word(1)?,
            parallelism: word(2)?,
        };
        if params.memory_kib > MAX_MEMORY_KIB {
            return Err(CryptoError::InvalidFormat);
        }
        Ok(params)
    }

    fn derive_key(
        &self,
        passphrase: &str,
        salt: &[u8],
    ) -> Result<Zeroizing<[u8; KEY_LEN]>, CryptoError> {
        let params = Params::new(
            self.memory_kib,
            self.iterations,
            self.parallelism,
            Some(KEY_LEN),
        )
        .map_err(|_| CryptoError::KeyDerivation)?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        let mut key = Zeroizing::new([0u8; KEY_LEN]);
        argon2
            .hash_password_into(passphrase.as_bytes(), salt, &mut key[..])
            .map_err(|_| CryptoError::KeyDerivation)?;
        Ok(key)
    }
}

/// Encrypt `plaintext` under a key derived from `passphrase`.
pub fn seal(passphrase: &str, plaintext: &[u8], kdf: &KdfParams) -> Result<Vec<u8>, CryptoError> {
    let mut salt = [0u8; SALT_LEN];
    let mut nonce_bytes = [0u8; NONCE_LEN];
    rand::thread_rng().fill_bytes(&mut salt);
    rand::thread_rng().fill_bytes(&mut nonce_bytes);

    let mut header = Vec::with_capacity(HEADER_LEN);
    header.extend_from_slice(MAGIC);
    header.push(FORMAT_VERSION);
    header.extend_from_slice(&kdf.to_bytes());
    header.extend_from_slice(&salt);
    header.extend_from_slice(&nonce_bytes);

    let key = kdf.derive_key(passphrase, &salt)?;
    let cipher = Aes256Gcm::new_from_slice(&key[..]).map_err(|_| CryptoError::Encryption)?;
    let ciphertext = cipher
        .encrypt(
            Nonce::from_slice(&nonce_bytes),
            Payload {
                msg: plaintext,
                aad: &header,
            },
        )
        .map_err(|_| CryptoError::Encryption)?;

    let mut sealed = header;
    sealed.extend_from_slice(&ciphertext);
    Ok(sealed)
}

/// Decrypt a blob produced by [`seal`].
///
/// Costs the KDF rejects can only come from a damaged header, so they are
/// reported as [`CryptoError::Decryption`] like any other tampering.
pub fn open(passphrase: &str, sealed: &[u8]) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
    if sealed.len() < HEADER_LEN || &sealed[..MAGIC.len()] != MAGIC {
        return Err(CryptoError::InvalidFormat);
    }
    if sealed[MAGIC.len()] != FORMAT_VERSION {
        return Err(CryptoError::InvalidFormat);
    }

    let (header, ciphertext) = sealed.split_at(HEADER_LEN);
    let costs_at = MAGIC.len() + 1;
    let salt_at = costs_at + COSTS_LEN;
    let nonce_at = salt_at + SALT_LEN;

    let kdf = KdfParams::from_bytes(&header[costs_at..salt_at])?;
    let salt = &header[salt_at..nonce_at];
    let nonce = Nonce::from_slice(&header[nonce_at..]);

    let key = kdf
        .derive_key(passphrase, salt)
        .map_err(|_| CryptoError::Decryption)?;
    let cipher = Aes256Gcm::new_from_slice(&key[..]).map_err(|_| CryptoError::Decryption)?;
    let plaintext = cipher
        .decrypt(
            nonce,
            Payload {
                msg: ciphertext,
                aad: header,
            },
        )
        .map_err(|_| CryptoError::Decryption)?;

    Ok(Zeroizing::new(plaintext))
}

#[cfg(test)]
pub(crate) fn test_kdf() -> KdfParams {
    KdfParams {
        memory_kib: 64,
        iterations: 1,
        parallelism: 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seal_open_roundtrip() {
        let sealed = seal("correct horse", b"cycle data", &test_kdf()).unwrap();
        let opened = open("correct horse", &sealed).unwrap();
        assert_eq!(opened.as_slice(), b"cycle data");
    }

    #[test]
    fn wrong_passphrase_fails() {
        let sealed = seal("correct", b"secret", &test_kdf()).unwrap();
        assert!(matches!(open("wrong", &sealed), Err(CryptoError::Decryption)));
    }

    #[test]
    fn zeroed_iteration_count_is_decryption_error() {
        let mut sealed = seal("pass", b"secret", &test_kdf()).unwrap();
        // iterations 1 -> 0, which argon2 rejects outright
        sealed[MAGIC.len() + 1 + 4] ^= 0x01;
        assert!(matches!(open("pass", &sealed), Err(CryptoError::Decryption)));
    }

    #[test]
    fn altered_costs_are_decryption_error() {
        let mut sealed = seal("pass", b"secret", &test_kdf()).unwrap();
        // memory 64 KiB -> 65 KiB: derivation succeeds, the AAD check fails
        sealed[MAGIC.len() + 1] ^= 0x01;
        assert!(matches!(open("pass", &sealed), Err(CryptoError::Decryption)));
    }

    #[test]
    fn tampered_salt_or_ciphertext_is_decryption_error() {
        let sealed = seal("pass", b"secret", &test_kdf()).unwrap();

        let mut salt_flipped = sealed.clone();
        salt_flipped[MAGIC.len() + 1 + COSTS_LEN] ^= 0x80;
        assert!(matches!(open("pass", &salt_flipped), Err(CryptoError::Decryption)));

        let mut body_flipped = sealed;
        let last = body_flipped.len() - 1;
        body_flipped[last] ^= 0x01;
        assert!(matches!(open("pass", &body_flipped), Err(CryptoError::Decryption)));
    }

    #[test]
    fn oversized_memory_cost_is_invalid_format() {
        let mut sealed = seal("pass", b"secret", &test_kdf()).unwrap();
        // set the top byte of memory_kib
        sealed[MAGIC.len() + 1 + 3] = 0x80;
        assert!(matches!(open("pass", &sealed), Err(CryptoError::InvalidFormat)));
    }

    #[test]
    fn short_or_foreign_input_is_invalid_format() {
        assert!(matches!(open("any", &[0u8; 10]), Err(CryptoError::InvalidFormat)));

        let mut sealed = seal("pass", b"secret", &test_kdf()).unwrap();
        sealed[0] = b'X';
        assert!(matches!(open("pass", &sealed), Err(CryptoError::InvalidFormat)));
    }

    #[test]
    fn unknown_version_is_invalid_format() {
        let mut sealed = seal("pass", b"secret", &test_kdf()).unwrap();
        sealed[MAGIC.len()] = 9;
        assert!(matches!(open("pass", &sealed), Err(CryptoError::InvalidFormat)));
    }
}
