use aes_gcm::{
    aead::{consts::U16, AeadInPlace, KeyInit},
    aes::Aes256,
    AesGcm, Nonce, Tag,
};
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};
use shared::EncryptionResult;
use thiserror::Error;

pub const KEY_LENGTH: usize = 32;
pub const IV_LENGTH: usize = 16;
pub const TAG_LENGTH: usize = 16;

/// AES-256-GCM with a 16-byte IV
type Aes256Gcm16 = AesGcm<Aes256, U16>;

#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("invalid hex in {field}: {source}")]
    InvalidHex {
        field: &'static str,
        #[source]
        source: hex::FromHexError,
    },
    #[error("invalid {field} length: expected {expected} bytes, got {actual}")]
    InvalidLength {
        field: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("encryption failed")]
    Encryption,
    #[error("decryption failed: wrong key or tampered data")]
    Decryption,
    #[error("decrypted data is not valid UTF-8")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
}

/// Symmetric encryption with a single process key
#[derive(Clone)]
pub struct CryptoService {
    cipher: Aes256Gcm16,
}

impl std::fmt::Debug for CryptoService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CryptoService").finish_non_exhaustive()
    }
}

impl CryptoService {
    pub fn new(key: [u8; KEY_LENGTH]) -> Self {
        Self {
            cipher: Aes256Gcm16::new(&key.into()),
        }
    }

    /// Build from a hex-encoded 32-byte key
    pub fn from_hex(key: &str) -> Result<Self, CryptoError> {
        let bytes = decode_exact::<KEY_LENGTH>("key", key.trim())?;
        Ok(Self::new(bytes))
    }

    /// Service with a freshly generated key
    pub fn random() -> Self {
        Self::new(generate_key())
    }

    pub fn encrypt(&self, data: &str) -> Result<EncryptionResult, CryptoError> {
        let mut iv = [0u8; IV_LENGTH];
        OsRng.fill_bytes(&mut iv);

        let mut buffer = data.as_bytes().to_vec();
        let tag = self
            .cipher
            .encrypt_in_place_detached(Nonce::<U16>::from_slice(&iv), b"", &mut buffer)
            .map_err(|_| CryptoError::Encryption)?;

        Ok(EncryptionResult {
            encrypted: hex::encode(buffer),
            iv: hex::encode(iv),
            tag: hex::encode(tag),
        })
    }

    pub fn decrypt(&self, payload: &EncryptionResult) -> Result<String, CryptoError> {
        let iv = decode_exact::<IV_LENGTH>("iv", &payload.iv)?;
        let tag = decode_exact::<TAG_LENGTH>("tag", &payload.tag)?;
        let mut buffer = hex::decode(&payload.encrypted).map_err(|source| {
            CryptoError::InvalidHex {
                field: "encrypted",
                source,
            }
        })?;

        self.cipher
            .decrypt_in_place_detached(
                Nonce::<U16>::from_slice(&iv),
                b"",
                &mut buffer,
                Tag::<U16>::from_slice(&tag),
            )
            .map_err(|_| CryptoError::Decryption)?;

        Ok(String::from_utf8(buffer)?)
    }
}

/// 32 random bytes from the operating system RNG
pub fn generate_key() -> [u8; KEY_LENGTH] {
    let mut key = [0u8; KEY_LENGTH];
    OsRng.fill_bytes(&mut key);
    key
}

pub fn sha256_hex(data: &str) -> String {
    sha256_bytes_hex(data.as_bytes())
}

pub fn sha256_bytes_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

fn decode_exact<const N: usize>(field: &'static str, raw: &str) -> Result<[u8; N], CryptoError> {
    let bytes = hex::decode(raw).map_err(|source| CryptoError::InvalidHex { field, source })?;
    let actual = bytes.len();
    bytes.try_into().map_err(|_| CryptoError::InvalidLength {
        field,
        expected: N,
        actual,
    })
}
