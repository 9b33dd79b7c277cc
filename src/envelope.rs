//! Password-based encryption of paste content.
//!
//! A password is stretched with PBKDF2-HMAC-SHA256 into a 256-bit key, which
//! seals the content with XChaCha20-Poly1305. Only the salt is stored next to
//! the ciphertext; the key is re-derived from the candidate password on every
//! unlock attempt.
//!
//! Ciphertext layout:
//!
//! ```text
//! [ nonce (24 bytes) | ciphertext + tag (N + 16 bytes) ]
//! ```

use std::fmt;

use chacha20poly1305::aead::{Aead, AeadCore, KeyInit, OsRng};
use chacha20poly1305::{Key, XChaCha20Poly1305, XNonce};
use rand::RngCore;
use sha2::Sha256;
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// PBKDF2 iteration count.
pub const KDF_ITERATIONS: u32 = 100_000;
pub const SALT_LEN: usize = 16;
pub const KEY_LEN: usize = 32;
const NONCE_LEN: usize = 24;

/// Decryption failed. Wrong passwords and damaged ciphertexts are reported
/// the same way.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("authentication failure")]
pub struct AuthenticationFailure;

/// The cipher refused to seal the content.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("failed to seal paste content")]
pub struct SealError;

/// A non-empty password.
///
/// There is no way to build one from an empty string, so content submitted
/// without a password never goes through the key derivation.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Password(String);

impl Password {
    /// Returns `None` for an empty password.
    pub fn new(password: impl Into<String>) -> Option<Self> {
        let password = password.into();
        if password.is_empty() {
            None
        } else {
            Some(Password(password))
        }
    }

    fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password([REDACTED])")
    }
}

/// Per-paste KDF salt.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Salt([u8; SALT_LEN]);

impl Salt {
    /// Draw a fresh salt from the OS random number generator.
    pub fn random() -> Self {
        let mut salt = [0u8; SALT_LEN];
        OsRng.fill_bytes(&mut salt);
        Salt(salt)
    }

    pub fn as_bytes(&self) -> &[u8; SALT_LEN] {
        &self.0
    }
}

impl From<[u8; SALT_LEN]> for Salt {
    fn from(value: [u8; SALT_LEN]) -> Self {
        Salt(value)
    }
}

impl TryFrom<&[u8]> for Salt {
    type Error = AuthenticationFailure;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        let salt: [u8; SALT_LEN] = value.try_into().map_err(|_| AuthenticationFailure)?;
        Ok(Salt(salt))
    }
}

impl fmt::Debug for Salt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Salt(")?;
        for byte in self.0 {
            write!(f, "{byte:02x}")?;
        }
        write!(f, ")")
    }
}

/// Key material derived from a password. Wiped on drop.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey([u8; KEY_LEN]);

impl DerivedKey {
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DerivedKey([REDACTED])")
    }
}

/// Ciphertext plus the salt needed to re-derive its key.
#[derive(Debug, Clone)]
pub struct Sealed {
    pub ciphertext: Vec<u8>,
    pub salt: Salt,
}

/// Stretch a password into a cipher key.
///
/// Same password and salt always give the same key. This is slow on purpose;
/// call it from a blocking context.
pub fn derive_key(password: &Password, salt: &Salt) -> DerivedKey {
    let mut key = [0u8; KEY_LEN];
    pbkdf2::pbkdf2_hmac::<Sha256>(password.as_bytes(), salt.as_bytes(), KDF_ITERATIONS, &mut key);
    DerivedKey(key)
}

/// Encrypt content under a password with a fresh salt and nonce.
pub fn encrypt(plaintext: &[u8], password: &Password) -> Result<Sealed, SealError> {
    let salt = Salt::random();
    let key = derive_key(password, &salt);
    let cipher = XChaCha20Poly1305::new(Key::from_slice(key.as_bytes()));

    let nonce = XChaCha20Poly1305::generate_nonce(&mut OsRng);
    let sealed = cipher.encrypt(&nonce, plaintext).map_err(|_| SealError)?;

    let mut ciphertext = Vec::with_capacity(NONCE_LEN + sealed.len());
    ciphertext.extend_from_slice(&nonce);
    ciphertext.extend(sealed);

    Ok(Sealed { ciphertext, salt })
}

/// Recover content sealed by [`encrypt`].
pub fn decrypt(
    ciphertext: &[u8],
    salt: &[u8],
    password: &Password,
) -> Result<Vec<u8>, AuthenticationFailure> {
    let salt = Salt::try_from(salt)?;
    if ciphertext.len() < NONCE_LEN {
        return Err(AuthenticationFailure);
    }
    let (nonce, sealed) = ciphertext.split_at(NONCE_LEN);

    let key = derive_key(password, &salt);
    let cipher = XChaCha20Poly1305::new(Key::from_slice(key.as_bytes()));

    cipher
        .decrypt(XNonce::from_slice(nonce), sealed)
        .map_err(|_| AuthenticationFailure)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn password(s: &str) -> Password {
        Password::new(s).unwrap()
    }

    #[test]
    fn empty_password_is_rejected() {
        assert!(Password::new("").is_none());
        assert!(Password::new(" ").is_some());
    }

    #[test]
    fn derive_key_is_deterministic() {
        let salt = Salt::from([7u8; SALT_LEN]);
        let a = derive_key(&password("hunter2"), &salt);
        let b = derive_key(&password("hunter2"), &salt);
        assert_eq!(a, b);
    }

    #[test]
    fn derive_key_depends_on_salt_and_password() {
        let salt = Salt::from([7u8; SALT_LEN]);
        let other_salt = Salt::from([8u8; SALT_LEN]);
        let key = derive_key(&password("hunter2"), &salt);
        assert_ne!(key, derive_key(&password("hunter2"), &other_salt));
        assert_ne!(key, derive_key(&password("hunter3"), &salt));
    }

    #[test]
    fn round_trip() {
        let sealed = encrypt(b"hello world", &password("secret123")).unwrap();
        let plaintext = decrypt(
            &sealed.ciphertext,
            sealed.salt.as_bytes(),
            &password("secret123"),
        )
        .unwrap();
        assert_eq!(plaintext, b"hello world");
    }

    #[test]
    fn round_trip_empty_content() {
        let sealed = encrypt(b"", &password("pw")).unwrap();
        let plaintext = decrypt(&sealed.ciphertext, sealed.salt.as_bytes(), &password("pw")).unwrap();
        assert!(plaintext.is_empty());
    }

    #[test]
    fn ciphertext_does_not_contain_plaintext() {
        let sealed = encrypt(b"hello world", &password("secret123")).unwrap();
        assert!(!sealed
            .ciphertext
            .windows(b"hello world".len())
            .any(|w| w == b"hello world"));
    }

    #[test]
    fn wrong_password_fails() {
        let sealed = encrypt(b"hello world", &password("secret123")).unwrap();
        let result = decrypt(&sealed.ciphertext, sealed.salt.as_bytes(), &password("wrong"));
        assert_eq!(result, Err(AuthenticationFailure));
    }

    #[test]
    fn tampering_fails_like_a_wrong_password() {
        let sealed = encrypt(b"hello world", &password("secret123")).unwrap();
        let mut tampered = sealed.ciphertext.clone();
        let last = tampered.len() - 1;
        tampered[last] ^= 0x01;

        let result = decrypt(&tampered, sealed.salt.as_bytes(), &password("secret123"));
        assert_eq!(result, Err(AuthenticationFailure));
    }

    #[test]
    fn malformed_input_fails_without_panicking() {
        let sealed = encrypt(b"hello world", &password("secret123")).unwrap();
        let pw = password("secret123");

        assert_eq!(decrypt(&[], sealed.salt.as_bytes(), &pw), Err(AuthenticationFailure));
        assert_eq!(
            decrypt(&sealed.ciphertext[..10], sealed.salt.as_bytes(), &pw),
            Err(AuthenticationFailure)
        );
        assert_eq!(
            decrypt(&sealed.ciphertext, &[1, 2, 3], &pw),
            Err(AuthenticationFailure)
        );
        assert_eq!(decrypt(&sealed.ciphertext, &[], &pw), Err(AuthenticationFailure));
    }

    #[test]
    fn fresh_salt_and_nonce_each_time() {
        let pw = password("secret123");
        let a = encrypt(b"hello world", &pw).unwrap();
        let b = encrypt(b"hello world", &pw).unwrap();
        assert_ne!(a.salt, b.salt);
        assert_ne!(a.ciphertext, b.ciphertext);
    }

    #[test]
    fn secrets_are_redacted_in_debug() {
        let pw = password("secret123");
        let key = derive_key(&pw, &Salt::from([0u8; SALT_LEN]));
        assert!(!format!("{pw:?}").contains("secret123"));
        assert_eq!(format!("{key:?}"), "DerivedKey([REDACTED])");
    }
}
