//! Session token signing.
//!
//! At handshake the server signs the freshly minted token and hands both
//! back to the client. Every later request carries the pair, and the
//! server recomputes the signature to check it.
//!
//! The signature covers the token only, not the session's stored fields.
//! It proves "this token was issued by a server holding the secret", and
//! nothing more. Anyone holding the secret can mint valid pairs for any
//! token, past or future, so the secret must come from deployment
//! configuration and be rotated with [`Signer::with_previous`] when it
//! leaks.

use std::fmt;

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::SessionError;

type HmacSha256 = Hmac<Sha256>;

/// Signs and verifies session tokens with HMAC-SHA256.
///
/// Signatures are lowercase hex (64 characters). New signatures always
/// use the current secret; verification also accepts signatures made
/// with any previous secret, so sessions survive a key rotation.
///
/// # Example
///
/// ```rust
/// use paperthrow_session::Signer;
///
/// let signer = Signer::new("deployment-secret").unwrap();
/// let sig = signer.sign("0123456789abcdef0123456789abcdef");
///
/// assert_eq!(sig.len(), 64);
/// assert!(signer.verify("0123456789abcdef0123456789abcdef", &sig));
/// assert!(!signer.verify("0123456789abcdef0123456789abcdef", "forged"));
/// ```
#[derive(Clone)]
pub struct Signer {
    /// Keyed MAC state for the current secret. Cloned per signature.
    current: HmacSha256,

    /// Retired secrets still accepted by [`verify`](Self::verify).
    previous: Vec<HmacSha256>,
}

impl Signer {
    /// Creates a signer for the given secret.
    ///
    /// # Errors
    /// Returns [`SessionError::InvalidSecret`] if the secret is empty.
    pub fn new(secret: impl AsRef<[u8]>) -> Result<Self, SessionError> {
        Ok(Self {
            current: keyed(secret.as_ref())?,
            previous: Vec::new(),
        })
    }

    /// Adds retired secrets that are still accepted for verification.
    ///
    /// # Errors
    /// Returns [`SessionError::InvalidSecret`] if any secret is empty.
    pub fn with_previous<I, K>(mut self, secrets: I) -> Result<Self, SessionError>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<[u8]>,
    {
        for secret in secrets {
            self.previous.push(keyed(secret.as_ref())?);
        }
        Ok(self)
    }

    /// Signs a token with the current secret.
    pub fn sign(&self, token: &str) -> String {
        hex_mac(&self.current, token)
    }

    /// Returns `true` if `signature` is the signature of `token` under the
    /// current secret or any previous one.
    ///
    /// The comparison is constant-time in the signature contents.
    pub fn verify(&self, token: &str, signature: &str) -> bool {
        std::iter::once(&self.current)
            .chain(&self.previous)
            .any(|key| {
                let expected = hex_mac(key, token);
                bool::from(expected.as_bytes().ct_eq(signature.as_bytes()))
            })
    }

    /// Number of retired secrets accepted for verification.
    pub fn previous_count(&self) -> usize {
        self.previous.len()
    }
}

/// Secrets never appear in debug output.
impl fmt::Debug for Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signer")
            .field("previous_secrets", &self.previous.len())
            .finish_non_exhaustive()
    }
}

fn keyed(secret: &[u8]) -> Result<HmacSha256, SessionError> {
    if secret.is_empty() {
        return Err(SessionError::InvalidSecret("secret is empty".into()));
    }
    HmacSha256::new_from_slice(secret)
        .map_err(|e| SessionError::InvalidSecret(e.to_string()))
}

fn hex_mac(key: &HmacSha256, token: &str) -> String {
    let mut mac = key.clone();
    mac.update(token.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}
