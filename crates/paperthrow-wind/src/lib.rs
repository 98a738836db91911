//! Deterministic wind for PaperThrow sessions.
//!
//! Every session gets its own wind, and the same session always gets the
//! same wind. There is no randomness involved: the vector is read straight
//! out of an MD5 digest of the session token.
//!
//! # Mapping
//!
//! ```text
//! md5(token) = [b0, b1, b2, ...]      (16 bytes)
//! r_i        = b_i / 255               (0.0 ..= 1.0)
//!
//! x        = (r0 - 0.5) * 0.4          (-0.2 ..= 0.2)
//! y        = 0
//! z        = (r1 - 0.5) * 0.4          (-0.2 ..= 0.2)
//! strength = 0.8 + r2 * 0.8            ( 0.8 ..= 1.6)
//! ```
//!
//! The digest algorithm and byte offsets are part of the contract with
//! shipped game clients, which replay the same wind locally. MD5 is used
//! for its spread, not for any security property.

use md5::{Digest, Md5};
use paperthrow_protocol::Wind;

/// Full span of `x` and `z` around zero; each lies within half of it.
const LATERAL_SCALE: f64 = 0.4;

/// Weakest possible wind.
const MIN_STRENGTH: f64 = 0.8;

/// `strength` spans `MIN_STRENGTH ..= MIN_STRENGTH + STRENGTH_SPAN`.
const STRENGTH_SPAN: f64 = 0.8;

/// Returns the 128-bit seed that all wind components are read from.
pub fn seed(token: &str) -> [u8; 16] {
    Md5::digest(token.as_bytes()).into()
}

/// Derives the wind vector for a session token.
///
/// ```rust
/// let a = paperthrow_wind::derive_wind("3f2a9c");
/// let b = paperthrow_wind::derive_wind("3f2a9c");
/// assert_eq!(a, b);
/// assert_eq!(a.y, 0.0);
/// ```
pub fn derive_wind(token: &str) -> Wind {
    let seed = seed(token);
    let r = |i: usize| f64::from(seed[i]) / 255.0;

    Wind {
        x: (r(0) - 0.5) * LATERAL_SCALE,
        y: 0.0,
        z: (r(1) - 0.5) * LATERAL_SCALE,
        strength: MIN_STRENGTH + r(2) * STRENGTH_SPAN,
    }
}
