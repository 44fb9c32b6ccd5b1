//! PKCE (Proof Key for Code Exchange) helpers, RFC 7636.
//!
//! The verifier stays on the server: it is written to the session when the
//! flow starts and only leaves the process in the server-to-server token
//! request. The browser and the authorize endpoint only ever see the challenge.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::{rngs::OsRng, RngCore as _};
use sha2::{Digest, Sha256};

/// The only challenge method we ever send
pub const CODE_CHALLENGE_METHOD: &str = "S256";

/// Number of random bytes in a verifier (256 bits)
const VERIFIER_BYTES: usize = 32;

/// Generate a fresh code verifier.
///
/// 32 bytes straight from the operating system's CSPRNG, base64url encoded
/// without padding, which gives 43 characters from `[A-Za-z0-9_-]`. `OsRng`
/// panics if the OS source is unavailable; there is no weaker fallback.
pub fn generate_code_verifier() -> String {
    let mut bytes = [0u8; VERIFIER_BYTES];
    OsRng.fill_bytes(&mut bytes);

    URL_SAFE_NO_PAD.encode(bytes)
}

/// `BASE64URL(SHA256(verifier))` without padding
pub fn generate_code_challenge(verifier: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}

/// A verifier together with the challenge derived from it
#[derive(Debug, Clone)]
pub struct PkcePair {
    pub verifier: String,
    pub challenge: String,
}

impl PkcePair {
    pub fn generate() -> Self {
        let verifier = generate_code_verifier();
        let challenge = generate_code_challenge(&verifier);

        Self {
            verifier,
            challenge,
        }
    }
}
