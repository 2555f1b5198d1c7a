//! PKCE (Proof Key for Code Exchange) implementation per RFC 7636
//!
//! A fresh verifier is generated for every attempt and never persisted. Only
//! the S256 challenge leaves the device before the token exchange; the
//! verifier itself is sent once, to the token endpoint, to prove the exchange
//! comes from the party that started the flow.

use auth_api::PkceGenerator;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngExt;
use sha2::{Digest, Sha256};

/// Random bytes behind each verifier. 32 bytes encode to 43 base64url chars,
/// the RFC 7636 minimum.
const VERIFIER_BYTES: usize = 32;

/// Generate a cryptographically random PKCE code verifier.
///
/// Draws from the thread-local CSPRNG (seeded from the OS). Output is
/// URL-safe base64 without padding.
pub fn generate_code_verifier() -> String {
    let mut bytes = [0u8; VERIFIER_BYTES];
    rand::rng().fill(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Compute the S256 code challenge from a verifier.
///
/// `challenge = BASE64URL(SHA256(ASCII(verifier)))`
pub fn generate_code_challenge(verifier: &str) -> String {
    let hash = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hash)
}

/// Default `PkceGenerator` backed by the functions above.
#[derive(Debug, Clone, Copy, Default)]
pub struct S256Generator;

impl PkceGenerator for S256Generator {
    fn generate_code_verifier(&self) -> String {
        generate_code_verifier()
    }

    fn generate_code_challenge(&self, code_verifier: &str) -> String {
        generate_code_challenge(code_verifier)
    }
}
