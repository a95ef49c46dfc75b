//! Hashing helpers and the signature-verification seam.

use ripemd::Ripemd160;
use sha1::Sha1;
use sha2::{Digest, Sha256};

/// SHA-1 of `data`.
#[must_use]
pub fn sha1(data: &[u8]) -> Vec<u8> {
    Sha1::digest(data).to_vec()
}

/// SHA-256 of `data`.
#[must_use]
pub fn sha256(data: &[u8]) -> Vec<u8> {
    Sha256::digest(data).to_vec()
}

/// RIPEMD-160 of SHA-256, the script-hash function.
#[must_use]
pub fn hash160(data: &[u8]) -> [u8; 20] {
    let mut out = [0u8; 20];
    out.copy_from_slice(&Ripemd160::digest(Sha256::digest(data)));
    out
}

/// Double SHA-256.
#[must_use]
pub fn hash256(data: &[u8]) -> Vec<u8> {
    Sha256::digest(Sha256::digest(data)).to_vec()
}

/// Signature verification used by `CHECKSIG`-family opcodes.
pub trait Crypto {
    /// Verifies `signature` over `message` with the given encoded public
    /// key. Malformed keys or signatures verify as `false`.
    fn verify_signature(&self, message: &[u8], signature: &[u8], public_key: &[u8]) -> bool;
}

/// ECDSA over the P-256 curve, the protocol's signature scheme.
#[derive(Debug, Default, Clone, Copy)]
pub struct P256Crypto;

impl Crypto for P256Crypto {
    fn verify_signature(&self, message: &[u8], signature: &[u8], public_key: &[u8]) -> bool {
        use p256::ecdsa::signature::Verifier;
        use p256::ecdsa::{Signature, VerifyingKey};

        let Ok(key) = VerifyingKey::from_sec1_bytes(public_key) else {
            return false;
        };
        let Ok(signature) = Signature::from_slice(signature) else {
            return false;
        };
        key.verify(message, &signature).is_ok()
    }
}
