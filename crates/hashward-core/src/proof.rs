//! Proof verification collaborator
//!
//! `verify_data` compares hashes byte for byte. The proof bytes that come
//! with the call are handed to a `ProofVerifier` after that comparison
//! succeeds, so a signature or inclusion-proof checker can be plugged in
//! without changing the engine.

use crate::hash::DataHash;
use crate::types::HashRecord;

pub trait ProofVerifier {
    /// Whether `proof` is acceptable for `hash`, which already equals `record.hash`.
    fn verify(&self, record: &HashRecord, hash: &DataHash, proof: &[u8]) -> bool;
}

/// Treats proof bytes as reserved and accepts them unchecked.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpaqueProof;

impl ProofVerifier for OpaqueProof {
    fn verify(&self, _record: &HashRecord, _hash: &DataHash, _proof: &[u8]) -> bool {
        true
    }
}

impl<F> ProofVerifier for F
where
    F: Fn(&HashRecord, &DataHash, &[u8]) -> bool,
{
    fn verify(&self, record: &HashRecord, hash: &DataHash, proof: &[u8]) -> bool {
        self(record, hash, proof)
    }
}
