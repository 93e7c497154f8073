//! Proof-of-work puzzle: find `proof` such that
//! `sha256("{last_proof}{proof}")` starts with [`PROOF_TARGET`].

use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicBool, Ordering};

use super::PROOF_TARGET;

/// Check a candidate proof against the previous block's proof.
pub fn verify(last_proof: u64, candidate: u64) -> bool {
    let guess = format!("{last_proof}{candidate}");
    let digest = hex::encode(Sha256::digest(guess.as_bytes()));
    digest.starts_with(PROOF_TARGET)
}

/// Smallest non-negative proof valid after `last_proof`. Runs until found.
pub fn search(last_proof: u64) -> u64 {
    let mut candidate = 0u64;
    while !verify(last_proof, candidate) {
        candidate = candidate.wrapping_add(1);
    }
    candidate
}

/// Same as [`search`], but gives up with `None` once `cancel` is raised.
pub fn search_until(last_proof: u64, cancel: &AtomicBool) -> Option<u64> {
    let mut candidate = 0u64;
    loop {
        if cancel.load(Ordering::Relaxed) {
            return None;
        }
        if verify(last_proof, candidate) {
            return Some(candidate);
        }
        candidate = candidate.wrapping_add(1);
    }
}
