use log::debug;

use super::{Block, pow};

/// Structural and proof-of-work check of a candidate chain.
///
/// An empty chain is invalid and a lone genesis block is always valid.
/// Every later block must link to the canonical hash of its predecessor and
/// carry a proof that verifies against the predecessor's proof. No signature
/// or balance checks are made.
pub fn validate_chain(chain: &[Block]) -> bool {
    if chain.is_empty() {
        return false;
    }

    for pair in chain.windows(2) {
        let (prev, current) = (&pair[0], &pair[1]);

        if current.previous_hash != prev.canonical_hash() {
            debug!("VALIDATE - block #{} breaks hash linkage", current.index);
            return false;
        }

        if !pow::verify(prev.proof, current.proof) {
            debug!("VALIDATE - block #{} carries an invalid proof", current.index);
            return false;
        }
    }

    true
}
