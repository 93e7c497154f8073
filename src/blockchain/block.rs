use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::{GENESIS_PREVIOUS_HASH, GENESIS_PROOF};
use crate::transaction::Transaction;

/// A sealed block. Fields are only read after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub index: u64,
    pub timestamp: i64, // Unix milliseconds (UTC)
    pub transactions: Vec<Transaction>,
    pub proof: u64,
    pub previous_hash: String,
}

impl Block {
    /// Create the genesis block (first block in the chain). No search is
    /// performed: the proof is a fixed constant.
    pub fn genesis() -> Self {
        Self {
            index: 1,
            timestamp: Utc::now().timestamp_millis(),
            transactions: Vec::new(),
            proof: GENESIS_PROOF,
            previous_hash: GENESIS_PREVIOUS_HASH.to_string(),
        }
    }

    pub fn new(
        index: u64,
        transactions: Vec<Transaction>,
        proof: u64,
        previous_hash: String,
    ) -> Self {
        Self {
            index,
            timestamp: Utc::now().timestamp_millis(),
            transactions,
            proof,
            previous_hash,
        }
    }

    /// SHA-256 over the block's JSON form with object keys sorted, so the
    /// digest depends only on field values and never on declaration order.
    pub fn canonical_hash(&self) -> String {
        // serde_json's default map is ordered by key.
        let value = serde_json::to_value(self).expect("block fields always serialize");
        let mut hasher = Sha256::new();
        hasher.update(value.to_string().as_bytes());
        hex::encode(hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::Block;
    use crate::transaction::Transaction;

    fn sample() -> Block {
        Block::new(
            2,
            vec![Transaction::new("alice", "bob", 3, Some("rent".into()))],
            35293,
            "abc".into(),
        )
    }

    #[test]
    fn genesis_uses_fixed_values() {
        let g = Block::genesis();
        assert_eq!(g.index, 1);
        assert_eq!(g.proof, super::GENESIS_PROOF);
        assert_eq!(g.previous_hash, super::GENESIS_PREVIOUS_HASH);
        assert!(g.transactions.is_empty());
    }

    #[test]
    fn hash_is_stable() {
        let b = sample();
        let h = b.canonical_hash();
        assert_eq!(h.len(), 64);
        assert_eq!(h, b.canonical_hash());
        assert_eq!(h, b.clone().canonical_hash());
    }

    #[test]
    fn hash_changes_with_any_field() {
        let b = sample();
        let original = b.canonical_hash();

        let mut m = b.clone();
        m.index += 1;
        assert_ne!(original, m.canonical_hash());

        let mut m = b.clone();
        m.timestamp += 1;
        assert_ne!(original, m.canonical_hash());

        let mut m = b.clone();
        m.proof += 1;
        assert_ne!(original, m.canonical_hash());

        let mut m = b.clone();
        m.previous_hash.push('0');
        assert_ne!(original, m.canonical_hash());

        let mut m = b.clone();
        m.transactions[0].amount = 4;
        assert_ne!(original, m.canonical_hash());

        let mut m = b.clone();
        m.transactions.push(Transaction::new("bob", "carol", 1, None));
        assert_ne!(original, m.canonical_hash());
    }

    #[test]
    fn hash_ignores_field_order_of_the_source_document() {
        let b = sample();
        let reordered = format!(
            r#"{{"previous_hash":"{}","proof":{},"transactions":{},"timestamp":{},"index":{}}}"#,
            b.previous_hash,
            b.proof,
            serde_json::to_string(&b.transactions).unwrap(),
            b.timestamp,
            b.index
        );
        let parsed: Block = serde_json::from_str(&reordered).unwrap();
        assert_eq!(parsed.canonical_hash(), b.canonical_hash());
    }
}
