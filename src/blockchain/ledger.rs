use serde::{Deserialize, Serialize};

use super::{Block, pow};
use crate::network::PeerSet;
use crate::transaction::Transaction;

/// Chain view exchanged between peers and returned to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainSnapshot {
    pub length: usize,
    pub chain: Vec<Block>,
}

/// The node's chain, its pending transaction queue and its known peers.
///
/// A `Ledger` is meant to live behind a single lock: queueing, sealing and
/// chain replacement all go through `&mut self` and therefore never
/// interleave.
#[derive(Debug)]
pub struct Ledger {
    chain: Vec<Block>,
    pending: Vec<Transaction>,
    peers: PeerSet,
    /// Bumped on every chain replacement.
    generation: u64,
    /// Leading blocks of the current chain already written to disk.
    persisted: usize,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

impl Ledger {
    /// Initialize a ledger holding only the genesis block.
    pub fn new() -> Self {
        Self {
            chain: vec![Block::genesis()],
            pending: Vec::new(),
            peers: PeerSet::default(),
            generation: 0,
            persisted: 0,
        }
    }

    /// Queue a transaction; returns the index of the block it should land in.
    pub fn queue_transaction(&mut self, tx: Transaction) -> u64 {
        self.pending.push(tx);
        self.tip().index + 1
    }

    /// Seal the pending queue into a new block on top of the tip.
    ///
    /// Panics if `proof` does not verify against the tip's proof: callers must
    /// have searched against the current tip.
    pub fn append_block(&mut self, proof: u64) -> &Block {
        let tip = self.tip();
        assert!(
            pow::verify(tip.proof, proof),
            "proof {proof} does not verify against tip #{} (proof {})",
            tip.index,
            tip.proof
        );
        let previous_hash = tip.canonical_hash();

        let block = Block::new(
            self.chain.len() as u64 + 1,
            std::mem::take(&mut self.pending),
            proof,
            previous_hash,
        );
        self.chain.push(block);
        self.tip()
    }

    /// Return the last block in the chain.
    pub fn tip(&self) -> &Block {
        debug_assert!(!self.is_empty());
        self.chain
            .last()
            .expect("ledger always holds at least the genesis block")
    }

    /// Swap in a validated candidate chain. Pending transactions are kept as-is.
    pub fn replace_chain(&mut self, candidate: Vec<Block>) {
        assert!(!candidate.is_empty(), "cannot replace with an empty chain");
        self.chain = candidate;
        self.generation += 1;
        self.persisted = 0;
    }

    pub fn chain(&self) -> &[Block] {
        &self.chain
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    /// Never true once constructed; genesis is always present.
    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    pub fn pending(&self) -> &[Transaction] {
        &self.pending
    }

    pub fn peers(&self) -> &PeerSet {
        &self.peers
    }

    pub fn peers_mut(&mut self) -> &mut PeerSet {
        &mut self.peers
    }

    pub fn snapshot(&self) -> ChainSnapshot {
        ChainSnapshot {
            length: self.chain.len(),
            chain: self.chain.clone(),
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn persisted(&self) -> usize {
        self.persisted
    }

    /// Record that the first `len` blocks of chain `generation` are on disk.
    /// Ignored if the chain has been replaced since.
    pub fn mark_persisted(&mut self, generation: u64, len: usize) {
        if generation == self.generation {
            self.persisted = self.persisted.max(len.min(self.chain.len()));
        }
    }
}
