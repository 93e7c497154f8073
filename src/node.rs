//! Operations the HTTP layer calls into. `Node` owns the ledger behind one
//! mutex; proof search and peer fetches run with the lock released.

use log::{debug, info, warn};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::blockchain::{Block, ChainSnapshot, Ledger, pow, validate_chain};
use crate::config::NodeConfig;
use crate::error::{NodeError, Result};
use crate::network::consensus::select_longest;
use crate::network::{ChainSource, normalize_peer};
use crate::storage::ChainStore;
use crate::transaction::Transaction;

/// Result of a consensus round.
#[derive(Debug)]
pub struct ResolveOutcome {
    pub replaced: bool,
    pub chain: Vec<Block>,
}

pub struct Node {
    ledger: Mutex<Ledger>,
    /// Serializes disk writes so a stale snapshot never lands after a newer one.
    persist_lock: Mutex<()>,
    config: NodeConfig,
    shutdown: AtomicBool,
}

impl Node {
    pub fn new(config: NodeConfig) -> Self {
        Self {
            ledger: Mutex::new(Ledger::new()),
            persist_lock: Mutex::new(()),
            config,
            shutdown: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    /// Lock the ledger for reading or a single mutation.
    pub fn ledger(&self) -> MutexGuard<'_, Ledger> {
        self.ledger.lock().expect("mutex poisoned")
    }

    /// Stop any proof search in progress; later `mine` calls fail fast.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }

    /// Queue a transaction. Returns the index of the block it should land in.
    pub fn submit_transaction(&self, tx: Transaction) -> u64 {
        let mut ledger = self.ledger();
        let index = ledger.queue_transaction(tx);
        debug!(
            "TX - queued for block #{index} (pending: {})",
            ledger.pending().len()
        );
        index
    }

    /// Search a proof against the current tip and seal the pending queue.
    ///
    /// Blocks the calling thread for the whole search. If the tip moves while
    /// searching, the stale proof is thrown away and the search restarts.
    pub fn mine(&self) -> Result<Block> {
        self.mine_with(|last_proof| pow::search_until(last_proof, &self.shutdown))
    }

    /// Mining loop with the proof search supplied by the caller. `search`
    /// runs without the ledger lock; `None` means it was cancelled.
    fn mine_with<F>(&self, mut search: F) -> Result<Block>
    where
        F: FnMut(u64) -> Option<u64>,
    {
        loop {
            let last_proof = self.ledger().tip().proof;

            let proof = search(last_proof).ok_or(NodeError::MiningCancelled)?;

            let mut ledger = self.ledger();
            if ledger.tip().proof != last_proof {
                warn!(
                    "MINER - tip moved to #{} during search, retrying",
                    ledger.tip().index
                );
                continue;
            }

            if self.config.mining_reward > 0 {
                ledger.queue_transaction(Transaction::reward(
                    self.config.node_id.clone(),
                    self.config.mining_reward,
                ));
            }

            let block = ledger.append_block(proof).clone();
            info!(
                "MINER - sealed block #{} (proof={}, txs={})",
                block.index,
                block.proof,
                block.transactions.len()
            );
            return Ok(block);
        }
    }

    pub fn chain_snapshot(&self) -> ChainSnapshot {
        self.ledger().snapshot()
    }

    /// Register peers, all or nothing. Returns the full peer list.
    pub fn register_peers<S: AsRef<str>>(&self, addresses: &[S]) -> Result<Vec<String>> {
        let mut ledger = self.ledger();
        ledger.peers_mut().register_all(addresses)?;
        Ok(ledger.peers().to_vec())
    }

    pub fn peers(&self) -> Vec<String> {
        self.ledger().peers().to_vec()
    }

    /// Adopt the longest valid chain among `targets` (or all registered peers)
    /// if it is strictly longer than ours.
    ///
    /// Pending transactions are left queued even when the chain is replaced;
    /// they are not checked against the adopted chain.
    pub async fn resolve_consensus<S, T>(
        &self,
        source: &S,
        targets: Option<&[T]>,
    ) -> Result<ResolveOutcome>
    where
        S: ChainSource,
        T: AsRef<str>,
    {
        let (peers, local_len) = {
            let ledger = self.ledger();
            let peers = match targets {
                Some(targets) => targets
                    .iter()
                    .map(|t| normalize_peer(t.as_ref()))
                    .collect::<Result<Vec<_>>>()?,
                None => ledger.peers().iter().cloned().collect(),
            };
            (peers, ledger.len())
        };

        let best = select_longest(source, &peers, local_len).await;

        let mut ledger = self.ledger();
        let replaced = match best {
            // Our chain may have grown while the lock was released.
            Some(candidate) if candidate.len() > ledger.len() => {
                info!(
                    "CONSENSUS - replacing local chain ({} blocks) with {} blocks",
                    ledger.len(),
                    candidate.len()
                );
                ledger.replace_chain(candidate);
                if !ledger.pending().is_empty() {
                    warn!(
                        "CONSENSUS - {} pending transaction(s) kept without reconciliation",
                        ledger.pending().len()
                    );
                }
                true
            }
            Some(_) => {
                debug!("CONSENSUS - local chain grew past the candidate, keeping it");
                false
            }
            None => false,
        };

        Ok(ResolveOutcome {
            replaced,
            chain: ledger.chain().to_vec(),
        })
    }

    /// Write the chain and peers to `dir`. Returns the indices of the blocks
    /// written by this call.
    pub fn persist(&self, dir: &Path) -> Result<Vec<u64>> {
        let _writing = self.persist_lock.lock().expect("mutex poisoned");
        let (chain, peers, generation, already) = {
            let ledger = self.ledger();
            (
                ledger.chain().to_vec(),
                ledger.peers().to_vec(),
                ledger.generation(),
                ledger.persisted(),
            )
        };

        let written = ChainStore::new(dir).save(&chain, &peers, already)?;
        self.ledger().mark_persisted(generation, chain.len());
        Ok(written)
    }

    /// Load a chain previously written by [`Node::persist`]. Returns the
    /// number of blocks restored, zero if `dir` holds no saved chain. Nothing
    /// changes unless every block loads and the chain validates.
    pub fn restore(&self, dir: &Path) -> Result<usize> {
        let _writing = self.persist_lock.lock().expect("mutex poisoned");
        let Some(stored) = ChainStore::new(dir).load()? else {
            return Ok(0);
        };
        if !validate_chain(&stored.chain) {
            return Err(NodeError::InvalidChain);
        }

        let count = stored.chain.len();
        let mut ledger = self.ledger();
        let mut peers = ledger.peers().clone();
        peers.register_all(stored.peers.as_slice())?;

        ledger.replace_chain(stored.chain);
        *ledger.peers_mut() = peers;
        let generation = ledger.generation();
        ledger.mark_persisted(generation, count);

        info!("STORE - restored {count} blocks from {}", dir.display());
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::GENESIS_PREVIOUS_HASH;
    use crate::blockchain::fixtures::{longer_chain, mined_chain};
    use crate::network::consensus::tests::StubPeers;
    use std::cell::RefCell;
    use std::fs;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;
    use tempfile::TempDir;

    fn node() -> Node {
        Node::new(NodeConfig::from_lookup(|_| None))
    }

    fn node_with_chain(chain: &[Block]) -> Node {
        let node = node();
        node.ledger().replace_chain(chain.to_vec());
        node
    }

    #[test]
    fn fresh_node_holds_genesis() {
        let snap = node().chain_snapshot();
        assert_eq!(snap.length, 1);
        assert_eq!(snap.chain[0].previous_hash, GENESIS_PREVIOUS_HASH);
        assert!(validate_chain(&snap.chain));
    }

    #[test]
    fn mining_seals_submitted_transactions_in_order() {
        let node = node();
        let first = Transaction::new("alice", "bob", 5, None);
        let second = Transaction::new("bob", "carol", 2, Some("lunch".into()));
        assert_eq!(node.submit_transaction(first.clone()), 2);
        assert_eq!(node.submit_transaction(second.clone()), 2);

        let block = node.mine().unwrap();

        assert_eq!(block.index, 2);
        assert_eq!(block.proof, pow::search(100));
        assert_eq!(block.transactions, vec![first, second]);
        assert!(node.ledger().pending().is_empty());
        assert!(validate_chain(node.ledger().chain()));
    }

    #[test]
    fn reward_is_appended_when_configured() {
        let node = Node::new(NodeConfig::from_lookup(|k| match k {
            "MINING_REWARD" => Some("1".into()),
            "NODE_ID" => Some("miner".into()),
            _ => None,
        }));
        node.submit_transaction(Transaction::new("a", "b", 1, None));

        let block = node.mine().unwrap();

        assert_eq!(block.transactions.len(), 2);
        assert_eq!(block.transactions[1], Transaction::reward("miner", 1));
    }

    #[test]
    fn shutdown_cancels_mining() {
        let node = node();
        node.submit_transaction(Transaction::new("a", "b", 1, None));
        node.shutdown();

        assert!(matches!(node.mine(), Err(NodeError::MiningCancelled)));
        assert_eq!(node.chain_snapshot().length, 1);
        assert_eq!(node.ledger().pending().len(), 1);
    }

    #[test]
    fn stale_search_is_retried_against_new_tip() {
        let node = node();
        let searched_from = RefCell::new(Vec::new());

        let block = node
            .mine_with(|last_proof| {
                if searched_from.borrow().is_empty() {
                    // Another request replaces the chain mid-search.
                    node.ledger().replace_chain(mined_chain().to_vec());
                }
                searched_from.borrow_mut().push(last_proof);
                Some(pow::search(last_proof))
            })
            .unwrap();

        let tip_proof = mined_chain().last().unwrap().proof;
        assert_eq!(*searched_from.borrow(), vec![100, tip_proof]);
        let ledger = node.ledger();
        assert_eq!(ledger.len(), 5);
        assert_eq!(ledger.tip(), &block);
        assert!(validate_chain(ledger.chain()));
    }

    #[test]
    fn register_rejects_bad_lists_without_mutation() {
        let node = node();
        assert!(matches!(
            node.register_peers(&["a:1", ""]),
            Err(NodeError::InvalidPeer(_))
        ));
        assert!(node.peers().is_empty());

        let peers = node
            .register_peers(&["http://a:1", "a:1", "b:2"])
            .unwrap();
        assert_eq!(peers, vec!["a:1", "b:2"]);
    }

    #[actix_web::test]
    async fn resolve_adopts_longest_valid_peer_chain() {
        let node = node_with_chain(&mined_chain()[..3]);
        let five = longer_chain(1);
        let mut broken_four = five[..4].to_vec();
        broken_four[3].previous_hash = "0".repeat(64);
        node.register_peers(&["a:1", "b:1"]).unwrap();
        let stub = StubPeers::default()
            .with("a:1", five.clone())
            .with("b:1", broken_four);

        let outcome = node
            .resolve_consensus::<_, String>(&stub, None)
            .await
            .unwrap();

        assert!(outcome.replaced);
        assert_eq!(outcome.chain, five);
        assert_eq!(node.chain_snapshot().length, 5);
    }

    #[actix_web::test]
    async fn resolve_keeps_chain_when_nobody_is_longer() {
        let node = node_with_chain(mined_chain());
        node.register_peers(&["a:1", "down:1"]).unwrap();
        let stub = StubPeers::default().with("a:1", mined_chain()[..2].to_vec());

        let outcome = node
            .resolve_consensus::<_, String>(&stub, None)
            .await
            .unwrap();

        assert!(!outcome.replaced);
        assert_eq!(outcome.chain, mined_chain());
    }

    #[actix_web::test]
    async fn resolve_with_target_only_asks_that_peer() {
        let node = node();
        node.register_peers(&["a:1"]).unwrap();
        let stub = StubPeers::default()
            .with("a:1", mined_chain().to_vec())
            .with("t:1", mined_chain()[..2].to_vec());

        let outcome = node
            .resolve_consensus(&stub, Some(&["http://t:1/"][..]))
            .await
            .unwrap();

        assert!(outcome.replaced);
        assert_eq!(outcome.chain.len(), 2);
        assert_eq!(*stub.asked.borrow(), vec!["t:1".to_string()]);
        // Targets are not registered.
        assert_eq!(node.peers(), vec!["a:1"]);
    }

    #[actix_web::test]
    async fn resolve_keeps_pending_transactions() {
        let node = node();
        node.submit_transaction(Transaction::new("a", "b", 1, None));
        let stub = StubPeers::default().with("a:1", mined_chain().to_vec());

        let outcome = node.resolve_consensus(&stub, Some(&["a:1"][..])).await.unwrap();

        assert!(outcome.replaced);
        assert_eq!(node.ledger().pending().len(), 1);
    }

    #[test]
    fn persist_then_restore_round_trips() {
        let dir = TempDir::new().unwrap();
        let source = node_with_chain(mined_chain());
        source.register_peers(&["a:1"]).unwrap();

        assert_eq!(source.persist(dir.path()).unwrap(), vec![1, 2, 3, 4]);
        assert!(source.persist(dir.path()).unwrap().is_empty());

        let target = node();
        assert_eq!(target.restore(dir.path()).unwrap(), 4);
        assert_eq!(target.chain_snapshot().chain, mined_chain());
        assert_eq!(target.peers(), vec!["a:1"]);
        // Restored blocks count as written.
        assert!(target.persist(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn persist_after_replacement_rewrites_everything() {
        let dir = TempDir::new().unwrap();
        let node = node_with_chain(&mined_chain()[..2]);
        assert_eq!(node.persist(dir.path()).unwrap(), vec![1, 2]);

        node.ledger().replace_chain(mined_chain().to_vec());
        assert_eq!(node.persist(dir.path()).unwrap(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn restore_from_empty_dir_is_a_no_op() {
        let dir = TempDir::new().unwrap();
        let node = node();
        assert_eq!(node.restore(dir.path()).unwrap(), 0);
        assert_eq!(node.chain_snapshot().length, 1);
    }

    #[test]
    fn restore_is_all_or_nothing() {
        let dir = TempDir::new().unwrap();
        node_with_chain(mined_chain()).persist(dir.path()).unwrap();
        fs::remove_file(dir.path().join("db3.json")).unwrap();

        let node = node();
        assert!(matches!(
            node.restore(dir.path()),
            Err(NodeError::MissingBlock(3))
        ));
        assert_eq!(node.chain_snapshot().length, 1);
    }

    #[test]
    fn restore_rejects_an_invalid_chain() {
        let dir = TempDir::new().unwrap();
        let mut tampered = mined_chain().to_vec();
        tampered[2].proof = 0;
        node_with_chain(&tampered).persist(dir.path()).unwrap();

        let node = node();
        assert!(matches!(node.restore(dir.path()), Err(NodeError::InvalidChain)));
        assert_eq!(node.chain_snapshot().length, 1);
    }

    #[test]
    fn persist_waits_for_the_write_in_progress() {
        let dir = TempDir::new().unwrap();
        let node = Arc::new(node_with_chain(&mined_chain()[..3]));

        // Another save holds the store; the chain is replaced meanwhile.
        let writing = node.persist_lock.lock().unwrap();
        let saver = {
            let node = Arc::clone(&node);
            let path = dir.path().to_path_buf();
            thread::spawn(move || node.persist(&path))
        };
        thread::sleep(Duration::from_millis(50));
        assert!(!dir.path().join("index.list").exists());
        node.ledger().replace_chain(longer_chain(1));
        drop(writing);

        assert_eq!(saver.join().unwrap().unwrap(), vec![1, 2, 3, 4, 5]);
        let restored = self::node();
        assert_eq!(restored.restore(dir.path()).unwrap(), 5);
    }

    #[test]
    fn concurrent_saves_across_replacement_leave_a_loadable_store() {
        let dir = TempDir::new().unwrap();
        let node = Arc::new(node_with_chain(&mined_chain()[..3]));
        let five = longer_chain(1);

        let savers: Vec<_> = (0..4)
            .map(|_| {
                let node = Arc::clone(&node);
                let path = dir.path().to_path_buf();
                thread::spawn(move || {
                    for _ in 0..10 {
                        node.persist(&path).unwrap();
                    }
                })
            })
            .collect();
        node.ledger().replace_chain(five.clone());
        for saver in savers {
            saver.join().unwrap();
        }
        node.persist(dir.path()).unwrap();

        let restored = self::node();
        assert_eq!(restored.restore(dir.path()).unwrap(), 5);
        assert_eq!(restored.chain_snapshot().chain, five);
    }

    #[test]
    fn restore_rejects_unusable_peer_addresses() {
        let dir = TempDir::new().unwrap();
        node_with_chain(mined_chain()).persist(dir.path()).unwrap();
        fs::write(dir.path().join("nodes.list"), br#"["a:1", "http://"]"#).unwrap();

        let node = node();
        node.register_peers(&["b:2"]).unwrap();
        assert!(matches!(node.restore(dir.path()), Err(NodeError::InvalidPeer(_))));
        assert_eq!(node.chain_snapshot().length, 1);
        assert_eq!(node.peers(), vec!["b:2"]);
    }
}
