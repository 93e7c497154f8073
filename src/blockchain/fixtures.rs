//! Shared test chains. Mining is slow enough in debug builds that each
//! fixture is built once per test binary.

use std::sync::OnceLock;

use super::{Block, Ledger, pow};
use crate::transaction::Transaction;

/// Genesis plus three mined blocks, each carrying one transaction.
pub fn mined_chain() -> &'static [Block] {
    static CHAIN: OnceLock<Vec<Block>> = OnceLock::new();
    CHAIN.get_or_init(|| extend(&mut Ledger::new(), 3).chain().to_vec())
}

/// A chain that extends [`mined_chain`] by `extra` blocks.
pub fn longer_chain(extra: usize) -> Vec<Block> {
    let mut ledger = Ledger::new();
    ledger.replace_chain(mined_chain().to_vec());
    extend(&mut ledger, extra).chain().to_vec()
}

/// Mine `blocks` more blocks on top of `ledger`.
pub fn extend(ledger: &mut Ledger, blocks: usize) -> &mut Ledger {
    for _ in 0..blocks {
        let n = ledger.len();
        ledger.queue_transaction(Transaction::new(
            format!("sender-{n}"),
            format!("recipient-{n}"),
            n as u64,
            None,
        ));
        let proof = pow::search(ledger.tip().proof);
        ledger.append_block(proof);
    }
    ledger
}
