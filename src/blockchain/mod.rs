pub mod block;
pub mod ledger;
pub mod pow;
pub mod validation;

#[cfg(test)]
pub mod fixtures;

pub use block::Block;
pub use ledger::{ChainSnapshot, Ledger};
pub use validation::validate_chain;

/// Proof carried by every genesis block.
pub const GENESIS_PROOF: u64 = 100;

/// `previous_hash` of the genesis block.
pub const GENESIS_PREVIOUS_HASH: &str = "1";

/// Hex prefix a proof digest must start with. Fixed: difficulty never adjusts.
pub const PROOF_TARGET: &str = "1926";
