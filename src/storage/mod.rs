//! On-disk chain layout:
//!
//! - `index.list`: JSON integer, number of blocks
//! - `db{position}.json`: one block per file, zero-based position
//! - `nodes.list`: JSON array of peer addresses

use log::{debug, info};
use serde::de::DeserializeOwned;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::blockchain::Block;
use crate::error::{NodeError, Result};

pub const COUNT_FILE: &str = "index.list";
pub const PEERS_FILE: &str = "nodes.list";

/// Chain and peers read back from disk.
#[derive(Debug)]
pub struct StoredChain {
    pub chain: Vec<Block>,
    pub peers: Vec<String>,
}

/// File-per-block store rooted at a directory.
pub struct ChainStore {
    dir: PathBuf,
}

impl ChainStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn block_path(&self, position: usize) -> PathBuf {
        self.dir.join(format!("db{position}.json"))
    }

    /// Write `chain` and `peers`. Block files before `already_written` are
    /// skipped unless missing on disk. Returns the indices of the blocks
    /// written by this call.
    pub fn save(
        &self,
        chain: &[Block],
        peers: &[String],
        already_written: usize,
    ) -> Result<Vec<u64>> {
        fs::create_dir_all(&self.dir)?;

        let mut written = Vec::new();
        for (position, block) in chain.iter().enumerate() {
            let path = self.block_path(position);
            if position < already_written && path.exists() {
                continue;
            }
            fs::write(&path, serde_json::to_vec(block)?)?;
            written.push(block.index);
        }

        fs::write(self.dir.join(COUNT_FILE), serde_json::to_vec(&chain.len())?)?;
        fs::write(self.dir.join(PEERS_FILE), serde_json::to_vec(peers)?)?;

        debug!(
            "STORE - wrote {} block file(s) to {} (chain length {})",
            written.len(),
            self.dir.display(),
            chain.len()
        );
        Ok(written)
    }

    /// Read the stored chain. `Ok(None)` if nothing was ever saved here; any
    /// missing or unreadable block file fails the whole load.
    pub fn load(&self) -> Result<Option<StoredChain>> {
        let count_path = self.dir.join(COUNT_FILE);
        let count: usize = match read_json(&count_path) {
            Ok(count) => count,
            Err(NodeError::Io(e)) if e.kind() == ErrorKind::NotFound => {
                debug!("STORE - no {} in {}", COUNT_FILE, self.dir.display());
                return Ok(None);
            }
            Err(e) => return Err(e),
        };
        if count == 0 {
            return Err(corrupt(&count_path, "block count is zero"));
        }

        let mut chain = Vec::with_capacity(count);
        for position in 0..count {
            let block: Block = match read_json(&self.block_path(position)) {
                Ok(block) => block,
                Err(NodeError::Io(e)) if e.kind() == ErrorKind::NotFound => {
                    return Err(NodeError::MissingBlock(position));
                }
                Err(e) => return Err(e),
            };
            chain.push(block);
        }

        let peers_path = self.dir.join(PEERS_FILE);
        let peers: Vec<String> = match read_json(&peers_path) {
            Ok(peers) => peers,
            Err(NodeError::Io(e)) if e.kind() == ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e),
        };

        info!(
            "STORE - loaded {} blocks and {} peers from {}",
            chain.len(),
            peers.len(),
            self.dir.display()
        );
        Ok(Some(StoredChain { chain, peers }))
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = fs::read(path)?;
    serde_json::from_slice(&bytes).map_err(|e| corrupt(path, e))
}

fn corrupt(path: &Path, reason: impl ToString) -> NodeError {
    NodeError::CorruptStore {
        path: path.display().to_string(),
        reason: reason.to_string(),
    }
}
