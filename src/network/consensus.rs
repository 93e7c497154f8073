//! Longest-valid-chain selection across peers.

use log::{debug, info};

use super::ChainSource;
use crate::blockchain::{Block, validate_chain};

/// Ask every peer in `peers` for its chain and return the longest valid one
/// that is strictly longer than `local_len`.
///
/// Unreachable peers, malformed answers and invalid chains are skipped. When
/// several peers beat the local length, each later candidate must beat the
/// best one found so far, so the first of equally long chains wins. The order
/// in which `peers` yields addresses is whatever the caller supplies.
pub async fn select_longest<'a, S, I>(
    source: &S,
    peers: I,
    local_len: usize,
) -> Option<Vec<Block>>
where
    S: ChainSource,
    I: IntoIterator<Item = &'a String>,
{
    let mut best_len = local_len;
    let mut best: Option<Vec<Block>> = None;

    for peer in peers {
        let snapshot = match source.fetch_chain(peer).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                debug!("CONSENSUS - skipping {peer}: {e}");
                continue;
            }
        };

        if snapshot.length != snapshot.chain.len() {
            debug!(
                "CONSENSUS - skipping {peer}: reported length {} but sent {} blocks",
                snapshot.length,
                snapshot.chain.len()
            );
            continue;
        }

        if snapshot.length <= best_len {
            debug!("CONSENSUS - {peer} is not longer ({} <= {best_len})", snapshot.length);
            continue;
        }

        if !validate_chain(&snapshot.chain) {
            debug!("CONSENSUS - {peer} sent an invalid chain of {} blocks", snapshot.length);
            continue;
        }

        info!("CONSENSUS - {peer} offers a valid chain of {} blocks", snapshot.length);
        best_len = snapshot.length;
        best = Some(snapshot.chain);
    }

    best
}
