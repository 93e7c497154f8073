pub mod client;
pub mod consensus;
pub mod peers;

pub use client::{ChainSource, HttpPeerClient};
pub use peers::{PeerSet, normalize_peer};
