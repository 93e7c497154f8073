//! Node configuration read from the environment (and `.env` via dotenvy).

use log::warn;
use std::net::IpAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub host: String,
    pub port: u16,
    /// Identity credited with mining rewards.
    pub node_id: String,
    pub chain_dir: PathBuf,
    pub peer_timeout: Duration,
    /// Zero disables the background sync task.
    pub sync_interval: Duration,
    /// Zero disables the reward transaction.
    pub mining_reward: u64,
    pub bootstrap_peers: Vec<String>,
    /// Address other nodes should use to reach this one.
    pub advertise_addr: String,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl NodeConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key/value source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let port = parsed(&lookup, "PORT", 8080u16);
        let node_id = lookup("NODE_ID")
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| Uuid::new_v4().simple().to_string());
        let chain_dir = lookup("CHAIN_DIR").unwrap_or_else(|| "chain_data".to_string());
        let bootstrap_peers = lookup("BOOTSTRAP_PEERS")
            .map(|list| {
                list.split(',')
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();
        let advertise_addr = lookup("ADVERTISE_ADDR").unwrap_or_else(|| {
            if is_unspecified_host(&host) {
                warn!("CONFIG - HOST={host} is not reachable by peers; set ADVERTISE_ADDR");
            }
            format!("{host}:{port}")
        });

        Self {
            node_id,
            chain_dir: PathBuf::from(chain_dir),
            peer_timeout: Duration::from_secs(parsed(&lookup, "PEER_TIMEOUT_SECS", 5)),
            sync_interval: Duration::from_secs(parsed(&lookup, "SYNC_INTERVAL_SECS", 0)),
            mining_reward: parsed(&lookup, "MINING_REWARD", 0),
            bootstrap_peers,
            advertise_addr,
            host,
            port,
        }
    }
}

/// Wildcard bind addresses such as `0.0.0.0` or `[::]`.
fn is_unspecified_host(host: &str) -> bool {
    host.trim_start_matches('[')
        .trim_end_matches(']')
        .parse::<IpAddr>()
        .is_ok_and(|ip| ip.is_unspecified())
}

fn parsed<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + Copy + std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("CONFIG - {key}={raw:?} is not valid, using {default}");
            default
        }),
        None => default,
    }
}
