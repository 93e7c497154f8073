use actix_web::http::Uri;
use std::collections::HashSet;

use crate::error::{NodeError, Result};

/// Registered peer endpoints in `host:port` form.
///
/// Iteration order is unspecified; nothing that walks the set may depend on it.
#[derive(Debug, Default, Clone)]
pub struct PeerSet {
    peers: HashSet<String>,
}

impl PeerSet {
    /// Normalize and insert `address`. Returns `true` if it was not known yet.
    pub fn register(&mut self, address: &str) -> Result<bool> {
        let peer = normalize_peer(address)?;
        Ok(self.peers.insert(peer))
    }

    /// Insert several addresses, all or nothing: if any address is invalid
    /// the set is left untouched.
    pub fn register_all<S: AsRef<str>>(&mut self, addresses: &[S]) -> Result<()> {
        let normalized = addresses
            .iter()
            .map(|a| normalize_peer(a.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        self.peers.extend(normalized);
        Ok(())
    }

    #[cfg(test)]
    pub fn contains(&self, peer: &str) -> bool {
        self.peers.contains(peer)
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.peers.iter()
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    /// Sorted copy, for responses and persistence.
    pub fn to_vec(&self) -> Vec<String> {
        let mut peers: Vec<String> = self.peers.iter().cloned().collect();
        peers.sort();
        peers
    }
}

/// Reduce `http://Host:5000/path`, `host:5000` and similar to `host:5000`.
/// A missing port defaults to the scheme's (80, or 443 for https).
pub fn normalize_peer(address: &str) -> Result<String> {
    let trimmed = address.trim();
    let invalid = || NodeError::InvalidPeer(address.to_string());
    if trimmed.is_empty() {
        return Err(invalid());
    }

    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("http://{trimmed}")
    };
    let uri: Uri = with_scheme.parse().map_err(|_| invalid())?;

    let host = uri.host().filter(|h| !h.is_empty()).ok_or_else(invalid)?;
    let authority = uri.authority().ok_or_else(invalid)?.as_str();
    let host_port = authority.rsplit('@').next().unwrap_or_default();
    // "[::1]" has colons but no port.
    let port_text = host_port
        .rsplit_once(':')
        .map(|(_, p)| p)
        .filter(|p| !p.contains(']'));
    let port = match (port_text, uri.port_u16()) {
        (Some(_), Some(port)) => port,
        (Some(_), None) => return Err(invalid()),
        (None, _) if uri.scheme_str() == Some("https") => 443,
        (None, _) => 80,
    };

    Ok(format!("{}:{port}", host.to_ascii_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_common_forms() {
        assert_eq!(normalize_peer("http://192.168.0.5:5000").unwrap(), "192.168.0.5:5000");
        assert_eq!(normalize_peer("http://192.168.0.5:5000/").unwrap(), "192.168.0.5:5000");
        assert_eq!(normalize_peer("localhost:5001").unwrap(), "localhost:5001");
        assert_eq!(normalize_peer("  Node-A:7000 ").unwrap(), "node-a:7000");
        assert_eq!(normalize_peer("http://example.com").unwrap(), "example.com:80");
        assert_eq!(normalize_peer("https://example.com/chain").unwrap(), "example.com:443");
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(normalize_peer(""), Err(NodeError::InvalidPeer(_))));
        assert!(matches!(normalize_peer("   "), Err(NodeError::InvalidPeer(_))));
        assert!(normalize_peer("http://").is_err());
        assert!(normalize_peer("host:notaport").is_err());
    }

    #[test]
    fn registration_is_idempotent() {
        let mut peers = PeerSet::default();
        assert!(peers.register("http://10.0.0.1:5000").unwrap());
        assert!(!peers.register("10.0.0.1:5000").unwrap());
        assert!(!peers.register("http://10.0.0.1:5000/").unwrap());
        assert_eq!(peers.len(), 1);
        assert!(peers.contains("10.0.0.1:5000"));
    }

    #[test]
    fn register_all_is_all_or_nothing() {
        let mut peers = PeerSet::default();
        assert!(peers.register_all(&["a:1", "", "b:2"]).is_err());
        assert!(peers.is_empty());

        peers.register_all(&["b:2", "a:1", "a:1"]).unwrap();
        assert_eq!(peers.to_vec(), vec!["a:1".to_string(), "b:2".to_string()]);
    }
}
