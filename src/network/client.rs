use actix_web::rt::time::timeout;
use log::debug;
use serde::Serialize;
use std::time::Duration;

use crate::blockchain::ChainSnapshot;
use crate::error::{NodeError, Result};

/// Largest chain document accepted from a peer.
const MAX_CHAIN_BYTES: usize = 64 * 1024 * 1024;

/// Somewhere peer chains can be fetched from.
#[allow(async_fn_in_trait)]
pub trait ChainSource {
    async fn fetch_chain(&self, peer: &str) -> Result<ChainSnapshot>;
}

/// Talks to other nodes over their HTTP API.
pub struct HttpPeerClient {
    client: awc::Client,
    timeout: Duration,
}

#[derive(Serialize)]
struct ResolveAgainst<'a> {
    nodes: [&'a str; 1],
}

impl HttpPeerClient {
    /// Must be created on an actix runtime thread.
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: awc::Client::builder().timeout(timeout).finish(),
            timeout,
        }
    }

    /// Ask `peer` to run consensus against `ourselves` right away.
    pub async fn announce(&self, peer: &str, ourselves: &str) -> Result<()> {
        let url = format!("http://{peer}/api/v1/nodes/resolve/");
        let body = ResolveAgainst { nodes: [ourselves] };
        let request = self.client.post(url).send_json(&body);

        let response = timeout(self.timeout, request)
            .await
            .map_err(|_| unavailable(peer, "timed out"))?
            .map_err(|e| unavailable(peer, e))?;

        debug!("ANNOUNCE - {peer} answered {}", response.status());
        Ok(())
    }
}

impl ChainSource for HttpPeerClient {
    async fn fetch_chain(&self, peer: &str) -> Result<ChainSnapshot> {
        let url = format!("http://{peer}/api/v1/chain/");

        let fetch = async {
            let mut response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|e| unavailable(peer, e))?;
            if !response.status().is_success() {
                return Err(unavailable(peer, format!("status {}", response.status())));
            }
            response
                .json::<ChainSnapshot>()
                .limit(MAX_CHAIN_BYTES)
                .await
                .map_err(|e| unavailable(peer, e))
        };

        timeout(self.timeout, fetch)
            .await
            .map_err(|_| unavailable(peer, "timed out"))?
    }
}

fn unavailable(peer: &str, reason: impl ToString) -> NodeError {
    NodeError::PeerUnavailable {
        peer: peer.to_string(),
        reason: reason.to_string(),
    }
}
