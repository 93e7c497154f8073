use actix_web::{HttpResponse, Responder, get, post, web};
use log::{debug, info, warn};

use super::error_response;
use super::models::{MineResponse, SaveResponse, ValidateResponse};
use crate::blockchain::validate_chain;
use crate::network::HttpPeerClient;
use crate::node::Node;

/// Get the full blockchain.
#[get("/chain/")]
pub async fn get_chain(state: web::Data<Node>) -> impl Responder {
    HttpResponse::Ok().json(state.chain_snapshot())
}

/// Validate the whole local chain.
#[get("/validate/")]
pub async fn validate_local_chain(state: web::Data<Node>) -> impl Responder {
    let ledger = state.ledger();
    HttpResponse::Ok().json(ValidateResponse {
        valid: validate_chain(ledger.chain()),
        length: ledger.len(),
    })
}

/// Mine a block from the pending queue:
/// - search the proof on the blocking pool (ledger unlocked meanwhile)
/// - seal, then save to the chain directory
/// - ask registered peers to resolve against us
#[post("/mine/")]
pub async fn mine_block(state: web::Data<Node>) -> impl Responder {
    let node = state.clone();
    let block = match web::block(move || node.mine()).await {
        Ok(Ok(block)) => block,
        Ok(Err(e)) => {
            warn!("MINER - {e}");
            return error_response(&e);
        }
        Err(e) => return HttpResponse::InternalServerError().body(e.to_string()),
    };

    let saved_blocks = match state.persist(&state.config().chain_dir) {
        Ok(written) => Some(written),
        Err(e) => {
            warn!("STORE - automatic save after block #{} failed: {e}", block.index);
            None
        }
    };

    announce(&state);

    HttpResponse::Ok().json(MineResponse {
        message: "New Block Forged",
        index: block.index,
        transactions: block.transactions,
        proof: block.proof,
        previous_hash: block.previous_hash,
        saved_blocks,
    })
}

/// Save the chain and peers to the configured directory.
#[post("/save/")]
pub async fn save_chain(state: web::Data<Node>) -> impl Responder {
    match state.persist(&state.config().chain_dir) {
        Ok(saved_blocks) => {
            info!("STORE - saved {} block file(s)", saved_blocks.len());
            HttpResponse::Ok().json(SaveResponse {
                message: "Chain state saved",
                saved_blocks,
            })
        }
        Err(e) => {
            warn!("STORE - save failed: {e}");
            error_response(&e)
        }
    }
}

/// Fire-and-forget: each peer is asked to pull our chain.
fn announce(state: &web::Data<Node>) {
    let peers = state.peers();
    if peers.is_empty() {
        return;
    }
    let ourselves = state.config().advertise_addr.clone();
    let timeout = state.config().peer_timeout;

    actix_web::rt::spawn(async move {
        let client = HttpPeerClient::new(timeout);
        for peer in peers {
            if let Err(e) = client.announce(&peer, &ourselves).await {
                debug!("ANNOUNCE - {e}");
            }
        }
    });
}
