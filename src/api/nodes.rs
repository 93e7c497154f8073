use actix_web::{HttpResponse, Responder, get, post, web};
use log::{info, warn};

use super::error_response;
use super::models::{NodesRequest, NodesResponse, RegisterResponse, ResolveResponse};
use crate::network::HttpPeerClient;
use crate::node::Node;

/// List registered peers.
#[get("/nodes/")]
pub async fn list_nodes(state: web::Data<Node>) -> impl Responder {
    let nodes = state.peers();
    HttpResponse::Ok().json(NodesResponse {
        length: nodes.len(),
        nodes,
    })
}

/// Register peers, then sync with all of them.
#[post("/nodes/register/")]
pub async fn register_nodes(
    state: web::Data<Node>,
    body: web::Json<NodesRequest>,
) -> impl Responder {
    let total_nodes = match state.register_peers(body.nodes.as_slice()) {
        Ok(nodes) => nodes,
        Err(e) => {
            warn!("POST /nodes/register/ - rejected: {e}");
            return error_response(&e);
        }
    };
    info!("POST /nodes/register/ - {} peer(s) known", total_nodes.len());

    let client = HttpPeerClient::new(state.config().peer_timeout);
    let sync_replaced = match state.resolve_consensus::<_, String>(&client, None).await {
        Ok(outcome) => outcome.replaced,
        Err(e) => {
            warn!("CONSENSUS - sync after registration failed: {e}");
            false
        }
    };

    HttpResponse::Created().json(RegisterResponse {
        message: "New nodes have been added",
        total_nodes,
        sync_replaced,
    })
}

/// Run consensus. An empty body resolves against every registered peer; a
/// body of `{"nodes": [...]}` resolves against exactly those addresses.
#[post("/nodes/resolve/")]
pub async fn resolve_nodes(state: web::Data<Node>, body: web::Bytes) -> impl Responder {
    let targets = if body.iter().all(u8::is_ascii_whitespace) {
        None
    } else {
        match serde_json::from_slice::<NodesRequest>(&body) {
            Ok(request) => Some(request.nodes),
            Err(_) => {
                return HttpResponse::BadRequest()
                    .body("Error: Please supply a valid list of nodes");
            }
        }
    };

    let client = HttpPeerClient::new(state.config().peer_timeout);
    let outcome = match state.resolve_consensus(&client, targets.as_deref()).await {
        Ok(outcome) => outcome,
        Err(e) => return error_response(&e),
    };

    HttpResponse::Ok().json(ResolveResponse {
        message: if outcome.replaced {
            "Our chain was replaced"
        } else {
            "Our chain is authoritative"
        },
        replaced: outcome.replaced,
        length: outcome.chain.len(),
        chain: outcome.chain,
    })
}
