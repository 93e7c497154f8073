use actix_web::{HttpResponse, Responder, get, web};

use super::models::StatsResponse;
use crate::blockchain::PROOF_TARGET;
use crate::node::Node;

#[get("/stats/")]
pub async fn get_stats(state: web::Data<Node>) -> impl Responder {
    let ledger = state.ledger();
    HttpResponse::Ok().json(StatsResponse {
        node_id: state.config().node_id.clone(),
        height: ledger.len(),
        tip_hash: ledger.tip().canonical_hash(),
        proof_target: PROOF_TARGET,
        pending_size: ledger.pending().len(),
        peers: ledger.peers().len(),
    })
}
