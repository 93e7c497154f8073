use actix_web::{HttpResponse, Responder, get, post, web};
use log::{info, warn};

use super::models::{MempoolResponse, NewTxRequest, NewTxResponse};
use crate::node::Node;
use crate::transaction::Transaction;

/// Queue a transaction for the next block. Missing or mistyped fields are
/// rejected with 400 by the JSON extractor before reaching this handler.
#[post("/tx/")]
pub async fn post_transaction(
    state: web::Data<Node>,
    body: web::Json<NewTxRequest>,
) -> impl Responder {
    let NewTxRequest {
        sender,
        recipient,
        amount,
        message,
    } = body.into_inner();

    if sender.trim().is_empty() || recipient.trim().is_empty() {
        warn!("POST /tx/ - rejected: empty sender or recipient");
        return HttpResponse::BadRequest().body("sender and recipient are required");
    }

    let index = state.submit_transaction(Transaction::new(sender, recipient, amount, message));
    info!("POST /tx/ - queued for block #{index}");

    HttpResponse::Created().json(NewTxResponse {
        message: format!("Transaction will be added to Block {index}"),
        index,
    })
}

/// List transactions waiting for the next block.
#[get("/mempool/")]
pub async fn get_mempool(state: web::Data<Node>) -> impl Responder {
    let ledger = state.ledger();
    HttpResponse::Ok().json(MempoolResponse {
        size: ledger.pending().len(),
        transactions: ledger.pending().to_vec(),
    })
}
