mod chain;
mod health;
pub mod models;
mod nodes;
mod stats;
mod tx;

use actix_web::HttpResponse;
use actix_web::web::{self, ServiceConfig};

use crate::error::NodeError;

pub fn init_routes(cfg: &mut ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .service(health::health_check)
            .service(chain::get_chain)
            .service(chain::validate_local_chain)
            .service(chain::mine_block)
            .service(chain::save_chain)
            .service(tx::post_transaction)
            .service(tx::get_mempool)
            .service(nodes::list_nodes)
            .service(nodes::register_nodes)
            .service(nodes::resolve_nodes)
            .service(stats::get_stats),
    );
}

/// Map a node error onto an HTTP status: caller mistakes are 400, a mining
/// run cut short by shutdown is 503, anything else is 500.
pub(crate) fn error_response(e: &NodeError) -> HttpResponse {
    if e.is_client_error() {
        HttpResponse::BadRequest().body(e.to_string())
    } else if matches!(e, NodeError::MiningCancelled) {
        HttpResponse::ServiceUnavailable().body(e.to_string())
    } else {
        HttpResponse::InternalServerError().body(e.to_string())
    }
}
