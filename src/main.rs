mod api;
mod blockchain;
mod config;
mod error;
mod network;
mod node;
mod storage;
mod transaction;

use actix_web::{App, HttpServer, rt, web};
use dotenvy::dotenv;
use log::{info, warn};
use std::fs;
use std::io;

use config::NodeConfig;
use network::HttpPeerClient;
use node::Node;

#[actix_web::main]
async fn main() -> io::Result<()> {
    let _ = dotenv();
    env_logger::init();

    let config = NodeConfig::from_env();
    let (host, port) = (config.host.clone(), config.port);
    let state = web::Data::new(Node::new(config));

    bootstrap(&state).await?;
    spawn_sync_task(state.clone());
    spawn_shutdown_watch(state.clone());

    info!(
        "⛓️ Starting ledger node {} at http://{host}:{port}",
        state.config().node_id
    );

    let app_state = state.clone();
    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .configure(api::init_routes)
    })
    .bind((host.as_str(), port))?
    .run()
    .await?;

    state.shutdown();
    Ok(())
}

/// Restore from disk, register configured peers, sync once, save.
async fn bootstrap(state: &web::Data<Node>) -> io::Result<()> {
    let config = state.config();
    if !config.chain_dir.exists() {
        warn!(
            "Data path {} not found, setting up for the first run",
            config.chain_dir.display()
        );
        fs::create_dir_all(&config.chain_dir)?;
    }

    let restored = state.restore(&config.chain_dir).map_err(io::Error::other)?;
    info!("STORE - {restored} block(s) restored");

    state
        .register_peers(config.bootstrap_peers.as_slice())
        .map_err(io::Error::other)?;

    let client = HttpPeerClient::new(config.peer_timeout);
    match state.resolve_consensus::<_, String>(&client, None).await {
        Ok(outcome) if outcome.replaced => {
            info!("CONSENSUS - adopted a peer chain of {} blocks", outcome.chain.len())
        }
        Ok(_) => {}
        Err(e) => warn!("CONSENSUS - initial sync failed: {e}"),
    }

    state.persist(&config.chain_dir).map_err(io::Error::other)?;
    Ok(())
}

/// Resolve against every registered peer on a fixed interval.
fn spawn_sync_task(state: web::Data<Node>) {
    let every = state.config().sync_interval;
    if every.is_zero() {
        return;
    }

    rt::spawn(async move {
        let client = HttpPeerClient::new(state.config().peer_timeout);
        let mut ticker = rt::time::interval(every);
        // The first tick fires immediately; startup already synced.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            if let Err(e) = state.resolve_consensus::<_, String>(&client, None).await {
                warn!("CONSENSUS - periodic sync failed: {e}");
            }
        }
    });
}

/// Cancel in-flight proof searches as soon as Ctrl-C arrives, so graceful
/// shutdown does not wait on them.
fn spawn_shutdown_watch(state: web::Data<Node>) {
    rt::spawn(async move {
        if rt::signal::ctrl_c().await.is_ok() {
            info!("Shutdown requested, cancelling mining");
            state.shutdown();
        }
    });
}
