use std::process::exit;

use log::{error, info};
use taint_reaper_core::{
    kubernetes::KubeNodeStore,
    reconciler::{runner::ReconcileLoop, TaintReconciler},
};
use tokio::sync::watch;

use crate::{
    helpers::{create_client, get_reconciler_config},
    node_watch::start_node_watch,
    shutdown::wait_for_signal,
};

mod helpers;
mod node_watch;
mod shutdown;

#[tokio::main()]
async fn main() {
    configure_logger();

    let config = get_reconciler_config();
    let client = create_client().await;

    let (refresh_tx, refresh_rx) = watch::channel(());
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let node_watch = start_node_watch(&client, &config, refresh_tx);
    let reconciler = TaintReconciler::new(KubeNodeStore::new(client), config);
    let mut reconcile_loop = ReconcileLoop::new(reconciler, refresh_rx, shutdown_rx);

    tokio::spawn(async move {
        if let Err(error) = wait_for_signal().await {
            error!("Couldn't listen for termination signals! {error:?}");
            exit(9)
        }

        info!("Termination signal received, shutting down...");
        let _ = shutdown_tx.send(true);
    });

    tokio::select! {
        _ = reconcile_loop.start() => (),
        _ = node_watch => error!("Node watch has stopped unexpectedly!"),
    }
}

fn configure_logger() {
    env_logger::builder()
        .default_format()
        .format_module_path(false)
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init()
}
