use std::process::exit;

use kube::Client;
use log::{error, info};
use taint_reaper_core::reconciler::config::ReconcilerConfig;

pub async fn create_client() -> Client {
    match Client::try_default().await {
        Ok(client) => client,
        Err(error) => {
            error!("Couldn't create client! {error:?}");
            exit(6)
        }
    }
}

pub fn get_reconciler_config() -> ReconcilerConfig {
    match ReconcilerConfig::from_env() {
        Ok(config) => {
            info!(
                "Nodes labeled '{}' lose their '{}' taint after {:?} of readiness, checking every {:?}",
                config.registered_label,
                config.marker_taint_key,
                config.stabilization_window,
                config.requeue_interval
            );
            config
        }
        Err(error) => {
            error!("Couldn't load configuration! {error}");
            exit(7)
        }
    }
}
