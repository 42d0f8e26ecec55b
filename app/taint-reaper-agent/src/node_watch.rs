use futures::{Future, StreamExt};
use k8s_openapi::api::core::v1::Node;
use kube::{
    runtime::{
        watcher::{watcher, Config},
        WatchStreamExt,
    },
    Api, Client, ResourceExt,
};
use log::{debug, warn};
use taint_reaper_core::{nodes::has_taint, reconciler::config::ReconcilerConfig};
use tokio::sync::watch::Sender;

/// Watches registered nodes and pokes the reconciler whenever one that still
/// carries the marker taint changes.
///
/// The refresh channel only keeps the latest value, so a burst of node events
/// results in a single extra pass.
pub fn start_node_watch(
    client: &Client,
    config: &ReconcilerConfig,
    refresh: Sender<()>,
) -> impl Future<Output = ()> {
    let watcher_config = Config::default().labels(&config.registered_label);
    let marker_taint_key = config.marker_taint_key.clone();

    watcher(Api::<Node>::all(client.clone()), watcher_config)
        .default_backoff()
        .applied_objects()
        .for_each(move |node| {
            match node {
                Ok(node) if has_taint(&node, &marker_taint_key) => {
                    debug!("Marked node '{}' changed, requesting a pass...", node.name_any());
                    refresh.send_replace(());
                }
                Ok(_) => (),
                Err(error) => warn!("Node watch failed, retrying... {error}"),
            }

            std::future::ready(())
        })
}
