use anyhow::Context;
use tokio::signal;

#[cfg(unix)]
pub async fn wait_for_signal() -> anyhow::Result<()> {
    let mut terminate = signal::unix::signal(signal::unix::SignalKind::terminate())
        .context("Couldn't install SIGTERM handler!")?;

    tokio::select! {
        result = signal::ctrl_c() => result.context("Couldn't listen for Ctrl-C!"),
        _ = terminate.recv() => Ok(()),
    }
}

#[cfg(not(unix))]
pub async fn wait_for_signal() -> anyhow::Result<()> {
    signal::ctrl_c().await.context("Couldn't listen for Ctrl-C!")
}
