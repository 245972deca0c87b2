//! Graceful shutdown wiring.

use tokio_util::sync::CancellationToken;

/// Cancel `token` on the first Ctrl-C; force-exit on the second.
///
/// The first signal lets in-flight sync cycles run to completion; the
/// worker's supervisor joins its tasks and the process exits normally.
pub fn spawn_signal_handler(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            tracing::error!("failed to install Ctrl-C handler");
            return;
        }
        tracing::warn!("shutdown requested, finishing in-flight cycles (Ctrl-C again to force)");
        token.cancel();

        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::error!("forced shutdown");
            std::process::exit(130);
        }
    });
}
