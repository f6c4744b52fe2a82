//! Server lifecycle: serve until shutdown, then close the database.

use std::future::Future;
use std::io;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::error;

use super::handlers::AppState;
use super::routes::create_router;

/// Serves `state` on `listener` until `signal` resolves, then closes the database.
///
/// The database is closed whether or not serving failed, under a fresh token
/// since the shutdown token is usually cancelled by then. A close failure is
/// logged; the serve result is returned.
pub async fn serve_and_close<F>(listener: TcpListener, state: AppState, signal: F) -> io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = create_router(state.clone());
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(signal)
        .await;

    if let Err(e) = state.database().close(&CancellationToken::new()).await {
        error!(component = "DATABASE", "Failed to close database: {}", e);
    }

    served
}
