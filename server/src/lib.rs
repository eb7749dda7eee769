//! Library half of the exchange server binary, split out so
//! integration tests can drive a real listener without going through
//! `main()`.

pub mod config;
pub mod connection;

use engine::Engine;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

/// Runs the accept loop against an already-bound listener. Never
/// returns under normal operation; each accepted connection is handled
/// on its own task, so one slow client never blocks another.
pub async fn serve(listener: TcpListener, engine: Arc<Engine>) -> ! {
    let local_addr = listener.local_addr().ok();
    info!(?local_addr, "exchange server listening");

    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(pair) => pair,
            Err(e) => {
                error!(error = %e, "failed to accept connection");
                continue;
            }
        };
        let engine = engine.clone();
        tokio::spawn(async move {
            connection::handle_connection(stream, peer, engine).await;
        });
    }
}
