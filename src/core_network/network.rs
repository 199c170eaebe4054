use crate::server::ServerContext;
use crate::session::handle_session;
use anyhow::Result;
use log::{error, info};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;

/// Accepts connections until `stop` turns true, one task per session.
pub async fn accept_loop(
    listener: TcpListener,
    context: Arc<ServerContext>,
    mut stop: watch::Receiver<bool>,
) -> Result<()> {
    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (socket, addr) = match accepted {
                    Ok(accepted) => accepted,
                    Err(e) => {
                        error!("Failed to accept connection: {}", e);
                        continue;
                    }
                };
                info!("New connection from {}", addr);
                if let Err(e) = socket.set_nodelay(true) {
                    error!("Failed to set TCP_NODELAY for {}: {}", addr, e);
                }
                tokio::spawn(handle_session(Arc::clone(&context), Box::new(socket), addr));
            }
            changed = stop.changed() => {
                if changed.is_err() || *stop.borrow() {
                    info!("No longer accepting connections");
                    return Ok(());
                }
            }
        }
    }
}
