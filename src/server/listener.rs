use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;

use crate::config::Config;
use crate::http::resolver::Resolver;
use crate::http::{Connection, ConnectionState};
use crate::server::socket::Socket;

pub async fn run(cfg: &Config, resolver: Arc<Resolver>) -> anyhow::Result<()> {
    let listener = TcpListener::bind(&cfg.server.listen_addr)
        .await
        .with_context(|| format!("binding {}", cfg.server.listen_addr))?;
    info!("Listening on {}", cfg.server.listen_addr);
    serve(listener, cfg, resolver).await
}

/// Accepts connections on an already bound listener until it fails.
pub async fn serve(listener: TcpListener, cfg: &Config, resolver: Arc<Resolver>) -> anyhow::Result<()> {
    loop {
        let (socket, peer) = listener.accept().await?;
        info!("Accepted connection from {}", peer);

        let conn = Connection::with_capacity(
            Socket::new(socket),
            peer,
            resolver.clone(),
            cfg.server.read_buffer_size,
            cfg.server.write_buffer_size,
        );
        tokio::spawn(async move {
            if let Err(e) = drive(conn, peer).await {
                tracing::error!("Connection error from {}: {}", peer, e);
            }
        });
    }
}

/// Runs one connection until it asks to be closed.
///
/// Parsing and resolution may touch the filesystem and the user database,
/// so that pass runs on the blocking pool. The connection is moved there and
/// back, which keeps it owned by exactly one worker at a time.
async fn drive(mut conn: Connection<Socket>, peer: SocketAddr) -> anyhow::Result<()> {
    let mut state = ConnectionState::Reading;

    loop {
        state = match state {
            ConnectionState::Reading => {
                conn.socket().stream().readable().await?;
                if !conn.read_once() {
                    ConnectionState::Closed
                } else {
                    let (returned, next) = tokio::task::spawn_blocking(move || {
                        let next = conn.process();
                        (conn, next)
                    })
                    .await
                    .with_context(|| format!("processing request from {peer}"))?;
                    conn = returned;
                    next
                }
            }
            ConnectionState::Writing => {
                conn.socket().stream().writable().await?;
                conn.on_writable()
            }
            ConnectionState::Closed => break,
        };
    }

    conn.close();
    Ok(())
}
