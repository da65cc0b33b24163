use std::sync::Arc;

use tinyweb::config::Config;
use tinyweb::http::resolver::Resolver;
use tinyweb::server;
use tinyweb::users::{UserFile, UserStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let cfg = Config::load()?;

    let users = UserStore::load(Box::new(UserFile::new(&cfg.users.path)))?;
    tracing::info!(users = users.len(), path = %cfg.users.path.display(), "Loaded user table");

    let resolver = Arc::new(Resolver::new(&cfg.site.doc_root, Arc::new(users)));
    tracing::info!(doc_root = %cfg.site.doc_root.display(), "Serving files");

    tokio::select! {
        res = server::listener::run(&cfg, resolver) => {
            res?;
        }

        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}
