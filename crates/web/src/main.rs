//! Runs the Warbler server.
use salvo::prelude::*;
use tracing_subscriber::EnvFilter;
use warbler::{Config, Error};

#[tokio::main]
async fn main() -> Result<(), Error> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warbler=info,salvo=info")),
        )
        .init();

    let config = Config::from_env()?;
    let (service, _) = warbler::build(&config).await?;

    tracing::info!(addr = %config.listen_addr, "listening");
    let acceptor = TcpListener::new(config.listen_addr.clone()).bind().await;
    Server::new(acceptor).serve(service).await;
    Ok(())
}
