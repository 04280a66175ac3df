use std::net::SocketAddr;

use clap::Parser;
use tokio_util::sync::CancellationToken;

use args::Args;

mod args;
mod logger;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    logger::init(&args.log_level);

    let config = config::Config::load(&args.config)?;

    let listen_address = args
        .listen
        .or(config.server.listen_address)
        .unwrap_or_else(default_listen_address);

    let shutdown_signal = CancellationToken::new();

    {
        let shutdown_signal = shutdown_signal.clone();

        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                shutdown_signal.cancel();
            }
        });
    }

    log::info!("janus {}", env!("CARGO_PKG_VERSION"));

    server::serve(server::ServeConfig {
        listen_address,
        config,
        shutdown_signal,
        bound_addr_sender: None,
    })
    .await
}

/// `PORT` environment compatibility, falling back to 0.0.0.0:8080.
fn default_listen_address() -> SocketAddr {
    let port = std::env::var("PORT")
        .ok()
        .and_then(|port| port.parse().ok())
        .unwrap_or(8080);

    SocketAddr::from(([0, 0, 0, 0], port))
}
