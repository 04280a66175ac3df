use std::{net::SocketAddr, path::PathBuf};

use clap::Parser;

/// Anthropic-to-OpenAI protocol translation proxy.
#[derive(Debug, Parser)]
#[command(name = "janus", version)]
pub(crate) struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long, env = "JANUS_CONFIG", default_value = "janus.toml")]
    pub config: PathBuf,

    /// Address to listen on; overrides the configuration file.
    #[arg(short, long, env = "JANUS_LISTEN")]
    pub listen: Option<SocketAddr>,

    /// Log filter, e.g. "info" or "server=debug,translate=debug".
    #[arg(long, env = "JANUS_LOG", default_value = "info")]
    pub log_level: String,
}
