//! rcon-client: interactive remote console.
//!
//! Reads the server address and password from a TOML file (first argument,
//! default `rcon.toml`; `--init [path]` writes a starter file), logs in, then:
//!
//! ```text
//! main()
//!  └─ connect()            -- UDP socket + session task
//!  └─ login()
//!  └─ console loop
//!       ├─ stdin line        -> send_command, response printed when it arrives
//!       ├─ server message    -> printed as it arrives
//!       ├─ disconnect event  -> exit
//!       └─ Ctrl-C / EOF      -> disconnect, exit
//! ```
//!
//! `RUST_LOG` overrides the log level from the config file.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use rcon_client::connect;
use rcon_client::infrastructure::storage::config::ClientConfig;

const DEFAULT_CONFIG_PATH: &str = "rcon.toml";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let first = args.next();
    if first.as_deref() == Some("--init") {
        let path = args
            .next()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
        return write_starter_config(&path);
    }

    let config_path = first
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let config = ClientConfig::load(&config_path)
        .with_context(|| format!("loading config from {}", config_path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let rcon = config.to_rcon_config();
    info!(host = %rcon.host, port = rcon.port, "rcon-client starting");

    let client = connect(&rcon).await.context("opening RCON transport")?;
    let mut messages = client.subscribe_messages();
    let mut disconnects = client.subscribe_disconnects();

    if !client.login().await.context("logging in")? {
        bail!("server rejected the RCON password");
    }
    info!("logged in; type commands, Ctrl-D to quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => match line.context("reading stdin")? {
                Some(line) => {
                    let command = line.trim().to_string();
                    if command.is_empty() {
                        continue;
                    }
                    let response = client.send_command(command.clone());
                    tokio::spawn(async move {
                        match response.await {
                            Ok(text) => println!("{text}"),
                            Err(e) => error!(%command, "command failed: {e}"),
                        }
                    });
                }
                None => break,
            },
            Some(message) = messages.recv() => println!("[server] {message}"),
            Some(reason) = disconnects.recv() => {
                warn!(?reason, "session ended");
                return Ok(());
            }
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown signal received");
                break;
            }
        }
    }

    client.disconnect().await;
    info!("rcon-client stopped");
    Ok(())
}

/// `rcon-client --init [path]`: writes a starter config without overwriting.
fn write_starter_config(path: &Path) -> anyhow::Result<()> {
    if path.exists() {
        bail!("{} already exists", path.display());
    }
    ClientConfig::starter()
        .save(path)
        .with_context(|| format!("writing config to {}", path.display()))?;
    println!("wrote {}; set server.password before connecting", path.display());
    Ok(())
}
