//! Print the mesh daemon status from the tailscaled local API socket.
//!
//! One GET against `/var/run/tailscale/tailscaled.sock`, printed as a
//! per-peer summary. Failures go to stderr with remediation hints and exit
//! with status 1.

use localpeek::tailscale::{self, LOCALAPI_HOST, TAILSCALED_SOCKET};
use localpeek::{ClientConfig, IpcHttpClient, Result};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run().await {
        eprintln!("Failed to get Tailscale status: {}", e);
        eprintln!();
        eprintln!("Make sure:");
        eprintln!("  1. Tailscale is installed and running");
        eprintln!("  2. The socket exists at {}", TAILSCALED_SOCKET);
        eprintln!("  3. You have permission to access the socket");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let config = ClientConfig {
        host: LOCALAPI_HOST.to_string(),
    };
    let client = IpcHttpClient::with_config(TAILSCALED_SOCKET, config)?;
    let status = tailscale::fetch_status(&client).await?;
    print!("{}", tailscale::render_status(&status));
    Ok(())
}
