//! List containers from the Docker administrative socket.
//!
//! One GET against `/var/run/docker.sock`, printed as an indented listing.
//! Any failure (socket unreachable, non-2xx answer, undecodable body) goes
//! to stderr and exits with status 1.

use localpeek::docker;
use localpeek::{IpcHttpClient, Result};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run().await {
        eprintln!("Failed to list containers: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let client = IpcHttpClient::new(docker::DOCKER_SOCKET)?;
    // all=true to see stopped containers too
    let containers = docker::list_containers(&client, true).await?;
    print!("{}", docker::render_containers(&containers));
    Ok(())
}
