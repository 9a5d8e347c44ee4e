//! Mesh daemon status via the tailscaled local API socket.
//!
//! One GET to `/localapi/v0/status`, decoded into a [`Status`] record and
//! rendered as a per-peer summary.

use std::fmt::Write;

use chrono::{DateTime, Local};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::errors::{LocalPeekError, Result};
use crate::http_client::Response;
use crate::ipc_http_client::IpcHttpClient;

/// Well-known path of the tailscaled local API socket
pub const TAILSCALED_SOCKET: &str = "/var/run/tailscale/tailscaled.sock";

/// Virtual hostname for local API requests. The daemon routes by socket, so
/// any name works; this one matches what the official clients send.
pub const LOCALAPI_HOST: &str = "local-tailscaled.sock";

/// Shown when a peer's owner is missing from the user mapping
const UNKNOWN_USER: &str = "Unknown";

/// The `/localapi/v0/status` document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Status {
    #[serde(rename = "Version")]
    pub version: String,
    #[serde(rename = "BackendState")]
    pub backend_state: String,
    #[serde(rename = "Self")]
    pub self_status: SelfStatus,
    /// Peers keyed by node public key, in document order
    #[serde(rename = "Peer", default)]
    pub peer: IndexMap<String, PeerStatus>,
    /// User profiles keyed by stringified user id
    #[serde(rename = "User", default)]
    pub user: IndexMap<String, UserProfile>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelfStatus {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "TailscaleIPs", default)]
    pub tailscale_ips: Vec<String>,
    #[serde(rename = "HostName")]
    pub host_name: String,
    #[serde(rename = "DNSName")]
    pub dns_name: String,
    #[serde(rename = "UserID")]
    pub user_id: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerStatus {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "TailscaleIPs", default)]
    pub tailscale_ips: Vec<String>,
    #[serde(rename = "HostName")]
    pub host_name: String,
    #[serde(rename = "DNSName")]
    pub dns_name: String,
    #[serde(rename = "UserID")]
    pub user_id: i64,
    #[serde(rename = "Online", default)]
    pub online: bool,
    #[serde(rename = "OS", default)]
    pub os: String,
    /// ISO 8601; empty for peers the daemon has no sighting for
    #[serde(rename = "LastSeen", default)]
    pub last_seen: String,
    #[serde(rename = "Tags", default)]
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(rename = "ID")]
    pub id: i64,
    #[serde(rename = "DisplayName")]
    pub display_name: String,
    #[serde(rename = "ProfilePicURL", default)]
    pub profile_pic_url: String,
    #[serde(rename = "Roles", default)]
    pub roles: Vec<String>,
}

/// Fetch the daemon status.
///
/// A non-2xx answer has its full body read into the API error message,
/// unlike the container listing which keeps reason phrases only.
pub async fn fetch_status(client: &IpcHttpClient) -> Result<Status> {
    let response = client.get("/localapi/v0/status").send().await?;
    decode_status(&response)
}

fn decode_status(response: &Response) -> Result<Status> {
    if !response.is_success() {
        // Lossy so a garbled body cannot mask the API failure
        let body = String::from_utf8_lossy(response.body());
        return Err(LocalPeekError::api(
            response.status_code(),
            format!("Local API error {}: {}", response.status_code(), body),
        ));
    }
    response.json()
}

/// Resolve a peer's owner, falling back to a placeholder when the user
/// mapping has no entry for the id
pub fn display_name_for(status: &Status, user_id: i64) -> &str {
    status
        .user
        .get(user_id.to_string().as_str())
        .map(|u| u.display_name.as_str())
        .unwrap_or(UNKNOWN_USER)
}

/// Format the status summary. Pure; printing is the caller's business.
pub fn render_status(status: &Status) -> String {
    let mut out = String::new();

    let _ = writeln!(
        out,
        "Tailscale v{} - Backend: {}",
        status.version, status.backend_state
    );
    let _ = writeln!(out);

    let _ = writeln!(out, "📱 This device:");
    let _ = writeln!(out, "   {}", status.self_status.dns_name);
    let _ = writeln!(out, "   IPs: {}", status.self_status.tailscale_ips.join(", "));
    let _ = writeln!(out);

    let _ = writeln!(out, "🌐 {} peer device(s):", status.peer.len());
    let _ = writeln!(out);

    for peer in status.peer.values() {
        let marker = if peer.online { "● Online" } else { "○ Offline" };
        let user = display_name_for(status, peer.user_id);

        let _ = writeln!(out, "   {}", peer.dns_name);
        let _ = writeln!(out, "   IPs: {}", peer.tailscale_ips.join(", "));
        let _ = writeln!(out, "   Host: {} | OS: {}", peer.host_name, peer.os);
        let _ = writeln!(out, "   User: {} | {}", user, marker);

        if let Some(tags) = &peer.tags {
            if !tags.is_empty() {
                let _ = writeln!(out, "   Tags: {}", tags.join(", "));
            }
        }

        if let Some(last_seen) = format_last_seen(&peer.last_seen) {
            let _ = writeln!(out, "   Last seen: {}", last_seen);
        }

        let _ = writeln!(out);
    }

    out
}

/// Local rendering of a raw `LastSeen` value. `None` when the daemon sent an
/// empty string; unparseable values pass through verbatim rather than panic.
fn format_last_seen(raw: &str) -> Option<String> {
    if raw.is_empty() {
        return None;
    }
    match DateTime::parse_from_rfc3339(raw) {
        Ok(ts) => Some(ts.with_timezone(&Local).format("%c").to_string()),
        Err(_) => Some(raw.to_string()),
    }
}
