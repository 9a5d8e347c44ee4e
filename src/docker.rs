//! Container listing against the Docker administrative socket.
//!
//! One GET to `/containers/json`, decoded into [`ContainerSummary`] records
//! and rendered as an indented text listing.

use std::fmt::Write;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::errors::{LocalPeekError, Result};
use crate::http_client::Response;
use crate::ipc_http_client::IpcHttpClient;

/// Well-known path of the Docker administrative socket
pub const DOCKER_SOCKET: &str = "/var/run/docker.sock";

/// One entry of the `/containers/json` listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerSummary {
    #[serde(rename = "Id")]
    pub id: String,
    /// Non-empty; Docker prefixes each name with a slash
    #[serde(rename = "Names")]
    pub names: Vec<String>,
    #[serde(rename = "Image")]
    pub image: String,
    #[serde(rename = "ImageID")]
    pub image_id: String,
    #[serde(rename = "Command")]
    pub command: String,
    #[serde(rename = "Created")]
    pub created: i64,
    #[serde(rename = "State")]
    pub state: String,
    #[serde(rename = "Status")]
    pub status: String,
    #[serde(rename = "Ports", default)]
    pub ports: Vec<PortMapping>,
    #[serde(rename = "Labels", default)]
    pub labels: IndexMap<String, String>,
    #[serde(rename = "Mounts", default)]
    pub mounts: Vec<MountPoint>,
    #[serde(rename = "NetworkSettings", default)]
    pub network_settings: NetworkSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortMapping {
    /// Bind address; absent for ports that are exposed but not published
    #[serde(rename = "IP", default)]
    pub ip: Option<String>,
    #[serde(rename = "PrivatePort")]
    pub private_port: u16,
    #[serde(rename = "PublicPort", default)]
    pub public_port: Option<u16>,
    #[serde(rename = "Type")]
    pub protocol: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MountPoint {
    #[serde(rename = "Type")]
    pub mount_type: String,
    /// Volume name; bind mounts have none
    #[serde(rename = "Name", default)]
    pub name: Option<String>,
    #[serde(rename = "Source")]
    pub source: String,
    #[serde(rename = "Destination")]
    pub destination: String,
    #[serde(rename = "Mode")]
    pub mode: String,
    #[serde(rename = "RW")]
    pub rw: bool,
}

/// Attached network endpoints, keyed by network name.
/// Empty for host-networked containers.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NetworkSettings {
    #[serde(rename = "Networks", default)]
    pub networks: IndexMap<String, EndpointSettings>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointSettings {
    #[serde(rename = "NetworkID")]
    pub network_id: String,
    #[serde(rename = "Gateway")]
    pub gateway: String,
    #[serde(rename = "IPAddress")]
    pub ip_address: String,
    #[serde(rename = "MacAddress")]
    pub mac_address: String,
}

/// Request path for the container listing. `all` includes stopped containers.
pub fn containers_path(all: bool) -> String {
    if all {
        "/containers/json?all=true".to_string()
    } else {
        "/containers/json".to_string()
    }
}

/// List containers via the administrative socket.
///
/// A non-2xx answer becomes an API error carrying the status and its reason
/// phrase; the body is not consulted.
pub async fn list_containers(
    client: &IpcHttpClient,
    all: bool,
) -> Result<Vec<ContainerSummary>> {
    let response = client.get(&containers_path(all)).send().await?;
    decode_containers(&response)
}

fn decode_containers(response: &Response) -> Result<Vec<ContainerSummary>> {
    if !response.is_success() {
        return Err(LocalPeekError::api(
            response.status_code(),
            format!(
                "Docker API error: {} {}",
                response.status_code(),
                response.status().canonical_reason().unwrap_or("")
            ),
        ));
    }
    response.json()
}

/// Format the listing. Pure; printing is the caller's business.
pub fn render_containers(containers: &[ContainerSummary]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Found {} containers:", containers.len());
    let _ = writeln!(out);

    for container in containers {
        let _ = writeln!(out, "  {}", container.names.join(", "));
        let _ = writeln!(out, "    Image: {}", container.image);
        let _ = writeln!(out, "    Status: {}", container.status);
        let _ = writeln!(out, "    ID: {}", short_id(&container.id));
        let _ = writeln!(out);
    }

    out
}

/// First 12 characters of a container identifier, the usual display form
fn short_id(id: &str) -> &str {
    id.get(..12).unwrap_or(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{HeaderMap, StatusCode, Version};

    fn sample_listing() -> &'static str {
        r#"[
            {
                "Id": "abcdef0123456789full",
                "Names": ["/web", "/web-alias"],
                "Image": "nginx:latest",
                "ImageID": "sha256:0123abcd",
                "Command": "nginx -g 'daemon off;'",
                "Created": 1700000000,
                "State": "running",
                "Status": "Up 2 hours",
                "Ports": [
                    {"IP": "0.0.0.0", "PrivatePort": 80, "PublicPort": 8080, "Type": "tcp"},
                    {"PrivatePort": 443, "Type": "tcp"}
                ],
                "Labels": {"com.example.app": "web"},
                "Mounts": [
                    {
                        "Type": "bind",
                        "Source": "/srv/web",
                        "Destination": "/usr/share/nginx/html",
                        "Mode": "ro",
                        "RW": false
                    }
                ],
                "NetworkSettings": {
                    "Networks": {
                        "bridge": {
                            "NetworkID": "f2de39df4171",
                            "Gateway": "172.17.0.1",
                            "IPAddress": "172.17.0.2",
                            "MacAddress": "02:42:ac:11:00:02"
                        }
                    }
                }
            },
            {
                "Id": "0011223344556677full",
                "Names": ["/db"],
                "Image": "postgres:16",
                "ImageID": "sha256:4567ef01",
                "Command": "postgres",
                "Created": 1700000100,
                "State": "exited",
                "Status": "Exited (0) 3 days ago",
                "Ports": [],
                "Labels": {},
                "Mounts": [
                    {
                        "Type": "volume",
                        "Name": "pgdata",
                        "Source": "/var/lib/docker/volumes/pgdata/_data",
                        "Destination": "/var/lib/postgresql/data",
                        "Mode": "z",
                        "RW": true
                    }
                ],
                "NetworkSettings": {"Networks": {}}
            }
        ]"#
    }

    #[test]
    fn test_containers_path_query() {
        assert_eq!(containers_path(false), "/containers/json");
        assert_eq!(containers_path(true), "/containers/json?all=true");
    }

    #[test]
    fn test_decode_listing() {
        let containers: Vec<ContainerSummary> =
            serde_json::from_str(sample_listing()).unwrap();
        assert_eq!(containers.len(), 2);

        let web = &containers[0];
        assert_eq!(web.names, vec!["/web", "/web-alias"]);
        assert_eq!(web.ports[0].public_port, Some(8080));
        assert_eq!(web.ports[1].public_port, None);
        assert_eq!(web.ports[1].ip, None);
        assert_eq!(web.mounts[0].name, None);
        assert!(!web.mounts[0].rw);
        assert_eq!(
            web.network_settings.networks["bridge"].ip_address,
            "172.17.0.2"
        );

        let db = &containers[1];
        assert_eq!(db.mounts[0].name.as_deref(), Some("pgdata"));
        assert!(db.network_settings.networks.is_empty());
    }

    #[test]
    fn test_decode_tolerates_missing_optional_sections() {
        let minimal = r#"[{
            "Id": "ff00",
            "Names": ["/tiny"],
            "Image": "busybox",
            "ImageID": "sha256:beef",
            "Command": "sh",
            "Created": 0,
            "State": "created",
            "Status": "Created"
        }]"#;
        let containers: Vec<ContainerSummary> = serde_json::from_str(minimal).unwrap();
        assert!(containers[0].ports.is_empty());
        assert!(containers[0].labels.is_empty());
        assert!(containers[0].network_settings.networks.is_empty());
    }

    #[test]
    fn test_non_success_becomes_api_error_without_body() {
        let response = Response::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            Version::HTTP_11,
            HeaderMap::new(),
            bytes::Bytes::from_static(b"internal error"),
        );

        let err = decode_containers(&response).unwrap_err();
        assert!(err.is_api());
        assert_eq!(err.status(), Some(500));
        let message = err.to_string();
        assert!(message.contains("500"));
        assert_eq!(message, "Docker API error: 500 Internal Server Error");
        assert!(!message.contains("internal error"));
    }

    #[test]
    fn test_render_listing() {
        let containers: Vec<ContainerSummary> =
            serde_json::from_str(sample_listing()).unwrap();
        let text = render_containers(&containers);

        assert!(text.starts_with("Found 2 containers:\n\n"));
        assert!(text.contains("  /web, /web-alias\n"));
        assert!(text.contains("    Image: nginx:latest\n"));
        assert!(text.contains("    Status: Up 2 hours\n"));
        assert!(text.contains("    ID: abcdef012345\n"));
        assert!(text.contains("    ID: 001122334455\n"));
        assert!(!text.contains("6789full"));
    }

    #[test]
    fn test_render_empty_listing() {
        assert_eq!(render_containers(&[]), "Found 0 containers:\n\n");
    }

    #[test]
    fn test_short_id_handles_short_identifiers() {
        assert_eq!(short_id("abcdef0123456789full"), "abcdef012345");
        assert_eq!(short_id("abc"), "abc");
        assert_eq!(short_id(""), "");
    }
}
