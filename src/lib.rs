pub mod docker;
pub mod errors;
pub mod http_client;
pub mod ipc_http_client;
pub mod tailscale;

pub use errors::*;
pub use http_client::*;
pub use ipc_http_client::*;
