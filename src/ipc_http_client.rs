use std::path::Path;

use interprocess::local_socket::tokio::prelude::LocalSocketStream;
use interprocess::local_socket::traits::tokio::Stream;
use interprocess::local_socket::{GenericFilePath, Name, ToFsName};

use crate::errors::{LocalPeekError, Result};
use crate::http_client::{send_request, RequestBuilder, Response};
use http::Method;
use tracing::debug;

/// Configuration for the IPC HTTP client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Virtual hostname placed in the Host header. Routing happens through
    /// the socket file, so daemons that ignore the header work with any name.
    pub host: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
        }
    }
}

/// Single-shot HTTP client over a Unix domain socket
///
/// Each request opens its own connection, performs one exchange, and lets the
/// stream drop. The socket file is not validated up front; a missing or
/// unreadable socket surfaces as a `Connection` error when a request is sent.
pub struct IpcHttpClient {
    name: Name<'static>,
    config: ClientConfig,
}

impl IpcHttpClient {
    /// Create a client for the socket at `path` with default configuration
    pub fn new<P>(path: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        Self::with_config(path, ClientConfig::default())
    }

    /// Create a client for the socket at `path` with custom configuration
    pub fn with_config<P>(path: P, config: ClientConfig) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let name = path
            .as_ref()
            .to_fs_name::<GenericFilePath>()
            .map_err(|e| LocalPeekError::connection(format!("Invalid socket path: {}", e)))?
            .into_owned();

        Ok(Self { name, config })
    }

    async fn connect(&self) -> Result<LocalSocketStream> {
        match LocalSocketStream::connect(self.name.clone()).await {
            Ok(stream) => {
                debug!("Connected to local socket");
                Ok(stream)
            }
            Err(e) => Err(LocalPeekError::connection(format!(
                "Failed to connect to socket: {}",
                e
            ))),
        }
    }

    /// GET request
    pub fn get(&self, path: &str) -> HttpRequestBuilder<'_> {
        HttpRequestBuilder::new(self, Method::GET, path)
    }
}

/// HTTP request builder for fluent API
pub struct HttpRequestBuilder<'a> {
    client: &'a IpcHttpClient,
    method: Method,
    path: String,
    headers: Vec<(String, String)>,
}

impl<'a> HttpRequestBuilder<'a> {
    fn new(client: &'a IpcHttpClient, method: Method, path: &str) -> Self {
        Self {
            client,
            method,
            path: path.to_string(),
            headers: Vec::new(),
        }
    }

    /// Add custom header
    pub fn header<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.headers.push((key.into(), value.into()));
        self
    }

    /// Send the request over a fresh connection and await the full response
    pub async fn send(self) -> Result<Response> {
        let mut builder = RequestBuilder::new(self.method, self.path)
            .host(&self.client.config.host);

        for (key, value) in &self.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }

        let request = builder.build()?;
        let stream = self.client.connect().await?;
        send_request(stream, request).await
    }
}
