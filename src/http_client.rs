use crate::errors::{LocalPeekError, Result};
use bytes::Bytes;
use http::{header, HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Version};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::str::FromStr;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, trace};

/// Hard cap on in-memory response bodies.
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// HTTP response read off an IPC stream
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    version: Version,
    headers: HeaderMap,
    body: Bytes,
}

impl Response {
    pub fn new(status: StatusCode, version: Version, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            status,
            version,
            headers,
            body,
        }
    }

    /// Get HTTP status code
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Get status code as u16
    pub fn status_code(&self) -> u16 {
        self.status.as_u16()
    }

    /// Get HTTP version
    pub fn version(&self) -> Version {
        self.version
    }

    /// Get response headers
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Get response body as bytes
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Get response body as string
    pub fn text(&self) -> Result<String> {
        String::from_utf8(self.body.to_vec()).map_err(LocalPeekError::from)
    }

    /// Parse response body as JSON
    pub fn json<T>(&self) -> Result<T>
    where
        T: DeserializeOwned,
    {
        serde_json::from_slice(&self.body).map_err(LocalPeekError::from)
    }

    /// Parse response body as generic JSON value
    pub fn json_value(&self) -> Result<Value> {
        serde_json::from_slice(&self.body).map_err(LocalPeekError::from)
    }

    /// Check if response indicates success (2xx status)
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Check if response indicates client error (4xx status)
    pub fn is_client_error(&self) -> bool {
        self.status.is_client_error()
    }

    /// Check if response indicates server error (5xx status)
    pub fn is_server_error(&self) -> bool {
        self.status.is_server_error()
    }

    /// Get content length from headers
    pub fn content_length(&self) -> Option<u64> {
        self.headers
            .get(header::CONTENT_LENGTH)?
            .to_str()
            .ok()?
            .parse()
            .ok()
    }

    /// Get content type from headers
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(header::CONTENT_TYPE)?.to_str().ok()
    }
}

/// HTTP request builder with fluent interface
///
/// Every request carries `Connection: close`: each client invocation makes a
/// single exchange, and close-delimited bodies keep the read path free of
/// keep-alive bookkeeping.
#[derive(Debug)]
pub struct RequestBuilder {
    method: Method,
    uri: String,
    headers: HeaderMap,
}

impl RequestBuilder {
    pub fn new(method: Method, uri: String) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("localhost"));
        headers.insert(header::USER_AGENT, HeaderValue::from_static("localpeek/0.1"));
        headers.insert(header::CONNECTION, HeaderValue::from_static("close"));

        Self {
            method,
            uri,
            headers,
        }
    }

    /// Override the virtual Host header (routing happens via the socket, so
    /// the name only matters to the daemon's vhost matching, if any)
    pub fn host(mut self, host: &str) -> Self {
        if let Ok(value) = HeaderValue::from_str(host) {
            self.headers.insert(header::HOST, value);
        }
        self
    }

    /// Add a custom header
    pub fn header(mut self, key: &str, value: &str) -> Self {
        if let (Ok(name), Ok(val)) = (
            HeaderName::from_bytes(key.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.headers.insert(name, val);
        }
        self
    }

    /// Build the HTTP request head as wire bytes
    pub fn build(self) -> Result<Bytes> {
        let mut request = Vec::with_capacity(256);

        // Request line
        request.extend_from_slice(self.method.as_str().as_bytes());
        request.extend_from_slice(b" ");
        request.extend_from_slice(self.uri.as_bytes());
        request.extend_from_slice(b" HTTP/1.1\r\n");

        // Headers
        for (key, value) in &self.headers {
            request.extend_from_slice(key.as_str().as_bytes());
            request.extend_from_slice(b": ");
            request.extend_from_slice(value.as_bytes());
            request.extend_from_slice(b"\r\n");
        }

        // End of headers
        request.extend_from_slice(b"\r\n");

        Ok(Bytes::from(request))
    }
}

/// Parse an HTTP response from a stream
pub async fn parse_response<S>(stream: S) -> Result<Response>
where
    S: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(stream);

    // Read the status line and header block up to the blank line
    let mut head = Vec::with_capacity(1024);

    let mut status_line = String::new();
    reader.read_line(&mut status_line).await?;
    head.extend_from_slice(status_line.as_bytes());

    let mut line = String::new();
    loop {
        line.clear();
        let bytes_read = reader.read_line(&mut line).await?;
        if bytes_read == 0 {
            break;
        }

        if line == "\r\n" || line == "\n" {
            break;
        }

        head.extend_from_slice(line.as_bytes());
    }

    // Terminating blank line for the parser
    head.extend_from_slice(b"\r\n");

    let mut header_slots = [httparse::EMPTY_HEADER; 64];
    let mut parsed = httparse::Response::new(&mut header_slots);
    let parse_status = parsed.parse(&head).map_err(|e| match e {
        httparse::Error::TooManyHeaders => {
            LocalPeekError::protocol("Too many HTTP headers in response (limit: 64)")
        }
        _ => LocalPeekError::from(e),
    })?;

    if parse_status.is_partial() {
        return Err(LocalPeekError::protocol("Truncated HTTP response head"));
    }

    let status = parsed
        .code
        .ok_or_else(|| LocalPeekError::protocol("Missing HTTP status code"))?;

    // Build HeaderMap
    let mut header_map = HeaderMap::new();
    for h in parsed.headers.iter() {
        let header_name =
            HeaderName::from_str(h.name).map_err(|e| LocalPeekError::Http(e.into()))?;
        let header_value =
            HeaderValue::from_bytes(h.value).map_err(|e| LocalPeekError::Http(e.into()))?;
        header_map.insert(header_name, header_value);
    }

    // Determine body framing
    let content_length = header_map
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<usize>().ok());

    let is_chunked = header_map
        .get(header::TRANSFER_ENCODING)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.eq_ignore_ascii_case("chunked"))
        .unwrap_or(false);

    let body = if is_chunked {
        read_chunked_body(&mut reader).await?
    } else if let Some(len) = content_length {
        if len == 0 {
            Bytes::new()
        } else if len > MAX_BODY_BYTES {
            return Err(LocalPeekError::protocol(
                "Response body too large for memory",
            ));
        } else {
            read_fixed_body(&mut reader, len).await?
        }
    } else {
        // Close-delimited body: we always send `Connection: close`, so EOF
        // marks the end of the response
        read_until_close(&mut reader).await?
    };

    Ok(Response::new(
        StatusCode::from_u16(status)?,
        Version::HTTP_11,
        header_map,
        body,
    ))
}

async fn read_chunked_body<R>(reader: &mut BufReader<R>) -> Result<Bytes>
where
    R: AsyncRead + Unpin,
{
    let mut body = Vec::with_capacity(8 * 1024);

    loop {
        // Read chunk size line
        let mut size_line = String::new();
        let bytes_read = reader.read_line(&mut size_line).await?;
        if bytes_read == 0 {
            return Err(LocalPeekError::protocol("Unexpected EOF in chunked body"));
        }

        let size_line = size_line.trim();
        if size_line.is_empty() {
            continue;
        }

        // Chunk size is hex, possibly followed by extensions
        let size_token = size_line.split(';').next().unwrap_or(size_line).trim();
        let chunk_size = usize::from_str_radix(size_token, 16)
            .map_err(|_| LocalPeekError::protocol("Invalid chunk size"))?;

        if chunk_size == 0 {
            // Last chunk, read final CRLF
            let mut final_line = String::new();
            reader.read_line(&mut final_line).await?;
            break;
        }

        // Read chunk data
        let mut chunk = vec![0u8; chunk_size];
        reader.read_exact(&mut chunk).await?;
        body.extend_from_slice(&chunk);

        // Read trailing CRLF
        let mut crlf = [0u8; 2];
        reader.read_exact(&mut crlf).await?;

        if body.len() > MAX_BODY_BYTES {
            return Err(LocalPeekError::protocol("Chunked response body too large"));
        }
    }

    Ok(Bytes::from(body))
}

async fn read_fixed_body<R>(reader: &mut BufReader<R>, len: usize) -> Result<Bytes>
where
    R: AsyncRead + Unpin,
{
    let mut body = vec![0u8; len];
    reader.read_exact(&mut body).await?;
    Ok(Bytes::from(body))
}

async fn read_until_close<R>(reader: &mut BufReader<R>) -> Result<Bytes>
where
    R: AsyncRead + Unpin,
{
    let mut body = Vec::with_capacity(8 * 1024);
    let mut chunk = [0u8; 8192];

    loop {
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..n]);

        if body.len() > MAX_BODY_BYTES {
            return Err(LocalPeekError::protocol("Response body too large"));
        }
    }

    Ok(Bytes::from(body))
}

/// Send an HTTP request and parse the response
pub async fn send_request<S>(mut stream: S, request: Bytes) -> Result<Response>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    // Send request
    stream.write_all(&request).await?;
    stream.flush().await?;

    trace!("Sent HTTP request ({} bytes)", request.len());

    // Parse response
    let response = parse_response(stream).await?;

    debug!(
        "Received HTTP response: {} {}",
        response.status(),
        response.content_length().unwrap_or(0)
    );

    Ok(response)
}
