//! Shared HTTP plumbing for the upstream openFDA API.

use std::sync::OnceLock;
use std::time::Duration;

use crate::error::OpenFdaMcpError;

pub(crate) mod openfda;

const ERROR_BODY_MAX_BYTES: usize = 2048;
pub(crate) const DEFAULT_MAX_BODY_BYTES: usize = 8 * 1024 * 1024;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

static HTTP_CLIENT: OnceLock<reqwest::Client> = OnceLock::new();

/// Returns the process-wide HTTP client.
///
/// - Per-request timeout: 30 s, connect timeout: 10 s
/// - `pool_max_idle_per_host(0)`: connections are torn down after each
///   request instead of lingering in an idle pool between tool calls
pub(crate) fn shared_client() -> Result<reqwest::Client, OpenFdaMcpError> {
    if let Some(client) = HTTP_CLIENT.get() {
        return Ok(client.clone());
    }

    let client = reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .connect_timeout(CONNECT_TIMEOUT)
        .pool_max_idle_per_host(0)
        .user_agent(concat!("openfda-mcp/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(OpenFdaMcpError::HttpClientInit)?;

    match HTTP_CLIENT.set(client.clone()) {
        Ok(()) => Ok(client),
        Err(_) => HTTP_CLIENT
            .get()
            .cloned()
            .ok_or_else(|| OpenFdaMcpError::Api {
                api: "http-client".into(),
                message: "Shared HTTP client initialization race".into(),
            }),
    }
}

pub(crate) fn body_excerpt(bytes: &[u8]) -> String {
    let full = String::from_utf8_lossy(bytes);

    let truncated: &str = if full.len() > ERROR_BODY_MAX_BYTES {
        let mut end = ERROR_BODY_MAX_BYTES;
        while end > 0 && !full.is_char_boundary(end) {
            end -= 1;
        }
        &full[..end]
    } else {
        full.as_ref()
    };

    let mut s = truncated.trim().replace(['\n', '\r', '\t'], " ");
    if full.len() > ERROR_BODY_MAX_BYTES {
        s.push_str(" …");
    }
    s
}

pub(crate) async fn read_limited_body(
    mut resp: reqwest::Response,
    api: &str,
) -> Result<Vec<u8>, OpenFdaMcpError> {
    let mut body: Vec<u8> = Vec::new();

    while let Some(chunk) = resp.chunk().await? {
        let next_len = body.len().saturating_add(chunk.len());
        if next_len > DEFAULT_MAX_BODY_BYTES {
            return Err(OpenFdaMcpError::Api {
                api: api.to_string(),
                message: format!("Response body exceeded {DEFAULT_MAX_BODY_BYTES} bytes"),
            });
        }
        body.extend_from_slice(&chunk);
    }

    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::body_excerpt;

    #[test]
    fn body_excerpt_flattens_whitespace() {
        let excerpt = body_excerpt(b"  upstream\nerror\tdetail  ");
        assert_eq!(excerpt, "upstream error detail");
    }

    #[test]
    fn body_excerpt_truncates_long_bodies() {
        let body = vec![b'x'; 4096];
        let excerpt = body_excerpt(&body);
        assert!(excerpt.len() < body.len());
        assert!(excerpt.ends_with('…'));
    }
}
