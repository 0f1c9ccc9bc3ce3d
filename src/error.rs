#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum OpenFdaMcpError {
    #[error("HTTP client initialization failed: {0}")]
    HttpClientInit(reqwest::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error from {api}: {message}")]
    Api { api: String, message: String },

    #[error("API JSON error from {api}: {source}")]
    ApiJson {
        api: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::OpenFdaMcpError;

    #[test]
    fn api_error_display_includes_api_name() {
        let err = OpenFdaMcpError::Api {
            api: "openfda".to_string(),
            message: "HTTP 500".to_string(),
        };

        let msg = err.to_string();
        assert!(msg.contains("openfda"));
        assert!(msg.contains("HTTP 500"));
    }
}
