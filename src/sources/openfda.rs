use std::borrow::Cow;

use serde::Deserialize;
use tracing::{info, warn};

use crate::error::OpenFdaMcpError;

const OPENFDA_BASE: &str = "https://api.fda.gov";
const OPENFDA_API: &str = "openfda";

/// Sequential attempts per logical query, without backoff.
const MAX_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone)]
pub(crate) struct OpenFdaClient {
    client: reqwest::Client,
    base: Cow<'static, str>,
}

impl OpenFdaClient {
    pub(crate) fn new() -> Result<Self, OpenFdaMcpError> {
        Ok(Self {
            client: crate::sources::shared_client()?,
            base: Cow::Borrowed(OPENFDA_BASE),
        })
    }

    #[cfg(test)]
    pub(crate) fn new_for_test(base: String) -> Result<Self, OpenFdaMcpError> {
        Ok(Self {
            client: crate::sources::shared_client()?,
            base: Cow::Owned(base),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base.as_ref().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Runs one drug-label query, concealing transient upstream failures.
    ///
    /// A 404 is openFDA's "no matches" signal and resolves to an empty
    /// result set without retrying. Every other failure — timeout,
    /// transport error, error status, undecodable body — is retried up to
    /// [`MAX_ATTEMPTS`] times and then surfaced.
    pub(crate) async fn label_search(
        &self,
        search: &str,
        limit: usize,
    ) -> Result<LabelResponse, OpenFdaMcpError> {
        let url = self.endpoint("drug/label.json");

        for attempt in 1..=MAX_ATTEMPTS {
            info!(attempt, search, limit, "openFDA label query");
            match self.fetch_once(&url, search, limit).await {
                Ok(resp) => {
                    info!(results = resp.results.len(), "openFDA label query done");
                    return Ok(resp);
                }
                Err(err) if attempt == MAX_ATTEMPTS => return Err(err),
                Err(err) => {
                    warn!(attempt, error = %err, "openFDA label query failed, retrying");
                }
            }
        }

        Err(OpenFdaMcpError::Api {
            api: OPENFDA_API.to_string(),
            message: format!("All retry attempts exhausted after {MAX_ATTEMPTS} attempts"),
        })
    }

    async fn fetch_once(
        &self,
        url: &str,
        search: &str,
        limit: usize,
    ) -> Result<LabelResponse, OpenFdaMcpError> {
        let resp = self
            .client
            .get(url)
            .query(&[("search", search), ("limit", &limit.to_string())])
            .send()
            .await?;
        let status = resp.status();
        let bytes = crate::sources::read_limited_body(resp, OPENFDA_API).await?;

        if status.as_u16() == 404 {
            return Ok(LabelResponse::default());
        }

        if !status.is_success() {
            let excerpt = crate::sources::body_excerpt(&bytes);
            return Err(OpenFdaMcpError::Api {
                api: OPENFDA_API.to_string(),
                message: format!("HTTP {status}: {excerpt}"),
            });
        }

        serde_json::from_slice(&bytes).map_err(|source| OpenFdaMcpError::ApiJson {
            api: OPENFDA_API.to_string(),
            source,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct LabelResponse {
    #[serde(default)]
    pub results: Vec<LabelResult>,
}

/// One drug-label record. The `openfda` block carries product identity;
/// every other label section stays in `sections` keyed by its upstream
/// name (`indications_and_usage`, `dosage_and_administration`, …).
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct LabelResult {
    #[serde(default)]
    pub openfda: LabelIdentity,
    #[serde(flatten)]
    pub sections: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct LabelIdentity {
    #[serde(default)]
    pub brand_name: Vec<String>,
    #[serde(default)]
    pub generic_name: Vec<String>,
    #[serde(default)]
    pub manufacturer_name: Vec<String>,
    #[serde(default)]
    pub product_ndc: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn label_body() -> serde_json::Value {
        serde_json::json!({
            "meta": {"results": {"skip": 0, "limit": 1, "total": 1}},
            "results": [{
                "indications_and_usage": ["For relief of minor aches."],
                "openfda": {
                    "brand_name": ["ASPIRIN"],
                    "generic_name": ["aspirin"],
                    "manufacturer_name": ["Bayer"],
                    "product_ndc": ["12345-6789"]
                }
            }]
        })
    }

    #[tokio::test]
    async fn label_search_sends_search_and_limit_params() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/drug/label.json"))
            .and(query_param("search", "openfda.brand_name:\"aspirin\""))
            .and(query_param("limit", "5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(label_body()))
            .expect(1)
            .mount(&server)
            .await;

        let client = OpenFdaClient::new_for_test(server.uri()).unwrap();
        let resp = client
            .label_search("openfda.brand_name:\"aspirin\"", 5)
            .await
            .unwrap();

        assert_eq!(resp.results.len(), 1);
        assert_eq!(resp.results[0].openfda.brand_name, vec!["ASPIRIN"]);
    }

    #[tokio::test]
    async fn label_search_treats_404_as_empty_without_retrying() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/drug/label.json"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let client = OpenFdaClient::new_for_test(server.uri()).unwrap();
        let resp = client.label_search("*:*", 3).await.unwrap();

        assert!(resp.results.is_empty());
    }

    #[tokio::test]
    async fn label_search_retries_server_errors_then_succeeds() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/drug/label.json"))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(2)
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/drug/label.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(label_body()))
            .expect(1)
            .mount(&server)
            .await;

        let client = OpenFdaClient::new_for_test(server.uri()).unwrap();
        let resp = client.label_search("*:*", 3).await.unwrap();

        assert_eq!(resp.results.len(), 1);
    }

    #[tokio::test]
    async fn label_search_surfaces_error_after_exhausting_attempts() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/drug/label.json"))
            .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
            .expect(3)
            .mount(&server)
            .await;

        let client = OpenFdaClient::new_for_test(server.uri()).unwrap();
        let err = client.label_search("*:*", 3).await.unwrap_err();

        let msg = err.to_string();
        assert!(msg.contains("HTTP 500"));
        assert!(msg.contains("upstream exploded"));
    }

    #[tokio::test]
    async fn label_search_surfaces_transport_errors() {
        // Nothing listens here; every attempt fails at the transport level.
        let client = OpenFdaClient::new_for_test("http://127.0.0.1:9".into()).unwrap();
        let err = client.label_search("*:*", 3).await.unwrap_err();

        assert!(matches!(err, OpenFdaMcpError::Http(_)));
    }

    #[tokio::test]
    async fn label_search_retries_undecodable_bodies() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/drug/label.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .expect(3)
            .mount(&server)
            .await;

        let client = OpenFdaClient::new_for_test(server.uri()).unwrap();
        let err = client.label_search("*:*", 3).await.unwrap_err();

        assert!(matches!(err, OpenFdaMcpError::ApiJson { .. }));
    }
}
