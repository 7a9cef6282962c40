use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, error, info};
use url::Url;

use super::types::{Explanation, HealthStatus, PredictionResult};
use super::PredictionService;
use crate::error::{CardioRiskError, Result};
use crate::features::FeatureVector;

const PREDICT_PATH: &str = "predict";
const EXPLAIN_PATH: &str = "explain";

/// Longest error body echoed back in a failure message.
const MAX_ERROR_BODY: usize = 1024;

/// HTTP client for the prediction service.
pub struct HttpPredictionService {
    client: reqwest::Client,
    base_url: Url,
    timeout: Duration,
}

impl HttpPredictionService {
    /// Build a client for the service rooted at `base_url`.
    /// `timeout` bounds each individual HTTP request.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = normalize_base_url(base_url)?;
        let client = reqwest::Client::builder()
            .user_agent(concat!("cardiorisk/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| CardioRiskError::Config(format!("Failed to build HTTP client: {}", e)))?;

        info!("Prediction service client targeting {}", base_url);
        Ok(Self {
            client,
            base_url,
            timeout,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| CardioRiskError::Config(format!("Invalid endpoint '{}': {}", path, e)))
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint(path)?;
        let label = format!("/{}", path);
        debug!("POST {}", url);

        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| self.transport_error(&label, e))?;

        decode_response(response, &label).await
    }

    fn transport_error(&self, endpoint: &str, e: reqwest::Error) -> CardioRiskError {
        let msg = if e.is_timeout() {
            format!("request timed out after {:?}", self.timeout)
        } else {
            format!("request failed: {}", e)
        };
        error!("Service call {} failed: {}", endpoint, msg);
        CardioRiskError::remote(endpoint, msg)
    }
}

impl PredictionService for HttpPredictionService {
    async fn predict(&self, features: &FeatureVector) -> Result<PredictionResult> {
        self.post_json(PREDICT_PATH, features).await
    }

    async fn explain(&self, features: &FeatureVector) -> Result<Explanation> {
        self.post_json(EXPLAIN_PATH, features).await
    }

    async fn health(&self) -> Result<HealthStatus> {
        let url = self.base_url.clone();
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.transport_error("/", e))?;
        decode_response(response, "/").await
    }
}

/// Parse and validate the configured base URL. A trailing slash is enforced
/// so endpoint paths join below it instead of replacing its last segment.
fn normalize_base_url(base_url: &str) -> Result<Url> {
    let mut url = Url::parse(base_url.trim())
        .map_err(|e| CardioRiskError::Config(format!("Invalid service URL '{}': {}", base_url, e)))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(CardioRiskError::Config(format!(
            "Unsupported service URL scheme '{}'",
            url.scheme()
        )));
    }

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Check status and decode the JSON body of a service response.
async fn decode_response<T: DeserializeOwned>(
    response: reqwest::Response,
    endpoint: &str,
) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<failed to read body>".to_string());
        let msg = format!("HTTP {} - {}", status, truncate(&body, MAX_ERROR_BODY));
        error!("Service call {} failed: {}", endpoint, msg);
        return Err(CardioRiskError::remote(endpoint, msg));
    }

    let text = response
        .text()
        .await
        .map_err(|e| CardioRiskError::remote(endpoint, format!("failed to read body: {}", e)))?;

    serde_json::from_str(&text).map_err(|e| {
        let msg = format!("malformed response body: {}", e);
        error!("Service call {} failed: {}", endpoint, msg);
        CardioRiskError::remote(endpoint, msg)
    })
}

fn truncate(body: &str, max: usize) -> String {
    if body.len() <= max {
        return body.to_string();
    }
    let mut end = max;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve `responses` in order, one per connection, then stop.
    /// Each response is (status line, body). Returns the base URL.
    async fn serve(responses: Vec<(&'static str, String)>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            for (status, body) in responses {
                let (mut socket, _) = listener.accept().await.unwrap();
                read_request(&mut socket).await;
                let reply = format!(
                    "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                socket.write_all(reply.as_bytes()).await.unwrap();
                socket.shutdown().await.ok();
            }
        });

        format!("http://{}", addr)
    }

    /// Consume headers and a Content-Length body.
    async fn read_request(socket: &mut tokio::net::TcpStream) {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                return;
            }
            buf.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&buf);
            if let Some(header_end) = text.find("\r\n\r\n") {
                let content_length = text[..header_end]
                    .lines()
                    .find_map(|line| {
                        let lower = line.to_ascii_lowercase();
                        lower
                            .strip_prefix("content-length:")
                            .map(|v| v.trim().parse::<usize>().unwrap_or(0))
                    })
                    .unwrap_or(0);
                if buf.len() >= header_end + 4 + content_length {
                    return;
                }
            }
        }
    }

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let url = normalize_base_url("http://127.0.0.1:8000").unwrap();
        assert_eq!(url.join("predict").unwrap().as_str(), "http://127.0.0.1:8000/predict");

        let nested = normalize_base_url("https://example.com/api").unwrap();
        assert_eq!(
            nested.join("explain").unwrap().as_str(),
            "https://example.com/api/explain"
        );
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        assert!(matches!(
            normalize_base_url("not a url"),
            Err(CardioRiskError::Config(_))
        ));
        assert!(matches!(
            normalize_base_url("ftp://example.com"),
            Err(CardioRiskError::Config(_))
        ));
    }

    #[test]
    fn test_truncate_long_body() {
        let body = "x".repeat(2000);
        let out = truncate(&body, MAX_ERROR_BODY);
        assert_eq!(out.len(), MAX_ERROR_BODY + 3);
        assert!(out.ends_with("..."));
        assert_eq!(truncate("short", MAX_ERROR_BODY), "short");
    }

    #[tokio::test]
    async fn test_predict_and_explain_round_trip() {
        let base = serve(vec![
            (
                "200 OK",
                r#"{"prediction":1,"probability":0.75,"result":"Heart Disease Detected"}"#.to_string(),
            ),
            (
                "200 OK",
                r#"{"shap_values":[{"feature":"num__Oldpeak","value":0.31}],"base_value":0.02}"#
                    .to_string(),
            ),
        ])
        .await;

        let service = HttpPredictionService::new(&base, Duration::from_secs(5)).unwrap();
        let features = FeatureVector::default();

        let prediction = service.predict(&features).await.unwrap();
        assert_eq!(prediction.probability, 0.75);
        assert_eq!(prediction.prediction, Some(1));

        let explanation = service.explain(&features).await.unwrap();
        assert_eq!(explanation.shap_values.len(), 1);
        assert_eq!(explanation.shap_values[0].feature, "num__Oldpeak");
        assert_eq!(explanation.base_value, Some(0.02));
    }

    #[tokio::test]
    async fn test_non_success_status_is_remote_failure() {
        let base = serve(vec![(
            "422 Unprocessable Entity",
            r#"{"detail":"Age must be an integer"}"#.to_string(),
        )])
        .await;

        let service = HttpPredictionService::new(&base, Duration::from_secs(5)).unwrap();
        let err = service.predict(&FeatureVector::default()).await.unwrap_err();
        match err {
            CardioRiskError::RemoteCall { endpoint, message } => {
                assert_eq!(endpoint, "/predict");
                assert!(message.contains("422"), "unexpected message: {}", message);
                assert!(message.contains("Age must be an integer"));
            }
            other => panic!("expected RemoteCall, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_malformed_body_is_remote_failure() {
        let base = serve(vec![("200 OK", r#"{"unexpected":true}"#.to_string())]).await;

        let service = HttpPredictionService::new(&base, Duration::from_secs(5)).unwrap();
        let err = service.explain(&FeatureVector::default()).await.unwrap_err();
        assert!(err.is_remote_failure());
        assert!(err.to_string().contains("/explain"));
    }

    #[tokio::test]
    async fn test_connection_refused_is_remote_failure() {
        // Grab a free port, then close it so nothing is listening.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let service =
            HttpPredictionService::new(&format!("http://{}", addr), Duration::from_secs(2)).unwrap();
        let err = service.predict(&FeatureVector::default()).await.unwrap_err();
        assert!(err.is_remote_failure());
    }

    #[tokio::test]
    async fn test_health_probe() {
        let base = serve(vec![(
            "200 OK",
            r#"{"message":"Heart Failure Prediction API Running"}"#.to_string(),
        )])
        .await;

        let service = HttpPredictionService::new(&base, Duration::from_secs(5)).unwrap();
        let health = service.health().await.unwrap();
        assert_eq!(health.message, "Heart Failure Prediction API Running");
    }
}
