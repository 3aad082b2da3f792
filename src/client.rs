use std::time::{Duration, Instant};

use http_body_util::{BodyExt, Empty};
use hyper::body::Bytes;
use hyper::Uri;
use hyper_tls::HttpsConnector;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client as HyperClient;
use hyper_util::rt::TokioExecutor;
use tokio::time;

use crate::metrics::RequestOutcome;

type HttpsClient = HyperClient<HttpsConnector<HttpConnector>, Empty<Bytes>>;

/// Executes single GET exchanges against the target. Connection pooling,
/// TLS, and DNS are hyper's business; this type only measures and
/// classifies the result.
pub struct HttpClient {
    client: HttpsClient,
    timeout: Duration,
    expected_status: u16,
}

impl HttpClient {
    pub fn new(timeout: Duration, expected_status: u16) -> Self {
        let mut http = HttpConnector::new();
        http.enforce_http(false);
        let https = HttpsConnector::new_with_connector(http);
        let client = HyperClient::builder(TokioExecutor::new())
            .pool_idle_timeout(Duration::from_secs(30))
            .build(https);

        HttpClient {
            client,
            timeout,
            expected_status,
        }
    }

    /// One GET request. Always produces exactly one outcome; network
    /// failures and timeouts become failed outcomes, never errors.
    pub async fn get(&self, uri: &Uri) -> RequestOutcome {
        let start = Instant::now();
        let req = hyper::Request::builder()
            .method(hyper::Method::GET)
            .uri(uri.clone())
            .body(Empty::<Bytes>::new())
            .unwrap();

        match time::timeout(self.timeout, self.client.request(req)).await {
            Ok(Ok(resp)) => {
                let status = resp.status().as_u16();
                // drain the body so the pooled connection can be reused
                let bytes = match resp.into_body().collect().await {
                    Ok(collected) => collected.to_bytes().len() as u64,
                    Err(_) => 0,
                };
                let latency = start.elapsed();

                if status == self.expected_status {
                    RequestOutcome {
                        latency,
                        status: Some(status),
                        success: true,
                        bytes,
                        error: None,
                    }
                } else {
                    tracing::debug!(status, expected = self.expected_status, "status mismatch");
                    RequestOutcome {
                        latency,
                        status: Some(status),
                        success: false,
                        bytes,
                        error: Some(format!(
                            "expected status {}, got {status}",
                            self.expected_status
                        )),
                    }
                }
            }
            Ok(Err(e)) => {
                tracing::debug!(error = %e, "request error");
                RequestOutcome {
                    latency: start.elapsed(),
                    status: None,
                    success: false,
                    bytes: 0,
                    error: Some(e.to_string()),
                }
            }
            Err(_) => {
                tracing::debug!(timeout = ?self.timeout, "request timed out");
                RequestOutcome {
                    latency: start.elapsed(),
                    status: None,
                    success: false,
                    bytes: 0,
                    error: Some(format!("timed out after {:?}", self.timeout)),
                }
            }
        }
    }
}
