//! HTTP transport for upstream APIs.
//!
//! [`HttpClient`] wraps a single `reqwest::Client` shared by all fetchers.
//! Every request carries the crate's `User-Agent`, is bounded by a timeout,
//! and is retried with exponential backoff when the failure is transient
//! (see [`FetchError::is_transient`]).

use super::{ApiClient, ApiRequest, Auth, FetchError};
use crate::constants::{
    DEFAULT_MAX_RETRIES, MAX_BACKOFF_DELAY_MS, STARTING_BACKOFF_DELAY_MS, USER_AGENT,
};
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use serde_json::Value;
use std::time::Duration;
use tokio_retry::RetryIf;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::debug;

/// Production [`ApiClient`] backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    max_retries: usize,
}

impl HttpClient {
    /// Builds a client with the given per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Setup`] if the TLS backend cannot be initialized.
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        Self::from_builder(reqwest::Client::builder(), timeout)
    }

    fn from_builder(builder: reqwest::ClientBuilder, timeout: Duration) -> Result<Self, FetchError> {
        let client = builder
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(FetchError::Setup)?;

        Ok(Self {
            client,
            max_retries: DEFAULT_MAX_RETRIES,
        })
    }

    /// Sets how many times a transient failure is retried after the first attempt.
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    async fn send_once(&self, request: &ApiRequest) -> Result<Value, FetchError> {
        let url = request.url.as_str();
        let builder = self.client.get(url).header(ACCEPT, "application/json");
        let builder = match &request.auth {
            Some(Auth::Bearer(token)) => builder.bearer_auth(token.expose()),
            Some(Auth::PrivateToken(token)) => builder.header("PRIVATE-TOKEN", token.expose()),
            None => builder,
        };

        let response = builder.send().await.map_err(|err| classify(url, err))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.json::<Value>().await.map_err(|err| classify(url, err))
    }
}

#[async_trait]
impl ApiClient for HttpClient {
    async fn get_json(&self, request: &ApiRequest) -> Result<Value, FetchError> {
        // 200ms, 400ms, 800ms... capped
        let strategy = ExponentialBackoff::from_millis(2)
            .factor(STARTING_BACKOFF_DELAY_MS / 2)
            .max_delay(Duration::from_millis(MAX_BACKOFF_DELAY_MS))
            .map(jitter)
            .take(self.max_retries);

        // renamed to `start` in newer tokio-retry releases
        #[allow(deprecated)]
        let result = RetryIf::spawn(
            strategy,
            || self.send_once(request),
            |err: &FetchError| {
                let retry = err.is_transient();
                if retry {
                    debug!(target: "fetch", "Retrying after transient failure: {}", err);
                }
                retry
            },
        )
        .await;

        result
    }
}

fn classify(url: &str, err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else if err.is_decode() {
        FetchError::Decode {
            url: url.to_string(),
            reason: err.to_string(),
        }
    } else {
        FetchError::Transport {
            url: url.to_string(),
            source: err,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::Token;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::Mutex;

    fn local_client() -> HttpClient {
        client_with_timeout(Duration::from_secs(5))
    }

    fn client_with_timeout(timeout: Duration) -> HttpClient {
        HttpClient::from_builder(reqwest::Client::builder().no_proxy(), timeout).unwrap()
    }

    /// Accepts connections and holds them open without ever replying.
    async fn serve_silence() -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));

        let hit_counter = Arc::clone(&hits);
        tokio::spawn(async move {
            let mut open = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                hit_counter.fetch_add(1, Ordering::SeqCst);
                open.push(socket);
            }
        });

        (format!("http://{address}"), hits)
    }

    /// Serves one canned response per connection, in order, then repeats the last.
    async fn serve(
        responses: Vec<(u16, &'static str)>,
    ) -> (String, Arc<AtomicUsize>, Arc<Mutex<Vec<String>>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let requests = Arc::new(Mutex::new(Vec::new()));

        let hit_counter = Arc::clone(&hits);
        let request_log = Arc::clone(&requests);
        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    return;
                };
                let index = hit_counter.fetch_add(1, Ordering::SeqCst);
                let (status, body) = responses[index.min(responses.len() - 1)];

                let mut raw = Vec::new();
                let mut buf = [0u8; 1024];
                while !raw.windows(4).any(|window| window == b"\r\n\r\n") {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => break,
                        Ok(read) => raw.extend_from_slice(&buf[..read]),
                    }
                }
                request_log.lock().await.push(String::from_utf8_lossy(&raw).to_lowercase());

                let reply = format!(
                    "HTTP/1.1 {status} X\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(reply.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        (format!("http://{address}"), hits, requests)
    }

    #[tokio::test]
    async fn test_retries_transient_status_then_succeeds() {
        let (base, hits, _) = serve(vec![(503, "{}"), (503, "{}"), (200, r#"{"ok":true}"#)]).await;
        let client = local_client().with_max_retries(2);

        let value = client.get_json(&ApiRequest::new(format!("{base}/x"))).await.unwrap();

        assert_eq!(value["ok"], true);
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_not_found_is_not_retried() {
        let (base, hits, _) = serve(vec![(404, r#"{"error":"Not found"}"#)]).await;
        let client = local_client().with_max_retries(2);

        let err = client.get_json(&ApiRequest::new(format!("{base}/missing"))).await.unwrap_err();

        assert!(matches!(err, FetchError::Status { status: 404, .. }));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_auth_headers_and_user_agent_are_sent() {
        let (base, _, requests) = serve(vec![(200, "{}")]).await;
        let client = local_client();

        client
            .get_json(
                &ApiRequest::new(format!("{base}/a"))
                    .with_auth(Some(Auth::Bearer(Token::new("gh-token")))),
            )
            .await
            .unwrap();
        client
            .get_json(
                &ApiRequest::new(format!("{base}/b"))
                    .with_auth(Some(Auth::PrivateToken(Token::new("gl-token")))),
            )
            .await
            .unwrap();

        let log = requests.lock().await;
        assert!(log[0].contains("authorization: bearer gh-token"));
        assert!(log[0].contains("user-agent: catalog-enrich/"));
        assert!(log[1].contains("private-token: gl-token"));
    }

    #[tokio::test]
    async fn test_invalid_json_is_decode_error() {
        let (base, _, _) = serve(vec![(200, "not json")]).await;
        let client = local_client();

        let err = client.get_json(&ApiRequest::new(base)).await.unwrap_err();

        assert!(matches!(err, FetchError::Decode { .. }));
    }

    #[tokio::test]
    async fn test_timeout_is_retried_then_reported() {
        let (base, hits) = serve_silence().await;
        let client = client_with_timeout(Duration::from_millis(200)).with_max_retries(1);

        let err = client.get_json(&ApiRequest::new(format!("{base}/slow"))).await.unwrap_err();

        assert!(matches!(err, FetchError::Timeout { .. }), "got {err:?}");
        assert!(err.is_transient());
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }
}
