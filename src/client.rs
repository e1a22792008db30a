//! Blocking HTTP client for the keyvalue service

use std::fmt;
use std::sync::Arc;

use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::{Method, Request, StatusCode, Uri};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client as HttpClient;
use hyper_util::rt::{TokioExecutor, TokioTimer};
use tokio::runtime::Runtime;
use tracing::debug;
use url::Url;

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::keyvalue::KeyValue;
use crate::transport::{strip_trailing_newline, Transport};

type HttpsConnector = hyper_rustls::HttpsConnector<HttpConnector>;

/// Build a rustls ClientConfig trusting the webpki root set.
fn build_tls_config() -> Result<rustls::ClientConfig> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());

    let mut roots = rustls::RootCertStore::empty();
    roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

    Ok(rustls::ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(|e| Error::Tls(e.to_string()))?
        .with_root_certificates(roots)
        .with_no_client_auth())
}

/// Check the base URL and drop any trailing `/` so paths can be appended.
fn normalize_base_url(base_url: &str) -> Result<String> {
    let url = Url::parse(base_url)
        .map_err(|e| Error::InvalidUrl(format!("Invalid base URL '{}': {}", base_url, e)))?;

    match url.scheme() {
        "http" | "https" => {}
        other => {
            return Err(Error::InvalidUrl(format!(
                "Unsupported scheme '{}', expected http or https",
                other
            )))
        }
    }

    if url.query().is_some() || url.fragment().is_some() {
        return Err(Error::InvalidUrl(format!(
            "Base URL must not carry a query or fragment: {}",
            base_url
        )));
    }

    Ok(url.as_str().trim_end_matches('/').to_string())
}

/// Render a hyper error together with its cause, the outer message alone is rarely useful.
fn describe(err: &dyn std::error::Error) -> String {
    match err.source() {
        Some(source) => format!("{}: {}", err, source),
        None => err.to_string(),
    }
}

/// HTTP client for the keyvalue service
///
/// The API is blocking: every request runs to completion on a private
/// tokio runtime owned by the client. Do not call it from inside another
/// async runtime.
///
/// Cloning is cheap and clones share the runtime and connection pool.
///
/// # Example
/// ```rust,no_run
/// use keyvalue_client::{Client, ClientConfig};
///
/// fn main() -> Result<(), keyvalue_client::Error> {
///     // The public service at https://api.keyvalue.xyz
///     let client = Client::default_service()?;
///
///     // A self-hosted compatible service with a shorter timeout
///     let client = Client::with_config(ClientConfig {
///         base_url: "http://localhost:8080".to_string(),
///         response_timeout_ms: 2_000,
///         ..Default::default()
///     })?;
///
///     let mut kv = client.create("my-key")?;
///     kv.set("hello")?;
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct Client {
    config: Arc<ClientConfig>,
    base_url: Arc<str>,
    runtime: Arc<Runtime>,
    http_client: HttpClient<HttpsConnector, Full<Bytes>>,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.base_url)
            .field("config", &self.config)
            .finish()
    }
}

impl Client {
    /// Create a client for the service at `base_url` with default timeouts
    ///
    /// # Errors
    /// Returns an error if the URL is invalid or the runtime cannot start
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_config(ClientConfig::with_base_url(base_url))
    }

    /// Create a client for the public keyvalue.xyz service
    pub fn default_service() -> Result<Self> {
        Self::with_config(ClientConfig::default())
    }

    /// Create a client configured from `KEYVALUE_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::with_config(ClientConfig::from_env()?)
    }

    /// Create a new client with custom configuration
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        let base_url = normalize_base_url(&config.base_url)?;
        let tls_config = build_tls_config()?;

        let mut http = HttpConnector::new();
        http.enforce_http(false);
        http.set_connect_timeout(Some(config.connect_timeout()));
        http.set_keepalive(Some(config.keepalive()));
        http.set_nodelay(true);

        let https_connector = hyper_rustls::HttpsConnectorBuilder::new()
            .with_tls_config(tls_config)
            .https_or_http()
            .enable_http1()
            .wrap_connector(http);

        let http_client = HttpClient::builder(TokioExecutor::new())
            .pool_idle_timeout(config.pool_idle_timeout())
            .pool_timer(TokioTimer::new())
            .build(https_connector);

        // One worker keeps pooled connections serviced between blocking calls
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("keyvalue-client")
            .enable_all()
            .build()?;

        Ok(Self {
            config: Arc::new(config),
            base_url: base_url.into(),
            runtime: Arc::new(runtime),
            http_client,
        })
    }

    /// The normalized base URL requests are sent below
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The configuration this client was built with
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Ask the service for a new slot named `key`
    ///
    /// See [`KeyValue::create`].
    pub fn create(&self, key: &str) -> Result<KeyValue<Client>> {
        KeyValue::create(self.clone(), key)
    }

    /// Rebuild a handle from a known token and key without any request
    ///
    /// See [`KeyValue::from_credentials`].
    pub fn key_value(&self, token: &str, key: &str) -> KeyValue<Client> {
        KeyValue::from_credentials(self.clone(), token, key)
    }

    /// Issue the request and collect status and body within the response timeout.
    async fn execute(&self, request: Request<Full<Bytes>>) -> Result<(StatusCode, Bytes)> {
        let timeout_ms = self.config.response_timeout_ms;

        let exchange = async {
            let response = self
                .http_client
                .request(request)
                .await
                .map_err(|e| Error::Transport(format!("Request failed: {}", describe(&e))))?;

            let status = response.status();
            let body = response
                .into_body()
                .collect()
                .await
                .map_err(|e| Error::Transport(format!("Failed to read body: {}", describe(&e))))?
                .to_bytes();

            Ok::<_, Error>((status, body))
        };

        tokio::time::timeout(self.config.response_timeout(), exchange)
            .await
            .map_err(|_| Error::Timeout(timeout_ms))?
    }
}

impl Transport for Client {
    fn send(&self, method: Method, path: &str) -> Result<String> {
        let url = format!("{}{}", self.base_url, path);
        let uri: Uri = url
            .parse()
            .map_err(|e| Error::InvalidUrl(format!("Invalid request URL: {}", e)))?;

        let request = Request::builder()
            .method(method.clone())
            .uri(uri)
            .body(Full::new(Bytes::new()))
            .map_err(|e| Error::InvalidUrl(format!("Failed to build request: {}", e)))?;

        debug!("Sending request: {} {}", method, path);

        let (status, body) = self.runtime.block_on(self.execute(request))?;

        debug!("Response: {} {} -> {}", method, path, status);

        if status != StatusCode::OK {
            return Err(Error::Remote {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("").to_string(),
            });
        }

        let text = String::from_utf8(body.to_vec())
            .map_err(|e| Error::Transport(format!("Response body is not valid UTF-8: {}", e)))?;

        Ok(strip_trailing_newline(text))
    }
}
