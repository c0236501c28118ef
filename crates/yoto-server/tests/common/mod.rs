//! Common test utilities for integration tests.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Result;
use reqwest::Client;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use wiremock::MockServer;

use yoto_oauth::{OAuthConfig, ServerCredentials};
use yoto_server::{Server, ServerConfig};

/// A proxy running in the background against a fake Yoto.
pub struct TestServer {
    /// The proxy's address.
    pub addr: SocketAddr,
    /// HTTP client that does not follow redirects.
    pub client: Client,
    /// Fake identity provider and resource API.
    pub upstream: MockServer,
    /// Handle to the server task.
    _handle: JoinHandle<()>,
}

impl TestServer {
    /// Start a proxy where callers bring their own client credentials.
    pub async fn start() -> Result<Self> {
        Self::start_with(|_| ServerCredentials::default()).await
    }

    /// Start a proxy in server-credential mode.
    pub async fn start_server_mode(refresh_token: Option<&str>) -> Result<Self> {
        let refresh_token = refresh_token.map(str::to_string);
        Self::start_with(move |_| ServerCredentials {
            use_env_credentials: true,
            client_id: Some("server-id".to_string()),
            client_secret: Some("server-secret".to_string()),
            refresh_token,
            api_base_url: None,
        })
        .await
    }

    /// Start a proxy with credentials built against the upstream URI.
    pub async fn start_with<F>(credentials: F) -> Result<Self>
    where
        F: FnOnce(&str) -> ServerCredentials,
    {
        let upstream = MockServer::start().await;
        let addr = find_available_port().await?;

        let mut credentials = credentials(&upstream.uri());
        credentials.api_base_url = Some(upstream.uri());

        let config = ServerConfig::new()
            .with_bind_address(addr)
            .with_request_timeout(Duration::from_secs(5))
            .with_oauth(
                OAuthConfig::yoto()
                    .with_token_url(format!("{}/oauth/token", upstream.uri()))
                    .with_authorize_url(format!("{}/oauth/authorize", upstream.uri())),
            )
            .with_credentials(credentials);

        let server = Server::new(config)?;
        let handle = tokio::spawn(async move {
            let _ = server.run_on(addr).await;
        });

        let client = Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        wait_for_server(&client, addr).await?;

        Ok(Self {
            addr,
            client,
            upstream,
            _handle: handle,
        })
    }

    /// Get the base URL for the server.
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// GET request builder for an API path.
    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.get(format!("{}/api{}", self.base_url(), path))
    }

    /// POST request builder for an API path.
    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.post(format!("{}/api{}", self.base_url(), path))
    }
}

/// Find an available port for the test server.
async fn find_available_port() -> Result<SocketAddr> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);
    Ok(addr)
}

/// Wait for the server to become ready.
async fn wait_for_server(client: &Client, addr: SocketAddr) -> Result<()> {
    let url = format!("http://{}/health", addr);

    let result = timeout(Duration::from_secs(5), async {
        loop {
            match client.get(&url).send().await {
                Ok(resp) if resp.status().is_success() => return,
                _ => tokio::time::sleep(Duration::from_millis(50)).await,
            }
        }
    })
    .await;

    match result {
        Ok(()) => Ok(()),
        Err(_) => anyhow::bail!("Timeout waiting for server to start"),
    }
}
