//! Test helpers for integration tests
//!
//! Provides a spawned gateway server, a WebSocket test client, and response
//! assertions.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use cctv_common::AppConfig;
use cctv_gateway::{create_app, create_gateway_state, run_server, EventHub};
use futures_util::{SinkExt, StreamExt};
use reqwest::{Client, Response, StatusCode};
use serde_json::Value;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::protocol::frame::coding::{Data, OpCode};
use tokio_tungstenite::tungstenite::protocol::frame::Frame;
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

/// How long a test waits for an expected frame
pub const RECV_TIMEOUT: Duration = Duration::from_secs(5);

/// Test server instance that manages lifecycle
pub struct TestServer {
    pub addr: SocketAddr,
    pub client: Client,
    hub: Arc<EventHub>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl TestServer {
    /// Start a new test server with default hub settings
    pub async fn start() -> Result<Self> {
        Self::start_with_config(test_config()?).await
    }

    /// Start a test server with custom config
    pub async fn start_with_config(config: AppConfig) -> Result<Self> {
        let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0))).await?;
        let addr = listener.local_addr()?;

        let state = create_gateway_state(config);
        let hub = state.hub().clone();
        let app = create_app(state);

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let server_hub = hub.clone();
        let handle = tokio::spawn(async move {
            let shutdown = async move {
                let _ = shutdown_rx.await;
            };
            run_server(app, listener, server_hub, shutdown).await.ok();
        });

        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;

        Ok(Self {
            addr,
            client,
            hub,
            shutdown_tx: Some(shutdown_tx),
            handle,
        })
    }

    /// The hub producers publish through
    pub fn hub(&self) -> &Arc<EventHub> {
        &self.hub
    }

    /// Get base URL for the server
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// WebSocket URL of the events endpoint
    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws/events", self.addr)
    }

    /// Make a GET request
    pub async fn get(&self, path: &str) -> Result<Response> {
        let url = format!("{}{}", self.base_url(), path);
        Ok(self.client.get(&url).send().await?)
    }

    /// Connect a client and consume its welcome frame
    ///
    /// The welcome is only written once the connection is registered, so
    /// the client is guaranteed to see every event published afterwards.
    pub async fn connect(&self) -> Result<WsClient> {
        let mut client = WsClient::connect(&self.ws_url()).await?;
        let welcome = client.next_json().await?;
        if welcome["type"] != "connected" {
            bail!("Expected welcome frame, got {welcome}");
        }
        Ok(client)
    }

    /// Poll until the hub holds exactly `expected` connections
    pub async fn wait_for_connections(&self, expected: usize) -> Result<()> {
        let deadline = tokio::time::Instant::now() + RECV_TIMEOUT;
        while self.hub.connection_count() != expected {
            if tokio::time::Instant::now() >= deadline {
                bail!(
                    "Expected {expected} connections, hub has {}",
                    self.hub.connection_count()
                );
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        Ok(())
    }

    /// Trigger graceful shutdown and wait for the server task
    pub async fn shutdown(mut self) -> Result<()> {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        tokio::time::timeout(RECV_TIMEOUT, &mut self.handle).await??;
        Ok(())
    }
}

/// WebSocket client for testing
pub struct WsClient {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl WsClient {
    /// Open a WebSocket without reading anything
    pub async fn connect(url: &str) -> Result<Self> {
        let (stream, _) = connect_async(url).await?;
        Ok(Self { stream })
    }

    /// Send a text frame
    pub async fn send_text(&mut self, text: &str) -> Result<()> {
        self.stream.send(Message::Text(text.to_string())).await?;
        Ok(())
    }

    /// Send a text frame whose payload is not valid UTF-8
    pub async fn send_invalid_text(&mut self) -> Result<()> {
        let frame = Frame::message(vec![0xff, 0xfe, 0xfd], OpCode::Data(Data::Text), true);
        self.stream.send(Message::Frame(frame)).await?;
        Ok(())
    }

    /// Next text frame, parsed as JSON
    pub async fn next_json(&mut self) -> Result<Value> {
        loop {
            let msg = tokio::time::timeout(RECV_TIMEOUT, self.stream.next()).await?;
            match msg {
                Some(Ok(Message::Text(text))) => return Ok(serde_json::from_str(&text)?),
                Some(Ok(Message::Ping(_) | Message::Pong(_))) => {}
                Some(Ok(other)) => bail!("Expected text frame, got {other:?}"),
                Some(Err(e)) => bail!("WebSocket error: {e}"),
                None => bail!("WebSocket stream ended"),
            }
        }
    }

    /// Wait for the server's close frame and return its code
    ///
    /// Text frames that arrive first are skipped.
    pub async fn expect_close(&mut self) -> Result<u16> {
        loop {
            let msg = tokio::time::timeout(RECV_TIMEOUT, self.stream.next()).await?;
            match msg {
                Some(Ok(Message::Close(Some(frame)))) => return Ok(u16::from(frame.code)),
                Some(Ok(Message::Close(None))) => bail!("Close frame without a code"),
                Some(Ok(_)) => {}
                Some(Err(e)) => bail!("WebSocket error before close frame: {e}"),
                None => bail!("WebSocket stream ended without a close frame"),
            }
        }
    }

    /// Assert that no text frame arrives within `window`
    pub async fn expect_silence(&mut self, window: Duration) -> Result<()> {
        match tokio::time::timeout(window, self.stream.next()).await {
            Err(_) => Ok(()),
            Ok(Some(Ok(Message::Text(text)))) => bail!("Unexpected frame: {text}"),
            Ok(other) => bail!("Unexpected stream activity: {other:?}"),
        }
    }

    /// Close the connection with a proper close handshake
    pub async fn close(mut self) -> Result<()> {
        self.stream.close(None).await?;
        Ok(())
    }

    /// Drop the TCP connection without a close handshake
    pub fn abort(self) {
        drop(self.stream);
    }
}

/// Create a test configuration with default hub settings
pub fn test_config() -> Result<AppConfig> {
    AppConfig::from_lookup(|_| None).map_err(|e| anyhow::anyhow!("Config error: {e}"))
}

/// Assert response status and parse JSON body
pub async fn assert_json(response: Response, expected_status: StatusCode) -> Result<Value> {
    let status = response.status();
    if status != expected_status {
        let body = response.text().await?;
        bail!("Expected status {expected_status}, got {status}. Body: {body}");
    }
    Ok(response.json().await?)
}
