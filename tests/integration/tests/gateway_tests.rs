//! Gateway Integration Tests
//!
//! Each test spawns a gateway on an ephemeral port and talks to it with real
//! WebSocket and HTTP clients. No external services are required.
//!
//! Run with: cargo test -p integration-tests --test gateway_tests

use std::time::Duration;

use cctv_common::HubConfig;
use cctv_gateway::events::{CameraStatus, Severity};
use integration_tests::{
    alert, assert_json, config_with_hub, process_status, sequence_event, TestServer, WsClient,
};
use reqwest::StatusCode;
use serde_json::json;
use tokio_tungstenite::tungstenite;

// ============================================================================
// HTTP Surface
// ============================================================================

#[tokio::test]
async fn test_health_check() {
    let server = TestServer::start().await.expect("Failed to start server");

    let response = server.get("/health").await.unwrap();
    let body = assert_json(response, StatusCode::OK).await.unwrap();

    assert_eq!(body, json!({"status": "healthy", "service": "cctv-backend"}));
}

#[tokio::test]
async fn test_service_info() {
    let server = TestServer::start().await.expect("Failed to start server");

    let response = server.get("/").await.unwrap();
    let body = assert_json(response, StatusCode::OK).await.unwrap();

    assert_eq!(body["name"], "cctv-backend");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_stats_reflect_traffic() {
    let server = TestServer::start().await.expect("Failed to start server");
    let mut a = server.connect().await.unwrap();
    let mut b = server.connect().await.unwrap();

    server.hub().publish(sequence_event(1)).await;
    a.next_json().await.unwrap();
    b.next_json().await.unwrap();

    let response = server.get("/ws/stats").await.unwrap();
    let body = assert_json(response, StatusCode::OK).await.unwrap();

    assert_eq!(
        body,
        json!({"connections": 2, "published": 1, "delivered": 2, "failed": 0})
    );
}

// ============================================================================
// Connection Lifecycle
// ============================================================================

#[tokio::test]
async fn test_welcome_is_first_frame() {
    let server = TestServer::start().await.expect("Failed to start server");

    let mut client = WsClient::connect(&server.ws_url()).await.unwrap();
    let welcome = client.next_json().await.unwrap();

    assert_eq!(
        welcome,
        json!({"type": "connected", "message": "Connected to CCTV monitoring events"})
    );
    server.wait_for_connections(1).await.unwrap();
}

#[tokio::test]
async fn test_client_close_deregisters() {
    let server = TestServer::start().await.expect("Failed to start server");
    let client = server.connect().await.unwrap();
    server.wait_for_connections(1).await.unwrap();

    client.close().await.unwrap();

    server.wait_for_connections(0).await.unwrap();
}

#[tokio::test]
async fn test_capacity_refuses_extra_clients() {
    let server = TestServer::start_with_config(config_with_hub(HubConfig {
        max_connections: Some(1),
        ..HubConfig::default()
    }))
    .await
    .expect("Failed to start server");

    let mut first = server.connect().await.unwrap();

    let err = WsClient::connect(&server.ws_url())
        .await
        .err()
        .expect("second client should be refused");
    match err.downcast_ref::<tungstenite::Error>() {
        Some(tungstenite::Error::Http(response)) => {
            assert_eq!(response.status().as_u16(), 503);
        }
        other => panic!("Expected HTTP 503, got {other:?}"),
    }

    // The admitted client is unaffected
    server.hub().publish(sequence_event(7)).await;
    assert_eq!(first.next_json().await.unwrap()["data"]["seq"], 7);
    assert_eq!(server.hub().connection_count(), 1);
}

#[tokio::test]
async fn test_slot_frees_after_disconnect() {
    let server = TestServer::start_with_config(config_with_hub(HubConfig {
        max_connections: Some(1),
        ..HubConfig::default()
    }))
    .await
    .expect("Failed to start server");

    let first = server.connect().await.unwrap();
    first.close().await.unwrap();
    server.wait_for_connections(0).await.unwrap();

    server.connect().await.expect("slot should be free again");
}

#[tokio::test]
async fn test_shutdown_sends_going_away() {
    let server = TestServer::start().await.expect("Failed to start server");
    let mut a = server.connect().await.unwrap();
    let mut b = server.connect().await.unwrap();
    let hub = server.hub().clone();

    server.shutdown().await.unwrap();

    assert_eq!(a.expect_close().await.unwrap(), 1001);
    assert_eq!(b.expect_close().await.unwrap(), 1001);
    assert_eq!(hub.connection_count(), 0);
    assert!(hub.registry().is_closed());
}

// ============================================================================
// Heartbeat
// ============================================================================

#[tokio::test]
async fn test_ping_gets_single_pong() {
    let server = TestServer::start().await.expect("Failed to start server");
    let mut client = server.connect().await.unwrap();

    client.send_text("ping").await.unwrap();

    assert_eq!(client.next_json().await.unwrap(), json!({"type": "pong"}));
    client
        .expect_silence(Duration::from_millis(200))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_unknown_text_is_ignored() {
    let server = TestServer::start().await.expect("Failed to start server");
    let mut client = server.connect().await.unwrap();

    client.send_text("hello").await.unwrap();
    client.send_text(r#"{"type":"ping"}"#).await.unwrap();
    client
        .expect_silence(Duration::from_millis(200))
        .await
        .unwrap();

    // Still registered and receiving
    server.hub().publish(sequence_event(1)).await;
    assert_eq!(client.next_json().await.unwrap()["type"], "test.sequence");
}

#[tokio::test]
async fn test_silent_client_times_out() {
    let server = TestServer::start_with_config(config_with_hub(HubConfig {
        heartbeat_timeout_ms: Some(200),
        ..HubConfig::default()
    }))
    .await
    .expect("Failed to start server");

    let mut silent = server.connect().await.unwrap();

    assert_eq!(silent.expect_close().await.unwrap(), 4002);
    server.wait_for_connections(0).await.unwrap();
}

#[tokio::test]
async fn test_pinging_client_stays_connected() {
    let server = TestServer::start_with_config(config_with_hub(HubConfig {
        heartbeat_timeout_ms: Some(300),
        ..HubConfig::default()
    }))
    .await
    .expect("Failed to start server");

    let mut client = server.connect().await.unwrap();
    for _ in 0..6 {
        tokio::time::sleep(Duration::from_millis(100)).await;
        client.send_text("ping").await.unwrap();
        assert_eq!(client.next_json().await.unwrap(), json!({"type": "pong"}));
    }

    assert_eq!(server.hub().connection_count(), 1);
}

// ============================================================================
// Broadcast
// ============================================================================

#[tokio::test]
async fn test_alert_reaches_every_client() {
    let server = TestServer::start().await.expect("Failed to start server");
    let mut clients = Vec::new();
    for _ in 0..3 {
        clients.push(server.connect().await.unwrap());
    }

    let payload = alert(12, Severity::High);
    server.hub().broadcast_alert(&payload).await;

    for client in &mut clients {
        let frame = client.next_json().await.unwrap();
        assert_eq!(frame["type"], "alert.new");
        assert_eq!(frame["data"]["id"], payload.id.as_str());
        assert_eq!(frame["data"]["cameraId"], 12);
        assert_eq!(frame["data"]["type"], "intrusion");
        assert_eq!(frame["data"]["severity"], "high");
    }
}

#[tokio::test]
async fn test_status_events_wire_format() {
    let server = TestServer::start().await.expect("Failed to start server");
    let mut client = server.connect().await.unwrap();

    server
        .hub()
        .broadcast_process_status(&process_status("detector"))
        .await;
    server
        .hub()
        .broadcast_camera_status(3, CameraStatus::Error, Some("stream lost".to_string()))
        .await;

    assert_eq!(
        client.next_json().await.unwrap(),
        json!({
            "type": "process.status_changed",
            "data": {
                "name": "detector",
                "status": "running",
                "pid": 4242,
                "cpuPercent": 12.5,
                "memoryMB": 256.0
            }
        })
    );
    assert_eq!(
        client.next_json().await.unwrap(),
        json!({
            "type": "camera.status_changed",
            "data": {"cameraId": 3, "status": "error", "message": "stream lost"}
        })
    );
}

#[tokio::test]
async fn test_events_arrive_in_publish_order() {
    let server = TestServer::start().await.expect("Failed to start server");
    let mut a = server.connect().await.unwrap();
    let mut b = server.connect().await.unwrap();

    for seq in 0..50 {
        server.hub().publish(sequence_event(seq)).await;
    }

    for client in [&mut a, &mut b] {
        for seq in 0..50 {
            let frame = client.next_json().await.unwrap();
            assert_eq!(frame["data"]["seq"], seq);
        }
    }
}

#[tokio::test]
async fn test_abrupt_disconnect_spares_other_clients() {
    let server = TestServer::start().await.expect("Failed to start server");
    let mut a = server.connect().await.unwrap();
    let dropped = server.connect().await.unwrap();
    let mut c = server.connect().await.unwrap();
    server.wait_for_connections(3).await.unwrap();

    dropped.abort();

    server.hub().publish(sequence_event(1)).await;
    server.hub().publish(sequence_event(2)).await;

    for client in [&mut a, &mut c] {
        assert_eq!(client.next_json().await.unwrap()["data"]["seq"], 1);
        assert_eq!(client.next_json().await.unwrap()["data"]["seq"], 2);
    }
    server.wait_for_connections(2).await.unwrap();
}

#[tokio::test]
async fn test_malformed_frame_closes_with_protocol_error() {
    let server = TestServer::start().await.expect("Failed to start server");
    let mut offender = server.connect().await.unwrap();
    let mut bystander = server.connect().await.unwrap();
    server.wait_for_connections(2).await.unwrap();

    offender.send_invalid_text().await.unwrap();

    assert_eq!(offender.expect_close().await.unwrap(), 1002);
    server.wait_for_connections(1).await.unwrap();

    server.hub().publish(sequence_event(1)).await;
    assert_eq!(bystander.next_json().await.unwrap()["data"]["seq"], 1);
}

#[tokio::test]
async fn test_reconnect_gets_fresh_connection() {
    let server = TestServer::start().await.expect("Failed to start server");
    let first = server.connect().await.unwrap();

    server.hub().publish(sequence_event(1)).await;
    first.close().await.unwrap();
    server.wait_for_connections(0).await.unwrap();

    // Events published while disconnected are not replayed
    server.hub().publish(sequence_event(2)).await;

    let mut second = server.connect().await.unwrap();
    server.hub().publish(sequence_event(3)).await;
    assert_eq!(second.next_json().await.unwrap()["data"]["seq"], 3);
}
