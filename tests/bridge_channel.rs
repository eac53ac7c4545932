use std::sync::Arc;
use std::time::Duration;

use chp_lighting_lib::bridge::{
    stdio, AppInfo, BridgeClient, BridgeError, BridgeEvent, BridgeRequest, EventKind, StateSnapshot,
};
use chp_lighting_lib::config::AppSettings;
use chp_lighting_lib::serial::MockPortDriver;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::{broadcast, mpsc};

fn app_info() -> BridgeEvent {
    BridgeEvent::AppInfoResponse(AppInfo {
        app_name: "CHP Lighting Controller".to_string(),
        app_version: "DEVELOPMENT".to_string(),
    })
}

#[tokio::test]
async fn first_response_wins_and_duplicates_are_ignored() {
    let (request_tx, mut request_rx) = mpsc::channel(8);
    let (events_tx, _) = broadcast::channel(16);
    let client = BridgeClient::new(request_tx, events_tx.clone());

    let responder = tokio::spawn(async move {
        while let Some(request) = request_rx.recv().await {
            if request == BridgeRequest::AppInfoRequest {
                // Unrelated traffic, the answer, then a late duplicate
                let _ = events_tx.send(BridgeEvent::StateBroadcast(StateSnapshot { chp_state: None }));
                let _ = events_tx.send(app_info());
                let _ = events_tx.send(BridgeEvent::AppInfoResponse(AppInfo {
                    app_name: "late".to_string(),
                    app_version: "late".to_string(),
                }));
            }
        }
    });

    let event = client.request_once(BridgeRequest::AppInfoRequest).await.unwrap();
    assert_eq!(event, app_info());

    drop(client);
    responder.await.unwrap();
}

#[tokio::test]
async fn request_once_times_out_without_answer() {
    let (request_tx, _request_rx) = mpsc::channel(8);
    let (events_tx, _) = broadcast::channel(16);
    let client = BridgeClient::new(request_tx, events_tx);

    let err = client
        .request_once_timeout(BridgeRequest::PortScanRequest, Duration::from_millis(20))
        .await
        .unwrap_err();
    assert!(matches!(err, BridgeError::Timeout(EventKind::PortScanResponse)));
}

#[tokio::test]
async fn send_fails_once_controller_is_gone() {
    let (request_tx, request_rx) = mpsc::channel(8);
    let (events_tx, _) = broadcast::channel(16);
    let client = BridgeClient::new(request_tx, events_tx);
    drop(request_rx);

    let err = client.send(BridgeRequest::StateRequest).await.unwrap_err();
    assert!(matches!(err, BridgeError::ChannelClosed));
}

#[tokio::test]
async fn stdio_transport_round_trip() {
    let settings = AppSettings {
        development: true,
        ..AppSettings::default()
    };
    let driver = MockPortDriver::with_ports(&["COM3"]);
    let controller = chp_lighting_lib::start(&settings, Arc::new(driver));
    let client = controller.client();
    let events = client.subscribe();

    let (mut ui_in, bridge_in) = tokio::io::duplex(4096);
    let (bridge_out, ui_out) = tokio::io::duplex(4096);
    let server = tokio::spawn(stdio::serve(client, events, BufReader::new(bridge_in), bridge_out));

    ui_in
        .write_all(b"{\"kind\":\"AppInfoRequest\"}\nnot json\n\n{\"kind\":\"PortConnectRequest\",\"payload\":{\"path\":\"COM3\"}}\n")
        .await
        .unwrap();

    let mut lines = BufReader::new(ui_out).lines();
    let first: serde_json::Value = serde_json::from_str(&lines.next_line().await.unwrap().unwrap()).unwrap();
    assert_eq!(
        first,
        serde_json::json!({"kind": "AppInfoResponse", "payload": {"appName": "CHP Lighting Controller", "appVersion": "DEVELOPMENT"}})
    );

    let second: serde_json::Value = serde_json::from_str(&lines.next_line().await.unwrap().unwrap()).unwrap();
    assert_eq!(
        second,
        serde_json::json!({"kind": "ConnectionStatusBroadcast", "payload": {"comStatus": true, "comPort": "COM3"}})
    );

    drop(ui_in);
    server.await.unwrap().unwrap();
    controller.shutdown().await;
}
