use std::net::SocketAddr;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{
    connect_async,
    tungstenite::{self, Message},
    MaybeTlsStream, WebSocketStream,
};

use cinescape::{
    config::Config,
    create_router,
    models::{Snapshot, TrendingEntry},
    AppState,
};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Serves the router on an ephemeral port in demo mode
async fn spawn_server(config: Config) -> (SocketAddr, AppState) {
    let state = AppState::new(config, None);
    let app = create_router(state.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });

    (addr, state)
}

async fn connect(addr: SocketAddr) -> Client {
    let (client, _) = connect_async(format!("ws://{}/ws", addr)).await.unwrap();
    client
}

/// Next non-heartbeat frame from the server
async fn next_frame(client: &mut Client) -> Message {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match client.next().await.expect("socket ended").unwrap() {
                Message::Ping(_) | Message::Pong(_) => continue,
                other => return other,
            }
        }
    })
    .await
    .expect("timed out waiting for a frame")
}

async fn next_payload(client: &mut Client) -> Value {
    match next_frame(client).await {
        Message::Text(text) => serde_json::from_str(&text).unwrap(),
        other => panic!("expected a text frame, got {:?}", other),
    }
}

fn movie_ids(payload: &Value) -> Vec<u64> {
    payload["movies"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["id"].as_u64().unwrap())
        .collect()
}

/// Waits for the server side of a connection to deregister
async fn wait_for_viewers(state: &AppState, expected: usize) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while state.hub.viewer_count() != expected {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap_or_else(|_| {
        panic!(
            "expected {} viewers, still {}",
            expected,
            state.hub.viewer_count()
        )
    });
}

#[tokio::test]
async fn test_websocket_receives_snapshot_then_delta() {
    let (addr, state) = spawn_server(Config::default()).await;
    state.hub.publish(Snapshot::new(vec![
        TrendingEntry::new(1, "Alpha"),
        TrendingEntry::new(2, "Beta"),
    ]));

    let mut client = connect(addr).await;

    let initial = next_payload(&mut client).await;
    assert_eq!(movie_ids(&initial), vec![1, 2]);
    assert!(initial["timestamp"].as_str().unwrap().ends_with('Z'));
    assert_eq!(state.hub.viewer_count(), 1);

    state.hub.publish(Snapshot::new(vec![
        TrendingEntry::new(1, "Alpha"),
        TrendingEntry::new(2, "Beta"),
        TrendingEntry::new(3, "Gamma"),
    ]));

    let delta = next_payload(&mut client).await;
    assert_eq!(movie_ids(&delta), vec![3]);
    assert_eq!(delta["movies"][0]["title"], "Gamma");

    client.close(None).await.unwrap();
    wait_for_viewers(&state, 0).await;
}

#[tokio::test]
async fn test_websocket_before_first_poll_gets_empty_payload() {
    let (addr, state) = spawn_server(Config::default()).await;
    let mut client = connect(addr).await;

    let initial = next_payload(&mut client).await;
    assert!(movie_ids(&initial).is_empty());

    client.close(None).await.unwrap();
    wait_for_viewers(&state, 0).await;
}

#[tokio::test]
async fn test_websocket_closed_when_hub_drops_viewer() {
    let (addr, state) = spawn_server(Config::default()).await;
    let mut client = connect(addr).await;
    next_payload(&mut client).await;

    assert_eq!(state.hub.close_all(), 1);

    assert!(matches!(next_frame(&mut client).await, Message::Close(_)));
    assert_eq!(state.hub.viewer_count(), 0);
}

#[tokio::test]
async fn test_websocket_transport_abort_deregisters() {
    let (addr, state) = spawn_server(Config::default()).await;
    let mut client = connect(addr).await;
    next_payload(&mut client).await;
    assert_eq!(state.hub.viewer_count(), 1);

    // No close handshake
    drop(client);
    wait_for_viewers(&state, 0).await;
}

#[tokio::test]
async fn test_websocket_rejected_when_registry_full() {
    let config = Config {
        max_viewers: 1,
        ..Config::default()
    };
    let (addr, state) = spawn_server(config).await;
    let mut first = connect(addr).await;
    next_payload(&mut first).await;

    match connect_async(format!("ws://{}/ws", addr)).await {
        Err(tungstenite::Error::Http(response)) => assert_eq!(response.status(), 503),
        Err(other) => panic!("expected an HTTP rejection, got {:?}", other),
        Ok(_) => panic!("second viewer should have been rejected"),
    }
    assert_eq!(state.hub.viewer_count(), 1);

    first.close(None).await.unwrap();
    wait_for_viewers(&state, 0).await;
}
