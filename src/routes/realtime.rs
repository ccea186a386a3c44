use std::convert::Infallible;
use std::time::Duration;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
};
use futures::{stream::Stream, SinkExt, StreamExt};
use serde_json::json;
use tokio::time::{interval_at, Instant};
use tracing::{debug, warn};

use crate::{error::AppResult, state::AppState, trending::ViewerConnection};

/// WebSocket upgrade handler for the trending channel
///
/// The viewer is registered before the upgrade so a full registry answers
/// with 503 instead of an upgraded socket that closes immediately.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    let viewer = match state.hub.connect() {
        Ok(viewer) => viewer,
        Err(e) => return e.into_response(),
    };
    let heartbeat = state.config.heartbeat_interval();

    ws.on_upgrade(move |socket| handle_socket(socket, viewer, heartbeat))
}

/// Pumps payloads to one WebSocket until either side goes away
async fn handle_socket(socket: WebSocket, mut viewer: ViewerConnection, heartbeat: Duration) {
    let (mut sender, mut receiver) = socket.split();
    let mut ping = interval_at(Instant::now() + heartbeat, heartbeat);
    let mut closed_by_client = false;

    debug!(viewer = %viewer.id(), "WebSocket viewer open");

    loop {
        tokio::select! {
            payload = viewer.recv() => {
                let Some(payload) = payload else {
                    // Dropped by the hub: delivery failure or shutdown
                    let _ = sender.send(Message::Close(None)).await;
                    break;
                };
                let text = match serde_json::to_string(payload.as_ref()) {
                    Ok(text) => text,
                    Err(e) => {
                        warn!(viewer = %viewer.id(), error = %e, "Failed to serialize trending payload");
                        continue;
                    }
                };
                if sender.send(Message::Text(text)).await.is_err() {
                    debug!(viewer = %viewer.id(), "WebSocket send failed, client disconnected");
                    break;
                }
            }
            _ = ping.tick() => {
                if sender.send(Message::Ping(Vec::new())).await.is_err() {
                    debug!(viewer = %viewer.id(), "Heartbeat failed, client disconnected");
                    break;
                }
            }
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Close(_))) => {
                    closed_by_client = true;
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    debug!(viewer = %viewer.id(), error = %e, "WebSocket receive error");
                    break;
                }
                None => break,
            }
        }
    }

    if closed_by_client {
        viewer.close();
    }
    // Any other exit aborts when `viewer` drops here
}

/// Server-sent events fallback for the trending channel
pub async fn sse_handler(
    State(state): State<AppState>,
) -> AppResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    let mut viewer = state.hub.connect()?;
    let heartbeat = state.config.heartbeat_interval();

    debug!(viewer = %viewer.id(), "SSE viewer open");

    let stream = async_stream::stream! {
        yield Ok(Event::default().data(json!({ "type": "connected" }).to_string()));

        while let Some(payload) = viewer.recv().await {
            match Event::default().json_data(payload.as_ref()) {
                Ok(event) => yield Ok(event),
                Err(e) => warn!(viewer = %viewer.id(), error = %e, "Failed to serialize trending payload"),
            }
        }
    };

    Ok(Sse::new(stream).keep_alive(KeepAlive::new().interval(heartbeat).text("heartbeat")))
}
