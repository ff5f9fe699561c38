// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests for the complete relay pipeline: real WebSocket clients
//! against a real bound gateway backed by a temp-file SQLite store.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tempfile::TempDir;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tokio_util::sync::CancellationToken;

use parley_core::MessageStore;
use parley_cron::RetentionJob;
use parley_gateway::{ChatFrame, GatewayState, ServerConfig, bind, serve};
use parley_storage::SqliteMessageStore;

type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

struct Relay {
    addr: SocketAddr,
    store: Arc<SqliteMessageStore>,
    cancel: CancellationToken,
    _dir: TempDir,
}

impl Relay {
    async fn start() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("e2e.db");
        let store = Arc::new(
            SqliteMessageStore::open(db_path.to_str().unwrap())
                .await
                .unwrap(),
        );

        let state = GatewayState::new(
            store.clone() as Arc<dyn MessageStore>,
            "anonymous".to_string(),
        );
        let listener = bind(&ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        })
        .await
        .unwrap();
        let addr = listener.local_addr().unwrap();
        let cancel = CancellationToken::new();
        tokio::spawn(serve(listener, state, cancel.clone()));

        Self {
            addr,
            store,
            cancel,
            _dir: dir,
        }
    }

    async fn connect(&self, query: &str) -> WsClient {
        let url = format!("ws://{}/ws{query}", self.addr);
        let (client, _response) = connect_async(url).await.expect("websocket connect");
        client
    }
}

impl Drop for Relay {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn send_chat(client: &mut WsClient, content: &str) {
    let payload = serde_json::json!({ "content": content }).to_string();
    client.send(Message::Text(payload.into())).await.unwrap();
}

async fn next_frame(client: &mut WsClient) -> ChatFrame {
    loop {
        let msg = timeout(Duration::from_secs(5), client.next())
            .await
            .expect("timed out waiting for frame")
            .expect("stream ended")
            .expect("websocket error");
        if let Message::Text(text) = msg {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

async fn assert_silent(client: &mut WsClient) {
    let result = timeout(Duration::from_millis(300), client.next()).await;
    assert!(result.is_err(), "expected silence, got {result:?}");
}

#[tokio::test]
async fn full_relay_scenario() {
    let relay = Relay::start().await;

    // Client A connects with an empty store: zero catch-up rows.
    let mut alice = relay.connect("?username=alice&server_offset=0").await;
    assert_silent(&mut alice).await;

    let mut bob = relay.connect("?username=bob").await;

    // A sends "hi": the store assigns id 1, both clients receive it.
    send_chat(&mut alice, "hi").await;
    let expected = ChatFrame {
        content: "hi".into(),
        id: "1".into(),
        user: "alice".into(),
    };
    assert_eq!(next_frame(&mut alice).await, expected);
    assert_eq!(next_frame(&mut bob).await, expected);

    // Client C connects afterwards: catch-up replays the same frame.
    let mut carol = relay.connect("?server_offset=0").await;
    assert_eq!(next_frame(&mut carol).await, expected);
    assert_silent(&mut carol).await;
}

#[tokio::test]
async fn catch_up_and_live_traffic_compose() {
    let relay = Relay::start().await;

    let mut alice = relay.connect("?username=alice").await;
    send_chat(&mut alice, "one").await;
    send_chat(&mut alice, "two").await;
    let first = next_frame(&mut alice).await;
    let second = next_frame(&mut alice).await;
    assert_eq!(first.content, "one");
    assert_eq!(second.content, "two");

    // A late joiner with the first id as its offset sees only the second
    // message in catch-up, then live traffic after it.
    let mut bob = relay
        .connect(&format!("?username=bob&server_offset={}", first.id))
        .await;
    assert_eq!(next_frame(&mut bob).await, second);

    send_chat(&mut alice, "three").await;
    assert_eq!(next_frame(&mut bob).await.content, "three");
}

#[tokio::test]
async fn anonymous_default_applies_end_to_end() {
    let relay = Relay::start().await;

    let mut nameless = relay.connect("").await;
    send_chat(&mut nameless, "hello").await;
    let frame = next_frame(&mut nameless).await;
    assert_eq!(frame.user, "anonymous");

    let rows = relay.store.messages_after(0).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].user, "anonymous");
}

#[tokio::test]
async fn purge_empties_history_and_ids_stay_fresh() {
    let relay = Relay::start().await;

    let mut alice = relay.connect("?username=alice").await;
    send_chat(&mut alice, "old news").await;
    let old = next_frame(&mut alice).await;

    // Fire the retention job directly, as the scheduler would.
    let job = RetentionJob::new(
        "0 */12 * * *",
        relay.store.clone() as Arc<dyn MessageStore>,
    )
    .unwrap();
    job.run_once().await;

    // Any offset now yields zero catch-up rows.
    let mut bob = relay.connect("?username=bob&server_offset=0").await;
    assert_silent(&mut bob).await;

    // A new message gets a fresh, still-increasing id.
    send_chat(&mut alice, "fresh").await;
    let fresh = next_frame(&mut alice).await;
    assert!(
        fresh.id.parse::<i64>().unwrap() > old.id.parse::<i64>().unwrap(),
        "ids must not be reused after the purge"
    );
}

#[tokio::test]
async fn graceful_shutdown_stops_accepting_connections() {
    let relay = Relay::start().await;
    let addr = relay.addr;

    relay.cancel.cancel();
    tokio::time::sleep(Duration::from_millis(200)).await;

    let result = connect_async(format!("ws://{addr}/ws")).await;
    assert!(result.is_err(), "gateway should be down after cancellation");
}
