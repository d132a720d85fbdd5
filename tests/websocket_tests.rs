//! End-to-end tests: real server, real WebSocket clients

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use feed_relay::api::http::serve;
use feed_relay::{AppState, Config, Connection, OutboundEvent, UserId};
use futures::{SinkExt, StreamExt};
use serde_json::json;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::time::Instant;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

struct TestServer {
    addr: SocketAddr,
    state: Arc<AppState>,
    shutdown: Option<oneshot::Sender<()>>,
}

impl TestServer {
    async fn start() -> Self {
        Self::start_with(Config::default()).await
    }

    async fn start_with(config: Config) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state = Arc::new(AppState::new(config));
        let (tx, rx) = oneshot::channel::<()>();

        let server_state = Arc::clone(&state);
        tokio::spawn(async move {
            serve(listener, server_state, async move {
                let _ = rx.await;
            })
            .await
            .unwrap();
        });

        Self {
            addr,
            state,
            shutdown: Some(tx),
        }
    }

    async fn connect(&self, query: &str) -> Client {
        let url = format!("ws://{}/ws{}", self.addr, query);
        let (client, _) = connect_async(url).await.unwrap();
        client
    }

    fn stop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

fn user(id: &str) -> UserId {
    UserId::parse(id).unwrap()
}

/// Next relay event, skipping control frames
async fn next_event(client: &mut Client) -> Option<OutboundEvent> {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(2), client.next())
            .await
            .ok()??
            .ok()?;
        match msg {
            Message::Text(text) => return Some(serde_json::from_str(&text).unwrap()),
            Message::Ping(_) | Message::Pong(_) => continue,
            _ => return None,
        }
    }
}

/// Assert nothing arrives within a short window
async fn expect_silence(client: &mut Client) {
    let result = tokio::time::timeout(Duration::from_millis(150), client.next()).await;
    assert!(result.is_err(), "unexpected frame: {:?}", result);
}

fn roster(ids: &[&str]) -> OutboundEvent {
    OutboundEvent::GetOnlineUsers(ids.iter().map(|id| user(id)).collect())
}

#[tokio::test]
async fn test_roster_broadcast_on_connect_and_disconnect() {
    let server = TestServer::start().await;

    let mut c1 = server.connect("?userId=u1").await;
    assert_eq!(next_event(&mut c1).await, Some(roster(&["u1"])));

    let mut c2 = server.connect("?userId=u2").await;
    assert_eq!(next_event(&mut c2).await, Some(roster(&["u1", "u2"])));
    assert_eq!(next_event(&mut c1).await, Some(roster(&["u1", "u2"])));

    c1.close(None).await.unwrap();
    assert_eq!(next_event(&mut c2).await, Some(roster(&["u2"])));
}

#[tokio::test]
async fn test_missing_user_id_is_rejected() {
    let server = TestServer::start().await;
    let mut watcher = server.connect("?userId=watcher").await;
    assert_eq!(next_event(&mut watcher).await, Some(roster(&["watcher"])));

    for query in ["", "?userId=", "?userId=undefined"] {
        let mut client = server.connect(query).await;
        let msg = tokio::time::timeout(Duration::from_secs(2), client.next())
            .await
            .unwrap();
        match msg {
            Some(Ok(Message::Close(Some(frame)))) => assert_eq!(u16::from(frame.code), 1008),
            other => panic!("expected close frame for {:?}, got {:?}", query, other),
        }
    }

    expect_silence(&mut watcher).await;
    assert_eq!(server.state.presence.connection_count(), 1);
}

#[tokio::test]
async fn test_send_message_relays_to_receiver_devices() {
    let server = TestServer::start().await;
    let mut alice = server.connect("?userId=alice").await;
    next_event(&mut alice).await;
    let mut bob_phone = server.connect("?userId=bob").await;
    next_event(&mut bob_phone).await;
    next_event(&mut alice).await;
    let mut bob_laptop = server.connect("?userId=bob").await;
    assert_eq!(next_event(&mut bob_laptop).await, Some(roster(&["alice", "bob"])));

    let frame = json!({
        "event": "sendMessage",
        "data": {"receiverId": "bob", "message": {"senderId": "alice", "message": "hi bob"}}
    });
    alice.send(Message::Text(frame.to_string())).await.unwrap();

    let expected = OutboundEvent::ReceiveMessage(json!({"senderId": "alice", "message": "hi bob"}));
    assert_eq!(next_event(&mut bob_phone).await, Some(expected.clone()));
    assert_eq!(next_event(&mut bob_laptop).await, Some(expected));
    expect_silence(&mut alice).await;
}

#[tokio::test]
async fn test_malformed_frames_are_ignored() {
    let server = TestServer::start().await;
    let mut client = server.connect("?userId=u1").await;
    next_event(&mut client).await;

    client.send(Message::Text("not json".to_string())).await.unwrap();
    client
        .send(Message::Text(json!({"event": "typing"}).to_string()))
        .await
        .unwrap();
    client
        .send(Message::Text(json!({"event": "ping"}).to_string()))
        .await
        .unwrap();

    // still connected and answering
    assert_eq!(next_event(&mut client).await, Some(OutboundEvent::Pong));
}

#[tokio::test]
async fn test_http_notification_reaches_socket() {
    let server = TestServer::start().await;
    let mut owner = server.connect("?userId=owner").await;
    next_event(&mut owner).await;

    let delivered = server
        .state
        .router
        .relay_notification(&user("owner"), json!({"type": "like", "postId": "p1"}));

    assert_eq!(delivered, 1);
    assert_eq!(
        next_event(&mut owner).await,
        Some(OutboundEvent::Notification(json!({"type": "like", "postId": "p1"})))
    );
}

#[tokio::test]
async fn test_shutdown_closes_connections() {
    let mut server = TestServer::start().await;
    let mut client = server.connect("?userId=u1").await;
    next_event(&mut client).await;

    server.stop();

    let msg = tokio::time::timeout(Duration::from_secs(2), client.next())
        .await
        .unwrap();
    assert!(matches!(msg, Some(Ok(Message::Close(_))) | None | Some(Err(_))));
    assert_eq!(server.state.presence.connection_count(), 0);
}

#[tokio::test]
async fn test_silent_client_is_dropped_after_idle_timeout() {
    let config = Config {
        heartbeat_interval: Duration::from_secs(1),
        idle_timeout: Duration::from_secs(2),
        ..Config::default()
    };
    let server = TestServer::start_with(config).await;

    let (watcher, mut rx_w) = Connection::open(user("watcher"), 64);
    server.state.presence.connect(watcher);
    rx_w.recv().await.unwrap();

    // never polled, so it neither reads pings nor answers them
    let started = Instant::now();
    let _silent = server.connect("?userId=silent").await;

    let mut rosters = Vec::new();
    while rosters.last() != Some(&roster(&["watcher"])) {
        let frame = tokio::time::timeout(Duration::from_secs(6), rx_w.recv())
            .await
            .expect("no roster after idle timeout")
            .unwrap();
        rosters.push(serde_json::from_str::<OutboundEvent>(&frame).unwrap());
    }

    assert_eq!(rosters, vec![roster(&["silent", "watcher"]), roster(&["watcher"])]);
    assert!(started.elapsed() >= Duration::from_millis(1500));
    assert!(!server.state.presence.is_online(&user("silent")));
}
