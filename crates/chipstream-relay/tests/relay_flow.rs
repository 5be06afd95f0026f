//! Socket-level tests of the relay: fan-out, late-joiner sync,
//! ping/pong, input forwarding and the OSC control path.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use chipstream_relay::{RelayConfig, RelayState, control, http};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn start_relay() -> (SocketAddr, Arc<RelayState>) {
    let state = Arc::new(RelayState::new(RelayConfig::default()));
    let app = http::router(state.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, state)
}

async fn connect(addr: SocketAddr, role: &str) -> Socket {
    let (socket, _response) = connect_async(format!("ws://{addr}/ws?role={role}"))
        .await
        .expect("connect to relay");
    socket
}

async fn next_text(socket: &mut Socket) -> String {
    loop {
        let message = tokio::time::timeout(Duration::from_secs(5), socket.next())
            .await
            .expect("timed out waiting for a message")
            .expect("socket closed")
            .expect("socket error");
        if let Message::Text(text) = message {
            return text.to_string();
        }
    }
}

async fn next_json(socket: &mut Socket) -> serde_json::Value {
    serde_json::from_str(&next_text(socket).await).expect("valid JSON from relay")
}

fn frame_json(seq: u64) -> String {
    format!(
        r#"{{"type":"frame","seq":{seq},"ts":1000,"display":"track","snd":{{"v":[{{"gate":1,"freq":8,"wave":4,"vol":15}}]}}}}"#
    )
}

#[tokio::test]
async fn browser_receives_sync_on_connect() {
    let (addr, _state) = start_relay().await;
    let mut browser = connect(addr, "browser").await;

    let sync = next_json(&mut browser).await;
    assert_eq!(sync["type"], "sync");
    assert_eq!(sync["snd"]["mode"], "silent");
    assert_eq!(sync["snd"]["v"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn frames_fan_out_verbatim_and_late_joiners_see_the_result() {
    let (addr, state) = start_relay().await;

    let mut game = connect(addr, "game").await;
    let mut browser_a = connect(addr, "browser").await;
    let mut browser_b = connect(addr, "browser").await;
    next_json(&mut browser_a).await; // consume sync
    next_json(&mut browser_b).await;

    game.send(Message::Text(
        r#"{"type":"register","gameType":"racer"}"#.into(),
    ))
    .await
    .unwrap();

    let frame = frame_json(1);
    game.send(Message::Text(frame.clone().into())).await.unwrap();

    // Both connected browsers receive the identical payload.
    assert_eq!(next_text(&mut browser_a).await, frame);
    assert_eq!(next_text(&mut browser_b).await, frame);

    // A browser connecting afterwards syncs to the merged state.
    let mut late = connect(addr, "browser").await;
    let sync = next_json(&mut late).await;
    assert_eq!(sync["type"], "sync");
    assert_eq!(
        sync["snd"]["v"][0],
        serde_json::json!({"gate": 1, "freq": 8, "wave": 4, "vol": 15})
    );

    assert_eq!(state.sound_state().voices[0].freq, 8);
}

#[tokio::test]
async fn frame_sequence_order_is_preserved() {
    let (addr, _state) = start_relay().await;

    let mut game = connect(addr, "game").await;
    let mut browser = connect(addr, "browser").await;
    next_json(&mut browser).await;

    for seq in 1..=5u64 {
        game.send(Message::Text(frame_json(seq).into())).await.unwrap();
    }

    let mut last_seq = 0;
    for _ in 0..5 {
        let frame = next_json(&mut browser).await;
        let seq = frame["seq"].as_u64().unwrap();
        assert!(seq > last_seq, "sequence must strictly increase");
        last_seq = seq;
    }
}

#[tokio::test]
async fn ping_is_answered_with_server_time() {
    let (addr, _state) = start_relay().await;
    let mut browser = connect(addr, "browser").await;
    next_json(&mut browser).await;

    browser
        .send(Message::Text(r#"{"type":"ping","ts":1}"#.into()))
        .await
        .unwrap();

    let pong = next_json(&mut browser).await;
    assert_eq!(pong["type"], "pong");
    assert!(pong["ts"].as_u64().unwrap() > 1);
}

#[tokio::test]
async fn browser_input_reaches_every_game_source() {
    let (addr, _state) = start_relay().await;

    let mut game_a = connect(addr, "game").await;
    let mut game_b = connect(addr, "game").await;
    let mut browser = connect(addr, "browser").await;
    next_json(&mut browser).await;

    let input = r#"{"type":"input","player":0,"key":"ArrowUp"}"#;
    browser.send(Message::Text(input.into())).await.unwrap();

    assert_eq!(next_text(&mut game_a).await, input);
    assert_eq!(next_text(&mut game_b).await, input);
}

#[tokio::test]
async fn malformed_payloads_do_not_kill_the_connection() {
    let (addr, _state) = start_relay().await;

    let mut game = connect(addr, "game").await;
    let mut browser = connect(addr, "browser").await;
    next_json(&mut browser).await;

    game.send(Message::Text("{not json".into())).await.unwrap();
    game.send(Message::Text(r#"{"type":"teleport"}"#.into()))
        .await
        .unwrap();

    // The connection survives and keeps relaying.
    let frame = frame_json(1);
    game.send(Message::Text(frame.clone().into())).await.unwrap();
    assert_eq!(next_text(&mut browser).await, frame);
}

#[tokio::test]
async fn osc_control_updates_state_and_broadcasts() {
    let (addr, state) = start_relay().await;

    let control_socket = tokio::net::UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let control_addr = control_socket.local_addr().unwrap();
    tokio::spawn(control::serve_control(state.clone(), control_socket));

    let mut browser = connect(addr, "browser").await;
    next_json(&mut browser).await;

    let packet = rosc::encoder::encode(&rosc::OscPacket::Message(rosc::OscMessage {
        addr: "/chip/1/set".to_string(),
        args: vec![
            rosc::OscType::Int(1),
            rosc::OscType::Int(12),
            rosc::OscType::Int(3),
            rosc::OscType::Int(10),
        ],
    }))
    .unwrap();

    let sender = tokio::net::UdpSocket::bind("127.0.0.1:0").await.unwrap();
    sender.send_to(&packet, control_addr).await.unwrap();

    let update = next_json(&mut browser).await;
    assert_eq!(update["type"], "snd");
    assert_eq!(
        update["snd"]["v"][1],
        serde_json::json!({"gate": 1, "freq": 12, "wave": 3, "vol": 10})
    );
    assert_eq!(state.sound_state().voices[1].vol, 10);
}
