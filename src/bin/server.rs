use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use maze_chase::constants::TICK_MS;
use maze_chase::engine::GameEngine;
use maze_chase::grid::standard_config;
use maze_chase::high_score::{FileHighScoreStore, HighScoreStore};
use maze_chase::server_protocol::{parse_client_message, ParsedClientMessage};
use maze_chase::types::{GameEvent, Phase};
use rand::distr::Alphanumeric;
use rand::Rng;
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tower_http::services::{ServeDir, ServeFile};

type SharedStore = Arc<Mutex<FileHighScoreStore>>;

#[tokio::main]
async fn main() {
    let port = std::env::var("PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let store_path = std::env::var("HIGH_SCORE_DB_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(".data/high_score.json"));

    let store: SharedStore = Arc::new(Mutex::new(FileHighScoreStore::new(store_path)));

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/api/high-score", get(high_score_handler))
        .route("/ws", get(ws_handler))
        .with_state(store);

    let app = if let Some(static_dir) = resolve_static_dir() {
        let index_file = static_dir.join("index.html");
        println!(
            "[server] static file root: {}",
            static_dir.to_string_lossy()
        );
        app.fallback_service(
            ServeDir::new(static_dir).not_found_service(ServeFile::new(index_file)),
        )
    } else {
        eprintln!("[server] static file root not found, serving API only");
        app
    };

    let bind_addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .expect("failed to bind server socket");

    println!("[server] listening on :{port}");
    axum::serve(listener, app)
        .await
        .expect("server runtime failed");
}

fn resolve_static_dir() -> Option<PathBuf> {
    if let Ok(raw) = std::env::var("STATIC_DIR") {
        let path = PathBuf::from(raw);
        if path.join("index.html").is_file() {
            return Some(path);
        }
    }

    let candidates = [PathBuf::from("static"), PathBuf::from("../static")];
    candidates
        .into_iter()
        .find(|path| path.join("index.html").is_file())
}

async fn healthz() -> impl IntoResponse {
    Json(json!({ "ok": true }))
}

async fn high_score_handler(State(store): State<SharedStore>) -> impl IntoResponse {
    let guard = store.lock().await;
    Json(json!({ "highScore": guard.get() }))
}

async fn ws_handler(ws: WebSocketUpgrade, State(store): State<SharedStore>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(store, socket))
}

/// One game per connection. The socket task owns the engine and drives it
/// from a fixed-rate interval; the client only contributes inputs.
async fn handle_socket(store: SharedStore, socket: WebSocket) {
    let session_id = make_session_id();
    let seed: u32 = rand::rng().random();

    let mut config = standard_config(seed);
    config.initial_high_score = store.lock().await.get();
    let mut engine = match GameEngine::new(config) {
        Ok(engine) => engine,
        Err(error) => {
            eprintln!("[server] {session_id}: engine config rejected: {error}");
            return;
        }
    };
    println!("[server] {session_id}: connected, seed {seed}");

    let (mut sender, mut receiver) = socket.split();
    let mut greeted = false;
    let mut summary_sent = false;
    let mut pending_input = None;
    let mut interval = tokio::time::interval(Duration::from_millis(TICK_MS));

    loop {
        tokio::select! {
            _ = interval.tick() => {
                if !greeted {
                    continue;
                }
                let events = engine.tick(pending_input.take());
                let snapshot = tagged("snapshot", json!({ "state": engine.snapshot() }));
                if send_text(&mut sender, snapshot).await.is_err() {
                    break;
                }
                let level_up = events
                    .iter()
                    .any(|event| matches!(event, GameEvent::LevelComplete { .. }));
                if level_up && send_text(&mut sender, init_message(&engine)).await.is_err() {
                    break;
                }
                if engine.phase() == Phase::GameOver && !summary_sent {
                    summary_sent = true;
                    store.lock().await.set(engine.high_score());
                    let summary = tagged("summary", json!({ "summary": engine.summary() }));
                    if send_text(&mut sender, summary).await.is_err() {
                        break;
                    }
                }
            }
            received = receiver.next() => {
                let Some(Ok(message)) = received else {
                    break;
                };
                let raw = match message {
                    Message::Text(text) => text.to_string(),
                    Message::Binary(bytes) => match String::from_utf8(bytes.to_vec()) {
                        Ok(text) => text,
                        Err(_) => {
                            let error = tagged("error", json!({ "message": "invalid utf8 message" }));
                            if send_text(&mut sender, error).await.is_err() {
                                break;
                            }
                            continue;
                        }
                    },
                    Message::Close(_) => break,
                    _ => continue,
                };

                let Some(parsed) = parse_client_message(&raw) else {
                    let error = tagged("error", json!({ "message": "invalid message" }));
                    if send_text(&mut sender, error).await.is_err() {
                        break;
                    }
                    continue;
                };

                match parsed {
                    ParsedClientMessage::Hello { name } => {
                        greeted = true;
                        println!(
                            "[server] {session_id}: hello from {}",
                            name.as_deref().unwrap_or("anonymous")
                        );
                        if send_text(&mut sender, init_message(&engine)).await.is_err() {
                            break;
                        }
                    }
                    ParsedClientMessage::Input { dir } => {
                        pending_input = Some(dir);
                    }
                    ParsedClientMessage::Restart => {
                        store.lock().await.set(engine.high_score());
                        engine.restart();
                        summary_sent = false;
                        pending_input = None;
                        if send_text(&mut sender, init_message(&engine)).await.is_err() {
                            break;
                        }
                    }
                    ParsedClientMessage::Ping { t } => {
                        let pong = tagged("pong", json!({ "t": t }));
                        if send_text(&mut sender, pong).await.is_err() {
                            break;
                        }
                    }
                }
            }
        }
    }

    store.lock().await.set(engine.high_score());
    println!("[server] {session_id}: disconnected");
}

fn init_message(engine: &GameEngine) -> String {
    tagged(
        "init",
        json!({
            "map": engine.map_init(),
            "tickMs": TICK_MS,
            "highScore": engine.high_score(),
            "level": engine.level(),
        }),
    )
}

fn tagged(message_type: &str, mut payload: Value) -> String {
    if let Some(object) = payload.as_object_mut() {
        object.insert("type".to_string(), Value::String(message_type.to_string()));
    }
    payload.to_string()
}

async fn send_text(
    sender: &mut SplitSink<WebSocket, Message>,
    payload: String,
) -> Result<(), axum::Error> {
    sender.send(Message::Text(payload.into())).await
}

fn make_session_id() -> String {
    let suffix: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(char::from)
        .collect();
    format!("session_{suffix}")
}
