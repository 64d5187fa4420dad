use serde::Serialize;
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use tungstenite::{accept, Message};

#[derive(Debug, Clone, Serialize)]
pub struct TelemetrySnapshot {
    pub steer_us: u16,
    pub throttle_us: u16,
    pub mode_us: u16,
    pub rgb_us: u16,
    pub siren_us: u16,
    pub mode: String,
    pub steering: u16,
    pub speed: u16,
    pub left_indicator: bool,
    pub right_indicator: bool,
    pub receiver_lost: bool,
}

pub fn telemetry_thread(port: u16, slot: Arc<Mutex<Option<TelemetrySnapshot>>>) {
    let server = TcpListener::bind(("0.0.0.0", port)).expect("Failed to bind WebSocket server");
    println!("[WS] telemetry listening on port {}", port);

    for stream in server.incoming() {
        let stream = match stream {
            Ok(s) => s,
            Err(e) => {
                eprintln!("[WS] connection error: {}", e);
                continue;
            }
        };

        let slot = Arc::clone(&slot);
        thread::spawn(move || {
            let mut websocket = match accept(stream) {
                Ok(ws) => ws,
                Err(e) => {
                    eprintln!("[WS] handshake error: {}", e);
                    return;
                }
            };

            println!("[WS] client connected");

            loop {
                let snapshot = {
                    let locked = slot.lock().unwrap();
                    locked.clone()
                };

                if let Some(s) = snapshot {
                    match serde_json::to_string(&s) {
                        Ok(json) => {
                            if websocket.send(Message::Text(json)).is_err() {
                                println!("[WS] client disconnected");
                                break;
                            }
                        }
                        Err(e) => eprintln!("[WS] serialization error: {}", e),
                    }
                }

                thread::sleep(Duration::from_millis(200));
            }
        });
    }
}
