//! In-process stand-in for the keyvalue service, served over plain HTTP/1.1
//!
//! Behaves like api.keyvalue.xyz for the three routes the client uses and
//! appends a newline to every body, as the real service does. A few key
//! names trigger misbehaviour:
//! - `malformed-reply`: creation answers with a bare word
//! - `wrong-key-reply`: creation answers with a different key
//! - keys starting with `stale`: reads always return `stale value`
//! - keys starting with `binary`: reads return bytes that are not UTF-8

#![allow(dead_code)]

use std::collections::HashMap;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use http_body_util::Full;
use hyper::body::{Bytes, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use percent_encoding::percent_decode_str;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

#[derive(Default)]
struct State {
    slots: Mutex<HashMap<(String, String), String>>,
    next_token: AtomicU64,
}

pub struct FakeService {
    addr: SocketAddr,
    state: Arc<State>,
    shutdown: Option<oneshot::Sender<()>>,
}

impl FakeService {
    /// Bind an ephemeral port and serve on a background thread
    pub fn start() -> Self {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("Failed to bind fake service");
        listener
            .set_nonblocking(true)
            .expect("Failed to make listener non-blocking");
        let addr = listener.local_addr().expect("Failed to read local address");

        let state = Arc::new(State::default());
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

        let server_state = state.clone();
        std::thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("Failed to build fake service runtime");

            runtime.block_on(async move {
                let listener = TcpListener::from_std(listener).expect("Failed to adopt listener");
                loop {
                    tokio::select! {
                        result = listener.accept() => {
                            let Ok((stream, _)) = result else { continue };
                            let state = server_state.clone();
                            tokio::spawn(async move {
                                let service = service_fn(move |req| handle(req, state.clone(), addr));
                                let _ = http1::Builder::new()
                                    .serve_connection(TokioIo::new(stream), service)
                                    .await;
                            });
                        }
                        _ = &mut shutdown_rx => break,
                    }
                }
            });
        });

        Self {
            addr,
            state,
            shutdown: Some(shutdown_tx),
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Value currently held by a slot, bypassing HTTP
    pub fn stored(&self, token: &str, key: &str) -> Option<String> {
        self.state
            .slots
            .lock()
            .unwrap()
            .get(&(token.to_string(), key.to_string()))
            .cloned()
    }

    /// Write a slot directly, as another client would
    pub fn overwrite(&self, token: &str, key: &str, value: &str) {
        self.state
            .slots
            .lock()
            .unwrap()
            .insert((token.to_string(), key.to_string()), value.to_string());
    }
}

impl Drop for FakeService {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

fn reply(status: StatusCode, body: impl Into<Bytes>) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .header("content-type", "text/plain")
        .body(Full::new(body.into()))
        .unwrap()
}

async fn handle(
    req: Request<Incoming>,
    state: Arc<State>,
    addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let raw: Vec<&str> = req.uri().path().trim_start_matches('/').split('/').collect();
    let segments: Vec<String> = raw
        .iter()
        .map(|s| percent_decode_str(s).decode_utf8_lossy().into_owned())
        .collect();

    let response = match (req.method().as_str(), segments.as_slice()) {
        ("POST", [new, key]) if new == "new" => match key.as_str() {
            "malformed-reply" => reply(StatusCode::OK, "malformed\n".to_string()),
            "wrong-key-reply" => reply(
                StatusCode::OK,
                format!("http://{}/0000000/some-other-key\n", addr),
            ),
            _ => {
                let token = format!("{:07}", state.next_token.fetch_add(1, Ordering::SeqCst));
                state
                    .slots
                    .lock()
                    .unwrap()
                    .insert((token.clone(), key.clone()), String::new());
                reply(StatusCode::OK, format!("http://{}/{}/{}\n", addr, token, raw[1]))
            }
        },
        ("POST", [token, key, value]) => {
            let mut slots = state.slots.lock().unwrap();
            match slots.get_mut(&(token.clone(), key.clone())) {
                Some(slot) => {
                    *slot = value.clone();
                    reply(StatusCode::OK, String::new())
                }
                None => reply(StatusCode::NOT_FOUND, "not found\n".to_string()),
            }
        }
        ("GET", [token, key]) => {
            let slots = state.slots.lock().unwrap();
            match slots.get(&(token.clone(), key.clone())) {
                Some(_) if key.starts_with("binary") => {
                    reply(StatusCode::OK, vec![0xff, 0xfe, b'\n'])
                }
                Some(_) if key.starts_with("stale") => {
                    reply(StatusCode::OK, "stale value\n".to_string())
                }
                Some(value) => reply(StatusCode::OK, format!("{}\n", value)),
                None => reply(StatusCode::NOT_FOUND, "not found\n".to_string()),
            }
        }
        _ => reply(StatusCode::BAD_REQUEST, "bad request\n".to_string()),
    };

    Ok(response)
}
