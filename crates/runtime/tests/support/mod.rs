//! In-process fake of a DevTools remote-debugging endpoint.
//!
//! Serves `/json/list` and one WebSocket per target on an ephemeral loopback
//! port. Each target answers `Runtime.evaluate` according to its
//! [`Behaviour`] and records every expression it receives.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Path, State, WebSocketUpgrade};
use axum::response::Response;
use axum::routing::get;
use serde_json::{Value, json};
use tokio::net::TcpListener;

#[derive(Clone, Debug)]
pub enum Behaviour {
	/// Answers the stats expression with this payload string, everything else with `undefined`.
	Stats(&'static str),
	/// Never answers.
	Silent,
	/// Throws from the stop expression; answers everything else.
	ThrowOnStop,
	/// Closes the socket upon receiving the stats expression.
	CloseOnStats,
}

#[derive(Clone, Debug)]
pub struct FakeTarget {
	pub id: &'static str,
	pub kind: &'static str,
	pub behaviour: Behaviour,
	pub debuggable: bool,
}

impl FakeTarget {
	pub fn page(id: &'static str, behaviour: Behaviour) -> Self {
		Self {
			id,
			kind: "page",
			behaviour,
			debuggable: true,
		}
	}

	pub fn of_kind(id: &'static str, kind: &'static str) -> Self {
		Self {
			id,
			kind,
			behaviour: Behaviour::Stats("{}"),
			debuggable: true,
		}
	}

	pub fn without_debugger(mut self) -> Self {
		self.debuggable = false;
		self
	}
}

#[derive(Default)]
struct Shared {
	port: u16,
	targets: Vec<FakeTarget>,
	raw_listing: Option<String>,
	expressions: Mutex<HashMap<String, Vec<String>>>,
	closed: Mutex<Vec<String>>,
}

pub struct FakeEndpoint {
	pub port: u16,
	shared: Arc<Shared>,
}

impl FakeEndpoint {
	pub async fn start(targets: Vec<FakeTarget>) -> Self {
		Self::serve(targets, None).await
	}

	/// Endpoint whose `/json/list` returns `body` verbatim.
	pub async fn with_listing_body(body: &str) -> Self {
		Self::serve(Vec::new(), Some(body.to_string())).await
	}

	async fn serve(targets: Vec<FakeTarget>, raw_listing: Option<String>) -> Self {
		let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
		let port = listener.local_addr().unwrap().port();
		let shared = Arc::new(Shared {
			port,
			targets,
			raw_listing,
			..Default::default()
		});

		let app = Router::new()
			.route("/json/list", get(listing))
			.route("/devtools/page/{id}", get(devtools_socket))
			.with_state(Arc::clone(&shared));
		tokio::spawn(async move {
			let _ = axum::serve(listener, app).await;
		});

		Self { port, shared }
	}

	/// Expressions target `id` has received so far.
	pub fn expressions(&self, id: &str) -> Vec<String> {
		self.shared.expressions.lock().unwrap().get(id).cloned().unwrap_or_default()
	}

	pub fn is_closed(&self, id: &str) -> bool {
		self.shared.closed.lock().unwrap().iter().any(|closed| closed == id)
	}

	/// Polls until the server side of `id`'s socket has gone away.
	pub async fn wait_closed(&self, id: &str) -> bool {
		eventually(|| self.is_closed(id)).await
	}
}

/// Polls `check` every 10ms for up to two seconds.
pub async fn eventually(mut check: impl FnMut() -> bool) -> bool {
	for _ in 0..200 {
		if check() {
			return true;
		}
		tokio::time::sleep(Duration::from_millis(10)).await;
	}
	check()
}

async fn listing(State(shared): State<Arc<Shared>>) -> String {
	if let Some(raw) = &shared.raw_listing {
		return raw.clone();
	}
	let entries: Vec<Value> = shared
		.targets
		.iter()
		.map(|target| {
			let mut entry = json!({
				"id": target.id,
				"type": target.kind,
				"title": format!("{} {}", target.kind, target.id),
				"url": "about:blank",
			});
			if target.debuggable {
				entry["webSocketDebuggerUrl"] = json!(format!("ws://127.0.0.1:{}/devtools/page/{}", shared.port, target.id));
			}
			entry
		})
		.collect();
	Value::Array(entries).to_string()
}

async fn devtools_socket(ws: WebSocketUpgrade, Path(id): Path<String>, State(shared): State<Arc<Shared>>) -> Response {
	ws.on_upgrade(move |socket| serve_target(socket, id, shared))
}

async fn serve_target(mut socket: WebSocket, id: String, shared: Arc<Shared>) {
	let behaviour = shared
		.targets
		.iter()
		.find(|target| target.id == id)
		.map(|target| target.behaviour.clone())
		.unwrap_or(Behaviour::Silent);

	while let Some(Ok(message)) = socket.recv().await {
		let text = match message {
			Message::Text(text) => text.as_str().to_string(),
			Message::Close(_) => break,
			_ => continue,
		};
		let request: Value = serde_json::from_str(&text).unwrap();
		let request_id = request["id"].clone();
		let expression = request["params"]["expression"].as_str().unwrap_or_default().to_string();
		shared.expressions.lock().unwrap().entry(id.clone()).or_default().push(expression.clone());

		let is_stats = expression.contains("GetStats");
		let result = match &behaviour {
			Behaviour::Silent => continue,
			Behaviour::CloseOnStats if is_stats => {
				let _ = socket.send(Message::Close(None)).await;
				break;
			}
			Behaviour::Stats(stats) if is_stats => json!({"result": {"type": "string", "value": stats}}),
			Behaviour::ThrowOnStop if expression.contains("Stop") => json!({
				"result": {"type": "object", "subtype": "error"},
				"exceptionDetails": {"text": "Uncaught", "exception": {"type": "object", "description": "TypeError: stop failed"}}
			}),
			_ => json!({"result": {"type": "undefined"}}),
		};

		// Unrelated traffic the client must skip over.
		let event = json!({"method": "Runtime.consoleAPICalled", "params": {"type": "log", "args": []}});
		let reply = json!({"id": request_id, "result": result});
		if socket.send(Message::Text(event.to_string().into())).await.is_err() || socket.send(Message::Text(reply.to_string().into())).await.is_err() {
			break;
		}
	}

	shared.closed.lock().unwrap().push(id);
}
