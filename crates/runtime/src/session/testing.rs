//! Socket-less sessions answered by a closure, for unit tests.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use pilot_protocol::Request;
use serde_json::{Value, json};
use tokio::sync::mpsc;

use super::{Outbound, Session, SessionKey};

/// How the scripted target answers one evaluate request.
pub(crate) enum Reply {
	Value(Value),
	Throw(&'static str),
	Silent,
}

/// Expressions a scripted session has been asked to evaluate, in order.
#[derive(Clone, Default)]
pub(crate) struct Recorded(Arc<Mutex<Vec<String>>>);

impl Recorded {
	pub(crate) fn all(&self) -> Vec<String> {
		self.0.lock().clone()
	}

	pub(crate) fn count(&self, expression: &str) -> usize {
		self.0.lock().iter().filter(|e| e.as_str() == expression).count()
	}
}

pub(crate) fn scripted<F>(key: SessionKey, call_timeout: Duration, mut answer: F) -> (Arc<Session>, Recorded)
where
	F: FnMut(&str) -> Reply + Send + 'static,
{
	let (tx, mut rx) = mpsc::unbounded_channel();
	let session = Session::new(key.clone(), format!("ws://127.0.0.1:{}/devtools/page/{}", key.port, key.target_id), call_timeout, tx);
	let recorded = Recorded::default();

	let weak = Arc::downgrade(&session);
	let log = recorded.clone();
	tokio::spawn(async move {
		while let Some(Outbound::Text(text)) = rx.recv().await {
			let Some(session) = weak.upgrade() else { break };
			let request: Request = serde_json::from_str(&text).expect("request json");
			let expression = request.params["expression"].as_str().unwrap_or_default().to_string();
			log.0.lock().push(expression.clone());
			let result = match answer(&expression) {
				Reply::Value(value) => json!({"result": {"type": "string", "value": value}}),
				Reply::Throw(message) => json!({
					"result": {"type": "object", "subtype": "error"},
					"exceptionDetails": {"text": "Uncaught", "exception": {"type": "object", "description": message}}
				}),
				Reply::Silent => continue,
			};
			session.dispatch(&json!({"id": request.id, "result": result}).to_string());
		}
	});

	(session, recorded)
}

/// Answers every expression with `undefined`.
pub(crate) fn undefined_reply(_: &str) -> Reply {
	Reply::Value(Value::Null)
}
