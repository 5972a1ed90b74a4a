//! One RPC connection to one debugging target.
//!
//! A [`Session`] multiplexes many logical `Runtime.evaluate` calls over a
//! single duplex WebSocket. Responses are demultiplexed purely by request id:
//!
//! 1. [`Session::call`] takes the next id and parks a oneshot sender in the
//!    pending table
//! 2. The request is queued to the transport task, which owns the socket
//! 3. The transport task hands every inbound text frame to [`Session::dispatch`]
//! 4. A response whose id is in the table resolves that call; anything else
//!    (events, late responses for abandoned ids) is dropped
//! 5. The caller races its receiver against the call deadline; whichever
//!    way the call ends, its table entry is removed
//!
//! When the socket closes (either side), every in-flight call fails with
//! [`Error::ChannelClosed`] and the close hook supplied at connect time runs.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use pilot_protocol::{EvaluateResult, Message, Request, Response};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::{Mutex as TokioMutex, mpsc, oneshot, watch};
use tracing::{debug, trace};

use crate::error::{Error, Result};

mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub(crate) use transport::CloseHook;

/// Deadline for a single correlated call.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(2);

/// Deadline for the WebSocket handshake.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// Identity of a session: the endpoint port plus the target id.
///
/// The same target id on two ports names two distinct sessions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionKey {
	pub port: u16,
	pub target_id: String,
}

impl SessionKey {
	pub fn new(port: u16, target_id: impl Into<String>) -> Self {
		Self {
			port,
			target_id: target_id.into(),
		}
	}
}

impl fmt::Display for SessionKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}:{}", self.port, self.target_id)
	}
}

/// Timing knobs for new sessions.
#[derive(Debug, Clone, Copy)]
pub struct SessionOptions {
	pub call_timeout: Duration,
	pub connect_timeout: Duration,
}

impl Default for SessionOptions {
	fn default() -> Self {
		Self {
			call_timeout: DEFAULT_CALL_TIMEOUT,
			connect_timeout: DEFAULT_CONNECT_TIMEOUT,
		}
	}
}

/// Frames queued for the transport task.
#[derive(Debug)]
pub(crate) enum Outbound {
	Text(String),
	Close,
}

type PendingMap = Mutex<HashMap<u64, oneshot::Sender<Result<Value>>>>;

/// Removes a call's pending entry when the call resolves, times out, or is dropped.
struct PendingGuard<'a> {
	id: u64,
	pending: &'a PendingMap,
}

impl Drop for PendingGuard<'_> {
	fn drop(&mut self) {
		self.pending.lock().remove(&self.id);
	}
}

/// Live RPC connection to one target.
pub struct Session {
	key: SessionKey,
	url: String,
	/// Next request id; starts at 1 and is never reset
	next_id: AtomicU64,
	pending: PendingMap,
	outbound: mpsc::UnboundedSender<Outbound>,
	closed: watch::Sender<bool>,
	/// Whether the payload has been evaluated in this target. Held across the
	/// injection call so concurrent `ensure`s inject at most once.
	injected: TokioMutex<bool>,
	call_timeout: Duration,
}

impl Session {
	pub(crate) fn new(key: SessionKey, url: impl Into<String>, call_timeout: Duration, outbound: mpsc::UnboundedSender<Outbound>) -> Arc<Self> {
		let (closed, _) = watch::channel(false);
		Arc::new(Self {
			key,
			url: url.into(),
			next_id: AtomicU64::new(1),
			pending: Mutex::new(HashMap::new()),
			outbound,
			closed,
			injected: TokioMutex::new(false),
			call_timeout,
		})
	}

	/// Opens the debugger socket at `url` and starts the transport task.
	///
	/// `on_close` runs once, on the transport task, after the socket closes
	/// for any reason. No retry is attempted on failure.
	pub async fn connect<F>(key: SessionKey, url: &str, options: &SessionOptions, on_close: F) -> Result<Arc<Self>>
	where
		F: FnOnce(&Arc<Session>) + Send + 'static,
	{
		debug!(target: "pilot.session", session = %key, url, "opening debugger socket");

		let ws = match tokio::time::timeout(options.connect_timeout, tokio_tungstenite::connect_async(url)).await {
			Ok(Ok((ws, _))) => ws,
			Ok(Err(e)) => {
				return Err(Error::ConnectionFailed {
					url: url.to_string(),
					reason: e.to_string(),
				});
			}
			Err(_) => {
				return Err(Error::ConnectionFailed {
					url: url.to_string(),
					reason: format!("no handshake within {}ms", options.connect_timeout.as_millis()),
				});
			}
		};

		let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
		let session = Self::new(key, url, options.call_timeout, outbound_tx);
		tokio::spawn(transport::run(ws, Arc::downgrade(&session), session.key.clone(), outbound_rx, Box::new(on_close)));
		Ok(session)
	}

	pub fn key(&self) -> &SessionKey {
		&self.key
	}

	pub fn url(&self) -> &str {
		&self.url
	}

	pub fn is_closed(&self) -> bool {
		*self.closed.borrow()
	}

	/// Resolves once the session has closed.
	pub async fn closed(&self) {
		let mut rx = self.closed.subscribe();
		let _ = rx.wait_for(|closed| *closed).await;
	}

	/// Number of calls currently awaiting a response.
	pub fn pending_count(&self) -> usize {
		self.pending.lock().len()
	}

	pub async fn is_injected(&self) -> bool {
		*self.injected.lock().await
	}

	pub(crate) fn injection_gate(&self) -> &TokioMutex<bool> {
		&self.injected
	}

	/// Closes the transport. In-flight calls fail with [`Error::ChannelClosed`].
	pub fn close(&self) {
		let _ = self.outbound.send(Outbound::Close);
		self.mark_closed();
	}

	/// Evaluates `expression` in the target and returns the resulting value.
	///
	/// Fails with [`Error::Timeout`] if no response with this call's id
	/// arrives within the call deadline; a response arriving later is dropped.
	/// `undefined` results come back as [`Value::Null`].
	pub async fn call(&self, expression: &str) -> Result<Value> {
		let id = self.next_id.fetch_add(1, Ordering::SeqCst);
		let (tx, rx) = oneshot::channel();
		self.pending.lock().insert(id, tx);
		let _guard = PendingGuard { id, pending: &self.pending };

		// Checked after registering so a concurrent close either drains this
		// entry or is observed here.
		if self.is_closed() {
			return Err(Error::ChannelClosed);
		}

		let text = serde_json::to_string(&Request::evaluate(id, expression))?;
		trace!(target: "pilot.session", session = %self.key, id, bytes = text.len(), "sending evaluate");
		self.outbound.send(Outbound::Text(text)).map_err(|_| Error::ChannelClosed)?;

		match tokio::time::timeout(self.call_timeout, rx).await {
			Ok(Ok(outcome)) => outcome,
			Ok(Err(_)) => Err(Error::ChannelClosed),
			Err(_) => {
				debug!(target: "pilot.session", session = %self.key, id, "request timed out");
				Err(Error::Timeout {
					id,
					timeout_ms: self.call_timeout.as_millis() as u64,
				})
			}
		}
	}

	/// Routes one inbound text frame.
	pub(crate) fn dispatch(&self, text: &str) {
		match serde_json::from_str::<Message>(text) {
			Ok(Message::Response(response)) => {
				let id = response.id;
				let Some(tx) = self.pending.lock().remove(&id) else {
					trace!(target: "pilot.session", session = %self.key, id, "dropping response for unknown or abandoned request");
					return;
				};
				let _ = tx.send(evaluation_outcome(response));
			}
			Ok(Message::Event(event)) => {
				trace!(target: "pilot.session", session = %self.key, method = %event.method, "ignoring event");
			}
			Ok(Message::Unknown(_)) => {
				trace!(target: "pilot.session", session = %self.key, "ignoring unrecognized message");
			}
			Err(e) => {
				debug!(target: "pilot.session", session = %self.key, error = %e, "failed to parse inbound message");
			}
		}
	}

	/// Marks the session closed and fails every in-flight call.
	///
	/// Returns false if it was already closed.
	pub(crate) fn mark_closed(&self) -> bool {
		if self.closed.send_replace(true) {
			return false;
		}
		let drained: Vec<_> = self.pending.lock().drain().map(|(_, tx)| tx).collect();
		for tx in drained {
			let _ = tx.send(Err(Error::ChannelClosed));
		}
		true
	}
}

impl fmt::Debug for Session {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Session")
			.field("key", &self.key)
			.field("url", &self.url)
			.field("closed", &self.is_closed())
			.finish_non_exhaustive()
	}
}

/// Converts a `Runtime.evaluate` response into the evaluated value.
fn evaluation_outcome(response: Response) -> Result<Value> {
	if let Some(error) = response.error {
		return Err(Error::Remote {
			code: error.code,
			message: error.message,
		});
	}
	let Some(result) = response.result else {
		return Ok(Value::Null);
	};
	let evaluated: EvaluateResult = serde_json::from_value(result)?;
	if let Some(details) = evaluated.exception_details {
		return Err(Error::Evaluation(details.summary()));
	}
	Ok(evaluated.result.value.unwrap_or(Value::Null))
}
