//! WebSocket pump owned by each session.

use std::sync::{Arc, Weak};

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, info};

use super::{Outbound, Session, SessionKey};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Invoked once on the transport task after the socket closes.
pub(crate) type CloseHook = Box<dyn FnOnce(&Arc<Session>) + Send>;

/// Moves frames between the socket and the session until either side closes.
///
/// Holds only a weak reference so that dropping the last session handle
/// closes the socket.
pub(crate) async fn run(ws: WsStream, session: Weak<Session>, key: SessionKey, mut outbound_rx: mpsc::UnboundedReceiver<Outbound>, on_close: CloseHook) {
	let (mut sink, mut stream) = ws.split();

	loop {
		tokio::select! {
			outbound = outbound_rx.recv() => match outbound {
				Some(Outbound::Text(text)) => {
					if let Err(e) = sink.send(Message::Text(text)).await {
						debug!(target: "pilot.session", session = %key, error = %e, "socket write failed");
						break;
					}
				}
				Some(Outbound::Close) | None => {
					let _ = sink.send(Message::Close(None)).await;
					let _ = sink.close().await;
					break;
				}
			},
			inbound = stream.next() => match inbound {
				Some(Ok(Message::Text(text))) => {
					if let Some(session) = session.upgrade() {
						session.dispatch(&text);
					}
				}
				Some(Ok(Message::Binary(bytes))) => {
					if let (Some(session), Ok(text)) = (session.upgrade(), std::str::from_utf8(&bytes)) {
						session.dispatch(text);
					}
				}
				Some(Ok(Message::Close(_))) | None => break,
				Some(Ok(_)) => {}
				Some(Err(e)) => {
					debug!(target: "pilot.session", session = %key, error = %e, "socket read failed");
					break;
				}
			},
		}
	}

	info!(target: "pilot.session", session = %key, "disconnected from target");

	if let Some(session) = session.upgrade() {
		session.mark_closed();
		on_close(&session);
	}
}
