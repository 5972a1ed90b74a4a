//! Session registry keyed by `(port, target id)`.

use std::sync::Arc;

use dashmap::DashMap;
use pilot_protocol::Target;
use tracing::{debug, info};

use crate::session::{Session, SessionKey, SessionOptions};

/// Exclusive owner of all live sessions.
///
/// A session is present iff its transport is open or opening: the close hook
/// installed by [`SessionRegistry::connect`] removes it the moment the socket
/// closes. Removal is identity-checked, so a stale close can never evict a
/// newer session registered under the same key.
#[derive(Clone, Default)]
pub struct SessionRegistry {
	sessions: Arc<DashMap<SessionKey, Arc<Session>>>,
}

impl SessionRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Connects to `target` on `port` unless a live session already exists.
	///
	/// Returns true when a live session is registered afterwards. Targets
	/// without a debugger URL and failed handshakes return false and leave
	/// the registry untouched.
	pub async fn connect(&self, port: u16, target: &Target, options: &SessionOptions) -> bool {
		let key = SessionKey::new(port, target.id.clone());

		if let Some(existing) = self.get(&key) {
			if !existing.is_closed() {
				return true;
			}
			self.remove_if_same(&existing);
		}

		let Some(url) = target.ws_url() else {
			debug!(target: "pilot.registry", session = %key, "target has no debugger url");
			return false;
		};

		let registry = self.clone();
		let session = match Session::connect(key.clone(), url, options, move |session| {
			registry.remove_if_same(session);
		})
		.await
		{
			Ok(session) => session,
			Err(e) => {
				debug!(target: "pilot.registry", session = %key, error = %e, "connection failed");
				return false;
			}
		};

		self.insert(Arc::clone(&session));

		// The socket may already have closed before we inserted.
		if session.is_closed() {
			self.remove_if_same(&session);
			return false;
		}

		info!(target: "pilot.registry", session = %key, title = %target.title, "connected to target");
		true
	}

	pub fn get(&self, key: &SessionKey) -> Option<Arc<Session>> {
		self.sessions.get(key).map(|entry| Arc::clone(entry.value()))
	}

	pub fn contains(&self, key: &SessionKey) -> bool {
		self.sessions.contains_key(key)
	}

	/// Registers `session`, replacing (and closing) any previous holder of its key.
	pub fn insert(&self, session: Arc<Session>) {
		if let Some(previous) = self.sessions.insert(session.key().clone(), session) {
			previous.close();
		}
	}

	pub fn remove(&self, key: &SessionKey) -> Option<Arc<Session>> {
		self.sessions.remove(key).map(|(_, session)| session)
	}

	/// Removes `session` only if its key still maps to this exact instance.
	pub(crate) fn remove_if_same(&self, session: &Arc<Session>) -> bool {
		self.sessions.remove_if(session.key(), |_, registered| Arc::ptr_eq(registered, session)).is_some()
	}

	/// Snapshot of the registered sessions.
	pub fn sessions(&self) -> Vec<Arc<Session>> {
		self.sessions.iter().map(|entry| Arc::clone(entry.value())).collect()
	}

	pub fn keys(&self) -> Vec<SessionKey> {
		let mut keys: Vec<SessionKey> = self.sessions.iter().map(|entry| entry.key().clone()).collect();
		keys.sort();
		keys
	}

	/// Removes and returns every registered session.
	pub fn drain(&self) -> Vec<Arc<Session>> {
		let keys: Vec<SessionKey> = self.sessions.iter().map(|entry| entry.key().clone()).collect();
		keys.iter().filter_map(|key| self.remove(key)).collect()
	}

	/// Drops registered sessions whose transport has already closed.
	pub fn prune_closed(&self) -> usize {
		let mut pruned = 0;
		self.sessions.retain(|_, session| {
			let live = !session.is_closed();
			if !live {
				pruned += 1;
			}
			live
		});
		pruned
	}

	pub fn len(&self) -> usize {
		self.sessions.len()
	}

	pub fn is_empty(&self) -> bool {
		self.sessions.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use std::time::{Duration, Instant};

	use tokio::sync::mpsc;

	use super::*;

	fn detached(port: u16, id: &str) -> Arc<Session> {
		let (tx, rx) = mpsc::unbounded_channel();
		std::mem::forget(rx);
		Session::new(SessionKey::new(port, id), format!("ws://127.0.0.1:{port}/devtools/page/{id}"), Duration::from_millis(100), tx)
	}

	#[test]
	fn same_target_on_two_ports_is_two_sessions() {
		let registry = SessionRegistry::new();
		registry.insert(detached(9000, "A"));
		registry.insert(detached(9001, "A"));
		assert_eq!(registry.len(), 2);
		assert_eq!(registry.keys(), vec![SessionKey::new(9000, "A"), SessionKey::new(9001, "A")]);
	}

	#[test]
	fn stale_close_does_not_evict_replacement() {
		let registry = SessionRegistry::new();
		let old = detached(9000, "A");
		registry.insert(Arc::clone(&old));

		let replacement = detached(9000, "A");
		registry.insert(Arc::clone(&replacement));
		assert!(old.is_closed(), "replaced session should be closed");

		assert!(!registry.remove_if_same(&old));
		let current = registry.get(&SessionKey::new(9000, "A")).unwrap();
		assert!(Arc::ptr_eq(&current, &replacement));

		assert!(registry.remove_if_same(&replacement));
		assert!(registry.is_empty());
	}

	#[test]
	fn prune_and_drain() {
		let registry = SessionRegistry::new();
		let closed = detached(9000, "A");
		registry.insert(Arc::clone(&closed));
		registry.insert(detached(9000, "B"));
		closed.close();

		assert_eq!(registry.prune_closed(), 1);
		assert!(!registry.contains(&SessionKey::new(9000, "A")));
		assert_eq!(registry.prune_closed(), 0);

		// Counts removals, not the change in size.
		registry.insert(detached(9000, "C"));
		let gone = detached(9000, "D");
		registry.insert(Arc::clone(&gone));
		gone.close();
		assert_eq!(registry.prune_closed(), 1);
		assert_eq!(registry.len(), 2);

		let drained = registry.drain();
		assert_eq!(drained.len(), 2);
		assert!(registry.is_empty());
	}

	#[tokio::test]
	async fn connect_without_debugger_url_is_refused() {
		let registry = SessionRegistry::new();
		let target = Target {
			id: "P".into(),
			kind: "page".into(),
			web_socket_debugger_url: None,
			title: String::new(),
			url: String::new(),
		};
		assert!(!registry.connect(9000, &target, &SessionOptions::default()).await);
		assert!(registry.is_empty());
	}

	fn page(id: &str, ws_url: String) -> Target {
		Target {
			id: id.into(),
			kind: "page".into(),
			web_socket_debugger_url: Some(ws_url),
			title: String::new(),
			url: String::new(),
		}
	}

	fn quick_options() -> SessionOptions {
		SessionOptions {
			call_timeout: Duration::from_millis(200),
			connect_timeout: Duration::from_millis(200),
		}
	}

	#[tokio::test]
	async fn refused_socket_creates_no_session() {
		let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
		let port = listener.local_addr().unwrap().port();
		drop(listener);

		let registry = SessionRegistry::new();
		let target = page("R", format!("ws://127.0.0.1:{port}/devtools/page/R"));
		assert!(!registry.connect(port, &target, &quick_options()).await);
		assert!(registry.is_empty());
	}

	#[tokio::test]
	async fn stalled_handshake_gives_up_at_connect_deadline() {
		// Accepted by the kernel backlog but never upgraded.
		let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
		let port = listener.local_addr().unwrap().port();

		let registry = SessionRegistry::new();
		let target = page("S", format!("ws://127.0.0.1:{port}/devtools/page/S"));
		let started = Instant::now();
		assert!(!registry.connect(port, &target, &quick_options()).await);
		let elapsed = started.elapsed();
		assert!(elapsed >= Duration::from_millis(150), "gave up too early: {elapsed:?}");
		assert!(elapsed < Duration::from_millis(1500), "connect deadline ignored: {elapsed:?}");
		assert!(registry.is_empty());
		drop(listener);
	}
}
