//! Wire types for the DevTools remote-debugging protocol.
//!
//! This crate holds the serde types shared by the runtime and the CLI:
//!
//! - [`Target`]: one entry of the `/json/list` HTTP listing
//! - [`Request`], [`Response`], [`Message`]: the WebSocket JSON envelope
//! - [`EvaluateResult`]: the `Runtime.evaluate` result shape
//! - [`Counters`]: telemetry totals reported by the injected payload
//!
//! Only the `Runtime.evaluate` method is modelled; everything else that
//! arrives on a target socket is an unsolicited [`Event`] or an opaque
//! [`Message::Unknown`].

pub mod counters;
pub mod message;
pub mod target;

pub use counters::Counters;
pub use message::{
	ErrorPayload, EvaluateParams, EvaluateResult, Event, ExceptionDetails, Message, RUNTIME_EVALUATE, RemoteObject, Request, Response,
};
pub use target::{AUTOMATABLE_TARGET_TYPES, Target};
