//! JSON envelope exchanged over a target's debugger WebSocket.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The only protocol method this system issues.
pub const RUNTIME_EVALUATE: &str = "Runtime.evaluate";

/// Outbound request message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
	/// Correlation id, unique per connection
	pub id: u64,
	/// Protocol method name
	pub method: String,
	/// Method parameters
	pub params: Value,
}

impl Request {
	/// Builds a `Runtime.evaluate` request for `expression`.
	pub fn evaluate(id: u64, expression: impl Into<String>) -> Self {
		Self {
			id,
			method: RUNTIME_EVALUATE.to_string(),
			params: serde_json::to_value(EvaluateParams::new(expression)).unwrap_or(Value::Null),
		}
	}
}

/// Parameters of `Runtime.evaluate`.
///
/// Promises returned by the expression are awaited and the evaluation is
/// flagged as user-initiated so the payload may trigger activation-gated APIs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateParams {
	pub expression: String,
	pub await_promise: bool,
	pub user_gesture: bool,
}

impl EvaluateParams {
	pub fn new(expression: impl Into<String>) -> Self {
		Self {
			expression: expression.into(),
			await_promise: true,
			user_gesture: true,
		}
	}
}

/// Inbound response to a request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
	/// Id of the request this answers
	pub id: u64,
	/// Success payload (mutually exclusive with `error`)
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub result: Option<Value>,
	/// Protocol-level failure
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error: Option<ErrorPayload>,
}

/// Protocol-level error (`{"code": -32000, "message": "..."}`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorPayload {
	#[serde(default)]
	pub code: i64,
	pub message: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub data: Option<Value>,
}

/// Unsolicited notification (no `id`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
	pub method: String,
	#[serde(default)]
	pub params: Value,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub session_id: Option<String>,
}

/// Discriminated union of inbound messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Message {
	/// Has a numeric `id`
	Response(Response),
	/// Has a `method` and no `id`
	Event(Event),
	/// Anything else; ignored by the reader
	Unknown(Value),
}

/// `Runtime.evaluate` result body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateResult {
	#[serde(default)]
	pub result: RemoteObject,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub exception_details: Option<ExceptionDetails>,
}

/// Mirror of a JavaScript value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteObject {
	#[serde(rename = "type", default)]
	pub kind: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub subtype: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub value: Option<Value>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
}

/// Details of an exception thrown while evaluating.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExceptionDetails {
	#[serde(default)]
	pub text: String,
	#[serde(default)]
	pub line_number: i64,
	#[serde(default)]
	pub column_number: i64,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub exception: Option<RemoteObject>,
}

impl ExceptionDetails {
	/// Best human-readable summary: the thrown value's description, else the text.
	pub fn summary(&self) -> String {
		self.exception
			.as_ref()
			.and_then(|e| e.description.clone())
			.filter(|d| !d.is_empty())
			.unwrap_or_else(|| self.text.clone())
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn evaluate_request_wire_format() {
		let request = Request::evaluate(7, "1 + 1");
		let value = serde_json::to_value(&request).unwrap();
		assert_eq!(
			value,
			json!({
				"id": 7,
				"method": "Runtime.evaluate",
				"params": {"expression": "1 + 1", "awaitPromise": true, "userGesture": true}
			})
		);
	}

	#[test]
	fn response_is_distinguished_from_event() {
		let response: Message = serde_json::from_str(r#"{"id": 3, "result": {"result": {"type": "number", "value": 2}}}"#).unwrap();
		assert!(matches!(response, Message::Response(ref r) if r.id == 3));

		let event: Message = serde_json::from_str(r#"{"method": "Runtime.consoleAPICalled", "params": {"type": "log"}}"#).unwrap();
		match event {
			Message::Event(e) => assert_eq!(e.method, "Runtime.consoleAPICalled"),
			other => panic!("expected event, got {other:?}"),
		}

		let unknown: Message = serde_json::from_str(r#"{"foo": "bar"}"#).unwrap();
		assert!(matches!(unknown, Message::Unknown(_)));
	}

	#[test]
	fn error_response_parses() {
		let msg: Message = serde_json::from_str(r#"{"id": 9, "error": {"code": -32000, "message": "Cannot find context"}}"#).unwrap();
		let Message::Response(response) = msg else {
			panic!("expected response");
		};
		let err = response.error.unwrap();
		assert_eq!(err.code, -32000);
		assert_eq!(err.message, "Cannot find context");
	}

	#[test]
	fn exception_summary_prefers_description() {
		let result: EvaluateResult = serde_json::from_value(json!({
			"result": {"type": "object", "subtype": "error"},
			"exceptionDetails": {
				"text": "Uncaught",
				"lineNumber": 0,
				"columnNumber": 5,
				"exception": {"type": "object", "description": "ReferenceError: foo is not defined"}
			}
		}))
		.unwrap();
		assert_eq!(result.exception_details.unwrap().summary(), "ReferenceError: foo is not defined");
	}
}
