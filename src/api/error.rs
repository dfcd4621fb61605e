use serde_json::Value;
use thiserror::Error;

/// Characters of a non-JSON error body kept in the message.
const BODY_EXCERPT_CHARS: usize = 100;

/// Failure of one API request, worded for display.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum RequestError {
	#[error("network error: {0}")]
	Network(String),
	#[error("{message}")]
	Http { status: u16, message: String },
	#[error("unexpected response: {0}")]
	Schema(String),
	/// A successful status whose body carries an `error` field.
	#[error("{0}")]
	Rejected(String),
}

impl RequestError {
	pub fn status(&self) -> Option<u16> {
		match self {
			RequestError::Http { status, .. } => Some(*status),
			_ => None,
		}
	}
}

impl From<gloo_net::Error> for RequestError {
	fn from(err: gloo_net::Error) -> Self {
		match err {
			gloo_net::Error::SerdeError(e) => RequestError::Schema(e.to_string()),
			other => RequestError::Network(other.to_string()),
		}
	}
}

/// The `error` string of a JSON body, if any.
pub fn body_error(body: &Value) -> Option<&str> {
	body.get("error")
		.and_then(Value::as_str)
		.filter(|s| !s.trim().is_empty())
}

/// Message for a non-2xx response: the body's `error` field when present,
/// otherwise the status line and the start of the body.
pub fn http_error_message(status: u16, status_text: &str, body: &str) -> String {
	if let Ok(json) = serde_json::from_str::<Value>(body) {
		if let Some(msg) = body_error(&json) {
			return msg.to_owned();
		}
	}
	let status_line = format!("{status} {status_text}");
	let excerpt: String = body.trim().chars().take(BODY_EXCERPT_CHARS).collect();
	if excerpt.is_empty() {
		status_line
	} else {
		format!("{} {excerpt}", status_line.trim_end())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn json_error_field_wins() {
		let msg = http_error_message(400, "Bad Request", r#"{"error":"name taken"}"#);
		assert_eq!(msg, "name taken");
	}

	#[test]
	fn html_body_is_cut_to_an_excerpt() {
		let body = format!("<html>{}</html>", "x".repeat(300));
		let msg = http_error_message(502, "Bad Gateway", &body);
		assert!(msg.starts_with("502 Bad Gateway <html>"));
		assert_eq!(msg.chars().count(), "502 Bad Gateway ".len() + BODY_EXCERPT_CHARS);
	}

	#[test]
	fn empty_body_gives_status_line() {
		assert_eq!(http_error_message(500, "Internal Server Error", ""), "500 Internal Server Error");
		assert_eq!(http_error_message(404, "", "{}"), "404 {}");
	}

	#[test]
	fn display_is_the_user_facing_message() {
		let err = RequestError::Http {
			status: 404,
			message: "node not found".into(),
		};
		assert_eq!(err.to_string(), "node not found");
		assert_eq!(err.status(), Some(404));
		assert_eq!(RequestError::Rejected("dup".into()).to_string(), "dup");
	}
}
