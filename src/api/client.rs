use gloo_net::http::{Request, RequestBuilder, Response};
use gloo_timers::future::TimeoutFuture;
use log::{debug, warn};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use web_sys::FormData;

use super::error::{RequestError, body_error, http_error_message};

/// Retries for transient failures: HTTP 500 and network errors.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RetryPolicy {
	pub max_retries: u32,
	pub delay_ms: u32,
}

impl Default for RetryPolicy {
	fn default() -> Self {
		Self {
			max_retries: 3,
			delay_ms: 1000,
		}
	}
}

impl RetryPolicy {
	/// Whether `err` after `attempt` retries warrants another try.
	pub fn should_retry(&self, err: &RequestError, attempt: u32) -> bool {
		attempt < self.max_retries
			&& matches!(err, RequestError::Network(_) | RequestError::Http { status: 500, .. })
	}
}

/// Thin JSON client over the knowledge-graph API.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ApiClient {
	base: String,
}

impl ApiClient {
	pub fn new(base: impl Into<String>) -> Self {
		Self {
			base: base.into().trim_end_matches('/').to_owned(),
		}
	}

	pub fn url(&self, path: &str) -> String {
		format!("{}{}", self.base, path)
	}

	pub async fn get_json<T: DeserializeOwned>(
		&self,
		path: &str,
		query: &[(&str, String)],
	) -> Result<T, RequestError> {
		let url = self.url(path);
		debug!("GET {url}");
		let request = Request::get(&url)
			.query(query.iter().map(|(k, v)| (*k, v.as_str())))
			.build()?;
		execute(request).await
	}

	/// GET with retries; only the statistics page asks for this.
	pub async fn get_json_with_retry<T: DeserializeOwned>(
		&self,
		path: &str,
		query: &[(&str, String)],
		policy: RetryPolicy,
	) -> Result<T, RequestError> {
		let mut attempt = 0;
		loop {
			match self.get_json(path, query).await {
				Ok(value) => return Ok(value),
				Err(err) if policy.should_retry(&err, attempt) => {
					attempt += 1;
					warn!("{path} failed ({err}); retry {attempt}/{}", policy.max_retries);
					TimeoutFuture::new(policy.delay_ms).await;
				}
				Err(err) => return Err(err),
			}
		}
	}

	pub async fn send_json<B: Serialize, T: DeserializeOwned>(
		&self,
		method: Method,
		path: &str,
		body: &B,
	) -> Result<T, RequestError> {
		let url = self.url(path);
		debug!("{method:?} {url}");
		let request = method.builder(&url).json(body)?;
		execute(request).await
	}

	pub async fn post_form<T: DeserializeOwned>(&self, path: &str, form: FormData) -> Result<T, RequestError> {
		let url = self.url(path);
		debug!("POST (multipart) {url}");
		let request = Request::post(&url).body(form)?;
		execute(request).await
	}

	pub async fn delete_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, RequestError> {
		let url = self.url(path);
		debug!("DELETE {url}");
		execute(Request::delete(&url).build()?).await
	}
}

/// Methods that carry a JSON body.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
	Post,
	Put,
}

impl Method {
	fn builder(self, url: &str) -> RequestBuilder {
		match self {
			Method::Post => Request::post(url),
			Method::Put => Request::put(url),
		}
	}
}

async fn execute<T: DeserializeOwned>(request: Request) -> Result<T, RequestError> {
	let response = request.send().await?;
	read(response).await
}

async fn read<T: DeserializeOwned>(response: Response) -> Result<T, RequestError> {
	let status = response.status();
	let text = response.text().await?;
	if !response.ok() {
		return Err(RequestError::Http {
			status,
			message: http_error_message(status, &response.status_text(), &text),
		});
	}
	decode(&text)
}

/// Parses a 2xx body. An empty body reads as `{}`; an `error` field is a rejection.
pub fn decode<T: DeserializeOwned>(text: &str) -> Result<T, RequestError> {
	let value: Value = if text.trim().is_empty() {
		Value::Object(Default::default())
	} else {
		serde_json::from_str(text).map_err(|e| RequestError::Schema(e.to_string()))?
	};
	if let Some(msg) = body_error(&value) {
		return Err(RequestError::Rejected(msg.to_owned()));
	}
	serde_json::from_value(value).map_err(|e| RequestError::Schema(e.to_string()))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::api::types::{Ack, GraphPayload, NodePage};

	#[test]
	fn retries_only_transient_failures() {
		let policy = RetryPolicy::default();
		let server = RequestError::Http {
			status: 500,
			message: "boom".into(),
		};
		let missing = RequestError::Http {
			status: 404,
			message: "nope".into(),
		};
		assert!(policy.should_retry(&server, 0));
		assert!(policy.should_retry(&RequestError::Network("offline".into()), 2));
		assert!(!policy.should_retry(&server, 3));
		assert!(!policy.should_retry(&missing, 0));
		assert!(!policy.should_retry(&RequestError::Schema("x".into()), 0));
	}

	#[test]
	fn error_field_in_success_body_is_a_rejection() {
		let err = decode::<NodePage>(r#"{"nodes":[],"error":"db down"}"#).unwrap_err();
		assert_eq!(err, RequestError::Rejected("db down".into()));
	}

	#[test]
	fn missing_arrays_are_schema_errors() {
		assert!(matches!(decode::<GraphPayload>(r#"{"nodes":[]}"#), Err(RequestError::Schema(_))));
		assert!(matches!(decode::<GraphPayload>("<html>"), Err(RequestError::Schema(_))));
	}

	#[test]
	fn empty_body_is_an_empty_ack() {
		assert_eq!(decode::<Ack>("").unwrap(), Ack::default());
	}

	#[test]
	fn base_url_is_joined_without_double_slash() {
		assert_eq!(ApiClient::new("http://kg/").url("/api/stats"), "http://kg/api/stats");
		assert_eq!(ApiClient::default().url("/api/stats"), "/api/stats");
	}
}
