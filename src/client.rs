//! Selling Partner API transport shared by order and report retrieval.
//!
//! Every call authenticates with the `x-amz-access-token` header and maps failures into the
//! three-way taxonomy of [`ApiError`]: `Unauthorized` (the caller refreshes once and retries),
//! `Transient` (network or non-2xx, retryable upstream), and `MalformedResponse` (schema
//! mismatch, surfaced as-is with the parse path attached).

pub mod orders;
pub mod reports;

// crates.io
use reqwest::{RequestBuilder, StatusCode};
// self
use crate::{_prelude::*, auth::TokenSecret, error::ApiError};

const ACCESS_TOKEN_HEADER: &str = "x-amz-access-token";

/// Lenient error body used to classify non-2xx responses.
#[derive(Debug, Deserialize)]
struct ErrorsBody {
	#[serde(default)]
	errors: Vec<ErrorEntry>,
}

/// One entry of the remote `errors` array.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorEntry {
	pub(crate) code: String,
	#[serde(default)]
	pub(crate) message: Option<String>,
}

/// Authenticated Selling Partner API client.
#[derive(Clone, Debug)]
pub struct SpApiClient {
	http: ReqwestClient,
	endpoint: Url,
	marketplace_id: String,
}
impl SpApiClient {
	/// Creates a client for the given API base URL and marketplace filter.
	pub fn new(http: ReqwestClient, endpoint: Url, marketplace_id: impl Into<String>) -> Self {
		Self { http, endpoint, marketplace_id: marketplace_id.into() }
	}

	/// Marketplace identifier every order query is filtered to.
	pub fn marketplace_id(&self) -> &str {
		&self.marketplace_id
	}

	pub(crate) fn join(&self, path: &str) -> Result<Url, ApiError> {
		self.endpoint
			.join(path)
			.map_err(|e| ApiError::Transient { message: format!("invalid API URL: {e}"), status: None })
	}

	pub(crate) fn get(&self, url: Url, access_token: &TokenSecret) -> RequestBuilder {
		self.http.get(url).header(ACCESS_TOKEN_HEADER, access_token.expose())
	}

	pub(crate) fn post(&self, url: Url, access_token: &TokenSecret) -> RequestBuilder {
		self.http.post(url).header(ACCESS_TOKEN_HEADER, access_token.expose())
	}

	pub(crate) fn plain_get(&self, url: Url) -> RequestBuilder {
		self.http.get(url)
	}

	/// Sends the request and returns the status plus raw body; transport failures are
	/// [`ApiError::Transient`].
	pub(crate) async fn execute(
		&self,
		request: RequestBuilder,
	) -> Result<(StatusCode, Vec<u8>), ApiError> {
		let response = request.send().await?;
		let status = response.status();
		let body = response.bytes().await?.to_vec();

		Ok((status, body))
	}
}

/// Decodes a JSON body, attaching the failing path on schema mismatch.
pub(crate) fn decode<T>(body: &[u8], status: Option<u16>) -> Result<T, ApiError>
where
	T: serde::de::DeserializeOwned,
{
	let mut deserializer = serde_json::Deserializer::from_slice(body);

	serde_path_to_error::deserialize(&mut deserializer)
		.map_err(|source| ApiError::MalformedResponse { source, status })
}

/// Classifies a non-2xx response as `Unauthorized` or `Transient` using the status code and,
/// when present, the remote `errors` array.
pub(crate) fn classify_failure(status: StatusCode, body: &[u8]) -> ApiError {
	let entries = serde_json::from_slice::<ErrorsBody>(body).map(|b| b.errors).unwrap_or_default();
	let message = entries
		.first()
		.map(|entry| entry.message.clone().unwrap_or_else(|| entry.code.clone()))
		.unwrap_or_else(|| format!("status {status}"));
	let auth_rejected = status == StatusCode::UNAUTHORIZED
		|| status == StatusCode::FORBIDDEN
		|| entries.iter().any(|entry| entry.code == "Unauthorized");

	if auth_rejected {
		ApiError::Unauthorized { message }
	} else {
		ApiError::Transient { message, status: Some(status.as_u16()) }
	}
}

/// Classifies an `errors` array returned with a 2xx envelope.
pub(crate) fn classify_entries(entries: &[ErrorEntry]) -> ApiError {
	let message = entries
		.first()
		.map(|entry| entry.message.clone().unwrap_or_else(|| entry.code.clone()))
		.unwrap_or_else(|| "remote API reported an unspecified error".into());

	if entries.iter().any(|entry| entry.code == "Unauthorized") {
		ApiError::Unauthorized { message }
	} else {
		ApiError::Transient { message, status: None }
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn unauthorized_is_detected_from_status_and_body() {
		let by_status = classify_failure(StatusCode::UNAUTHORIZED, b"{}");

		assert!(matches!(by_status, ApiError::Unauthorized { .. }));

		let by_body = classify_failure(
			StatusCode::BAD_REQUEST,
			br#"{"errors":[{"code":"Unauthorized","message":"token expired"}]}"#,
		);

		assert!(matches!(by_body, ApiError::Unauthorized { .. }));
		assert!(by_body.to_string().contains("token expired"));
	}

	#[test]
	fn other_failures_are_transient_with_status() {
		let err = classify_failure(StatusCode::SERVICE_UNAVAILABLE, b"not json at all");

		assert!(matches!(err, ApiError::Transient { status: Some(503), .. }));
	}

	#[test]
	fn schema_mismatch_reports_the_failing_path() {
		#[derive(Debug, Deserialize)]
		struct Expected {
			#[allow(dead_code)]
			payload: String,
		}

		let err = decode::<Expected>(br#"{"payload":{}}"#, Some(200))
			.expect_err("Wrong payload type should fail to decode.");

		match err {
			ApiError::MalformedResponse { source, .. } =>
				assert_eq!(source.path().to_string(), "payload"),
			other => panic!("Expected MalformedResponse, got {other:?}."),
		}
	}
}
