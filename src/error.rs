//! Bridge-level error types shared across flows, clients, and stores.

// self
use crate::_prelude::*;

/// Bridge-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical bridge error surfaced at the request boundary.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Authorization-server exchange failure.
	#[error(transparent)]
	Auth(#[from] AuthError),
	/// Marketplace API failure.
	#[error(transparent)]
	Api(#[from] ApiError),

	/// A required request parameter was absent.
	#[error("Missing required parameter `{name}`.")]
	MissingParameter {
		/// Name of the absent query parameter.
		name: &'static str,
	},
	/// A request parameter was present but unusable.
	#[error("Invalid parameter `{name}`: {message}")]
	InvalidParameter {
		/// Name of the offending query parameter.
		name: &'static str,
		/// Validation failure description.
		message: String,
	},
	/// Access was rejected and could not be recovered by a refresh.
	#[error("Unauthorized: {reason}.")]
	Unauthorized {
		/// Why the request cannot be authorized.
		reason: String,
	},
}

/// Configuration and validation failures raised while assembling the bridge.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// A required environment variable was not set.
	#[error("Environment variable `{name}` is not set.")]
	MissingVar {
		/// Variable name.
		name: &'static str,
	},
	/// An environment variable was set but failed to parse.
	#[error("Environment variable `{name}` is invalid: {message}.")]
	InvalidVar {
		/// Variable name.
		name: &'static str,
		/// Parsing failure description.
		message: String,
	},
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
impl From<reqwest::Error> for ConfigError {
	fn from(e: reqwest::Error) -> Self {
		Self::http_client_build(e)
	}
}

/// Failures raised while exchanging authorization codes or refresh tokens at the token endpoint.
///
/// None of these variants mutate the credential store; the caller decides whether a failed
/// exchange is a user-visible 400 (initial authorization) or a terminal 401 (lazy refresh).
#[derive(Debug, ThisError)]
pub enum AuthError {
	/// Token endpoint answered without an access token, or with a non-2xx status.
	#[error("Token endpoint rejected the grant: {message}.")]
	ExchangeRejected {
		/// Provider-supplied error description, when one was present.
		message: String,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// Token endpoint responded with JSON that does not match the expected schema.
	#[error("Token endpoint returned malformed JSON.")]
	ResponseParse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// Transport failure while calling the token endpoint.
	#[error("Network error occurred while calling the token endpoint.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
}
impl AuthError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
impl From<reqwest::Error> for AuthError {
	fn from(e: reqwest::Error) -> Self {
		Self::network(e)
	}
}

/// Marketplace API error taxonomy surfaced by [`SpApiClient`](crate::client::SpApiClient).
#[derive(Debug, ThisError)]
pub enum ApiError {
	/// The marketplace rejected the access token; refresh once and retry before giving up.
	#[error("Marketplace API rejected the access token: {message}")]
	Unauthorized {
		/// Provider-supplied rejection description.
		message: String,
	},
	/// Network failure or non-2xx server response; safe to retry with backoff.
	#[error("Marketplace API is unavailable: {message}")]
	Transient {
		/// Failure description.
		message: String,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// Response shape does not match the expected schema; not retryable.
	#[error("Marketplace API returned a malformed response.")]
	MalformedResponse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
}
impl From<reqwest::Error> for ApiError {
	fn from(e: reqwest::Error) -> Self {
		Self::Transient { message: e.to_string(), status: e.status().map(|s| s.as_u16()) }
	}
}
