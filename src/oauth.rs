//! Login-with-Amazon token endpoint client handling code exchange and refresh grants.
//!
//! Both grants are plain form-encoded POSTs against one token endpoint; responses are decoded
//! with [`serde_path_to_error`] so malformed payloads surface a usable diagnostic instead of a
//! bare parse failure. A successful body must carry `access_token` and a positive `expires_in`,
//! otherwise the grant counts as rejected and the credential store is left untouched.

// self
use crate::{_prelude::*, auth::TokenSecret, error::AuthError};

/// Token grant returned by the LWA token endpoint.
#[derive(Clone, Debug)]
pub struct TokenGrant {
	/// Freshly minted access token.
	pub access_token: TokenSecret,
	/// Rotated refresh token, when the endpoint issued one.
	pub refresh_token: Option<TokenSecret>,
	/// Access token lifetime.
	pub expires_in: Duration,
}

#[derive(Deserialize)]
struct TokenEndpointResponse {
	#[serde(default)]
	access_token: Option<String>,
	#[serde(default)]
	refresh_token: Option<String>,
	#[serde(default)]
	expires_in: Option<i64>,
	#[serde(default)]
	error: Option<String>,
	#[serde(default)]
	error_description: Option<String>,
}

/// HTTP client for the LWA token endpoint.
#[derive(Clone, Debug)]
pub struct LwaClient {
	http: ReqwestClient,
	token_endpoint: Url,
	client_id: String,
	client_secret: TokenSecret,
}
impl LwaClient {
	/// Creates a client that reuses the caller-provided HTTP handle.
	pub fn new(
		http: ReqwestClient,
		token_endpoint: Url,
		client_id: impl Into<String>,
		client_secret: TokenSecret,
	) -> Self {
		Self { http, token_endpoint, client_id: client_id.into(), client_secret }
	}

	/// Exchanges an authorization code for the seller's first token grant.
	pub async fn exchange_code(
		&self,
		code: &str,
		redirect_uri: &Url,
	) -> Result<TokenGrant, AuthError> {
		let form = [
			("grant_type", "authorization_code"),
			("code", code),
			("redirect_uri", redirect_uri.as_str()),
			("client_id", &self.client_id),
			("client_secret", self.client_secret.expose()),
		];

		self.request_grant(&form).await
	}

	/// Exchanges a long-lived refresh token for a new access token.
	pub async fn refresh(&self, refresh_token: &TokenSecret) -> Result<TokenGrant, AuthError> {
		let form = [
			("grant_type", "refresh_token"),
			("refresh_token", refresh_token.expose()),
			("client_id", &self.client_id),
			("client_secret", self.client_secret.expose()),
		];

		self.request_grant(&form).await
	}

	async fn request_grant(&self, form: &[(&str, &str)]) -> Result<TokenGrant, AuthError> {
		let response = self.http.post(self.token_endpoint.clone()).form(form).send().await?;
		let status = response.status();
		let body = response.bytes().await?;

		decode_grant(&body, status.is_success(), Some(status.as_u16()))
	}
}

/// Decodes a token endpoint body into a grant, treating any body without a usable
/// `access_token`/`expires_in` pair as a rejected exchange.
fn decode_grant(body: &[u8], success: bool, status: Option<u16>) -> Result<TokenGrant, AuthError> {
	let mut deserializer = serde_json::Deserializer::from_slice(body);
	let decoded: TokenEndpointResponse = serde_path_to_error::deserialize(&mut deserializer)
		.map_err(|source| AuthError::ResponseParse { source, status })?;
	let rejected = |message: String| AuthError::ExchangeRejected { message, status };

	if !success {
		return Err(rejected(
			decoded
				.error_description
				.or(decoded.error)
				.unwrap_or_else(|| "token endpoint returned a non-success status".into()),
		));
	}

	let access_token = decoded
		.access_token
		.ok_or_else(|| rejected("response did not include an access_token".into()))?;
	let expires_in = decoded
		.expires_in
		.ok_or_else(|| rejected("response did not include expires_in".into()))?;

	if expires_in <= 0 {
		return Err(rejected("expires_in must be positive".into()));
	}

	Ok(TokenGrant {
		access_token: TokenSecret::new(access_token),
		refresh_token: decoded.refresh_token.map(TokenSecret::new),
		expires_in: Duration::seconds(expires_in),
	})
}
