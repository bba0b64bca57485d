//! Runtime configuration assembled from the environment.

// std
use std::{env, net::SocketAddr, time::Duration as StdDuration};
// self
use crate::{_prelude::*, auth::TokenSecret, error::ConfigError};

const DEFAULT_TOKEN_ENDPOINT: &str = "https://api.amazon.com/auth/o2/token";
const DEFAULT_CONSENT_ENDPOINT: &str = "https://sellercentral.amazon.com/apps/authorize/consent";
const DEFAULT_API_ENDPOINT: &str = "https://sellingpartnerapi-na.amazon.com";
const DEFAULT_MARKETPLACE_ID: &str = "A1AM78C64UM0Y8";
const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_CACHE_TTL_SECS: i64 = 1_800;
const DEFAULT_LOOKBACK_DAYS: i64 = 30;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 15;
const DEFAULT_REPORT_POLL_INTERVAL_SECS: u64 = 2;
const DEFAULT_REPORT_POLL_LIMIT: u32 = 10;

/// Everything the bridge needs at runtime, loaded once at startup.
#[derive(Clone, Debug)]
pub struct BridgeConfig {
	/// LWA client identifier used for both grants.
	pub client_id: String,
	/// LWA client secret.
	pub client_secret: TokenSecret,
	/// Seller Central application identifier embedded in the consent URL.
	pub application_id: String,
	/// Token endpoint for authorization-code and refresh-token exchanges.
	pub token_endpoint: Url,
	/// Seller Central consent page the start-oauth endpoint redirects to.
	pub consent_endpoint: Url,
	/// Selling Partner API base URL.
	pub api_endpoint: Url,
	/// Marketplace the order queries are filtered to.
	pub marketplace_id: String,
	/// Redirect URI registered with the application.
	pub redirect_uri: Url,
	/// Dashboard URL the callback redirects to after a successful exchange.
	pub dashboard_url: Url,
	/// Postgres connection string.
	pub database_url: String,
	/// Socket the HTTP server binds to.
	pub listen_addr: SocketAddr,
	/// How long a cached order result set counts as fresh.
	pub cache_ttl: Duration,
	/// `CreatedAfter` window for remote order fetches.
	pub lookback: Duration,
	/// Timeout applied to every outbound HTTP call.
	pub http_timeout: StdDuration,
	/// Delay between settlement report status polls.
	pub report_poll_interval: StdDuration,
	/// Maximum settlement report status polls before giving up.
	pub report_poll_limit: u32,
}
impl BridgeConfig {
	/// Loads the configuration from `BRIDGE_*` environment variables (plus `DATABASE_URL`).
	pub fn from_env() -> Result<Self, ConfigError> {
		Ok(Self {
			client_id: required("BRIDGE_LWA_CLIENT_ID")?,
			client_secret: TokenSecret::new(required("BRIDGE_LWA_CLIENT_SECRET")?),
			application_id: required("BRIDGE_APPLICATION_ID")?,
			token_endpoint: url_or("BRIDGE_TOKEN_ENDPOINT", DEFAULT_TOKEN_ENDPOINT)?,
			consent_endpoint: url_or("BRIDGE_CONSENT_ENDPOINT", DEFAULT_CONSENT_ENDPOINT)?,
			api_endpoint: url_or("BRIDGE_API_ENDPOINT", DEFAULT_API_ENDPOINT)?,
			marketplace_id: var("BRIDGE_MARKETPLACE_ID")
				.unwrap_or_else(|| DEFAULT_MARKETPLACE_ID.into()),
			redirect_uri: parse_url("BRIDGE_REDIRECT_URI", &required("BRIDGE_REDIRECT_URI")?)?,
			dashboard_url: parse_url("BRIDGE_DASHBOARD_URL", &required("BRIDGE_DASHBOARD_URL")?)?,
			database_url: required("DATABASE_URL")?,
			listen_addr: parsed_or("BRIDGE_LISTEN_ADDR", DEFAULT_LISTEN_ADDR)?,
			cache_ttl: Duration::seconds(int_or("BRIDGE_CACHE_TTL_SECS", DEFAULT_CACHE_TTL_SECS)?),
			lookback: Duration::days(int_or("BRIDGE_LOOKBACK_DAYS", DEFAULT_LOOKBACK_DAYS)?),
			http_timeout: StdDuration::from_secs(uint_or(
				"BRIDGE_HTTP_TIMEOUT_SECS",
				DEFAULT_HTTP_TIMEOUT_SECS,
			)?),
			report_poll_interval: StdDuration::from_secs(uint_or(
				"BRIDGE_REPORT_POLL_INTERVAL_SECS",
				DEFAULT_REPORT_POLL_INTERVAL_SECS,
			)?),
			report_poll_limit: parsed_or(
				"BRIDGE_REPORT_POLL_LIMIT",
				&DEFAULT_REPORT_POLL_LIMIT.to_string(),
			)?,
		})
	}
}

fn var(name: &'static str) -> Option<String> {
	env::var(name).ok().filter(|value| !value.is_empty())
}

fn required(name: &'static str) -> Result<String, ConfigError> {
	var(name).ok_or(ConfigError::MissingVar { name })
}

fn parse_url(name: &'static str, value: &str) -> Result<Url, ConfigError> {
	Url::parse(value).map_err(|e| ConfigError::InvalidVar { name, message: e.to_string() })
}

fn url_or(name: &'static str, default: &str) -> Result<Url, ConfigError> {
	match var(name) {
		Some(value) => parse_url(name, &value),
		None => parse_url(name, default),
	}
}

fn parsed_or<T>(name: &'static str, default: &str) -> Result<T, ConfigError>
where
	T: FromStr,
	T::Err: Display,
{
	var(name)
		.as_deref()
		.unwrap_or(default)
		.parse()
		.map_err(|e: T::Err| ConfigError::InvalidVar { name, message: e.to_string() })
}

fn int_or(name: &'static str, default: i64) -> Result<i64, ConfigError> {
	match var(name) {
		Some(value) => value
			.parse()
			.map_err(|e: std::num::ParseIntError| ConfigError::InvalidVar {
				name,
				message: e.to_string(),
			}),
		None => Ok(default),
	}
}

fn uint_or(name: &'static str, default: u64) -> Result<u64, ConfigError> {
	match var(name) {
		Some(value) => value
			.parse()
			.map_err(|e: std::num::ParseIntError| ConfigError::InvalidVar {
				name,
				message: e.to_string(),
			}),
		None => Ok(default),
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn defaults_parse() {
		let listen: SocketAddr =
			DEFAULT_LISTEN_ADDR.parse().expect("Default listen address should parse.");

		assert_eq!(listen.port(), 8080);
		assert!(Url::parse(DEFAULT_TOKEN_ENDPOINT).is_ok());
		assert!(Url::parse(DEFAULT_CONSENT_ENDPOINT).is_ok());
		assert!(Url::parse(DEFAULT_API_ENDPOINT).is_ok());
	}

	#[test]
	fn missing_required_variable_is_reported_by_name() {
		let err = required("BRIDGE_TEST_UNSET_VARIABLE")
			.expect_err("Unset variable should be reported as missing.");

		assert!(matches!(err, ConfigError::MissingVar { name: "BRIDGE_TEST_UNSET_VARIABLE" }));
	}
}
