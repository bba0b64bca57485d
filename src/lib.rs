//! Thin marketplace bridge—OAuth token lifecycle with opportunistic refresh, a read-through
//! order cache in front of the Selling Partner API, and the dashboard endpoints that sit on top.

#![deny(clippy::all, missing_docs)]

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod flows;
pub mod oauth;
pub mod order;
pub mod server;
pub mod store;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// std
	use std::time::Duration as StdDuration;
	// self
	use crate::{
		auth::{Credential, SellerId, TokenSecret},
		client::SpApiClient,
		config::BridgeConfig,
		flows::Bridge,
		oauth::LwaClient,
		store::{CredentialStore, MemoryStore},
	};

	/// Builds a configuration pointing the token and API endpoints at the given mock server
	/// base URL, with a poll cadence fast enough for tests.
	pub fn test_config(base: &str) -> BridgeConfig {
		let at = |path: &str| {
			Url::parse(&format!("{base}{path}")).expect("Mock endpoint URL should parse.")
		};

		BridgeConfig {
			client_id: "bridge-client".into(),
			client_secret: TokenSecret::new("bridge-secret"),
			application_id: "amzn1.sp.solution.test".into(),
			token_endpoint: at("/auth/o2/token"),
			consent_endpoint: at("/apps/authorize/consent"),
			api_endpoint: at(""),
			marketplace_id: "MKTTEST1".into(),
			redirect_uri: Url::parse("https://bridge.test/callback")
				.expect("Redirect URI fixture should parse."),
			dashboard_url: Url::parse("https://dashboard.test/")
				.expect("Dashboard URL fixture should parse."),
			database_url: "postgres://unused".into(),
			listen_addr: ([127, 0, 0, 1], 0).into(),
			cache_ttl: Duration::minutes(30),
			lookback: Duration::days(30),
			http_timeout: StdDuration::from_secs(5),
			report_poll_interval: StdDuration::from_millis(10),
			report_poll_limit: 5,
		}
	}

	/// Constructs a [`Bridge`] backed by an in-memory store and a plain reqwest transport.
	pub fn build_test_bridge(config: BridgeConfig) -> (Bridge, Arc<MemoryStore>) {
		let http = ReqwestClient::new();
		let lwa = LwaClient::new(
			http.clone(),
			config.token_endpoint.clone(),
			config.client_id.clone(),
			config.client_secret.clone(),
		);
		let spapi =
			SpApiClient::new(http, config.api_endpoint.clone(), config.marketplace_id.clone());
		let store = Arc::new(MemoryStore::default());
		let bridge = Bridge::new(store.clone(), store.clone(), lwa, spapi, Arc::new(config));

		(bridge, store)
	}

	/// Seller identifier fixture shared across integration tests.
	pub fn test_seller() -> SellerId {
		SellerId::new("seller-1").expect("Seller identifier fixture should be valid.")
	}

	/// Seeds a credential issued now with the provided lifetime; a negative lifetime seeds an
	/// already-expired credential.
	pub async fn seed_test_credential(
		store: &MemoryStore,
		seller_id: &SellerId,
		access: &str,
		refresh: &str,
		lifetime: Duration,
	) -> Credential {
		let credential = Credential::issue(
			seller_id.clone(),
			TokenSecret::new(access),
			TokenSecret::new(refresh),
			OffsetDateTime::now_utc(),
			lifetime,
		);

		store
			.upsert(credential.clone())
			.await
			.expect("Failed to seed credential into the store.");

		credential
	}
}

mod _prelude {
	pub use std::{
		collections::HashMap,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use parking_lot::{Mutex, RwLock};
	pub use reqwest::Client as ReqwestClient;
	pub use rust_decimal::Decimal;
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use url;
