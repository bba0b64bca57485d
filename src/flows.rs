//! Request-level orchestration composing the stores, the token clients, and the cache policy.

pub mod authorize;
pub mod orders;
pub mod refresh;
pub mod settlement;

pub use authorize::AuthorizationStart;
pub use orders::{OrderListing, OrderSource};
pub use settlement::SettlementRow;

// self
use crate::{
	_prelude::*,
	client::SpApiClient,
	config::BridgeConfig,
	oauth::LwaClient,
	store::{CredentialStore, OrderCache},
};

/// Coordinates the token lifecycle, the read-through order cache, and the marketplace client.
///
/// The bridge owns the storage handles, the LWA client, and the SP-API client so individual
/// flows can focus on request-level policy (cache-vs-fetch, lazy refresh, retry-once). It
/// carries no per-request state beyond the anti-forgery tokens issued by the authorize flow;
/// concurrent requests for the same seller are allowed to race because every write is an
/// idempotent upsert.
pub struct Bridge {
	/// Credential persistence backend.
	pub credentials: Arc<dyn CredentialStore>,
	/// Order cache backend.
	pub orders: Arc<dyn OrderCache>,
	/// Token endpoint client.
	pub lwa: LwaClient,
	/// Marketplace API client.
	pub spapi: SpApiClient,
	/// Runtime configuration.
	pub config: Arc<BridgeConfig>,
	pending_states: Mutex<HashMap<String, OffsetDateTime>>,
}
impl Bridge {
	/// Assembles a bridge from its collaborators.
	pub fn new(
		credentials: Arc<dyn CredentialStore>,
		orders: Arc<dyn OrderCache>,
		lwa: LwaClient,
		spapi: SpApiClient,
		config: Arc<BridgeConfig>,
	) -> Self {
		Self { credentials, orders, lwa, spapi, config, pending_states: Default::default() }
	}
}
impl Debug for Bridge {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Bridge")
			.field("marketplace_id", &self.config.marketplace_id)
			.field("api_endpoint", &self.config.api_endpoint.as_str())
			.finish()
	}
}
