//! Read-through order listing: serve fresh cache, otherwise fetch, retry once on a mid-request
//! token rejection, and persist what came back.

// crates.io
use tracing::Instrument;
// self
use crate::{
	_prelude::*,
	auth::{Credential, SellerId},
	error::ApiError,
	flows::Bridge,
	order::Order,
};

const QUERY_LIMIT: u32 = 100;

/// Where a listing's rows came from.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum OrderSource {
	/// Rows were served from the local cache without touching the marketplace.
	Cache,
	/// Rows came from a marketplace fetch (and were persisted on the way out).
	Remote,
}

/// Result of [`Bridge::get_orders`].
#[derive(Clone, Debug)]
pub struct OrderListing {
	/// Provenance of the rows.
	pub source: OrderSource,
	/// Orders, most recent purchase first.
	pub orders: Vec<Order>,
}

impl Bridge {
	/// Returns the seller's recent orders, consulting the cache before the marketplace.
	///
	/// Cache rows are served as-is while the newest of them is younger than the configured
	/// TTL. Otherwise the marketplace is queried over the lookback window with a live access
	/// token; a single mid-request `Unauthorized` buys one forced refresh and one retry, after
	/// which the rejection is terminal. A fetch that returns nothing falls back to whatever
	/// stale rows the cache still holds rather than blanking the dashboard.
	pub async fn get_orders(&self, seller_id: &SellerId) -> Result<OrderListing> {
		let span = tracing::info_span!("bridge.flow", flow = "orders", seller = %seller_id);

		async move {
			let now = OffsetDateTime::now_utc();
			let cached = self.orders.query_recent(seller_id, QUERY_LIMIT).await?;

			if !cached.is_empty() && cache_is_fresh(&cached, now, self.config.cache_ttl) {
				tracing::debug!(count = cached.len(), "serving orders from cache");

				return Ok(OrderListing { source: OrderSource::Cache, orders: cached });
			}

			let (credential, refreshed_once) = self.live_credential(seller_id, now).await?;
			let created_after = now - self.config.lookback;
			let fetched =
				self.fetch_with_retry(seller_id, credential, created_after, refreshed_once).await?;

			if fetched.is_empty() {
				if !cached.is_empty() {
					tracing::debug!(
						count = cached.len(),
						"remote returned nothing, serving stale cache",
					);

					return Ok(OrderListing { source: OrderSource::Cache, orders: cached });
				}

				return Ok(OrderListing { source: OrderSource::Remote, orders: Vec::new() });
			}

			self.orders.upsert_many(fetched).await?;

			let orders = self.orders.query_recent(seller_id, QUERY_LIMIT).await?;

			tracing::info!(count = orders.len(), "refreshed order cache from marketplace");

			Ok(OrderListing { source: OrderSource::Remote, orders })
		}
		.instrument(span)
		.await
	}

	async fn fetch_with_retry(
		&self,
		seller_id: &SellerId,
		credential: Credential,
		created_after: OffsetDateTime,
		refreshed_once: bool,
	) -> Result<Vec<Order>> {
		match self.spapi.fetch_orders(seller_id, &credential.access_token, created_after).await {
			Ok(orders) => Ok(orders),
			Err(ApiError::Unauthorized { message }) if !refreshed_once => {
				tracing::info!(%message, "access token rejected mid-request, refreshing once");

				let refreshed = self.refresh_for_access(&credential).await?;

				self.spapi
					.fetch_orders(seller_id, &refreshed.access_token, created_after)
					.await
					.map_err(|err| match err {
						ApiError::Unauthorized { message } => Error::Unauthorized {
							reason: format!("marketplace rejected a fresh token: {message}"),
						},
						other => other.into(),
					})
			},
			Err(ApiError::Unauthorized { message }) => Err(Error::Unauthorized {
				reason: format!("marketplace rejected a just-refreshed token: {message}"),
			}),
			Err(other) => Err(other.into()),
		}
	}
}

fn cache_is_fresh(cached: &[Order], now: OffsetDateTime, ttl: Duration) -> bool {
	cached.iter().map(|order| order.fetched_at).max().is_some_and(|newest| now - newest < ttl)
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros::datetime;
	// self
	use super::*;

	fn order(order_id: &str, fetched_at: OffsetDateTime) -> Order {
		Order {
			order_id: order_id.into(),
			seller_id: SellerId::new("S1").expect("Seller fixture should be valid."),
			status: "Shipped".into(),
			total: Decimal::ZERO,
			currency: "USD".into(),
			purchase_date: fetched_at,
			fetched_at,
		}
	}

	#[test]
	fn freshness_follows_the_newest_row() {
		let now = datetime!(2024-06-01 12:00 UTC);
		let ttl = Duration::minutes(30);
		let stale = vec![order("X1", now - Duration::hours(2))];
		let mixed = vec![order("X1", now - Duration::hours(2)), order("X2", now - Duration::minutes(5))];

		assert!(!cache_is_fresh(&stale, now, ttl));
		assert!(cache_is_fresh(&mixed, now, ttl));
		assert!(!cache_is_fresh(&[], now, ttl));
	}
}
