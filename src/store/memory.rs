//! Thread-safe in-memory store implementation for local development and tests.

// self
use crate::{
	_prelude::*,
	auth::{Credential, SellerId},
	order::Order,
	store::{CredentialStore, OrderCache, StoreError, StoreFuture},
};

type CredentialMap = Arc<RwLock<HashMap<SellerId, Credential>>>;
type OrderMap = Arc<RwLock<HashMap<String, Order>>>;

/// In-process backend implementing both storage contracts for tests and demos.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
	credentials: CredentialMap,
	orders: OrderMap,
}
impl MemoryStore {
	fn upsert_now(credentials: CredentialMap, credential: Credential) {
		credentials.write().insert(credential.seller_id.clone(), credential);
	}

	fn get_now(credentials: CredentialMap, seller_id: SellerId) -> Option<Credential> {
		credentials.read().get(&seller_id).cloned()
	}

	fn upsert_many_now(orders: OrderMap, batch: Vec<Order>) {
		let mut guard = orders.write();

		for order in batch {
			guard.insert(order.order_id.clone(), order);
		}
	}

	fn query_recent_now(orders: OrderMap, seller_id: SellerId, limit: u32) -> Vec<Order> {
		let mut rows: Vec<Order> =
			orders.read().values().filter(|order| order.seller_id == seller_id).cloned().collect();

		// Purchase timestamp descending, with order id as a stable tie-break.
		rows.sort_by(|a, b| {
			b.purchase_date.cmp(&a.purchase_date).then_with(|| b.order_id.cmp(&a.order_id))
		});
		rows.truncate(limit as usize);

		rows
	}
}
impl CredentialStore for MemoryStore {
	fn upsert(&self, credential: Credential) -> StoreFuture<'_, ()> {
		let credentials = self.credentials.clone();

		Box::pin(async move {
			Self::upsert_now(credentials, credential);

			Ok(())
		})
	}

	fn get<'a>(&'a self, seller_id: &'a SellerId) -> StoreFuture<'a, Option<Credential>> {
		let credentials = self.credentials.clone();
		let seller_id = seller_id.to_owned();

		Box::pin(async move { Ok(Self::get_now(credentials, seller_id)) })
	}
}
impl OrderCache for MemoryStore {
	fn upsert_many(&self, orders: Vec<Order>) -> StoreFuture<'_, ()> {
		let map = self.orders.clone();

		Box::pin(async move {
			Self::upsert_many_now(map, orders);

			Ok::<_, StoreError>(())
		})
	}

	fn query_recent<'a>(&'a self, seller_id: &'a SellerId, limit: u32) -> StoreFuture<'a, Vec<Order>> {
		let map = self.orders.clone();
		let seller_id = seller_id.to_owned();

		Box::pin(async move { Ok(Self::query_recent_now(map, seller_id, limit)) })
	}
}
