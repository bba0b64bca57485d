//! Postgres-backed credential store and order cache sharing one connection pool.

// crates.io
use sqlx::PgPool;
// self
use crate::{
	_prelude::*,
	auth::{Credential, SellerId, TokenSecret},
	order::Order,
	store::{CredentialStore, OrderCache, StoreError, StoreFuture},
};

/// Postgres backend implementing both storage contracts over an injected [`PgPool`].
///
/// Connections are acquired per operation and released with the future, so writes for
/// distinct sellers never serialize behind one another.
#[derive(Clone, Debug)]
pub struct PgStore {
	pool: PgPool,
}
impl PgStore {
	/// Wraps an existing connection pool.
	pub fn new(pool: PgPool) -> Self {
		Self { pool }
	}

	/// Returns the underlying pool, e.g. for health checks.
	pub fn pool(&self) -> &PgPool {
		&self.pool
	}
}

#[derive(sqlx::FromRow)]
struct CredentialRow {
	seller_id: String,
	access_token: String,
	refresh_token: String,
	issued_at: OffsetDateTime,
	expires_at: OffsetDateTime,
}
impl TryFrom<CredentialRow> for Credential {
	type Error = StoreError;

	fn try_from(row: CredentialRow) -> Result<Self, Self::Error> {
		let seller_id = SellerId::new(&row.seller_id)
			.map_err(|e| StoreError::Serialization { message: e.to_string() })?;

		Ok(Credential {
			seller_id,
			access_token: TokenSecret::new(row.access_token),
			refresh_token: TokenSecret::new(row.refresh_token),
			issued_at: row.issued_at,
			expires_at: row.expires_at,
		})
	}
}

#[derive(sqlx::FromRow)]
struct OrderRow {
	order_id: String,
	seller_id: String,
	status: String,
	total: Decimal,
	currency: String,
	purchase_date: OffsetDateTime,
	fetched_at: OffsetDateTime,
}
impl TryFrom<OrderRow> for Order {
	type Error = StoreError;

	fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
		let seller_id = SellerId::new(&row.seller_id)
			.map_err(|e| StoreError::Serialization { message: e.to_string() })?;

		Ok(Order {
			order_id: row.order_id,
			seller_id,
			status: row.status,
			total: row.total,
			currency: row.currency,
			purchase_date: row.purchase_date,
			fetched_at: row.fetched_at,
		})
	}
}

impl CredentialStore for PgStore {
	fn upsert(&self, credential: Credential) -> StoreFuture<'_, ()> {
		let pool = self.pool.clone();

		Box::pin(async move {
			sqlx::query(
				"INSERT INTO credentials (seller_id, access_token, refresh_token, issued_at, expires_at) \
				 VALUES ($1, $2, $3, $4, $5) \
				 ON CONFLICT (seller_id) DO UPDATE SET \
				 access_token = EXCLUDED.access_token, \
				 refresh_token = EXCLUDED.refresh_token, \
				 issued_at = EXCLUDED.issued_at, \
				 expires_at = EXCLUDED.expires_at",
			)
			.bind(credential.seller_id.as_ref())
			.bind(credential.access_token.expose())
			.bind(credential.refresh_token.expose())
			.bind(credential.issued_at)
			.bind(credential.expires_at)
			.execute(&pool)
			.await
			.map_err(StoreError::from)?;

			Ok(())
		})
	}

	fn get<'a>(&'a self, seller_id: &'a SellerId) -> StoreFuture<'a, Option<Credential>> {
		let pool = self.pool.clone();

		Box::pin(async move {
			let row = sqlx::query_as::<_, CredentialRow>(
				"SELECT seller_id, access_token, refresh_token, issued_at, expires_at \
				 FROM credentials WHERE seller_id = $1",
			)
			.bind(seller_id.as_ref())
			.fetch_optional(&pool)
			.await
			.map_err(StoreError::from)?;

			row.map(Credential::try_from).transpose()
		})
	}
}
impl OrderCache for PgStore {
	fn upsert_many(&self, orders: Vec<Order>) -> StoreFuture<'_, ()> {
		let pool = self.pool.clone();

		Box::pin(async move {
			// One transaction for the whole batch; conflicts resolve per row.
			let mut tx = pool.begin().await.map_err(StoreError::from)?;

			for order in &orders {
				sqlx::query(
					"INSERT INTO orders (order_id, seller_id, status, total, currency, purchase_date, fetched_at) \
					 VALUES ($1, $2, $3, $4, $5, $6, $7) \
					 ON CONFLICT (order_id) DO UPDATE SET \
					 seller_id = EXCLUDED.seller_id, \
					 status = EXCLUDED.status, \
					 total = EXCLUDED.total, \
					 currency = EXCLUDED.currency, \
					 purchase_date = EXCLUDED.purchase_date, \
					 fetched_at = EXCLUDED.fetched_at",
				)
				.bind(&order.order_id)
				.bind(order.seller_id.as_ref())
				.bind(&order.status)
				.bind(order.total)
				.bind(&order.currency)
				.bind(order.purchase_date)
				.bind(order.fetched_at)
				.execute(&mut *tx)
				.await
				.map_err(StoreError::from)?;
			}

			tx.commit().await.map_err(StoreError::from)?;

			Ok(())
		})
	}

	fn query_recent<'a>(&'a self, seller_id: &'a SellerId, limit: u32) -> StoreFuture<'a, Vec<Order>> {
		let pool = self.pool.clone();

		Box::pin(async move {
			let rows = sqlx::query_as::<_, OrderRow>(
				"SELECT order_id, seller_id, status, total, currency, purchase_date, fetched_at \
				 FROM orders WHERE seller_id = $1 \
				 ORDER BY purchase_date DESC, order_id DESC LIMIT $2",
			)
			.bind(seller_id.as_ref())
			.bind(i64::from(limit))
			.fetch_all(&pool)
			.await
			.map_err(StoreError::from)?;

			rows.into_iter().map(Order::try_from).collect()
		})
	}
}
