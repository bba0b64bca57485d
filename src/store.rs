//! Storage contracts and built-in backends for credentials and cached orders.

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

// self
use crate::{_prelude::*, auth::Credential, auth::SellerId, order::Order};

/// Boxed future returned by storage contract methods.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Persistence contract for seller OAuth credentials.
///
/// Writes are idempotent upserts keyed by seller identifier; concurrent writes for the same
/// seller resolve as last-write-wins, and writes for distinct sellers never block one another.
pub trait CredentialStore
where
	Self: Send + Sync,
{
	/// Inserts or replaces the credential row for the seller atomically.
	fn upsert(&self, credential: Credential) -> StoreFuture<'_, ()>;

	/// Point lookup by seller identifier.
	fn get<'a>(&'a self, seller_id: &'a SellerId) -> StoreFuture<'a, Option<Credential>>;
}

/// Persistence contract for the read-through order cache.
///
/// Each [`Order`] carries its owning seller, so batches are keyed purely by marketplace order
/// identifier. Re-ingesting an identical batch is a no-op, which makes overlapping remote poll
/// windows safe.
pub trait OrderCache
where
	Self: Send + Sync,
{
	/// Upserts a batch of orders inside one transaction, resolving conflicts per row.
	fn upsert_many(&self, orders: Vec<Order>) -> StoreFuture<'_, ()>;

	/// Returns the seller's orders ordered by purchase timestamp descending, capped at `limit`.
	fn query_recent<'a>(
		&'a self,
		seller_id: &'a SellerId,
		limit: u32,
	) -> StoreFuture<'a, Vec<Order>>;
}

/// Error type produced by [`CredentialStore`] and [`OrderCache`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Row decoding failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}
impl From<sqlx::Error> for StoreError {
	fn from(e: sqlx::Error) -> Self {
		match e {
			sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) =>
				Self::Serialization { message: e.to_string() },
			other => Self::Backend { message: other.to_string() },
		}
	}
}
