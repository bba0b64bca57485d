//! Denormalized marketplace order records and their dashboard projection.

// self
use crate::{_prelude::*, auth::SellerId};

/// Denormalized marketplace order as persisted by the order cache.
///
/// Unique on `order_id`; re-ingestion of the same identifier updates the row in place.
/// `status` is an open set defined by the remote API and is treated as an opaque string.
#[derive(Clone, Debug, PartialEq)]
pub struct Order {
	/// Marketplace-assigned order identifier; the unique key for the row.
	pub order_id: String,
	/// Owning seller identifier (soft reference to the credential row).
	pub seller_id: SellerId,
	/// Remote order status, verbatim.
	pub status: String,
	/// Order total amount.
	pub total: Decimal,
	/// ISO 4217 currency code tagging the total.
	pub currency: String,
	/// Instant the order was placed.
	pub purchase_date: OffsetDateTime,
	/// Instant this row was last seen in a remote response.
	pub fetched_at: OffsetDateTime,
}

/// Order projection returned by the dashboard endpoints.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderSummary {
	/// Marketplace order identifier.
	pub order_id: String,
	/// Remote order status, verbatim.
	pub status: String,
	/// Order total amount, rendered as a JSON number.
	#[serde(with = "rust_decimal::serde::float")]
	pub total: Decimal,
	/// ISO 4217 currency code.
	pub currency: String,
	/// Purchase instant in RFC 3339.
	#[serde(with = "time::serde::rfc3339")]
	pub purchase_date: OffsetDateTime,
}
impl From<&Order> for OrderSummary {
	fn from(order: &Order) -> Self {
		Self {
			order_id: order.order_id.clone(),
			status: order.status.clone(),
			total: order.total,
			currency: order.currency.clone(),
			purchase_date: order.purchase_date,
		}
	}
}
