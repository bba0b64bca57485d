//! Order retrieval: wire schema, tolerant per-row decoding, and the fetch call itself.

// crates.io
use time::format_description::well_known::Rfc3339;
// self
use crate::{
	_prelude::*,
	auth::{SellerId, TokenSecret},
	client::{self, ErrorEntry, SpApiClient},
	error::ApiError,
	order::Order,
};

const ORDERS_PATH: &str = "/orders/v0/orders";

/// Fallback used when the remote omits a field the dashboard renders.
const UNKNOWN: &str = "N/A";

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OrdersEnvelope {
	Failure {
		errors: Vec<ErrorEntry>,
	},
	Success {
		payload: OrdersPayload,
	},
}

#[derive(Debug, Deserialize)]
struct OrdersPayload {
	// Rows are decoded individually so one malformed order never aborts the batch.
	#[serde(rename = "Orders", default)]
	orders: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct WireOrder {
	amazon_order_id: String,
	#[serde(default)]
	order_status: Option<String>,
	#[serde(default)]
	order_total: Option<WireMoney>,
	#[serde(with = "time::serde::rfc3339")]
	purchase_date: OffsetDateTime,
}

#[derive(Debug, Deserialize)]
struct WireMoney {
	#[serde(rename = "Amount")]
	amount: Decimal,
	#[serde(rename = "CurrencyCode")]
	currency_code: String,
}

impl SpApiClient {
	/// Issues one paginated order query for the configured marketplace, returning every order
	/// created after `created_after`. An empty list is a valid, non-error result.
	pub async fn fetch_orders(
		&self,
		seller_id: &SellerId,
		access_token: &TokenSecret,
		created_after: OffsetDateTime,
	) -> Result<Vec<Order>, ApiError> {
		let created_after = created_after.format(&Rfc3339).map_err(|e| ApiError::Transient {
			message: format!("could not format CreatedAfter: {e}"),
			status: None,
		})?;
		let mut url = self.join(ORDERS_PATH)?;

		url.query_pairs_mut()
			.append_pair("MarketplaceIds", self.marketplace_id())
			.append_pair("CreatedAfter", &created_after);

		let (status, body) = self.execute(self.get(url, access_token)).await?;

		if !status.is_success() {
			return Err(client::classify_failure(status, &body));
		}

		let envelope: OrdersEnvelope = client::decode(&body, Some(status.as_u16()))?;
		let payload = match envelope {
			OrdersEnvelope::Failure { errors } => return Err(client::classify_entries(&errors)),
			OrdersEnvelope::Success { payload } => payload,
		};

		Ok(collect_orders(seller_id, payload.orders, OffsetDateTime::now_utc()))
	}
}

/// Decodes raw order rows, skipping (and logging) any row that does not match the schema.
fn collect_orders(
	seller_id: &SellerId,
	rows: Vec<serde_json::Value>,
	fetched_at: OffsetDateTime,
) -> Vec<Order> {
	let mut orders = Vec::with_capacity(rows.len());

	for row in rows {
		match serde_path_to_error::deserialize::<_, WireOrder>(row) {
			Ok(wire) => orders.push(into_order(seller_id, wire, fetched_at)),
			Err(err) => {
				tracing::warn!(
					seller = %seller_id,
					path = %err.path(),
					error = %err,
					"skipping order row that does not match the expected schema",
				);
			},
		}
	}

	orders
}

fn into_order(seller_id: &SellerId, wire: WireOrder, fetched_at: OffsetDateTime) -> Order {
	let (total, currency) = match wire.order_total {
		Some(money) => (money.amount, money.currency_code),
		None => (Decimal::ZERO, UNKNOWN.into()),
	};

	Order {
		order_id: wire.amazon_order_id,
		seller_id: seller_id.clone(),
		status: wire.order_status.unwrap_or_else(|| UNKNOWN.into()),
		total,
		currency,
		purchase_date: wire.purchase_date,
		fetched_at,
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	use time::macros::datetime;
	// self
	use super::*;

	fn seller() -> SellerId {
		SellerId::new("S1").expect("Seller fixture should be valid.")
	}

	#[test]
	fn rows_decode_with_money_and_status() {
		let rows = vec![json!({
			"AmazonOrderId": "X1",
			"OrderStatus": "Shipped",
			"OrderTotal": { "Amount": "19.99", "CurrencyCode": "USD" },
			"PurchaseDate": "2024-01-01T00:00:00Z",
		})];
		let fetched_at = datetime!(2024-02-01 00:00 UTC);
		let orders = collect_orders(&seller(), rows, fetched_at);

		assert_eq!(orders.len(), 1);
		assert_eq!(orders[0].order_id, "X1");
		assert_eq!(orders[0].status, "Shipped");
		assert_eq!(orders[0].total, Decimal::new(1999, 2));
		assert_eq!(orders[0].currency, "USD");
		assert_eq!(orders[0].purchase_date, datetime!(2024-01-01 00:00 UTC));
		assert_eq!(orders[0].fetched_at, fetched_at);
	}

	#[test]
	fn malformed_rows_are_skipped_not_fatal() {
		let rows = vec![
			json!({ "AmazonOrderId": "X1", "PurchaseDate": "2024-01-01T00:00:00Z" }),
			json!({ "OrderStatus": "Shipped" }),
			json!({ "AmazonOrderId": "X2", "PurchaseDate": "not a date" }),
		];
		let orders = collect_orders(&seller(), rows, OffsetDateTime::now_utc());

		assert_eq!(orders.len(), 1);
		assert_eq!(orders[0].order_id, "X1");
	}

	#[test]
	fn missing_money_defaults_stay_renderable() {
		let rows = vec![json!({
			"AmazonOrderId": "X3",
			"PurchaseDate": "2024-03-05T10:30:00Z",
		})];
		let orders = collect_orders(&seller(), rows, OffsetDateTime::now_utc());

		assert_eq!(orders[0].total, Decimal::ZERO);
		assert_eq!(orders[0].currency, UNKNOWN);
		assert_eq!(orders[0].status, UNKNOWN);
	}
}
