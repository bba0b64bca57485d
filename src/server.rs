//! HTTP surface: OAuth kick-off and callback, the order listing (JSON and CSV), and the
//! settlement report endpoint.

// crates.io
use axum::{
	Json, Router,
	extract::{Query, State},
	http::{
		StatusCode,
		header::{CONTENT_DISPOSITION, CONTENT_TYPE},
	},
	response::{IntoResponse, Redirect, Response},
	routing::get,
};
use time::format_description::well_known::Rfc3339;
use tower_http::cors::CorsLayer;
// self
use crate::{
	_prelude::*,
	auth::SellerId,
	error::ApiError,
	flows::{Bridge, SettlementRow},
	order::{Order, OrderSummary},
};

const SELLER_PARAM: &str = "selling_partner_id";
const CSV_HEADER: &str = "order_id,status,total,currency,purchase_date";

/// Builds the bridge's router with every endpoint mounted and permissive CORS applied.
pub fn router(bridge: Arc<Bridge>) -> Router {
	Router::new()
		.route("/start-oauth", get(start_oauth))
		.route("/callback", get(callback))
		.route("/get-orders", get(list_orders))
		.route("/download-orders", get(download_orders))
		.route("/settlement-report", get(settlement_report))
		.layer(CorsLayer::permissive())
		.with_state(bridge)
}

#[derive(Debug, Deserialize)]
struct SellerQuery {
	selling_partner_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CallbackQuery {
	selling_partner_id: Option<String>,
	spapi_oauth_code: Option<String>,
	state: Option<String>,
}

#[derive(Debug, Serialize)]
struct OrdersResponse {
	#[serde(skip_serializing_if = "Option::is_none")]
	message: Option<&'static str>,
	orders: Vec<OrderSummary>,
}

#[derive(Debug, Serialize)]
struct SettlementResponse {
	rows: Vec<SettlementRow>,
}

async fn start_oauth(
	State(bridge): State<Arc<Bridge>>,
	Query(query): Query<SellerQuery>,
) -> Result<Redirect, ApiFailure> {
	let seller_id = parse_seller(query.selling_partner_id)?;
	let start = bridge.start_authorization(&seller_id);

	Ok(Redirect::temporary(start.authorize_url.as_str()))
}

async fn callback(
	State(bridge): State<Arc<Bridge>>,
	Query(query): Query<CallbackQuery>,
) -> Result<Redirect, ApiFailure> {
	let seller_id = parse_seller(query.selling_partner_id)?;
	let code = query
		.spapi_oauth_code
		.filter(|code| !code.is_empty())
		.ok_or(Error::MissingParameter { name: "spapi_oauth_code" })?;

	if let Some(state) = query.state.as_deref() {
		bridge.validate_state(state)?;
	}

	bridge.complete_authorization(&seller_id, &code).await?;

	Ok(Redirect::temporary(bridge.config.dashboard_url.as_str()))
}

async fn list_orders(
	State(bridge): State<Arc<Bridge>>,
	Query(query): Query<SellerQuery>,
) -> Result<Json<OrdersResponse>, ApiFailure> {
	let seller_id = parse_seller(query.selling_partner_id)?;
	let listing = bridge.get_orders(&seller_id).await?;

	Ok(Json(OrdersResponse {
		message: listing.orders.is_empty().then_some("No orders found"),
		orders: listing.orders.iter().map(OrderSummary::from).collect(),
	}))
}

async fn download_orders(
	State(bridge): State<Arc<Bridge>>,
	Query(query): Query<SellerQuery>,
) -> Result<Response, ApiFailure> {
	let seller_id = parse_seller(query.selling_partner_id)?;
	let listing = bridge.get_orders(&seller_id).await?;
	let body = render_csv(&listing.orders)?;

	Ok((
		[
			(CONTENT_TYPE, "text/csv; charset=utf-8"),
			(CONTENT_DISPOSITION, "attachment; filename=\"orders.csv\""),
		],
		body,
	)
		.into_response())
}

async fn settlement_report(
	State(bridge): State<Arc<Bridge>>,
	Query(query): Query<SellerQuery>,
) -> Result<Json<SettlementResponse>, ApiFailure> {
	let seller_id = parse_seller(query.selling_partner_id)?;
	let rows = bridge.fetch_settlement(&seller_id).await?;

	Ok(Json(SettlementResponse { rows }))
}

fn parse_seller(raw: Option<String>) -> Result<SellerId> {
	let raw = raw.filter(|value| !value.is_empty()).ok_or(Error::MissingParameter {
		name: SELLER_PARAM,
	})?;

	SellerId::new(raw)
		.map_err(|e| Error::InvalidParameter { name: SELLER_PARAM, message: e.to_string() })
}

fn render_csv(orders: &[Order]) -> Result<String> {
	let mut body = String::from(CSV_HEADER);

	for order in orders {
		let purchase_date = order.purchase_date.format(&Rfc3339).map_err(|e| {
			ApiError::Transient {
				message: format!("could not format purchase_date: {e}"),
				status: None,
			}
		})?;

		body.push('\n');
		body.push_str(&csv_field(&order.order_id));
		body.push(',');
		body.push_str(&csv_field(&order.status));
		body.push(',');
		body.push_str(&order.total.to_string());
		body.push(',');
		body.push_str(&csv_field(&order.currency));
		body.push(',');
		body.push_str(&purchase_date);
	}

	body.push('\n');

	Ok(body)
}

fn csv_field(raw: &str) -> String {
	if raw.contains([',', '"', '\n', '\r']) {
		format!("\"{}\"", raw.replace('"', "\"\""))
	} else {
		raw.to_owned()
	}
}

/// Request-boundary wrapper mapping [`Error`] onto an HTTP status and a JSON body.
#[derive(Debug)]
struct ApiFailure(Error);
impl From<Error> for ApiFailure {
	fn from(e: Error) -> Self {
		Self(e)
	}
}
impl IntoResponse for ApiFailure {
	fn into_response(self) -> Response {
		let (status, kind) = classify(&self.0);

		if status.is_server_error() {
			tracing::error!(error = %self.0, "request failed");
		} else {
			tracing::warn!(error = %self.0, "request rejected");
		}

		(
			status,
			Json(serde_json::json!({
				"error": kind,
				"details": self.0.to_string(),
			})),
		)
			.into_response()
	}
}

fn classify(error: &Error) -> (StatusCode, &'static str) {
	match error {
		Error::MissingParameter { .. } => (StatusCode::BAD_REQUEST, "missing_parameter"),
		Error::InvalidParameter { .. } => (StatusCode::BAD_REQUEST, "invalid_parameter"),
		Error::Auth(_) => (StatusCode::BAD_REQUEST, "authorization_failed"),
		Error::Unauthorized { .. } => (StatusCode::UNAUTHORIZED, "unauthorized"),
		Error::Api(ApiError::Unauthorized { .. }) => (StatusCode::UNAUTHORIZED, "unauthorized"),
		Error::Api(_) => (StatusCode::BAD_GATEWAY, "marketplace_unavailable"),
		Error::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "storage_failed"),
		Error::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "configuration_invalid"),
	}
}
