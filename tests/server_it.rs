// crates.io
use axum::{
	body::Body,
	http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use httpmock::prelude::*;
use serde_json::{Value, json};
use tower::ServiceExt;
// self
use seller_bridge::{_preludet::*, order::Order, server, store::OrderCache};

async fn body_json(response: axum::response::Response) -> Value {
	let bytes = response
		.into_body()
		.collect()
		.await
		.expect("Response body should be collectable.")
		.to_bytes();

	serde_json::from_slice(&bytes).expect("Response body should be JSON.")
}

fn get(path: &str) -> Request<Body> {
	Request::builder().uri(path).body(Body::empty()).expect("Request should build.")
}

#[tokio::test]
async fn missing_seller_parameter_is_a_bad_request() {
	let server = MockServer::start_async().await;
	let (bridge, _store) = build_test_bridge(test_config(&server.url("")));
	let app = server::router(Arc::new(bridge));
	let response = app.oneshot(get("/get-orders")).await.expect("Router should respond.");

	assert_eq!(response.status(), StatusCode::BAD_REQUEST);

	let body = body_json(response).await;

	assert_eq!(body["error"], json!("missing_parameter"));
	assert!(body["details"].as_str().is_some_and(|d| d.contains("selling_partner_id")));
}

#[tokio::test]
async fn invalid_seller_parameter_is_a_bad_request() {
	let server = MockServer::start_async().await;
	let (bridge, _store) = build_test_bridge(test_config(&server.url("")));
	let app = server::router(Arc::new(bridge));
	let response = app
		.oneshot(get("/get-orders?selling_partner_id=has%20space"))
		.await
		.expect("Router should respond.");

	assert_eq!(response.status(), StatusCode::BAD_REQUEST);
	assert_eq!(body_json(response).await["error"], json!("invalid_parameter"));
}

#[tokio::test]
async fn unknown_seller_is_unauthorized() {
	let server = MockServer::start_async().await;
	let (bridge, _store) = build_test_bridge(test_config(&server.url("")));
	let app = server::router(Arc::new(bridge));
	let response = app
		.oneshot(get("/get-orders?selling_partner_id=seller-1"))
		.await
		.expect("Router should respond.");

	assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
	assert_eq!(body_json(response).await["error"], json!("unauthorized"));
}

#[tokio::test]
async fn cached_orders_come_back_as_json() {
	let server = MockServer::start_async().await;
	let (bridge, store) = build_test_bridge(test_config(&server.url("")));
	let seller = test_seller();

	seed_test_credential(&store, &seller, "access-valid", "refresh-valid", Duration::hours(1))
		.await;

	let now = OffsetDateTime::now_utc();

	store
		.upsert_many(vec![Order {
			order_id: "X1".into(),
			seller_id: seller.clone(),
			status: "Shipped".into(),
			total: Decimal::new(1099, 2),
			currency: "USD".into(),
			purchase_date: now - Duration::days(1),
			fetched_at: now,
		}])
		.await
		.expect("Order seeding should succeed.");

	let app = server::router(Arc::new(bridge));
	let response = app
		.oneshot(get("/get-orders?selling_partner_id=seller-1"))
		.await
		.expect("Router should respond.");

	assert_eq!(response.status(), StatusCode::OK);

	let body = body_json(response).await;

	assert!(body.get("message").is_none());
	assert_eq!(body["orders"][0]["order_id"], json!("X1"));
	assert_eq!(body["orders"][0]["status"], json!("Shipped"));
	assert_eq!(body["orders"][0]["total"], json!(10.99));
	assert_eq!(body["orders"][0]["currency"], json!("USD"));
}

#[tokio::test]
async fn empty_listings_carry_a_message() {
	let server = MockServer::start_async().await;
	let (bridge, store) = build_test_bridge(test_config(&server.url("")));
	let seller = test_seller();

	seed_test_credential(&store, &seller, "access-valid", "refresh-valid", Duration::hours(1))
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/orders/v0/orders");
			then.status(200).json_body(json!({ "payload": { "Orders": [] } }));
		})
		.await;

	let app = server::router(Arc::new(bridge));
	let response = app
		.oneshot(get("/get-orders?selling_partner_id=seller-1"))
		.await
		.expect("Router should respond.");

	assert_eq!(response.status(), StatusCode::OK);

	let body = body_json(response).await;

	assert_eq!(body["message"], json!("No orders found"));
	assert_eq!(body["orders"], json!([]));
}

#[tokio::test]
async fn csv_download_sets_attachment_headers() {
	let server = MockServer::start_async().await;
	let (bridge, store) = build_test_bridge(test_config(&server.url("")));
	let seller = test_seller();

	seed_test_credential(&store, &seller, "access-valid", "refresh-valid", Duration::hours(1))
		.await;

	let now = OffsetDateTime::now_utc();

	store
		.upsert_many(vec![Order {
			order_id: "X1".into(),
			seller_id: seller.clone(),
			status: "Shipped".into(),
			total: Decimal::new(1999, 2),
			currency: "USD".into(),
			purchase_date: now - Duration::days(1),
			fetched_at: now,
		}])
		.await
		.expect("Order seeding should succeed.");

	let app = server::router(Arc::new(bridge));
	let response = app
		.oneshot(get("/download-orders?selling_partner_id=seller-1"))
		.await
		.expect("Router should respond.");

	assert_eq!(response.status(), StatusCode::OK);
	assert_eq!(
		response.headers().get(header::CONTENT_TYPE).map(|v| v.to_str().unwrap_or_default()),
		Some("text/csv; charset=utf-8"),
	);
	assert_eq!(
		response
			.headers()
			.get(header::CONTENT_DISPOSITION)
			.map(|v| v.to_str().unwrap_or_default()),
		Some("attachment; filename=\"orders.csv\""),
	);

	let bytes = response
		.into_body()
		.collect()
		.await
		.expect("Response body should be collectable.")
		.to_bytes();
	let body = String::from_utf8(bytes.to_vec()).expect("CSV body should be UTF-8.");
	let mut lines = body.lines();

	assert_eq!(lines.next(), Some("order_id,status,total,currency,purchase_date"));
	assert!(lines.next().is_some_and(|row| row.starts_with("X1,Shipped,19.99,USD,")));
}

#[tokio::test]
async fn oauth_round_trip_redirects_to_the_dashboard() {
	let server = MockServer::start_async().await;
	let (bridge, _store) = build_test_bridge(test_config(&server.url("")));
	let app = server::router(Arc::new(bridge));
	let start = app
		.clone()
		.oneshot(get("/start-oauth?selling_partner_id=seller-1"))
		.await
		.expect("Router should respond.");

	assert_eq!(start.status(), StatusCode::TEMPORARY_REDIRECT);

	let location = start
		.headers()
		.get(header::LOCATION)
		.and_then(|v| v.to_str().ok())
		.expect("Consent redirect should carry a location header.");
	let consent = Url::parse(location).expect("Consent URL should parse.");

	assert!(consent.path().ends_with("/apps/authorize/consent"));

	let state = consent
		.query_pairs()
		.find(|(key, _)| key == "state")
		.map(|(_, value)| value.into_owned())
		.expect("Consent URL should carry a state token.");

	server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/o2/token");
			then.status(200).json_body(json!({
				"access_token": "access-first",
				"refresh_token": "refresh-first",
				"token_type": "bearer",
				"expires_in": 3600,
			}));
		})
		.await;

	let callback = app
		.oneshot(get(&format!(
			"/callback?selling_partner_id=seller-1&spapi_oauth_code=code-123&state={state}",
		)))
		.await
		.expect("Router should respond.");

	assert_eq!(callback.status(), StatusCode::TEMPORARY_REDIRECT);
	assert_eq!(
		callback.headers().get(header::LOCATION).and_then(|v| v.to_str().ok()),
		Some("https://dashboard.test/"),
	);
}

#[tokio::test]
async fn callback_with_a_forged_state_is_rejected() {
	let server = MockServer::start_async().await;
	let (bridge, _store) = build_test_bridge(test_config(&server.url("")));
	let app = server::router(Arc::new(bridge));
	let response = app
		.oneshot(get("/callback?selling_partner_id=seller-1&spapi_oauth_code=code-123&state=forged"))
		.await
		.expect("Router should respond.");

	assert_eq!(response.status(), StatusCode::BAD_REQUEST);
	assert_eq!(body_json(response).await["error"], json!("authorization_failed"));
}
