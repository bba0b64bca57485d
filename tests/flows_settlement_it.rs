// std
use std::io::Write;
// crates.io
use flate2::{Compression, write::GzEncoder};
use httpmock::prelude::*;
use serde_json::json;
// self
use seller_bridge::{_preludet::*, error::ApiError};

const REPORT_BODY: &str = "settlement-id\tdate-time\torder-id\ttype\tamount\ttotal-amount\n\
	12345\t2024-01-15T00:00:00Z\t\t\t\t512.34\n\
	12345\t2024-01-10T08:00:00Z\tX1\tOrder\t19.99\t";

#[tokio::test]
async fn settlement_report_round_trips_from_request_to_rows() {
	let server = MockServer::start_async().await;
	let (bridge, store) = build_test_bridge(test_config(&server.url("")));
	let seller = test_seller();

	seed_test_credential(&store, &seller, "access-valid", "refresh-valid", Duration::hours(1))
		.await;

	let create_mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/reports/2021-06-30/reports")
				.header("x-amz-access-token", "access-valid")
				.json_body_includes(
					r#"{"reportType":"_GET_V2_SETTLEMENT_REPORT_DATA_FLAT_FILE","marketplaceIds":["MKTTEST1"]}"#,
				);
			then.status(202).json_body(json!({ "reportId": "R1" }));
		})
		.await;
	let status_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/reports/2021-06-30/reports/R1");
			then.status(200).json_body(json!({
				"processingStatus": "DONE",
				"reportDocumentId": "doc-1",
			}));
		})
		.await;
	let document_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/reports/2021-06-30/documents/doc-1");
			then.status(200).json_body(json!({ "url": server.url("/download/doc-1") }));
		})
		.await;
	let download_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/download/doc-1");
			then.status(200).header("content-type", "text/plain").body(REPORT_BODY);
		})
		.await;
	let rows = bridge.fetch_settlement(&seller).await.expect("Settlement fetch should succeed.");

	create_mock.assert_async().await;
	status_mock.assert_async().await;
	document_mock.assert_async().await;
	download_mock.assert_async().await;

	assert_eq!(rows.len(), 2);
	assert_eq!(rows[0].settlement_id, "12345");
	assert_eq!(rows[0].total_amount, Some(Decimal::new(51234, 2)));
	assert_eq!(rows[1].order_id, "X1");
	assert_eq!(rows[1].amount, Some(Decimal::new(1999, 2)));
}

#[tokio::test]
async fn gzip_compressed_documents_are_decompressed() {
	let server = MockServer::start_async().await;
	let (bridge, store) = build_test_bridge(test_config(&server.url("")));
	let seller = test_seller();

	seed_test_credential(&store, &seller, "access-valid", "refresh-valid", Duration::hours(1))
		.await;

	let mut encoder = GzEncoder::new(Vec::new(), Compression::default());

	encoder.write_all(REPORT_BODY.as_bytes()).expect("Report fixture should compress.");

	let compressed = encoder.finish().expect("Gzip stream should finish.");

	server
		.mock_async(|when, then| {
			when.method(POST).path("/reports/2021-06-30/reports");
			then.status(202).json_body(json!({ "reportId": "R2" }));
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/reports/2021-06-30/reports/R2");
			then.status(200).json_body(json!({
				"processingStatus": "DONE",
				"reportDocumentId": "doc-2",
			}));
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/reports/2021-06-30/documents/doc-2");
			then.status(200).json_body(json!({
				"url": server.url("/download/doc-2"),
				"compressionAlgorithm": "GZIP",
			}));
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/download/doc-2");
			then.status(200).body(compressed.clone());
		})
		.await;

	let rows = bridge.fetch_settlement(&seller).await.expect("Compressed fetch should succeed.");

	assert_eq!(rows.len(), 2);
	assert_eq!(rows[1].amount_type, "Order");
}

#[tokio::test]
async fn cancelled_reports_surface_as_transient_errors() {
	let server = MockServer::start_async().await;
	let (bridge, store) = build_test_bridge(test_config(&server.url("")));
	let seller = test_seller();

	seed_test_credential(&store, &seller, "access-valid", "refresh-valid", Duration::hours(1))
		.await;
	server
		.mock_async(|when, then| {
			when.method(POST).path("/reports/2021-06-30/reports");
			then.status(202).json_body(json!({ "reportId": "R3" }));
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/reports/2021-06-30/reports/R3");
			then.status(200).json_body(json!({ "processingStatus": "FATAL" }));
		})
		.await;

	let err = bridge
		.fetch_settlement(&seller)
		.await
		.expect_err("A fatal report should surface to the caller.");

	assert!(matches!(err, Error::Api(ApiError::Transient { .. })));
	assert!(err.to_string().contains("FATAL"));
}

#[tokio::test]
async fn reports_that_never_finish_exhaust_the_poll_limit() {
	let server = MockServer::start_async().await;
	let (bridge, store) = build_test_bridge(test_config(&server.url("")));
	let seller = test_seller();

	seed_test_credential(&store, &seller, "access-valid", "refresh-valid", Duration::hours(1))
		.await;
	server
		.mock_async(|when, then| {
			when.method(POST).path("/reports/2021-06-30/reports");
			then.status(202).json_body(json!({ "reportId": "R4" }));
		})
		.await;

	let status_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/reports/2021-06-30/reports/R4");
			then.status(200).json_body(json!({ "processingStatus": "IN_PROGRESS" }));
		})
		.await;
	let err = bridge
		.fetch_settlement(&seller)
		.await
		.expect_err("A report stuck in progress should time out.");

	assert!(matches!(err, Error::Api(ApiError::Transient { .. })));
	assert!(err.to_string().contains("did not finish"));

	// The configured poll limit bounds how often the status endpoint is hit.
	status_mock.assert_calls_async(5).await;
}
