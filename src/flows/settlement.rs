//! Settlement report retrieval: request a flat-file report, poll until it finishes, download
//! the document, and parse the tab-separated rows. Rows are surfaced, never persisted.

// crates.io
use tracing::Instrument;
// self
use crate::{
	_prelude::*,
	auth::SellerId,
	error::ApiError,
	flows::Bridge,
};

/// One parsed settlement row.
///
/// Only the columns the dashboard renders are kept; amounts that fail to parse surface as
/// `None` rather than dropping the row.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SettlementRow {
	/// Settlement identifier the row belongs to.
	pub settlement_id: String,
	/// Posting timestamp, verbatim from the report.
	pub date_time: String,
	/// Order the row settles, when it is order-scoped.
	pub order_id: String,
	/// Row kind (`Order`, `Refund`, transfer rows, ...).
	#[serde(rename = "type")]
	pub amount_type: String,
	/// Row amount.
	#[serde(with = "rust_decimal::serde::float_option")]
	pub amount: Option<Decimal>,
	/// Settlement total, present on the summary row.
	#[serde(with = "rust_decimal::serde::float_option")]
	pub total_amount: Option<Decimal>,
}

impl Bridge {
	/// Requests a settlement report over the lookback window and returns its parsed rows.
	///
	/// Polls the report status up to the configured limit; a report the remote cancels or
	/// fails, or one that never finishes within the limit, surfaces as a transient API error.
	pub async fn fetch_settlement(&self, seller_id: &SellerId) -> Result<Vec<SettlementRow>> {
		let span = tracing::info_span!("bridge.flow", flow = "settlement", seller = %seller_id);

		async move {
			let now = OffsetDateTime::now_utc();
			let (credential, _) = self.live_credential(seller_id, now).await?;
			let token = &credential.access_token;
			let start = now - self.config.lookback;
			let report_id = self.spapi.request_settlement_report(token, start, now).await?;

			tracing::info!(%report_id, "requested settlement report");

			let mut document_id = None;

			for _ in 0..self.config.report_poll_limit {
				tokio::time::sleep(self.config.report_poll_interval).await;

				let status = self.spapi.report_status(token, &report_id).await?;

				if status.is_failed() {
					return Err(ApiError::Transient {
						message: format!(
							"settlement report {report_id} ended as {}",
							status.processing_status,
						),
						status: None,
					}
					.into());
				}
				if let Some(id) = status.finished_document() {
					document_id = Some(id.to_owned());

					break;
				}
			}

			let document_id = document_id.ok_or_else(|| ApiError::Transient {
				message: format!("settlement report {report_id} did not finish in time"),
				status: None,
			})?;
			let document = self.spapi.report_document(token, &document_id).await?;
			let body = self.spapi.download_document(&document).await?;
			let rows = parse_settlement(&body);

			tracing::info!(count = rows.len(), "parsed settlement report");

			Ok(rows)
		}
		.instrument(span)
		.await
	}
}

/// Parses the tab-separated report body, resolving columns by header name.
///
/// Header names are normalized (lowercased, hyphens folded to underscores) so both naming
/// styles the flat files have shipped with resolve to the same columns. Rows shorter than the
/// header are padded with empty cells rather than skipped.
fn parse_settlement(body: &str) -> Vec<SettlementRow> {
	let mut lines = body.lines();
	let Some(header) = lines.next() else { return Vec::new() };
	let columns: Vec<String> = header.split('\t').map(normalize_column).collect();
	let index = |names: &[&str]| {
		names.iter().find_map(|name| columns.iter().position(|column| column == name))
	};
	let settlement_id = index(&["settlement_id"]);
	let date_time = index(&["date_time", "posted_date"]);
	let order_id = index(&["order_id"]);
	let amount_type = index(&["type", "amount_type", "transaction_type"]);
	let amount = index(&["amount"]);
	let total_amount = index(&["total_amount"]);
	let mut rows = Vec::new();

	for line in lines {
		if line.is_empty() {
			continue;
		}

		let cells: Vec<&str> = line.split('\t').collect();
		let cell = |at: Option<usize>| {
			at.and_then(|at| cells.get(at)).map(|value| value.trim().to_owned()).unwrap_or_default()
		};
		let money = |at: Option<usize>| {
			at.and_then(|at| cells.get(at)).and_then(|value| value.trim().parse::<Decimal>().ok())
		};

		rows.push(SettlementRow {
			settlement_id: cell(settlement_id),
			date_time: cell(date_time),
			order_id: cell(order_id),
			amount_type: cell(amount_type),
			amount: money(amount),
			total_amount: money(total_amount),
		});
	}

	rows
}

fn normalize_column(raw: &str) -> String {
	raw.trim().to_ascii_lowercase().replace('-', "_")
}
