//! Settlement report retrieval: request, status poll, and document download.

// std
use std::io::Read;
// crates.io
use flate2::read::GzDecoder;
use time::format_description::well_known::Rfc3339;
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	client::{self, SpApiClient},
	error::ApiError,
};

const REPORTS_PATH: &str = "/reports/2021-06-30/reports";
const DOCUMENTS_PATH: &str = "/reports/2021-06-30/documents";
const SETTLEMENT_REPORT_TYPE: &str = "_GET_V2_SETTLEMENT_REPORT_DATA_FLAT_FILE";
const GZIP: &str = "GZIP";

/// Processing state of a requested report.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportStatus {
	/// Remote processing status, verbatim (`IN_QUEUE`, `IN_PROGRESS`, `DONE`, ...).
	pub processing_status: String,
	/// Document identifier, present once processing finished.
	#[serde(default)]
	pub report_document_id: Option<String>,
}
impl ReportStatus {
	/// Returns the document id when the report finished successfully.
	pub fn finished_document(&self) -> Option<&str> {
		(self.processing_status == "DONE").then_some(self.report_document_id.as_deref()).flatten()
	}

	/// Returns `true` when the remote gave up on the report.
	pub fn is_failed(&self) -> bool {
		matches!(self.processing_status.as_str(), "CANCELLED" | "FATAL")
	}
}

/// Handle to a finished report document.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportDocument {
	/// Pre-signed download URL.
	pub url: String,
	/// Compression applied to the document, when any.
	#[serde(default)]
	pub compression_algorithm: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateReportResponse {
	report_id: String,
}

impl SpApiClient {
	/// Requests a settlement flat-file report covering `[start, end]` for the configured
	/// marketplace, returning the report identifier to poll.
	pub async fn request_settlement_report(
		&self,
		access_token: &TokenSecret,
		start: OffsetDateTime,
		end: OffsetDateTime,
	) -> Result<String, ApiError> {
		let window = |instant: OffsetDateTime| {
			instant.format(&Rfc3339).map_err(|e| ApiError::Transient {
				message: format!("could not format report window: {e}"),
				status: None,
			})
		};
		let payload = serde_json::json!({
			"reportType": SETTLEMENT_REPORT_TYPE,
			"dataStartTime": window(start)?,
			"dataEndTime": window(end)?,
			"marketplaceIds": [self.marketplace_id()],
		});
		let url = self.join(REPORTS_PATH)?;
		let (status, body) = self.execute(self.post(url, access_token).json(&payload)).await?;

		if !status.is_success() {
			return Err(client::classify_failure(status, &body));
		}

		let decoded: CreateReportResponse = client::decode(&body, Some(status.as_u16()))?;

		Ok(decoded.report_id)
	}

	/// Checks the processing status of a previously requested report.
	pub async fn report_status(
		&self,
		access_token: &TokenSecret,
		report_id: &str,
	) -> Result<ReportStatus, ApiError> {
		let url = self.join(&format!("{REPORTS_PATH}/{report_id}"))?;
		let (status, body) = self.execute(self.get(url, access_token)).await?;

		if !status.is_success() {
			return Err(client::classify_failure(status, &body));
		}

		client::decode(&body, Some(status.as_u16()))
	}

	/// Resolves a finished report's document handle (pre-signed URL + compression).
	pub async fn report_document(
		&self,
		access_token: &TokenSecret,
		document_id: &str,
	) -> Result<ReportDocument, ApiError> {
		let url = self.join(&format!("{DOCUMENTS_PATH}/{document_id}"))?;
		let (status, body) = self.execute(self.get(url, access_token)).await?;

		if !status.is_success() {
			return Err(client::classify_failure(status, &body));
		}

		client::decode(&body, Some(status.as_u16()))
	}

	/// Downloads the document body, decompressing it when the handle says GZIP.
	pub async fn download_document(&self, document: &ReportDocument) -> Result<String, ApiError> {
		let url = Url::parse(&document.url).map_err(|e| ApiError::Transient {
			message: format!("invalid document URL: {e}"),
			status: None,
		})?;
		let (status, body) = self.execute(self.plain_get(url)).await?;

		if !status.is_success() {
			return Err(client::classify_failure(status, &body));
		}
		if document.compression_algorithm.as_deref() == Some(GZIP) {
			let mut text = String::new();

			GzDecoder::new(body.as_slice()).read_to_string(&mut text).map_err(|e| {
				ApiError::Transient {
					message: format!("could not decompress report document: {e}"),
					status: None,
				}
			})?;

			return Ok(text);
		}

		Ok(String::from_utf8_lossy(&body).into_owned())
	}
}
