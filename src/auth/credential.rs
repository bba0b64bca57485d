//! Stored OAuth credential set for one seller.

// self
use crate::{
	_prelude::*,
	auth::{SellerId, TokenSecret},
};

/// One seller's OAuth credential set as persisted by the credential store.
///
/// At most one live credential exists per seller identifier; every successful exchange or
/// refresh replaces the row via an idempotent upsert. Rows are never deleted by the bridge
/// (revocation is out of scope).
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
	/// Owning seller identifier; the unique key for the row.
	pub seller_id: SellerId,
	/// Short-lived bearer token for marketplace API calls.
	pub access_token: TokenSecret,
	/// Long-lived token used to mint new access tokens without user interaction.
	pub refresh_token: TokenSecret,
	/// Instant the access token was issued.
	pub issued_at: OffsetDateTime,
	/// Instant the access token stops being accepted (issued_at + lifetime).
	pub expires_at: OffsetDateTime,
}
impl Credential {
	/// Builds a credential issued at `issued_at` with the provided access-token lifetime.
	pub fn issue(
		seller_id: SellerId,
		access_token: TokenSecret,
		refresh_token: TokenSecret,
		issued_at: OffsetDateTime,
		lifetime: Duration,
	) -> Self {
		Self { seller_id, access_token, refresh_token, issued_at, expires_at: issued_at + lifetime }
	}

	/// Returns `true` if the access token has expired at the provided instant.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		instant >= self.expires_at
	}

	/// Returns `true` if the access token is expired relative to the current clock.
	pub fn is_expired(&self) -> bool {
		self.is_expired_at(OffsetDateTime::now_utc())
	}
}
impl Debug for Credential {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Credential")
			.field("seller_id", &self.seller_id)
			.field("access_token", &"<redacted>")
			.field("refresh_token", &"<redacted>")
			.field("issued_at", &self.issued_at)
			.field("expires_at", &self.expires_at)
			.finish()
	}
}
