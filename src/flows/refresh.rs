//! Lazy credential refresh.
//!
//! Refresh is triggered on read when the stored access token has expired, or after the
//! marketplace rejects one mid-request; there is no background timer. Rotation policy: when
//! the token endpoint returns a new refresh token it replaces the stored secret, otherwise
//! the long-lived stored secret is written back unchanged.

// crates.io
use tracing::Instrument;
// self
use crate::{
	_prelude::*,
	auth::{Credential, SellerId},
	flows::Bridge,
};

impl Bridge {
	/// Exchanges the credential's refresh token and persists the refreshed credential.
	///
	/// The store is left untouched when the exchange fails.
	pub async fn refresh_credential(&self, current: &Credential) -> Result<Credential> {
		let span =
			tracing::info_span!("bridge.flow", flow = "refresh", seller = %current.seller_id);

		async move {
			let grant = self.lwa.refresh(&current.refresh_token).await?;
			let refresh_token =
				grant.refresh_token.unwrap_or_else(|| current.refresh_token.clone());
			let refreshed = Credential::issue(
				current.seller_id.clone(),
				grant.access_token,
				refresh_token,
				OffsetDateTime::now_utc(),
				grant.expires_in,
			);

			self.credentials.upsert(refreshed.clone()).await?;
			tracing::info!(expires_at = %refreshed.expires_at, "refreshed access token");

			Ok(refreshed)
		}
		.instrument(span)
		.await
	}

	/// Loads the seller's credential, refreshing it when the stored access token has expired.
	///
	/// Returns the live credential plus whether this request already spent its one refresh.
	pub(crate) async fn live_credential(
		&self,
		seller_id: &SellerId,
		now: OffsetDateTime,
	) -> Result<(Credential, bool)> {
		let current = self.credentials.get(seller_id).await?.ok_or_else(|| {
			Error::Unauthorized { reason: format!("no credential on file for seller `{seller_id}`") }
		})?;

		if current.is_expired_at(now) {
			let refreshed = self.refresh_for_access(&current).await?;

			Ok((refreshed, true))
		} else {
			Ok((current, false))
		}
	}

	/// Refresh in service of an API call: exchange failures become a terminal `Unauthorized`,
	/// while storage failures keep their own classification.
	pub(crate) async fn refresh_for_access(&self, current: &Credential) -> Result<Credential> {
		self.refresh_credential(current).await.map_err(|err| match err {
			Error::Storage(inner) => Error::Storage(inner),
			other => Error::Unauthorized { reason: other.to_string() },
		})
	}
}
