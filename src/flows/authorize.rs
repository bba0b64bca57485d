//! Seller authorization: consent URL construction, anti-forgery state, and the code exchange.

// crates.io
use rand::{Rng, distr::Alphanumeric};
use tracing::Instrument;
// self
use crate::{
	_prelude::*,
	auth::{Credential, SellerId},
	error::AuthError,
	flows::Bridge,
};

const STATE_LEN: usize = 32;
const STATE_TTL: Duration = Duration::minutes(10);

/// Consent handshake metadata returned by [`Bridge::start_authorization`].
#[derive(Clone, Debug)]
pub struct AuthorizationStart {
	/// Fully-formed consent URL the seller should be redirected to.
	pub authorize_url: Url,
	/// Opaque state value that must round-trip via the callback.
	pub state: String,
}

impl Bridge {
	/// Builds the seller-consent URL and registers a fresh anti-forgery state token.
	pub fn start_authorization(&self, seller_id: &SellerId) -> AuthorizationStart {
		let state = random_state();
		let mut authorize_url = self.config.consent_endpoint.clone();

		authorize_url
			.query_pairs_mut()
			.append_pair("application_id", &self.config.application_id)
			.append_pair("state", &state)
			.append_pair("redirect_uri", self.config.redirect_uri.as_str());

		let now = OffsetDateTime::now_utc();
		let mut pending = self.pending_states_mut();

		pending.retain(|_, issued| now - *issued < STATE_TTL);
		pending.insert(state.clone(), now);
		drop(pending);
		tracing::info!(seller = %seller_id, "issued authorization state token");

		AuthorizationStart { authorize_url, state }
	}

	/// Validates and consumes a state token returned by the consent redirect.
	pub fn validate_state(&self, state: &str) -> Result<()> {
		let issued = self.pending_states_mut().remove(state);

		match issued {
			Some(issued) if OffsetDateTime::now_utc() - issued < STATE_TTL => Ok(()),
			_ => Err(AuthError::ExchangeRejected {
				message: "authorization state mismatch".into(),
				status: None,
			}
			.into()),
		}
	}

	/// Exchanges the callback code and persists the seller's first credential.
	///
	/// A rejected exchange leaves the store untouched; the credential only lands once the
	/// token endpoint handed back both secrets.
	pub async fn complete_authorization(
		&self,
		seller_id: &SellerId,
		code: &str,
	) -> Result<Credential> {
		let span = tracing::info_span!("bridge.flow", flow = "authorize", seller = %seller_id);

		async move {
			let grant = self.lwa.exchange_code(code, &self.config.redirect_uri).await?;
			let refresh_token = grant.refresh_token.ok_or(AuthError::ExchangeRejected {
				message: "response did not include a refresh_token".into(),
				status: None,
			})?;
			let credential = Credential::issue(
				seller_id.clone(),
				grant.access_token,
				refresh_token,
				OffsetDateTime::now_utc(),
				grant.expires_in,
			);

			self.credentials.upsert(credential.clone()).await?;
			tracing::info!(expires_at = %credential.expires_at, "stored initial credential");

			Ok(credential)
		}
		.instrument(span)
		.await
	}

	fn pending_states_mut(&self) -> parking_lot::MutexGuard<'_, HashMap<String, OffsetDateTime>> {
		self.pending_states.lock()
	}
}

fn random_state() -> String {
	rand::rng().sample_iter(Alphanumeric).take(STATE_LEN).map(char::from).collect()
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn state_tokens_are_alphanumeric_and_unique() {
		let a = random_state();
		let b = random_state();

		assert_eq!(a.len(), STATE_LEN);
		assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
		assert_ne!(a, b);
	}
}
