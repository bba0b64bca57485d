//! Strongly typed seller identifier used as the tenant key throughout the bridge.

// std
use std::{borrow::Borrow, ops::Deref};
// self
use crate::_prelude::*;

const SELLER_ID_MAX_LEN: usize = 128;

/// Error returned when seller identifier validation fails.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum SellerIdError {
	/// The identifier was empty.
	#[error("Seller identifier cannot be empty.")]
	Empty,
	/// The identifier contains whitespace characters.
	#[error("Seller identifier contains whitespace.")]
	ContainsWhitespace,
	/// The identifier exceeded the allowed character count.
	#[error("Seller identifier exceeds {max} characters.")]
	TooLong {
		/// Maximum permitted character count.
		max: usize,
	},
}

/// Unique identifier for a marketplace selling partner account.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SellerId(String);
impl SellerId {
	/// Creates a new identifier after validation.
	pub fn new(value: impl AsRef<str>) -> Result<Self, SellerIdError> {
		let view = value.as_ref();

		validate_view(view)?;

		Ok(Self(view.to_owned()))
	}
}
impl Deref for SellerId {
	type Target = str;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
impl AsRef<str> for SellerId {
	fn as_ref(&self) -> &str {
		&self.0
	}
}
impl From<SellerId> for String {
	fn from(value: SellerId) -> Self {
		value.0
	}
}
impl TryFrom<String> for SellerId {
	type Error = SellerIdError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		validate_view(&value)?;

		Ok(Self(value))
	}
}
impl Borrow<str> for SellerId {
	fn borrow(&self) -> &str {
		&self.0
	}
}
impl Debug for SellerId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "Seller({})", self.0)
	}
}
impl Display for SellerId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}
impl FromStr for SellerId {
	type Err = SellerIdError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::new(s)
	}
}

fn validate_view(view: &str) -> Result<(), SellerIdError> {
	if view.is_empty() {
		return Err(SellerIdError::Empty);
	}
	if view.chars().any(char::is_whitespace) {
		return Err(SellerIdError::ContainsWhitespace);
	}
	if view.len() > SELLER_ID_MAX_LEN {
		return Err(SellerIdError::TooLong { max: SELLER_ID_MAX_LEN });
	}

	Ok(())
}
