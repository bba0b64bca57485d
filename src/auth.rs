//! Seller identity and credential domain types.

pub mod credential;
pub mod id;
pub mod secret;

pub use credential::Credential;
pub use id::{SellerId, SellerIdError};
pub use secret::TokenSecret;
