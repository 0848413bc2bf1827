//! Value types shared by the reconciliation engine and server.
mod money;

pub mod helpers;
pub mod op;
mod secret;

pub use money::{Money, MoneyConversionError, DEFAULT_SETTLEMENT_CURRENCY};
pub use secret::SecretUrl;
