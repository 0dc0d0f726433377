//! Value types shared by the checkout engine and the checkout server.
mod money;

pub mod helpers;
pub mod op;
mod secret;

pub use money::{Money, MoneyConversionError, DEFAULT_CURRENCY_SCALE};
pub use secret::Secret;
