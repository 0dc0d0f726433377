//! Checkout Engine
//!
//! The checkout engine is the transactional core of a storefront checkout. It turns a basket into a priced order
//! backed by reserved stock, hands the customer a signed redirect to a hosted payment page, and reconciles the
//! provider's callbacks with local payment and order state. Two maintenance sweeps close out orders and payments that
//! were never resolved.
//!
//! The library is divided into these sections:
//! 1. Storage contracts ([`mod@traits`]) and the SQLite backend that implements them. You should not need to touch the
//!    database directly. The exception is the data types stored in it, which live in [`mod@db_types`] and are public.
//! 2. The public API ([`mod@checkout_api`]). Each API is generic over any backend implementing
//!    [`traits::CheckoutDatabase`].
//! 3. The payment provider's wire protocol ([`mod@provider`]) and the request signing helpers ([`mod@helpers`]).
//!
//! The engine also emits events when an order is paid or annulled. A simple actor framework ([`mod@events`]) lets
//! you hook into these and perform custom actions.
pub mod checkout_api;
pub mod db_types;
pub mod events;
pub mod helpers;
pub mod provider;
#[cfg(feature = "sqlite")]
mod sqlite;
pub mod traits;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use checkout_api::{
    errors::{CheckoutApiError, ErrorKind},
    ipn_api::IpnApi,
    maintenance_api::MaintenanceApi,
    order_flow_api::OrderFlowApi,
    order_objects,
    payment_objects,
    payment_session_api::PaymentSessionApi,
};
#[cfg(feature = "sqlite")]
pub use sqlite::{db::db_url, SqliteDatabase, DUPLICATE_SUCCESS_CODE};
pub use traits::{CheckoutDatabase, CheckoutDbError, InventoryManagement};
