//! #  Storage contracts for the checkout engine.
//!
//! This module defines the behaviour a storage *backend* must expose so that the checkout APIs can run on top of it.
//!
//! * [`InventoryManagement`] is the inventory ledger: atomic conditional decrement and unconditional release.
//! * [`OrderManagement`] and [`PaymentManagement`] are read access to the order and payment stores.
//! * [`CatalogManagement`] and [`AddressBook`] are the views of collaborating services that checkout depends on.
//! * [`CheckoutDatabase`] is the highest level of behaviour. Each of its methods is one atomic unit of work (a single
//!   database transaction): order creation with stock reservation, payment session reuse, provider callback
//!   reconciliation and the maintenance sweeps.
mod catalog;
mod checkout_database;
mod data_objects;
mod inventory_management;
mod order_management;
mod payment_management;

pub use catalog::{AddressBook, CatalogManagement};
pub use checkout_database::{CheckoutDatabase, CheckoutDbError};
pub use data_objects::{
    NotificationOutcome,
    PaymentNotification,
    PaymentSessionRecord,
    PaymentSessionRequest,
    RestockCursor,
    RestockOutcome,
    RestockSkipReason,
};
pub use inventory_management::InventoryManagement;
pub use order_management::OrderManagement;
pub use payment_management::PaymentManagement;
