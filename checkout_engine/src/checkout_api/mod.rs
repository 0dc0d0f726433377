//! The checkout engine's public API.
//!
//! * [`order_flow_api::OrderFlowApi`] creates orders and reserves their stock.
//! * [`payment_session_api::PaymentSessionApi`] opens or reuses a provider payment session for an order.
//! * [`ipn_api::IpnApi`] reconciles provider callbacks.
//! * [`maintenance_api::MaintenanceApi`] runs the periodic restock and payment-expiry sweeps.
//!
//! The APIs are generic over any backend implementing [`crate::traits::CheckoutDatabase`].
pub mod errors;
pub mod ipn_api;
pub mod maintenance_api;
pub mod order_flow_api;
pub mod order_objects;
pub mod payment_objects;
pub mod payment_session_api;
pub mod reconciliation;
pub mod session_plan;
