//! # Checkout server
//! This crate hosts the HTTP front end of the checkout engine. It is responsible for:
//! * Accepting orders and payment requests from signed-in customers (identified by a header set by the upstream
//!   authentication proxy).
//! * Receiving the payment provider's IPN callbacks and browser redirects.
//! * Running the order restock and payment expiry jobs in the background.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `GET /health`: A health check route that returns a 200 OK response.
//! * `POST /api/orders`: Place an order.
//! * `GET /api/orders/{id}`: Fetch one of your orders.
//! * `POST /api/orders/{id}/payment`: Get the signed payment page redirect for an order.
//! * `GET /payments/ipn`: The provider's payment notification.
//! * `GET /payments/return`: The provider's browser redirect after payment.
pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod helpers;
pub mod routes;
pub mod server;
pub mod workers;

#[cfg(test)]
mod endpoint_tests;
