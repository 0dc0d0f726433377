use thiserror::Error;

use crate::{db_types::ProductId, traits::CheckoutDbError};

/// Broad classes of failure, used by callers to decide how to report an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request itself is malformed. Nothing was changed.
    Validation,
    /// The caller may not touch the address or order it named. Nothing was changed.
    Authorization,
    NotFound,
    /// The request is well-formed but conflicts with current state. Any partial work was rolled back.
    Conflict,
    Internal,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CheckoutApiError {
    #[error("Invalid order request. {0}")]
    Validation(String),
    #[error("Address {0} does not exist")]
    AddressNotFound(i64),
    #[error("Address {0} does not belong to the requesting user")]
    AddressNotOwned(i64),
    #[error("These products do not exist: {0:?}")]
    ProductsNotFound(Vec<ProductId>),
    #[error("Product {product_id} is priced in {found}, but orders are placed in {expected}")]
    ProductCurrencyMismatch { product_id: ProductId, expected: String, found: String },
    #[error("Could not price product {product_id}. {reason}")]
    PricingError { product_id: ProductId, reason: String },
    #[error(transparent)]
    Storage(#[from] CheckoutDbError),
}

impl CheckoutApiError {
    pub fn kind(&self) -> ErrorKind {
        use CheckoutDbError::*;
        match self {
            CheckoutApiError::Validation(_) => ErrorKind::Validation,
            CheckoutApiError::AddressNotOwned(_) => ErrorKind::Authorization,
            CheckoutApiError::AddressNotFound(_) | CheckoutApiError::ProductsNotFound(_) => ErrorKind::NotFound,
            CheckoutApiError::ProductCurrencyMismatch { .. } => ErrorKind::Conflict,
            CheckoutApiError::PricingError { .. } => ErrorKind::Internal,
            CheckoutApiError::Storage(e) => match e {
                InvalidQuantity(_) => ErrorKind::Validation,
                NotOrderOwner(_) => ErrorKind::Authorization,
                OrderNotFound(_) | InventoryRecordNotFound(_) => ErrorKind::NotFound,
                InsufficientStock { .. } |
                OrderNotPayable { .. } |
                ReservationExpired(_) |
                OrderAlreadyPaid(_) |
                CurrencyMismatch { .. } |
                NonPositiveAmount(_) |
                PaymentAlreadyExists(_) |
                PaymentVersionConflict(_) |
                PaymentStatusUpdateError(_) => ErrorKind::Conflict,
                DatabaseError(_) => ErrorKind::Internal,
            },
        }
    }
}
