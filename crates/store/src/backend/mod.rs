//! Order backend.
//!
//! Orders are created in the backend-as-a-service's `orders` table. The
//! store only needs two calls: create an order at checkout and list a
//! customer's orders for the history view.
//!
//! # Implementations
//!
//! - [`RestOrderBackend`] - REST client for the hosted backend

mod rest;

use std::future::Future;

use thiserror::Error;
use watchshop_core::{CustomerId, NewOrder, OrderRecord};

pub use rest::RestOrderBackend;

/// Errors that can occur when talking to the order backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("Backend returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Rate limited by the backend.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The configured base URL cannot address the orders endpoint.
    #[error("Invalid backend URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// A create call returned no row.
    #[error("Backend returned no order")]
    EmptyResponse,
}

/// Remote order operations used by checkout and order history.
pub trait OrderBackend: Send + Sync {
    /// Insert a new order and return the stored row.
    fn create_order(
        &self,
        order: &NewOrder,
    ) -> impl Future<Output = Result<OrderRecord, BackendError>> + Send;

    /// Orders placed by `customer`, newest first.
    fn orders_for(
        &self,
        customer: CustomerId,
    ) -> impl Future<Output = Result<Vec<OrderRecord>, BackendError>> + Send;
}
