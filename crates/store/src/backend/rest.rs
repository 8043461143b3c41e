//! REST client for the hosted backend's `orders` table.
//!
//! The backend exposes tables under `/rest/v1/<table>` with row filters in
//! the query string (`user_id=eq.<id>`). Every request carries the project's
//! anon key as `apikey`; the bearer token is the customer's access token when
//! one is configured, else the anon key.

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use watchshop_core::{CustomerId, NewOrder, OrderRecord};

use super::{BackendError, OrderBackend};
use crate::config::BackendConfig;

/// Client for order rows.
#[derive(Clone)]
pub struct RestOrderBackend {
    inner: Arc<RestOrderBackendInner>,
}

struct RestOrderBackendInner {
    client: reqwest::Client,
    orders_url: Url,
    anon_key: SecretString,
    access_token: Option<SecretString>,
}

impl RestOrderBackend {
    /// Create a client from backend configuration.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::InvalidUrl` if the orders endpoint cannot be
    /// derived from the base URL.
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let orders_url = config.base_url.join("rest/v1/orders")?;
        Ok(Self {
            inner: Arc::new(RestOrderBackendInner {
                client: reqwest::Client::new(),
                orders_url,
                anon_key: config.anon_key.clone(),
                access_token: config.access_token.clone(),
            }),
        })
    }

    /// Endpoint for the orders table.
    #[must_use]
    pub fn orders_url(&self) -> &Url {
        &self.inner.orders_url
    }

    fn bearer(&self) -> &str {
        self.inner
            .access_token
            .as_ref()
            .unwrap_or(&self.inner.anon_key)
            .expose_secret()
    }

    fn request(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
        self.inner
            .client
            .request(method, url)
            .header("apikey", self.inner.anon_key.expose_secret())
            .bearer_auth(self.bearer())
    }

    /// Check the status and decode the body.
    async fn read_json<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, BackendError> {
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(BackendError::RateLimited(retry_after));
        }

        let body = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %body.chars().take(500).collect::<String>(),
                "Order backend returned non-success status"
            );
            return Err(BackendError::Status {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse order backend response"
            );
            BackendError::Parse(e)
        })
    }
}

impl OrderBackend for RestOrderBackend {
    #[instrument(skip(self, order), fields(user_id = %order.user_id, total = %order.total))]
    async fn create_order(&self, order: &NewOrder) -> Result<OrderRecord, BackendError> {
        let response = self
            .request(reqwest::Method::POST, self.inner.orders_url.clone())
            .header("Prefer", "return=representation")
            .json(&[order])
            .send()
            .await?;

        let rows: Vec<OrderRecord> = Self::read_json(response).await?;
        let created = rows.into_iter().next().ok_or(BackendError::EmptyResponse)?;
        debug!(order_id = %created.id, "Order created");
        Ok(created)
    }

    #[instrument(skip(self))]
    async fn orders_for(&self, customer: CustomerId) -> Result<Vec<OrderRecord>, BackendError> {
        let mut url = self.inner.orders_url.clone();
        url.query_pairs_mut()
            .append_pair("select", "*")
            .append_pair("user_id", &format!("eq.{customer}"))
            .append_pair("order", "created_at.desc");

        let response = self.request(reqwest::Method::GET, url).send().await?;
        let orders: Vec<OrderRecord> = Self::read_json(response).await?;
        debug!(count = orders.len(), "Fetched order history");
        Ok(orders)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn config(base: &str) -> BackendConfig {
        BackendConfig {
            base_url: Url::parse(base).unwrap(),
            anon_key: SecretString::from("anon"),
            access_token: None,
        }
    }

    #[test]
    fn test_orders_url_from_base() {
        let backend = RestOrderBackend::new(&config("https://project.backend.example/")).unwrap();
        assert_eq!(
            backend.orders_url().as_str(),
            "https://project.backend.example/rest/v1/orders"
        );
    }

    #[test]
    fn test_bearer_falls_back_to_anon_key() {
        let backend = RestOrderBackend::new(&config("https://project.backend.example/")).unwrap();
        assert_eq!(backend.bearer(), "anon");

        let mut with_token = config("https://project.backend.example/");
        with_token.access_token = Some(SecretString::from("user-token"));
        let backend = RestOrderBackend::new(&with_token).unwrap();
        assert_eq!(backend.bearer(), "user-token");
    }
}
