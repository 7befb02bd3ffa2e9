//! Backend seam: every network round-trip the dashboard makes goes through
//! [`DispatchBackend`]. [`HttpDispatchBackend`] is the reqwest implementation.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use shared::{
    domain::{Cell, Courier, Order, OrderId, Restaurant, RouteResult},
    error::DashboardError,
    protocol::{AssignmentResponse, CreateOrderRequest, MultiRouteRequest, PointRouteRequest},
};
use url::Url;

#[async_trait]
pub trait DispatchBackend: Send + Sync {
    async fn list_restaurants(&self) -> Result<Vec<Restaurant>, DashboardError>;
    async fn city_layout(&self) -> Result<Vec<Cell>, DashboardError>;
    async fn point_route(&self, request: &PointRouteRequest)
        -> Result<RouteResult, DashboardError>;
    async fn multi_route(&self, request: &MultiRouteRequest)
        -> Result<RouteResult, DashboardError>;
    async fn list_couriers(&self) -> Result<Vec<Courier>, DashboardError>;
    async fn list_orders(&self) -> Result<Vec<Order>, DashboardError>;
    async fn create_order(&self, request: &CreateOrderRequest) -> Result<Order, DashboardError>;
    async fn assign_order(&self, order_id: &OrderId)
        -> Result<AssignmentResponse, DashboardError>;
    async fn step_simulation(&self) -> Result<(), DashboardError>;
}

pub struct HttpDispatchBackend {
    http: Client,
    server_url: String,
}

impl HttpDispatchBackend {
    pub fn new(server_url: &str) -> Result<Self, DashboardError> {
        let parsed = Url::parse(server_url)
            .map_err(|err| DashboardError::validation(format!("invalid server url: {err}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(DashboardError::validation(
                "server url must start with http:// or https://",
            ));
        }

        Ok(Self {
            http: Client::new(),
            server_url: server_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.server_url)
    }
}

#[async_trait]
impl DispatchBackend for HttpDispatchBackend {
    async fn list_restaurants(&self) -> Result<Vec<Restaurant>, DashboardError> {
        fetch_json(self.http.get(self.endpoint("/api/restaurants"))).await
    }

    async fn city_layout(&self) -> Result<Vec<Cell>, DashboardError> {
        fetch_json(self.http.get(self.endpoint("/api/city/layout"))).await
    }

    async fn point_route(
        &self,
        request: &PointRouteRequest,
    ) -> Result<RouteResult, DashboardError> {
        fetch_json(self.http.post(self.endpoint("/api/route")).json(request)).await
    }

    async fn multi_route(
        &self,
        request: &MultiRouteRequest,
    ) -> Result<RouteResult, DashboardError> {
        fetch_json(self.http.post(self.endpoint("/api/route/multi")).json(request)).await
    }

    async fn list_couriers(&self) -> Result<Vec<Courier>, DashboardError> {
        fetch_json(self.http.get(self.endpoint("/api/couriers"))).await
    }

    async fn list_orders(&self) -> Result<Vec<Order>, DashboardError> {
        fetch_json(self.http.get(self.endpoint("/api/orders"))).await
    }

    async fn create_order(&self, request: &CreateOrderRequest) -> Result<Order, DashboardError> {
        fetch_json(self.http.post(self.endpoint("/api/orders")).json(request)).await
    }

    async fn assign_order(
        &self,
        order_id: &OrderId,
    ) -> Result<AssignmentResponse, DashboardError> {
        let path = format!("/api/orders/{}/assign", order_id.as_str());
        fetch_json(self.http.post(self.endpoint(&path))).await
    }

    async fn step_simulation(&self) -> Result<(), DashboardError> {
        fetch_text(self.http.post(self.endpoint("/api/sim/step")))
            .await
            .map(|_| ())
    }
}

async fn fetch_text(request: RequestBuilder) -> Result<String, DashboardError> {
    let response = request.send().await.map_err(network_error)?;
    let status = response.status();
    let body = response.text().await.map_err(network_error)?;
    if !status.is_success() {
        return Err(DashboardError::Http {
            status: status.as_u16(),
            body,
        });
    }
    Ok(body)
}

async fn fetch_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, DashboardError> {
    let body = fetch_text(request).await?;
    decode_payload(&body)
}

/// Converts a raw response body into a typed entity, flagging malformed shapes.
pub fn decode_payload<T: DeserializeOwned>(body: &str) -> Result<T, DashboardError> {
    serde_json::from_str(body).map_err(|err| DashboardError::Decode(err.to_string()))
}

fn network_error(err: reqwest::Error) -> DashboardError {
    DashboardError::Network(err.to_string())
}

#[cfg(test)]
#[path = "tests/backend_tests.rs"]
mod tests;
