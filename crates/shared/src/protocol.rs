use serde::{Deserialize, Serialize};

use crate::domain::{Cell, Courier, Order, RestaurantId, Stop};

/// Body of `POST /api/route/multi`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiRouteRequest {
    pub restaurant_id: RestaurantId,
    pub stops: Vec<Stop>,
    pub heuristic: String,
    pub strategy: String,
}

/// Body of `POST /api/route`. `cells` lists the non-road tiles the router should avoid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointRouteRequest {
    pub grid_width: u32,
    pub grid_height: u32,
    pub start_x: i32,
    pub start_y: i32,
    pub end_x: i32,
    pub end_y: i32,
    pub heuristic: String,
    pub cells: Vec<Cell>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub restaurant_id: RestaurantId,
    pub x: i32,
    pub y: i32,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentResponse {
    pub order: Order,
    pub courier: Courier,
}
