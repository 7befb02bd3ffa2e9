//! Planning-view state: selected restaurant, accumulated stops, last route.

use shared::{
    domain::{GridBounds, Restaurant, RoutePoint, RouteResult, Stop},
    error::DashboardError,
    protocol::{MultiRouteRequest, PointRouteRequest},
};

use crate::{route::RouteDispatcher, terrain::GridTerrainCache};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlannerState {
    NoRestaurant,
    RestaurantSelected,
    StopsAccumulated,
    RouteComputed,
}

/// Raw text of a pair of coordinate input fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoordinateFields {
    pub x: String,
    pub y: String,
}

impl CoordinateFields {
    pub fn new(x: impl Into<String>, y: impl Into<String>) -> Self {
        Self {
            x: x.into(),
            y: y.into(),
        }
    }

    /// Parses both fields and checks them against the grid.
    pub fn parse(&self, name: &str, bounds: GridBounds) -> Result<(i32, i32), DashboardError> {
        let x = parse_coordinate(&self.x, name, "x")?;
        let y = parse_coordinate(&self.y, name, "y")?;
        if !bounds.contains(i64::from(x), i64::from(y)) {
            return Err(DashboardError::validation(format!(
                "{name} coordinates ({x}, {y}) are outside the {}x{} grid",
                bounds.width, bounds.height
            )));
        }
        Ok((x, y))
    }
}

fn parse_coordinate(raw: &str, name: &str, axis: &str) -> Result<i32, DashboardError> {
    raw.trim().parse::<i32>().map_err(|_| {
        DashboardError::validation(format!(
            "{name} {axis} must be an integer (got {:?})",
            raw.trim()
        ))
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlannerSession {
    bounds: GridBounds,
    restaurant: Option<Restaurant>,
    stops: Vec<Stop>,
    route: Option<RouteResult>,
}

impl PlannerSession {
    pub fn new(bounds: GridBounds) -> Self {
        Self {
            bounds,
            restaurant: None,
            stops: Vec::new(),
            route: None,
        }
    }

    pub fn state(&self) -> PlannerState {
        if self.restaurant.is_none() {
            PlannerState::NoRestaurant
        } else if self.route.is_some() {
            PlannerState::RouteComputed
        } else if !self.stops.is_empty() {
            PlannerState::StopsAccumulated
        } else {
            PlannerState::RestaurantSelected
        }
    }

    pub fn restaurant(&self) -> Option<&Restaurant> {
        self.restaurant.as_ref()
    }

    pub fn stops(&self) -> &[Stop] {
        &self.stops
    }

    pub fn route(&self) -> Option<&RouteResult> {
        self.route.as_ref()
    }

    pub fn path(&self) -> &[RoutePoint] {
        self.route
            .as_ref()
            .map(|route| route.path.as_slice())
            .unwrap_or(&[])
    }

    /// Unknown or empty ids leave the session with no restaurant. Inputs are
    /// cleared either way.
    pub fn select_restaurant(&mut self, id: &str, restaurants: &[Restaurant]) -> PlannerState {
        self.stops.clear();
        self.route = None;
        let id = id.trim();
        self.restaurant = if id.is_empty() {
            None
        } else {
            restaurants
                .iter()
                .find(|restaurant| restaurant.id.as_str() == id)
                .cloned()
        };
        self.state()
    }

    /// Appends `Stop N`. Returns `None` without touching state when the click
    /// falls outside the grid.
    pub fn add_stop(&mut self, x: i64, y: i64) -> Option<&Stop> {
        if !self.bounds.contains(x, y) {
            return None;
        }
        let label = format!("Stop {}", self.stops.len() + 1);
        self.stops.push(Stop {
            x: x as i32,
            y: y as i32,
            label,
        });
        self.stops.last()
    }

    pub fn reset(&mut self) -> PlannerState {
        self.stops.clear();
        self.route = None;
        self.state()
    }

    /// Builds the multi-stop request. With no accumulated stops the manual end
    /// fields supply a single stop.
    pub fn prepare_route(
        &self,
        heuristic: &str,
        strategy: &str,
        manual_end: &CoordinateFields,
    ) -> Result<MultiRouteRequest, DashboardError> {
        let restaurant = self
            .restaurant
            .as_ref()
            .ok_or_else(|| DashboardError::validation("Please select a restaurant first"))?;

        let stops = if self.stops.is_empty() {
            let (x, y) = manual_end.parse("end", self.bounds)?;
            vec![Stop {
                x,
                y,
                label: "Stop 1".to_string(),
            }]
        } else {
            self.stops.clone()
        };

        Ok(RouteDispatcher::build_request(
            &restaurant.id,
            &stops,
            heuristic,
            strategy,
        ))
    }

    /// Builds a point-to-point request; the terrain's non-road cells travel as obstacles.
    pub fn prepare_point_route(
        &self,
        heuristic: &str,
        start: &CoordinateFields,
        end: &CoordinateFields,
        terrain: &GridTerrainCache,
    ) -> Result<PointRouteRequest, DashboardError> {
        let (start_x, start_y) = start.parse("start", self.bounds)?;
        let (end_x, end_y) = end.parse("end", self.bounds)?;
        Ok(PointRouteRequest {
            grid_width: self.bounds.width,
            grid_height: self.bounds.height,
            start_x,
            start_y,
            end_x,
            end_y,
            heuristic: heuristic.to_string(),
            cells: terrain.obstacles(),
        })
    }

    /// Replaces the previous route wholesale.
    pub fn apply_route(&mut self, route: RouteResult) {
        self.route = Some(route);
    }

    pub fn clear_route(&mut self) {
        self.route = None;
    }
}

#[cfg(test)]
#[path = "tests/planner_tests.rs"]
mod tests;
