//! Route submission with last-issued-wins application.

use std::sync::Arc;

use shared::{
    domain::{GridBounds, RestaurantId, RouteResult, Stop},
    error::DashboardError,
    protocol::{MultiRouteRequest, PointRouteRequest},
};
use tracing::{debug, warn};

use crate::{
    backend::DispatchBackend,
    planner::PlannerSession,
    sequence::{Sequence, SequenceGate},
};

/// A route response that was still the newest request when it arrived.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteCompletion {
    pub sequence: Sequence,
    pub result: RouteResult,
}

pub struct RouteDispatcher {
    backend: Arc<dyn DispatchBackend>,
    bounds: GridBounds,
    gate: SequenceGate,
}

impl RouteDispatcher {
    pub fn new(backend: Arc<dyn DispatchBackend>, bounds: GridBounds) -> Self {
        Self {
            backend,
            bounds,
            gate: SequenceGate::new(),
        }
    }

    /// Payload for `POST /api/route/multi`; stops keep their insertion order.
    pub fn build_request(
        restaurant_id: &RestaurantId,
        stops: &[Stop],
        heuristic: &str,
        strategy: &str,
    ) -> MultiRouteRequest {
        MultiRouteRequest {
            restaurant_id: restaurant_id.clone(),
            stops: stops.to_vec(),
            heuristic: heuristic.to_string(),
            strategy: strategy.to_string(),
        }
    }

    /// Reserves the sequence for the next submission. Issue it under the same
    /// lock that guards `invalidate` so a reset cannot slip in between.
    pub fn issue(&self) -> Sequence {
        self.gate.issue()
    }

    /// Sends a multi-stop request. Responses (successful or not) to requests that
    /// were superseded while in flight come back as `StaleResultDiscarded`.
    pub async fn submit_request(
        &self,
        sequence: Sequence,
        request: &MultiRouteRequest,
    ) -> Result<RouteCompletion, DashboardError> {
        let outcome = self.backend.multi_route(request).await;
        self.complete(sequence, outcome)
    }

    /// Point-to-point routes share the sequence stream with multi-stop routes since
    /// both write the same path.
    pub async fn submit_point(
        &self,
        sequence: Sequence,
        request: &PointRouteRequest,
    ) -> Result<RouteCompletion, DashboardError> {
        let outcome = self.backend.point_route(request).await;
        self.complete(sequence, outcome)
    }

    /// Writes the result into the session if no newer request was issued since.
    /// Call with the session lock held so the check and the write cannot interleave
    /// with a new submission.
    pub fn apply(
        &self,
        session: &mut PlannerSession,
        completion: RouteCompletion,
    ) -> Result<(), DashboardError> {
        self.ensure_latest(completion.sequence)?;
        session.apply_route(completion.result);
        Ok(())
    }

    /// Clears the drawn route after a failed request, unless a newer request has
    /// been issued meanwhile. Same locking rule as `apply`.
    pub fn apply_failure(
        &self,
        session: &mut PlannerSession,
        sequence: Sequence,
    ) -> Result<(), DashboardError> {
        self.ensure_latest(sequence)?;
        session.clear_route();
        Ok(())
    }

    /// Supersedes any request still in flight, e.g. after the stops were cleared.
    pub fn invalidate(&self) {
        self.gate.invalidate();
    }

    fn ensure_latest(&self, sequence: Sequence) -> Result<(), DashboardError> {
        if self.gate.is_latest(sequence) {
            return Ok(());
        }
        debug!(
            sequence = sequence.value(),
            latest = self.gate.latest_issued().value(),
            "route: discarding superseded result"
        );
        Err(DashboardError::StaleResultDiscarded {
            sequence: sequence.value(),
        })
    }

    fn complete(
        &self,
        sequence: Sequence,
        outcome: Result<RouteResult, DashboardError>,
    ) -> Result<RouteCompletion, DashboardError> {
        self.ensure_latest(sequence)?;
        let result = outcome?;
        if let Some(point) = result
            .path
            .iter()
            .find(|point| !self.bounds.contains(point.x.into(), point.y.into()))
        {
            warn!(
                sequence = sequence.value(),
                x = point.x,
                y = point.y,
                "route: rejecting path that leaves the grid"
            );
            return Err(DashboardError::Decode(format!(
                "route point ({}, {}) is outside the {}x{} grid",
                point.x, point.y, self.bounds.width, self.bounds.height
            )));
        }
        Ok(RouteCompletion { sequence, result })
    }
}

#[cfg(test)]
#[path = "tests/route_tests.rs"]
mod tests;
