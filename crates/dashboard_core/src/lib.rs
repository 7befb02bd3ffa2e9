pub mod backend;
pub mod live;
pub mod orchestrator;
pub mod orders;
pub mod planner;
pub mod poller;
pub mod presenter;
pub mod render;
pub mod route;
pub mod sequence;
pub mod terrain;

pub use backend::{DispatchBackend, HttpDispatchBackend};
pub use live::{LiveOperationsStore, LiveSnapshot};
pub use orchestrator::{DashboardEvent, DashboardOptions, Orchestrator};
pub use orders::{OrderAssignment, OrderDispatcher};
pub use planner::{CoordinateFields, PlannerSession, PlannerState};
pub use poller::{SimulationPoller, TickHandler, DEFAULT_POLL_INTERVAL};
pub use presenter::{ErrorArea, Presenter, RasterPresenter, RouteMetrics};
pub use render::SurfaceId;
pub use route::{RouteCompletion, RouteDispatcher};
pub use terrain::GridTerrainCache;

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;
