//! Presentation seam: what the dashboard hands to whatever shows it.

use std::{
    collections::HashMap,
    fmt,
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard},
};

use shared::domain::{GridBounds, Order, RoutePoint, RouteResult};
use tracing::info;

use crate::{
    render::{render_surface, Overlay, RasterCanvas, SurfaceId},
    terrain::GridTerrainCache,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorArea {
    Planner,
    /// Order actions on the live view.
    Live,
    /// Health of the polled live data.
    LiveStatus,
}

impl fmt::Display for ErrorArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Planner => f.write_str("planner"),
            Self::Live => f.write_str("live"),
            Self::LiveStatus => f.write_str("live-status"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RouteMetrics {
    pub total_distance: f64,
    pub visited_nodes: u64,
    pub time_ms: f64,
    pub path_text: String,
}

impl RouteMetrics {
    pub fn from_route(route: &RouteResult) -> Self {
        Self {
            total_distance: route.total_distance,
            visited_nodes: route.visited_nodes,
            time_ms: route.time_ms,
            path_text: format_path(&route.path),
        }
    }
}

pub fn format_path(path: &[RoutePoint]) -> String {
    if path.is_empty() {
        return "No path returned".to_string();
    }
    path.iter()
        .map(|point| format!("({}, {})", point.x, point.y))
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Consumer of everything the dashboard displays. Implementations must tolerate
/// redundant calls; an empty error text clears the area.
pub trait Presenter: Send + Sync {
    fn render(
        &self,
        surface: SurfaceId,
        terrain: &GridTerrainCache,
        overlays: &[Overlay],
        polyline: Option<&[RoutePoint]>,
    );
    fn set_error_text(&self, area: ErrorArea, text: &str);
    fn set_metrics(&self, metrics: Option<&RouteMetrics>);
    fn render_order_panels(&self, active: &[Order], delivered: &[Order]);
}

#[derive(Debug)]
struct RasterState {
    planner: RasterCanvas,
    live: RasterCanvas,
    errors: HashMap<ErrorArea, String>,
    metrics: Option<RouteMetrics>,
    active: Vec<Order>,
    delivered: Vec<Order>,
}

/// Keeps both surfaces as in-memory images plus the latest panel contents.
pub struct RasterPresenter {
    state: Mutex<RasterState>,
}

impl RasterPresenter {
    pub fn new(bounds: GridBounds, cell_px: u32) -> Self {
        let width = bounds.width.saturating_mul(cell_px);
        let height = bounds.height.saturating_mul(cell_px);
        Self {
            state: Mutex::new(RasterState {
                planner: RasterCanvas::new(width, height),
                live: RasterCanvas::new(width, height),
                errors: HashMap::new(),
                metrics: None,
                active: Vec::new(),
                delivered: Vec::new(),
            }),
        }
    }

    pub fn surface(&self, surface: SurfaceId) -> RasterCanvas {
        let state = self.lock();
        match surface {
            SurfaceId::Planner => state.planner.clone(),
            SurfaceId::Live => state.live.clone(),
        }
    }

    pub fn error_text(&self, area: ErrorArea) -> Option<String> {
        self.lock().errors.get(&area).cloned()
    }

    pub fn metrics(&self) -> Option<RouteMetrics> {
        self.lock().metrics.clone()
    }

    pub fn order_panels(&self) -> (Vec<Order>, Vec<Order>) {
        let state = self.lock();
        (state.active.clone(), state.delivered.clone())
    }

    /// Writes `planner.png` and `live.png` into `dir`, creating it if needed.
    pub fn save_snapshots(&self, dir: &Path) -> Result<Vec<PathBuf>, image::ImageError> {
        std::fs::create_dir_all(dir).map_err(image::ImageError::IoError)?;
        let mut written = Vec::with_capacity(SurfaceId::ALL.len());
        for surface in SurfaceId::ALL {
            let path = dir.join(format!("{surface}.png"));
            self.surface(surface).save_png(&path)?;
            written.push(path);
        }
        info!(dir = %dir.display(), "presenter: snapshots saved");
        Ok(written)
    }

    fn lock(&self) -> MutexGuard<'_, RasterState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Presenter for RasterPresenter {
    fn render(
        &self,
        surface: SurfaceId,
        terrain: &GridTerrainCache,
        overlays: &[Overlay],
        polyline: Option<&[RoutePoint]>,
    ) {
        let mut state = self.lock();
        let canvas = match surface {
            SurfaceId::Planner => &mut state.planner,
            SurfaceId::Live => &mut state.live,
        };
        render_surface(surface, canvas, terrain, overlays, polyline);
    }

    fn set_error_text(&self, area: ErrorArea, text: &str) {
        let mut state = self.lock();
        if text.is_empty() {
            state.errors.remove(&area);
        } else {
            state.errors.insert(area, text.to_string());
        }
    }

    fn set_metrics(&self, metrics: Option<&RouteMetrics>) {
        self.lock().metrics = metrics.cloned();
    }

    fn render_order_panels(&self, active: &[Order], delivered: &[Order]) {
        let mut state = self.lock();
        state.active = active.to_vec();
        state.delivered = delivered.to_vec();
    }
}

#[cfg(test)]
#[path = "tests/presenter_tests.rs"]
mod tests;
