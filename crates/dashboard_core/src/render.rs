//! Stateless drawing of a city surface: background, terrain, grid lines, overlay
//! markers, then the route polyline.
//!
//! Layering is explicit. Callers describe overlays through an [`OverlayStack`]
//! whose layers always flatten in [`OverlayLayer`] order, so later layers occlude
//! earlier ones regardless of the order entities were pushed.

use std::{collections::BTreeMap, fmt, path::Path};

use image::{ImageFormat, Rgb, RgbImage};
use shared::domain::{CellType, Courier, Order, OrderStatus, Restaurant, RoutePoint, Stop};
use tracing::trace;

use crate::terrain::GridTerrainCache;

/// Opaque RGB color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Color {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl Color {
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }
}

pub const BACKGROUND: Color = Color::from_rgb_u8(250, 250, 250);
pub const GRID_LINE: Color = Color::from_rgb_u8(176, 176, 176);
pub const ROUTE_LINE: Color = Color::from_rgb_u8(30, 150, 90);
pub const RESTAURANT: Color = Color::from_rgb_u8(214, 48, 49);
pub const ORDER_NEW: Color = Color::from_rgb_u8(253, 203, 110);
pub const ORDER_ASSIGNED: Color = Color::from_rgb_u8(225, 112, 85);
pub const ORDER_IN_PROGRESS: Color = Color::from_rgb_u8(232, 67, 147);
pub const ORDER_DELIVERED: Color = Color::from_rgb_u8(99, 110, 114);
pub const COURIER: Color = Color::from_rgb_u8(9, 132, 227);
pub const STOP: Color = Color::from_rgb_u8(108, 92, 231);

pub fn terrain_color(cell_type: CellType) -> Color {
    match cell_type {
        CellType::Road => Color::from_rgb_u8(223, 230, 233),
        CellType::Building => Color::from_rgb_u8(99, 99, 99),
        CellType::Park => Color::from_rgb_u8(85, 239, 196),
        CellType::River => Color::from_rgb_u8(116, 185, 255),
    }
}

pub fn order_color(status: OrderStatus) -> Color {
    match status {
        OrderStatus::New => ORDER_NEW,
        OrderStatus::Assigned => ORDER_ASSIGNED,
        OrderStatus::InProgress => ORDER_IN_PROGRESS,
        OrderStatus::Delivered => ORDER_DELIVERED,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SurfaceId {
    Planner,
    Live,
}

impl SurfaceId {
    pub const ALL: [SurfaceId; 2] = [SurfaceId::Planner, SurfaceId::Live];
}

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Planner => f.write_str("planner"),
            Self::Live => f.write_str("live"),
        }
    }
}

/// Marker drawn at a (possibly fractional) cell position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Overlay {
    pub x: f64,
    pub y: f64,
    pub color: Color,
}

impl Overlay {
    pub fn restaurant(restaurant: &Restaurant) -> Self {
        Self {
            x: f64::from(restaurant.x),
            y: f64::from(restaurant.y),
            color: RESTAURANT,
        }
    }

    pub fn order(order: &Order) -> Self {
        Self {
            x: f64::from(order.x),
            y: f64::from(order.y),
            color: order_color(order.status),
        }
    }

    pub fn courier(courier: &Courier) -> Self {
        Self {
            x: courier.current_x,
            y: courier.current_y,
            color: COURIER,
        }
    }

    pub fn stop(stop: &Stop) -> Self {
        Self {
            x: f64::from(stop.x),
            y: f64::from(stop.y),
            color: STOP,
        }
    }
}

/// Draw layers, bottom to top.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OverlayLayer {
    Restaurants,
    ActiveOrders,
    Couriers,
    Session,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct OverlayStack {
    layers: BTreeMap<OverlayLayer, Vec<Overlay>>,
}

impl OverlayStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, layer: OverlayLayer, overlay: Overlay) {
        self.layers.entry(layer).or_default().push(overlay);
    }

    pub fn extend(&mut self, layer: OverlayLayer, overlays: impl IntoIterator<Item = Overlay>) {
        self.layers.entry(layer).or_default().extend(overlays);
    }

    pub fn layer(&self, layer: OverlayLayer) -> &[Overlay] {
        self.layers.get(&layer).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn into_ordered(self) -> Vec<Overlay> {
        self.layers.into_values().flatten().collect()
    }
}

/// Builds the shared map layers. Delivered orders are never part of the map.
pub fn compose_overlays(
    restaurants: &[Restaurant],
    orders: &[Order],
    couriers: &[Courier],
    session_stops: &[Stop],
) -> OverlayStack {
    let mut stack = OverlayStack::new();
    stack.extend(
        OverlayLayer::Restaurants,
        restaurants.iter().map(Overlay::restaurant),
    );
    stack.extend(
        OverlayLayer::ActiveOrders,
        orders
            .iter()
            .filter(|order| order.status.is_active())
            .map(Overlay::order),
    );
    stack.extend(OverlayLayer::Couriers, couriers.iter().map(Overlay::courier));
    stack.extend(OverlayLayer::Session, session_stops.iter().map(Overlay::stop));
    stack
}

/// Pixel-space drawing primitives a surface must provide.
pub trait Canvas {
    fn size(&self) -> (u32, u32);
    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64, color: Color);
    fn draw_line(&mut self, from: (f64, f64), to: (f64, f64), color: Color);
    fn fill_circle(&mut self, center: (f64, f64), radius: f64, color: Color);
}

/// Paints one full frame. Every pixel the frame covers is repainted, so repeated
/// calls with the same inputs leave the canvas unchanged.
pub fn render_surface(
    surface: SurfaceId,
    canvas: &mut dyn Canvas,
    terrain: &GridTerrainCache,
    overlays: &[Overlay],
    polyline: Option<&[RoutePoint]>,
) {
    let (width, height) = canvas.size();
    canvas.fill_rect(0.0, 0.0, f64::from(width), f64::from(height), BACKGROUND);

    let bounds = terrain.bounds();
    if bounds.width == 0 || bounds.height == 0 {
        return;
    }
    let cell = (f64::from(width) / f64::from(bounds.width))
        .min(f64::from(height) / f64::from(bounds.height));
    let grid_width = cell * f64::from(bounds.width);
    let grid_height = cell * f64::from(bounds.height);

    for y in 0..bounds.height {
        for x in 0..bounds.width {
            let color = terrain_color(terrain.type_at(x as i32, y as i32));
            canvas.fill_rect(f64::from(x) * cell, f64::from(y) * cell, cell, cell, color);
        }
    }

    for column in 0..=bounds.width {
        let x = (f64::from(column) * cell).min(grid_width - 1.0);
        canvas.draw_line((x, 0.0), (x, grid_height - 1.0), GRID_LINE);
    }
    for row in 0..=bounds.height {
        let y = (f64::from(row) * cell).min(grid_height - 1.0);
        canvas.draw_line((0.0, y), (grid_width - 1.0, y), GRID_LINE);
    }

    let radius = cell * 0.35;
    for overlay in overlays {
        canvas.fill_circle(cell_center(overlay.x, overlay.y, cell), radius, overlay.color);
    }

    let mut segments = 0usize;
    if let Some(points) = polyline.filter(|points| points.len() > 1) {
        for pair in points.windows(2) {
            let from = cell_center(f64::from(pair[0].x), f64::from(pair[0].y), cell);
            let to = cell_center(f64::from(pair[1].x), f64::from(pair[1].y), cell);
            canvas.draw_line(from, to, ROUTE_LINE);
            segments += 1;
        }
    }

    trace!(%surface, overlays = overlays.len(), segments, "render: frame painted");
}

fn cell_center(x: f64, y: f64, cell: f64) -> (f64, f64) {
    ((x + 0.5) * cell, (y + 0.5) * cell)
}

/// In-memory canvas backed by an RGB image.
#[derive(Clone, Debug, PartialEq)]
pub struct RasterCanvas {
    image: RgbImage,
}

impl RasterCanvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbImage::new(width, height),
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        if x >= self.image.width() || y >= self.image.height() {
            return None;
        }
        let Rgb([red, green, blue]) = *self.image.get_pixel(x, y);
        Some(Color::from_rgb_u8(red, green, blue))
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    pub fn save_png(&self, path: &Path) -> Result<(), image::ImageError> {
        self.image.save_with_format(path, ImageFormat::Png)
    }

    fn plot(&mut self, x: i64, y: i64, color: Color) {
        if x < 0 || y < 0 {
            return;
        }
        let (x, y) = (x as u32, y as u32);
        if x < self.image.width() && y < self.image.height() {
            self.image
                .put_pixel(x, y, Rgb([color.red, color.green, color.blue]));
        }
    }
}

impl Canvas for RasterCanvas {
    fn size(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64, color: Color) {
        let (canvas_width, canvas_height) = self.image.dimensions();
        let x0 = (x.round() as i64).max(0);
        let y0 = (y.round() as i64).max(0);
        let x1 = ((x + width).round() as i64).min(i64::from(canvas_width));
        let y1 = ((y + height).round() as i64).min(i64::from(canvas_height));
        for py in y0..y1 {
            for px in x0..x1 {
                self.plot(px, py, color);
            }
        }
    }

    fn draw_line(&mut self, from: (f64, f64), to: (f64, f64), color: Color) {
        let (width, height) = self.image.dimensions();
        let Some((from, to)) = clip_segment(from, to, width, height) else {
            return;
        };
        let dx = to.0 - from.0;
        let dy = to.1 - from.1;
        let steps = dx.abs().max(dy.abs()).ceil().max(1.0) as i64;
        for step in 0..=steps {
            let t = step as f64 / steps as f64;
            let x = (from.0 + dx * t).round() as i64;
            let y = (from.1 + dy * t).round() as i64;
            self.plot(x, y, color);
        }
    }

    fn fill_circle(&mut self, center: (f64, f64), radius: f64, color: Color) {
        let (width, height) = self.image.dimensions();
        let x0 = ((center.0 - radius).floor() as i64).max(0);
        let x1 = ((center.0 + radius).ceil() as i64).min(i64::from(width));
        let y0 = ((center.1 - radius).floor() as i64).max(0);
        let y1 = ((center.1 + radius).ceil() as i64).min(i64::from(height));
        let radius_sq = radius * radius;
        for py in y0..=y1 {
            for px in x0..=x1 {
                let ddx = px as f64 + 0.5 - center.0;
                let ddy = py as f64 + 0.5 - center.1;
                if ddx * ddx + ddy * ddy <= radius_sq {
                    self.plot(px, py, color);
                }
            }
        }
    }
}

/// Liang-Barsky clip of a segment to the pixel area, widened by half a pixel so
/// rounding still reaches the edge pixels. `None` when nothing is visible.
fn clip_segment(
    from: (f64, f64),
    to: (f64, f64),
    width: u32,
    height: u32,
) -> Option<((f64, f64), (f64, f64))> {
    if ![from.0, from.1, to.0, to.1].iter().all(|v| v.is_finite()) {
        return None;
    }
    let (min_x, max_x) = (-0.5, f64::from(width) - 0.5);
    let (min_y, max_y) = (-0.5, f64::from(height) - 0.5);
    let dx = to.0 - from.0;
    let dy = to.1 - from.1;

    let (mut enter, mut exit) = (0.0_f64, 1.0_f64);
    for (p, q) in [
        (-dx, from.0 - min_x),
        (dx, max_x - from.0),
        (-dy, from.1 - min_y),
        (dy, max_y - from.1),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > exit {
                return None;
            }
            enter = enter.max(r);
        } else {
            if r < enter {
                return None;
            }
            exit = exit.min(r);
        }
    }
    Some((
        (from.0 + enter * dx, from.1 + enter * dy),
        (from.0 + exit * dx, from.1 + exit * dy),
    ))
}

#[cfg(test)]
#[path = "tests/render_tests.rs"]
mod tests;
