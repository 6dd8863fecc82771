//! Ground control points and the declared transformation model.

use serde::{Deserialize, Serialize};

/// A known correspondence between a source pixel and a geographic coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControlPoint {
    /// Pixel position (x to the right, y downwards) in the raster used for fitting
    pub pixel: (f64, f64),
    /// Geographic position as (lon, lat) in degrees
    pub geo: (f64, f64),
}

impl ControlPoint {
    pub fn new(px: f64, py: f64, lon: f64, lat: f64) -> Self {
        Self {
            pixel: (px, py),
            geo: (lon, lat),
        }
    }

    /// True if the pixel position lies within `[0, width] × [0, height]`.
    pub fn within_raster(&self, width: f64, height: f64) -> bool {
        let (x, y) = self.pixel;
        x >= 0.0 && x <= width && y >= 0.0 && y <= height
    }
}

/// Family of the declared transformation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransformKind {
    Polynomial,
}

/// Transformation declared by the description (or its documented fallback).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformModel {
    pub kind: TransformKind,
    pub order: u32,
}

impl TransformModel {
    pub fn polynomial(order: u32) -> Self {
        Self {
            kind: TransformKind::Polynomial,
            order: order.max(1),
        }
    }

    /// Minimum number of control points for a polynomial of `order`: (order+1)(order+2)/2.
    pub fn min_control_points(&self) -> usize {
        let n = self.order as usize;
        (n + 1) * (n + 2) / 2
    }

    /// Same model with the order replaced, if an override is given.
    pub fn with_order_override(self, order: Option<u32>) -> Self {
        match order {
            Some(order) => TransformModel::polynomial(order),
            None => self,
        }
    }
}

impl Default for TransformModel {
    fn default() -> Self {
        TransformModel::polynomial(1)
    }
}
