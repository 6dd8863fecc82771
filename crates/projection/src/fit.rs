//! Pixel ↔ geographic transforms fitted from ground control points.

use georef_common::{ControlPoint, GeorefError, GeorefResult, TransformModel};
use tracing::debug;

use crate::polynomial::{min_control_points, PolynomialTransform};

/// Newton refinement stops after this many steps.
const MAX_NEWTON_ITERATIONS: usize = 10;

/// Newton refinement stops once a step moves less than this (pixels).
const NEWTON_TOLERANCE: f64 = 1e-9;

/// A mapping between source pixel space and geographic (lon, lat) space.
pub trait GeoTransform: Send + Sync {
    /// Source pixel `(x, y)` → `(lon, lat)`.
    fn forward(&self, px: f64, py: f64) -> (f64, f64);

    /// `(lon, lat)` → source pixel `(x, y)`.
    fn inverse(&self, lon: f64, lat: f64) -> (f64, f64);
}

/// How well the fitted transform reproduces one control point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Residual {
    /// Distance between `forward(pixel)` and the control point's geo position (degrees)
    pub forward_deg: f64,
    /// Distance between `inverse(geo)` and the control point's pixel position (pixels)
    pub inverse_px: f64,
}

/// An immutable pixel ↔ geo transform.
///
/// `forward` evaluates the fitted polynomial directly. `inverse` starts from a
/// polynomial fitted in the opposite direction and refines it with Newton's
/// method so that `forward(inverse(p)) ≈ p`.
#[derive(Debug, Clone)]
pub struct FittedTransform {
    model: TransformModel,
    forward: PolynomialTransform,
    reverse: PolynomialTransform,
    residuals: Vec<Residual>,
}

/// Fit `model` to `points`.
///
/// # Errors
/// - `InsufficientControlPoints` if there are fewer than `(n+1)(n+2)/2` points
/// - `DegenerateFit` if the points cannot determine the polynomial
pub fn fit_transform(
    model: &TransformModel,
    points: &[ControlPoint],
) -> GeorefResult<FittedTransform> {
    let required = min_control_points(model.order);
    if points.len() < required {
        return Err(GeorefError::InsufficientControlPoints {
            points: points.len(),
            required,
            order: model.order,
        });
    }

    let pixels: Vec<(f64, f64)> = points.iter().map(|p| p.pixel).collect();
    let geos: Vec<(f64, f64)> = points.iter().map(|p| p.geo).collect();

    let forward = PolynomialTransform::fit(model.order, &pixels, &geos)?;
    let reverse = PolynomialTransform::fit(model.order, &geos, &pixels)?;

    let mut fitted = FittedTransform {
        model: *model,
        forward,
        reverse,
        residuals: Vec::new(),
    };
    let residuals: Vec<Residual> = points.iter().map(|p| fitted.residual_for(p)).collect();
    fitted.residuals = residuals;

    debug!(
        order = model.order,
        points = points.len(),
        rms_deg = fitted.rms_residual(),
        rms_px = fitted.rms_pixel_residual(),
        "Fitted polynomial transform"
    );

    Ok(fitted)
}

impl FittedTransform {
    pub fn model(&self) -> &TransformModel {
        &self.model
    }

    pub fn forward_polynomial(&self) -> &PolynomialTransform {
        &self.forward
    }

    /// Per-control-point residuals, in input order.
    pub fn residuals(&self) -> &[Residual] {
        &self.residuals
    }

    /// Root-mean-square forward residual in degrees.
    pub fn rms_residual(&self) -> f64 {
        rms(self.residuals.iter().map(|r| r.forward_deg))
    }

    /// Root-mean-square inverse residual in pixels.
    pub fn rms_pixel_residual(&self) -> f64 {
        rms(self.residuals.iter().map(|r| r.inverse_px))
    }

    fn residual_for(&self, point: &ControlPoint) -> Residual {
        let (lon, lat) = self.forward(point.pixel.0, point.pixel.1);
        let (px, py) = self.inverse(point.geo.0, point.geo.1);
        Residual {
            forward_deg: (lon - point.geo.0).hypot(lat - point.geo.1),
            inverse_px: (px - point.pixel.0).hypot(py - point.pixel.1),
        }
    }
}

impl GeoTransform for FittedTransform {
    fn forward(&self, px: f64, py: f64) -> (f64, f64) {
        self.forward.apply(px, py)
    }

    fn inverse(&self, lon: f64, lat: f64) -> (f64, f64) {
        let initial = self.reverse.apply(lon, lat);
        let (mut px, mut py) = initial;

        for _ in 0..MAX_NEWTON_ITERATIONS {
            let (fx, fy) = self.forward.apply(px, py);
            let (rx, ry) = (fx - lon, fy - lat);
            let [[a, b], [c, d]] = self.forward.jacobian(px, py);

            let det = a * d - b * c;
            let norm = a.abs().max(b.abs()).max(c.abs()).max(d.abs());
            if !det.is_finite() || det.abs() <= f64::EPSILON * norm * norm {
                break;
            }

            let dx = (d * rx - b * ry) / det;
            let dy = (a * ry - c * rx) / det;
            px -= dx;
            py -= dy;

            if dx.hypot(dy) < NEWTON_TOLERANCE {
                break;
            }
        }

        if px.is_finite() && py.is_finite() {
            (px, py)
        } else {
            initial
        }
    }
}

fn rms(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(s, n), v| (s + v * v, n + 1));
    if count == 0 {
        0.0
    } else {
        (sum / count as f64).sqrt()
    }
}
