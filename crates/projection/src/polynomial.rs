//! Bivariate polynomial transforms fitted by least squares.
//!
//! A polynomial of total degree `n` maps `(x, y)` to `(X, Y)` with one set of
//! coefficients per output axis:
//!
//! ```text
//! X = Σ a_pq · u^p · v^q      (0 ≤ p+q ≤ n)
//! Y = Σ b_pq · u^p · v^q
//! ```
//!
//! Terms are ordered by increasing total degree, then decreasing power of x:
//! `1, x, y, x², xy, y², x³, x²y, xy², y³`.
//!
//! Inputs and outputs are normalized before fitting (centered on the mean and
//! divided by the largest absolute deviation per axis), so the normal equations
//! stay well conditioned whether the values are pixels or degrees.

use georef_common::{GeorefError, GeorefResult};
use nalgebra::DMatrix;

/// Singular values below `max_singular_value * RANK_TOLERANCE` count as zero.
const RANK_TOLERANCE: f64 = 1e-10;

/// Solve tolerances, tried in order until a finite solution is found.
const SOLVE_TOLERANCES: [f64; 3] = [1e-10, 1e-8, 1e-6];

/// Number of coefficients per axis for a polynomial of total degree `order`.
pub fn num_terms(order: u32) -> usize {
    let n = order as usize;
    (n + 1) * (n + 2) / 2
}

/// Minimum number of control points needed to fit a polynomial of `order`.
pub fn min_control_points(order: u32) -> usize {
    num_terms(order)
}

/// Exponents `(p, q)` of each term in coefficient order.
pub fn term_powers(order: u32) -> Vec<(u32, u32)> {
    let mut powers = Vec::with_capacity(num_terms(order));
    for degree in 0..=order {
        for p in (0..=degree).rev() {
            powers.push((p, degree - p));
        }
    }
    powers
}

/// Affine normalization of one 2D point set.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Normalization {
    center: (f64, f64),
    scale: (f64, f64),
}

impl Normalization {
    fn from_points(points: &[(f64, f64)]) -> Self {
        let n = points.len().max(1) as f64;
        let cx = points.iter().map(|p| p.0).sum::<f64>() / n;
        let cy = points.iter().map(|p| p.1).sum::<f64>() / n;
        let sx = points.iter().map(|p| (p.0 - cx).abs()).fold(0.0, f64::max);
        let sy = points.iter().map(|p| (p.1 - cy).abs()).fold(0.0, f64::max);
        Self {
            center: (cx, cy),
            scale: (nonzero_scale(sx), nonzero_scale(sy)),
        }
    }

    #[inline]
    fn normalize(&self, x: f64, y: f64) -> (f64, f64) {
        (
            (x - self.center.0) / self.scale.0,
            (y - self.center.1) / self.scale.1,
        )
    }

    #[inline]
    fn denormalize(&self, u: f64, v: f64) -> (f64, f64) {
        (
            self.center.0 + u * self.scale.0,
            self.center.1 + v * self.scale.1,
        )
    }
}

fn nonzero_scale(s: f64) -> f64 {
    if s > 0.0 && s.is_finite() {
        s
    } else {
        1.0
    }
}

/// A fitted polynomial mapping from one plane to another.
#[derive(Debug, Clone, PartialEq)]
pub struct PolynomialTransform {
    order: u32,
    powers: Vec<(u32, u32)>,
    src: Normalization,
    dst: Normalization,
    coeffs_x: Vec<f64>,
    coeffs_y: Vec<f64>,
}

impl PolynomialTransform {
    /// Least-squares fit of `src[i] → dst[i]`.
    ///
    /// # Errors
    /// - `MalformedInput` if the slices differ in length or hold non-finite values
    /// - `InsufficientControlPoints` if there are fewer points than terms
    /// - `DegenerateFit` if the points do not determine every coefficient
    ///   (collinear or coincident points)
    pub fn fit(order: u32, src: &[(f64, f64)], dst: &[(f64, f64)]) -> GeorefResult<Self> {
        if src.len() != dst.len() {
            return Err(GeorefError::malformed(format!(
                "{} source points but {} destination points",
                src.len(),
                dst.len()
            )));
        }
        if src
            .iter()
            .chain(dst.iter())
            .any(|p| !p.0.is_finite() || !p.1.is_finite())
        {
            return Err(GeorefError::malformed("control point coordinates must be finite"));
        }

        let order = order.max(1);
        let required = num_terms(order);
        if src.len() < required {
            return Err(GeorefError::InsufficientControlPoints {
                points: src.len(),
                required,
                order,
            });
        }

        let powers = term_powers(order);
        let src_norm = Normalization::from_points(src);
        let dst_norm = Normalization::from_points(dst);

        let design = DMatrix::from_fn(src.len(), powers.len(), |row, col| {
            let (u, v) = src_norm.normalize(src[row].0, src[row].1);
            let (p, q) = powers[col];
            u.powi(p as i32) * v.powi(q as i32)
        });
        let targets = DMatrix::from_fn(dst.len(), 2, |row, col| {
            let (u, v) = dst_norm.normalize(dst[row].0, dst[row].1);
            if col == 0 {
                u
            } else {
                v
            }
        });

        let coeffs = solve_least_squares(design, &targets)?;

        Ok(Self {
            order,
            powers,
            src: src_norm,
            dst: dst_norm,
            coeffs_x: coeffs.column(0).iter().copied().collect(),
            coeffs_y: coeffs.column(1).iter().copied().collect(),
        })
    }

    pub fn order(&self) -> u32 {
        self.order
    }

    /// Coefficients for the X and Y outputs, in normalized units.
    pub fn coefficients(&self) -> (&[f64], &[f64]) {
        (&self.coeffs_x, &self.coeffs_y)
    }

    /// Evaluate the polynomial at `(x, y)`.
    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        let (u, v) = self.src.normalize(x, y);
        let mut out_u = 0.0;
        let mut out_v = 0.0;
        for (k, &(p, q)) in self.powers.iter().enumerate() {
            let term = u.powi(p as i32) * v.powi(q as i32);
            out_u += self.coeffs_x[k] * term;
            out_v += self.coeffs_y[k] * term;
        }
        self.dst.denormalize(out_u, out_v)
    }

    /// Partial derivatives at `(x, y)` as `[[dX/dx, dX/dy], [dY/dx, dY/dy]]`.
    pub fn jacobian(&self, x: f64, y: f64) -> [[f64; 2]; 2] {
        let (u, v) = self.src.normalize(x, y);
        let mut j = [[0.0; 2]; 2];
        for (k, &(p, q)) in self.powers.iter().enumerate() {
            let du = if p == 0 {
                0.0
            } else {
                p as f64 * u.powi(p as i32 - 1) * v.powi(q as i32)
            };
            let dv = if q == 0 {
                0.0
            } else {
                q as f64 * u.powi(p as i32) * v.powi(q as i32 - 1)
            };
            j[0][0] += self.coeffs_x[k] * du;
            j[0][1] += self.coeffs_x[k] * dv;
            j[1][0] += self.coeffs_y[k] * du;
            j[1][1] += self.coeffs_y[k] * dv;
        }
        // Chain rule through both normalizations
        let (sx, sy) = self.src.scale;
        let (dx, dy) = self.dst.scale;
        [
            [j[0][0] * dx / sx, j[0][1] * dx / sy],
            [j[1][0] * dy / sx, j[1][1] * dy / sy],
        ]
    }
}

/// Solve `design · coeffs ≈ targets` with SVD.
fn solve_least_squares(design: DMatrix<f64>, targets: &DMatrix<f64>) -> GeorefResult<DMatrix<f64>> {
    let columns = design.ncols();
    let svd = design.svd(true, true);

    let max_sv = svd.singular_values.max();
    if !max_sv.is_finite() || max_sv <= 0.0 {
        return Err(GeorefError::DegenerateFit(
            "design matrix has no usable singular values".to_string(),
        ));
    }
    let rank = svd.rank(max_sv * RANK_TOLERANCE);
    if rank < columns {
        return Err(GeorefError::DegenerateFit(format!(
            "control points determine only {} of {} coefficients (collinear or coincident points)",
            rank, columns
        )));
    }

    for &tol in &SOLVE_TOLERANCES {
        if let Ok(coeffs) = svd.solve(targets, tol) {
            if coeffs.iter().all(|v| v.is_finite()) {
                return Ok(coeffs);
            }
        }
    }

    Err(GeorefError::DegenerateFit(
        "least-squares solution is not finite".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_term_ordering() {
        assert_eq!(term_powers(1), vec![(0, 0), (1, 0), (0, 1)]);
        assert_eq!(
            term_powers(2),
            vec![(0, 0), (1, 0), (0, 1), (2, 0), (1, 1), (0, 2)]
        );
        assert_eq!(term_powers(3).len(), 10);
        assert_eq!(term_powers(3)[6..], [(3, 0), (2, 1), (1, 2), (0, 3)]);
    }

    #[test]
    fn test_min_control_points() {
        assert_eq!(min_control_points(1), 3);
        assert_eq!(min_control_points(2), 6);
        assert_eq!(min_control_points(3), 10);
    }

    #[test]
    fn test_fit_exact_affine() {
        let src = [(0.0, 0.0), (10.0, 0.0), (0.0, 10.0), (10.0, 10.0)];
        let dst: Vec<_> = src.iter().map(|&(x, y)| (2.0 * x + 1.0, 3.0 - y)).collect();
        let poly = PolynomialTransform::fit(1, &src, &dst).unwrap();

        let (x, y) = poly.apply(5.0, 2.5);
        assert!((x - 11.0).abs() < 1e-9);
        assert!((y - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_jacobian_of_affine() {
        let src = [(0.0, 0.0), (10.0, 0.0), (0.0, 10.0)];
        let dst: Vec<_> = src
            .iter()
            .map(|&(x, y)| (2.0 * x + 0.5 * y, -y))
            .collect();
        let poly = PolynomialTransform::fit(1, &src, &dst).unwrap();
        let j = poly.jacobian(3.0, 4.0);
        assert!((j[0][0] - 2.0).abs() < 1e-9);
        assert!((j[0][1] - 0.5).abs() < 1e-9);
        assert!(j[1][0].abs() < 1e-9);
        assert!((j[1][1] + 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_jacobian_matches_finite_difference() {
        let src: Vec<_> = (0..5)
            .flat_map(|i| (0..5).map(move |j| (i as f64 * 25.0, j as f64 * 25.0)))
            .collect();
        let dst: Vec<_> = src
            .iter()
            .map(|&(x, y)| (x + 0.01 * x * y, y - 0.002 * x * x))
            .collect();
        let poly = PolynomialTransform::fit(2, &src, &dst).unwrap();

        let (x, y) = (40.0, 60.0);
        let h = 1e-4;
        let j = poly.jacobian(x, y);
        let (fx1, fy1) = poly.apply(x + h, y);
        let (fx0, fy0) = poly.apply(x - h, y);
        assert!((j[0][0] - (fx1 - fx0) / (2.0 * h)).abs() < 1e-5);
        assert!((j[1][0] - (fy1 - fy0) / (2.0 * h)).abs() < 1e-5);
    }

    #[test]
    fn test_insufficient_points() {
        let src = [(0.0, 0.0), (1.0, 0.0)];
        let err = PolynomialTransform::fit(1, &src, &src).unwrap_err();
        assert!(matches!(
            err,
            GeorefError::InsufficientControlPoints {
                points: 2,
                required: 3,
                order: 1
            }
        ));
    }

    #[test]
    fn test_collinear_points_are_degenerate() {
        let src = [(0.0, 0.0), (1.0, 1.0), (2.0, 2.0), (3.0, 3.0)];
        let err = PolynomialTransform::fit(1, &src, &src).unwrap_err();
        assert!(matches!(err, GeorefError::DegenerateFit(_)));
    }

    #[test]
    fn test_coincident_points_are_degenerate() {
        let src = [(5.0, 5.0); 4];
        let err = PolynomialTransform::fit(1, &src, &src).unwrap_err();
        assert!(matches!(err, GeorefError::DegenerateFit(_)));
    }

    #[test]
    fn test_mismatched_lengths_and_nan() {
        let src = [(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)];
        assert!(PolynomialTransform::fit(1, &src, &src[..2]).is_err());

        let bad = [(0.0, 0.0), (f64::NAN, 0.0), (0.0, 1.0)];
        assert!(matches!(
            PolynomialTransform::fit(1, &bad, &src),
            Err(GeorefError::MalformedInput(_))
        ));
    }
}
